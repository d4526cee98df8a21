//! Immutable session structs, freshness helpers, and builders.

// self
use crate::{_prelude::*, auth::secret::Secret};

/// One opaque credential pair issued by the portal (in practice a browser cookie).
///
/// Extra attributes reported by browser automation (`domain`, `path`, `httpOnly`, ...) are
/// ignored on deserialization; only the name/value pair is needed to replay the session.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
	/// Cookie name.
	pub name: String,
	/// Cookie value; callers must avoid logging it.
	pub value: Secret,
}
impl Cookie {
	/// Creates a new cookie pair.
	pub fn new(name: impl Into<String>, value: impl Into<Secret>) -> Self {
		Self { name: name.into(), value: value.into() }
	}
}
impl Debug for Cookie {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Cookie").field("name", &self.name).field("value", &"<redacted>").finish()
	}
}

/// Freshness of a session at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
	/// Session is inside its TTL.
	Active,
	/// Session exceeded its expiry instant.
	Expired,
}

/// Errors produced by [`SessionBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum SessionBuilderError {
	/// Issued when the login produced no credential pairs.
	#[error("At least one credential pair is required.")]
	MissingCredentials,
	/// Issued when no expiry (absolute or relative) was configured.
	#[error("Expiry must be supplied via expires_at or expires_in.")]
	MissingExpiry,
}

/// Cached credential set with an absolute expiry.
///
/// Sessions are immutable once built. A refresh produces a new value that replaces the cached
/// one; nothing ever edits a session in place.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
	cookies: Vec<Cookie>,
	#[serde(with = "time::serde::rfc3339")]
	issued_at: OffsetDateTime,
	#[serde(with = "time::serde::rfc3339")]
	expires_at: OffsetDateTime,
}
impl Session {
	/// Returns a builder for constructing sessions.
	pub fn builder() -> SessionBuilder {
		SessionBuilder::default()
	}

	/// Builds a session issued now that expires after `ttl`.
	pub fn issue(
		cookies: impl IntoIterator<Item = Cookie>,
		ttl: StdDuration,
	) -> Result<Self, SessionBuilderError> {
		Self::builder().cookies(cookies).issued_now().expires_in(ttl).build()
	}

	/// Same credentials, re-stamped as issued now and expiring after `ttl`.
	pub fn renewed(&self, ttl: StdDuration) -> Self {
		let issued_at = OffsetDateTime::now_utc();

		Self { cookies: self.cookies.clone(), issued_at, expires_at: issued_at + ttl }
	}

	/// Credential pairs in the order the portal issued them.
	pub fn cookies(&self) -> &[Cookie] {
		&self.cookies
	}

	/// Instant the session was issued.
	pub fn issued_at(&self) -> OffsetDateTime {
		self.issued_at
	}

	/// Instant after which the session must not be served from cache.
	pub fn expires_at(&self) -> OffsetDateTime {
		self.expires_at
	}

	/// Renders the `Cookie` header value (`name=value` pairs joined by `; `).
	///
	/// The returned string contains secrets and must not be logged.
	pub fn cookie_header(&self) -> String {
		let mut buf = String::new();

		for (idx, cookie) in self.cookies.iter().enumerate() {
			if idx > 0 {
				buf.push_str("; ");
			}

			buf.push_str(&cookie.name);
			buf.push('=');
			buf.push_str(cookie.value.expose());
		}

		buf
	}

	/// Computes the status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime) -> SessionStatus {
		if instant >= self.expires_at { SessionStatus::Expired } else { SessionStatus::Active }
	}

	/// Returns `true` if the session has expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		matches!(self.status_at(instant), SessionStatus::Expired)
	}

	/// Returns `true` if the session is expired relative to the current clock.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc())
	}
}
impl Debug for Session {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let names = self.cookies.iter().map(|cookie| cookie.name.as_str()).collect::<Vec<_>>();

		f.debug_struct("Session")
			.field("cookies", &names)
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Builder for [`Session`].
#[derive(Clone, Debug, Default)]
pub struct SessionBuilder {
	cookies: Vec<Cookie>,
	issued_at: Option<OffsetDateTime>,
	expires_at: Option<OffsetDateTime>,
	expires_in: Option<StdDuration>,
}
impl SessionBuilder {
	/// Appends a credential pair.
	pub fn cookie(mut self, name: impl Into<String>, value: impl Into<Secret>) -> Self {
		self.cookies.push(Cookie::new(name, value));

		self
	}

	/// Appends several credential pairs, preserving their order.
	pub fn cookies(mut self, cookies: impl IntoIterator<Item = Cookie>) -> Self {
		self.cookies.extend(cookies);

		self
	}

	/// Sets the issued-at instant.
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Convenience helper that stamps `issued_at` with the current clock.
	pub fn issued_now(self) -> Self {
		self.issued_at(OffsetDateTime::now_utc())
	}

	/// Sets an absolute expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets a relative expiry duration from the issued instant.
	pub fn expires_in(mut self, ttl: StdDuration) -> Self {
		self.expires_in = Some(ttl);

		self
	}

	/// Consumes the builder and produces a [`Session`].
	pub fn build(self) -> Result<Session, SessionBuilderError> {
		if self.cookies.is_empty() {
			return Err(SessionBuilderError::MissingCredentials);
		}

		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		let expires_at = match (self.expires_at, self.expires_in) {
			(Some(instant), _) => instant,
			(None, Some(ttl)) => issued_at + ttl,
			(None, None) => return Err(SessionBuilderError::MissingExpiry),
		};

		Ok(Session { cookies: self.cookies, issued_at, expires_at })
	}
}
