//! Reqwest-backed [`SessionValidator`] that replays the session against an authenticated page.

// crates.io
use reqwest::{
	header::{COOKIE, LOCATION},
	redirect::Policy,
};
// self
use crate::{
	_prelude::*,
	auth::{Identity, Session},
	error::ConfigError,
	validate::{ProbeVerdict, SessionValidator, ValidationFuture},
};

/// Validator that issues one `GET` to a known authenticated endpoint.
///
/// Redirects are never followed: a portal that bounces stale sessions to its login page must
/// surface as [`ProbeVerdict::Redirected`], not as the login page's 200.
#[derive(Clone, Debug)]
pub struct ProbeValidator {
	client: ReqwestClient,
	endpoint: Url,
	markers: Vec<String>,
}
impl ProbeValidator {
	/// Default request timeout.
	pub const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(5);

	/// Creates a validator for `endpoint` with default settings and no content markers.
	pub fn new(endpoint: Url) -> Result<Self, ConfigError> {
		Self::builder(endpoint).build()
	}

	/// Returns a builder for `endpoint`.
	pub fn builder(endpoint: Url) -> ProbeValidatorBuilder {
		ProbeValidatorBuilder::new(endpoint)
	}

	/// Probe endpoint.
	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}

	/// Sends the probe and classifies the response.
	pub async fn probe(&self, session: &Session) -> ProbeVerdict {
		if session.cookies().is_empty() {
			return ProbeVerdict::Empty;
		}

		let response = match self
			.client
			.get(self.endpoint.clone())
			.header(COOKIE, session.cookie_header())
			.send()
			.await
		{
			Ok(response) => response,
			Err(err) => return ProbeVerdict::Transport { message: err.to_string() },
		};
		let status = response.status().as_u16();

		if status != 200 {
			let location =
				response.headers().get(LOCATION).and_then(|value| value.to_str().ok());

			return ProbeVerdict::classify(status, location, "", &self.markers);
		}

		match response.text().await {
			Ok(body) => ProbeVerdict::classify(status, None, &body, &self.markers),
			Err(err) => ProbeVerdict::Transport { message: err.to_string() },
		}
	}
}
impl SessionValidator for ProbeValidator {
	fn is_valid<'a>(
		&'a self,
		session: &'a Session,
		identity: &'a Identity,
	) -> ValidationFuture<'a> {
		Box::pin(async move {
			let verdict = self.probe(session).await;

			match &verdict {
				ProbeVerdict::Confirmed => {
					tracing::debug!(identity = %identity, "Session confirmed by page content.");
				},
				ProbeVerdict::Unconfirmed => {
					tracing::debug!(
						identity = %identity,
						"Session probe returned 200 without a content marker; trusting it."
					);
				},
				ProbeVerdict::Transport { message } => {
					tracing::warn!(identity = %identity, error = %message, "Session probe failed.");
				},
				rejected => {
					tracing::info!(
						identity = %identity,
						verdict = rejected.as_str(),
						"Session rejected by probe."
					);
				},
			}

			verdict.is_valid()
		})
	}
}

/// Builder for [`ProbeValidator`].
#[derive(Clone, Debug)]
pub struct ProbeValidatorBuilder {
	endpoint: Url,
	markers: Vec<String>,
	timeout: StdDuration,
	user_agent: Option<String>,
}
impl ProbeValidatorBuilder {
	fn new(endpoint: Url) -> Self {
		Self {
			endpoint,
			markers: Vec::new(),
			timeout: ProbeValidator::DEFAULT_TIMEOUT,
			user_agent: None,
		}
	}

	/// Adds a body fragment whose presence confirms an authenticated page.
	pub fn marker(mut self, marker: impl Into<String>) -> Self {
		self.markers.push(marker.into());

		self
	}

	/// Adds several confirmation markers.
	pub fn markers<I, S>(mut self, markers: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.markers.extend(markers.into_iter().map(Into::into));

		self
	}

	/// Overrides the request timeout (defaults to 5 seconds).
	pub fn timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Sets the `User-Agent` header sent with every probe.
	pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = Some(user_agent.into());

		self
	}

	/// Builds the validator and its dedicated HTTP client.
	pub fn build(self) -> Result<ProbeValidator, ConfigError> {
		let mut client = ReqwestClient::builder().redirect(Policy::none()).timeout(self.timeout);

		if let Some(user_agent) = self.user_agent {
			client = client.user_agent(user_agent);
		}

		Ok(ProbeValidator {
			client: client.build()?,
			endpoint: self.endpoint,
			markers: self.markers,
		})
	}
}
