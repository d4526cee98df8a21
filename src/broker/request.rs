// self
use crate::{
	_prelude::*,
	auth::{Identity, Secret},
};

/// Parameters of one `get_valid_session` call.
#[derive(Clone, Debug)]
pub struct SessionRequest {
	/// Identity whose session is requested.
	pub identity: Identity,
	/// Secret handed to the login provider if a login is needed.
	pub secret: Secret,
	/// Skips the cache and logs in even when a valid session is cached.
	pub force: bool,
}
impl SessionRequest {
	/// Creates a cache-first request.
	pub fn new(identity: Identity, secret: impl Into<Secret>) -> Self {
		Self { identity, secret: secret.into(), force: false }
	}

	/// Forces a fresh login.
	///
	/// A forced request is still satisfied by a session that another caller's login produced
	/// after this request started; it never returns the session it was asked to replace.
	pub fn force_refresh(mut self) -> Self {
		self.force = true;

		self
	}

	/// Overrides the force flag.
	pub fn with_force(mut self, force: bool) -> Self {
		self.force = force;

		self
	}
}
