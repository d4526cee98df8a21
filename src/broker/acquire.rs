//! Single-flight session acquisition.
//!
//! [`Broker::get_valid_session`] serves cached sessions while the validator still accepts them
//! and otherwise funnels callers into one login per identity, with at most one login in flight
//! across all identities. Callers that arrive while a refresh is running wait for it and reuse
//! its result instead of logging in again.
//!
//! The login itself runs on a spawned task that owns the identity mutex, the in-progress mark,
//! and the login gate. Dropping a caller's future therefore never abandons a half-finished
//! login: the task still caches its result and releases every lock in reverse acquisition order.

// self
use crate::{
	_prelude::*,
	auth::{Cookie, Identity, Session},
	broker::{Broker, SessionRequest},
	error::LockKind,
	login::{LoginContext, LoginError},
	notify::{self, Notification, NotificationCategory},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	store::{InProgressMark, RefreshState},
};

impl Broker {
	/// Returns a validated session for the request's identity, logging in only when needed.
	///
	/// Must be awaited inside a tokio runtime. Errors are typed: lock and gate timeouts surface
	/// as [`Error::LockTimeout`] and leave the cache untouched, as do provider failures.
	pub async fn get_valid_session(&self, request: SessionRequest) -> Result<Arc<Session>> {
		const KIND: FlowKind = FlowKind::Acquire;

		let span = FlowSpan::new(KIND, "get_valid_session", &request.identity);

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		self.metrics.record_attempt();

		let result = span.instrument(self.acquire(request)).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(err) => {
				if let Error::LockTimeout { lock, .. } = err {
					self.metrics.record_lock_timeout();
					obs::record_lock_timeout(*lock);
				}

				self.metrics.record_failure();
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
			},
		}

		result
	}

	/// Returns the `Cookie` header value for a validated session.
	pub async fn cookie_header(&self, request: SessionRequest) -> Result<String> {
		Ok(self.get_valid_session(request).await?.cookie_header())
	}

	async fn acquire(&self, request: SessionRequest) -> Result<Arc<Session>> {
		let identity = request.identity.clone();
		// A forced request only accepts sessions minted after it started.
		let not_before = request.force.then(OffsetDateTime::now_utc);
		let cached =
			if request.force { None } else { self.usable_session(&identity, None).await };

		if let Some(session) = cached {
			tracing::debug!("Serving cached session.");
			self.record_cache_hit();

			return Ok(session);
		}

		let coordinator = self.store.coordinator(&identity);

		if coordinator.is_in_progress(&self.store) {
			tracing::debug!("Refresh already running; waiting for it to finish.");

			if !coordinator.wait_until_idle(self.config.in_progress_wait_timeout).await {
				tracing::warn!(
					waited = ?self.config.in_progress_wait_timeout,
					"In-progress refresh did not finish in time; contending for the lock anyway."
				);
			}
			if let Some(session) = self.usable_session(&identity, not_before).await {
				tracing::debug!("Reusing the session produced by the concurrent refresh.");
				self.record_cache_hit();

				return Ok(session);
			}
		}

		let Some(identity_guard) = coordinator.lock(self.config.lock_timeout).await else {
			if let Some(session) = self.usable_session(&identity, not_before).await {
				tracing::debug!("Identity lock timed out but a fresh session is cached.");
				self.record_cache_hit();

				return Ok(session);
			}

			tracing::warn!(
				waited = ?self.config.lock_timeout,
				"Identity lock timed out and no valid session is cached."
			);

			return Err(Error::LockTimeout {
				identity,
				lock: LockKind::Identity,
				waited: self.config.lock_timeout,
			});
		};

		if let Some(session) = self.usable_session(&identity, not_before).await {
			tracing::debug!("Session was refreshed while waiting for the identity lock.");
			self.record_cache_hit();

			return Ok(session);
		}

		let broker = self.clone();
		let refresh = tokio::spawn(tracing::Instrument::in_current_span(async move {
			broker.refresh(request, not_before, coordinator, identity_guard).await
		}));

		match refresh.await {
			Ok(result) => result,
			Err(err) => {
				tracing::error!(error = %err, "Refresh task ended abnormally.");

				Err(Error::LoginProvider { identity, source: LoginError::Aborted })
			},
		}
	}

	/// Runs with the identity mutex held; owns every guard until the refresh settles.
	async fn refresh(
		&self,
		request: SessionRequest,
		not_before: Option<OffsetDateTime>,
		coordinator: Arc<RefreshState>,
		identity_guard: AsyncMutexGuard<()>,
	) -> Result<Arc<Session>> {
		let in_progress = InProgressMark::set(coordinator, self.store.clone());
		let Some(gate_guard) = self.gate.acquire(self.config.gate_timeout).await else {
			tracing::warn!(
				waited = ?self.config.gate_timeout,
				"Login gate is held by another identity; giving up."
			);
			drop(in_progress);
			drop(identity_guard);

			return Err(Error::LockTimeout {
				identity: request.identity,
				lock: LockKind::Gate,
				waited: self.config.gate_timeout,
			});
		};
		let result = self.login_locked(&request, not_before).await;

		drop(gate_guard);
		drop(in_progress);
		drop(identity_guard);

		result
	}

	async fn login_locked(
		&self,
		request: &SessionRequest,
		not_before: Option<OffsetDateTime>,
	) -> Result<Arc<Session>> {
		let identity = &request.identity;

		if let Some(session) = self.usable_session(identity, not_before).await {
			tracing::debug!("Session appeared while waiting for the login gate.");
			self.record_cache_hit();

			return Ok(session);
		}

		let cookies = match self.run_login(request).await {
			Ok(cookies) => cookies,
			Err(source) => {
				tracing::warn!(error = %source, "Login failed; cache left untouched.");
				self.notify(
					identity,
					NotificationCategory::Error,
					format!("Authentication failed: {source}"),
				);

				return Err(Error::LoginProvider { identity: identity.clone(), source });
			},
		};
		let Ok(candidate) = Session::issue(cookies, self.config.ttl) else {
			tracing::warn!("Login returned no credentials.");
			self.notify(
				identity,
				NotificationCategory::Error,
				"Authentication failed: the portal issued no session cookies.",
			);

			return Err(Error::NoCredentialsAvailable { identity: identity.clone() });
		};

		if !self.validate(&candidate, identity).await {
			tracing::warn!("Freshly issued session failed validation.");
			self.notify(
				identity,
				NotificationCategory::Error,
				"Authentication failed: the new session was not accepted by the portal.",
			);

			return Err(Error::ValidationFailure { identity: identity.clone() });
		}

		// Validation may take seconds; expiry counts from the moment the session is cached.
		let session = Arc::new(candidate.renewed(self.config.ttl));

		self.store.put(identity.clone(), session.clone());
		tracing::info!(expires_at = %session.expires_at(), "Fresh session cached.");
		self.notify(identity, NotificationCategory::Success, "Authentication successful.");

		Ok(session)
	}

	async fn run_login(&self, request: &SessionRequest) -> Result<Vec<Cookie>, LoginError> {
		const KIND: FlowKind = FlowKind::Login;

		let identity = &request.identity;
		let span = FlowSpan::new(KIND, "login", identity);
		let ceiling = self.config.approval_ceiling;

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		self.metrics.record_login();

		if self.login.requires_approval() {
			self.notify(
				identity,
				NotificationCategory::ApprovalRequired,
				"Login approval required. Please confirm the prompt on your device.",
			);
		}

		let context = LoginContext::new(identity, &request.secret, ceiling, self.notifier.as_ref());
		let result = span
			.instrument(async {
				match tokio::time::timeout(ceiling, self.login.login(context)).await {
					Ok(result) => result,
					Err(_) => Err(LoginError::ApprovalTimeout { ceiling }),
				}
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Returns the cached session if it is unexpired, recent enough, and still accepted.
	async fn usable_session(
		&self,
		identity: &Identity,
		not_before: Option<OffsetDateTime>,
	) -> Option<Arc<Session>> {
		let cached = self.store.get(identity)?;

		if cached.is_expired_at(OffsetDateTime::now_utc()) {
			tracing::debug!(expires_at = %cached.expires_at(), "Cached session expired.");

			return None;
		}
		if not_before.is_some_and(|start| cached.issued_at() < start) {
			return None;
		}
		if !self.validate(&cached, identity).await {
			tracing::debug!("Cached session was rejected by the validator.");

			return None;
		}

		Some(cached)
	}

	async fn validate(&self, session: &Session, identity: &Identity) -> bool {
		const KIND: FlowKind = FlowKind::Validate;

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let valid = self.validator.is_valid(session, identity).await;
		let outcome = if valid { FlowOutcome::Success } else { FlowOutcome::Failure };

		obs::record_flow_outcome(KIND, outcome);

		valid
	}

	fn record_cache_hit(&self) {
		self.metrics.record_cache_hit();
		obs::record_flow_outcome(FlowKind::Acquire, FlowOutcome::CacheHit);
	}

	fn notify(
		&self,
		identity: &Identity,
		category: NotificationCategory,
		message: impl Into<String>,
	) {
		let notification = Notification::new(identity.clone(), category, message);

		notify::deliver(self.notifier.as_ref(), notification);
	}
}
