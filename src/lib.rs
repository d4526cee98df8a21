//! Single-flight session broker: cache portal login sessions, serialize expensive 2FA logins
//! behind one global gate, and validate credentials before handing them to callers.
//!
//! The entry point is [`broker::Broker::get_valid_session`]. Everything the broker talks to
//! beyond its own cache (the login automation, the credential probe, and the user-facing
//! notification channel) is a trait object supplied at construction time.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod broker;
pub mod config;
pub mod error;
pub mod ext;
pub mod gate;
pub mod login;
pub mod notify;
pub mod obs;
pub mod store;
pub mod validate;

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use async_lock::{Mutex as AsyncMutex, MutexGuardArc as AsyncMutexGuard};
	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use httpmock as _;
