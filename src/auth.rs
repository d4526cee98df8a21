//! Auth-domain identifiers, redacted secrets, and cached session models.

pub mod identity;
pub mod secret;
pub mod session;

pub use identity::*;
pub use secret::*;
pub use session::*;
