//! Request signing contracts that let downstream crates attach broker-issued sessions to
//! arbitrary HTTP clients.

// self
use crate::auth::Session;

/// Describes how to attach a [`Session`] to an outbound request without constraining the HTTP
/// client type.
pub trait RequestSignerExt<Request, Error>
where
	Self: Send + Sync,
{
	/// Consumes the provided request and injects the session's credential pairs.
	fn attach_session(&self, request: Request, session: &Session) -> Result<Request, Error>;
}

/// Signer that sends the session as a single `Cookie` header.
#[derive(Clone, Copy, Debug, Default)]
pub struct CookieSigner;
#[cfg(feature = "reqwest")]
impl RequestSignerExt<reqwest::RequestBuilder, std::convert::Infallible> for CookieSigner {
	fn attach_session(
		&self,
		request: reqwest::RequestBuilder,
		session: &Session,
	) -> Result<reqwest::RequestBuilder, std::convert::Infallible> {
		if session.cookies().is_empty() {
			return Ok(request);
		}

		Ok(request.header(reqwest::header::COOKIE, session.cookie_header()))
	}
}
