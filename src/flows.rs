//! OAuth flow primitives: interactive grant, refresh-token grant, and revocation.
//!
//! [`OAuthFlows`] owns the connected-app configuration, the HTTP transport, and the injected
//! [`AuthorizationPresenter`]. Each primitive resolves its login host from the credential it
//! works on (see [`resolve_origin`]) and reports its outcome through [`crate::obs`].
//! Coordination between concurrent callers lives one level up, in the
//! [`Authorizer`](crate::authorizer::Authorizer).

pub mod common;
pub mod interactive;

mod refresh;
mod revoke;

pub use common::*;
pub use interactive::*;

// self
use crate::{_prelude::*, config::ConnectedApp, http::HttpTransport};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

/// Stateless OAuth primitives bound to one connected app.
#[derive(Clone)]
pub struct OAuthFlows {
	/// Connected-app configuration used by every grant.
	pub app: ConnectedApp,
	/// Transport used for token, revoke, and API calls.
	pub transport: Arc<dyn HttpTransport>,
	/// Capability that shows the login page and waits for the callback.
	pub presenter: Arc<dyn AuthorizationPresenter>,
}
impl OAuthFlows {
	/// Creates flows over a caller-provided transport and presenter.
	pub fn new(
		app: ConnectedApp,
		transport: Arc<dyn HttpTransport>,
		presenter: Arc<dyn AuthorizationPresenter>,
	) -> Self {
		Self { app, transport, presenter }
	}

	/// Creates flows backed by a reqwest client honoring the app's timeout.
	#[cfg(feature = "reqwest")]
	pub fn with_reqwest(
		app: ConnectedApp,
		presenter: Arc<dyn AuthorizationPresenter>,
	) -> Result<Self> {
		let transport = ReqwestHttpClient::new(app.timeout)?;

		Ok(Self::new(app, Arc::new(transport), presenter))
	}
}
impl Debug for OAuthFlows {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuthFlows").field("app", &self.app).finish_non_exhaustive()
	}
}
