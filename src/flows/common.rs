//! Shared helpers for flow implementations (host resolution, endpoints, deadlines).

// self
use crate::{
	_prelude::*,
	auth::Credential,
	config::ConnectedApp,
	error::{ConfigError, TransportError},
};

/// Path of the user-agent authorize endpoint.
pub const AUTHORIZE_PATH: &str = "/services/oauth2/authorize";
/// Path of the token endpoint used by the refresh grant.
pub const TOKEN_PATH: &str = "/services/oauth2/token";
/// Path of the revocation endpoint.
pub const REVOKE_PATH: &str = "/services/oauth2/revoke";

/// Picks the origin OAuth endpoints are served from for `credential`.
///
/// Precedence: the credential's site URL, then its instance URL when the instance host is a
/// recognized custom domain, then the app's default login URL. The result keeps scheme, host,
/// and port only.
pub fn resolve_origin(app: &ConnectedApp, credential: Option<&Credential>) -> Url {
	let chosen = credential.and_then(|credential| {
		credential.site_url().or_else(|| {
			let instance = credential.instance_url();

			instance.host_str().filter(|host| app.is_custom_domain(host)).map(|_| instance)
		})
	});

	origin_of(chosen.unwrap_or(&app.login_url))
}

/// Joins an absolute endpoint path onto a resolved origin.
pub(crate) fn endpoint(origin: &Url, path: &str) -> Result<Url> {
	origin.join(path).map_err(|source| ConfigError::InvalidEndpoint { source }.into())
}

/// Bounds `fut` by the app's timeout, mapping expiry to [`TransportError::Timeout`].
pub(crate) async fn with_deadline<T, F>(
	app: &ConnectedApp,
	endpoint: &'static str,
	fut: F,
) -> Result<T>
where
	F: Future<Output = Result<T>>,
{
	match tokio::time::timeout(app.timeout, fut).await {
		Ok(result) => result,
		Err(_) => Err(TransportError::Timeout { endpoint, after: Some(app.timeout) }.into()),
	}
}

fn origin_of(url: &Url) -> Url {
	let mut origin = url.clone();

	origin.set_path("/");
	origin.set_query(None);
	origin.set_fragment(None);

	origin
}
