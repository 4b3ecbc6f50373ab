//! Transport primitives shared by OAuth endpoints and authenticated API calls.
//!
//! [`HttpTransport`] is the crate's only dependency on an HTTP stack. Requests and responses
//! use the `http` types re-exported by `oauth2` ([`HttpRequest`], [`HttpResponse`]) so
//! callers can plug in any client, or a scripted fake in tests, without the rest of the
//! crate noticing.

// crates.io
pub use oauth2::{HttpRequest, HttpResponse, http};
// self
use crate::{_prelude::*, error::TransportError};

/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + 'a + Send>>;

/// Executes a single HTTP exchange.
///
/// Implementations must not follow redirects: the token and revoke endpoints answer
/// directly, and API calls should surface 3xx responses to the descriptor that issued them.
/// Non-2xx statuses are returned as responses, never as transport errors.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and resolves with the full response body.
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_>;
}

/// Form-encoded POST helper used by the refresh and revoke endpoints.
pub(crate) fn form_post(url: &Url, pairs: &[(&str, &str)]) -> Result<HttpRequest> {
	let body = url::form_urlencoded::Serializer::new(String::new()).extend_pairs(pairs).finish();

	http::Request::builder()
		.method(http::Method::POST)
		.uri(url.as_str())
		.header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
		.header(http::header::ACCEPT, "application/json")
		.body(body.into_bytes())
		.map_err(|e| crate::error::ConfigError::from(e).into())
}

/// Short, lossy preview of a response body for error messages.
pub(crate) fn body_preview(body: &[u8]) -> String {
	const LIMIT: usize = 256;

	let text = String::from_utf8_lossy(body);

	if text.chars().count() <= LIMIT {
		return text.into_owned();
	}

	let mut buf: String = text.chars().take(LIMIT).collect();

	buf.push('…');

	buf
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// The default client disables redirects and applies the connected app's timeout, so
/// refresh and revoke calls always finish in bounded time.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Builds a client with redirects disabled and the provided request timeout.
	pub fn new(timeout: std::time::Duration) -> Result<Self> {
		let client = ReqwestClient::builder()
			.redirect(reqwest::redirect::Policy::none())
			.timeout(timeout)
			.build()
			.map_err(crate::error::ConfigError::from)?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestHttpClient {
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let request: reqwest::Request =
				request.try_into().map_err(|e| map_reqwest_error("request", e))?;
			let response = client.execute(request).await.map_err(|e| map_reqwest_error("http", e))?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let body = response.bytes().await.map_err(|e| map_reqwest_error("http", e))?;
			let mut converted = HttpResponse::new(body.to_vec());

			*converted.status_mut() = status;
			*converted.headers_mut() = headers;

			Ok(converted)
		})
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(endpoint: &'static str, err: ReqwestError) -> TransportError {
	if err.is_timeout() {
		TransportError::Timeout { endpoint, after: None }
	} else {
		TransportError::network(endpoint, err)
	}
}
