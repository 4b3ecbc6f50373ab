//! Session-level error types shared across flows, the authorizer, stores, and connections.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type SharedError = Arc<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
///
/// Every variant is cheaply cloneable so a single in-flight grant can hand the same
/// outcome to all of its waiting callers.
#[derive(Clone, Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// OAuth response could not be turned into a credential.
	#[error(transparent)]
	Parse(#[from] ParseError),

	/// The access token was rejected and must be renewed before retrying.
	#[error("Authentication is required (HTTP {status}).")]
	AuthenticationRequired {
		/// HTTP status that signalled the rejection.
		status: u16,
	},
	/// Provider rejected the grant (e.g., expired or revoked refresh token).
	#[error("Provider rejected the grant: {reason}.")]
	InvalidGrant {
		/// Provider- or client-supplied reason string.
		reason: String,
	},
	/// The user dismissed the interactive login before it completed.
	#[error("The user cancelled the interactive login.")]
	UserCancelled,
	/// Token revocation did not succeed on the server.
	#[error("Token revocation failed: {reason}.")]
	Revocation {
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Human-readable failure summary.
		reason: String,
	},
	/// API endpoint returned a non-success response unrelated to authentication.
	#[error("Request failed with HTTP {status}.")]
	Response {
		/// HTTP status code returned by the endpoint.
		status: u16,
		/// Response body preview.
		body: String,
	},
	/// A connection request failed; `source` is the unmodified cause.
	#[error("Request failed during {stage}.")]
	Request {
		/// Step of the request that failed.
		stage: RequestStage,
		/// Error raised by that step.
		#[source]
		source: Box<Error>,
	},
}
impl Error {
	/// Stage a connection request failed at, when this error was surfaced by one.
	pub fn stage(&self) -> Option<RequestStage> {
		match self {
			Self::Request { stage, .. } => Some(*stage),
			_ => None,
		}
	}

	/// Cause with any stage annotation peeled off.
	pub fn root(&self) -> &Error {
		let mut error = self;

		while let Self::Request { source, .. } = error {
			error = source.as_ref();
		}

		error
	}

	pub(crate) fn at(self, stage: RequestStage) -> Self {
		Self::Request { stage, source: Box::new(self) }
	}
}

/// Steps of [`Connection::request`](crate::connection::Connection::request).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestStage {
	/// Loading the stored credential, or logging in when there is none.
	ResolveCredential,
	/// First attempt with the resolved credential.
	Execute,
	/// Renewing the credential after an authentication failure.
	Reauthenticate,
	/// Saving the renewed credential.
	Persist,
	/// Single retry with the renewed credential.
	Retry,
}
impl RequestStage {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::ResolveCredential => "resolve_credential",
			Self::Execute => "execute",
			Self::Reauthenticate => "reauthenticate",
			Self::Persist => "persist",
			Self::Retry => "retry",
		}
	}
}
impl Display for RequestStage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Configuration and request-construction failures.
#[derive(Clone, Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: SharedError,
	},
	/// HTTP request construction failed.
	#[error("HTTP request could not be constructed: {message}.")]
	HttpRequest {
		/// Builder failure summary.
		message: String,
	},
	/// Connected app configuration failed validation.
	#[error(transparent)]
	ConnectedApp(#[from] crate::config::ConnectedAppError),
	/// Endpoint URL could not be derived from the resolved host.
	#[error("Endpoint URL is invalid.")]
	InvalidEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Arc::new(src) }
	}
}
impl From<oauth2::http::Error> for ConfigError {
	fn from(e: oauth2::http::Error) -> Self {
		Self::HttpRequest { message: e.to_string() }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures raised while turning OAuth responses into credentials.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ParseError {
	/// A required key was absent from the response.
	#[error("OAuth response is missing `{field}`.")]
	MissingField {
		/// Missing key.
		field: &'static str,
	},
	/// A URL-valued key could not be parsed.
	#[error("OAuth response field `{field}` is not a valid URL.")]
	InvalidUrl {
		/// Offending key.
		field: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// The `issued_at` value is not a millisecond timestamp.
	#[error("OAuth response field `issued_at` is not a valid timestamp: {value}.")]
	InvalidTimestamp {
		/// Raw value received.
		value: String,
	},
	/// The identity URL lacks the org and user path segments.
	#[error("Identity URL must end with org and user segments: {url}.")]
	InvalidIdentityUrl {
		/// Identity URL received.
		url: String,
	},
	/// The redirect carried no token fragment.
	#[error("Callback URL carries no OAuth fragment.")]
	MissingFragment,
	/// The redirect `state` did not match the value sent with the authorize URL.
	#[error("Callback state does not match the authorization request.")]
	StateMismatch,
	/// A JSON body could not be decoded.
	#[error("OAuth response is malformed JSON at `{path}`: {message}.")]
	Json {
		/// Path to the failing element.
		path: String,
		/// Decoder message.
		message: String,
	},
}
impl From<serde_path_to_error::Error<serde_json::Error>> for ParseError {
	fn from(e: serde_path_to_error::Error<serde_json::Error>) -> Self {
		Self::Json { path: e.path().to_string(), message: e.inner().to_string() }
	}
}

/// Transport-level failures (network, IO, timeout).
#[derive(Clone, Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {endpoint}.")]
	Network {
		/// Endpoint label being called.
		endpoint: &'static str,
		/// Transport-specific network error.
		#[source]
		source: SharedError,
	},
	/// The call exceeded its deadline.
	#[error("Request to {endpoint} timed out.")]
	Timeout {
		/// Endpoint label being called.
		endpoint: &'static str,
		/// Deadline that elapsed, when the caller enforced one.
		after: Option<std::time::Duration>,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(
		endpoint: &'static str,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { endpoint, source: Arc::new(src) }
	}
}
