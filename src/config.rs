//! Connected-app configuration shared by every flow.
//!
//! [`ConnectedApp`] carries the consumer key, the registered callback URL, the default login
//! server, and the hosts treated as "custom domains" during host resolution. Build it through
//! [`ConnectedAppBuilder`], which validates the invariants the flows rely on.

// self
use crate::_prelude::*;

/// Login server used when neither a site URL nor a custom-domain instance applies.
pub const DEFAULT_LOGIN_URL: &str = "https://login.salesforce.com";
/// Host suffix identifying "My Domain" instances that can serve OAuth endpoints directly.
pub const DEFAULT_CUSTOM_DOMAIN_SUFFIX: &str = ".my.salesforce.com";

const DEFAULT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Errors raised while constructing or validating a [`ConnectedApp`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ConnectedAppError {
	/// Consumer key is required for every grant.
	#[error("Missing consumer key.")]
	MissingConsumerKey,
	/// Login URL must be an absolute http(s) URL with a host.
	#[error("The login URL must be an http(s) URL with a host: {url}.")]
	InvalidLoginUrl {
		/// Login URL that failed validation.
		url: String,
	},
	/// Timeouts must be finite and non-zero.
	#[error("The network timeout must be greater than zero.")]
	ZeroTimeout,
	/// Custom-domain suffixes cannot be blank.
	#[error("Custom domain suffixes cannot be empty.")]
	EmptyCustomDomainSuffix,
}

/// Immutable connected-app configuration consumed by flows.
///
/// Deserialization runs the same validation as [`ConnectedAppBuilder::build`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ConnectedAppRepr")]
pub struct ConnectedApp {
	/// OAuth consumer key (`client_id`).
	pub consumer_key: String,
	/// Callback URL registered for the connected app; usually a custom scheme.
	pub callback_url: Url,
	/// Default login server origin.
	pub login_url: Url,
	/// Host suffixes recognized as custom-domain instances.
	pub custom_domain_suffixes: Vec<String>,
	/// Deadline applied to refresh and revoke calls, serialized in milliseconds.
	#[serde(with = "timeout_millis")]
	pub timeout: std::time::Duration,
}
impl ConnectedApp {
	/// Creates a new builder for the provided consumer key and callback URL.
	pub fn builder(consumer_key: impl Into<String>, callback_url: Url) -> ConnectedAppBuilder {
		ConnectedAppBuilder::new(consumer_key, callback_url)
	}

	/// Scheme the interactive session waits on, e.g. `myapp` for `myapp://oauth/done`.
	pub fn callback_scheme(&self) -> &str {
		self.callback_url.scheme()
	}

	/// Returns `true` when `host` belongs to a recognized custom domain.
	pub fn is_custom_domain(&self, host: &str) -> bool {
		let host = host.to_ascii_lowercase();

		self.custom_domain_suffixes
			.iter()
			.any(|suffix| host.ends_with(&suffix.to_ascii_lowercase()))
	}

	fn validate(&self) -> Result<(), ConnectedAppError> {
		if self.consumer_key.trim().is_empty() {
			return Err(ConnectedAppError::MissingConsumerKey);
		}
		if !matches!(self.login_url.scheme(), "https" | "http")
			|| self.login_url.host_str().is_none()
		{
			return Err(ConnectedAppError::InvalidLoginUrl { url: self.login_url.to_string() });
		}
		if self.timeout.is_zero() {
			return Err(ConnectedAppError::ZeroTimeout);
		}
		if self.custom_domain_suffixes.iter().any(|suffix| suffix.trim().is_empty()) {
			return Err(ConnectedAppError::EmptyCustomDomainSuffix);
		}

		Ok(())
	}
}

/// Builder for [`ConnectedApp`] values.
#[derive(Debug)]
pub struct ConnectedAppBuilder {
	consumer_key: String,
	callback_url: Url,
	login_url: Option<Url>,
	custom_domain_suffixes: Vec<String>,
	timeout: std::time::Duration,
}
impl ConnectedAppBuilder {
	/// Creates a builder seeded with the consumer key and callback URL.
	pub fn new(consumer_key: impl Into<String>, callback_url: Url) -> Self {
		Self {
			consumer_key: consumer_key.into(),
			callback_url,
			login_url: None,
			custom_domain_suffixes: vec![DEFAULT_CUSTOM_DOMAIN_SUFFIX.into()],
			timeout: DEFAULT_TIMEOUT,
		}
	}

	/// Overrides the default login server (e.g. `https://test.salesforce.com` for sandboxes).
	pub fn login_url(mut self, url: Url) -> Self {
		self.login_url = Some(url);

		self
	}

	/// Adds a host suffix treated as a custom domain.
	pub fn custom_domain_suffix(mut self, suffix: impl Into<String>) -> Self {
		self.custom_domain_suffixes.push(suffix.into());

		self
	}

	/// Replaces the custom-domain suffix list.
	pub fn custom_domain_suffixes<I, S>(mut self, suffixes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.custom_domain_suffixes = suffixes.into_iter().map(Into::into).collect();

		self
	}

	/// Overrides the refresh/revoke deadline (defaults to 30 seconds).
	pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ConnectedApp, ConnectedAppError> {
		let login_url = match self.login_url {
			Some(url) => url,
			None => Url::parse(DEFAULT_LOGIN_URL).map_err(|_| {
				ConnectedAppError::InvalidLoginUrl { url: DEFAULT_LOGIN_URL.into() }
			})?,
		};
		let app = ConnectedApp {
			consumer_key: self.consumer_key,
			callback_url: self.callback_url,
			login_url,
			custom_domain_suffixes: self.custom_domain_suffixes,
			timeout: self.timeout,
		};

		app.validate()?;

		Ok(app)
	}
}

#[derive(Deserialize)]
struct ConnectedAppRepr {
	consumer_key: String,
	callback_url: Url,
	login_url: Url,
	custom_domain_suffixes: Vec<String>,
	#[serde(with = "timeout_millis")]
	timeout: std::time::Duration,
}
impl TryFrom<ConnectedAppRepr> for ConnectedApp {
	type Error = ConnectedAppError;

	fn try_from(repr: ConnectedAppRepr) -> Result<Self, Self::Error> {
		ConnectedAppBuilder::new(repr.consumer_key, repr.callback_url)
			.login_url(repr.login_url)
			.custom_domain_suffixes(repr.custom_domain_suffixes)
			.timeout(repr.timeout)
			.build()
	}
}

mod timeout_millis {
	// crates.io
	use serde::{Deserializer, Serializer};
	// self
	use crate::_prelude::*;

	pub(super) fn serialize<S>(
		value: &std::time::Duration,
		serializer: S,
	) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
	}

	pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<std::time::Duration, D::Error>
	where
		D: Deserializer<'de>,
	{
		u64::deserialize(deserializer).map(std::time::Duration::from_millis)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn callback() -> Url {
		Url::parse("myapp://oauth/done").expect("Callback fixture should parse.")
	}

	#[test]
	fn builder_applies_defaults() {
		let app = ConnectedApp::builder("consumer", callback())
			.build()
			.expect("Default configuration should be valid.");

		assert_eq!(app.login_url.as_str(), "https://login.salesforce.com/");
		assert_eq!(app.callback_scheme(), "myapp");
		assert_eq!(app.timeout, DEFAULT_TIMEOUT);
		assert!(app.is_custom_domain("acme.my.salesforce.com"));
		assert!(app.is_custom_domain("ACME.MY.SALESFORCE.COM"));
		assert!(!app.is_custom_domain("na1.salesforce.com"));
	}

	#[test]
	fn builder_rejects_invalid_settings() {
		assert_eq!(
			ConnectedApp::builder("  ", callback()).build(),
			Err(ConnectedAppError::MissingConsumerKey),
		);
		assert_eq!(
			ConnectedApp::builder("consumer", callback())
				.timeout(std::time::Duration::ZERO)
				.build(),
			Err(ConnectedAppError::ZeroTimeout),
		);
		assert!(matches!(
			ConnectedApp::builder("consumer", callback())
				.login_url(Url::parse("ftp://login.example.com").expect("URL should parse."))
				.build(),
			Err(ConnectedAppError::InvalidLoginUrl { .. })
		));
		assert_eq!(
			ConnectedApp::builder("consumer", callback()).custom_domain_suffix("").build(),
			Err(ConnectedAppError::EmptyCustomDomainSuffix),
		);
	}

	#[test]
	fn configuration_round_trips_through_json() {
		let app = ConnectedApp::builder("consumer", callback())
			.login_url(Url::parse("https://test.salesforce.com").expect("URL should parse."))
			.timeout(std::time::Duration::from_secs(5))
			.build()
			.expect("Sandbox configuration should be valid.");
		let payload = serde_json::to_string(&app).expect("Configuration should serialize.");
		let decoded: ConnectedApp =
			serde_json::from_str(&payload).expect("Configuration should deserialize.");

		assert_eq!(decoded, app);
		assert!(payload.contains("\"timeout\":5000"));
	}

	#[test]
	fn sub_second_timeout_survives_a_round_trip() {
		let app = ConnectedApp::builder("consumer", callback())
			.timeout(std::time::Duration::from_millis(500))
			.build()
			.expect("A 500 ms timeout should be valid.");
		let payload = serde_json::to_string(&app).expect("Configuration should serialize.");
		let decoded: ConnectedApp =
			serde_json::from_str(&payload).expect("Configuration should deserialize.");

		assert!(payload.contains("\"timeout\":500"));
		assert_eq!(decoded.timeout, std::time::Duration::from_millis(500));
	}

	#[test]
	fn deserialization_rejects_invalid_settings() {
		let payload = |consumer_key: &str, timeout: u64| {
			serde_json::json!({
				"consumer_key": consumer_key,
				"callback_url": "myapp://oauth/done",
				"login_url": "https://login.salesforce.com",
				"custom_domain_suffixes": [".my.salesforce.com"],
				"timeout": timeout,
			})
			.to_string()
		};
		let zero = serde_json::from_str::<ConnectedApp>(&payload("consumer", 0))
			.expect_err("A zero timeout should be rejected on load.");

		assert!(zero.to_string().contains("greater than zero"));
		assert!(serde_json::from_str::<ConnectedApp>(&payload(" ", 1000)).is_err());
		assert!(serde_json::from_str::<ConnectedApp>(&payload("consumer", 1000)).is_ok());
	}
}
