//! Ready-made [`Service`] descriptors.
//!
//! [`JsonResource`] fetches any JSON document relative to the instance URL; [`Identity`]
//! reads the identity endpoint named by the credential itself.

// std
use std::marker::PhantomData;
// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::Credential,
	connection::Service,
	error::{ConfigError, ParseError},
	http::{HttpRequest, http},
};

/// `GET` of a JSON document under the credential's instance URL.
pub struct JsonResource<T> {
	path: String,
	query: Vec<(String, String)>,
	_output: PhantomData<fn() -> T>,
}
impl<T> JsonResource<T> {
	/// Targets `path` (e.g. `/services/data/v60.0/limits`) on the instance.
	pub fn new(path: impl Into<String>) -> Self {
		Self { path: path.into(), query: Vec::new(), _output: PhantomData }
	}

	/// Appends a query parameter.
	pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((key.into(), value.into()));

		self
	}

	/// Path requested relative to the instance URL.
	pub fn path(&self) -> &str {
		&self.path
	}
}
impl<T> Debug for JsonResource<T> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("JsonResource")
			.field("path", &self.path)
			.field("query", &self.query)
			.finish()
	}
}
impl<T> Service for JsonResource<T>
where
	T: DeserializeOwned + Send,
{
	type Output = T;

	fn build_request(&self, credential: &Credential) -> Result<HttpRequest> {
		let mut url = credential
			.instance_url()
			.join(&self.path)
			.map_err(|source| ConfigError::InvalidEndpoint { source })?;

		if !self.query.is_empty() {
			url.query_pairs_mut().extend_pairs(&self.query);
		}

		authorized_get(&url, credential)
	}

	fn transform(&self, body: Vec<u8>) -> Result<Self::Output> {
		decode_json(&body)
	}
}

/// Subset of the identity endpoint response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityInfo {
	/// User identifier.
	pub user_id: String,
	/// Organization identifier.
	pub organization_id: String,
	/// Login name.
	pub username: String,
	/// Display name, when shared.
	#[serde(default)]
	pub display_name: Option<String>,
	/// Email address, when shared.
	#[serde(default)]
	pub email: Option<String>,
}

/// `GET` of the credential's identity URL.
#[derive(Clone, Copy, Debug, Default)]
pub struct Identity;
impl Service for Identity {
	type Output = IdentityInfo;

	fn build_request(&self, credential: &Credential) -> Result<HttpRequest> {
		authorized_get(credential.identity_url(), credential)
	}

	fn transform(&self, body: Vec<u8>) -> Result<Self::Output> {
		decode_json(&body)
	}
}

fn authorized_get(url: &Url, credential: &Credential) -> Result<HttpRequest> {
	http::Request::builder()
		.method(http::Method::GET)
		.uri(url.as_str())
		.header(http::header::AUTHORIZATION, credential.access_token().bearer())
		.header(http::header::ACCEPT, "application/json")
		.body(Vec::new())
		.map_err(|e| ConfigError::from(e).into())
}

fn decode_json<T>(body: &[u8]) -> Result<T>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|e| Error::Parse(ParseError::from(e)))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::*;

	#[derive(Debug, Deserialize)]
	struct Limits {
		#[serde(rename = "DailyApiRequests")]
		daily: Limit,
	}

	#[derive(Debug, Deserialize)]
	struct Limit {
		#[serde(rename = "Remaining")]
		remaining: u32,
	}

	#[test]
	fn json_resource_builds_an_authorized_get() {
		let credential = credential_fixture(FIXTURE_ORG, FIXTURE_USER, "A", None);
		let request = JsonResource::<Limits>::new("/services/data/v60.0/limits")
			.query("scope", "daily")
			.build_request(&credential)
			.expect("Request should build.");

		assert_eq!(request.method(), &http::Method::GET);
		assert_eq!(
			request.uri().to_string(),
			"https://na1.example.com/services/data/v60.0/limits?scope=daily"
		);
		assert_eq!(
			request.headers().get(http::header::AUTHORIZATION).map(|v| v.as_bytes()),
			Some(&b"Bearer A"[..]),
		);
	}

	#[test]
	fn json_resource_decodes_and_reports_paths() {
		let resource = JsonResource::<Limits>::new("/limits");
		let limits = resource
			.transform(br#"{"DailyApiRequests":{"Max":15000,"Remaining":14998}}"#.to_vec())
			.expect("Limits should decode.");

		assert_eq!(limits.daily.remaining, 14998);

		let err = resource
			.transform(br#"{"DailyApiRequests":{"Remaining":"many"}}"#.to_vec())
			.expect_err("A string count should fail.");

		assert!(matches!(
			err,
			Error::Parse(ParseError::Json { path, .. }) if path == "DailyApiRequests.Remaining"
		));
	}

	#[test]
	fn identity_targets_the_identity_url() {
		let credential = credential_fixture(FIXTURE_ORG, FIXTURE_USER, "A", None);
		let request = Identity.build_request(&credential).expect("Request should build.");

		assert_eq!(
			request.uri().to_string(),
			format!("https://login.example.com/id/{FIXTURE_ORG}/{FIXTURE_USER}")
		);

		let info = Identity
			.transform(
				format!(
					r#"{{"user_id":"{FIXTURE_USER}","organization_id":"{FIXTURE_ORG}","username":"ada@example.com"}}"#
				)
				.into_bytes(),
			)
			.expect("Identity should decode.");

		assert_eq!(info.username, "ada@example.com");
		assert_eq!(info.display_name, None);
	}
}
