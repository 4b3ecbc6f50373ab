#![cfg(feature = "reqwest")]

// std
use std::{
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};
// crates.io
use httpmock::prelude::*;
// self
use sforce_auth::{
	Error,
	auth::{Credential, TokenSecret},
	authorizer::Authorizer,
	config::ConnectedApp,
	flows::{AuthorizationPresenter, OAuthFlows, PresenterFuture},
	url::Url,
};

const ORG: &str = "00D5g000004ABCD";
const USER: &str = "0055g00000XYZ12";

fn token_body(base: &str, access: &str) -> String {
	serde_json::json!({
		"access_token": access,
		"instance_url": base,
		"id": format!("{base}/id/{ORG}/{USER}"),
		"issued_at": "1700000000000",
		"token_type": "Bearer",
		"signature": "ignored",
	})
	.to_string()
}

fn seeded(base: &str, access: &str, refresh: Option<&str>) -> Credential {
	let mut body = serde_json::json!({
		"access_token": access,
		"instance_url": base,
		"id": format!("{base}/id/{ORG}/{USER}"),
		"issued_at": 1_700_000_000_000_i64,
	});

	if let Some(refresh) = refresh {
		body["refresh_token"] = refresh.into();
	}

	Credential::from_json(body.to_string().as_bytes(), None)
		.expect("Seed credential should parse.")
}

fn app(server: &MockServer) -> ConnectedApp {
	ConnectedApp::builder(
		"consumer-it",
		Url::parse("sfdc-it://oauth/done").expect("Callback URL should parse."),
	)
	.login_url(Url::parse(&server.base_url()).expect("Mock base URL should parse."))
	.timeout(Duration::from_secs(5))
	.build()
	.expect("Connected app should be valid.")
}

/// Completes the login by echoing `state` with a credential pointing at the mock server.
struct EchoPresenter {
	base: String,
	presentations: AtomicUsize,
}
impl AuthorizationPresenter for EchoPresenter {
	fn present<'a>(&'a self, authorize_url: Url, callback_scheme: &'a str) -> PresenterFuture<'a> {
		Box::pin(async move {
			self.presentations.fetch_add(1, Ordering::SeqCst);

			let state = authorize_url
				.query_pairs()
				.find(|(key, _)| key == "state")
				.map(|(_, value)| value.into_owned())
				.expect("Authorize URL should carry state.");
			let fragment = url::form_urlencoded::Serializer::new(String::new())
				.append_pair("access_token", "interactive")
				.append_pair("refresh_token", "R-interactive")
				.append_pair("instance_url", &self.base)
				.append_pair("id", &format!("{}/id/{ORG}/{USER}", self.base))
				.append_pair("issued_at", "1700000000000")
				.append_pair("state", &state)
				.finish();

			Ok(Url::parse(&format!("{callback_scheme}://oauth/done#{fragment}"))
				.expect("Callback URL should parse."))
		})
	}
}

fn flows(server: &MockServer) -> (OAuthFlows, Arc<EchoPresenter>) {
	let presenter =
		Arc::new(EchoPresenter { base: server.base_url(), presentations: AtomicUsize::new(0) });
	let flows = OAuthFlows::with_reqwest(app(server), presenter.clone())
		.expect("Reqwest-backed flows should build.");

	(flows, presenter)
}

#[tokio::test]
async fn refresh_grant_parses_json_and_keeps_refresh_token() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/services/oauth2/token")
				.header("content-type", "application/x-www-form-urlencoded");
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body(&server.base_url(), "fresh"));
		})
		.await;
	let (flows, presenter) = flows(&server);
	let stale = seeded(&server.base_url(), "stale", Some("R1"));
	let fresh = flows.refresh_grant(&stale).await.expect("Refresh should succeed.");

	mock.assert_calls_async(1).await;

	assert_eq!(fresh.access_token().expose(), "fresh");
	assert_eq!(fresh.refresh_token().map(TokenSecret::expose), Some("R1"));
	assert_eq!(fresh.user_identifier().to_string(), format!("{ORG}/{USER}"));
	assert_eq!(presenter.presentations.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn rejected_refresh_falls_back_to_interactive_login() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/services/oauth2/token");
			then.status(400)
				.header("content-type", "application/json")
				.body(r#"{"error":"invalid_grant","error_description":"expired token"}"#);
		})
		.await;
	let (flows, presenter) = flows(&server);
	let authorizer = Authorizer::new(flows);
	let stale = seeded(&server.base_url(), "stale", Some("R1"));
	let credential =
		authorizer.grant_credential(Some(&stale)).await.expect("Fallback login should succeed.");

	mock.assert_calls_async(1).await;

	assert_eq!(credential.access_token().expose(), "interactive");
	assert_eq!(presenter.presentations.load(Ordering::SeqCst), 1);
	assert_eq!(authorizer.metrics().refresh_fallbacks(), 1);
}

#[tokio::test]
async fn revoke_posts_the_refresh_token() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/services/oauth2/revoke");
			then.status(200);
		})
		.await;
	let (flows, _) = flows(&server);
	let credential = seeded(&server.base_url(), "A", Some("R1"));

	flows.revoke(&credential).await.expect("Revocation should succeed.");

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn revoke_failure_reports_the_status() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/services/oauth2/revoke");
			then.status(400).body("unsupported_token_type");
		})
		.await;

	let (flows, _) = flows(&server);
	let credential = seeded(&server.base_url(), "A", None);
	let err = flows.revoke(&credential).await.expect_err("Revocation should fail.");

	assert!(matches!(err, Error::Revocation { status: Some(400), .. }));
}
