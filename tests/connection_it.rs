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
use serde::Deserialize;
// self
use sforce_auth::{
	Error,
	auth::Credential,
	authorizer::Authorizer,
	config::ConnectedApp,
	connection::Connection,
	error::RequestStage,
	flows::{AuthorizationPresenter, OAuthFlows, PresenterFuture},
	service::{Identity, JsonResource},
	store::{CredentialStore, MemoryStore, MemoryUserPointer, UserPointer},
	url::Url,
};

const ORG: &str = "00D5g000004ABCD";
const USER: &str = "0055g00000XYZ12";
const LIMITS_PATH: &str = "/services/data/v60.0/limits";

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

/// Presenter that should never be reached in these tests.
#[derive(Default)]
struct CountingPresenter(AtomicUsize);
impl AuthorizationPresenter for CountingPresenter {
	fn present<'a>(&'a self, _: Url, _: &'a str) -> PresenterFuture<'a> {
		Box::pin(async move {
			self.0.fetch_add(1, Ordering::SeqCst);

			Err(Error::UserCancelled)
		})
	}
}

struct Fixture {
	connection: Connection,
	store: Arc<MemoryStore>,
	pointer: Arc<MemoryUserPointer>,
	presenter: Arc<CountingPresenter>,
}

fn credential(base: &str, access: &str) -> Credential {
	let body = serde_json::json!({
		"access_token": access,
		"refresh_token": "R1",
		"instance_url": base,
		"id": format!("{base}/id/{ORG}/{USER}"),
		"issued_at": "1700000000000",
	});

	Credential::from_json(body.to_string().as_bytes(), None).expect("Credential should parse.")
}

async fn fixture(server: &MockServer, seed: Option<&str>) -> Fixture {
	let presenter = Arc::new(CountingPresenter::default());
	let app = ConnectedApp::builder(
		"consumer-it",
		Url::parse("sfdc-it://oauth/done").expect("Callback URL should parse."),
	)
	.login_url(Url::parse(&server.base_url()).expect("Mock base URL should parse."))
	.timeout(Duration::from_secs(5))
	.build()
	.expect("Connected app should be valid.");
	let flows = OAuthFlows::with_reqwest(app, presenter.clone()).expect("Flows should build.");
	let store = Arc::new(MemoryStore::default());
	let pointer = Arc::new(MemoryUserPointer::default());
	let connection =
		Connection::new(Arc::new(Authorizer::new(flows)), store.clone(), pointer.clone());

	if let Some(access) = seed {
		let seeded = credential(&server.base_url(), access);

		store.save(seeded.clone()).await.expect("Seeding the store should succeed.");
		pointer.set(seeded.user_identifier()).expect("Seeding the pointer should succeed.");
	}

	Fixture { connection, store, pointer, presenter }
}

#[tokio::test]
async fn expired_session_is_refreshed_and_request_retried() {
	let server = MockServer::start_async().await;
	let rejected = server
		.mock_async(|when, then| {
			when.method(GET).path(LIMITS_PATH).header("authorization", "Bearer stale");
			then.status(401)
				.header("content-type", "application/json")
				.body(r#"[{"errorCode":"INVALID_SESSION_ID"}]"#);
		})
		.await;
	let accepted = server
		.mock_async(|when, then| {
			when.method(GET).path(LIMITS_PATH).header("authorization", "Bearer fresh");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"DailyApiRequests":{"Max":15000,"Remaining":14990}}"#);
		})
		.await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path("/services/oauth2/token");
			then.status(200).header("content-type", "application/json").body(
				serde_json::json!({
					"access_token": "fresh",
					"instance_url": server.base_url(),
					"id": format!("{}/id/{ORG}/{USER}", server.base_url()),
					"issued_at": "1700000100000",
				})
				.to_string(),
			);
		})
		.await;
	let fixture = fixture(&server, Some("stale")).await;
	let limits: Limits = fixture
		.connection
		.request(&JsonResource::new(LIMITS_PATH))
		.await
		.expect("Request should succeed after one refresh.");

	rejected.assert_calls_async(1).await;
	accepted.assert_calls_async(1).await;
	token.assert_calls_async(1).await;

	assert_eq!(limits.daily.remaining, 14990);
	assert_eq!(fixture.presenter.0.load(Ordering::SeqCst), 0);

	let stored = fixture
		.connection
		.credential()
		.await
		.expect("Store should be readable.")
		.expect("Refreshed credential should be stored.");

	assert_eq!(stored.access_token().expose(), "fresh");
	assert_eq!(stored.refresh_token().map(|t| t.expose()), Some("R1"));
}

#[tokio::test]
async fn persistent_rejection_stops_after_one_retry() {
	let server = MockServer::start_async().await;
	let api = server
		.mock_async(|when, then| {
			when.method(GET).path(LIMITS_PATH);
			then.status(401);
		})
		.await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/services/oauth2/token");
			then.status(200).header("content-type", "application/json").body(
				serde_json::json!({
					"access_token": "fresh",
					"instance_url": server.base_url(),
					"id": format!("{}/id/{ORG}/{USER}", server.base_url()),
					"issued_at": "1700000100000",
				})
				.to_string(),
			);
		})
		.await;

	let fixture = fixture(&server, Some("stale")).await;
	let err = fixture
		.connection
		.request(&JsonResource::<Limits>::new(LIMITS_PATH))
		.await
		.expect_err("A second 401 should surface.");

	api.assert_calls_async(2).await;

	assert_eq!(err.stage(), Some(RequestStage::Retry));
	assert!(matches!(err.root(), Error::AuthenticationRequired { status: 401 }));
}

#[tokio::test]
async fn identity_lookup_uses_the_identity_url() {
	let server = MockServer::start_async().await;
	let identity = server
		.mock_async(|when, then| {
			when.method(GET).path(format!("/id/{ORG}/{USER}")).header("authorization", "Bearer A");
			then.status(200).header("content-type", "application/json").body(
				serde_json::json!({
					"user_id": USER,
					"organization_id": ORG,
					"username": "ada@example.com",
					"display_name": "Ada Lovelace",
				})
				.to_string(),
			);
		})
		.await;
	let fixture = fixture(&server, Some("A")).await;
	let info = fixture.connection.request(&Identity).await.expect("Identity should resolve.");

	identity.assert_calls_async(1).await;

	assert_eq!(info.user_id, USER);
	assert_eq!(info.display_name.as_deref(), Some("Ada Lovelace"));
}

#[tokio::test]
async fn log_out_is_local_first_and_revokes_in_the_background() {
	let server = MockServer::start_async().await;
	let revoke = server
		.mock_async(|when, then| {
			when.method(POST).path("/services/oauth2/revoke");
			then.status(200).delay(Duration::from_millis(200));
		})
		.await;
	let fixture = fixture(&server, Some("A")).await;

	fixture.connection.log_out().await.expect("Logout should succeed.");

	assert_eq!(fixture.pointer.current().expect("Pointer should be readable."), None);
	assert!(fixture.store.is_empty());

	for _ in 0..50 {
		if revoke.calls_async().await == 1 && !fixture.connection.authorizer().is_revoking() {
			break;
		}

		tokio::time::sleep(Duration::from_millis(20)).await;
	}

	revoke.assert_calls_async(1).await;
}
