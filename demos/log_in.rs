//! Logs in interactively against a Salesforce org, reads the API limits and the identity,
//! then logs out.
//!
//! Set `SFORCE_CONSUMER_KEY` (and optionally `SFORCE_CALLBACK_URL` / `SFORCE_LOGIN_URL`),
//! open the printed URL in a browser, and paste the callback URL the browser is sent to.

// std
use std::{env, io::BufRead, sync::Arc};
// crates.io
use color_eyre::{Result, eyre::eyre};
use serde_json::Value;
// self
use sforce_auth::{
	Error,
	authorizer::Authorizer,
	config::ConnectedApp,
	connection::Connection,
	flows::{AuthorizationPresenter, OAuthFlows, PresenterFuture},
	service::{Identity, JsonResource},
	store::{FileUserPointer, MemoryStore},
	url::Url,
};

/// Prints the login URL and waits for the callback to be pasted on stdin.
struct PastedCallback;
impl AuthorizationPresenter for PastedCallback {
	fn present<'a>(&'a self, authorize_url: Url, callback_scheme: &'a str) -> PresenterFuture<'a> {
		Box::pin(async move {
			println!("Open {authorize_url} and log in.");
			println!("Paste the `{callback_scheme}://` URL you land on, or nothing to cancel:");

			let line = tokio::task::spawn_blocking(|| {
				let mut line = String::new();

				std::io::stdin().lock().read_line(&mut line).map(|_| line)
			})
			.await
			.map_err(|_| Error::UserCancelled)?
			.map_err(|_| Error::UserCancelled)?;
			let line = line.trim();

			if line.is_empty() {
				return Err(Error::UserCancelled);
			}

			Url::parse(line).map_err(|_| Error::UserCancelled)
		})
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let consumer_key =
		env::var("SFORCE_CONSUMER_KEY").map_err(|_| eyre!("SFORCE_CONSUMER_KEY is not set."))?;
	let callback_url =
		env::var("SFORCE_CALLBACK_URL").unwrap_or_else(|_| "sfdc-demo://oauth/done".into());
	let mut builder = ConnectedApp::builder(consumer_key, Url::parse(&callback_url)?);

	if let Ok(login_url) = env::var("SFORCE_LOGIN_URL") {
		builder = builder.login_url(Url::parse(&login_url)?);
	}

	let flows = OAuthFlows::with_reqwest(builder.build()?, Arc::new(PastedCallback))?;
	let pointer = FileUserPointer::open(env::temp_dir().join("sforce-auth-demo/user.json"))?;
	let connection = Connection::new(
		Arc::new(Authorizer::new(flows)),
		Arc::new(MemoryStore::default()),
		Arc::new(pointer),
	);
	let credential = connection.log_in().await?;

	println!("Logged in as {} on {}.", credential.user_identifier(), credential.instance_url());

	let identity = connection.request(&Identity).await?;

	println!("Hello, {} ({}).", identity.username, identity.organization_id);

	let limits: Value =
		connection.request(&JsonResource::new("/services/data/v60.0/limits")).await?;

	println!(
		"Daily API requests remaining: {}.",
		limits["DailyApiRequests"]["Remaining"].as_u64().unwrap_or_default()
	);

	connection.log_out().await?;

	// Give the background revoke a chance to finish before the runtime shuts down.
	for _ in 0..40 {
		tokio::time::sleep(std::time::Duration::from_millis(50)).await;

		if !connection.authorizer().is_revoking() {
			break;
		}
	}

	println!("Logged out.");

	Ok(())
}
