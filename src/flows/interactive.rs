//! Interactive (user-agent) grant.
//!
//! The authorize URL asks for `response_type=token`, so the server redirects straight to the
//! callback URL with the credential in the fragment. The injected [`AuthorizationPresenter`]
//! shows the login page and resolves with that callback URL.

// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::{
	_prelude::*,
	auth::{Credential, credential::form_fields},
	error::ParseError,
	flows::{OAuthFlows, common},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

const STATE_LEN: usize = 32;

/// Boxed future returned by [`AuthorizationPresenter::present`].
pub type PresenterFuture<'a> = Pin<Box<dyn Future<Output = Result<Url>> + 'a + Send>>;

/// Shows the login page and waits for the redirect to the callback scheme.
pub trait AuthorizationPresenter
where
	Self: Send + Sync,
{
	/// Presents `authorize_url` and resolves with the full callback URL once the browser hits
	/// `callback_scheme`. Resolves with [`Error::UserCancelled`] when the user dismisses it.
	fn present<'a>(&'a self, authorize_url: Url, callback_scheme: &'a str) -> PresenterFuture<'a>;
}

/// A prepared interactive login: the URL to present and the `state` it must echo.
#[derive(Clone, Debug)]
pub struct AuthorizationRequest {
	/// Opaque state value that must round-trip via the callback.
	pub state: String,
	/// Fully-formed authorize URL to present to the user.
	pub authorize_url: Url,
}
impl AuthorizationRequest {
	/// Parses the callback URL the presenter resolved with.
	///
	/// An `error` in the fragment becomes [`Error::InvalidGrant`]; a missing fragment or a
	/// `state` that does not match becomes a [`ParseError`].
	pub fn complete(&self, callback: &Url) -> Result<Credential> {
		let fragment =
			callback.fragment().filter(|f| !f.is_empty()).ok_or(ParseError::MissingFragment)?;
		let fields = form_fields(fragment);

		if let Some(error) = fields.get("error") {
			let reason = match fields.get("error_description") {
				Some(description) => format!("{error}: {description}"),
				None => error.to_owned(),
			};

			return Err(Error::InvalidGrant { reason });
		}
		if fields.get("state").map(String::as_str) != Some(self.state.as_str()) {
			return Err(ParseError::StateMismatch.into());
		}

		Ok(Credential::from_fields(&fields, None)?)
	}
}

impl OAuthFlows {
	/// Builds the authorize URL for a fresh login against the host resolved from `previous`.
	pub fn start_authorization(
		&self,
		previous: Option<&Credential>,
	) -> Result<AuthorizationRequest> {
		let origin = common::resolve_origin(&self.app, previous);
		let mut authorize_url = common::endpoint(&origin, common::AUTHORIZE_PATH)?;
		let state = random_string(STATE_LEN);

		authorize_url
			.query_pairs_mut()
			.append_pair("response_type", "token")
			.append_pair("client_id", &self.app.consumer_key)
			.append_pair("redirect_uri", self.app.callback_url.as_str())
			.append_pair("prompt", "login consent")
			.append_pair("display", "touch")
			.append_pair("state", &state);

		Ok(AuthorizationRequest { state, authorize_url })
	}

	/// Runs the interactive grant end to end: build the URL, present it, parse the callback.
	///
	/// No deadline applies; the user may take as long as they need.
	pub async fn interactive_grant(&self, previous: Option<&Credential>) -> Result<Credential> {
		const KIND: FlowKind = FlowKind::Interactive;

		let span = FlowSpan::new(KIND, "interactive_grant");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async {
				let request = self.start_authorization(previous)?;
				let callback = self
					.presenter
					.present(request.authorize_url.clone(), self.app.callback_scheme())
					.await
					.inspect_err(|_| span.record_stage("present"))?;

				request.complete(&callback).inspect_err(|_| span.record_stage("parse_callback"))
			})
			.await;

		obs::record_result(KIND, &result);

		result
	}
}

fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}
