//! Token revocation.

// self
use crate::{
	_prelude::*,
	auth::Credential,
	flows::{OAuthFlows, common},
	http,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

impl OAuthFlows {
	/// Revokes `credential` on the server, preferring its refresh token.
	///
	/// Revoking the refresh token also invalidates every access token issued from it.
	pub async fn revoke(&self, credential: &Credential) -> Result<()> {
		const KIND: FlowKind = FlowKind::Revoke;

		let span = FlowSpan::new(KIND, "revoke");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(common::with_deadline(&self.app, "revoke", async {
				let token = credential.refresh_token().unwrap_or(credential.access_token());
				let origin = common::resolve_origin(&self.app, Some(credential));
				let url = common::endpoint(&origin, common::REVOKE_PATH)?;
				let request = http::form_post(&url, &[("token", token.expose())])?;
				let response = self
					.transport
					.execute(request)
					.await
					.inspect_err(|_| span.record_stage("revoke_request"))?;
				let status = response.status();

				if status.is_success() {
					Ok(())
				} else {
					span.record_stage("revoke_status");

					Err(Error::Revocation {
						status: Some(status.as_u16()),
						reason: http::body_preview(response.body()),
					})
				}
			}))
			.await;

		obs::record_result(KIND, &result);

		result
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::*;

	fn flows(transport: Arc<ScriptedTransport>) -> OAuthFlows {
		OAuthFlows::new(
			test_app("https://login.example.com"),
			transport,
			Arc::new(ScriptedPresenter::cancelling()),
		)
	}

	#[tokio::test]
	async fn revoke_prefers_the_refresh_token() {
		let transport = Arc::new(ScriptedTransport::default());

		transport.reply(common::REVOKE_PATH, 200, "");

		let with_refresh = credential_fixture(FIXTURE_ORG, FIXTURE_USER, "A", Some("R"));
		let access_only = credential_fixture(FIXTURE_ORG, FIXTURE_USER, "A", None);
		let flows = flows(transport.clone());

		flows.revoke(&with_refresh).await.expect("Revocation should succeed.");
		flows.revoke(&access_only).await.expect("Revocation should succeed.");

		let sent = transport.requests();

		assert_eq!(sent[0].url, "https://login.example.com/services/oauth2/revoke");
		assert_eq!(sent[0].body, "token=R");
		assert_eq!(sent[1].body, "token=A");
	}

	#[tokio::test]
	async fn server_rejection_is_a_revocation_error() {
		let transport = Arc::new(ScriptedTransport::default());

		transport.reply(common::REVOKE_PATH, 400, "unsupported_token_type");

		let credential = credential_fixture(FIXTURE_ORG, FIXTURE_USER, "A", Some("R"));
		let err = flows(transport).revoke(&credential).await.expect_err("A 400 should fail.");

		assert!(matches!(
			err,
			Error::Revocation { status: Some(400), reason } if reason == "unsupported_token_type"
		));
	}
}
