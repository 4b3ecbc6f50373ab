//! Refresh-token grant against the token endpoint.

// self
use crate::{
	_prelude::*,
	auth::{Credential, TokenSecret, credential::parse_credential},
	flows::{OAuthFlows, common},
	http,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

impl OAuthFlows {
	/// Exchanges `credential`'s refresh token for a new credential.
	///
	/// The body may be JSON or form-encoded; either way the refresh token that was sent is
	/// carried into the result when the server omits it. Any non-2xx status is reported as
	/// [`Error::InvalidGrant`], and the call is bounded by the app's timeout.
	pub async fn refresh_grant(&self, credential: &Credential) -> Result<Credential> {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "refresh_grant");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(common::with_deadline(&self.app, "token", async {
				let refresh_token = credential.refresh_token().ok_or_else(|| {
					span.record_stage("missing_refresh_token");

					Error::InvalidGrant { reason: "No refresh token is available.".into() }
				})?;
				let origin = common::resolve_origin(&self.app, Some(credential));
				let url = common::endpoint(&origin, common::TOKEN_PATH)?;
				let request = http::form_post(
					&url,
					&[
						("grant_type", "refresh_token"),
						("client_id", self.app.consumer_key.as_str()),
						("refresh_token", refresh_token.expose()),
						("format", "json"),
					],
				)?;
				let response = self
					.transport
					.execute(request)
					.await
					.inspect_err(|_| span.record_stage("token_request"))?;
				let status = response.status();

				if !status.is_success() {
					span.record_stage("token_status");

					return Err(Error::InvalidGrant {
						reason: format!(
							"Token endpoint returned HTTP {}: {}",
							status.as_u16(),
							http::body_preview(response.body())
						),
					});
				}

				parse_token_body(response.body(), refresh_token)
					.inspect_err(|_| span.record_stage("parse_token_response"))
			}))
			.await;

		obs::record_result(KIND, &result);

		result
	}
}

fn parse_token_body(body: &[u8], sent: &TokenSecret) -> Result<Credential> {
	let looks_like_json = body.iter().find(|b| !b.is_ascii_whitespace()) == Some(&b'{');

	if looks_like_json {
		Ok(Credential::from_json(body, Some(sent))?)
	} else {
		Ok(parse_credential(&String::from_utf8_lossy(body), Some(sent))?)
	}
}
