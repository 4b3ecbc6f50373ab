//! Single-flight coordination of credential grants and revocations.
//!
//! Many requests can discover an expired credential at the same moment. The [`Authorizer`]
//! lets the first caller start one authenticate flight (refresh first, interactive login on
//! any refresh failure) and hands every other caller the same flight, so the user sees at most
//! one login page and the token endpoint at most one refresh. Revocation has its own
//! independent flight.

mod metrics;
mod singleflight;

pub use metrics::AuthorizerMetrics;

// crates.io
use futures_util::FutureExt;
// self
use crate::{
	_prelude::*,
	auth::Credential,
	authorizer::singleflight::SingleFlight,
	flows::OAuthFlows,
	obs::{self, FlowKind},
};

/// Coordinates grants and revocations for one connected app.
#[derive(Debug)]
pub struct Authorizer {
	flows: Arc<OAuthFlows>,
	metrics: Arc<AuthorizerMetrics>,
	authenticate: SingleFlight<Credential>,
	revoke: SingleFlight<()>,
}
impl Authorizer {
	/// Creates an authorizer over the provided flows.
	pub fn new(flows: OAuthFlows) -> Self {
		Self {
			flows: Arc::new(flows),
			metrics: Default::default(),
			authenticate: Default::default(),
			revoke: Default::default(),
		}
	}

	/// Flow primitives this authorizer drives.
	pub fn flows(&self) -> &OAuthFlows {
		&self.flows
	}

	/// Coordination counters.
	pub fn metrics(&self) -> &AuthorizerMetrics {
		&self.metrics
	}

	/// Returns `true` while an authenticate flight is running.
	pub fn is_authenticating(&self) -> bool {
		self.authenticate.in_flight()
	}

	/// Returns `true` while a revoke flight is running.
	pub fn is_revoking(&self) -> bool {
		self.revoke.in_flight()
	}

	/// Produces a fresh credential, joining the in-flight grant when one exists.
	///
	/// When this call starts the flight and `refreshing` carries a refresh token, the refresh
	/// grant runs first; any refresh failure falls back to the interactive grant. A caller
	/// that joins an existing flight gets that flight's result and its own `refreshing`
	/// argument is ignored. Every caller of one flight receives the same result.
	pub async fn grant_credential(&self, refreshing: Option<&Credential>) -> Result<Credential> {
		let flows = self.flows.clone();
		let metrics = self.metrics.clone();
		let refreshing = refreshing.cloned();
		let (handle, started) = self.authenticate.join_or_start(move || {
			async move { authenticate(&flows, &metrics, refreshing.as_ref()).await }.boxed()
		});

		if started {
			self.metrics.record_flight();
		} else {
			self.metrics.record_join();
		}

		handle.await
	}

	/// Revokes `credential` on the server, joining the in-flight revocation when one exists.
	pub async fn revoke(&self, credential: &Credential) -> Result<()> {
		let flows = self.flows.clone();
		let credential = credential.to_owned();
		let (handle, started) = self
			.revoke
			.join_or_start(move || async move { flows.revoke(&credential).await }.boxed());

		if started {
			self.metrics.record_revocation();
		}

		handle.await
	}
}

async fn authenticate(
	flows: &OAuthFlows,
	metrics: &AuthorizerMetrics,
	refreshing: Option<&Credential>,
) -> Result<Credential> {
	if let Some(previous) = refreshing.filter(|credential| credential.refresh_token().is_some()) {
		match flows.refresh_grant(previous).await {
			Ok(credential) => return Ok(credential),
			Err(e) => {
				metrics.record_refresh_fallback();
				obs::warn_flow(FlowKind::Refresh, "refresh_fallback", &e);
			},
		}
	}

	metrics.record_presentation();

	flows.interactive_grant(refreshing).await
}
