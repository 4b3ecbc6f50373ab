//! Authenticated request engine for the current user.
//!
//! A [`Connection`] resolves the active user's credential (or logs in), runs a [`Service`]
//! descriptor, and on [`Error::AuthenticationRequired`] reauthenticates through the shared
//! [`Authorizer`] and retries exactly once. It also owns the session lifecycle: persisting
//! fresh credentials, and logging out.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::{
	_prelude::*,
	auth::{Credential, UserIdentifier},
	authorizer::Authorizer,
	error::RequestStage,
	http::{self, HttpRequest, HttpResponse},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	store::{CredentialStore, UserPointer},
};

/// Request descriptor executed by a [`Connection`].
///
/// Descriptors only build requests and decode responses; reauthentication and the single
/// retry come from the connection.
pub trait Service
where
	Self: Send + Sync,
{
	/// Decoded success value.
	type Output: Send;

	/// Builds the HTTP request, typically against the credential's instance URL.
	fn build_request(&self, credential: &Credential) -> Result<HttpRequest>;

	/// Accepts or rejects a response before decoding.
	///
	/// The default maps 401 to [`Error::AuthenticationRequired`] and any other non-2xx status
	/// to [`Error::Response`].
	fn validate(&self, response: HttpResponse) -> Result<HttpResponse> {
		validate_status(response)
	}

	/// Decodes the body of a validated response.
	fn transform(&self, body: Vec<u8>) -> Result<Self::Output>;
}

/// Default status check used by [`Service::validate`].
pub fn validate_status(response: HttpResponse) -> Result<HttpResponse> {
	let status = response.status();

	if status.as_u16() == 401 {
		return Err(Error::AuthenticationRequired { status: status.as_u16() });
	}
	if !status.is_success() {
		return Err(Error::Response {
			status: status.as_u16(),
			body: http::body_preview(response.body()),
		});
	}

	Ok(response)
}

/// Session for the current user of one backend.
pub struct Connection {
	authorizer: Arc<Authorizer>,
	store: Arc<dyn CredentialStore>,
	pointer: Arc<dyn UserPointer>,
	session: AsyncMutex<()>,
	generation: AtomicU64,
}
impl Connection {
	/// Creates a connection over a shared authorizer and the host's stores.
	pub fn new(
		authorizer: Arc<Authorizer>,
		store: Arc<dyn CredentialStore>,
		pointer: Arc<dyn UserPointer>,
	) -> Self {
		Self {
			authorizer,
			store,
			pointer,
			session: AsyncMutex::new(()),
			generation: AtomicU64::new(0),
		}
	}

	/// Authorizer used for grants and revocations.
	pub fn authorizer(&self) -> &Arc<Authorizer> {
		&self.authorizer
	}

	/// Returns the active user, if any.
	pub fn current_user(&self) -> Result<Option<UserIdentifier>> {
		Ok(self.pointer.current()?)
	}

	/// Returns the stored credential for the active user, if any.
	pub async fn credential(&self) -> Result<Option<Credential>> {
		match self.pointer.current()? {
			Some(user) => Ok(self.store.retrieve(&user).await?),
			None => Ok(None),
		}
	}

	/// Runs an interactive login and makes the resulting user active.
	pub async fn log_in(&self) -> Result<Credential> {
		let generation = self.generation.load(Ordering::SeqCst);
		let credential = self.authorizer.grant_credential(None).await?;

		self.persist(&credential, generation).await?;

		Ok(credential)
	}

	/// Executes `service`, reauthenticating and retrying once on an authentication failure.
	///
	/// Failures surface as [`Error::Request`] naming the [`RequestStage`] that failed;
	/// [`Error::root`] returns the unmodified cause.
	pub async fn request<S>(&self, service: &S) -> Result<S::Output>
	where
		S: Service,
	{
		const KIND: FlowKind = FlowKind::Request;

		let span = FlowSpan::new(KIND, "request");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.run(service)).await;

		if let Some(stage) = result.as_ref().err().and_then(Error::stage) {
			span.record_stage(stage.as_str());
		}

		obs::record_result(KIND, &result);

		result
	}

	/// Logs the active user out.
	///
	/// The stored credential is deleted and the pointer cleared before this returns; both steps
	/// run even when the other fails, and the first failure is returned afterwards. The
	/// server-side revoke runs in the background; its failure is only logged.
	pub async fn log_out(&self) -> Result<()> {
		let _session = self.session.lock().await;

		self.generation.fetch_add(1, Ordering::SeqCst);

		let Some(user) = self.pointer.current()? else {
			return Ok(());
		};
		let (credential, retrieved) = match self.store.retrieve(&user).await {
			Ok(credential) => (credential, Ok(())),
			Err(e) => (None, Err(e)),
		};
		let cleared = self.pointer.clear();
		let deleted = self.store.delete(&user).await;

		if let Some(credential) = credential {
			let authorizer = self.authorizer.clone();

			tokio::spawn(async move {
				if let Err(e) = authorizer.revoke(&credential).await {
					obs::warn_flow(FlowKind::Revoke, "background_revoke", &e);
				}
			});
		}

		retrieved.and(cleared).and(deleted)?;

		Ok(())
	}

	async fn run<S>(&self, service: &S) -> Result<S::Output>
	where
		S: Service,
	{
		let generation = self.generation.load(Ordering::SeqCst);
		let credential = self
			.resolve_credential(generation)
			.await
			.map_err(|e| e.at(RequestStage::ResolveCredential))?;

		match self.execute(service, &credential).await {
			Err(Error::AuthenticationRequired { .. }) => {
				let renewed = self
					.authorizer
					.grant_credential(Some(&credential))
					.await
					.map_err(|e| e.at(RequestStage::Reauthenticate))?;

				self.persist(&renewed, generation)
					.await
					.map_err(|e| e.at(RequestStage::Persist))?;
				self.execute(service, &renewed).await.map_err(|e| e.at(RequestStage::Retry))
			},
			other => other.map_err(|e| e.at(RequestStage::Execute)),
		}
	}

	async fn resolve_credential(&self, generation: u64) -> Result<Credential> {
		if let Some(credential) = self.credential().await? {
			return Ok(credential);
		}

		let credential = self.authorizer.grant_credential(None).await?;

		self.persist(&credential, generation).await?;

		Ok(credential)
	}

	async fn execute<S>(&self, service: &S, credential: &Credential) -> Result<S::Output>
	where
		S: Service,
	{
		let request = service.build_request(credential)?;
		let response = self.authorizer.flows().transport.execute(request).await?;
		let response = service.validate(response)?;

		service.transform(response.into_body())
	}

	/// Saves `credential` and marks its user active, unless a logout happened since
	/// `generation` was read.
	async fn persist(&self, credential: &Credential, generation: u64) -> Result<()> {
		let _session = self.session.lock().await;

		if self.generation.load(Ordering::SeqCst) != generation {
			obs::warn_flow(
				FlowKind::Request,
				"persist_after_logout",
				&"session ended before the grant finished",
			);

			return Ok(());
		}

		self.store.save(credential.to_owned()).await?;
		self.pointer.set(credential.user_identifier())?;

		Ok(())
	}
}
impl Debug for Connection {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Connection")
			.field("authorizer", &self.authorizer)
			.field("generation", &self.generation.load(Ordering::Relaxed))
			.finish_non_exhaustive()
	}
}
