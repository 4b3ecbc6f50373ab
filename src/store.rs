//! Storage contracts for credentials and the current-user pointer, with built-in backends.
//!
//! Secrets live in a [`CredentialStore`] keyed by [`UserIdentifier`]; production hosts supply
//! one backed by an encrypted keychain. The non-secret "who is logged in" record lives in a
//! [`UserPointer`], which is synchronous so logout can clear it before returning.

pub mod file;
pub mod memory;

pub use file::FileUserPointer;
pub use memory::{MemoryStore, MemoryUserPointer};

// self
use crate::{
	_prelude::*,
	auth::{Credential, UserIdentifier},
};

/// Boxed future returned by [`CredentialStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Secret persistence contract keyed by [`UserIdentifier`].
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Persists or replaces the credential under its own user identifier.
	fn save(&self, credential: Credential) -> StoreFuture<'_, ()>;

	/// Fetches the credential stored for `user`, if present.
	fn retrieve<'a>(&'a self, user: &'a UserIdentifier) -> StoreFuture<'a, Option<Credential>>;

	/// Removes the credential stored for `user`; deleting a missing entry is not an error.
	fn delete<'a>(&'a self, user: &'a UserIdentifier) -> StoreFuture<'a, ()>;
}

/// Non-secret record of which user is currently logged in.
pub trait UserPointer
where
	Self: Send + Sync,
{
	/// Returns the active user, if any.
	fn current(&self) -> Result<Option<UserIdentifier>, StoreError>;

	/// Marks `user` as the active user.
	fn set(&self, user: &UserIdentifier) -> Result<(), StoreError>;

	/// Forgets the active user.
	fn clear(&self) -> Result<(), StoreError>;
}

/// Error type produced by [`CredentialStore`] and [`UserPointer`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
