//! Thread-safe in-memory [`CredentialStore`] and [`UserPointer`] for tests and demos.

// self
use crate::{
	_prelude::*,
	auth::{Credential, UserIdentifier},
	store::{CredentialStore, StoreError, StoreFuture, UserPointer},
};

type StoreMap = Arc<RwLock<HashMap<UserIdentifier, Credential>>>;

/// Storage backend that keeps credentials in-process.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Number of stored credentials.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when no credential is stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	fn save_now(map: StoreMap, credential: Credential) -> Result<(), StoreError> {
		map.write().insert(credential.user_identifier().to_owned(), credential);

		Ok(())
	}

	fn retrieve_now(map: StoreMap, user: UserIdentifier) -> Option<Credential> {
		map.read().get(&user).cloned()
	}

	fn delete_now(map: StoreMap, user: UserIdentifier) {
		map.write().remove(&user);
	}
}
impl CredentialStore for MemoryStore {
	fn save(&self, credential: Credential) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::save_now(map, credential) })
	}

	fn retrieve<'a>(&'a self, user: &'a UserIdentifier) -> StoreFuture<'a, Option<Credential>> {
		let map = self.0.clone();
		let user = user.to_owned();

		Box::pin(async move { Ok(Self::retrieve_now(map, user)) })
	}

	fn delete<'a>(&'a self, user: &'a UserIdentifier) -> StoreFuture<'a, ()> {
		let map = self.0.clone();
		let user = user.to_owned();

		Box::pin(async move {
			Self::delete_now(map, user);

			Ok(())
		})
	}
}

/// Current-user pointer held in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryUserPointer(Arc<RwLock<Option<UserIdentifier>>>);
impl UserPointer for MemoryUserPointer {
	fn current(&self) -> Result<Option<UserIdentifier>, StoreError> {
		Ok(self.0.read().clone())
	}

	fn set(&self, user: &UserIdentifier) -> Result<(), StoreError> {
		*self.0.write() = Some(user.to_owned());

		Ok(())
	}

	fn clear(&self) -> Result<(), StoreError> {
		*self.0.write() = None;

		Ok(())
	}
}
