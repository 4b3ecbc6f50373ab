//! File-backed [`UserPointer`] so the active user survives process restarts.
//!
//! Only the non-secret [`UserIdentifier`] is written; credentials stay in the host's
//! [`CredentialStore`](crate::store::CredentialStore).

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::UserIdentifier,
	store::{StoreError, UserPointer},
};

/// Persists the current user to a JSON file after each mutation.
#[derive(Clone, Debug)]
pub struct FileUserPointer {
	path: PathBuf,
	inner: Arc<RwLock<Option<UserIdentifier>>>,
}
impl FileUserPointer {
	/// Opens (or creates) a pointer file at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot = Self::load_snapshot(&path)?;

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)) })
	}

	/// Location of the backing file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load_snapshot(path: &Path) -> Result<Option<UserIdentifier>, StoreError> {
		if !path.exists() {
			return Ok(None);
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		if bytes.iter().all(u8::is_ascii_whitespace) {
			return Ok(None);
		}

		serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {}: {e}", path.display()),
		})
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create pointer directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist_locked(&self, contents: &Option<UserIdentifier>) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let serialized = serde_json::to_vec_pretty(contents).map_err(|e| {
			StoreError::Serialization { message: format!("Failed to serialize pointer: {e}") }
		})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}
impl UserPointer for FileUserPointer {
	fn current(&self) -> Result<Option<UserIdentifier>, StoreError> {
		Ok(self.inner.read().clone())
	}

	fn set(&self, user: &UserIdentifier) -> Result<(), StoreError> {
		let mut guard = self.inner.write();
		let next = Some(user.to_owned());

		self.persist_locked(&next)?;
		*guard = next;

		Ok(())
	}

	fn clear(&self) -> Result<(), StoreError> {
		let mut guard = self.inner.write();

		*guard = None;

		// The in-memory pointer is cleared even when the write fails.
		self.persist_locked(&guard)
	}
}
