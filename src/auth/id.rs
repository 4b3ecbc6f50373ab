//! Strongly typed org/user identifiers and the [`UserIdentifier`] store key.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Creates a new identifier after validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				let view = value.as_ref();

				validate_view($kind, view)?;

				Ok(Self(view.to_owned()))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				validate_view($kind, &value)?;

				Ok(Self(value))
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (org, user).
		kind: &'static str,
	},
	/// The identifier contains whitespace or a path separator.
	#[error("{kind} identifier contains whitespace or '/'.")]
	InvalidCharacter {
		/// Kind of identifier (org, user).
		kind: &'static str,
	},
}

def_id! { OrgId, "Identifier of the organization that owns a user.", "Org" }
def_id! { UserId, "Identifier of a user inside an organization.", "User" }

/// Non-secret key addressing a stored credential and marking the active user.
///
/// Derived from the last two path segments of a credential's identity URL
/// (`.../id/{org_id}/{user_id}`).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserIdentifier {
	/// Organization identifier.
	pub org_id: OrgId,
	/// User identifier.
	pub user_id: UserId,
}
impl UserIdentifier {
	/// Creates an identifier from its parts.
	pub fn new(org_id: OrgId, user_id: UserId) -> Self {
		Self { org_id, user_id }
	}

	/// Projects the identifier out of an identity URL, if it has enough path segments.
	pub fn from_identity_url(identity_url: &Url) -> Option<Self> {
		let mut segments =
			identity_url.path_segments()?.filter(|segment| !segment.is_empty()).rev();
		let user_id = UserId::new(segments.next()?).ok()?;
		let org_id = OrgId::new(segments.next()?).ok()?;

		Some(Self { org_id, user_id })
	}
}
impl Display for UserIdentifier {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}/{}", self.org_id, self.user_id)
	}
}

fn validate_view(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if view.chars().any(|c| c.is_whitespace() || c == '/') {
		return Err(IdentifierError::InvalidCharacter { kind });
	}

	Ok(())
}
