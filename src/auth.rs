//! Auth-domain credentials, identifiers, and secret wrappers.

pub mod credential;
pub mod id;
pub mod secret;

pub use credential::*;
pub use id::*;
pub use secret::*;
