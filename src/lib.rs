//! Single-flight OAuth 2.0 session core for Salesforce-style backends: cache one user's
//! credential, refresh it or fall back to an interactive login, and retry rejected requests
//! exactly once.
//!
//! The layers, leaves first:
//!
//! - [`auth`]: the immutable [`auth::Credential`], its parsers, and the [`auth::UserIdentifier`]
//!   store key.
//! - [`flows`]: interactive grant, refresh grant, and revocation primitives.
//! - [`store`]: secret credential storage and the non-secret current-user pointer.
//! - [`authorizer`]: joins concurrent callers onto one in-flight grant or revocation.
//! - [`connection`]: runs [`connection::Service`] descriptors with transparent reauthentication.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod authorizer;
pub mod config;
pub mod connection;
pub mod error;
pub mod flows;
pub mod http;
pub mod obs;
pub mod service;
pub mod store;


mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use error::{Error, Result};
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
