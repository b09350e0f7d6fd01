// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `TallyBar` Fetch
//!
//! Transport and secret storage for the `TallyBar` application.
//!
//! ## Host APIs
//!
//! The [`host`] module provides abstractions for system interactions:
//!
//! - [`host::http`] - HTTP client with tracing, timeout, and domain allowlist
//! - [`host::keychain`] - Secure credential storage (system keychain)
//!
//! Nothing here retries. Providers get exactly one request per fetch and the
//! caller decides when to try again.
//!
//! ## Example
//!
//! ```ignore
//! use tallybar_fetch::{HttpClient, SecretStore, SystemKeychain};
//!
//! let keychain = SystemKeychain::new();
//! let token = keychain.get("github-token").await?;
//!
//! let client = HttpClient::new()?;
//! let response = client.get_with_bearer(&url, &token, HeaderMap::new()).await?;
//! ```

pub mod error;
pub mod host;

// Errors
pub use error::{HttpError, KeychainError};

// Host APIs
pub use host::{
    http::{DEFAULT_TIMEOUT_SECS, HttpClient, HttpResponse},
    keychain::{MemorySecretStore, SERVICE_NAME, SecretStore, SystemKeychain},
};
