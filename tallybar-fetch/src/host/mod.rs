//! Host APIs used by providers and the store.
//!
//! - [`keychain`] - Secure credential storage (system keychain)
//! - [`http`] - HTTP client with tracing and domain allowlist

pub mod http;
pub mod keychain;

// Re-export key types
pub use http::{HttpClient, HttpResponse};
pub use keychain::{MemorySecretStore, SecretStore, SystemKeychain};
