// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `TallyBar` Providers
//!
//! Usage backends for the `TallyBar` application.
//!
//! Each provider implements [`tallybar_core::UsageProvider`]: it fetches the
//! raw billing lines for one period and maps its failures onto
//! [`tallybar_core::CoreError`]. Aggregation happens in the core.
//!
//! ## Supported Providers
//!
//! | Provider | Auth | Endpoint |
//! |----------|------|----------|
//! | GitHub Copilot | Fine-grained token, "Plan (read)" | Premium request usage |
//!
//! ## Usage
//!
//! ```ignore
//! use tallybar_providers::ProviderRegistry;
//!
//! let provider = ProviderRegistry::default_provider().build()?;
//! let items = provider.fetch_raw(period, &credentials).await?;
//! ```

pub mod descriptor;
pub mod registry;

// Provider modules
pub mod copilot;

// Re-export key types
pub use copilot::{COPILOT_PROVIDER_ID, CopilotError, CopilotProvider};
pub use descriptor::{BuildProvider, ProviderDescriptor};
pub use registry::ProviderRegistry;
