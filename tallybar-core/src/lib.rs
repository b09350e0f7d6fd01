// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `TallyBar` Core
//!
//! Core types, billing-period arithmetic, and usage aggregation for the
//! `TallyBar` application.
//!
//! This crate is pure: no I/O, no network, no global state. It provides:
//!
//! - Domain models (periods, line items, snapshots)
//! - The usage aggregator
//! - The [`UsageProvider`] trait implemented by backends
//! - Error types
//!
//! ## Key Types
//!
//! ### Periods & Time
//! - [`Period`] - One calendar month in UTC
//! - [`reset_countdown`] - Human countdown to the next reset
//! - [`Clock`] - Injectable time source ([`SystemClock`], [`FixedClock`])
//!
//! ### Usage Types
//! - [`RawUsageItem`] - One billing line from a provider
//! - [`ModelBreakdown`] - Per-model totals
//! - [`UsageSnapshot`] - Normalized monthly usage
//!
//! ### Aggregation
//! - [`aggregate()`] - Line items to snapshot

pub mod aggregate;
pub mod clock;
pub mod error;
pub mod models;
pub mod traits;

// Re-export error types
pub use error::{CoreError, ErrorKind};

// Re-export all model types
pub use models::{
    ModelBreakdown, Period, RESETS_SOON, RawUsageItem, UsageSnapshot, reset_countdown,
};

pub use aggregate::{DEFAULT_INCLUDED_ALLOWANCE, UNKNOWN_MODEL, aggregate, round_quantity};
pub use clock::{Clock, FixedClock, SystemClock};

// Re-export traits
pub use traits::{Credentials, UsageProvider};
