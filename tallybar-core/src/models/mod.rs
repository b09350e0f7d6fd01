//! Domain models for TallyBar.
//!
//! ## Submodules
//!
//! - [`period`] - Billing periods and reset countdowns
//! - [`usage`] - Line items, per-model breakdowns, and snapshots

pub mod period;
mod usage;

pub use period::{Period, RESETS_SOON, reset_countdown};
pub use usage::{ModelBreakdown, RawUsageItem, UsageSnapshot};
#[cfg(test)]
mod serde_tests;
