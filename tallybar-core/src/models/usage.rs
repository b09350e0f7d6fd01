//! Usage-related types.
//!
//! This module contains types related to usage tracking:
//! - [`RawUsageItem`] - One billing line as reported by a provider
//! - [`ModelBreakdown`] - Per-model totals
//! - [`UsageSnapshot`] - Normalized monthly usage

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::period::Period;

// ============================================================================
// Raw Line Items
// ============================================================================

/// One billing line from a provider.
///
/// Quantities may be fractional; absent wire fields are already 0 here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawUsageItem {
    /// Model name, if the provider reported one.
    pub model: Option<String>,
    /// Requests made, before discounts.
    pub gross_quantity: f64,
    /// Requests covered by the included allowance.
    pub discount_quantity: f64,
    /// Requests billed.
    pub net_quantity: f64,
    /// Amount billed, in the account currency.
    pub net_amount: f64,
}

impl RawUsageItem {
    /// Creates an empty line item for `model`.
    pub fn for_model(model: impl Into<String>) -> Self {
        Self {
            model: Some(model.into()),
            ..Self::default()
        }
    }
}

// ============================================================================
// Model Breakdown
// ============================================================================

/// Usage totals for a single model within a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelBreakdown {
    /// Model name, or `"unknown"`.
    pub model: String,
    /// Requests made.
    pub gross_quantity: i64,
    /// Requests covered by the allowance.
    pub discount_quantity: i64,
    /// Requests billed.
    pub net_quantity: i64,
    /// Amount billed.
    pub net_amount: f64,
}

// ============================================================================
// Usage Snapshot
// ============================================================================

/// Normalized usage for one provider and one billing period.
///
/// Snapshots are never mutated in place; [`UsageSnapshot::with_allowance`]
/// returns a fresh value so observers holding the old one are unaffected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSnapshot {
    /// Provider that produced this snapshot.
    pub provider_id: String,
    /// Billing period covered.
    pub period: Period,
    /// Requests drawn from the included allowance.
    pub included_consumed: i64,
    /// Requests included in the plan each month.
    pub included_allowance: i64,
    /// Overage billed so far this period.
    pub billed_amount: f64,
    /// Requests billed as overage.
    pub billed_quantity: i64,
    /// Per-model totals, heaviest first.
    pub breakdowns: Vec<ModelBreakdown>,
    /// When the data was fetched.
    pub fetched_at: DateTime<Utc>,
}

impl UsageSnapshot {
    /// Fraction of the allowance consumed (1.0 = 100%).
    ///
    /// Returns 0 when the allowance is zero or negative.
    #[allow(clippy::cast_precision_loss)]
    pub fn included_percent(&self) -> f64 {
        if self.included_allowance <= 0 {
            return 0.0;
        }
        self.included_consumed as f64 / self.included_allowance as f64
    }

    /// Returns true if anything has been billed beyond the allowance.
    pub fn is_overage(&self) -> bool {
        self.billed_amount > 0.0
    }

    /// Requests left in the allowance, never below zero.
    pub fn included_remaining(&self) -> i64 {
        (self.included_allowance - self.included_consumed).max(0)
    }

    /// Returns a copy with `included_allowance` replaced.
    #[must_use]
    pub fn with_allowance(&self, allowance: i64) -> Self {
        Self {
            included_allowance: allowance,
            ..self.clone()
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
