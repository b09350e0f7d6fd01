//! Usage aggregation.
//!
//! Reduces raw billing lines into a [`UsageSnapshot`]. Quantities are rounded
//! per line with [`round_quantity`] before summing; amounts are summed as-is.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::models::{ModelBreakdown, Period, RawUsageItem, UsageSnapshot};

/// Model key used for lines without a model name.
pub const UNKNOWN_MODEL: &str = "unknown";

/// Monthly premium-request allowance assumed until configuration says otherwise.
pub const DEFAULT_INCLUDED_ALLOWANCE: i64 = 300;

/// Rounds a fractional quantity to the nearest integer, halves away from zero.
///
/// Non-finite values count as 0.
#[allow(clippy::cast_possible_truncation)]
pub fn round_quantity(value: f64) -> i64 {
    if value.is_finite() {
        value.round() as i64
    } else {
        0
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

#[derive(Debug, Default)]
struct Totals {
    gross: i64,
    discount: i64,
    net: i64,
    amount: f64,
}

impl Totals {
    fn add(&mut self, item: &RawUsageItem) {
        // Saturate: absurd quantities must not abort aggregation
        self.gross = self.gross.saturating_add(round_quantity(item.gross_quantity));
        self.discount = self
            .discount
            .saturating_add(round_quantity(item.discount_quantity));
        self.net = self.net.saturating_add(round_quantity(item.net_quantity));
        self.amount += finite_or_zero(item.net_amount);
    }
}

fn model_key(item: &RawUsageItem) -> &str {
    match item.model.as_deref() {
        Some(model) if !model.trim().is_empty() => model,
        _ => UNKNOWN_MODEL,
    }
}

/// Builds a snapshot from raw line items.
///
/// `placeholder_allowance` is stored as-is; the configured allowance is
/// overlaid later with [`UsageSnapshot::with_allowance`].
pub fn aggregate(
    items: &[RawUsageItem],
    period: Period,
    provider_id: &str,
    placeholder_allowance: i64,
    fetched_at: DateTime<Utc>,
) -> UsageSnapshot {
    let mut overall = Totals::default();
    let mut by_model: HashMap<&str, Totals> = HashMap::new();

    for item in items {
        overall.add(item);
        by_model.entry(model_key(item)).or_default().add(item);
    }

    let mut breakdowns: Vec<ModelBreakdown> = by_model
        .into_iter()
        .map(|(model, totals)| ModelBreakdown {
            model: model.to_string(),
            gross_quantity: totals.gross,
            discount_quantity: totals.discount,
            net_quantity: totals.net,
            net_amount: totals.amount,
        })
        .collect();

    breakdowns.sort_by(|a, b| {
        b.gross_quantity
            .cmp(&a.gross_quantity)
            .then_with(|| a.model.cmp(&b.model))
    });

    UsageSnapshot {
        provider_id: provider_id.to_string(),
        period,
        included_consumed: overall.discount,
        included_allowance: placeholder_allowance,
        billed_amount: overall.amount,
        billed_quantity: overall.net,
        breakdowns,
        fetched_at,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn period() -> Period {
        Period::new(2025, 3).unwrap()
    }

    fn fetched_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 12, 0, 0).unwrap()
    }

    fn item(model: Option<&str>, gross: f64, discount: f64, net: f64, amount: f64) -> RawUsageItem {
        RawUsageItem {
            model: model.map(str::to_string),
            gross_quantity: gross,
            discount_quantity: discount,
            net_quantity: net,
            net_amount: amount,
        }
    }

    #[test]
    fn test_empty_input() {
        let snap = aggregate(&[], period(), "github-copilot", 300, fetched_at());
        assert_eq!(snap.included_consumed, 0);
        assert_eq!(snap.billed_quantity, 0);
        assert_eq!(snap.billed_amount, 0.0);
        assert!(snap.breakdowns.is_empty());
        assert_eq!(snap.included_allowance, 300);
        assert_eq!(snap.provider_id, "github-copilot");
        assert_eq!(snap.fetched_at, fetched_at());
    }

    #[test]
    fn test_reference_example() {
        let items = vec![
            item(Some("gpt-4"), 0.0, 5.0, 0.0, 0.0),
            item(Some("gpt-4"), 0.0, 3.0, 2.0, 1.50),
            item(None, 0.0, 0.0, 1.0, 0.75),
        ];

        let snap = aggregate(&items, period(), "github-copilot", 300, fetched_at());

        assert_eq!(snap.included_consumed, 8);
        assert_eq!(snap.billed_quantity, 3);
        assert!((snap.billed_amount - 2.25).abs() < 1e-9);

        assert_eq!(
            snap.breakdowns,
            vec![
                ModelBreakdown {
                    model: "gpt-4".to_string(),
                    gross_quantity: 0,
                    discount_quantity: 8,
                    net_quantity: 2,
                    net_amount: 1.50,
                },
                ModelBreakdown {
                    model: "unknown".to_string(),
                    gross_quantity: 0,
                    discount_quantity: 0,
                    net_quantity: 1,
                    net_amount: 0.75,
                },
            ]
        );
    }

    #[test]
    fn test_sorted_by_gross_descending() {
        let items = vec![
            item(Some("o3-mini"), 4.0, 4.0, 0.0, 0.0),
            item(Some("claude-sonnet-4"), 40.0, 40.0, 0.0, 0.0),
            item(Some("gpt-4.1"), 12.0, 12.0, 0.0, 0.0),
        ];

        let snap = aggregate(&items, period(), "p", 300, fetched_at());
        let order: Vec<&str> = snap.breakdowns.iter().map(|b| b.model.as_str()).collect();
        assert_eq!(order, ["claude-sonnet-4", "gpt-4.1", "o3-mini"]);
    }

    #[test]
    fn test_ties_broken_by_model_name() {
        let items = vec![
            item(Some("zeta"), 7.0, 0.0, 0.0, 0.0),
            item(Some("alpha"), 7.0, 0.0, 0.0, 0.0),
            item(Some("mid"), 7.0, 0.0, 0.0, 0.0),
        ];

        let snap = aggregate(&items, period(), "p", 300, fetched_at());
        let order: Vec<&str> = snap.breakdowns.iter().map(|b| b.model.as_str()).collect();
        assert_eq!(order, ["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_empty_model_name_is_unknown() {
        let items = vec![
            item(Some(""), 1.0, 1.0, 0.0, 0.0),
            item(None, 2.0, 2.0, 0.0, 0.0),
        ];

        let snap = aggregate(&items, period(), "p", 300, fetched_at());
        assert_eq!(snap.breakdowns.len(), 1);
        assert_eq!(snap.breakdowns[0].model, UNKNOWN_MODEL);
        assert_eq!(snap.breakdowns[0].gross_quantity, 3);
    }

    #[test]
    fn test_rounds_each_line_before_summing() {
        // 0.4 + 0.4 would be 1 if summed first; per-line rounding gives 0.
        let items = vec![
            item(Some("m"), 0.4, 0.4, 0.0, 0.0),
            item(Some("m"), 0.4, 0.4, 0.0, 0.0),
        ];

        let snap = aggregate(&items, period(), "p", 300, fetched_at());
        assert_eq!(snap.included_consumed, 0);
        assert_eq!(snap.breakdowns[0].gross_quantity, 0);
    }

    #[test]
    fn test_amounts_are_not_rounded() {
        let items = vec![
            item(Some("m"), 1.0, 0.0, 1.0, 0.04),
            item(Some("m"), 1.0, 0.0, 1.0, 0.04),
        ];

        let snap = aggregate(&items, period(), "p", 300, fetched_at());
        assert!((snap.billed_amount - 0.08).abs() < 1e-9);
    }

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(round_quantity(0.5), 1);
        assert_eq!(round_quantity(1.5), 2);
        assert_eq!(round_quantity(2.5), 3);
        assert_eq!(round_quantity(2.49), 2);
        assert_eq!(round_quantity(-0.5), -1);
    }

    #[test]
    fn test_non_finite_values_count_as_zero() {
        let items = vec![item(Some("m"), f64::NAN, f64::INFINITY, 1.0, f64::NAN)];

        let snap = aggregate(&items, period(), "p", 300, fetched_at());
        assert_eq!(snap.included_consumed, 0);
        assert_eq!(snap.billed_quantity, 1);
        assert_eq!(snap.billed_amount, 0.0);
    }

    #[test]
    fn test_placeholder_allowance_passes_through() {
        let snap = aggregate(&[], period(), "p", 1500, fetched_at());
        assert_eq!(snap.included_allowance, 1500);
    }

    #[test]
    fn test_huge_quantities_saturate() {
        let items = vec![
            item(Some("m"), 1e19, 1e19, 1e19, 0.0),
            item(Some("m"), 1e19, 1e19, 1e19, 0.0),
            item(Some("n"), -1e19, 0.0, 0.0, 0.0),
            item(Some("n"), -1e19, 0.0, 0.0, 0.0),
        ];

        let snap = aggregate(&items, period(), "p", 300, fetched_at());
        assert_eq!(snap.included_consumed, i64::MAX);
        assert_eq!(snap.billed_quantity, i64::MAX);

        let m = snap.breakdowns.iter().find(|b| b.model == "m").unwrap();
        assert_eq!(m.gross_quantity, i64::MAX);
        let n = snap.breakdowns.iter().find(|b| b.model == "n").unwrap();
        assert_eq!(n.gross_quantity, i64::MIN);
    }
}
