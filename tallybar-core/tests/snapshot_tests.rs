//! Integration tests for core snapshot types.

use chrono::{TimeDelta, TimeZone, Utc};
use tallybar_core::{
    Clock, FixedClock, Period, RESETS_SOON, RawUsageItem, UsageSnapshot, aggregate,
    reset_countdown,
};

#[test]
fn test_aggregate_then_overlay_allowance() {
    let items = vec![
        RawUsageItem {
            gross_quantity: 320.0,
            discount_quantity: 300.0,
            net_quantity: 20.0,
            net_amount: 0.8,
            ..RawUsageItem::for_model("Claude Sonnet 4")
        },
        RawUsageItem {
            gross_quantity: 12.0,
            discount_quantity: 0.0,
            net_quantity: 12.0,
            net_amount: 0.48,
            ..RawUsageItem::for_model("GPT-4.1")
        },
    ];
    let fetched_at = Utc.with_ymd_and_hms(2025, 6, 20, 10, 0, 0).unwrap();
    let period = Period::new(2025, 6).unwrap();

    let snapshot = aggregate(&items, period, "github-copilot", 300, fetched_at);
    assert!(snapshot.is_overage());
    assert_eq!(snapshot.billed_quantity, 32);
    assert!((snapshot.included_percent() - 1.0).abs() < f64::EPSILON);

    let pro_plus = snapshot.with_allowance(1500);
    assert!((pro_plus.included_percent() - 0.2).abs() < f64::EPSILON);
    assert_eq!(pro_plus.breakdowns, snapshot.breakdowns);
}

#[test]
fn test_snapshot_serialization_roundtrip() {
    let period = Period::new(2024, 12).unwrap();
    let snapshot = aggregate(
        &[RawUsageItem::for_model("o3")],
        period,
        "github-copilot",
        300,
        Utc::now(),
    );

    let json = serde_json::to_string(&snapshot).unwrap();
    let parsed: UsageSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, snapshot);
}

#[test]
fn test_current_period_follows_clock() {
    let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap());
    let december = Period::current(&clock);
    assert_eq!((december.year(), december.month()), (2024, 12));

    clock.advance(TimeDelta::seconds(1));
    let january = Period::current(&clock);
    assert_eq!((january.year(), january.month()), (2025, 1));
    assert_eq!(december.next_reset(), clock.now());
    assert_eq!(reset_countdown(december, clock.now()), RESETS_SOON);
}
