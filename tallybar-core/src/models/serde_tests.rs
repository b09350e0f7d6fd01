//! Serde serialization/deserialization tests for core types.
//!
//! The snapshot cache file is the JSON form of [`UsageSnapshot`], so its key
//! names and timestamp precision are part of the on-disk format.

use chrono::{TimeZone, Utc};
use serde_json::{Value, json};

use crate::{ModelBreakdown, Period, RawUsageItem, UsageSnapshot, aggregate};

fn sample_snapshot() -> UsageSnapshot {
    UsageSnapshot {
        provider_id: "github-copilot".to_string(),
        period: Period::new(2025, 11).unwrap(),
        included_consumed: 287,
        included_allowance: 300,
        billed_amount: 0.12,
        billed_quantity: 3,
        breakdowns: vec![
            ModelBreakdown {
                model: "Claude Sonnet 4".to_string(),
                gross_quantity: 200,
                discount_quantity: 198,
                net_quantity: 2,
                net_amount: 0.08,
            },
            ModelBreakdown {
                model: "GPT-4.1".to_string(),
                gross_quantity: 90,
                discount_quantity: 89,
                net_quantity: 1,
                net_amount: 0.04,
            },
        ],
        fetched_at: Utc
            .with_ymd_and_hms(2025, 11, 20, 8, 15, 30)
            .unwrap()
            .checked_add_signed(chrono::TimeDelta::microseconds(123_456))
            .unwrap(),
    }
}

// ============================================================================
// UsageSnapshot Serde Tests
// ============================================================================

#[test]
fn test_usage_snapshot_uses_camel_case_keys() {
    let value = serde_json::to_value(sample_snapshot()).unwrap();
    let obj = value.as_object().unwrap();

    for key in [
        "providerId",
        "period",
        "includedConsumed",
        "includedAllowance",
        "billedAmount",
        "billedQuantity",
        "breakdowns",
        "fetchedAt",
    ] {
        assert!(obj.contains_key(key), "missing key {key}");
    }

    assert_eq!(value["period"], json!({"year": 2025, "month": 11}));
    assert_eq!(value["breakdowns"][0]["grossQuantity"], json!(200));
    assert_eq!(value["breakdowns"][0]["netAmount"], json!(0.08));
}

#[test]
fn test_usage_snapshot_roundtrip_is_lossless() {
    let snapshot = sample_snapshot();
    let json = serde_json::to_string_pretty(&snapshot).unwrap();
    let restored: UsageSnapshot = serde_json::from_str(&json).unwrap();

    assert_eq!(restored, snapshot);
    assert_eq!(restored.fetched_at, snapshot.fetched_at);
}

#[test]
fn test_accumulated_amounts_roundtrip_exactly() {
    let items: Vec<RawUsageItem> = (0..6)
        .map(|_| RawUsageItem {
            net_quantity: 1.0,
            net_amount: 0.04,
            ..RawUsageItem::for_model("GPT-4.1")
        })
        .collect();
    let snapshot = aggregate(
        &items,
        Period::new(2025, 11).unwrap(),
        "github-copilot",
        300,
        Utc.with_ymd_and_hms(2025, 11, 20, 8, 0, 0).unwrap(),
    );
    // Six additions of 0.04 do not land on 0.24
    assert_ne!(snapshot.billed_amount, 0.24);

    let json = serde_json::to_string_pretty(&snapshot).unwrap();
    let restored: UsageSnapshot = serde_json::from_str(&json).unwrap();

    assert_eq!(restored.billed_amount.to_bits(), snapshot.billed_amount.to_bits());
    assert_eq!(restored, snapshot);
}

#[test]
fn test_fetched_at_keeps_sub_second_precision() {
    let value = serde_json::to_value(sample_snapshot()).unwrap();
    let Value::String(stamp) = &value["fetchedAt"] else {
        panic!("fetchedAt should be a string");
    };
    assert!(stamp.starts_with("2025-11-20T08:15:30.123456"), "{stamp}");
}

#[test]
fn test_usage_snapshot_rejects_invalid_period() {
    let mut value = serde_json::to_value(sample_snapshot()).unwrap();
    value["period"] = json!({"year": 2025, "month": 0});

    let result: Result<UsageSnapshot, _> = serde_json::from_value(value);
    assert!(result.is_err());
}

#[test]
fn test_usage_snapshot_missing_field_fails() {
    let mut value = serde_json::to_value(sample_snapshot()).unwrap();
    value.as_object_mut().unwrap().remove("includedConsumed");

    let result: Result<UsageSnapshot, _> = serde_json::from_value(value);
    assert!(result.is_err());
}
