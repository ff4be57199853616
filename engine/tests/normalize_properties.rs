//! Normalizer behaviour over arbitrary source input.

use marketsync_engine::normalize::{self, ClaimStatus, OrderStatus, QuestionStatus};
use proptest::prelude::*;
use rust_decimal::Decimal;
use serde_json::json;

const KNOWN_ORDER_STATUSES: &[&str] = &[
    "awaiting",
    "created",
    "picking",
    "repack",
    "unpacked",
    "readytoship",
    "invoiced",
    "shipped",
    "atcollectionpoint",
    "delivered",
    "undelivered",
    "cancelled",
    "canceled",
    "unsupplied",
    "returned",
];

fn folded(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .collect::<String>()
        .to_lowercase()
}

#[test]
fn unrecognised_statuses_land_in_unknown() {
    assert_eq!(normalize::order_status("Teleported"), OrderStatus::Unknown);
    assert_eq!(normalize::order_status(""), OrderStatus::Unknown);
    assert_eq!(normalize::claim_status("Vanished"), ClaimStatus::Unknown);
    assert_eq!(normalize::question_status("???"), QuestionStatus::Unknown);
}

#[test]
fn source_spellings_map_to_local_statuses() {
    assert_eq!(normalize::order_status("Created"), OrderStatus::New);
    assert_eq!(normalize::order_status("UnSupplied"), OrderStatus::Cancelled);
    assert_eq!(normalize::order_status("At_Collection_Point"), OrderStatus::Shipped);
    assert_eq!(normalize::claim_status("WaitingInAction"), ClaimStatus::WaitingAction);
    assert_eq!(normalize::question_status("WAITING_FOR_ANSWER"), QuestionStatus::Waiting);
}

#[test]
fn numeric_strings_and_numbers_agree() {
    let from_number = normalize::timestamp_value("date", &json!(1_706_700_000_000i64)).unwrap();
    let from_string = normalize::timestamp_value("date", &json!("1706700000000")).unwrap();
    assert_eq!(from_number, from_string);

    assert_eq!(
        normalize::decimal_value("price", &json!("12,50")).unwrap(),
        Decimal::new(1250, 2)
    );
    assert_eq!(
        normalize::decimal_value("price", &json!(12.5)).unwrap(),
        Decimal::new(125, 1)
    );
}

proptest! {
    #[test]
    fn prop_order_status_never_panics(raw in ".{0,40}") {
        let status = normalize::order_status(&raw);
        if !KNOWN_ORDER_STATUSES.contains(&folded(&raw).as_str()) {
            prop_assert_eq!(status, OrderStatus::Unknown);
        }
    }

    #[test]
    fn prop_claim_and_question_status_never_panic(raw in "\\PC{0,40}") {
        let _ = normalize::claim_status(&raw);
        let _ = normalize::question_status(&raw);
    }

    #[test]
    fn prop_epoch_millis_round_trip(ms in 0i64..4_102_444_800_000) {
        let parsed = normalize::timestamp_value("date", &json!(ms.to_string())).unwrap();
        prop_assert_eq!(parsed.timestamp_millis(), ms);
    }

    #[test]
    fn prop_comma_and_dot_separators_agree(units in 0i64..1_000_000, cents in 0u32..100) {
        let dot = format!("{units}.{cents:02}");
        let comma = format!("{units},{cents:02}");
        prop_assert_eq!(normalize::parse_decimal(&dot), normalize::parse_decimal(&comma));
        prop_assert_eq!(
            normalize::parse_decimal(&dot),
            Some(Decimal::new(units * 100 + i64::from(cents), 2))
        );
    }
}
