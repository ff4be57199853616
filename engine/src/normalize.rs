//! Field normalization at the source boundary.
//!
//! Pure functions mapping external vocabularies and loosely typed JSON values
//! onto canonical local values. Status lookups never fail: anything that is
//! not in the table lands in the `Unknown` bucket.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use thiserror::Error;

/// A single field that could not be normalized.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("field '{field}': {reason}")]
pub struct FieldError {
    pub field: &'static str,
    pub reason: String,
}

impl FieldError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

pub type FieldResult<T> = std::result::Result<T, FieldError>;

// ============================================================================
// Status vocabularies
// ============================================================================

/// Local order (and order line) status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrderStatus {
    Awaiting,
    New,
    Preparing,
    Invoiced,
    Shipped,
    Delivered,
    Undelivered,
    Cancelled,
    Returned,
    #[default]
    Unknown,
}

/// Local customer-question status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuestionStatus {
    Waiting,
    PendingApproval,
    Answered,
    Reported,
    Rejected,
    #[default]
    Unknown,
}

/// Local claim item status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClaimStatus {
    Created,
    WaitingAction,
    InAnalysis,
    Accepted,
    Rejected,
    Cancelled,
    Unresolved,
    #[default]
    Unknown,
}

/// Fold case and separators so `WAITING_FOR_ANSWER`, `WaitingForAnswer` and
/// `waiting for answer` compare equal.
fn fold(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Map an external order or package status onto [`OrderStatus`].
pub fn order_status(raw: &str) -> OrderStatus {
    match fold(raw).as_str() {
        "awaiting" => OrderStatus::Awaiting,
        "created" => OrderStatus::New,
        "picking" | "repack" | "unpacked" | "readytoship" => OrderStatus::Preparing,
        "invoiced" => OrderStatus::Invoiced,
        "shipped" | "atcollectionpoint" => OrderStatus::Shipped,
        "delivered" => OrderStatus::Delivered,
        "undelivered" => OrderStatus::Undelivered,
        "cancelled" | "canceled" | "unsupplied" => OrderStatus::Cancelled,
        "returned" => OrderStatus::Returned,
        _ => OrderStatus::Unknown,
    }
}

/// Map an external question status onto [`QuestionStatus`].
pub fn question_status(raw: &str) -> QuestionStatus {
    match fold(raw).as_str() {
        "waitingforanswer" => QuestionStatus::Waiting,
        "waitingforapprove" | "waitingforapproval" => QuestionStatus::PendingApproval,
        "answered" => QuestionStatus::Answered,
        "reported" => QuestionStatus::Reported,
        "rejected" => QuestionStatus::Rejected,
        _ => QuestionStatus::Unknown,
    }
}

/// Map an external claim item status onto [`ClaimStatus`].
pub fn claim_status(raw: &str) -> ClaimStatus {
    match fold(raw).as_str() {
        "created" => ClaimStatus::Created,
        "waitinginaction" => ClaimStatus::WaitingAction,
        "inanalysis" => ClaimStatus::InAnalysis,
        "accepted" => ClaimStatus::Accepted,
        "rejected" => ClaimStatus::Rejected,
        "cancelled" | "canceled" => ClaimStatus::Cancelled,
        "unresolved" => ClaimStatus::Unresolved,
        _ => ClaimStatus::Unknown,
    }
}

// ============================================================================
// Timestamps
// ============================================================================

/// Convert epoch milliseconds to a UTC timestamp.
pub fn epoch_millis(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}

/// Normalize a required epoch-millisecond field given as a number or a
/// numeric string.
pub fn timestamp_value(field: &'static str, value: &Value) -> FieldResult<DateTime<Utc>> {
    optional_timestamp_value(field, value)?
        .ok_or_else(|| FieldError::new(field, "missing timestamp"))
}

/// Like [`timestamp_value`], but `null` and absent values are `None`.
pub fn optional_timestamp_value(
    field: &'static str,
    value: &Value,
) -> FieldResult<Option<DateTime<Utc>>> {
    let millis = match value {
        Value::Null => return Ok(None),
        Value::Number(n) => match n.as_i64() {
            Some(ms) => ms,
            None => n
                .as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as i64)
                .ok_or_else(|| {
                    FieldError::new(field, format!("not an epoch millisecond value: {n}"))
                })?,
        },
        Value::String(s) if s.trim().is_empty() => return Ok(None),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| FieldError::new(field, format!("not an epoch millisecond value: {s:?}")))?,
        other => {
            return Err(FieldError::new(
                field,
                format!("expected epoch milliseconds, got {}", json_type_name(other)),
            ))
        }
    };

    epoch_millis(millis)
        .map(Some)
        .ok_or_else(|| FieldError::new(field, format!("timestamp out of range: {millis}")))
}

// ============================================================================
// Numbers
// ============================================================================

/// Parse a decimal string written with either `.` or `,` as the decimal
/// separator. When both appear, the last one is the decimal separator and the
/// other is treated as a grouping mark.
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let cleaned = match (raw.rfind('.'), raw.rfind(',')) {
        (Some(dot), Some(comma)) if comma > dot => raw.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => raw.replace(',', ""),
        (None, Some(_)) => raw.replace(',', "."),
        _ => raw.to_string(),
    };

    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()
}

/// Normalize a money/quantity-like field given as a JSON number or a numeric
/// string. `null` is zero.
pub fn decimal_value(field: &'static str, value: &Value) -> FieldResult<Decimal> {
    match value {
        Value::Null => Ok(Decimal::ZERO),
        Value::Number(n) => parse_decimal(&n.to_string())
            .ok_or_else(|| FieldError::new(field, format!("not a decimal: {n}"))),
        Value::String(s) => {
            parse_decimal(s).ok_or_else(|| FieldError::new(field, format!("not a decimal: {s:?}")))
        }
        other => Err(FieldError::new(
            field,
            format!("expected a decimal, got {}", json_type_name(other)),
        )),
    }
}

/// Normalize an integer count given as a number or numeric string. `null` is zero.
pub fn integer_value(field: &'static str, value: &Value) -> FieldResult<i64> {
    match value {
        Value::Null => Ok(0),
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| FieldError::new(field, format!("not an integer: {n}"))),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| FieldError::new(field, format!("not an integer: {s:?}"))),
        other => Err(FieldError::new(
            field,
            format!("expected an integer, got {}", json_type_name(other)),
        )),
    }
}

// ============================================================================
// Identifiers
// ============================================================================

/// Normalize a source identifier (numeric or string) into a non-empty string.
pub fn id_value(field: &'static str, value: &Value) -> FieldResult<String> {
    match value {
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => non_empty(field, s),
        Value::Null => Err(FieldError::new(field, "missing identifier")),
        other => Err(FieldError::new(
            field,
            format!("expected an identifier, got {}", json_type_name(other)),
        )),
    }
}

/// Reject blank identifiers; natural keys must never be empty.
pub fn non_empty(field: &'static str, raw: &str) -> FieldResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Err(FieldError::new(field, "empty identifier"))
    } else {
        Ok(trimmed.to_string())
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
