use crate::value::Value;
use rust_decimal::Decimal;
use std::cmp::Ordering;

///
/// TextMode
///
/// Text comparison mode taken from the column's collation metadata.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum TextMode {
    #[default]
    Cs, // case-sensitive
    Ci, // case-insensitive
}

impl TextMode {
    #[must_use]
    pub const fn from_case_sensitive(case_sensitive: bool) -> Self {
        if case_sensitive { Self::Cs } else { Self::Ci }
    }
}

/// Total comparator used by merge ordering and group-key equality.
///
/// Ordering rules:
/// 1. Numeric kinds compare by value across kinds
/// 2. Text honours the column's `TextMode`
/// 3. Remaining same-kind values use their natural order
/// 4. Mismatched kinds fall back to canonical kind rank
///
/// NULL handling (first/last) belongs to the caller; here NULL only
/// ranks below every other kind.
#[must_use]
pub fn compare_values(left: &Value, right: &Value, mode: TextMode) -> Ordering {
    if left.is_numeric() && right.is_numeric() {
        return cmp_numeric(left, right);
    }

    match (left, right) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Text(a), Value::Text(b)) => cmp_text(a, b, mode),
        (Value::Bytes(a), Value::Bytes(b)) => a.cmp(b),
        (Value::Date(a), Value::Date(b)) => a.cmp(b),
        (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
        _ => canonical_rank(left).cmp(&canonical_rank(right)),
    }
}

/// Case-sensitive total comparator.
#[must_use]
pub fn canonical_cmp(left: &Value, right: &Value) -> Ordering {
    compare_values(left, right, TextMode::Cs)
}

///
/// Canonical Value Rank
///
/// Stable rank used for cross-kind ordering. All numeric kinds share one
/// rank so they interleave by value.
///
const fn canonical_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Int(_) | Value::Uint(_) | Value::Float(_) | Value::Decimal(_) => 2,
        Value::Text(_) => 3,
        Value::Bytes(_) => 4,
        Value::Date(_) => 5,
        Value::Timestamp(_) => 6,
    }
}

fn cmp_numeric(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => a.cmp(b),
        (Value::Uint(a), Value::Uint(b)) => a.cmp(b),
        (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
        _ => match (exact_decimal(left), exact_decimal(right)) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => match (left.as_f64(), right.as_f64()) {
                (Some(a), Some(b)) => a.total_cmp(&b),
                _ => Ordering::Equal,
            },
        },
    }
}

// Floats are excluded so float-vs-int goes through f64.
fn exact_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Int(v) => Some(Decimal::from(*v)),
        Value::Uint(v) => Some(Decimal::from(*v)),
        Value::Decimal(v) => Some(*v),
        _ => None,
    }
}

fn cmp_text(left: &str, right: &str, mode: TextMode) -> Ordering {
    match mode {
        TextMode::Cs => left.cmp(right),
        TextMode::Ci => {
            if left.is_ascii() && right.is_ascii() {
                let left = left.bytes().map(|b| b.to_ascii_lowercase());
                let right = right.bytes().map(|b| b.to_ascii_lowercase());

                return left.cmp(right);
            }

            let left = left.chars().flat_map(char::to_lowercase);
            let right = right.chars().flat_map(char::to_lowercase);

            left.cmp(right)
        }
    }
}
