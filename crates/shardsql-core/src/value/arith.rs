use crate::value::{Value, ValueKind};
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error as ThisError;

/// Scale applied to reconstructed averages.
const AVG_SCALE: u32 = 4;

///
/// NumericError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum NumericError {
    #[error("cannot aggregate non-numeric {kind} value")]
    NonNumeric { kind: ValueKind },

    #[error("decimal overflow while aggregating")]
    Overflow,

    #[error("non-finite float cannot be averaged")]
    NonFinite,
}

/// Add two aggregate partials with type widening.
///
/// - same integer kind stays that kind; overflow promotes to decimal
/// - mixed integer kinds widen to decimal
/// - any float widens to float
/// - any decimal widens to decimal
/// - NULL operands are ignored
pub fn add_numeric(left: &Value, right: &Value) -> Result<Value, NumericError> {
    for value in [left, right] {
        if !value.is_null() && !value.is_numeric() {
            return Err(NumericError::NonNumeric { kind: value.kind() });
        }
    }

    let sum = match (left, right) {
        (Value::Null, other) | (other, Value::Null) => other.clone(),
        (Value::Int(a), Value::Int(b)) => match a.checked_add(*b) {
            Some(v) => Value::Int(v),
            None => Value::Decimal(decimal_add(Decimal::from(*a), Decimal::from(*b))?),
        },
        (Value::Uint(a), Value::Uint(b)) => match a.checked_add(*b) {
            Some(v) => Value::Uint(v),
            None => Value::Decimal(decimal_add(Decimal::from(*a), Decimal::from(*b))?),
        },
        (Value::Float(_), _) | (_, Value::Float(_)) => match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => Value::Float(a + b),
            _ => return Err(NumericError::Overflow),
        },
        _ => match (left.as_decimal(), right.as_decimal()) {
            (Some(a), Some(b)) => Value::Decimal(decimal_add(a, b)?),
            _ => return Err(NumericError::Overflow),
        },
    };

    Ok(sum)
}

/// Reconstruct AVG from summed partial sums and counts.
///
/// Returns NULL when either side is NULL or the count is zero; otherwise
/// the quotient rounded to four places, half away from zero.
pub fn average(sum: &Value, count: &Value) -> Result<Value, NumericError> {
    if sum.is_null() || count.is_null() {
        return Ok(Value::Null);
    }

    let sum = to_decimal(sum)?;
    let count = to_decimal(count)?;
    if count.is_zero() {
        return Ok(Value::Null);
    }

    let quotient = sum.checked_div(count).ok_or(NumericError::Overflow)?;

    Ok(Value::Decimal(quotient.round_dp_with_strategy(
        AVG_SCALE,
        RoundingStrategy::MidpointAwayFromZero,
    )))
}

fn decimal_add(a: Decimal, b: Decimal) -> Result<Decimal, NumericError> {
    a.checked_add(b).ok_or(NumericError::Overflow)
}

fn to_decimal(value: &Value) -> Result<Decimal, NumericError> {
    match value {
        Value::Float(_) => value.as_decimal().ok_or(NumericError::NonFinite),
        v if v.is_numeric() => v.as_decimal().ok_or(NumericError::Overflow),
        v => Err(NumericError::NonNumeric { kind: v.kind() }),
    }
}
