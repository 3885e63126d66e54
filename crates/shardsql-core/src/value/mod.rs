mod arith;
mod compare;


use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use std::fmt;
use thiserror::Error as ThisError;

// re-exports
pub use arith::{NumericError, add_numeric, average};
pub use compare::{TextMode, canonical_cmp, compare_values};

///
/// Value
///
/// Tagged SQL scalar read from a shard cursor cell.
/// The merge pipeline only ever needs this fixed set of kinds.
///
/// Null → SQL NULL; sorts according to the column's null ordering.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Decimal(Decimal),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

///
/// ValueKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, derive_more::Display)]
pub enum ValueKind {
    #[display("null")]
    Null,
    #[display("bool")]
    Bool,
    #[display("int")]
    Int,
    #[display("uint")]
    Uint,
    #[display("float")]
    Float,
    #[display("decimal")]
    Decimal,
    #[display("text")]
    Text,
    #[display("bytes")]
    Bytes,
    #[display("date")]
    Date,
    #[display("timestamp")]
    Timestamp,
}

impl Value {
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Uint(_) => ValueKind::Uint,
            Self::Float(_) => ValueKind::Float,
            Self::Decimal(_) => ValueKind::Decimal,
            Self::Text(_) => ValueKind::Text,
            Self::Bytes(_) => ValueKind::Bytes,
            Self::Date(_) => ValueKind::Date,
            Self::Timestamp(_) => ValueKind::Timestamp,
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Int(_) | Self::Uint(_) | Self::Float(_) | Self::Decimal(_)
        )
    }

    ///
    /// ACCESSORS
    ///

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer view; unsigned values outside `i64` and fractional
    /// decimals are rejected rather than truncated.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Uint(v) => i64::try_from(*v).ok(),
            Self::Decimal(v) if v.fract().is_zero() => v.to_i64(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Uint(v) => Some(*v),
            Self::Int(v) => u64::try_from(*v).ok(),
            Self::Decimal(v) if v.fract().is_zero() => v.to_u64(),
            _ => None,
        }
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            Self::Uint(v) => Some(*v as f64),
            Self::Decimal(v) => v.to_f64(),
            _ => None,
        }
    }

    /// Exact decimal view of integer and decimal values.
    /// Floats convert only when finite.
    #[must_use]
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Decimal(v) => Some(*v),
            Self::Int(v) => Some(Decimal::from(*v)),
            Self::Uint(v) => Some(Decimal::from(*v)),
            Self::Float(v) => Decimal::from_f64_retain(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Timestamp(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Uint(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Decimal(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "'{v}'"),
            Self::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            Self::Date(v) => write!(f, "{v}"),
            Self::Timestamp(v) => write!(f, "{v}"),
        }
    }
}

///
/// CONVERSIONS
///

macro_rules! impl_from_for_value {
    ( $( $type:ty => $variant:ident ),* $(,)? ) => {
        $(
            impl From<$type> for Value {
                fn from(v: $type) -> Self {
                    Self::$variant(v.into())
                }
            }
        )*
    };
}

impl_from_for_value! {
    bool => Bool,
    i32 => Int,
    i64 => Int,
    u32 => Uint,
    u64 => Uint,
    f64 => Float,
    Decimal => Decimal,
    String => Text,
    &str => Text,
    Vec<u8> => Bytes,
    NaiveDate => Date,
    NaiveDateTime => Timestamp,
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

///
/// ValueConversionError
///
/// Raised by `TryFrom<&Value>` when the cell kind cannot represent the
/// requested Rust type.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("cannot read {actual} value as {expected}")]
pub struct ValueConversionError {
    pub expected: &'static str,
    pub actual: ValueKind,
}

macro_rules! impl_try_from_value {
    ( $( $type:ty => $accessor:ident, $label:literal ),* $(,)? ) => {
        $(
            impl TryFrom<&Value> for $type {
                type Error = ValueConversionError;

                fn try_from(value: &Value) -> Result<Self, Self::Error> {
                    value.$accessor().map(Into::into).ok_or(ValueConversionError {
                        expected: $label,
                        actual: value.kind(),
                    })
                }
            }
        )*
    };
}

impl_try_from_value! {
    bool => as_bool, "bool",
    i64 => as_i64, "i64",
    u64 => as_u64, "u64",
    f64 => as_f64, "f64",
    Decimal => as_decimal, "decimal",
    String => as_text, "text",
    Vec<u8> => as_bytes, "bytes",
    NaiveDate => as_date, "date",
    NaiveDateTime => as_timestamp, "timestamp",
}
