//! Typed literal values and the conversion lattice.
//!
//! Wire representations follow the table format: dates are days from
//! 1970-01-01, times and timestamps are microseconds, decimals carry an
//! unscaled value plus scale, UUIDs are 16 big-endian bytes. Conversion
//! (`Literal::to`) never errors: a disallowed conversion is `None`, and an
//! out-of-range value becomes one of the sentinel `Converted` variants so
//! that expression binding can fold instead of raising.

use std::cmp::Ordering;
use std::str::FromStr;

use bigdecimal::{BigDecimal, RoundingMode};
use num_bigint::Sign;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use uuid::Uuid;

use crate::types::Type;

pub(crate) const MICROS_PER_SECOND: i64 = 1_000_000;

/// A value tagged by its runtime type.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Boolean(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Decimal(BigDecimal),
    /// Days from 1970-01-01.
    Date(i32),
    /// Microseconds from midnight.
    Time(i64),
    /// Microseconds from 1970-01-01T00:00:00.
    Timestamp(i64),
    Str(String),
    Uuid(Uuid),
    Fixed(Vec<u8>),
    Binary(Vec<u8>),
}

/// Result of a permitted conversion: either a concrete literal, or a
/// sentinel marking a value outside the target domain.
#[derive(Debug, Clone, PartialEq)]
pub enum Converted {
    Value(Literal),
    AboveMax,
    BelowMin,
}

impl Converted {
    /// The concrete literal, if this is not a sentinel.
    pub fn literal(self) -> Option<Literal> {
        match self {
            Converted::Value(lit) => Some(lit),
            _ => None,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        !matches!(self, Converted::Value(_))
    }
}

impl From<bool> for Literal {
    fn from(v: bool) -> Self {
        Literal::Boolean(v)
    }
}

impl From<i32> for Literal {
    fn from(v: i32) -> Self {
        Literal::Int(v)
    }
}

impl From<i64> for Literal {
    fn from(v: i64) -> Self {
        Literal::Long(v)
    }
}

impl From<f32> for Literal {
    fn from(v: f32) -> Self {
        Literal::Float(v)
    }
}

impl From<f64> for Literal {
    fn from(v: f64) -> Self {
        Literal::Double(v)
    }
}

impl From<&str> for Literal {
    fn from(v: &str) -> Self {
        Literal::Str(v.to_string())
    }
}

impl From<String> for Literal {
    fn from(v: String) -> Self {
        Literal::Str(v)
    }
}

impl From<Uuid> for Literal {
    fn from(v: Uuid) -> Self {
        Literal::Uuid(v)
    }
}

impl From<BigDecimal> for Literal {
    fn from(v: BigDecimal) -> Self {
        Literal::Decimal(v)
    }
}

impl Literal {
    pub fn fixed(bytes: Vec<u8>) -> Self {
        Literal::Fixed(bytes)
    }

    pub fn binary(bytes: Vec<u8>) -> Self {
        Literal::Binary(bytes)
    }

    /// A short name for the literal's kind, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Literal::Boolean(_) => "boolean",
            Literal::Int(_) => "int",
            Literal::Long(_) => "long",
            Literal::Float(_) => "float",
            Literal::Double(_) => "double",
            Literal::Decimal(_) => "decimal",
            Literal::Date(_) => "date",
            Literal::Time(_) => "time",
            Literal::Timestamp(_) => "timestamp",
            Literal::Str(_) => "string",
            Literal::Uuid(_) => "uuid",
            Literal::Fixed(_) => "fixed",
            Literal::Binary(_) => "binary",
        }
    }

    /// Convert this literal to the target type.
    ///
    /// Returns `None` iff the conversion is disallowed by the lattice,
    /// including strings that fail to parse. Returns a sentinel when the
    /// value falls outside the representable range of the target. Converting
    /// to the literal's own type returns the value unchanged.
    pub fn to(&self, target: &Type) -> Option<Converted> {
        use Converted::Value;

        match (self, target) {
            (Literal::Boolean(_), Type::Boolean) => Some(Value(self.clone())),

            (Literal::Int(_), Type::Int) => Some(Value(self.clone())),
            (Literal::Int(v), Type::Long) => Some(Value(Literal::Long(*v as i64))),
            (Literal::Int(v), Type::Float) => Some(Value(Literal::Float(*v as f32))),
            (Literal::Int(v), Type::Double) => Some(Value(Literal::Double(*v as f64))),
            (Literal::Int(v), Type::Decimal { precision, scale }) => {
                Some(rescale(BigDecimal::from(*v), *precision, *scale))
            }

            (Literal::Long(v), Type::Int) => {
                if *v > i32::MAX as i64 {
                    Some(Converted::AboveMax)
                } else if *v < i32::MIN as i64 {
                    Some(Converted::BelowMin)
                } else {
                    Some(Value(Literal::Int(*v as i32)))
                }
            }
            (Literal::Long(_), Type::Long) => Some(Value(self.clone())),
            (Literal::Long(v), Type::Float) => Some(Value(Literal::Float(*v as f32))),
            (Literal::Long(v), Type::Double) => Some(Value(Literal::Double(*v as f64))),
            (Literal::Long(v), Type::Decimal { precision, scale }) => {
                Some(rescale(BigDecimal::from(*v), *precision, *scale))
            }

            (Literal::Float(_), Type::Float) => Some(Value(self.clone())),
            (Literal::Float(v), Type::Double) => Some(Value(Literal::Double(*v as f64))),
            (Literal::Float(v), Type::Decimal { precision, scale }) => {
                BigDecimal::try_from(*v).ok().map(|d| rescale(d, *precision, *scale))
            }

            (Literal::Double(v), Type::Float) => {
                if *v > f32::MAX as f64 {
                    Some(Converted::AboveMax)
                } else if *v < f32::MIN as f64 {
                    Some(Converted::BelowMin)
                } else {
                    Some(Value(Literal::Float(*v as f32)))
                }
            }
            (Literal::Double(_), Type::Double) => Some(Value(self.clone())),
            (Literal::Double(v), Type::Decimal { precision, scale }) => {
                BigDecimal::try_from(*v).ok().map(|d| rescale(d, *precision, *scale))
            }

            (Literal::Decimal(d), Type::Decimal { precision, scale }) => {
                if decimal_scale(d) != *scale as i64 {
                    return None;
                }
                if d.digits() > *precision as u64 {
                    return Some(sentinel_for_sign(d));
                }
                Some(Value(self.clone()))
            }

            (Literal::Date(_), Type::Date) => Some(Value(self.clone())),
            (Literal::Time(_), Type::Time) => Some(Value(self.clone())),
            (Literal::Timestamp(_), Type::Timestamp { .. }) => Some(Value(self.clone())),

            (Literal::Str(_), Type::String) => Some(Value(self.clone())),
            (Literal::Str(s), Type::Date) => parse_date(s).map(|d| Value(Literal::Date(d))),
            (Literal::Str(s), Type::Time) => parse_time(s).map(|t| Value(Literal::Time(t))),
            (Literal::Str(s), Type::Timestamp { adjusted_to_utc }) => {
                parse_timestamp(s, *adjusted_to_utc).map(|ts| Value(Literal::Timestamp(ts)))
            }
            (Literal::Str(s), Type::Uuid) => {
                Uuid::parse_str(s).ok().map(|u| Value(Literal::Uuid(u)))
            }
            (Literal::Str(s), Type::Decimal { scale, .. }) => {
                let d = BigDecimal::from_str(s).ok()?;
                if decimal_scale(&d) == *scale as i64 {
                    Some(Value(Literal::Decimal(d)))
                } else {
                    None
                }
            }

            (Literal::Uuid(_), Type::Uuid) => Some(Value(self.clone())),

            (Literal::Fixed(b), Type::Fixed(len)) => {
                if b.len() == *len {
                    Some(Value(self.clone()))
                } else {
                    None
                }
            }
            (Literal::Fixed(b), Type::Binary) => Some(Value(Literal::Binary(b.clone()))),
            (Literal::Binary(_), Type::Binary) => Some(Value(self.clone())),
            (Literal::Binary(b), Type::Fixed(len)) => {
                if b.len() == *len {
                    Some(Value(Literal::Fixed(b.clone())))
                } else {
                    None
                }
            }

            _ => None,
        }
    }
}

/// Every primitive literal kind except boolean orders by its natural value;
/// decimals compare numerically regardless of representation scale. Values
/// of different kinds do not compare.
impl PartialOrd for Literal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Literal::Boolean(a), Literal::Boolean(b)) => Some(a.cmp(b)),
            (Literal::Int(a), Literal::Int(b)) => Some(a.cmp(b)),
            (Literal::Long(a), Literal::Long(b)) => Some(a.cmp(b)),
            (Literal::Float(a), Literal::Float(b)) => Some(a.total_cmp(b)),
            (Literal::Double(a), Literal::Double(b)) => Some(a.total_cmp(b)),
            (Literal::Decimal(a), Literal::Decimal(b)) => Some(a.cmp(b)),
            (Literal::Date(a), Literal::Date(b)) => Some(a.cmp(b)),
            (Literal::Time(a), Literal::Time(b)) => Some(a.cmp(b)),
            (Literal::Timestamp(a), Literal::Timestamp(b)) => Some(a.cmp(b)),
            (Literal::Str(a), Literal::Str(b)) => Some(a.cmp(b)),
            (Literal::Uuid(a), Literal::Uuid(b)) => Some(a.cmp(b)),
            (Literal::Fixed(a), Literal::Fixed(b)) => Some(a.cmp(b)),
            (Literal::Binary(a), Literal::Binary(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

fn decimal_scale(d: &BigDecimal) -> i64 {
    let (_, scale) = d.as_bigint_and_exponent();
    scale
}

fn sentinel_for_sign(d: &BigDecimal) -> Converted {
    if d.sign() == Sign::Minus {
        Converted::BelowMin
    } else {
        Converted::AboveMax
    }
}

/// Rescale to the target scale with HALF_UP rounding; values whose digits
/// exceed the target precision become sentinels.
fn rescale(d: BigDecimal, precision: u32, scale: u32) -> Converted {
    let rescaled = d.with_scale_round(scale as i64, RoundingMode::HalfUp);
    if rescaled.digits() > precision as u64 {
        sentinel_for_sign(&rescaled)
    } else {
        Converted::Value(Literal::Decimal(rescaled))
    }
}

pub(crate) fn epoch_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).expect("epoch date is valid")
}

fn parse_date(s: &str) -> Option<i32> {
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    Some(date.signed_duration_since(epoch_day()).num_days() as i32)
}

fn parse_time(s: &str) -> Option<i64> {
    let time = NaiveTime::parse_from_str(s, "%H:%M:%S%.f").ok()?;
    Some(
        time.num_seconds_from_midnight() as i64 * MICROS_PER_SECOND
            + (time.nanosecond() / 1_000) as i64,
    )
}

fn parse_timestamp(s: &str, adjusted_to_utc: bool) -> Option<i64> {
    if adjusted_to_utc {
        let ts = DateTime::parse_from_rfc3339(s).ok()?;
        Some(ts.timestamp_micros())
    } else {
        let ts = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
        Some(ts.and_utc().timestamp_micros())
    }
}

/// Days from epoch to a calendar date. Panics on out-of-range days, which
/// cannot be produced by the parsers above.
pub(crate) fn date_for_days(days: i32) -> NaiveDate {
    epoch_day()
        .checked_add_signed(chrono::Duration::days(days as i64))
        .unwrap_or_else(|| panic!("day ordinal out of range: {days}"))
}

// Used by temporal transforms: extract the calendar parts of a timestamp.
pub(crate) fn timestamp_days(micros: i64) -> i32 {
    micros.div_euclid(86_400 * MICROS_PER_SECOND) as i32
}

pub(crate) fn timestamp_date(micros: i64) -> NaiveDate {
    date_for_days(timestamp_days(micros))
}

pub(crate) fn year_ordinal(date: NaiveDate) -> i32 {
    date.year() - 1970
}

pub(crate) fn month_ordinal(date: NaiveDate) -> i32 {
    (date.year() - 1970) * 12 + date.month0() as i32
}
