//! Partition transforms: pure functions from a source column value to a
//! partition column value, with companion projection operators.
//!
//! Every transform is deterministic and byte-stable across platforms; the
//! bucket hash layouts below define on-disk compatibility and must not
//! change.

use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;

use crate::error::Error;
use crate::expr::{predicate, BoundPredicate, Expression, Operation, UnboundPredicate};
use crate::literal::{
    date_for_days, month_ordinal, timestamp_date, timestamp_days, year_ordinal, Literal,
    MICROS_PER_SECOND,
};
use crate::types::Type;

/// A partition transform. Transforms are value types: two buckets are equal
/// iff their bucket counts are, two truncates iff their widths are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transform {
    /// The source value, unchanged.
    Identity,
    /// Murmur3-based hash bucket in `[0, N)`.
    Bucket(u32),
    /// Width-aligned truncation: numeric values round toward negative
    /// infinity in units of the width, strings keep a code-point prefix,
    /// binary keeps a byte prefix.
    Truncate(u32),
    /// Years from 1970.
    Year,
    /// Months from 1970-01.
    Month,
    /// Days from 1970-01-01.
    Day,
    /// Hours from 1970-01-01T00:00:00.
    Hour,
}

impl Transform {
    /// Whether the transform accepts a source column of the given type.
    pub fn can_transform(&self, source: &Type) -> bool {
        match self {
            Transform::Identity => source.is_primitive(),
            Transform::Bucket(_) => matches!(
                source,
                Type::Int
                    | Type::Long
                    | Type::Date
                    | Type::Time
                    | Type::Timestamp { .. }
                    | Type::Decimal { .. }
                    | Type::String
                    | Type::Uuid
                    | Type::Fixed(_)
                    | Type::Binary
            ),
            Transform::Truncate(_) => matches!(
                source,
                Type::Int | Type::Long | Type::String | Type::Decimal { .. } | Type::Binary
            ),
            Transform::Year | Transform::Month | Transform::Day => {
                matches!(source, Type::Date | Type::Timestamp { .. })
            }
            Transform::Hour => matches!(source, Type::Timestamp { .. }),
        }
    }

    /// The partition column type produced from the given source type.
    pub fn result_type(&self, source: &Type) -> Type {
        match self {
            Transform::Identity | Transform::Truncate(_) => source.clone(),
            Transform::Bucket(_)
            | Transform::Year
            | Transform::Month
            | Transform::Day
            | Transform::Hour => Type::Int,
        }
    }

    /// Apply the transform to a value. The caller must have checked
    /// `can_transform` for the value's type; unsupported values panic.
    pub fn apply(&self, value: &Literal) -> Literal {
        match self {
            Transform::Identity => value.clone(),
            Transform::Bucket(n) => {
                Literal::Int((hash_value(value) & i32::MAX) % (*n as i32))
            }
            Transform::Truncate(width) => truncate(*width, value),
            Transform::Year => match value {
                Literal::Date(days) => Literal::Int(year_ordinal(date_for_days(*days))),
                Literal::Timestamp(micros) => Literal::Int(year_ordinal(timestamp_date(*micros))),
                other => panic!("cannot extract year from: {}", other.kind()),
            },
            Transform::Month => match value {
                Literal::Date(days) => Literal::Int(month_ordinal(date_for_days(*days))),
                Literal::Timestamp(micros) => Literal::Int(month_ordinal(timestamp_date(*micros))),
                other => panic!("cannot extract month from: {}", other.kind()),
            },
            Transform::Day => match value {
                Literal::Date(days) => Literal::Int(*days),
                Literal::Timestamp(micros) => Literal::Int(timestamp_days(*micros)),
                other => panic!("cannot extract day from: {}", other.kind()),
            },
            Transform::Hour => match value {
                Literal::Timestamp(micros) => {
                    Literal::Int(micros.div_euclid(3_600 * MICROS_PER_SECOND) as i32)
                }
                other => panic!("cannot extract hour from: {}", other.kind()),
            },
        }
    }

    /// Inclusive projection: rewrite a bound row-space predicate into a
    /// partition-space predicate that is satisfied by every partition that
    /// may hold matching rows. `None` when no such rewrite exists.
    pub fn project(&self, name: &str, pred: &BoundPredicate) -> Option<UnboundPredicate> {
        match self {
            Transform::Identity => Some(self.rename(name, pred.op, pred.literal.clone())),
            Transform::Bucket(_) => match pred.op {
                Operation::Eq => Some(self.transformed(name, pred.op, pred.literal.as_ref()?)),
                // Hash buckets preserve nothing about ordering, and a bucket
                // holding other values cannot be ruled out for not-equals.
                _ => None,
            },
            _ => match pred.op {
                Operation::Eq => Some(self.transformed(name, pred.op, pred.literal.as_ref()?)),
                Operation::Lt | Operation::LtEq => {
                    Some(self.transformed(name, Operation::LtEq, pred.literal.as_ref()?))
                }
                Operation::Gt | Operation::GtEq => {
                    Some(self.transformed(name, Operation::GtEq, pred.literal.as_ref()?))
                }
                _ => None,
            },
        }
    }

    /// Strict projection: rewrite a bound row-space predicate into a
    /// partition-space predicate satisfied only by partitions whose every
    /// row matches. `None` when no such rewrite exists.
    pub fn project_strict(&self, name: &str, pred: &BoundPredicate) -> Option<UnboundPredicate> {
        match self {
            Transform::Identity => Some(self.rename(name, pred.op, pred.literal.clone())),
            Transform::Bucket(_) => match pred.op {
                Operation::NotEq => Some(self.transformed(name, pred.op, pred.literal.as_ref()?)),
                _ => None,
            },
            _ => match pred.op {
                Operation::NotEq => Some(self.transformed(name, pred.op, pred.literal.as_ref()?)),
                Operation::Lt | Operation::LtEq => {
                    Some(self.transformed(name, Operation::Lt, pred.literal.as_ref()?))
                }
                Operation::Gt | Operation::GtEq => {
                    Some(self.transformed(name, Operation::Gt, pred.literal.as_ref()?))
                }
                _ => None,
            },
        }
    }

    fn transformed(&self, name: &str, op: Operation, literal: &Literal) -> UnboundPredicate {
        match predicate(op, name, self.apply(literal)) {
            Expression::Unbound(p) => p,
            _ => unreachable!("predicate constructor returns an unbound predicate"),
        }
    }

    fn rename(&self, name: &str, op: Operation, literal: Option<Literal>) -> UnboundPredicate {
        UnboundPredicate {
            op,
            reference: crate::expr::NamedReference {
                name: name.to_string(),
            },
            literal,
        }
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transform::Identity => write!(f, "identity"),
            Transform::Bucket(n) => write!(f, "bucket[{n}]"),
            Transform::Truncate(w) => write!(f, "truncate[{w}]"),
            Transform::Year => write!(f, "year"),
            Transform::Month => write!(f, "month"),
            Transform::Day => write!(f, "day"),
            Transform::Hour => write!(f, "hour"),
        }
    }
}

impl FromStr for Transform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "identity" => return Ok(Transform::Identity),
            "year" => return Ok(Transform::Year),
            "month" => return Ok(Transform::Month),
            "day" => return Ok(Transform::Day),
            "hour" => return Ok(Transform::Hour),
            _ => {}
        }
        let param = |prefix: &str| -> Option<u32> {
            s.strip_prefix(prefix)?
                .strip_suffix(']')?
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
        };
        if let Some(n) = param("bucket[") {
            return Ok(Transform::Bucket(n));
        }
        if let Some(w) = param("truncate[") {
            return Ok(Transform::Truncate(w));
        }
        Err(Error::validation(format!("Invalid transform: {s}")))
    }
}

/// Murmur3 32-bit, seed 0, over the value's wire bytes.
fn hash_value(value: &Literal) -> i32 {
    match value {
        // Ints and dates widen to 8 bytes so that promoting an int column to
        // long keeps its bucket assignments.
        Literal::Int(v) => hash_bytes(&(*v as i64).to_le_bytes()),
        Literal::Date(v) => hash_bytes(&(*v as i64).to_le_bytes()),
        Literal::Long(v) | Literal::Time(v) | Literal::Timestamp(v) => {
            hash_bytes(&v.to_le_bytes())
        }
        // Bucketing by floats is not allowed; the layouts are pinned for
        // hash compatibility tests only.
        Literal::Float(v) => hash_bytes(&(*v as f64).to_bits().to_le_bytes()),
        Literal::Double(v) => hash_bytes(&v.to_bits().to_le_bytes()),
        Literal::Decimal(d) => {
            let (unscaled, _) = d.as_bigint_and_exponent();
            hash_bytes(&unscaled.to_signed_bytes_be())
        }
        Literal::Str(s) => hash_bytes(s.as_bytes()),
        Literal::Uuid(u) => hash_bytes(u.as_bytes()),
        Literal::Fixed(b) | Literal::Binary(b) => hash_bytes(b),
        Literal::Boolean(_) => panic!("cannot bucket by type: boolean"),
    }
}

fn hash_bytes(bytes: &[u8]) -> i32 {
    // Reading from an in-memory slice cannot fail.
    murmur3::murmur3_32(&mut &bytes[..], 0).expect("slice reads are infallible") as i32
}

fn truncate(width: u32, value: &Literal) -> Literal {
    match value {
        Literal::Int(v) => {
            let w = width as i32;
            Literal::Int(v - (((v % w) + w) % w))
        }
        Literal::Long(v) => {
            let w = width as i64;
            Literal::Long(v - (((v % w) + w) % w))
        }
        Literal::Str(s) => Literal::Str(s.chars().take(width as usize).collect()),
        Literal::Decimal(d) => {
            let (unscaled, scale) = d.clone().into_bigint_and_exponent();
            let w = BigInt::from(width);
            let remainder = ((&unscaled % &w) + &w) % &w;
            Literal::Decimal(BigDecimal::new(unscaled - remainder, scale))
        }
        Literal::Binary(b) => Literal::Binary(b[..b.len().min(width as usize)].to_vec()),
        other => panic!("cannot truncate: {}", other.kind()),
    }
}
