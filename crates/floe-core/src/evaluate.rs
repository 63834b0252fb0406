//! Evaluation of bound expressions against partition tuples and file
//! statistics.
//!
//! `eval_struct` answers a predicate exactly for one partition tuple.
//! `might_contain` answers conservatively from per-field statistics: `true`
//! means the file may hold matching rows, `false` means it provably cannot.
//! Statistics are consumed structurally; this crate never computes them.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::expr::{BoundPredicate, Expression, Operation};
use crate::literal::Literal;
use crate::types::StructType;

/// Evaluate a bound expression against a tuple shaped by `struct_type`.
/// `values` holds one entry per field, in field order; `None` is null.
pub fn eval_struct(
    expr: &Expression,
    struct_type: &StructType,
    values: &[Option<Literal>],
) -> Result<bool> {
    match expr {
        Expression::AlwaysTrue => Ok(true),
        Expression::AlwaysFalse => Ok(false),
        Expression::And(l, r) => {
            Ok(eval_struct(l, struct_type, values)? && eval_struct(r, struct_type, values)?)
        }
        Expression::Or(l, r) => {
            Ok(eval_struct(l, struct_type, values)? || eval_struct(r, struct_type, values)?)
        }
        Expression::Not(e) => Ok(!eval_struct(e, struct_type, values)?),
        Expression::Unbound(p) => Err(Error::validation(format!(
            "Cannot evaluate unbound predicate on '{}'",
            p.reference.name
        ))),
        Expression::Bound(p) => eval_predicate(p, struct_type, values),
    }
}

fn eval_predicate(
    pred: &BoundPredicate,
    struct_type: &StructType,
    values: &[Option<Literal>],
) -> Result<bool> {
    let position = struct_type
        .fields
        .iter()
        .position(|f| f.id == pred.reference.field_id)
        .ok_or_else(|| {
            Error::validation(format!(
                "Cannot find field id {} in struct",
                pred.reference.field_id
            ))
        })?;
    let value = values.get(position).and_then(|v| v.as_ref());

    match pred.op {
        Operation::IsNull => return Ok(value.is_none()),
        Operation::NotNull => return Ok(value.is_some()),
        _ => {}
    }

    // Null never satisfies a comparison.
    let value = match value {
        Some(value) => value,
        None => return Ok(false),
    };
    let literal = pred
        .literal
        .as_ref()
        .ok_or_else(|| Error::validation(format!("Operation {} requires a literal", pred.op)))?;
    let ordering = value.partial_cmp(literal).ok_or_else(|| {
        Error::validation(format!(
            "Cannot compare {} value with {} literal",
            value.kind(),
            literal.kind()
        ))
    })?;

    Ok(match pred.op {
        Operation::Lt => ordering.is_lt(),
        Operation::LtEq => ordering.is_le(),
        Operation::Gt => ordering.is_gt(),
        Operation::GtEq => ordering.is_ge(),
        Operation::Eq => ordering.is_eq(),
        Operation::NotEq => ordering.is_ne(),
        Operation::IsNull | Operation::NotNull => unreachable!("handled above"),
    })
}

/// Per-field statistics of one data file, keyed by field id. Bounds are
/// literals of the field's type and cover the non-null values present.
#[derive(Debug, Clone, Default)]
pub struct FileStats {
    pub record_count: u64,
    pub value_counts: HashMap<i32, u64>,
    pub null_value_counts: HashMap<i32, u64>,
    pub lower_bounds: HashMap<i32, Literal>,
    pub upper_bounds: HashMap<i32, Literal>,
}

/// Whether a file with these statistics may contain rows matching the bound
/// expression. Missing statistics never rule a file out.
pub fn might_contain(expr: &Expression, stats: &FileStats) -> Result<bool> {
    rows_might_match(&expr.rewrite_not(), stats)
}

fn rows_might_match(expr: &Expression, stats: &FileStats) -> Result<bool> {
    match expr {
        Expression::AlwaysTrue => Ok(true),
        Expression::AlwaysFalse => Ok(false),
        Expression::And(l, r) => Ok(rows_might_match(l, stats)? && rows_might_match(r, stats)?),
        Expression::Or(l, r) => Ok(rows_might_match(l, stats)? || rows_might_match(r, stats)?),
        Expression::Not(_) => unreachable!("not expressions are rewritten before evaluation"),
        Expression::Unbound(p) => Err(Error::validation(format!(
            "Cannot evaluate unbound predicate on '{}'",
            p.reference.name
        ))),
        Expression::Bound(p) => stats_might_match(p, stats),
    }
}

fn stats_might_match(pred: &BoundPredicate, stats: &FileStats) -> Result<bool> {
    let id = pred.reference.field_id;
    match pred.op {
        Operation::IsNull => {
            // No nulls recorded means the column has no null to match.
            Ok(stats.null_value_counts.get(&id) != Some(&0))
        }
        Operation::NotNull => {
            match (
                stats.value_counts.get(&id),
                stats.null_value_counts.get(&id),
            ) {
                (Some(values), Some(nulls)) if values == nulls => Ok(false),
                _ => Ok(true),
            }
        }
        Operation::NotEq => {
            // Bounds cannot establish that every row equals the literal.
            Ok(true)
        }
        op => {
            let literal = pred.literal.as_ref().ok_or_else(|| {
                Error::validation(format!("Operation {} requires a literal", pred.op))
            })?;
            let lower = stats.lower_bounds.get(&id);
            let upper = stats.upper_bounds.get(&id);
            let below = |bound: Option<&Literal>, strict: bool| -> bool {
                // True when the bound proves no row can satisfy the op.
                match bound.and_then(|b| b.partial_cmp(literal)) {
                    Some(ordering) => {
                        if strict {
                            ordering.is_ge()
                        } else {
                            ordering.is_gt()
                        }
                    }
                    None => false,
                }
            };
            let above = |bound: Option<&Literal>, strict: bool| -> bool {
                match bound.and_then(|b| b.partial_cmp(literal)) {
                    Some(ordering) => {
                        if strict {
                            ordering.is_le()
                        } else {
                            ordering.is_lt()
                        }
                    }
                    None => false,
                }
            };
            Ok(match op {
                Operation::Lt => !below(lower, true),
                Operation::LtEq => !below(lower, false),
                Operation::Gt => !above(upper, true),
                Operation::GtEq => !above(upper, false),
                Operation::Eq => !(below(lower, false) || above(upper, false)),
                _ => unreachable!("remaining operations handled above"),
            })
        }
    }
}
