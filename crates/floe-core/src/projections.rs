//! Projection of row-space predicates into partition space.
//!
//! The inclusive projection over-approximates: every partition that may hold
//! a matching row satisfies it, so it is safe for pruning files. The strict
//! projection under-approximates: every row in a satisfying partition
//! matches, so it is safe for skipping filter evaluation. A transform that
//! cannot project yields the mode's safe constant instead.

use crate::error::{Error, Result};
use crate::expr::{self, BoundPredicate, Expression};
use crate::partition::PartitionSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Inclusive,
    Strict,
}

/// Projects expressions through a partition spec. Obtain one with
/// [`inclusive`] or [`strict`].
pub struct Projections<'a> {
    spec: &'a PartitionSpec,
    mode: Mode,
}

/// The over-approximating projection for `spec`.
pub fn inclusive(spec: &PartitionSpec) -> Projections<'_> {
    Projections {
        spec,
        mode: Mode::Inclusive,
    }
}

/// The under-approximating projection for `spec`.
pub fn strict(spec: &PartitionSpec) -> Projections<'_> {
    Projections {
        spec,
        mode: Mode::Strict,
    }
}

impl Projections<'_> {
    /// Rewrite a row-space expression into an unbound partition-space
    /// expression over the spec's partition column names. Unbound input
    /// predicates are bound against the spec's schema first; callers bind
    /// the result against the spec's partition struct.
    pub fn project(&self, expr: &Expression) -> Result<Expression> {
        // Negation does not distribute over either projection mode, so
        // eliminate Not up front by flipping predicate operations.
        self.eval(&expr.rewrite_not())
    }

    fn eval(&self, expr: &Expression) -> Result<Expression> {
        match expr {
            Expression::AlwaysTrue => Ok(Expression::AlwaysTrue),
            Expression::AlwaysFalse => Ok(Expression::AlwaysFalse),
            Expression::And(l, r) => Ok(expr::and(self.eval(l)?, self.eval(r)?)),
            Expression::Or(l, r) => Ok(expr::or(self.eval(l)?, self.eval(r)?)),
            Expression::Not(_) => Err(Error::validation(
                "Cannot project a NOT expression; rewrite it first",
            )),
            Expression::Unbound(p) => match p.bind(self.spec.schema().as_struct())? {
                Expression::Bound(bound) => Ok(self.project_predicate(&bound)),
                constant => Ok(constant),
            },
            Expression::Bound(p) => Ok(self.project_predicate(p)),
        }
    }

    fn project_predicate(&self, pred: &BoundPredicate) -> Expression {
        match self.mode {
            Mode::Inclusive => {
                // Every matching partition field must agree; a field that
                // cannot project contributes the safe True.
                let mut result = Expression::AlwaysTrue;
                for part in self.spec.fields_for_source(pred.reference.field_id) {
                    if let Some(projected) = part.transform.project(&part.name, pred) {
                        result = expr::and(result, Expression::Unbound(projected));
                    }
                }
                result
            }
            Mode::Strict => {
                // Any one strict guarantee suffices; a field that cannot
                // project contributes the safe False.
                let mut result = Expression::AlwaysFalse;
                for part in self.spec.fields_for_source(pred.reference.field_id) {
                    if let Some(projected) = part.transform.project_strict(&part.name, pred) {
                        result = expr::or(result, Expression::Unbound(projected));
                    }
                }
                result
            }
        }
    }
}
