//! Algebraic predicate expressions.
//!
//! Expressions start unbound, over column names and raw literal values.
//! `bind` resolves names to field ids against a struct type, converts
//! literals to the field types through the conversion lattice, and folds
//! predicates whose literals fall outside the field's domain. After a
//! successful bind every reference is a `BoundReference` and every literal
//! matches its field's type, or the expression has collapsed to a constant.

use std::fmt;

use crate::error::{Error, Result};
use crate::literal::{Converted, Literal};
use crate::types::{StructType, Type};

/// Comparison and null-check operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Lt,
    LtEq,
    Gt,
    GtEq,
    Eq,
    NotEq,
    IsNull,
    NotNull,
}

impl Operation {
    /// The operation satisfied exactly when this one is not.
    pub fn negate(self) -> Operation {
        match self {
            Operation::Lt => Operation::GtEq,
            Operation::LtEq => Operation::Gt,
            Operation::Gt => Operation::LtEq,
            Operation::GtEq => Operation::Lt,
            Operation::Eq => Operation::NotEq,
            Operation::NotEq => Operation::Eq,
            Operation::IsNull => Operation::NotNull,
            Operation::NotNull => Operation::IsNull,
        }
    }

    pub fn requires_literal(self) -> bool {
        !matches!(self, Operation::IsNull | Operation::NotNull)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Lt => "<",
            Operation::LtEq => "<=",
            Operation::Gt => ">",
            Operation::GtEq => ">=",
            Operation::Eq => "==",
            Operation::NotEq => "!=",
            Operation::IsNull => "is_null",
            Operation::NotNull => "not_null",
        };
        f.write_str(name)
    }
}

/// An unresolved column reference.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedReference {
    pub name: String,
}

/// A reference resolved to a field id and its type.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundReference {
    pub field_id: i32,
    pub field_type: Type,
}

/// A predicate over a named column and a raw literal.
#[derive(Debug, Clone, PartialEq)]
pub struct UnboundPredicate {
    pub op: Operation,
    pub reference: NamedReference,
    pub literal: Option<Literal>,
}

/// A predicate over a resolved field; its literal has the field's type.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundPredicate {
    pub op: Operation,
    pub reference: BoundReference,
    pub literal: Option<Literal>,
}

/// A predicate expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    AlwaysTrue,
    AlwaysFalse,
    And(Box<Expression>, Box<Expression>),
    Or(Box<Expression>, Box<Expression>),
    Not(Box<Expression>),
    Unbound(UnboundPredicate),
    Bound(BoundPredicate),
}

pub fn always_true() -> Expression {
    Expression::AlwaysTrue
}

pub fn always_false() -> Expression {
    Expression::AlwaysFalse
}

/// Conjunction, with `True`/`False` folded away.
pub fn and(left: Expression, right: Expression) -> Expression {
    match (left, right) {
        (Expression::AlwaysFalse, _) | (_, Expression::AlwaysFalse) => Expression::AlwaysFalse,
        (Expression::AlwaysTrue, right) => right,
        (left, Expression::AlwaysTrue) => left,
        (left, right) => Expression::And(Box::new(left), Box::new(right)),
    }
}

/// Disjunction, with `True`/`False` folded away.
pub fn or(left: Expression, right: Expression) -> Expression {
    match (left, right) {
        (Expression::AlwaysTrue, _) | (_, Expression::AlwaysTrue) => Expression::AlwaysTrue,
        (Expression::AlwaysFalse, right) => right,
        (left, Expression::AlwaysFalse) => left,
        (left, right) => Expression::Or(Box::new(left), Box::new(right)),
    }
}

/// Negation. Constants and double negation fold immediately; anything else
/// is wrapped and can be pushed to the leaves with `rewrite_not`.
pub fn not(child: Expression) -> Expression {
    match child {
        Expression::AlwaysTrue => Expression::AlwaysFalse,
        Expression::AlwaysFalse => Expression::AlwaysTrue,
        Expression::Not(inner) => *inner,
        child => Expression::Not(Box::new(child)),
    }
}

pub fn predicate(op: Operation, name: impl Into<String>, literal: Literal) -> Expression {
    Expression::Unbound(UnboundPredicate {
        op,
        reference: NamedReference { name: name.into() },
        literal: Some(literal),
    })
}

pub fn unary_predicate(op: Operation, name: impl Into<String>) -> Expression {
    Expression::Unbound(UnboundPredicate {
        op,
        reference: NamedReference { name: name.into() },
        literal: None,
    })
}

pub fn less_than(name: impl Into<String>, literal: impl Into<Literal>) -> Expression {
    predicate(Operation::Lt, name, literal.into())
}

pub fn less_than_or_equal(name: impl Into<String>, literal: impl Into<Literal>) -> Expression {
    predicate(Operation::LtEq, name, literal.into())
}

pub fn greater_than(name: impl Into<String>, literal: impl Into<Literal>) -> Expression {
    predicate(Operation::Gt, name, literal.into())
}

pub fn greater_than_or_equal(name: impl Into<String>, literal: impl Into<Literal>) -> Expression {
    predicate(Operation::GtEq, name, literal.into())
}

pub fn equal(name: impl Into<String>, literal: impl Into<Literal>) -> Expression {
    predicate(Operation::Eq, name, literal.into())
}

pub fn not_equal(name: impl Into<String>, literal: impl Into<Literal>) -> Expression {
    predicate(Operation::NotEq, name, literal.into())
}

pub fn is_null(name: impl Into<String>) -> Expression {
    unary_predicate(Operation::IsNull, name)
}

pub fn not_null(name: impl Into<String>) -> Expression {
    unary_predicate(Operation::NotNull, name)
}

impl Expression {
    /// The expression satisfied exactly when this one is not.
    pub fn negate(&self) -> Expression {
        match self {
            Expression::AlwaysTrue => Expression::AlwaysFalse,
            Expression::AlwaysFalse => Expression::AlwaysTrue,
            Expression::And(l, r) => or(l.negate(), r.negate()),
            Expression::Or(l, r) => and(l.negate(), r.negate()),
            Expression::Not(e) => (**e).clone(),
            Expression::Unbound(p) => Expression::Unbound(UnboundPredicate {
                op: p.op.negate(),
                reference: p.reference.clone(),
                literal: p.literal.clone(),
            }),
            Expression::Bound(p) => Expression::Bound(BoundPredicate {
                op: p.op.negate(),
                reference: p.reference.clone(),
                literal: p.literal.clone(),
            }),
        }
    }

    /// Push every `Not` down to the leaves, flipping predicate operations.
    /// The result contains no `Not` nodes.
    pub fn rewrite_not(&self) -> Expression {
        match self {
            Expression::And(l, r) => and(l.rewrite_not(), r.rewrite_not()),
            Expression::Or(l, r) => or(l.rewrite_not(), r.rewrite_not()),
            Expression::Not(e) => e.negate().rewrite_not(),
            other => other.clone(),
        }
    }

    /// Bind every reference in the tree against `struct_type`.
    pub fn bind(&self, struct_type: &StructType) -> Result<Expression> {
        match self {
            Expression::AlwaysTrue | Expression::AlwaysFalse => Ok(self.clone()),
            Expression::And(l, r) => Ok(and(l.bind(struct_type)?, r.bind(struct_type)?)),
            Expression::Or(l, r) => Ok(or(l.bind(struct_type)?, r.bind(struct_type)?)),
            Expression::Not(e) => Ok(not(e.bind(struct_type)?)),
            Expression::Unbound(p) => p.bind(struct_type),
            Expression::Bound(_) => Err(Error::validation(
                "Found already bound predicate while binding",
            )),
        }
    }
}

impl UnboundPredicate {
    /// Resolve the column name and convert the literal to the field's type.
    ///
    /// `IsNull`/`NotNull` on a required field fold to constants. A literal
    /// conversion that is disallowed raises a validation error; a sentinel
    /// conversion folds the predicate to the constant it implies.
    pub fn bind(&self, struct_type: &StructType) -> Result<Expression> {
        let field = struct_type.field(&self.reference.name).ok_or_else(|| {
            Error::validation(format!(
                "Cannot find field '{}' in struct: {}",
                self.reference.name,
                Type::Struct(struct_type.clone())
            ))
        })?;

        let literal = match &self.literal {
            None => {
                return match self.op {
                    Operation::IsNull => {
                        if field.is_required() {
                            Ok(Expression::AlwaysFalse)
                        } else {
                            Ok(self.bound(field.id, field.field_type.clone(), None))
                        }
                    }
                    Operation::NotNull => {
                        if field.is_required() {
                            Ok(Expression::AlwaysTrue)
                        } else {
                            Ok(self.bound(field.id, field.field_type.clone(), None))
                        }
                    }
                    op => Err(Error::validation(format!(
                        "Operation {op} requires a literal"
                    ))),
                };
            }
            Some(literal) => literal,
        };

        if !self.op.requires_literal() {
            return Err(Error::validation(format!(
                "Operation {} does not take a literal",
                self.op
            )));
        }

        match literal.to(&field.field_type) {
            None => Err(Error::validation(format!(
                "Invalid value for conversion to type {}: {:?} ({})",
                field.field_type,
                literal,
                literal.kind()
            ))),
            Some(Converted::AboveMax) => Ok(match self.op {
                Operation::Lt | Operation::LtEq | Operation::NotEq => Expression::AlwaysTrue,
                Operation::Gt | Operation::GtEq | Operation::Eq => Expression::AlwaysFalse,
                _ => unreachable!("unary operation with literal"),
            }),
            Some(Converted::BelowMin) => Ok(match self.op {
                Operation::Gt | Operation::GtEq | Operation::NotEq => Expression::AlwaysTrue,
                Operation::Lt | Operation::LtEq | Operation::Eq => Expression::AlwaysFalse,
                _ => unreachable!("unary operation with literal"),
            }),
            Some(Converted::Value(converted)) => {
                Ok(self.bound(field.id, field.field_type.clone(), Some(converted)))
            }
        }
    }

    fn bound(&self, field_id: i32, field_type: Type, literal: Option<Literal>) -> Expression {
        Expression::Bound(BoundPredicate {
            op: self.op,
            reference: BoundReference {
                field_id,
                field_type,
            },
            literal,
        })
    }
}
