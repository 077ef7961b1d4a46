//! `Condition`: the WHERE-clause sum type (§3).

use crate::ast::Subquery;
use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use zero_core::Value;

/// The comparison operators a `Simple` condition may carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
    Ilike,
    NotLike,
    NotIlike,
    In,
    NotIn,
    Is,
    IsNot,
}

impl CompareOp {
    /// Whether this operator's right-hand side must be an array (§3: `IN`/`NOT IN`).
    pub fn wants_array(&self) -> bool {
        matches!(self, CompareOp::In | CompareOp::NotIn)
    }

    /// Whether this operator's right-hand side must be NULL/TRUE/FALSE (§3: `IS`/`IS NOT`).
    pub fn wants_boolean_literal(&self) -> bool {
        matches!(self, CompareOp::Is | CompareOp::IsNot)
    }
}

/// `EXISTS`/`NOT EXISTS` for correlated sub-select conditions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CorrelatedOp {
    Exists,
    NotExists,
}

/// One side of a `Simple` condition.
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    Column(String),
    Literal(Value),
    Array(Vec<Value>),
    /// A parameter whose value is supplied at compile time (e.g. the
    /// current user id). Left unbound, compiling fails with
    /// `CompileError::UnboundStaticParameter` (§4.1).
    StaticParam(String),
}

/// The WHERE-clause sum type: `Simple`/`And`/`Or`/`CorrelatedSubquery` (§3).
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    Simple { left: Operand, op: CompareOp, right: Operand },
    And(Vec<Condition>),
    Or(Vec<Condition>),
    CorrelatedSubquery { op: CorrelatedOp, related: Box<Subquery> },
}

impl Condition {
    pub fn simple(left: impl Into<String>, op: CompareOp, right: Operand) -> Self {
        Condition::Simple { left: Operand::Column(left.into()), op, right }
    }

    pub fn and(conditions: Vec<Condition>) -> Self {
        Condition::And(conditions)
    }

    pub fn or(conditions: Vec<Condition>) -> Self {
        Condition::Or(conditions)
    }

    pub fn exists(related: Subquery) -> Self {
        Condition::CorrelatedSubquery { op: CorrelatedOp::Exists, related: Box::new(related) }
    }

    pub fn not_exists(related: Subquery) -> Self {
        Condition::CorrelatedSubquery { op: CorrelatedOp::NotExists, related: Box::new(related) }
    }

    /// Walks every leaf `Simple` condition with a callback — used by the
    /// planner to collect `baseConstraints`/`baseLimit` inputs and by the
    /// compiler for a single recursive-descent lowering pass.
    pub fn for_each_simple<'a, F: FnMut(&'a String, CompareOp, &'a Operand)>(&'a self, f: &mut F) {
        match self {
            Condition::Simple { left, op, right } => {
                if let Operand::Column(col) = left {
                    f(col, *op, right);
                }
            }
            Condition::And(cs) | Condition::Or(cs) => {
                for c in cs {
                    c.for_each_simple(f);
                }
            }
            Condition::CorrelatedSubquery { .. } => {}
        }
    }
}
