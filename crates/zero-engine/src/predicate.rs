//! Compiles a `zero_ast::Condition` into a closure over `zero_ivm::Item`,
//! so a `Filter` node can evaluate WHERE clauses without re-parsing the AST
//! on every row (§4, §7).
//!
//! `build::build_where` extracts top-level `And`-conjunct
//! `CorrelatedSubquery` terms before this module ever sees them, lowering
//! each to an internal join plus an existence check (§3, §4.1). A
//! `CorrelatedSubquery` reaching `compile_predicate` means it was nested
//! under an `Or` or a non-top-level position, which a flat predicate
//! closure has no join to evaluate against.

use crate::error::EngineError;
use zero_ast::{CompareOp, Condition, Operand};
use zero_core::schema::Table;
use zero_core::{pattern_match, Value};
use zero_ivm::Item;

pub(crate) fn compile_predicate(
    cond: &Condition,
    schema: &Table,
) -> Result<Box<dyn Fn(&Item) -> bool>, EngineError> {
    match cond {
        Condition::Simple { left, op, right } => {
            let name = match left {
                Operand::Column(name) => name.clone(),
                _ => return Err(EngineError::Unsupported("condition's left-hand side must be a column")),
            };
            let idx = schema.get_column_index(&name).ok_or_else(|| EngineError::ColumnNotFound {
                table: schema.name().to_string(),
                column: name.clone(),
            })?;
            let op = *op;
            let right = right.clone();
            Ok(Box::new(move |item: &Item| eval_simple(item.row.get(idx), op, &right)))
        }
        Condition::And(parts) => {
            let compiled = parts
                .iter()
                .map(|c| compile_predicate(c, schema))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Box::new(move |item: &Item| compiled.iter().all(|p| p(item))))
        }
        Condition::Or(parts) => {
            let compiled = parts
                .iter()
                .map(|c| compile_predicate(c, schema))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Box::new(move |item: &Item| compiled.iter().any(|p| p(item))))
        }
        Condition::CorrelatedSubquery { .. } => Err(EngineError::Unsupported(
            "correlated EXISTS/NOT EXISTS conditions require join-based evaluation, not a flat predicate",
        )),
    }
}

fn eval_simple(value: Option<&Value>, op: CompareOp, right: &Operand) -> bool {
    let null = Value::Null;
    let value = value.unwrap_or(&null);
    match right {
        Operand::Literal(rhs) => eval_compare(value, op, rhs),
        Operand::Array(values) => match op {
            CompareOp::In => values.iter().any(|v| value == v),
            CompareOp::NotIn => !values.iter().any(|v| value == v),
            _ => false,
        },
        // Column-to-column and unbound-static-param comparisons aren't
        // reachable through the compiler's own AST construction; treat
        // them as never-matching rather than panicking.
        Operand::Column(_) | Operand::StaticParam(_) => false,
    }
}

fn eval_compare(value: &Value, op: CompareOp, rhs: &Value) -> bool {
    match op {
        CompareOp::Eq => value == rhs,
        CompareOp::Ne => value != rhs,
        CompareOp::Lt => value < rhs,
        CompareOp::Le => value <= rhs,
        CompareOp::Gt => value > rhs,
        CompareOp::Ge => value >= rhs,
        // `Value`'s own `PartialEq` treats `Null == Null` as true, which is
        // exactly `IS [NOT] DISTINCT FROM`'s null-safe equality (§3).
        CompareOp::Is => value == rhs,
        CompareOp::IsNot => value != rhs,
        CompareOp::Like => like_str(value, rhs, pattern_match::like),
        CompareOp::Ilike => like_str(value, rhs, pattern_match::ilike),
        CompareOp::NotLike => !like_str(value, rhs, pattern_match::like),
        CompareOp::NotIlike => !like_str(value, rhs, pattern_match::ilike),
        CompareOp::In | CompareOp::NotIn => false,
    }
}

fn like_str(value: &Value, pattern: &Value, f: fn(&str, &str) -> bool) -> bool {
    match (value.as_str(), pattern.as_str()) {
        (Some(v), Some(p)) => f(v, p),
        _ => false,
    }
}
