//! `Ast`: the table-rooted query tree (§3).

use crate::condition::{Condition, Operand};
use crate::error::AstError;
use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use hashbrown::HashSet;
use zero_core::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Zipped parent/child field correlation for a `related[]` entry (§3).
#[derive(Clone, Debug, PartialEq)]
pub struct Correlation {
    pub parent_field: Vec<String>,
    pub child_field: Vec<String>,
}

impl Correlation {
    pub fn new(parent_field: Vec<String>, child_field: Vec<String>) -> Self {
        Self { parent_field, child_field }
    }

    fn validate(&self, alias: &str) -> Result<(), AstError> {
        if self.parent_field.is_empty() || self.parent_field.len() != self.child_field.len() {
            return Err(AstError::InvalidCorrelation { alias: alias.to_string() });
        }
        Ok(())
    }
}

/// A cursor for keyset pagination: a partial row (the columns named by
/// `orderBy`) plus whether the cursor row itself is excluded.
#[derive(Clone, Debug, PartialEq)]
pub struct Start {
    pub row: Vec<(String, Value)>,
    pub exclusive: bool,
}

/// A correlated related sub-select, nested under a parent `Ast`.
#[derive(Clone, Debug, PartialEq)]
pub struct Subquery {
    pub ast: Box<Ast>,
    pub correlation: Correlation,
    pub alias: String,
    /// Denotes a junction edge (many-to-many traversal) rather than a
    /// user-visible relationship (§3).
    pub hidden: bool,
    /// Many-to-one / one-to-one: the compiler emits `row_to_json` with an
    /// implicit `LIMIT 1` instead of `array_agg` (§4.1).
    pub singular: bool,
}

impl Subquery {
    pub fn new(ast: Ast, correlation: Correlation, alias: impl Into<String>) -> Result<Self, AstError> {
        let alias = alias.into();
        correlation.validate(&alias)?;
        Ok(Self { ast: Box::new(ast), correlation, alias, hidden: false, singular: false })
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn singular(mut self, singular: bool) -> Self {
        self.singular = singular;
        self
    }
}

/// The query tree (§3): a table, an optional filter, ordering, limit,
/// pagination cursor, and nested `related[]` sub-selects.
#[derive(Clone, Debug, PartialEq)]
pub struct Ast {
    pub table: String,
    pub where_: Option<Condition>,
    pub order_by: Vec<(String, SortOrder)>,
    pub limit: Option<u32>,
    pub start: Option<Start>,
    pub related: Vec<Subquery>,
}

impl Ast {
    /// Validates the structural invariants of §3 that don't require schema
    /// access (correlation shape, alias uniqueness, `IS`/`IN` operand
    /// shape). Column-existence checks against a live table schema are a
    /// separate step (`zero_compiler`/`zero_engine` call into
    /// `zero_schema_map` for that), since this crate has no notion of a
    /// live catalog.
    pub fn validate(&self) -> Result<(), AstError> {
        let mut seen = HashSet::new();
        for sub in &self.related {
            if !seen.insert(sub.alias.clone()) {
                return Err(AstError::DuplicateAlias { alias: sub.alias.clone() });
            }
            sub.correlation.validate(&sub.alias)?;
            sub.ast.validate()?;
        }
        if let Some(cond) = &self.where_ {
            validate_condition(cond)?;
        }
        Ok(())
    }
}

fn validate_condition(cond: &Condition) -> Result<(), AstError> {
    match cond {
        Condition::Simple { op, right, .. } => {
            if op.wants_array() && !matches!(right, Operand::Array(_)) {
                return Err(AstError::InvalidInOperand);
            }
            if op.wants_boolean_literal() {
                match right {
                    Operand::Literal(v) if v.is_boolean_literal() => {}
                    _ => return Err(AstError::InvalidIsOperand),
                }
            }
            Ok(())
        }
        Condition::And(cs) | Condition::Or(cs) => {
            for c in cs {
                validate_condition(c)?;
            }
            Ok(())
        }
        Condition::CorrelatedSubquery { related, .. } => related.ast.validate(),
    }
}

/// Ergonomic builder, in the spirit of the teacher's `TableBuilder`: each
/// step can fail fast rather than deferring invariant violations to a
/// later `validate()` call site.
#[derive(Clone, Debug, Default)]
pub struct AstBuilder {
    table: String,
    where_: Option<Condition>,
    order_by: Vec<(String, SortOrder)>,
    limit: Option<u32>,
    start: Option<Start>,
    related: Vec<Subquery>,
}

impl AstBuilder {
    pub fn new(table: impl Into<String>) -> Self {
        Self { table: table.into(), ..Default::default() }
    }

    pub fn where_(mut self, cond: Condition) -> Self {
        self.where_ = Some(cond);
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, order: SortOrder) -> Self {
        self.order_by.push((column.into(), order));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn start(mut self, start: Start) -> Self {
        self.start = Some(start);
        self
    }

    pub fn related(mut self, sub: Subquery) -> Self {
        self.related.push(sub);
        self
    }

    pub fn build(self) -> Result<Ast, AstError> {
        let ast = Ast {
            table: self.table,
            where_: self.where_,
            order_by: self.order_by,
            limit: self.limit,
            start: self.start,
            related: self.related,
        };
        ast.validate()?;
        Ok(ast)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::CompareOp;

    fn child_ast() -> Ast {
        AstBuilder::new("album").build().unwrap()
    }

    #[test]
    fn correlation_length_mismatch_rejected() {
        let corr = Correlation::new(alloc::vec!["id".into()], alloc::vec!["album_id".into(), "x".into()]);
        let err = Subquery::new(child_ast(), corr, "albums").unwrap_err();
        assert!(matches!(err, AstError::InvalidCorrelation { .. }));
    }

    #[test]
    fn duplicate_alias_rejected() {
        let corr = Correlation::new(alloc::vec!["id".into()], alloc::vec!["artist_id".into()]);
        let sub1 = Subquery::new(child_ast(), corr.clone(), "albums").unwrap();
        let sub2 = Subquery::new(child_ast(), corr, "albums").unwrap();
        let err = AstBuilder::new("artist").related(sub1).related(sub2).build().unwrap_err();
        assert!(matches!(err, AstError::DuplicateAlias { .. }));
    }

    #[test]
    fn is_condition_requires_boolean_literal() {
        let cond = Condition::simple("closed", CompareOp::Is, Operand::Literal(Value::Int32(1)));
        let err = AstBuilder::new("issue").where_(cond).build().unwrap_err();
        assert!(matches!(err, AstError::InvalidIsOperand));
    }

    #[test]
    fn in_condition_requires_array() {
        let cond = Condition::simple("status", CompareOp::In, Operand::Literal(Value::String("open".into())));
        let err = AstBuilder::new("issue").where_(cond).build().unwrap_err();
        assert!(matches!(err, AstError::InvalidInOperand));
    }

    #[test]
    fn valid_ast_builds() {
        let cond = Condition::simple(
            "closed",
            CompareOp::Is,
            Operand::Literal(Value::Null),
        );
        let ast = AstBuilder::new("issue").where_(cond).order_by("id", SortOrder::Asc).limit(10).build().unwrap();
        assert_eq!(ast.table, "issue");
        assert_eq!(ast.limit, Some(10));
    }
}
