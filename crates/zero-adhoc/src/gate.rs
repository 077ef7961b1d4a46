//! The adhoc-query entrypoint (§6): accepts a raw `{name, ast}` payload,
//! rejects anything but the reserved name, validates the tree, and
//! forwards it to the engine. Distinct from a named, pre-registered query
//! (not modeled in this pass) precisely because it skips that
//! registration step — the gate's whole job is making sure nothing slips
//! through that path by accident.

use zero_ast::Ast;
use zero_engine::{Engine, TableProvider};
use zero_ivm::Item;

use crate::error::AdhocError;

/// The only name an adhoc request is allowed to carry.
pub const RESERVED_ADHOC_NAME: &str = "_zero_adhoc";

/// A raw adhoc-query payload as it arrives at the entrypoint, before any
/// validation.
pub struct AdhocRequest {
    pub name: String,
    pub ast: Ast,
}

impl AdhocRequest {
    pub fn new(name: impl Into<String>, ast: Ast) -> Self {
        Self { name: name.into(), ast }
    }
}

fn validate(request: &AdhocRequest) -> Result<(), AdhocError> {
    if request.name != RESERVED_ADHOC_NAME {
        return Err(AdhocError::ReservedNameViolation {
            expected: RESERVED_ADHOC_NAME,
            actual: request.name.clone(),
        });
    }
    request.ast.validate().map_err(AdhocError::Invalid)
}

/// Validates and runs one adhoc request to completion, in the spirit of
/// `Engine::run`: materialize, snapshot, teardown.
pub fn run_adhoc(
    engine: &Engine,
    request: AdhocRequest,
    provider: &dyn TableProvider,
) -> Result<Vec<Item>, AdhocError> {
    validate(&request)?;
    Ok(engine.run(&request.ast, provider)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use zero_ast::AstBuilder;
    use zero_core::schema::{Column, Table};
    use zero_core::{DataType, Row, Value};

    struct FakeProvider {
        rows: HashMap<String, Vec<Row>>,
    }

    impl TableProvider for FakeProvider {
        fn scan(&self, table: &str) -> Vec<Row> {
            self.rows.get(table).cloned().unwrap_or_default()
        }
    }

    fn engine_with_issue() -> Engine {
        let mut engine = Engine::new();
        engine.register_table(
            Table::new("issue", vec![Column::new("id", DataType::Int64)], &["id"]).unwrap(),
        );
        engine
    }

    #[test]
    fn rejects_any_name_other_than_reserved() {
        let engine = engine_with_issue();
        let ast = AstBuilder::new("issue").build().unwrap();
        let request = AdhocRequest::new("my_named_query", ast);
        let provider = FakeProvider { rows: HashMap::new() };

        let err = run_adhoc(&engine, request, &provider).unwrap_err();
        assert!(matches!(err, AdhocError::ReservedNameViolation { .. }));
    }

    #[test]
    fn accepts_the_reserved_name_and_forwards_to_the_engine() {
        let engine = engine_with_issue();
        let ast = AstBuilder::new("issue").build().unwrap();
        let request = AdhocRequest::new(RESERVED_ADHOC_NAME, ast);
        let provider = FakeProvider {
            rows: HashMap::from([(
                "issue".to_string(),
                vec![Row::new(1, vec![Value::Int64(1)])],
            )]),
        };

        let rows = run_adhoc(&engine, request, &provider).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn invalid_ast_is_rejected_before_reaching_the_engine() {
        use zero_ast::{Correlation, Subquery};

        let engine = engine_with_issue();
        let child = AstBuilder::new("comment").build().unwrap();
        let corr = Correlation::new(vec!["id".into()], vec!["issue_id".into()]);
        let dup_a = Subquery::new(child.clone(), corr.clone(), "same").unwrap();
        let dup_b = Subquery::new(child, corr, "same").unwrap();
        // Built by hand rather than through `AstBuilder::build`, which
        // would already reject the duplicate alias itself — this exercises
        // the gate's own validation of an already-constructed tree.
        let mut ast = AstBuilder::new("issue").build().unwrap();
        ast.related = vec![dup_a, dup_b];
        let request = AdhocRequest::new(RESERVED_ADHOC_NAME, ast);
        let provider = FakeProvider { rows: HashMap::new() };

        let err = run_adhoc(&engine, request, &provider).unwrap_err();
        assert!(matches!(err, AdhocError::Invalid(_)));
    }
}
