//! `Engine`: the table-schema registry and cost model, tied together into
//! the three operations a query goes through (§6):
//!
//! - `build` lowers an `Ast` into an unwarmed `MaterializedQuery`.
//! - `materialize` builds and then preloads it from a `TableProvider`,
//!   returning a live, subscribable query.
//! - `run` materializes, snapshots, and tears down — a one-shot read.

use crate::build::{build_node, collect_preload_order};
use crate::error::EngineError;
use crate::provider::TableProvider;
use crate::query::MaterializedQuery;
use std::collections::HashMap;
use zero_ast::Ast;
use zero_core::schema::Table;
use zero_ivm::{Item, View};
use zero_planner::Planner;
use zero_stats::StatsManager;

#[derive(Default)]
pub struct Engine {
    schemas: HashMap<String, Table>,
    stats: StatsManager,
}

impl Engine {
    pub fn new() -> Self {
        Self { schemas: HashMap::new(), stats: StatsManager::new() }
    }

    pub fn register_table(&mut self, table: Table) {
        self.schemas.insert(table.name().to_string(), table);
    }

    pub fn schema(&self, table: &str) -> Option<&Table> {
        self.schemas.get(table)
    }

    pub fn stats(&self) -> &StatsManager {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut StatsManager {
        &mut self.stats
    }

    /// Runs the planner once and extracts everything `build_node` needs
    /// from its decisions: per-relationship flip orientation, and, per
    /// relationship, whether the flip invalidated that branch's own LIMIT
    /// (`Plan::unlimit`, §4.2), plus the same for the query's own root.
    fn plan_decisions(&self, ast: &Ast) -> (HashMap<String, bool>, HashMap<String, bool>, bool) {
        let mut planner = Planner::new(&self.stats);
        let plan = planner.plan(ast);
        let flips: HashMap<String, bool> =
            plan.joins().map(|(_, join)| (join.relationship.clone(), join.flipped)).collect();
        let unlimited: HashMap<String, bool> = plan
            .joins()
            .map(|(_, join)| {
                let still_limited = plan.connection(join.child).map(|c| c.limit.is_some()).unwrap_or(true);
                (join.relationship.clone(), !still_limited)
            })
            .collect();
        let root_unlimited = plan.connection(plan.root).map(|c| c.limit.is_none()).unwrap_or(false);
        (flips, unlimited, root_unlimited)
    }

    /// Lowers `ast` into a `Node`/`View` pair with no rows in it yet.
    pub fn build(&self, ast: &Ast) -> Result<MaterializedQuery, EngineError> {
        let (flips, unlimited, root_unlimited) = self.plan_decisions(ast);
        let node = build_node(ast, &self.schemas, &flips, &unlimited, root_unlimited)?;
        let mut preload_order = Vec::new();
        collect_preload_order(ast, &flips, &mut preload_order);
        Ok(MaterializedQuery { node, view: View::new(false), preload_order })
    }

    /// Builds and warms a live query from `provider`'s current rows.
    pub fn materialize(&self, ast: &Ast, provider: &dyn TableProvider) -> Result<MaterializedQuery, EngineError> {
        let mut query = self.build(ast)?;
        query.preload(provider);
        Ok(query)
    }

    /// A one-shot read: materializes, snapshots, and tears down rather than
    /// leaving a live subscription behind.
    pub fn run(&self, ast: &Ast, provider: &dyn TableProvider) -> Result<Vec<Item>, EngineError> {
        let mut query = self.materialize(ast, provider)?;
        let rows = query.snapshot().to_vec();
        query.teardown();
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zero_ast::{AstBuilder, CompareOp, Condition, Correlation, Operand, SortOrder, Subquery};
    use zero_core::schema::Column;
    use zero_core::{DataType, Row, Value};

    struct FakeProvider {
        rows: HashMap<String, Vec<Row>>,
    }

    impl TableProvider for FakeProvider {
        fn scan(&self, table: &str) -> Vec<Row> {
            self.rows.get(table).cloned().unwrap_or_default()
        }
    }

    fn issue_schema() -> Table {
        Table::new(
            "issue",
            vec![Column::new("id", DataType::Int64), Column::new("closed", DataType::Boolean)],
            &["id"],
        )
        .unwrap()
    }

    fn comment_schema() -> Table {
        Table::new(
            "comment",
            vec![Column::new("id", DataType::Int64), Column::new("issue_id", DataType::Int64)],
            &["id"],
        )
        .unwrap()
    }

    #[test]
    fn run_filters_and_returns_matching_rows() {
        let mut engine = Engine::new();
        engine.register_table(issue_schema());

        let cond = Condition::simple("closed", CompareOp::Eq, Operand::Literal(Value::Boolean(false)));
        let ast = AstBuilder::new("issue").where_(cond).build().unwrap();

        let provider = FakeProvider {
            rows: HashMap::from([(
                "issue".to_string(),
                vec![
                    Row::new(1, vec![Value::Int64(1), Value::Boolean(false)]),
                    Row::new(2, vec![Value::Int64(2), Value::Boolean(true)]),
                ],
            )]),
        };

        let rows = engine.run(&ast, &provider).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].row.get(0), Some(&Value::Int64(1)));
    }

    #[test]
    fn materialize_assembles_related_rows_and_tracks_live_changes() {
        let mut engine = Engine::new();
        engine.register_table(issue_schema());
        engine.register_table(comment_schema());

        let child = AstBuilder::new("comment").build().unwrap();
        let corr = Correlation::new(vec!["id".into()], vec!["issue_id".into()]);
        let sub = Subquery::new(child, corr, "comments").unwrap();
        let ast = AstBuilder::new("issue").related(sub).build().unwrap();

        let provider = FakeProvider {
            rows: HashMap::from([
                ("issue".to_string(), vec![Row::new(1, vec![Value::Int64(1), Value::Boolean(false)])]),
                ("comment".to_string(), vec![Row::new(10, vec![Value::Int64(10), Value::Int64(1)])]),
            ]),
        };

        let mut query = engine.materialize(&ast, &provider).unwrap();
        assert_eq!(query.snapshot().len(), 1);
        assert_eq!(query.snapshot()[0].children("comments").len(), 1);

        query.push("comment", zero_ivm::Change::Add(Row::new(11, vec![Value::Int64(11), Value::Int64(1)])));
        query.commit();
        assert_eq!(query.snapshot()[0].children("comments").len(), 2);
    }

    #[test]
    fn limit_orders_by_order_by_and_respects_n() {
        let mut engine = Engine::new();
        engine.register_table(issue_schema());

        let ast = AstBuilder::new("issue").order_by("id", SortOrder::Desc).limit(1).build().unwrap();

        let provider = FakeProvider {
            rows: HashMap::from([(
                "issue".to_string(),
                vec![
                    Row::new(1, vec![Value::Int64(1), Value::Boolean(false)]),
                    Row::new(2, vec![Value::Int64(2), Value::Boolean(false)]),
                ],
            )]),
        };

        let rows = engine.run(&ast, &provider).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].row.get(0), Some(&Value::Int64(2)));
    }

    #[test]
    fn flip_invalidated_limit_is_not_enforced() {
        let mut engine = Engine::new();
        engine.register_table(issue_schema());
        engine.register_table(comment_schema());

        // Many issues, few comments per issue: the join flips to drive from
        // `comment`, which invalidates the root's own LIMIT 1 (it was
        // counting on iterating `issue` in order, not `comment`).
        for i in 0..1000i64 {
            engine.stats_mut().on_add("issue", &[("id", &Value::Int64(i))]);
        }
        for i in 0..5i64 {
            engine.stats_mut().on_add("comment", &[("id", &Value::Int64(i))]);
        }

        let child = AstBuilder::new("comment").build().unwrap();
        let corr = Correlation::new(vec!["id".into()], vec!["issue_id".into()]);
        let sub = Subquery::new(child, corr, "comments").unwrap();
        let ast = AstBuilder::new("issue").order_by("id", SortOrder::Desc).limit(1).related(sub).build().unwrap();

        let provider = FakeProvider {
            rows: HashMap::from([
                (
                    "issue".to_string(),
                    vec![
                        Row::new(1, vec![Value::Int64(1), Value::Boolean(false)]),
                        Row::new(2, vec![Value::Int64(2), Value::Boolean(false)]),
                    ],
                ),
                ("comment".to_string(), Vec::new()),
            ]),
        };

        let rows = engine.run(&ast, &provider).unwrap();
        // Without the fix this would be truncated to 1 row by a LIMIT the
        // planner had already invalidated.
        assert_eq!(rows.len(), 2);
    }

    fn membership_schema() -> Table {
        Table::new(
            "membership",
            vec![Column::new("id", DataType::Int64), Column::new("group_id", DataType::Int64), Column::new("user_id", DataType::Int64)],
            &["id"],
        )
        .unwrap()
    }

    fn group_schema() -> Table {
        Table::new("group", vec![Column::new("id", DataType::Int64)], &["id"]).unwrap()
    }

    fn user_schema() -> Table {
        Table::new("user", vec![Column::new("id", DataType::Int64), Column::new("name", DataType::String)], &["id"]).unwrap()
    }

    #[test]
    fn hidden_junction_is_flattened_and_its_target_reaches_the_snapshot() {
        let mut engine = Engine::new();
        engine.register_table(group_schema());
        engine.register_table(membership_schema());
        engine.register_table(user_schema());

        let member_sub = Subquery::new(
            AstBuilder::new("user").build().unwrap(),
            Correlation::new(vec!["user_id".into()], vec!["id".into()]),
            "members",
        )
        .unwrap();
        let membership_ast = AstBuilder::new("membership").related(member_sub).build().unwrap();
        let hidden_sub = Subquery::new(membership_ast, Correlation::new(vec!["id".into()], vec!["group_id".into()]), "membership")
            .unwrap()
            .hidden(true);
        let ast = AstBuilder::new("group").related(hidden_sub).build().unwrap();

        let provider = FakeProvider {
            rows: HashMap::from([
                ("group".to_string(), vec![Row::new(1, vec![Value::Int64(1)])]),
                ("membership".to_string(), vec![Row::new(10, vec![Value::Int64(10), Value::Int64(1), Value::Int64(100)])]),
                ("user".to_string(), vec![Row::new(100, vec![Value::Int64(100), Value::String("alice".into())])]),
            ]),
        };

        let rows = engine.run(&ast, &provider).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].children("members").len(), 1);
        assert!(!rows[0].related.contains_key("membership"));
        assert!(!rows[0].related.keys().any(|k| k.starts_with("__junction")));
    }

    #[test]
    fn where_exists_keeps_only_parents_with_a_matching_child_and_strips_the_internal_join() {
        let mut engine = Engine::new();
        engine.register_table(issue_schema());
        engine.register_table(comment_schema());

        let related = Subquery::new(
            AstBuilder::new("comment").build().unwrap(),
            Correlation::new(vec!["id".into()], vec!["issue_id".into()]),
            "comments",
        )
        .unwrap();
        let ast = AstBuilder::new("issue").where_(Condition::exists(related)).build().unwrap();

        let provider = FakeProvider {
            rows: HashMap::from([
                (
                    "issue".to_string(),
                    vec![
                        Row::new(1, vec![Value::Int64(1), Value::Boolean(false)]),
                        Row::new(2, vec![Value::Int64(2), Value::Boolean(false)]),
                    ],
                ),
                ("comment".to_string(), vec![Row::new(10, vec![Value::Int64(10), Value::Int64(1)])]),
            ]),
        };

        let rows = engine.run(&ast, &provider).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].row.get(0), Some(&Value::Int64(1)));
        assert!(rows[0].related.is_empty());
    }

    #[test]
    fn where_not_exists_keeps_only_parents_with_no_matching_child() {
        let mut engine = Engine::new();
        engine.register_table(issue_schema());
        engine.register_table(comment_schema());

        let related = Subquery::new(
            AstBuilder::new("comment").build().unwrap(),
            Correlation::new(vec!["id".into()], vec!["issue_id".into()]),
            "comments",
        )
        .unwrap();
        let ast = AstBuilder::new("issue").where_(Condition::not_exists(related)).build().unwrap();

        let provider = FakeProvider {
            rows: HashMap::from([
                (
                    "issue".to_string(),
                    vec![
                        Row::new(1, vec![Value::Int64(1), Value::Boolean(false)]),
                        Row::new(2, vec![Value::Int64(2), Value::Boolean(false)]),
                    ],
                ),
                ("comment".to_string(), vec![Row::new(10, vec![Value::Int64(10), Value::Int64(1)])]),
            ]),
        };

        let rows = engine.run(&ast, &provider).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].row.get(0), Some(&Value::Int64(2)));
    }

    #[test]
    fn unknown_table_errors() {
        let engine = Engine::new();
        let ast = AstBuilder::new("ghost").build().unwrap();
        let provider = FakeProvider { rows: HashMap::new() };
        let err = engine.run(&ast, &provider).unwrap_err();
        assert!(matches!(err, EngineError::TableNotFound(_)));
    }
}
