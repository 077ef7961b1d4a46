//! AST → parameterized SQL (§4.1). Every literal becomes a `$n` bind
//! parameter; every table reference gets a synthesized alias (`table_0`,
//! `table_1`, ...) so the same table can appear more than once in one query
//! (a self-join, or two distinct relationships to the same table) without
//! colliding.

use crate::error::CompileError;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt::Write as _;
use hashbrown::HashMap;
use zero_ast::{Ast, CompareOp, Condition, Correlation, CorrelatedOp, Operand, SortOrder, Start, Subquery};
use zero_core::Value;

/// A fully compiled, dialect-specific query: the SQL text plus its
/// positional bind parameters in `$1, $2, ...` order.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

struct Ctx {
    alias_counts: HashMap<String, usize>,
    params: Vec<Value>,
}

impl Ctx {
    fn new() -> Self {
        Self { alias_counts: HashMap::new(), params: Vec::new() }
    }

    fn alloc_alias(&mut self, table: &str) -> String {
        let n = self.alias_counts.entry(table.to_string()).or_insert(0);
        let alias = format!("{table}_{n}");
        *n += 1;
        alias
    }

    fn push_param(&mut self, value: Value) -> usize {
        self.params.push(value);
        self.params.len()
    }
}

#[derive(Default)]
pub struct Compiler;

impl Compiler {
    pub fn new() -> Self {
        Self
    }

    pub fn compile(&self, ast: &Ast) -> Result<CompiledQuery, CompileError> {
        let mut ctx = Ctx::new();
        let alias = ctx.alloc_alias(&ast.table);
        let sql = compile_select(ast, &alias, &mut ctx, Vec::new())?;
        Ok(CompiledQuery { sql, params: ctx.params })
    }
}

/// Compiles one `SELECT ... FROM "table" AS "alias" ...` statement.
/// `extra_where` carries predicates the caller already owns (a correlation
/// to a parent row, for a nested subquery) that must be ANDed in alongside
/// the AST's own `where_`.
fn compile_select(ast: &Ast, alias: &str, ctx: &mut Ctx, extra_where: Vec<String>) -> Result<String, CompileError> {
    let mut projection = format!("row_to_json(\"{alias}\") AS \"row\"");
    let mut where_parts = extra_where;
    let mut from_sql = format!("FROM \"{table}\" AS \"{alias}\"", table = ast.table);

    for sub in &ast.related {
        if sub.hidden {
            let (join_sql, hidden_where, hoisted) = compile_hidden_chain(sub, alias, ctx)?;
            write!(from_sql, " {join_sql}").unwrap();
            where_parts.extend(hidden_where);
            for (rendered, rel_alias) in hoisted {
                write!(projection, ", ({rendered}) AS \"{rel_alias}\"").unwrap();
            }
        } else {
            let rendered = compile_subquery(sub, alias, ctx)?;
            write!(projection, ", ({rendered}) AS \"{rel}\"", rel = sub.alias).unwrap();
        }
    }

    let mut sql = format!("SELECT {projection} {from_sql}");

    if let Some(cond) = &ast.where_ {
        where_parts.push(compile_condition(cond, alias, ctx)?);
    }
    if let Some(start) = &ast.start {
        where_parts.push(compile_start(ast, alias, start, ctx)?);
    }

    if !where_parts.is_empty() {
        let joined = where_parts.iter().map(|p| format!("({p})")).collect::<Vec<_>>().join(" AND ");
        write!(sql, " WHERE {joined}").unwrap();
    }

    if !ast.order_by.is_empty() {
        let order = ast
            .order_by
            .iter()
            .map(|(col, dir)| format!("\"{alias}\".\"{col}\" {}", sort_sql(*dir)))
            .collect::<Vec<_>>()
            .join(", ");
        write!(sql, " ORDER BY {order}").unwrap();
    }

    if let Some(limit) = ast.limit {
        write!(sql, " LIMIT {limit}").unwrap();
    }

    Ok(sql)
}

fn sort_sql(dir: SortOrder) -> &'static str {
    match dir {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    }
}

/// Keyset pagination: a row-wise tuple comparison against the ORDER BY
/// columns, in the direction of the first sort key (§4.1, §4 Start).
fn compile_start(ast: &Ast, alias: &str, start: &Start, ctx: &mut Ctx) -> Result<String, CompileError> {
    if ast.order_by.is_empty() {
        return Err(CompileError::EmptyOrderByForStart);
    }
    let op = match (ast.order_by[0].1, start.exclusive) {
        (SortOrder::Asc, true) => ">",
        (SortOrder::Asc, false) => ">=",
        (SortOrder::Desc, true) => "<",
        (SortOrder::Desc, false) => "<=",
    };
    let cols = start.row.iter().map(|(col, _)| format!("\"{alias}\".\"{col}\"")).collect::<Vec<_>>().join(", ");
    let placeholders = start
        .row
        .iter()
        .map(|(_, value)| {
            let n = ctx.push_param(value.clone());
            format!("${n}")
        })
        .collect::<Vec<_>>()
        .join(", ");
    Ok(format!("({cols}) {op} ({placeholders})"))
}

/// Compiles a `related[]` entry into a scalar SELECT expression for the
/// parent's projection. Only ever called for a non-hidden entry — a hidden
/// junction edge is flattened into the FROM clause by `compile_hidden_chain`
/// instead (§4.1, §3 "hidden" junction edges).
fn compile_subquery(sub: &Subquery, parent_alias: &str, ctx: &mut Ctx) -> Result<String, CompileError> {
    let child_alias = ctx.alloc_alias(&sub.ast.table);
    let correlation = correlation_condition(&sub.correlation, parent_alias, &child_alias);
    let body = compile_select(&sub.ast, &child_alias, ctx, alloc::vec![correlation])?;
    if sub.singular {
        Ok(format!("SELECT \"row\".\"row\" FROM ({body}) AS \"row\" LIMIT 1"))
    } else {
        Ok(format!("SELECT COALESCE(json_agg(\"row\".\"row\"), '[]'::json) FROM ({body}) AS \"row\""))
    }
}

fn correlation_condition(correlation: &Correlation, parent_alias: &str, child_alias: &str) -> String {
    correlation
        .parent_field
        .iter()
        .zip(correlation.child_field.iter())
        .map(|(p, c)| format!("\"{parent_alias}\".\"{p}\" = \"{child_alias}\".\"{c}\""))
        .collect::<Vec<_>>()
        .join(" AND ")
}

/// Flattens a `hidden` junction edge into an inner `JOIN` against
/// `parent_alias`, recursing through any further hidden hops, and hoists
/// every visible relationship reachable underneath it into the outer
/// SELECT's projection rather than burying it in a WHERE-clause `EXISTS`
/// (§4.1, §3: a many-to-many traversal's real target must still reach the
/// caller). Returns the join fragment to append to the FROM clause, any
/// WHERE terms the junction hop's own filter contributes, and the
/// `(rendered subquery, projected alias)` pairs to add to the projection.
fn compile_hidden_chain(
    sub: &Subquery,
    parent_alias: &str,
    ctx: &mut Ctx,
) -> Result<(String, Vec<String>, Vec<(String, String)>), CompileError> {
    let child_alias = ctx.alloc_alias(&sub.ast.table);
    let on_cond = correlation_condition(&sub.correlation, parent_alias, &child_alias);
    let mut join_sql = format!("JOIN \"{table}\" AS \"{child_alias}\" ON {on_cond}", table = sub.ast.table);

    let mut where_parts = Vec::new();
    if let Some(cond) = &sub.ast.where_ {
        where_parts.push(compile_condition(cond, &child_alias, ctx)?);
    }

    let mut hoisted = Vec::new();
    for nested in &sub.ast.related {
        if nested.hidden {
            let (nested_join, nested_where, nested_hoisted) = compile_hidden_chain(nested, &child_alias, ctx)?;
            write!(join_sql, " {nested_join}").unwrap();
            where_parts.extend(nested_where);
            hoisted.extend(nested_hoisted);
        } else {
            let rendered = compile_subquery(nested, &child_alias, ctx)?;
            hoisted.push((rendered, nested.alias.clone()));
        }
    }

    Ok((join_sql, where_parts, hoisted))
}

fn compile_condition(cond: &Condition, alias: &str, ctx: &mut Ctx) -> Result<String, CompileError> {
    match cond {
        Condition::Simple { left, op, right } => compile_simple(left, *op, right, alias, ctx),
        Condition::And(parts) => compile_bool_chain(parts, "AND", alias, ctx),
        Condition::Or(parts) => compile_bool_chain(parts, "OR", alias, ctx),
        Condition::CorrelatedSubquery { op, related } => compile_correlated_condition(*op, related, alias, ctx),
    }
}

/// Compiles a WHERE-clause `[NOT] EXISTS` term (§4.1). `EXISTS` passes the
/// parent/child correlation down as an additional WHERE term on the inner
/// SELECT; `NOT EXISTS` leaves the inner SELECT fully uncorrelated, which
/// is what makes it an anti-join over the whole child table rather than a
/// per-parent existence check negated after the fact.
fn compile_correlated_condition(op: CorrelatedOp, sub: &Subquery, parent_alias: &str, ctx: &mut Ctx) -> Result<String, CompileError> {
    let child_alias = ctx.alloc_alias(&sub.ast.table);
    match op {
        CorrelatedOp::Exists => {
            let correlation = correlation_condition(&sub.correlation, parent_alias, &child_alias);
            let body = compile_select(&sub.ast, &child_alias, ctx, alloc::vec![correlation])?;
            Ok(format!("EXISTS ({body})"))
        }
        CorrelatedOp::NotExists => {
            let body = compile_select(&sub.ast, &child_alias, ctx, Vec::new())?;
            Ok(format!("NOT EXISTS ({body})"))
        }
    }
}

fn compile_bool_chain(parts: &[Condition], joiner: &str, alias: &str, ctx: &mut Ctx) -> Result<String, CompileError> {
    let mut rendered = Vec::with_capacity(parts.len());
    for part in parts {
        rendered.push(format!("({})", compile_condition(part, alias, ctx)?));
    }
    Ok(rendered.join(&format!(" {joiner} ")))
}

fn compile_operand_column(operand: &Operand) -> Result<&str, CompileError> {
    match operand {
        Operand::Column(name) => Ok(name.as_str()),
        _ => Err(CompileError::UnsupportedOperand { context: "left-hand side must be a column".to_string() }),
    }
}

fn compile_simple(left: &Operand, op: CompareOp, right: &Operand, alias: &str, ctx: &mut Ctx) -> Result<String, CompileError> {
    let column = compile_operand_column(left)?;
    let lhs = format!("\"{alias}\".\"{column}\"");

    if matches!(op, CompareOp::Is | CompareOp::IsNot) {
        let keyword = if op == CompareOp::Is { "IS NOT DISTINCT FROM" } else { "IS DISTINCT FROM" };
        let rhs = compile_literal_operand(right, ctx)?;
        return Ok(format!("{lhs} {keyword} {rhs}"));
    }

    if matches!(op, CompareOp::In | CompareOp::NotIn) {
        let values = match right {
            Operand::Array(values) => values.clone(),
            _ => return Err(CompileError::UnsupportedOperand { context: "IN/NOT IN requires an array operand".to_string() }),
        };
        let placeholders = values
            .into_iter()
            .map(|v| {
                let n = ctx.push_param(v);
                format!("${n}")
            })
            .collect::<Vec<_>>()
            .join(", ");
        let keyword = if op == CompareOp::In { "= ANY" } else { "!= ALL" };
        return Ok(format!("{lhs} {keyword}(ARRAY[{placeholders}])"));
    }

    let sql_op = match op {
        CompareOp::Eq => "=",
        CompareOp::Ne => "<>",
        CompareOp::Lt => "<",
        CompareOp::Le => "<=",
        CompareOp::Gt => ">",
        CompareOp::Ge => ">=",
        CompareOp::Like => "LIKE",
        CompareOp::Ilike => "ILIKE",
        CompareOp::NotLike => "NOT LIKE",
        CompareOp::NotIlike => "NOT ILIKE",
        CompareOp::Is | CompareOp::IsNot | CompareOp::In | CompareOp::NotIn => unreachable!("handled above"),
    };
    let rhs = compile_literal_operand(right, ctx)?;
    Ok(format!("{lhs} {sql_op} {rhs}"))
}

fn compile_literal_operand(operand: &Operand, ctx: &mut Ctx) -> Result<String, CompileError> {
    match operand {
        Operand::Literal(value) => {
            let n = ctx.push_param(value.clone());
            Ok(format!("${n}"))
        }
        Operand::StaticParam(name) => Ok(format!(":{name}")),
        _ => Err(CompileError::UnsupportedOperand { context: "right-hand side must be a literal or static param".to_string() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use zero_ast::{AstBuilder, Correlation};

    fn simple_ast() -> Ast {
        AstBuilder::new("users")
            .where_(Condition::simple("age", CompareOp::Gt, Operand::Literal(Value::Int64(18))))
            .order_by("id", SortOrder::Asc)
            .limit(10)
            .build()
            .unwrap()
    }

    #[test]
    fn compiles_basic_select() {
        let ast = simple_ast();
        let compiled = Compiler::new().compile(&ast).unwrap();
        assert!(compiled.sql.contains("FROM \"users\" AS \"users_0\""));
        assert!(compiled.sql.contains("WHERE (\"users_0\".\"age\" > $1)"));
        assert!(compiled.sql.contains("ORDER BY \"users_0\".\"id\" ASC"));
        assert!(compiled.sql.contains("LIMIT 10"));
        assert_eq!(compiled.params, vec![Value::Int64(18)]);
    }

    #[test]
    fn is_distinct_from_for_is_operator() {
        let ast = AstBuilder::new("users")
            .where_(Condition::simple("deleted", CompareOp::Is, Operand::Literal(Value::Boolean(false))))
            .build()
            .unwrap();
        let compiled = Compiler::new().compile(&ast).unwrap();
        assert!(compiled.sql.contains("IS NOT DISTINCT FROM $1"));
    }

    #[test]
    fn in_condition_uses_any_array() {
        let ast = AstBuilder::new("users")
            .where_(Condition::simple("id", CompareOp::In, Operand::Array(vec![Value::Int64(1), Value::Int64(2)])))
            .build()
            .unwrap();
        let compiled = Compiler::new().compile(&ast).unwrap();
        assert!(compiled.sql.contains("= ANY(ARRAY[$1, $2])"));
    }

    #[test]
    fn start_without_order_by_errors() {
        let ast = Ast {
            table: "users".into(),
            where_: None,
            order_by: Vec::new(),
            limit: None,
            start: Some(Start { row: vec![("id".into(), Value::Int64(1))], exclusive: true }),
            related: Vec::new(),
        };
        let err = Compiler::new().compile(&ast).unwrap_err();
        assert_eq!(err, CompileError::EmptyOrderByForStart);
    }

    #[test]
    fn duplicate_table_gets_distinct_aliases() {
        let child = AstBuilder::new("users").build().unwrap();
        let corr = Correlation::new(vec!["manager_id".into()], vec!["id".into()]);
        let sub = Subquery::new(child, corr, "manager").unwrap();
        let ast = AstBuilder::new("users").related(sub).build().unwrap();
        let compiled = Compiler::new().compile(&ast).unwrap();
        assert!(compiled.sql.contains("\"users_0\""));
        assert!(compiled.sql.contains("\"users_1\""));
    }

    #[test]
    fn hidden_subquery_flattens_into_a_join_chain_and_hoists_its_target() {
        let grandchild = AstBuilder::new("user").build().unwrap();
        let member_corr = Correlation::new(vec!["user_id".into()], vec!["id".into()]);
        let member_sub = Subquery::new(grandchild, member_corr, "members").unwrap();

        let membership = AstBuilder::new("membership").related(member_sub).build().unwrap();
        let junction_corr = Correlation::new(vec!["id".into()], vec!["group_id".into()]);
        let hidden_sub = Subquery::new(membership, junction_corr, "membership").unwrap().hidden(true);

        let ast = AstBuilder::new("groups").related(hidden_sub).build().unwrap();
        let compiled = Compiler::new().compile(&ast).unwrap();

        assert!(compiled.sql.contains("JOIN \"membership\" AS \"membership_0\""));
        assert!(compiled.sql.contains("AS \"members\""));
        assert!(!compiled.sql.contains("EXISTS"));
    }

    #[test]
    fn doubly_hidden_subquery_extends_the_join_chain_and_still_hoists() {
        let leaf = AstBuilder::new("tag").build().unwrap();
        let tag_corr = Correlation::new(vec!["tag_id".into()], vec!["id".into()]);
        let tag_sub = Subquery::new(leaf, tag_corr, "tags").unwrap();

        let inner_junction = AstBuilder::new("post_tag").related(tag_sub).build().unwrap();
        let inner_corr = Correlation::new(vec!["id".into()], vec!["post_id".into()]);
        let inner_hidden = Subquery::new(inner_junction, inner_corr, "post_tag").unwrap().hidden(true);

        let middle = AstBuilder::new("post").related(inner_hidden).build().unwrap();
        let outer_corr = Correlation::new(vec!["id".into()], vec!["author_id".into()]);
        let outer_hidden = Subquery::new(middle, outer_corr, "post").unwrap().hidden(true);

        let ast = AstBuilder::new("authors").related(outer_hidden).build().unwrap();
        let compiled = Compiler::new().compile(&ast).unwrap();

        assert!(compiled.sql.contains("JOIN \"post\" AS \"post_0\""));
        assert!(compiled.sql.contains("JOIN \"post_tag\" AS \"post_tag_0\""));
        assert!(compiled.sql.contains("AS \"tags\""));
        assert!(!compiled.sql.contains("EXISTS"));
    }

    #[test]
    fn singular_subquery_limits_to_one_row() {
        let child = AstBuilder::new("profile").build().unwrap();
        let corr = Correlation::new(vec!["id".into()], vec!["user_id".into()]);
        let sub = Subquery::new(child, corr, "profile").unwrap().singular(true);
        let ast = AstBuilder::new("users").related(sub).build().unwrap();
        let compiled = Compiler::new().compile(&ast).unwrap();
        assert!(compiled.sql.contains("LIMIT 1) AS \"profile\""));
    }

    #[test]
    fn where_clause_exists_correlates_the_inner_select() {
        let child = AstBuilder::new("comment").build().unwrap();
        let corr = Correlation::new(vec!["id".into()], vec!["issue_id".into()]);
        let sub = Subquery::new(child, corr, "comments").unwrap();
        let ast = AstBuilder::new("issue").where_(Condition::exists(sub)).build().unwrap();
        let compiled = Compiler::new().compile(&ast).unwrap();
        assert!(compiled.sql.contains("EXISTS (SELECT"));
        assert!(compiled.sql.contains("\"issue_0\".\"id\" = \"comment_0\".\"issue_id\""));
    }

    #[test]
    fn where_clause_not_exists_leaves_the_inner_select_uncorrelated() {
        let child = AstBuilder::new("comment").build().unwrap();
        let corr = Correlation::new(vec!["id".into()], vec!["issue_id".into()]);
        let sub = Subquery::new(child, corr, "comments").unwrap();
        let ast = AstBuilder::new("issue").where_(Condition::not_exists(sub)).build().unwrap();
        let compiled = Compiler::new().compile(&ast).unwrap();
        assert!(compiled.sql.contains("NOT EXISTS (SELECT"));
        assert!(!compiled.sql.contains("\"issue_0\".\"id\" = \"comment_0\".\"issue_id\""));
    }
}
