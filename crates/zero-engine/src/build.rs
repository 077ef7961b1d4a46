//! Lowers a `zero_ast::Ast` into a `zero_ivm::Node` tree: one `Source` per
//! table, a `Filter` above it when the ast carries a WHERE clause, a `Join`
//! per `related[]` edge, and a `Limit` on top when the ast carries one
//! (§4, §6). Join flip orientation is decided ahead of time by
//! `zero_planner::Planner` and threaded in by relationship alias.
//!
//! Two shapes never surface to a subscriber as ordinary joined data and are
//! always erased by a `Project` before the tree widens further:
//!
//! - A `hidden` `related[]` entry (§3 junction edge): its own nested
//!   `related[]` is hoisted up to this level under the grandchild's alias,
//!   and the junction rows themselves are discarded.
//! - A WHERE-clause `CorrelatedSubquery` (§3, §4.1 `[NOT] EXISTS`): the
//!   internal join exists only so a `Filter` can test non-emptiness; its
//!   relationship key is stripped once that test has run.

use crate::error::EngineError;
use crate::predicate::compile_predicate;
use core::cmp::Ordering;
use std::collections::HashMap;
use zero_ast::{Ast, Condition, CorrelatedOp, SortOrder, Subquery};
use zero_core::schema::Table;
use zero_ivm::{Filter, Item, Join, Limit, Node, Project, Source};

pub(crate) fn build_node(
    ast: &Ast,
    schemas: &HashMap<String, Table>,
    flips: &HashMap<String, bool>,
    unlimited: &HashMap<String, bool>,
    this_unlimited: bool,
) -> Result<Node, EngineError> {
    let schema = schemas.get(&ast.table).ok_or_else(|| EngineError::TableNotFound(ast.table.clone()))?;

    let mut node = Node::Source(Source::new(ast.table.clone()));

    if let Some(cond) = &ast.where_ {
        node = build_where(node, cond, schema, schemas, flips, unlimited)?;
    }

    for sub in &ast.related {
        let child_schema = schemas
            .get(&sub.ast.table)
            .ok_or_else(|| EngineError::TableNotFound(sub.ast.table.clone()))?;
        let parent_cols = resolve_columns(schema, &sub.correlation.parent_field)?;
        let child_cols = resolve_columns(child_schema, &sub.correlation.child_field)?;
        let child_unlimited = unlimited.get(&sub.alias).copied().unwrap_or(false);
        let child_node = build_node(&sub.ast, schemas, flips, unlimited, child_unlimited)?;

        if sub.hidden {
            let synthetic_alias = format!("__junction_{}", sub.alias);
            let join = Join::new(synthetic_alias.clone(), parent_cols, child_cols, false, false);
            node = Node::Join(Box::new(node), Box::new(child_node), join);

            let visible = visible_aliases(&sub.ast);
            node = Node::Project(
                Box::new(node),
                Project::new(move |mut item: Item| {
                    let junctions = item.related.remove(&synthetic_alias).unwrap_or_default();
                    for alias in &visible {
                        let hoisted: Vec<Item> =
                            junctions.iter().flat_map(|j| j.children(alias).iter().cloned()).collect();
                        item.related.entry(alias.clone()).or_default().extend(hoisted);
                    }
                    item
                }),
            );
        } else {
            let flippable = sub.ast.limit.is_none();
            let mut join = Join::new(sub.alias.clone(), parent_cols, child_cols, sub.singular, flippable);
            if flippable && flips.get(&sub.alias).copied().unwrap_or(false) {
                join.flip();
            }
            node = Node::Join(Box::new(node), Box::new(child_node), join);
        }
    }

    // A flip that invalidated this connection's driver-order assumption
    // (`Plan::unlimit`, §4.2) means the LIMIT can no longer be enforced by
    // truncating this branch's own iteration order.
    if let Some(n) = ast.limit {
        if !this_unlimited {
            let compare = compile_order(&ast.order_by, schema)?;
            node = Node::Limit(Box::new(node), Limit::new(n as usize, compare));
        }
    }

    Ok(node)
}

/// Every relationship alias visible at `ast`'s own level once its hidden
/// junction edges (if any) are flattened away — a hidden edge contributes
/// its own nested non-hidden aliases in its place, recursively (§3).
fn visible_aliases(ast: &Ast) -> Vec<String> {
    let mut out = Vec::new();
    for sub in &ast.related {
        if sub.hidden {
            out.extend(visible_aliases(&sub.ast));
        } else {
            out.push(sub.alias.clone());
        }
    }
    out
}

/// Lowers a WHERE clause into a `Filter` (and, when it carries correlated
/// `[NOT] EXISTS` terms, the internal `Join`s and stripping `Project` those
/// terms need — §3, §4.1). At most the top-level `And` conjuncts are split
/// between "residual" (plain boolean predicate, handed to
/// `compile_predicate`) and "correlated" (built as joins, tested for
/// emptiness); a bare top-level `CorrelatedSubquery` is the degenerate case
/// with no residual at all.
fn build_where(
    mut node: Node,
    cond: &Condition,
    schema: &Table,
    schemas: &HashMap<String, Table>,
    flips: &HashMap<String, bool>,
    unlimited: &HashMap<String, bool>,
) -> Result<Node, EngineError> {
    let (residual, correlated) = split_correlated(cond);
    if correlated.is_empty() {
        let predicate = compile_predicate(cond, schema)?;
        return Ok(Node::Filter(Box::new(node), Filter::new(predicate)));
    }

    let mut synthetic: Vec<(String, CorrelatedOp)> = Vec::with_capacity(correlated.len());
    for (op, sub) in &correlated {
        let child_schema =
            schemas.get(&sub.ast.table).ok_or_else(|| EngineError::TableNotFound(sub.ast.table.clone()))?;
        let parent_cols = resolve_columns(schema, &sub.correlation.parent_field)?;
        let child_cols = resolve_columns(child_schema, &sub.correlation.child_field)?;
        let child_unlimited = unlimited.get(&sub.alias).copied().unwrap_or(false);
        let child_node = build_node(&sub.ast, schemas, flips, unlimited, child_unlimited)?;

        let synthetic_alias = format!("__exists_{}", sub.alias);
        let mut join = Join::new(synthetic_alias.clone(), parent_cols, child_cols, false, true);
        if flips.get(&sub.alias).copied().unwrap_or(false) {
            join.flip();
        }
        node = Node::Join(Box::new(node), Box::new(child_node), join);
        synthetic.push((synthetic_alias, *op));
    }

    let residual_predicate = match &residual {
        Some(cond) => Some(compile_predicate(cond, schema)?),
        None => None,
    };
    let existence_checks = synthetic.clone();
    node = Node::Filter(
        Box::new(node),
        Filter::new(move |item: &Item| {
            if let Some(predicate) = &residual_predicate {
                if !predicate(item) {
                    return false;
                }
            }
            existence_checks.iter().all(|(alias, op)| {
                let exists = !item.children(alias).is_empty();
                match op {
                    CorrelatedOp::Exists => exists,
                    CorrelatedOp::NotExists => !exists,
                }
            })
        }),
    );

    let strip: Vec<String> = synthetic.into_iter().map(|(alias, _)| alias).collect();
    node = Node::Project(
        Box::new(node),
        Project::new(move |mut item: Item| {
            for alias in &strip {
                item.related.remove(alias);
            }
            item
        }),
    );
    Ok(node)
}

/// Splits a WHERE condition's top-level `And` conjuncts into the plain
/// boolean residual and the correlated `[NOT] EXISTS` terms. A bare
/// `CorrelatedSubquery` at the top has no residual; anything else passes
/// through untouched with no correlated terms.
fn split_correlated(cond: &Condition) -> (Option<Condition>, Vec<(CorrelatedOp, Subquery)>) {
    match cond {
        Condition::CorrelatedSubquery { op, related } => (None, vec![(*op, (**related).clone())]),
        Condition::And(parts) => {
            let mut residual = Vec::new();
            let mut correlated = Vec::new();
            for part in parts {
                match part {
                    Condition::CorrelatedSubquery { op, related } => correlated.push((*op, (**related).clone())),
                    other => residual.push(other.clone()),
                }
            }
            let residual = match residual.len() {
                0 => None,
                1 => residual.into_iter().next(),
                _ => Some(Condition::And(residual)),
            };
            (residual, correlated)
        }
        other => (Some(other.clone()), Vec::new()),
    }
}

fn resolve_columns(schema: &Table, names: &[String]) -> Result<Vec<usize>, EngineError> {
    names
        .iter()
        .map(|name| {
            schema
                .get_column_index(name)
                .ok_or_else(|| EngineError::ColumnNotFound { table: schema.name().to_string(), column: name.clone() })
        })
        .collect()
}

fn compile_order(
    order_by: &[(String, SortOrder)],
    schema: &Table,
) -> Result<Box<dyn Fn(&Item, &Item) -> Ordering>, EngineError> {
    let mut keys = Vec::with_capacity(order_by.len());
    for (col, order) in order_by {
        let idx = schema
            .get_column_index(col)
            .ok_or_else(|| EngineError::ColumnNotFound { table: schema.name().to_string(), column: col.clone() })?;
        keys.push((idx, *order));
    }
    Ok(Box::new(move |a: &Item, b: &Item| {
        for (idx, order) in &keys {
            let cmp = a.row.get(*idx).cmp(&b.row.get(*idx));
            let cmp = match order {
                SortOrder::Asc => cmp,
                SortOrder::Desc => cmp.reverse(),
            };
            if cmp != Ordering::Equal {
                return cmp;
            }
        }
        a.row.id().cmp(&b.row.id())
    }))
}

/// Recommended preload iteration order for warming a freshly built `Node`:
/// a flipped relationship is driven by its (cheaper) child side, so that
/// side is preloaded first (§4.2, §6). This only affects how quickly the
/// tree converges during preload, never its final correctness — `Join`'s
/// `push_parent`/`push_child` behave identically regardless of flip state.
pub(crate) fn collect_preload_order(ast: &Ast, flips: &HashMap<String, bool>, out: &mut Vec<String>) {
    for sub in &ast.related {
        if flips.get(&sub.alias).copied().unwrap_or(false) {
            collect_preload_order(&sub.ast, flips, out);
        }
    }
    out.push(ast.table.clone());
    for sub in &ast.related {
        if !flips.get(&sub.alias).copied().unwrap_or(false) {
            collect_preload_order(&sub.ast, flips, out);
        }
    }
}
