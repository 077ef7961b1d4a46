//! Builds a `Plan` from a `zero_ast::Ast` and chooses join orderings from
//! `zero_stats::StatsManager`'s cost estimates by iteratively pinning the
//! cheapest unpinned connection and propagating constraints outward through
//! its joins (§4.2, §9).

use crate::graph::{Connection, Constraint, Join, JoinKind, NodeId, Plan, PlanNode};
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use hashbrown::HashMap;
use zero_ast::{Ast, Condition, Subquery};
use zero_stats::StatsManager;

pub struct Planner<'a> {
    stats: &'a StatsManager,
    /// Caches the estimated row count for a `(table, sorted constraint
    /// columns)` signature so two branches with the same shape (a common
    /// case for repeated relationships, e.g. every `album.tracks` edge in
    /// a catalog query) don't re-derive the same cost twice (§4.2 "branch
    /// pattern cost caching"). A connection's key changes as soon as the
    /// pin walk propagates a new constraint onto it, which is what drives
    /// cache invalidation here: the old entry is simply never looked up
    /// again.
    branch_cost_cache: HashMap<String, f64>,
}

impl<'a> Planner<'a> {
    pub fn new(stats: &'a StatsManager) -> Self {
        Self { stats, branch_cost_cache: HashMap::new() }
    }

    pub fn plan(&mut self, ast: &Ast) -> Plan {
        let mut arena = Vec::new();
        let root = self.build(ast, &mut arena);
        let mut plan = Plan { arena, root };
        self.pin_and_reorder(&mut plan);
        self.select_exists_flips(&mut plan);
        plan
    }

    fn build(&mut self, ast: &Ast, arena: &mut Vec<PlanNode>) -> NodeId {
        let mut base_constraints = Vec::new();
        if let Some(cond) = &ast.where_ {
            cond.for_each_simple(&mut |col, _op, _right| {
                base_constraints.push(col.clone());
            });
        }
        let conn_id = NodeId(arena.len());
        arena.push(PlanNode::Connection(Connection {
            table: ast.table.clone(),
            base_constraints,
            propagated: Vec::new(),
            limit: ast.limit,
            pinned: false,
        }));

        for sub in &ast.related {
            self.build_join(sub, conn_id, arena, JoinKind::Relationship);
        }

        let mut correlated = Vec::new();
        if let Some(cond) = &ast.where_ {
            collect_correlated(cond, &mut correlated);
        }
        for sub in &correlated {
            self.build_join(sub, conn_id, arena, JoinKind::CorrelatedExists);
        }

        conn_id
    }

    fn build_join(&mut self, sub: &Subquery, parent_id: NodeId, arena: &mut Vec<PlanNode>, kind: JoinKind) -> NodeId {
        let child_id = self.build(&sub.ast, arena);
        let parent_key_column = sub.correlation.parent_field.first().cloned().unwrap_or_default();
        let child_key_column = sub.correlation.child_field.first().cloned().unwrap_or_default();
        // A child with its own LIMIT must be evaluated in its natural
        // per-parent order; flipping the driver would change which rows
        // rank first, so such an edge is never a flip candidate. A junction
        // hop imposes its own ordering the same way (§4.2 step 1).
        let flippable = match kind {
            JoinKind::Relationship => sub.ast.limit.is_none() && !sub.hidden,
            JoinKind::CorrelatedExists => !sub.hidden,
        };
        arena.push(PlanNode::Join(Join {
            parent: parent_id,
            child: child_id,
            relationship: sub.alias.clone(),
            parent_key_column,
            child_key_column,
            flippable,
            flipped: false,
            kind,
        }));
        child_id
    }

    /// `1 - (1 - filterSelectivity)^fanOut` (§4.2 "Semi-join selectivity"):
    /// the probability that at least one of a parent's (average `fanOut`
    /// many) children passes `table`'s own base filters, estimated from
    /// `filterSelectivity = rowsWithFilters / rowsWithoutFilters`. Used for
    /// EXISTS-style children (`baseLimit=1`) so a highly selective filter on
    /// a high-fanout child doesn't get costed as if every child row survived.
    pub fn semi_join_selectivity(&mut self, table: &str, column: &str, constraint_columns: &[String]) -> f64 {
        let rows_without_filters = self.stats.row_count(table).max(1) as f64;
        let rows_with_filters = self.branch_cost(table, constraint_columns).min(rows_without_filters);
        let filter_selectivity = rows_with_filters / rows_without_filters;
        let fan_out = self.stats.fanout(table, column);
        1.0 - (1.0 - filter_selectivity).powf(fan_out)
    }

    fn branch_cost(&mut self, table: &str, constraint_columns: &[String]) -> f64 {
        let mut sorted = constraint_columns.to_vec();
        sorted.sort();
        let key = format!("{table}:{}", sorted.join(","));
        if let Some(&cost) = self.branch_cost_cache.get(&key) {
            return cost;
        }
        let mut cost = self.stats.row_count(table) as f64;
        for column in constraint_columns {
            let (cardinality, _) = self.stats.cardinality(table, column);
            cost = (cost / cardinality.max(1) as f64).max(1.0);
        }
        self.branch_cost_cache.insert(key, cost);
        cost
    }

    /// Step 3-4 of §4.2: repeatedly pin the cheapest unpinned connection,
    /// walk outward through its joins propagating a constraint onto each
    /// still-unpinned neighbor, and flip any flippable `Relationship` join
    /// whose now-driving side changed. Terminates once every connection is
    /// pinned (the graph is acyclic and finite, so this is always O(nodes)
    /// outer iterations times O(edges) propagation work per iteration).
    fn pin_and_reorder(&mut self, plan: &mut Plan) {
        loop {
            let unpinned: Vec<NodeId> = plan.connection_ids().filter(|&id| !plan.connection(id).unwrap().pinned).collect();
            if unpinned.is_empty() {
                break;
            }

            let mut pin_id = unpinned[0];
            let mut best_cost = f64::INFINITY;
            for id in unpinned {
                let conn = plan.connection(id).unwrap();
                let cost = self.branch_cost(&conn.table, &conn.constraint_columns());
                if cost < best_cost {
                    best_cost = cost;
                    pin_id = id;
                }
            }

            plan.connection_mut(pin_id).unwrap().pinned = true;
            self.propagate_from_pin(plan, pin_id);
        }
    }

    fn propagate_from_pin(&mut self, plan: &mut Plan, pin_id: NodeId) {
        let incident: Vec<NodeId> =
            plan.joins().filter(|(_, j)| j.kind == JoinKind::Relationship && (j.parent == pin_id || j.child == pin_id)).map(|(id, _)| id).collect();

        for join_id in incident {
            let (parent, child, parent_col, child_col, flippable, was_flipped) = match plan.node(join_id) {
                PlanNode::Join(j) => (j.parent, j.child, j.parent_key_column.clone(), j.child_key_column.clone(), j.flippable, j.flipped),
                PlanNode::Connection(_) => continue,
            };
            let (other_side, other_col) = if parent == pin_id { (child, child_col) } else { (parent, parent_col) };

            let other_pinned = plan.connection(other_side).map(|c| c.pinned).unwrap_or(true);
            if !other_pinned {
                if let Some(conn) = plan.connection_mut(other_side) {
                    conn.propagated.push(Constraint { column: other_col, source_join: join_id });
                }
            }

            // `pin_id` was selected as the globally cheapest unpinned
            // connection, so if it sits on this join's child side, driving
            // from the child is strictly no more expensive than the
            // parent-drives default — flip to match (§4.2 step 3).
            if flippable && !other_pinned {
                let should_flip = pin_id == child;
                if should_flip != was_flipped {
                    if let PlanNode::Join(j) = &mut plan.arena[join_id.0] {
                        j.flipped = should_flip;
                    }
                    self.propagate_unlimit_from_flipped_join(plan, parent, child);
                }
            }
        }
    }

    /// A join flipped into (or out of) its non-default orientation means
    /// whichever side relied on an outer LIMIT for its per-parent fan-out
    /// bound loses that guarantee: the LIMIT was counting on the old
    /// driver's iteration order. Neither side of the changed edge should
    /// still claim that cost shortcut, so both connections' limits are
    /// lifted.
    fn propagate_unlimit_from_flipped_join(&self, plan: &mut Plan, parent_id: NodeId, child_id: NodeId) {
        plan.unlimit(parent_id);
        plan.unlimit(child_id);
    }

    /// Separate from the generalized pin walk: a `CorrelatedExists` join
    /// only ever wants to know "does at least one child match", so its flip
    /// decision uses `semi_join_selectivity` against the parent's own
    /// branch cost instead of a plain row-count comparison (§4.2 "Semi-join
    /// selectivity").
    fn select_exists_flips(&mut self, plan: &mut Plan) {
        let candidates: Vec<NodeId> = plan.joins().filter(|(_, j)| j.kind == JoinKind::CorrelatedExists).map(|(id, _)| id).collect();
        for id in candidates {
            let (parent, child, child_key, flippable) = match plan.node(id) {
                PlanNode::Join(j) => (j.parent, j.child, j.child_key_column.clone(), j.flippable),
                PlanNode::Connection(_) => continue,
            };
            if !flippable {
                continue;
            }
            let (parent_table, parent_constraints) = {
                let c = plan.connection(parent).expect("exists join parent is a connection");
                (c.table.clone(), c.constraint_columns())
            };
            let child_table = plan.connection(child).expect("exists join child is a connection").table.clone();
            let child_constraints = plan.connection(child).unwrap().constraint_columns();

            let parent_cost = self.branch_cost(&parent_table, &parent_constraints);
            let selectivity = self.semi_join_selectivity(&child_table, &child_key, &child_constraints);
            let child_cost = self.stats.row_count(&child_table) as f64 * selectivity;

            if child_cost < parent_cost {
                if let PlanNode::Join(j) = &mut plan.arena[id.0] {
                    j.flipped = true;
                }
                self.propagate_unlimit_from_flipped_join(plan, parent, child);
            }
        }
    }
}

fn collect_correlated(cond: &Condition, out: &mut Vec<Subquery>) {
    match cond {
        Condition::Simple { .. } => {}
        Condition::And(cs) | Condition::Or(cs) => {
            for c in cs {
                collect_correlated(c, out);
            }
        }
        Condition::CorrelatedSubquery { related, .. } => out.push((**related).clone()),
    }
}
