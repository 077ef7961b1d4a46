//! The planner graph (§4.2): an arena-indexed tree of `Connection` (a table
//! scan with its base constraints) and `Join` nodes. Arena-indexing avoids
//! `Rc<RefCell<_>>` or lifetime-bound references between nodes — the same
//! tradeoff the teacher's dataflow graph (`cynos-incremental::dataflow`)
//! makes with its `NodeId`/`TableId` newtypes.

use alloc::string::String;
use alloc::vec::Vec;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// A constraint propagated onto a connection during the pin walk: `column`
/// is held equal to some already-pinned connection's column by `source_join`
/// (§4.2 "accumulated constraints, keyed by branch pattern × source join id").
#[derive(Clone, Debug, PartialEq)]
pub struct Constraint {
    pub column: String,
    pub source_join: NodeId,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Connection {
    pub table: String,
    /// Columns referenced by this connection's own base (non-correlated)
    /// WHERE clause, collected via `Condition::for_each_simple` (§4.2
    /// "baseConstraints"). Immutable once built.
    pub base_constraints: Vec<String>,
    /// Constraints emitted onto this connection by joins walked from an
    /// already-pinned neighbor (§4.2 "mutable during search"). Empty until
    /// the pin walk reaches it.
    pub propagated: Vec<Constraint>,
    pub limit: Option<u32>,
    /// Whether this connection has been chosen as an outer loop yet.
    pub pinned: bool,
}

impl Connection {
    /// Every column currently known to constrain this connection: its own
    /// base predicates plus whatever the pin walk has propagated so far.
    /// Used as the cache key and cost-estimate input for `branch_cost`.
    pub fn constraint_columns(&self) -> Vec<String> {
        let mut cols = self.base_constraints.clone();
        cols.extend(self.propagated.iter().map(|c| c.column.clone()));
        cols
    }
}

/// Distinguishes an ordinary `related[]` edge from one synthesized out of a
/// WHERE-clause `CorrelatedSubquery` (§3, §4.1). The latter only ever wants
/// existence, not the full row set, which is why its flip decision uses
/// `semi_join_selectivity` instead of a plain row-count comparison (§4.2
/// "Semi-join selectivity").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinKind {
    Relationship,
    CorrelatedExists,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Join {
    pub parent: NodeId,
    pub child: NodeId,
    pub relationship: String,
    pub parent_key_column: String,
    pub child_key_column: String,
    pub flippable: bool,
    pub flipped: bool,
    pub kind: JoinKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PlanNode {
    Connection(Connection),
    Join(Join),
}

/// The arena and its root. `root` is always a `Connection` (the query's own
/// table); `Join` nodes hang off it annotating each `related[]` edge (and
/// any WHERE-clause correlated subquery).
pub struct Plan {
    pub(crate) arena: Vec<PlanNode>,
    pub root: NodeId,
}

impl Plan {
    pub fn node(&self, id: NodeId) -> &PlanNode {
        &self.arena[id.0]
    }

    pub fn connection(&self, id: NodeId) -> Option<&Connection> {
        match self.node(id) {
            PlanNode::Connection(c) => Some(c),
            PlanNode::Join(_) => None,
        }
    }

    pub fn connection_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.arena.iter().enumerate().filter_map(|(i, n)| match n {
            PlanNode::Connection(_) => Some(NodeId(i)),
            PlanNode::Join(_) => None,
        })
    }

    pub fn joins(&self) -> impl Iterator<Item = (NodeId, &Join)> {
        self.arena.iter().enumerate().filter_map(|(i, n)| match n {
            PlanNode::Join(j) => Some((NodeId(i), j)),
            PlanNode::Connection(_) => None,
        })
    }

    pub fn joins_mut(&mut self) -> impl Iterator<Item = &mut Join> {
        self.arena.iter_mut().filter_map(|n| match n {
            PlanNode::Join(j) => Some(j),
            PlanNode::Connection(_) => None,
        })
    }

    pub(crate) fn connection_mut(&mut self, id: NodeId) -> Option<&mut Connection> {
        match &mut self.arena[id.0] {
            PlanNode::Connection(c) => Some(c),
            PlanNode::Join(_) => None,
        }
    }

    /// Removes the bound on a connection, e.g. after a join flip makes the
    /// previously-driving side no longer the one iterated first (§4.2, §9).
    pub fn unlimit(&mut self, id: NodeId) {
        if let Some(conn) = self.connection_mut(id) {
            conn.limit = None;
        }
    }
}
