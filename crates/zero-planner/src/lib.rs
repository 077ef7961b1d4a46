//! Zero Planner - the cost-based planner graph (§4.2): an arena of
//! `Connection`/`Join` nodes built from a `zero_ast::Ast`, with join-flip
//! selection and branch-pattern cost caching driven by `zero_stats`'s
//! HyperLogLog fanout estimates.

#![no_std]

extern crate alloc;

mod graph;
mod planner;

pub use graph::{Connection, Constraint, Join, JoinKind, NodeId, Plan, PlanNode};
pub use planner::Planner;
