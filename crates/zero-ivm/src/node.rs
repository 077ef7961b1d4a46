//! `Node`: the tagged-variant operator tree a query compiles down to
//! (§9 Design Notes: dynamic dispatch avoided for hot-path tree shapes in
//! favor of a closed enum). A `Node`'s leaves are `Source`s named by table;
//! `push` walks the tree once per incoming row-level change, routing it to
//! the (single) leaf whose table matches and folding the resulting `Item`
//! changes back up through every ancestor combinator.

use crate::change::Change;
use crate::filter::Filter;
use crate::item::Item;
use crate::join::Join;
use crate::limit::Limit;
use crate::project::Project;
use crate::source::Source;
use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use hashbrown::HashSet;
use zero_core::Row;

pub enum Node {
    Source(Source),
    Filter(Box<Node>, Filter),
    Limit(Box<Node>, Limit),
    Join(Box<Node>, Box<Node>, Join),
    /// Reshapes the `Item`s above some subtree without filtering or
    /// reordering them — hoisting a hidden junction's nested relationship up
    /// a level, or stripping an internal correlated-subquery join before it
    /// reaches a subscriber (§3, §4.1).
    Project(Box<Node>, Project),
}

impl Node {
    /// Every table name reachable from this node's leaves.
    pub fn tables(&self) -> HashSet<String> {
        match self {
            Node::Source(source) => {
                let mut set = HashSet::new();
                set.insert(String::from(source.table()));
                set
            }
            Node::Filter(input, _) | Node::Limit(input, _) | Node::Project(input, _) => input.tables(),
            Node::Join(left, right, _) => {
                let mut set = left.tables();
                set.extend(right.tables());
                set
            }
        }
    }

    /// Routes `change` to the `table` leaf and folds the result upward.
    /// Returns an empty `Vec` if `table` isn't reachable from this node,
    /// which is the common case for every sibling branch of a join that
    /// wasn't the one that changed.
    pub fn push(&mut self, table: &str, change: Change<Row>) -> Vec<Change<Item>> {
        match self {
            Node::Source(source) => {
                if source.table_name_matches(table) {
                    source.push(change)
                } else {
                    Vec::new()
                }
            }
            Node::Filter(input, filter) => {
                let changes = input.push(table, change);
                filter.apply(changes)
            }
            Node::Limit(input, limit) => {
                let changes = input.push(table, change);
                limit.apply(changes)
            }
            Node::Project(input, project) => {
                let changes = input.push(table, change);
                project.apply(changes)
            }
            Node::Join(left, right, join) => {
                if left.tables().contains(table) {
                    let changes = left.push(table, change);
                    join.push_parent(changes)
                } else if right.tables().contains(table) {
                    let changes = right.push(table, change);
                    join.push_child(changes)
                } else {
                    Vec::new()
                }
            }
        }
    }

    pub fn teardown(&mut self) {
        match self {
            Node::Source(_) => {}
            Node::Filter(input, _) | Node::Limit(input, _) | Node::Project(input, _) => input.teardown(),
            Node::Join(left, right, join) => {
                left.teardown();
                right.teardown();
                join.teardown();
            }
        }
    }
}
