//! `Join`: composes a parent row with its related child rows under a named
//! relationship (§4.4, §3 `Correlation`). Both sides are fully materialized
//! (keyed by the join columns) so a change on either side can find its
//! counterpart without re-scanning a source. `flip()` only changes which
//! side the planner treats as the driver for initial load ordering (§4.2,
//! §9) — push/emit semantics are identical either way, which is why a
//! single `Join` type serves both orientations.

use crate::change::Change;
use crate::item::Item;
use alloc::string::String;
use alloc::vec::Vec;
use hashbrown::HashMap;
use zero_core::{RowId, Value};

type JoinKey = Vec<Value>;

struct Side {
    key_cols: Vec<usize>,
    by_key: HashMap<JoinKey, HashMap<RowId, Item>>,
}

impl Side {
    fn new(key_cols: Vec<usize>) -> Self {
        Self { key_cols, by_key: HashMap::new() }
    }

    fn key_of(&self, item: &Item) -> JoinKey {
        self.key_cols.iter().map(|&i| item.row.get(i).cloned().unwrap_or(Value::Null)).collect()
    }

    fn rows_for(&self, key: &JoinKey) -> Vec<Item> {
        self.by_key.get(key).map(|m| m.values().cloned().collect()).unwrap_or_default()
    }

    fn insert(&mut self, key: JoinKey, item: Item) {
        self.by_key.entry(key).or_default().insert(item.row.id(), item);
    }

    fn remove(&mut self, key: &JoinKey, id: RowId) {
        if let Some(bucket) = self.by_key.get_mut(key) {
            bucket.remove(&id);
        }
    }
}

pub struct Join {
    relationship: String,
    singular: bool,
    flippable: bool,
    flipped: bool,
    parent: Side,
    child: Side,
}

impl Join {
    pub fn new(relationship: impl Into<String>, parent_key_cols: Vec<usize>, child_key_cols: Vec<usize>, singular: bool, flippable: bool) -> Self {
        Self {
            relationship: relationship.into(),
            singular,
            flippable,
            flipped: false,
            parent: Side::new(parent_key_cols),
            child: Side::new(child_key_cols),
        }
    }

    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    /// Flips which side is treated as the query's driver. Does not touch
    /// materialized state or emitted output (§4.2: flipping is a planner
    /// cost decision, not a semantic one).
    pub fn flip(&mut self) {
        if self.flippable {
            self.flipped = !self.flipped;
        }
    }

    fn assemble(&self, parent_item: &Item) -> Item {
        let key = self.parent.key_of(parent_item);
        let mut children = self.child.rows_for(&key);
        if self.singular {
            children.truncate(1);
        }
        parent_item.clone().with_related(self.relationship.clone(), children)
    }

    pub fn push_parent(&mut self, changes: Vec<Change<Item>>) -> Vec<Change<Item>> {
        let mut out = Vec::new();
        for change in changes {
            match change {
                Change::Add(item) => {
                    let key = self.parent.key_of(&item);
                    let assembled = self.assemble(&item);
                    self.parent.insert(key, item);
                    out.push(Change::Add(assembled));
                }
                Change::Remove(item) => {
                    let key = self.parent.key_of(&item);
                    self.parent.remove(&key, item.row.id());
                    let assembled = self.assemble(&item);
                    out.push(Change::Remove(assembled));
                }
                Change::Edit { old, new } => {
                    let old_key = self.parent.key_of(&old);
                    let new_key = self.parent.key_of(&new);
                    self.parent.remove(&old_key, old.row.id());
                    let new_assembled = self.assemble(&new);
                    self.parent.insert(new_key.clone(), new.clone());
                    if old_key == new_key {
                        let old_assembled = self.assemble(&old);
                        out.push(Change::Edit { old: old_assembled, new: new_assembled });
                    } else {
                        let old_assembled = old.with_related(self.relationship.clone(), self.child.rows_for(&old_key));
                        out.push(Change::Remove(old_assembled));
                        out.push(Change::Add(new_assembled));
                    }
                }
            }
        }
        out
    }

    /// A child-side change never changes the *set* of parent rows, only
    /// which parents' `related` lists are stale, so every affected parent is
    /// re-emitted as an `Edit` with its children re-diffed (§4.4).
    pub fn push_child(&mut self, changes: Vec<Change<Item>>) -> Vec<Change<Item>> {
        let mut out = Vec::new();
        for change in changes {
            let key = match &change {
                Change::Add(item) | Change::Remove(item) => self.child.key_of(item),
                Change::Edit { old, .. } => self.child.key_of(old),
            };
            let affected_parents = self.parent.rows_for(&key);
            let before: Vec<Item> = affected_parents.iter().map(|p| self.assemble(p)).collect();

            match change {
                Change::Add(item) => self.child.insert(key.clone(), item),
                Change::Remove(item) => self.child.remove(&key, item.row.id()),
                Change::Edit { old, new } => {
                    self.child.remove(&key, old.row.id());
                    self.child.insert(key.clone(), new);
                }
            }

            for (parent, before_item) in affected_parents.iter().zip(before.iter()) {
                let after_item = self.assemble(parent);
                if after_item != *before_item {
                    out.push(Change::Edit { old: before_item.clone(), new: after_item });
                }
            }
        }
        out
    }

    pub fn teardown(&mut self) {
        self.parent.by_key.clear();
        self.child.by_key.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use zero_core::Row;

    fn parent_row(id: RowId, key: i64) -> Item {
        Item::leaf(Row::new(id, vec![Value::Int64(key)]))
    }

    fn child_row(id: RowId, parent_key: i64) -> Item {
        Item::leaf(Row::new(id, vec![Value::Int64(parent_key), Value::Int64(id as i64)]))
    }

    #[test]
    fn parent_add_assembles_existing_children() {
        let mut join = Join::new("comments", vec![0], vec![0], false, true);
        join.push_child(vec![Change::Add(child_row(100, 1))]);
        let out = join.push_parent(vec![Change::Add(parent_row(1, 1))]);
        assert_eq!(out.len(), 1);
        match &out[0] {
            Change::Add(item) => assert_eq!(item.children("comments").len(), 1),
            _ => panic!("expected Add"),
        }
    }

    #[test]
    fn child_add_emits_edit_for_matching_parent() {
        let mut join = Join::new("comments", vec![0], vec![0], false, true);
        join.push_parent(vec![Change::Add(parent_row(1, 1))]);
        let out = join.push_child(vec![Change::Add(child_row(100, 1))]);
        assert_eq!(out.len(), 1);
        match &out[0] {
            Change::Edit { old, new } => {
                assert_eq!(old.children("comments").len(), 0);
                assert_eq!(new.children("comments").len(), 1);
            }
            _ => panic!("expected Edit"),
        }
    }

    #[test]
    fn child_add_with_no_matching_parent_emits_nothing() {
        let mut join = Join::new("comments", vec![0], vec![0], false, true);
        let out = join.push_child(vec![Change::Add(child_row(100, 99))]);
        assert!(out.is_empty());
    }

    #[test]
    fn parent_edit_changing_key_is_remove_then_add() {
        let mut join = Join::new("comments", vec![0], vec![0], false, true);
        join.push_child(vec![Change::Add(child_row(100, 1))]);
        join.push_parent(vec![Change::Add(parent_row(1, 1))]);
        let out = join.push_parent(vec![Change::Edit { old: parent_row(1, 1), new: parent_row(1, 2) }]);
        assert_eq!(out.len(), 2);
        assert!(matches!(out[0], Change::Remove(_)));
        assert!(matches!(out[1], Change::Add(_)));
    }

    #[test]
    fn flip_toggles_when_flippable() {
        let mut join = Join::new("comments", vec![0], vec![0], false, true);
        assert!(!join.is_flipped());
        join.flip();
        assert!(join.is_flipped());
    }

    #[test]
    fn flip_is_noop_when_not_flippable() {
        let mut join = Join::new("comments", vec![0], vec![0], false, false);
        join.flip();
        assert!(!join.is_flipped());
    }

    #[test]
    fn singular_join_truncates_to_one_child() {
        let mut join = Join::new("profile", vec![0], vec![0], true, true);
        join.push_child(vec![Change::Add(child_row(100, 1)), Change::Add(child_row(101, 1))]);
        let out = join.push_parent(vec![Change::Add(parent_row(1, 1))]);
        match &out[0] {
            Change::Add(item) => assert_eq!(item.children("profile").len(), 1),
            _ => panic!("expected Add"),
        }
    }
}
