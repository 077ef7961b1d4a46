//! `Source`: the leaf of an IVM tree. Materializes a table's rows keyed by
//! id so later operators (chiefly `Join`) can look up a row's current state
//! and `Limit`/`View` can answer "did this row exist before?" (§4.4).

use crate::change::Change;
use crate::item::Item;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use hashbrown::HashMap;
use zero_core::{Row, RowId};

#[derive(Clone)]
pub struct Source {
    table: String,
    rows: HashMap<RowId, Row>,
}

impl Source {
    pub fn new(table: impl Into<String>) -> Self {
        Self { table: table.into(), rows: HashMap::new() }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, id: RowId) -> Option<&Row> {
        self.rows.get(&id)
    }

    /// Every currently materialized row, in no particular order. Used by
    /// conflict-set lookups (e.g. an `upsert` keyed on a non-primary-key
    /// column set) that can't go through the `RowId` index directly.
    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.values()
    }

    /// Applies a raw row-level change to the materialized table, and echoes
    /// it downstream wrapped as a leaf `Item`. `Add`/`Remove` of an id that's
    /// already/not present are idempotent no-ops that emit nothing, since the
    /// caller (the mutation layer) is expected to have already checked
    /// existence, but a defensively-written `Source` should never panic on a
    /// duplicate push.
    pub fn push(&mut self, change: Change<Row>) -> Vec<Change<Item>> {
        match change {
            Change::Add(row) => {
                let id = row.id();
                if self.rows.insert(id, row.clone()).is_some() {
                    return Vec::new();
                }
                vec![Change::Add(Item::leaf(row))]
            }
            Change::Remove(row) => {
                let id = row.id();
                match self.rows.remove(&id) {
                    Some(old) => vec![Change::Remove(Item::leaf(old))],
                    None => Vec::new(),
                }
            }
            Change::Edit { old, new } => {
                let id = old.id();
                if self.rows.get(&id).is_none() {
                    return Vec::new();
                }
                self.rows.insert(id, new.clone());
                vec![Change::Edit { old: Item::leaf(old), new: Item::leaf(new) }]
            }
        }
    }

    pub fn table_name_matches(&self, table: &str) -> bool {
        self.table == table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use zero_core::Value;

    #[test]
    fn add_then_duplicate_add_is_noop() {
        let mut source = Source::new("users");
        let row = Row::new(1, vec![Value::Int64(1)]);
        assert_eq!(source.push(Change::Add(row.clone())).len(), 1);
        assert_eq!(source.push(Change::Add(row)).len(), 0);
        assert_eq!(source.len(), 1);
    }

    #[test]
    fn remove_unknown_row_is_noop() {
        let mut source = Source::new("users");
        let row = Row::new(1, vec![]);
        assert!(source.push(Change::Remove(row)).is_empty());
    }

    #[test]
    fn edit_updates_materialized_row() {
        let mut source = Source::new("users");
        let row = Row::new(1, vec![Value::Int64(1)]);
        source.push(Change::Add(row.clone()));
        let new_row = Row::new(1, vec![Value::Int64(2)]);
        let out = source.push(Change::Edit { old: row, new: new_row.clone() });
        assert_eq!(out.len(), 1);
        assert_eq!(source.get(1).unwrap().get(0), Some(&Value::Int64(2)));
        let _ = new_row;
    }
}
