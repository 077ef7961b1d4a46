//! `Executor`: the schema-aware CRUD surface over per-table
//! `zero_ivm::Source`s, plus fork/swap transactions (§4.6).

use crate::error::MutationError;
use crate::table::{build_full_values, column_pairs, hash_key, primary_key_of, TableState};
use std::collections::HashMap;
use zero_core::schema::Table;
use zero_core::{Row, Value};
use zero_ivm::Change;
use zero_stats::StatsManager;

pub struct Executor {
    tables: HashMap<String, TableState>,
    stats: StatsManager,
    pending: Vec<(String, Change<Row>)>,
    in_transaction: bool,
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor {
    pub fn new() -> Self {
        Self { tables: HashMap::new(), stats: StatsManager::new(), pending: Vec::new(), in_transaction: false }
    }

    pub fn register_table(&mut self, schema: Table) {
        self.tables.insert(schema.name().to_string(), TableState::new(schema));
    }

    pub fn stats(&self) -> &StatsManager {
        &self.stats
    }

    /// Returns (and clears) every change produced since the last drain, for
    /// a caller (the change-streamer, in a full deployment) to fan out to
    /// live queries.
    pub fn drain_changes(&mut self) -> Vec<(String, Change<Row>)> {
        std::mem::take(&mut self.pending)
    }

    pub fn row(&self, table: &str, key: &[Value]) -> Option<&Row> {
        self.tables.get(table).and_then(|state| state.source.get(hash_key(key)))
    }

    fn table_mut(&mut self, table: &str) -> Result<&mut TableState, MutationError> {
        self.tables.get_mut(table).ok_or_else(|| MutationError::UnknownTable(table.to_string()))
    }

    /// No-op if a row with this primary key already exists (§4.6).
    pub fn insert(&mut self, table: &str, fields: Vec<(String, Value)>) -> Result<Option<Change<Row>>, MutationError> {
        let state = self.table_mut(table)?;
        let full_values = build_full_values(&state.schema, &fields)?;
        let key = primary_key_of(&state.schema, &full_values);
        let id = hash_key(&key);
        if state.source.get(id).is_some() {
            return Ok(None);
        }
        let row = Row::new(id, full_values);
        state.source.push(Change::Add(row.clone()));
        let pairs = column_pairs(&state.schema, &row);
        self.stats.on_add(table, &pairs);
        let change = Change::Add(row);
        self.pending.push((table.to_string(), change.clone()));
        Ok(Some(change))
    }

    /// Conflict detection uses the primary key by default, or `on_conflict`
    /// columns if given (§4.6).
    pub fn upsert(
        &mut self,
        table: &str,
        fields: Vec<(String, Value)>,
        on_conflict: Option<&[&str]>,
    ) -> Result<Change<Row>, MutationError> {
        let state = self.table_mut(table)?;
        let full_values = build_full_values(&state.schema, &fields)?;

        let conflict_cols: Vec<usize> = match on_conflict {
            Some(cols) => cols
                .iter()
                .map(|name| {
                    state
                        .schema
                        .get_column_index(name)
                        .ok_or_else(|| MutationError::UnknownColumn { table: table.to_string(), column: (*name).to_string() })
                })
                .collect::<Result<_, _>>()?,
            None => state.schema.primary_key().to_vec(),
        };

        let existing_id = state
            .source
            .rows()
            .find(|row| conflict_cols.iter().all(|&idx| row.get(idx) == full_values.get(idx)))
            .map(|row| row.id());

        match existing_id {
            Some(id) => {
                let old = state.source.get(id).expect("just matched by id").clone();
                let mut new_values = old.values().to_vec();
                for (name, value) in &fields {
                    let idx = state
                        .schema
                        .get_column_index(name)
                        .ok_or_else(|| MutationError::UnknownColumn { table: table.to_string(), column: name.clone() })?;
                    new_values[idx] = value.clone();
                }
                let new_row = Row::new(id, new_values);
                state.source.push(Change::Edit { old: old.clone(), new: new_row.clone() });
                let pairs = column_pairs(&state.schema, &new_row);
                self.stats.on_edit(table, &pairs);
                let change = Change::Edit { old, new: new_row };
                self.pending.push((table.to_string(), change.clone()));
                Ok(change)
            }
            None => {
                let key = primary_key_of(&state.schema, &full_values);
                let id = hash_key(&key);
                let row = Row::new(id, full_values);
                state.source.push(Change::Add(row.clone()));
                let pairs = column_pairs(&state.schema, &row);
                self.stats.on_add(table, &pairs);
                let change = Change::Add(row);
                self.pending.push((table.to_string(), change.clone()));
                Ok(change)
            }
        }
    }

    /// Merges `patch` into the existing row and pushes `Edit{old, new}`;
    /// no-op if the row is missing (§4.6).
    pub fn update(
        &mut self,
        table: &str,
        key: &[Value],
        patch: Vec<(String, Value)>,
    ) -> Result<Option<Change<Row>>, MutationError> {
        let state = self.table_mut(table)?;
        let id = hash_key(key);
        let old = match state.source.get(id) {
            Some(row) => row.clone(),
            None => return Ok(None),
        };
        let mut new_values = old.values().to_vec();
        for (name, value) in &patch {
            let idx = state
                .schema
                .get_column_index(name)
                .ok_or_else(|| MutationError::UnknownColumn { table: table.to_string(), column: name.clone() })?;
            new_values[idx] = value.clone();
        }
        let new_row = Row::new(id, new_values);
        state.source.push(Change::Edit { old: old.clone(), new: new_row.clone() });
        let pairs = column_pairs(&state.schema, &new_row);
        self.stats.on_edit(table, &pairs);
        let change = Change::Edit { old, new: new_row };
        self.pending.push((table.to_string(), change.clone()));
        Ok(Some(change))
    }

    /// Removes the row and pushes `Remove{oldRow}`; no-op if missing (§4.6).
    pub fn delete(&mut self, table: &str, key: &[Value]) -> Result<Option<Change<Row>>, MutationError> {
        let state = self.table_mut(table)?;
        let id = hash_key(key);
        let old = match state.source.get(id) {
            Some(row) => row.clone(),
            None => return Ok(None),
        };
        state.source.push(Change::Remove(old.clone()));
        self.stats.on_remove(table);
        let change = Change::Remove(old);
        self.pending.push((table.to_string(), change.clone()));
        Ok(Some(change))
    }

    /// Forks every table's source, runs `cb` against the fork, and only
    /// swaps the fork in on success. One transaction at a time; a nested
    /// or concurrent call fails with `TransactionBusy` (§4.6).
    pub fn transaction<F, T>(&mut self, cb: F) -> Result<T, MutationError>
    where
        F: FnOnce(&mut Executor) -> Result<T, MutationError>,
    {
        if self.in_transaction {
            return Err(MutationError::TransactionBusy);
        }
        let mut fork = Executor {
            tables: self.tables.clone(),
            stats: self.stats.clone(),
            pending: Vec::new(),
            in_transaction: true,
        };
        self.in_transaction = true;
        let result = cb(&mut fork);
        self.in_transaction = false;
        if result.is_ok() {
            self.tables = fork.tables;
            self.stats = fork.stats;
            self.pending.extend(fork.pending);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zero_core::schema::Column;
    use zero_core::DataType;

    fn executor() -> Executor {
        let mut ex = Executor::new();
        ex.register_table(
            Table::new(
                "issue",
                vec![Column::new("id", DataType::Int64), Column::new("title", DataType::String), Column::new("closed", DataType::Boolean)],
                &["id"],
            )
            .unwrap(),
        );
        ex
    }

    #[test]
    fn insert_then_duplicate_insert_is_noop() {
        let mut ex = executor();
        let fields = vec![("id".to_string(), Value::Int64(1)), ("title".to_string(), Value::String("a".into()))];
        assert!(ex.insert("issue", fields.clone()).unwrap().is_some());
        assert!(ex.insert("issue", fields).unwrap().is_none());
    }

    #[test]
    fn insert_fills_unspecified_columns_with_default() {
        let mut ex = executor();
        ex.insert("issue", vec![("id".to_string(), Value::Int64(1))]).unwrap();
        let row = ex.row("issue", &[Value::Int64(1)]).unwrap();
        assert_eq!(row.get(2), Some(&Value::Boolean(false)));
    }

    #[test]
    fn update_missing_row_is_noop() {
        let mut ex = executor();
        let out = ex.update("issue", &[Value::Int64(99)], vec![("closed".to_string(), Value::Boolean(true))]).unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn update_merges_patch_and_emits_edit() {
        let mut ex = executor();
        ex.insert("issue", vec![("id".to_string(), Value::Int64(1)), ("title".to_string(), Value::String("a".into()))]).unwrap();
        let change = ex.update("issue", &[Value::Int64(1)], vec![("closed".to_string(), Value::Boolean(true))]).unwrap().unwrap();
        match change {
            Change::Edit { old, new } => {
                assert_eq!(old.get(2), Some(&Value::Boolean(false)));
                assert_eq!(new.get(2), Some(&Value::Boolean(true)));
                assert_eq!(new.get(1), Some(&Value::String("a".into())));
            }
            _ => panic!("expected Edit"),
        }
    }

    #[test]
    fn delete_removes_row_and_is_noop_on_missing() {
        let mut ex = executor();
        ex.insert("issue", vec![("id".to_string(), Value::Int64(1))]).unwrap();
        assert!(ex.delete("issue", &[Value::Int64(1)]).unwrap().is_some());
        assert!(ex.row("issue", &[Value::Int64(1)]).is_none());
        assert!(ex.delete("issue", &[Value::Int64(1)]).unwrap().is_none());
    }

    #[test]
    fn upsert_inserts_when_absent_and_edits_when_present() {
        let mut ex = executor();
        let change = ex.upsert("issue", vec![("id".to_string(), Value::Int64(1)), ("title".to_string(), Value::String("a".into()))], None).unwrap();
        assert!(matches!(change, Change::Add(_)));

        let change = ex.upsert("issue", vec![("id".to_string(), Value::Int64(1)), ("title".to_string(), Value::String("b".into()))], None).unwrap();
        match change {
            Change::Edit { new, .. } => assert_eq!(new.get(1), Some(&Value::String("b".into()))),
            _ => panic!("expected Edit"),
        }
    }

    #[test]
    fn transaction_swaps_in_only_on_success() {
        let mut ex = executor();
        ex.insert("issue", vec![("id".to_string(), Value::Int64(1))]).unwrap();

        let result: Result<(), MutationError> = ex.transaction(|fork| {
            fork.insert("issue", vec![("id".to_string(), Value::Int64(2))])?;
            Err(MutationError::UnknownTable("rollback".to_string()))
        });
        assert!(result.is_err());
        assert!(ex.row("issue", &[Value::Int64(2)]).is_none());

        ex.transaction(|fork| {
            fork.insert("issue", vec![("id".to_string(), Value::Int64(3))])?;
            Ok::<_, MutationError>(())
        })
        .unwrap();
        assert!(ex.row("issue", &[Value::Int64(3)]).is_some());
    }

    #[test]
    fn concurrent_transaction_is_rejected() {
        let mut ex = executor();
        let outer = ex.transaction(|fork| {
            let inner = fork.transaction(|_| Ok::<_, MutationError>(()));
            assert!(matches!(inner, Err(MutationError::TransactionBusy)));
            Ok::<_, MutationError>(())
        });
        assert!(outer.is_ok());
    }
}
