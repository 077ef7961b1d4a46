//! Per-table mutable state: a schema plus the `zero_ivm::Source` it feeds.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use zero_core::schema::Table;
use zero_core::{Row, RowId, Value};
use zero_ivm::Source;

#[derive(Clone)]
pub(crate) struct TableState {
    pub(crate) schema: Table,
    pub(crate) source: Source,
}

impl TableState {
    pub(crate) fn new(schema: Table) -> Self {
        let source = Source::new(schema.name());
        Self { schema, source }
    }
}

/// Rows are keyed by a hash of their primary-key values rather than an
/// arbitrary counter, so `Source`'s `RowId`-keyed map doubles as a primary
/// key index: looking a row up by key and looking it up after a fresh
/// `insert` land on the same id.
pub(crate) fn hash_key(key: &[Value]) -> RowId {
    let mut hasher = DefaultHasher::new();
    for value in key {
        value.hash(&mut hasher);
    }
    hasher.finish()
}

/// Builds a full-width row from a sparse field list, filling every column
/// the caller didn't specify with its schema default (§4.6: "fill any
/// unspecified optional columns with null").
pub(crate) fn build_full_values(schema: &Table, fields: &[(String, Value)]) -> Result<Vec<Value>, crate::error::MutationError> {
    let mut values: Vec<Value> = schema.columns().iter().map(|c| c.default()).collect();
    for (name, value) in fields {
        let idx = schema
            .get_column_index(name)
            .ok_or_else(|| crate::error::MutationError::UnknownColumn { table: schema.name().to_string(), column: name.clone() })?;
        values[idx] = value.clone();
    }
    Ok(values)
}

pub(crate) fn primary_key_of(schema: &Table, values: &[Value]) -> Vec<Value> {
    schema.primary_key().iter().map(|&idx| values[idx].clone()).collect()
}

pub(crate) fn column_pairs<'a>(schema: &'a Table, row: &'a Row) -> Vec<(&'a str, &'a Value)> {
    schema.columns().iter().map(|c| c.name()).zip(row.values().iter()).collect()
}
