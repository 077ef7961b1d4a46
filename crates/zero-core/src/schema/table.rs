//! Table definitions.

use super::column::Column;
use crate::error::{Error, Result};
use alloc::string::{String, ToString};
use alloc::vec::Vec;

/// A table definition: name, ordered columns, and a primary key made of
/// one or more of those columns (by index).
#[derive(Clone, Debug)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
    primary_key: Vec<usize>,
}

impl Table {
    /// Builds a table from its column list and primary-key column names.
    /// Mirrors the AST invariant that order-by/correlation columns must
    /// actually exist on the table (§3): an unknown primary-key column
    /// name is an `InvalidSchema` error rather than a silent no-op.
    pub fn new(name: impl Into<String>, columns: Vec<Column>, primary_key: &[&str]) -> Result<Self> {
        let name = name.into();
        let columns: Vec<Column> = columns
            .into_iter()
            .enumerate()
            .map(|(i, c)| c.with_index(i))
            .collect();

        if primary_key.is_empty() {
            return Err(Error::invalid_schema(format_no_std("table {} has no primary key", &name)));
        }

        let mut pk_indices = Vec::with_capacity(primary_key.len());
        for pk_col in primary_key {
            let idx = columns
                .iter()
                .position(|c| c.name() == *pk_col)
                .ok_or_else(|| Error::column_not_found(name.clone(), (*pk_col).to_string()))?;
            pk_indices.push(idx);
        }

        Ok(Self { name, columns, primary_key: pk_indices })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn primary_key(&self) -> &[usize] {
        &self.primary_key
    }

    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    /// Returns whether `name` exists as a column, per the AST's "orderBy
    /// columns exist on table" invariant (§3).
    pub fn has_column(&self, name: &str) -> bool {
        self.get_column_index(name).is_some()
    }
}

fn format_no_std(template: &str, arg: &str) -> String {
    alloc::format!("{}", template.replacen("{}", arg, 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataType;

    #[test]
    fn build_table_validates_primary_key() {
        let cols = alloc::vec![Column::new("id", DataType::Int64), Column::new("name", DataType::String)];
        let t = Table::new("issue", cols, &["id"]).unwrap();
        assert_eq!(t.primary_key(), &[0]);
        assert!(t.has_column("name"));
        assert!(!t.has_column("bogus"));
    }

    #[test]
    fn unknown_primary_key_column_errors() {
        let cols = alloc::vec![Column::new("id", DataType::Int64)];
        let err = Table::new("issue", cols, &["nope"]).unwrap_err();
        assert!(matches!(err, Error::ColumnNotFound { .. }));
    }
}
