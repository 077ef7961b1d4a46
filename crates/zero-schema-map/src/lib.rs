//! Zero Schema Map - bidirectional mapping between client-facing table and
//! column names and the server's names for the same entities (§1/§6).
//!
//! The compiler consults this to emit server names in SQL; the mutation
//! layer consults it to translate an optimistic client mutate call; the
//! change-streamer consults it to translate an incoming `data` message's
//! `relation`/column names back to what the client expects.

#![no_std]

extern crate alloc;

use alloc::string::{String, ToString};
use hashbrown::HashMap;

#[derive(Debug, Clone, Default)]
struct TableMap {
    server_name: String,
    client_to_server_columns: HashMap<String, String>,
    server_to_client_columns: HashMap<String, String>,
}

/// A name mapping for one schema: client table name -> server table name,
/// and per-table client column name -> server column name.
#[derive(Debug, Clone, Default)]
pub struct ClientServerMap {
    client_to_server_tables: HashMap<String, TableMap>,
    server_to_client_tables: HashMap<String, String>,
}

impl ClientServerMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a table mapping. `columns` is `(client_name, server_name)`
    /// pairs; any column absent from the list is assumed identical on both
    /// sides.
    pub fn add_table(&mut self, client_table: &str, server_table: &str, columns: &[(&str, &str)]) {
        let mut table_map = TableMap { server_name: server_table.to_string(), ..Default::default() };
        for (client_col, server_col) in columns {
            table_map
                .client_to_server_columns
                .insert(client_col.to_string(), server_col.to_string());
            table_map
                .server_to_client_columns
                .insert(server_col.to_string(), client_col.to_string());
        }
        self.client_to_server_tables.insert(client_table.to_string(), table_map);
        self.server_to_client_tables
            .insert(server_table.to_string(), client_table.to_string());
    }

    pub fn table_to_server(&self, client_table: &str) -> &str {
        self.client_to_server_tables
            .get(client_table)
            .map(|t| t.server_name.as_str())
            .unwrap_or(client_table)
    }

    pub fn table_to_client(&self, server_table: &str) -> &str {
        self.server_to_client_tables
            .get(server_table)
            .map(|s| s.as_str())
            .unwrap_or(server_table)
    }

    pub fn column_to_server<'a>(&'a self, client_table: &str, client_column: &'a str) -> &'a str {
        self.client_to_server_tables
            .get(client_table)
            .and_then(|t| t.client_to_server_columns.get(client_column))
            .map(|s| s.as_str())
            .unwrap_or(client_column)
    }

    pub fn column_to_client<'a>(&'a self, client_table: &str, server_column: &'a str) -> &'a str {
        self.client_to_server_tables
            .get(client_table)
            .and_then(|t| t.server_to_client_columns.get(server_column))
            .map(|s| s.as_str())
            .unwrap_or(server_column)
    }
}
