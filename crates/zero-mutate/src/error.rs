//! Mutation-layer errors (§4.6).

#[derive(Debug, thiserror::Error)]
pub enum MutationError {
    #[error("no schema registered for table {0:?}")]
    UnknownTable(String),
    #[error("table {table:?} has no column {column:?}")]
    UnknownColumn { table: String, column: String },
    /// Only one `transaction(cb)` may be in flight at a time (§4.6).
    #[error("a transaction is already in progress")]
    TransactionBusy,
}
