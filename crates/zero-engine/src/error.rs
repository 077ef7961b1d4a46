//! Engine-level errors (§7).

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("no schema registered for table {0:?}")]
    TableNotFound(String),
    #[error("table {table:?} has no column {column:?}")]
    ColumnNotFound { table: String, column: String },
    #[error("condition references a static parameter {0:?} that was never bound before reaching the engine")]
    UnboundStaticParam(String),
    #[error("unsupported condition shape: {0}")]
    Unsupported(&'static str),
}
