//! Shared error type for schema and row operations.

use crate::types::DataType;
use crate::value::Value;
use alloc::string::String;
use core::fmt;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    TypeMismatch { expected: DataType, got: DataType },
    NullConstraint { column: String },
    NotFound { table: String, key: Value },
    InvalidSchema { message: String },
    ColumnNotFound { table: String, column: String },
    TableNotFound { name: String },
    InvalidOperation { message: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::TypeMismatch { expected, got } => {
                write!(f, "type mismatch: expected {:?}, got {:?}", expected, got)
            }
            Error::NullConstraint { column } => write!(f, "null constraint violation on {}", column),
            Error::NotFound { table, key } => write!(f, "not found in {}: {:?}", table, key),
            Error::InvalidSchema { message } => write!(f, "invalid schema: {}", message),
            Error::ColumnNotFound { table, column } => {
                write!(f, "column {} not found on table {}", column, table)
            }
            Error::TableNotFound { name } => write!(f, "table not found: {}", name),
            Error::InvalidOperation { message } => write!(f, "invalid operation: {}", message),
        }
    }
}

impl Error {
    pub fn invalid_schema(message: impl Into<String>) -> Self {
        Error::InvalidSchema { message: message.into() }
    }

    pub fn column_not_found(table: impl Into<String>, column: impl Into<String>) -> Self {
        Error::ColumnNotFound { table: table.into(), column: column.into() }
    }

    pub fn table_not_found(name: impl Into<String>) -> Self {
        Error::TableNotFound { name: name.into() }
    }

    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Error::InvalidOperation { message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn display_contains_context() {
        assert!(Error::table_not_found("issue").to_string().contains("issue"));
        assert!(Error::column_not_found("issue", "closed")
            .to_string()
            .contains("closed"));
    }
}
