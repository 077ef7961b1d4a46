//! AST construction errors — these are programmer errors per the error
//! taxonomy (§7): an invalid AST fails synchronously at construction time
//! rather than deferring the problem to the compiler or planner.

use alloc::string::String;
use core::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AstError {
    /// An `orderBy` column does not exist on the AST's table (§3 invariant).
    UnknownOrderByColumn { table: String, column: String },
    /// `related[].correlation.parentField.length != childField.length`,
    /// or either is zero.
    InvalidCorrelation { alias: String },
    /// Two entries in one `related[]` list share an alias.
    DuplicateAlias { alias: String },
    /// `IS`/`IS NOT` carried a right-hand operand other than NULL/TRUE/FALSE.
    InvalidIsOperand,
    /// `IN`/`NOT IN` carried a non-array right-hand operand.
    InvalidInOperand,
}

impl fmt::Display for AstError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AstError::UnknownOrderByColumn { table, column } => {
                write!(f, "orderBy references unknown column {}.{}", table, column)
            }
            AstError::InvalidCorrelation { alias } => {
                write!(f, "related[{}] correlation must have equal, non-empty parent/child field lists", alias)
            }
            AstError::DuplicateAlias { alias } => write!(f, "duplicate related[] alias: {}", alias),
            AstError::InvalidIsOperand => write!(f, "IS/IS NOT right-hand side must be NULL, TRUE, or FALSE"),
            AstError::InvalidInOperand => write!(f, "IN/NOT IN right-hand side must be an array"),
        }
    }
}
