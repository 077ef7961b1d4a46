//! Zero Core - foundational value, row, and schema types.
//!
//! This crate provides the primitive vocabulary shared by every other
//! crate in the workspace:
//!
//! - `DataType` / `Value`: the runtime type system for cell values.
//! - `Row`: a fixed-schema tuple of `Value`s, keyed by primary key.
//! - `schema`: `Column` and `Table` definitions.
//! - `Error`: the shared error type for schema/row operations.
//! - `pattern_match`: the LIKE/ILIKE implementation shared by the compiler
//!   and the IVM filter operator, so both agree on semantics.

#![no_std]

extern crate alloc;

mod error;
pub mod pattern_match;
mod row;
pub mod schema;
mod types;
mod value;

pub use error::{Error, Result};
pub use row::{next_row_id, reserve_row_ids, Row, RowId, DUMMY_ROW_ID};
pub use types::DataType;
pub use value::{JsonbValue, Value};
