//! Zero Compiler - compiles the query AST to parameterized dialect SQL
//! (§4.1): `row_to_json`/`json_agg` projections, `IS [NOT] DISTINCT FROM`,
//! `= ANY(...)`, keyset-pagination tuple comparisons, and junction alias
//! synthesis for repeated table references.

#![no_std]

extern crate alloc;

mod compiler;
mod error;

pub use compiler::{CompiledQuery, Compiler};
pub use error::CompileError;
