//! Zero AST - the hierarchical query representation described in §3/§4.1
//! of the design: a table-rooted tree of filters, orderings, limits, and
//! correlated sub-selects (`related[]`), with `hidden` junction edges for
//! many-to-many relationships.
//!
//! This crate only represents and validates the tree. Lowering it to SQL
//! lives in `zero-compiler`; reordering it for cost lives in `zero-planner`;
//! executing it incrementally lives in `zero-ivm`/`zero-engine`.

#![no_std]

extern crate alloc;

mod ast;
mod condition;
mod error;

pub use ast::{Ast, AstBuilder, Correlation, SortOrder, Start, Subquery};
pub use condition::{CompareOp, Condition, CorrelatedOp, Operand};
pub use error::AstError;
