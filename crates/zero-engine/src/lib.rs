//! Zero Engine - ties the AST, the cost-based planner, and the IVM
//! operators into the query lifecycle (§6): `build` lowers an `Ast` to an
//! operator tree, `materialize` warms it from a `TableProvider` into a
//! live subscribable query, and `run` does a one-shot materialize-then-read.

mod build;
mod engine;
mod error;
mod predicate;
mod provider;
mod query;

pub use engine::Engine;
pub use error::EngineError;
pub use provider::TableProvider;
pub use query::MaterializedQuery;
