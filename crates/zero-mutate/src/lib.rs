//! Zero Mutate - the CRUD mutation layer (§4.6): schema-aware
//! insert/upsert/update/delete against per-table `zero_ivm::Source`s, with
//! fork/swap transactions guarded against concurrent use.

mod error;
mod executor;
mod table;

pub use error::MutationError;
pub use executor::Executor;
