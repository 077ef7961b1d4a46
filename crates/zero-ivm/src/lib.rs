//! Zero IVM - incremental view maintenance operators (§4.4). A query plan
//! compiles to a `Node` tree of `Source`/`Filter`/`Join`/`Limit`/`Project`
//! combinators rooted at a `View`; every mutation is a `Change` pushed into
//! the tree by table name and folded upward into zero or more `Change<Item>`s
//! the view applies and, once per transaction, commits to its subscribers.

#![no_std]

extern crate alloc;

mod change;
mod filter;
mod item;
mod join;
mod limit;
mod node;
mod project;
mod source;
mod view;

pub use change::Change;
pub use filter::Filter;
pub use item::Item;
pub use join::Join;
pub use limit::Limit;
pub use node::Node;
pub use project::Project;
pub use source::Source;
pub use view::View;
