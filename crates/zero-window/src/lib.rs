//! Zero Window - a bidirectional virtualized window over an out-of-core
//! ordered list (§4.7): tracks the currently loaded range, `atStart`/
//! `atEnd`, an `estimatedTotal`, and a permalink anchor, resetting whenever
//! the caller's list context changes.

mod manager;

pub use manager::{page_size, RowWindowManager, WindowManager, MIN_PAGE_SIZE};
