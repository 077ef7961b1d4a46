//! Zero Stats - HyperLogLog-backed per-table/per-column statistics (§4.3),
//! consumed by `zero-planner`'s cost model for semi-join selectivity and
//! fanout estimates.

mod error;
mod hll;
mod manager;
mod murmur3;

pub use error::StatsError;
pub use hll::{Hll, HLL_PRECISION, HLL_REGISTERS};
pub use manager::{Confidence, StatsManager, StatsSource};
