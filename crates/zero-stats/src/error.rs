//! Statistics errors (§7: `StatsError`).

#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    #[error("HLL snapshot version mismatch: expected {expected}, got {got}")]
    VersionMismatch { expected: u32, got: u32 },
    #[error("cannot merge HLL sketches of different precision: expected {expected}, got {got}")]
    PrecisionMismatch { expected: u8, got: u8 },
}
