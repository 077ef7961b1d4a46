//! The HLL register array (§3/§4.3): precision p=14 (16384 registers,
//! ~16 KB), bias-corrected harmonic-mean cardinality estimation with
//! small-range (linear counting) and large-range (logarithmic) corrections,
//! and register-wise-max merge.

use crate::error::StatsError;
use crate::murmur3::murmur3_32;
use serde::{Deserialize, Serialize};
use zero_core::Value;

pub const HLL_PRECISION: u8 = 14;
pub const HLL_REGISTERS: usize = 1 << HLL_PRECISION as usize;

const SNAPSHOT_VERSION: u32 = 1;

/// A HyperLogLog sketch over one `(table, column)`'s observed values.
/// Deletion is not supported (§3): removing a value cannot be undone from
/// the sketch, which is why `StatsManager::on_remove` only adjusts the row
/// count, never the sketch itself.
#[derive(Clone, Debug)]
pub struct Hll {
    precision: u8,
    registers: Vec<u8>,
}

impl Default for Hll {
    fn default() -> Self {
        Self::new()
    }
}

impl Hll {
    pub fn new() -> Self {
        Self { precision: HLL_PRECISION, registers: vec![0u8; HLL_REGISTERS] }
    }

    pub fn precision(&self) -> u8 {
        self.precision
    }

    /// Hashes `value` and updates the register it maps to, if the observed
    /// rank exceeds the register's current value.
    pub fn add(&mut self, value: &Value) {
        let bytes = value_bytes(value);
        let hash = murmur3_32(&bytes, 0x5a5a5a5a);
        self.add_hash(hash);
    }

    fn add_hash(&mut self, hash: u32) {
        let m = self.registers.len() as u32;
        let idx = (hash & (m - 1)) as usize;
        let remaining = hash >> self.precision;
        let width = 32 - self.precision as u32;
        let rank = if remaining == 0 {
            width + 1
        } else {
            remaining.leading_zeros() - self.precision as u32 + 1
        };
        let rank = rank.min(255) as u8;
        if rank > self.registers[idx] {
            self.registers[idx] = rank;
        }
    }

    /// Register-wise max merge; requires matching precision (§3).
    pub fn merge(&mut self, other: &Hll) -> Result<(), StatsError> {
        if self.precision != other.precision {
            return Err(StatsError::PrecisionMismatch { expected: self.precision, got: other.precision });
        }
        for (a, b) in self.registers.iter_mut().zip(other.registers.iter()) {
            if *b > *a {
                *a = *b;
            }
        }
        Ok(())
    }

    /// Bias-corrected harmonic-mean cardinality estimate (§4.3).
    pub fn count(&self) -> u64 {
        let m = self.registers.len() as f64;
        let alpha_m = alpha(self.registers.len());

        let sum: f64 = self.registers.iter().map(|&r| 2f64.powi(-(r as i32))).sum();
        let raw_estimate = alpha_m * m * m / sum;

        let zero_registers = self.registers.iter().filter(|&&r| r == 0).count();

        let estimate = if raw_estimate <= 2.5 * m && zero_registers > 0 {
            // Small-range correction: linear counting.
            m * (m / zero_registers as f64).ln()
        } else if raw_estimate > (1u64 << 32) as f64 / 30.0 {
            // Large-range correction: avoid hash collisions dominating.
            -(1u64 << 32) as f64 * (1.0 - raw_estimate / (1u64 << 32) as f64).ln()
        } else {
            raw_estimate
        };

        estimate.max(0.0).round() as u64
    }

    pub fn to_snapshot(&self) -> HllSnapshot {
        HllSnapshot { version: SNAPSHOT_VERSION, precision: self.precision, registers: self.registers.clone() }
    }

    pub fn from_snapshot(snapshot: HllSnapshot) -> Result<Self, StatsError> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(StatsError::VersionMismatch { expected: SNAPSHOT_VERSION, got: snapshot.version });
        }
        Ok(Self { precision: snapshot.precision, registers: snapshot.registers })
    }
}

fn alpha(m: usize) -> f64 {
    match m {
        16 => 0.673,
        32 => 0.697,
        64 => 0.709,
        _ => 0.7213 / (1.0 + 1.079 / m as f64),
    }
}

fn value_bytes(value: &Value) -> Vec<u8> {
    match value {
        Value::Null => vec![0],
        Value::Boolean(b) => vec![1, *b as u8],
        Value::Int32(i) => [&[2][..], &i.to_le_bytes()].concat(),
        Value::Int64(i) => [&[3][..], &i.to_le_bytes()].concat(),
        Value::Float64(f) => [&[4][..], &f.to_bits().to_le_bytes()].concat(),
        Value::String(s) => [&[5][..], s.as_bytes()].concat(),
        Value::DateTime(d) => [&[6][..], &d.to_le_bytes()].concat(),
        Value::Bytes(b) => [&[7][..], b.as_slice()].concat(),
        Value::Json(j) => [&[8][..], j.0.as_slice()].concat(),
    }
}

/// Versioned JSON envelope for snapshot/restore (§7: `StatsError::VersionMismatch`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HllSnapshot {
    pub version: u32,
    pub precision: u8,
    pub registers: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cardinality_within_error_bound_for_1000_distinct() {
        let mut hll = Hll::new();
        for i in 0..1000i64 {
            hll.add(&Value::Int64(i));
        }
        let estimate = hll.count() as f64;
        let error = (estimate - 1000.0).abs() / 1000.0;
        assert!(error < 0.1, "estimate {} too far from 1000", estimate);
    }

    #[test]
    fn merge_requires_matching_precision() {
        let mut a = Hll::new();
        let mut b = Hll { precision: 10, registers: vec![0u8; 1 << 10] };
        assert!(a.merge(&b).is_err());
        b.precision = HLL_PRECISION;
        b.registers = vec![0u8; HLL_REGISTERS];
        assert!(a.merge(&b).is_ok());
    }

    #[test]
    fn merge_yields_union_estimate() {
        let mut a = Hll::new();
        let mut b = Hll::new();
        for i in 0..500i64 {
            a.add(&Value::Int64(i));
        }
        for i in 250..750i64 {
            b.add(&Value::Int64(i));
        }
        a.merge(&b).unwrap();
        let estimate = a.count() as f64;
        // Union of [0,500) and [250,750) is 750 distinct values.
        assert!((estimate - 750.0).abs() / 750.0 < 0.1);
    }

    #[test]
    fn snapshot_roundtrip() {
        let mut hll = Hll::new();
        hll.add(&Value::Int64(1));
        let snap = hll.to_snapshot();
        let json = serde_json::to_string(&snap).unwrap();
        let restored_snap: HllSnapshot = serde_json::from_str(&json).unwrap();
        let restored = Hll::from_snapshot(restored_snap).unwrap();
        assert_eq!(restored.count(), hll.count());
    }

    #[test]
    fn version_mismatch_rejected() {
        let snap = HllSnapshot { version: 999, precision: HLL_PRECISION, registers: vec![0; HLL_REGISTERS] };
        assert!(matches!(Hll::from_snapshot(snap), Err(StatsError::VersionMismatch { .. })));
    }
}
