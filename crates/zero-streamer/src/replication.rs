//! The singleton `replicationState` row and its ownership fence (§3, §4.5).

use crate::watermark::Watermark;

#[derive(Clone, Debug)]
pub struct ReplicationState {
    pub owner: String,
    pub owner_address: String,
    pub last_watermark: Option<Watermark>,
}

impl ReplicationState {
    /// Writes this process's identity into the singleton row. Called once
    /// at streamer startup; any commit that later reads back a different
    /// owner knows another process has taken over.
    pub fn claim(owner: impl Into<String>, owner_address: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            owner_address: owner_address.into(),
            last_watermark: None,
        }
    }

    pub fn owned_by(&self, owner: &str) -> bool {
        self.owner == owner
    }

    /// `lastWatermark` only ever advances (§3 invariant).
    pub fn advance_watermark(&mut self, watermark: Watermark) {
        self.last_watermark = Some(match self.last_watermark.take() {
            Some(current) => current.max(watermark),
            None => watermark,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watermark_only_advances() {
        let mut state = ReplicationState::claim("p1", "10.0.0.1");
        state.advance_watermark(Watermark::new("b"));
        state.advance_watermark(Watermark::new("a"));
        assert_eq!(state.last_watermark.unwrap().as_str(), "b");
    }

    #[test]
    fn owned_by_checks_identity() {
        let state = ReplicationState::claim("p1", "10.0.0.1");
        assert!(state.owned_by("p1"));
        assert!(!state.owned_by("p2"));
    }
}
