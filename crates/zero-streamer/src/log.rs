//! The persistent change log: `(watermark, pos)` keyed, `precommit`
//! nullable (§4.5 "Store", §6 "Persisted state layout").

use std::collections::BTreeMap;

use crate::message::{ChangeRecord, StreamMessage};
use crate::watermark::Watermark;

#[derive(Clone, Debug)]
pub enum ChangeEntry {
    Begin { commit_watermark: Watermark },
    Data(ChangeRecord),
    Commit { watermark: Watermark },
    Rollback,
}

#[derive(Clone, Debug)]
pub struct ChangeLogEntry {
    pub watermark: Watermark,
    pub pos: u32,
    pub change: ChangeEntry,
    pub precommit: Option<String>,
}

impl ChangeLogEntry {
    pub fn to_stream_message(&self) -> StreamMessage {
        match &self.change {
            ChangeEntry::Begin { commit_watermark } => StreamMessage::Begin {
                commit_watermark: commit_watermark.clone(),
            },
            ChangeEntry::Data(record) => StreamMessage::Data(record.clone()),
            ChangeEntry::Commit { watermark } => StreamMessage::Commit {
                watermark: watermark.clone(),
            },
            ChangeEntry::Rollback => StreamMessage::Rollback,
        }
    }
}

/// A persistent, `(watermark, pos)`-ordered change log. The `InMemory`
/// implementation below stands in for a real table-backed store (§6's
/// `changeLog` table); swap in a different `ChangeLogStore` to persist to
/// disk without touching the forwarder/storer state machine.
pub trait ChangeLogStore: Send {
    fn append(&mut self, entry: ChangeLogEntry);

    /// Discards every entry belonging to the transaction that shares this
    /// commit watermark (used on rollback).
    fn delete_tx(&mut self, watermark: &Watermark);

    fn earliest_watermark(&self) -> Option<Watermark>;

    fn last_watermark(&self) -> Option<Watermark>;

    /// Every retained entry at or after `from`, in `(watermark, pos)` order.
    fn iter_from(&self, from: &Watermark) -> Vec<ChangeLogEntry>;

    /// Drops every entry strictly before `watermark`.
    fn purge_before(&mut self, watermark: &Watermark);
}

#[derive(Default)]
pub struct InMemoryChangeLogStore {
    entries: BTreeMap<(Watermark, u32), ChangeLogEntry>,
}

impl InMemoryChangeLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ChangeLogStore for InMemoryChangeLogStore {
    fn append(&mut self, entry: ChangeLogEntry) {
        self.entries
            .insert((entry.watermark.clone(), entry.pos), entry);
    }

    fn delete_tx(&mut self, watermark: &Watermark) {
        self.entries.retain(|(w, _), _| w != watermark);
    }

    fn earliest_watermark(&self) -> Option<Watermark> {
        self.entries.keys().next().map(|(w, _)| w.clone())
    }

    fn last_watermark(&self) -> Option<Watermark> {
        self.entries.keys().next_back().map(|(w, _)| w.clone())
    }

    fn iter_from(&self, from: &Watermark) -> Vec<ChangeLogEntry> {
        self.entries
            .range((from.clone(), 0)..)
            .map(|(_, entry)| entry.clone())
            .collect()
    }

    fn purge_before(&mut self, watermark: &Watermark) {
        self.entries.retain(|(w, _), _| w >= watermark);
    }
}
