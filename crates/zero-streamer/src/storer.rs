//! Forwarder/storer state machine (§4.5): `Idle -begin-> InTx -data-> InTx
//! -{commit,rollback}-> Idle`, with a `Shutdown` trap state on
//! reset-required control messages.

use std::collections::HashMap;

use crate::error::StreamError;
use crate::log::{ChangeEntry, ChangeLogEntry, ChangeLogStore};
use crate::message::{ControlMessage, StreamMessage};
use crate::replication::ReplicationState;
use crate::watermark::Watermark;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxState {
    Idle,
    InTx,
    Shutdown,
}

/// What the caller driving the forwarding loop should do next.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorerOutcome {
    Continue,
    /// A transaction committed; `Watermark` is safe to resume from after a
    /// stream restart.
    Ack(Watermark),
    Shutdown,
}

pub struct Inner<S: ChangeLogStore> {
    pub(crate) store: S,
    pub(crate) replication: ReplicationState,
    tx_state: TxState,
    current_tx_watermark: Option<Watermark>,
    next_pos: u32,
    pub(crate) subscriber_watermarks: HashMap<String, Watermark>,
}

impl<S: ChangeLogStore> Inner<S> {
    pub fn new(store: S, replication: ReplicationState) -> Self {
        Self {
            store,
            replication,
            tx_state: TxState::Idle,
            current_tx_watermark: None,
            next_pos: 0,
            subscriber_watermarks: HashMap::new(),
        }
    }

    pub fn tx_state(&self) -> TxState {
        self.tx_state
    }

    /// Applies one inbound message to the state machine, persisting to the
    /// log as a side effect. Returns the outcome plus the message to
    /// rebroadcast to live subscribers, if any.
    pub fn apply(
        &mut self,
        owner: &str,
        msg: StreamMessage,
    ) -> Result<(StorerOutcome, Option<StreamMessage>), StreamError> {
        match (self.tx_state, msg) {
            (TxState::Idle, StreamMessage::Begin { commit_watermark }) => {
                self.current_tx_watermark = Some(commit_watermark.clone());
                self.next_pos = 0;
                let entry = ChangeLogEntry {
                    watermark: commit_watermark.clone(),
                    pos: 0,
                    change: ChangeEntry::Begin { commit_watermark },
                    precommit: None,
                };
                let out = entry.to_stream_message();
                self.store.append(entry);
                self.next_pos = 1;
                self.tx_state = TxState::InTx;
                Ok((StorerOutcome::Continue, Some(out)))
            }
            (TxState::InTx, StreamMessage::Data(record)) => {
                let watermark = self
                    .current_tx_watermark
                    .clone()
                    .expect("InTx implies a current transaction watermark");
                let pos = self.next_pos;
                self.next_pos += 1;
                let entry = ChangeLogEntry {
                    watermark,
                    pos,
                    change: ChangeEntry::Data(record),
                    precommit: None,
                };
                let out = entry.to_stream_message();
                self.store.append(entry);
                Ok((StorerOutcome::Continue, Some(out)))
            }
            (TxState::InTx, StreamMessage::Commit { watermark }) => {
                if !self.replication.owned_by(owner) {
                    self.tx_state = TxState::Shutdown;
                    return Err(StreamError::OwnershipLost);
                }
                let pos = self.next_pos;
                let entry = ChangeLogEntry {
                    watermark: watermark.clone(),
                    pos,
                    change: ChangeEntry::Commit {
                        watermark: watermark.clone(),
                    },
                    precommit: None,
                };
                let out = entry.to_stream_message();
                self.store.append(entry);
                self.replication.advance_watermark(watermark.clone());
                self.tx_state = TxState::Idle;
                self.current_tx_watermark = None;
                Ok((StorerOutcome::Ack(watermark), Some(out)))
            }
            (TxState::InTx, StreamMessage::Rollback) => {
                if let Some(watermark) = self.current_tx_watermark.take() {
                    self.store.delete_tx(&watermark);
                }
                self.tx_state = TxState::Idle;
                Ok((StorerOutcome::Continue, None))
            }
            (state, StreamMessage::Status { watermark }) if state != TxState::Shutdown => {
                Ok((StorerOutcome::Continue, Some(StreamMessage::Status { watermark })))
            }
            (_, StreamMessage::Control(ControlMessage::ResetRequired)) => {
                self.tx_state = TxState::Shutdown;
                Err(StreamError::AutoResetSignal(
                    "reset-required control message received".to_string(),
                ))
            }
            (TxState::Shutdown, _) => Err(StreamError::AbortError),
            (state, msg) => {
                tracing::warn!(?state, ?msg, "dropping message invalid for current state");
                Ok((StorerOutcome::Continue, None))
            }
        }
    }

    /// One purge step: purges everything before the lowest unacked
    /// subscriber watermark, unless nothing has advanced since the last
    /// purge (§4.5 "Purging").
    pub fn purge_once(&mut self, last_purged: &Option<Watermark>) -> Option<Watermark> {
        let min_watermark = self.subscriber_watermarks.values().min().cloned()?;
        if last_purged.as_ref() == Some(&min_watermark) {
            return None;
        }
        self.store.purge_before(&min_watermark);
        Some(min_watermark)
    }
}
