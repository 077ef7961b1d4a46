use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;

use crate::error::StreamError;
use crate::log::ChangeLogStore;
use crate::message::StreamMessage;
use crate::replication::ReplicationState;
use crate::storer::{Inner, StorerOutcome};
use crate::subscriber::{SubscriberHandle, SubscriberMode};
use crate::watermark::Watermark;

/// Fan-out size for the live broadcast channel. A lagging subscriber skips
/// forward rather than blocking the storer (`broadcast::error::Lagged`,
/// handled in `SubscriberHandle::recv`).
const LIVE_CHANNEL_CAPACITY: usize = 1024;

/// Owns the change log, the replication fence, and the forwarder/storer
/// state machine. One `Streamer` per replicated database (§4.5).
pub struct Streamer<S: ChangeLogStore> {
    inner: Arc<Mutex<Inner<S>>>,
    live_tx: broadcast::Sender<StreamMessage>,
    owner: String,
    replica_version: String,
}

impl<S: ChangeLogStore> Streamer<S> {
    /// Writes this process's identity into the replication-state row
    /// (§4.5 "Ownership fence" — "at startup the streamer writes its
    /// (owner, ownerAddress)").
    pub fn new(
        store: S,
        owner: impl Into<String>,
        owner_address: impl Into<String>,
        replica_version: impl Into<String>,
    ) -> Self {
        let owner = owner.into();
        let replication = ReplicationState::claim(owner.clone(), owner_address);
        let (live_tx, _) = broadcast::channel(LIVE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Mutex::new(Inner::new(store, replication))),
            live_tx,
            owner,
            replica_version: replica_version.into(),
        }
    }

    /// The watermark a restarted source should resume from:
    /// `max(lastWatermark, replicaVersion)` (§4.5 "Starting watermark").
    pub fn starting_watermark(&self) -> Watermark {
        let inner = self.inner.lock().unwrap();
        let replica_version = Watermark::new(self.replica_version.clone());
        match inner.replication.last_watermark.clone() {
            Some(last) => last.max(replica_version),
            None => replica_version,
        }
    }

    /// Feeds one inbound message through the forwarder/storer state
    /// machine, rebroadcasting persisted records to live subscribers.
    pub fn forward(&self, msg: StreamMessage) -> Result<StorerOutcome, StreamError> {
        let (outcome, to_broadcast) = {
            let mut inner = self.inner.lock().unwrap();
            inner.apply(&self.owner, msg)?
        };
        if let Some(msg) = to_broadcast {
            // No live subscribers is not an error; `send` only fails when
            // every receiver has been dropped.
            let _ = self.live_tx.send(msg);
        }
        Ok(outcome)
    }

    /// Registers a new subscriber, validating its replica version and
    /// watermark, and returns a handle that first drains persisted history
    /// from `initial_watermark` and then forwards live changes (§4.5
    /// "Subscribers").
    pub fn subscribe(
        &self,
        id: impl Into<String>,
        mode: SubscriberMode,
        initial_watermark: Watermark,
        replica_version: &str,
    ) -> Result<SubscriberHandle<S>, StreamError> {
        if replica_version != self.replica_version {
            return Err(StreamError::WrongReplicaVersion);
        }
        let id = id.into();
        let mut inner = self.inner.lock().unwrap();
        if let Some(earliest) = inner.store.earliest_watermark() {
            if initial_watermark < earliest {
                return Err(match mode {
                    SubscriberMode::Serving => StreamError::WatermarkTooOld {
                        earliest,
                        requested: initial_watermark,
                    },
                    SubscriberMode::Backup => StreamError::AutoResetSignal(format!(
                        "backup replica at watermark {} is behind change db: {}",
                        initial_watermark, earliest
                    )),
                });
            }
        }

        let current_watermark = inner
            .replication
            .last_watermark
            .clone()
            .unwrap_or_else(|| initial_watermark.clone());
        let mut catchup: VecDeque<StreamMessage> =
            VecDeque::from([StreamMessage::Status {
                watermark: current_watermark,
            }]);
        catchup.extend(
            inner
                .store
                .iter_from(&initial_watermark)
                .into_iter()
                .map(|entry| entry.to_stream_message()),
        );
        inner
            .subscriber_watermarks
            .insert(id.clone(), initial_watermark);

        Ok(SubscriberHandle::new(
            id,
            catchup,
            self.live_tx.subscribe(),
            Arc::clone(&self.inner),
        ))
    }

    /// Spawns the periodic purge task (default every 30s, §4.5 "Purging").
    pub fn spawn_purge_task(&self, interval: std::time::Duration) -> tokio::task::JoinHandle<()>
    where
        S: Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let mut last_purged = None;
            loop {
                tokio::time::sleep(interval).await;
                let mut inner = inner.lock().unwrap();
                if let Some(purged) = inner.purge_once(&last_purged) {
                    last_purged = Some(purged);
                }
            }
        })
    }
}
