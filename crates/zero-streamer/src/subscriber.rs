use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;

use crate::log::ChangeLogStore;
use crate::message::StreamMessage;
use crate::storer::Inner;
use crate::watermark::Watermark;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubscriberMode {
    Serving,
    Backup,
}

/// A live subscription: catchup history first, then live-forwarded
/// changes. Acks gate log purging (§4.5 "Subscribers").
pub struct SubscriberHandle<S: ChangeLogStore> {
    pub id: String,
    catchup: VecDeque<StreamMessage>,
    live: broadcast::Receiver<StreamMessage>,
    inner: Arc<Mutex<Inner<S>>>,
}

impl<S: ChangeLogStore> SubscriberHandle<S> {
    pub(crate) fn new(
        id: String,
        catchup: VecDeque<StreamMessage>,
        live: broadcast::Receiver<StreamMessage>,
        inner: Arc<Mutex<Inner<S>>>,
    ) -> Self {
        Self {
            id,
            catchup,
            live,
            inner,
        }
    }

    /// `None` once the streamer has shut down and the live channel closes.
    pub async fn recv(&mut self) -> Option<StreamMessage> {
        if let Some(msg) = self.catchup.pop_front() {
            return Some(msg);
        }
        loop {
            match self.live.recv().await {
                Ok(msg) => return Some(msg),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Records this subscriber's lowest unacked watermark, advancing the
    /// purge cutoff.
    pub fn ack(&self, watermark: Watermark) {
        self.inner
            .lock()
            .unwrap()
            .subscriber_watermarks
            .insert(self.id.clone(), watermark);
    }
}
