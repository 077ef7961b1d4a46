//! Debounced online/offline detector (§4.8): `online -> offline-pending ->
//! offline`, with `setOnline(true)` clearing any pending timer. Mirrors the
//! change-streamer's own `Idle/InTx/Shutdown` state-machine shape (a plain
//! enum guarded by a mutex, transitions deduplicated before notifying).

use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Online,
    OfflinePending,
    Offline,
}

struct Inner {
    status: Status,
    pending_timer: Option<tokio::task::JoinHandle<()>>,
    listeners: Vec<Box<dyn Fn(Status) + Send + Sync>>,
}

/// Starts `Online`; every transition is deduplicated before listeners fire.
pub struct OnlineOfflineManager {
    inner: Arc<Mutex<Inner>>,
    grace_period: Duration,
}

impl OnlineOfflineManager {
    pub fn new(grace_period: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                status: Status::Online,
                pending_timer: None,
                listeners: Vec::new(),
            })),
            grace_period,
        }
    }

    pub fn status(&self) -> Status {
        self.inner.lock().unwrap().status
    }

    pub fn subscribe(&self, listener: impl Fn(Status) + Send + Sync + 'static) {
        self.inner.lock().unwrap().listeners.push(Box::new(listener));
    }

    /// `true` -> `online`, clearing any pending offline timer (idempotent).
    /// `false` schedules `offline` after the grace period unless already
    /// pending or offline, in which case it's a no-op (§4.8).
    pub fn set_online(&self, online: bool) {
        let mut inner = self.inner.lock().unwrap();
        if online {
            if let Some(timer) = inner.pending_timer.take() {
                timer.abort();
            }
            Self::transition(&mut inner, Status::Online);
            return;
        }

        if inner.status != Status::Online {
            return;
        }
        Self::transition(&mut inner, Status::OfflinePending);

        let weak_inner = Arc::clone(&self.inner);
        let grace_period = self.grace_period;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(grace_period).await;
            let mut inner = weak_inner.lock().unwrap();
            if inner.status == Status::OfflinePending {
                Self::transition(&mut inner, Status::Offline);
            }
        });
        inner.pending_timer = Some(timer);
    }

    fn transition(inner: &mut Inner, new_status: Status) {
        if inner.status == new_status {
            return;
        }
        inner.status = new_status;
        for listener in &inner.listeners {
            listener(new_status);
        }
    }
}
