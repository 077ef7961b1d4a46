//! Cross-tab active-client tracking (§4.9): every client holds an
//! exclusive lock on its own name forever and watches peers' locks with a
//! `shared` request whose callback fires on release.
//!
//! The spec names two backends — an OS-level exclusive-lock-discovery
//! backend for real deployments and an in-process fallback — without
//! mandating a trait boundary between them. One is added here anyway:
//! lock acquisition is I/O-bound, not a hot path, the one case where a
//! `dyn` backend is worth the virtual-call cost rather than monomorphizing
//! per caller. Only the in-process backend ships in this pass; a real
//! OS-lock-file backend needs a lock-discovery crate (held + pending
//! queries across processes) this workspace doesn't otherwise depend on.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;

/// A named, process- or OS-level exclusive/shared lock space.
pub trait LockBackend: Send + Sync {
    /// Acquires (or re-acquires) an exclusive lock on `name`. The caller
    /// holds it until the process exits; there is no explicit release for
    /// a client's own lock (§4.9: "holds an exclusive lock on its own name
    /// forever").
    fn acquire_exclusive(&self, name: &str);

    /// Every lock name, held or pending, starting with `prefix`.
    fn list_peers(&self, prefix: &str) -> Vec<String>;

    /// Registers a `shared`-lock watch on `name`; `on_release` fires once,
    /// either immediately (if nothing holds `name`) or when the holder's
    /// exclusive lock is released.
    fn watch_release(&self, name: &str, on_release: Box<dyn FnOnce() + Send>);

    /// Releases a lock this backend holds (used by tests and by the
    /// fallback backend's own exclusive-lock owner on teardown).
    fn release_exclusive(&self, name: &str);
}

#[derive(Default)]
struct InProcessState {
    held: HashSet<String>,
    release_listeners: HashMap<String, Vec<Box<dyn FnOnce() + Send>>>,
}

/// A process-local set of lock records plus a delete-notification
/// mechanism, standing in for the OS backend within a single process
/// (§4.9 "Fallback backend").
#[derive(Clone, Default)]
pub struct InProcessLockBackend {
    state: Arc<Mutex<InProcessState>>,
}

impl InProcessLockBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LockBackend for InProcessLockBackend {
    fn acquire_exclusive(&self, name: &str) {
        self.state.lock().unwrap().held.insert(name.to_string());
    }

    fn list_peers(&self, prefix: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .held
            .iter()
            .filter(|name| name.starts_with(prefix))
            .cloned()
            .collect()
    }

    fn watch_release(&self, name: &str, on_release: Box<dyn FnOnce() + Send>) {
        let mut state = self.state.lock().unwrap();
        if !state.held.contains(name) {
            drop(state);
            on_release();
            return;
        }
        state
            .release_listeners
            .entry(name.to_string())
            .or_default()
            .push(on_release);
    }

    fn release_exclusive(&self, name: &str) {
        let listeners = {
            let mut state = self.state.lock().unwrap();
            state.held.remove(name);
            state.release_listeners.remove(name)
        };
        if let Some(listeners) = listeners {
            for listener in listeners {
                listener();
            }
        }
    }
}

/// Tracks this client plus every other live client in the same
/// `{prefix}/{groupId}` group. `clientId` is always a member of the
/// active set (§4.9 invariant); `onChange` fires only on transitions.
pub struct ActiveClientManager {
    backend: Arc<dyn LockBackend>,
    prefix: String,
    group_id: String,
    client_id: String,
    active: Arc<Mutex<HashSet<String>>>,
    announce: broadcast::Sender<String>,
}

impl ActiveClientManager {
    pub fn new(
        backend: Arc<dyn LockBackend>,
        prefix: impl Into<String>,
        group_id: impl Into<String>,
        client_id: impl Into<String>,
    ) -> Self {
        let prefix = prefix.into();
        let group_id = group_id.into();
        let client_id = client_id.into();
        let own_name = format!("{prefix}/{group_id}/{client_id}");
        backend.acquire_exclusive(&own_name);

        let mut active = HashSet::new();
        active.insert(client_id.clone());
        let group_prefix = format!("{prefix}/{group_id}/");
        for peer in backend.list_peers(&group_prefix) {
            if let Some(id) = peer.strip_prefix(&group_prefix) {
                active.insert(id.to_string());
            }
        }

        let (announce, _) = broadcast::channel(64);

        Self {
            backend,
            prefix,
            group_id,
            client_id,
            active: Arc::new(Mutex::new(active)),
            announce,
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn active_clients(&self) -> Vec<String> {
        self.active.lock().unwrap().iter().cloned().collect()
    }

    /// Announces this client on the group's broadcast channel so existing
    /// members start watching it (§4.9 "broadcast channel keyed by
    /// {prefix}/{groupId}") and starts watching every peer announced so
    /// far. A peer is marked inactive once its exclusive lock releases.
    pub fn announce_and_watch_peers(&self) {
        let own_name = format!("{}/{}/{}", self.prefix, self.group_id, self.client_id);
        let _ = self.announce.send(own_name);

        let group_prefix = format!("{}/{}/", self.prefix, self.group_id);
        for peer in self.backend.list_peers(&group_prefix) {
            if let Some(id) = peer.strip_prefix(&group_prefix) {
                if id != self.client_id {
                    self.watch_peer(id.to_string(), peer);
                }
            }
        }
    }

    fn watch_peer(&self, peer_id: String, peer_lock_name: String) {
        let active = Arc::clone(&self.active);
        self.backend.watch_release(
            &peer_lock_name,
            Box::new(move || {
                active.lock().unwrap().remove(&peer_id);
            }),
        );
    }

    pub fn subscribe_announcements(&self) -> broadcast::Receiver<String> {
        self.announce.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_id_is_always_in_the_active_set() {
        let backend = Arc::new(InProcessLockBackend::new());
        let mgr = ActiveClientManager::new(backend, "zero", "room1", "client-a");
        assert!(mgr.active_clients().contains(&"client-a".to_string()));
    }

    #[test]
    fn new_manager_discovers_existing_peers() {
        let backend = Arc::new(InProcessLockBackend::new());
        backend.acquire_exclusive("zero/room1/client-a");

        let mgr = ActiveClientManager::new(
            Arc::clone(&backend) as Arc<dyn LockBackend>,
            "zero",
            "room1",
            "client-b",
        );
        let active = mgr.active_clients();
        assert!(active.contains(&"client-a".to_string()));
        assert!(active.contains(&"client-b".to_string()));
    }

    #[test]
    fn peer_release_marks_it_inactive() {
        let backend = Arc::new(InProcessLockBackend::new());
        backend.acquire_exclusive("zero/room1/client-a");

        let mgr = ActiveClientManager::new(
            Arc::clone(&backend) as Arc<dyn LockBackend>,
            "zero",
            "room1",
            "client-b",
        );
        mgr.announce_and_watch_peers();
        assert!(mgr.active_clients().contains(&"client-a".to_string()));

        backend.release_exclusive("zero/room1/client-a");
        assert!(!mgr.active_clients().contains(&"client-a".to_string()));
    }

    #[test]
    fn watch_release_fires_immediately_for_an_already_released_lock() {
        let backend = InProcessLockBackend::new();
        let fired = Arc::new(Mutex::new(false));
        let flag = Arc::clone(&fired);
        backend.watch_release("zero/room1/ghost", Box::new(move || *flag.lock().unwrap() = true));
        assert!(*fired.lock().unwrap());
    }
}
