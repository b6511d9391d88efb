//! Keyed registry of live session handles.
//!
//! Process-local state owned by the orchestrator: one `LiveHandle` per
//! connected user plus the most recent rendered pairing artifact. Nothing
//! here is persisted; the registry empties on process exit and is rebuilt
//! by startup reconciliation.

use std::sync::Arc;

use awayline_types::user::UserId;
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

/// A running session's process-local state.
///
/// Dropping the handle does not tear the session down; callers cancel the
/// drive task and destroy the client explicitly where the lifecycle
/// requires it.
pub struct LiveHandle<C> {
    /// The protocol client driving this session.
    pub client: Arc<C>,
    /// Cancels the session's drive task.
    pub cancel: CancellationToken,
}

impl<C> Clone for LiveHandle<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            cancel: self.cancel.clone(),
        }
    }
}

/// Keyed registry of live handles and cached pairing artifacts.
///
/// DashMap gives per-entry locking, so concurrent sessions never contend
/// with each other. The pairing artifact lives beside the handle and dies
/// with it: `remove` discards both, so a disconnected user can never be
/// served a stale code.
pub struct SessionRegistry<C> {
    handles: DashMap<UserId, LiveHandle<C>>,
    artifacts: DashMap<UserId, String>,
}

impl<C> SessionRegistry<C> {
    pub fn new() -> Self {
        Self {
            handles: DashMap::new(),
            artifacts: DashMap::new(),
        }
    }

    /// Register a handle for `user_id`, replacing any previous one.
    pub fn insert(&self, user_id: UserId, handle: LiveHandle<C>) {
        self.handles.insert(user_id, handle);
    }

    /// Remove and return the handle, discarding any cached artifact.
    pub fn remove(&self, user_id: UserId) -> Option<LiveHandle<C>> {
        self.artifacts.remove(&user_id);
        self.handles.remove(&user_id).map(|(_, handle)| handle)
    }

    /// The client behind a live handle, if one is registered.
    pub fn client(&self, user_id: UserId) -> Option<Arc<C>> {
        self.handles.get(&user_id).map(|h| Arc::clone(&h.client))
    }

    /// Whether a live handle is registered for this user.
    pub fn is_running(&self, user_id: UserId) -> bool {
        self.handles.contains_key(&user_id)
    }

    /// Number of live handles.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Users with a live handle right now.
    pub fn user_ids(&self) -> Vec<UserId> {
        self.handles.iter().map(|entry| *entry.key()).collect()
    }

    /// Cache the rendered pairing artifact for this user.
    pub fn set_artifact(&self, user_id: UserId, artifact: String) {
        self.artifacts.insert(user_id, artifact);
    }

    /// The last rendered pairing artifact, if the session is still pairing.
    pub fn artifact(&self, user_id: UserId) -> Option<String> {
        self.artifacts.get(&user_id).map(|a| a.value().clone())
    }

    /// Drop the cached artifact, e.g. once the session is ready.
    pub fn clear_artifact(&self, user_id: UserId) {
        self.artifacts.remove(&user_id);
    }
}

impl<C> Default for SessionRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> std::fmt::Debug for SessionRegistry<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("handles", &self.handles.len())
            .field("artifacts", &self.artifacts.len())
            .finish()
    }
}
