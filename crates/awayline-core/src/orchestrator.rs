//! Session lifecycle orchestrator.
//!
//! Owns one live protocol client per user: builds them through the
//! [`ClientFactory`], registers them in the [`SessionRegistry`], spawns a
//! drive task per session, and reconciles the registry with the store at
//! startup. All multi-tenant state lives here; the drive tasks and the
//! policy engine only ever see one user at a time.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use awayline_types::config::GatewayConfig;
use awayline_types::error::{GatewayError, StoreError};
use awayline_types::event::GatewayEvent;
use awayline_types::user::UserId;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::adapter::{AdapterContext, drive_session};
use crate::broadcast::EventBroadcaster;
use crate::policy::ReplyPolicy;
use crate::protocol::{ClientFactory, PairingRenderer, ProtocolClient};
use crate::registry::{LiveHandle, SessionRegistry};
use crate::store::SessionStore;

/// Multi-tenant session supervisor.
///
/// Generic over the store, the client factory, and the pairing renderer so
/// the whole lifecycle is testable without a real protocol connection.
pub struct SessionOrchestrator<S, F, R>
where
    F: ClientFactory,
{
    store: Arc<S>,
    factory: F,
    renderer: Arc<R>,
    policy: Arc<ReplyPolicy<S>>,
    broadcaster: EventBroadcaster,
    registry: Arc<SessionRegistry<F::Client>>,
    /// Per-user mutex serializing start/stop so concurrent callers cannot
    /// race two clients into existence for one user.
    start_locks: DashMap<UserId, Arc<tokio::sync::Mutex<()>>>,
    /// Set once the startup sweep has run (or is running).
    reconciled: AtomicBool,
    config: GatewayConfig,
}

impl<S, F, R> SessionOrchestrator<S, F, R>
where
    S: SessionStore + 'static,
    F: ClientFactory,
    R: PairingRenderer + 'static,
{
    pub fn new(store: Arc<S>, factory: F, renderer: R, config: GatewayConfig) -> Self {
        let broadcaster = EventBroadcaster::new(config.event_capacity);
        let policy = Arc::new(ReplyPolicy::new(Arc::clone(&store), broadcaster.clone()));
        Self {
            store,
            factory,
            renderer: Arc::new(renderer),
            policy,
            broadcaster,
            registry: Arc::new(SessionRegistry::new()),
            start_locks: DashMap::new(),
            reconciled: AtomicBool::new(false),
            config,
        }
    }

    fn user_lock(&self, user_id: UserId) -> Arc<tokio::sync::Mutex<()>> {
        self.start_locks
            .entry(user_id)
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Start (or resume) the user's session.
    ///
    /// Idempotent while a session is live. On failure the half-built
    /// session is fully unwound before the error surfaces, so the caller
    /// may simply retry.
    pub async fn start_session(&self, user_id: UserId) -> Result<(), GatewayError> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        if self.registry.is_running(user_id) {
            debug!(user_id = %user_id, "session already running");
            return Ok(());
        }

        info!(user_id = %user_id, "starting session");
        let (client, events) = self
            .factory
            .build(user_id)
            .await
            .map_err(|err| GatewayError::Connection(err.to_string()))?;
        let client = Arc::new(client);
        let cancel = CancellationToken::new();

        // Register before connecting: pairing events can arrive the moment
        // the handshake starts, and the drive task resolves artifacts
        // through the registry.
        self.registry.insert(
            user_id,
            LiveHandle {
                client: Arc::clone(&client),
                cancel: cancel.clone(),
            },
        );
        tokio::spawn(drive_session(
            events,
            AdapterContext {
                user_id,
                store: Arc::clone(&self.store),
                registry: Arc::clone(&self.registry),
                policy: Arc::clone(&self.policy),
                broadcaster: self.broadcaster.clone(),
                renderer: Arc::clone(&self.renderer),
                client: Arc::clone(&client),
                cancel: cancel.clone(),
                pairing_timeout: self.config.pairing.timeout(),
            },
        ));

        if let Err(err) = client.connect().await {
            // Unwind the half-built session before surfacing the failure.
            self.registry.remove(user_id);
            cancel.cancel();
            warn!(user_id = %user_id, error = %err, "session start failed");
            return Err(GatewayError::Connection(err.to_string()));
        }

        Ok(())
    }

    /// Stop the user's session: destroy the client, cancel its drive task,
    /// and mark the row inactive. Stopping a user with no live session is
    /// a no-op.
    pub async fn stop_session(&self, user_id: UserId) -> Result<(), GatewayError> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let Some(handle) = self.registry.remove(user_id) else {
            debug!(user_id = %user_id, "no live session to stop");
            return Ok(());
        };

        handle.cancel.cancel();
        if let Err(err) = handle.client.destroy().await {
            warn!(user_id = %user_id, error = %err, "client destroy failed");
        }
        self.store.set_active(user_id, false).await?;
        info!(user_id = %user_id, "session stopped");
        Ok(())
    }

    /// Reconnect every session still marked active in the store and return
    /// how many came back.
    ///
    /// Runs at most once per process; later calls return 0 without
    /// touching anything. A store outage retries the sweep under the
    /// configured backoff policy. Any other store error -- and an
    /// exhausted bounded policy -- gives up and re-arms the once-flag so a
    /// supervisor may invoke the sweep again.
    pub async fn initialize_existing_sessions(&self) -> Result<usize, GatewayError> {
        if self.reconciled.swap(true, Ordering::SeqCst) {
            debug!("startup reconciliation already ran");
            return Ok(0);
        }

        let mut attempt = 0u32;
        let user_ids = loop {
            attempt += 1;
            match self.store.list_active_sessions().await {
                Ok(ids) => break ids,
                Err(StoreError::Unavailable(reason)) => {
                    if !self.config.reconcile.should_retry(attempt) {
                        self.reconciled.store(false, Ordering::SeqCst);
                        warn!(attempt, "giving up on startup reconciliation");
                        return Err(StoreError::Unavailable(reason).into());
                    }
                    let delay = self.config.reconcile.delay_for(attempt);
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        reason = %reason,
                        "store unavailable, retrying startup reconciliation"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    self.reconciled.store(false, Ordering::SeqCst);
                    return Err(err.into());
                }
            }
        };

        let total = user_ids.len();
        let mut restored = 0usize;
        for user_id in user_ids {
            match self.start_session(user_id).await {
                Ok(()) => restored += 1,
                // One bad session must not block the rest of the sweep.
                Err(err) => {
                    warn!(user_id = %user_id, error = %err, "failed to restore session");
                }
            }
        }
        info!(restored, total, "startup reconciliation complete");
        Ok(restored)
    }

    /// Tear down every live session without touching the store.
    ///
    /// Process shutdown only: rows stay marked active so the next boot's
    /// reconciliation sweep reconnects them.
    pub async fn shutdown(&self) {
        let users = self.registry.user_ids();
        info!(count = users.len(), "shutting down live sessions");
        for user_id in users {
            if let Some(handle) = self.registry.remove(user_id) {
                handle.cancel.cancel();
                if let Err(err) = handle.client.destroy().await {
                    warn!(
                        user_id = %user_id,
                        error = %err,
                        "client destroy failed during shutdown"
                    );
                }
            }
        }
    }

    /// The last rendered pairing artifact for a still-pairing session.
    /// `None` once the session connects or drops.
    pub fn pairing_artifact(&self, user_id: UserId) -> Option<String> {
        self.registry.artifact(user_id)
    }

    /// Whether a live client is registered for this user.
    pub fn is_running(&self, user_id: UserId) -> bool {
        self.registry.is_running(user_id)
    }

    /// Number of live sessions.
    pub fn active_count(&self) -> usize {
        self.registry.len()
    }

    /// Subscribe to session state-change events.
    pub fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
        self.broadcaster.subscribe()
    }
}
