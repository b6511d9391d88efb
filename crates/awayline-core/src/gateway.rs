//! Command facade over the store and the session orchestrator.
//!
//! The transport layer (HTTP handlers, realtime subscriptions) talks to
//! this one type. Construction is two-phase: the gateway exists as soon as
//! the store does, while the orchestrator -- which needs a protocol client
//! factory -- attaches later in boot. Store-only commands work throughout;
//! session commands before attachment fail with `NotInitialized` instead
//! of panicking.

use std::sync::Arc;

use awayline_types::activity::ActivityPage;
use awayline_types::error::GatewayError;
use awayline_types::event::GatewayEvent;
use awayline_types::session::SessionStatus;
use awayline_types::user::UserId;
use tokio::sync::{RwLock, broadcast};
use tracing::debug;

use crate::orchestrator::SessionOrchestrator;
use crate::protocol::{ClientFactory, PairingRenderer};
use crate::store::SessionStore;

pub struct Gateway<S, F, R>
where
    F: ClientFactory,
{
    store: Arc<S>,
    orchestrator: RwLock<Option<Arc<SessionOrchestrator<S, F, R>>>>,
}

impl<S, F, R> Gateway<S, F, R>
where
    S: SessionStore + 'static,
    F: ClientFactory,
    R: PairingRenderer + 'static,
{
    /// Create the facade with only store-backed commands available.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            orchestrator: RwLock::new(None),
        }
    }

    /// Attach the orchestrator, enabling session commands.
    pub async fn attach_orchestrator(&self, orchestrator: Arc<SessionOrchestrator<S, F, R>>) {
        let mut slot = self.orchestrator.write().await;
        *slot = Some(orchestrator);
        debug!("session orchestrator attached");
    }

    async fn orchestrator(&self) -> Result<Arc<SessionOrchestrator<S, F, R>>, GatewayError> {
        self.orchestrator
            .read()
            .await
            .clone()
            .ok_or(GatewayError::NotInitialized)
    }

    /// Start (or resume) the user's session.
    pub async fn start_session(&self, user_id: UserId) -> Result<(), GatewayError> {
        self.orchestrator().await?.start_session(user_id).await
    }

    /// Stop the user's session and mark it signed out.
    pub async fn stop_session(&self, user_id: UserId) -> Result<(), GatewayError> {
        self.orchestrator().await?.stop_session(user_id).await
    }

    /// Current session status, creating the row with defaults on first
    /// sight of a user.
    pub async fn status(&self, user_id: UserId) -> Result<SessionStatus, GatewayError> {
        let session = self.store.upsert_session_defaults(user_id).await?;
        Ok(session.status())
    }

    /// Replace the user's auto-reply text with its trimmed form.
    pub async fn update_message(&self, user_id: UserId, message: &str) -> Result<(), GatewayError> {
        self.store.set_auto_reply_message(user_id, message).await?;
        Ok(())
    }

    /// Flip the pause flag and return the new value.
    pub async fn toggle_pause(&self, user_id: UserId) -> Result<bool, GatewayError> {
        Ok(self.store.toggle_paused(user_id).await?)
    }

    /// One page of the user's auto-reply history, newest first.
    pub async fn activity(
        &self,
        user_id: UserId,
        page: u32,
        limit: u32,
    ) -> Result<ActivityPage, GatewayError> {
        Ok(self.store.list_activity(user_id, page, limit).await?)
    }

    /// The rendered pairing artifact for a still-pairing session.
    pub async fn pairing_artifact(&self, user_id: UserId) -> Result<Option<String>, GatewayError> {
        Ok(self.orchestrator().await?.pairing_artifact(user_id))
    }

    /// Whether the user has a live session right now.
    pub async fn is_running(&self, user_id: UserId) -> Result<bool, GatewayError> {
        Ok(self.orchestrator().await?.is_running(user_id))
    }

    /// Subscribe to session state-change events.
    pub async fn subscribe(&self) -> Result<broadcast::Receiver<GatewayEvent>, GatewayError> {
        Ok(self.orchestrator().await?.subscribe())
    }
}
