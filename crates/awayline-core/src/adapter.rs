//! Per-session event drive task.
//!
//! The orchestrator spawns one [`drive_session`] task per live session. The
//! task owns the receiving end of the client's event stream and turns
//! protocol signals into store writes, broadcasts, and policy evaluations.
//! Consuming from a single task preserves the per-session ordering the
//! protocol layer guarantees.

use std::sync::Arc;
use std::time::Duration;

use awayline_types::event::GatewayEvent;
use awayline_types::protocol::ClientEvent;
use awayline_types::user::UserId;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::broadcast::EventBroadcaster;
use crate::policy::ReplyPolicy;
use crate::protocol::{PairingRenderer, ProtocolClient};
use crate::registry::SessionRegistry;
use crate::store::SessionStore;

/// Everything one drive task needs, bundled so [`drive_session`] stays a
/// free function the orchestrator can spawn.
pub(crate) struct AdapterContext<S, C, R> {
    pub user_id: UserId,
    pub store: Arc<S>,
    pub registry: Arc<SessionRegistry<C>>,
    pub policy: Arc<ReplyPolicy<S>>,
    pub broadcaster: EventBroadcaster,
    pub renderer: Arc<R>,
    pub client: Arc<C>,
    pub cancel: CancellationToken,
    pub pairing_timeout: Option<Duration>,
}

/// Consume a session's event stream until cancellation or a terminal event.
///
/// The pairing deadline is armed from spawn and disarmed by the first
/// `Ready`; a session that never pairs is torn down when it fires.
pub(crate) async fn drive_session<S, C, R>(
    mut events: mpsc::Receiver<ClientEvent>,
    ctx: AdapterContext<S, C, R>,
) where
    S: SessionStore,
    C: ProtocolClient,
    R: PairingRenderer,
{
    let deadline = ctx.pairing_timeout.map(|timeout| Instant::now() + timeout);
    let mut ready = false;

    loop {
        tokio::select! {
            _ = ctx.cancel.cancelled() => {
                debug!(user_id = %ctx.user_id, "session drive task cancelled");
                return;
            }
            _ = pairing_deadline(deadline), if !ready => {
                expire_pairing(&ctx).await;
                return;
            }
            event = events.recv() => {
                let Some(event) = event else {
                    // The client dropped its sender without a Disconnected.
                    info!(user_id = %ctx.user_id, "event stream closed");
                    finish(&ctx, GatewayEvent::Disconnected {
                        user_id: ctx.user_id,
                        reason: "event stream closed".to_string(),
                    })
                    .await;
                    return;
                };

                match event {
                    ClientEvent::PairingCode { code } => match ctx.renderer.render(&code) {
                        Ok(artifact) => {
                            ctx.registry.set_artifact(ctx.user_id, artifact.clone());
                            ctx.broadcaster.publish(GatewayEvent::PairingReady {
                                user_id: ctx.user_id,
                                artifact,
                            });
                            info!(user_id = %ctx.user_id, "pairing artifact ready");
                        }
                        Err(err) => {
                            // The protocol retries pairing with fresh codes.
                            warn!(
                                user_id = %ctx.user_id,
                                error = %err,
                                "failed to render pairing artifact"
                            );
                        }
                    },
                    ClientEvent::Ready => {
                        ready = true;
                        if let Err(err) = ctx.store.set_active(ctx.user_id, true).await {
                            warn!(
                                user_id = %ctx.user_id,
                                error = %err,
                                "failed to mark session active"
                            );
                        }
                        ctx.registry.clear_artifact(ctx.user_id);
                        ctx.broadcaster
                            .publish(GatewayEvent::Connected { user_id: ctx.user_id });
                        info!(user_id = %ctx.user_id, "session connected");
                    }
                    ClientEvent::Message(message) => {
                        match ctx
                            .policy
                            .evaluate(ctx.user_id, &message, ctx.client.as_ref())
                            .await
                        {
                            Ok(outcome) => {
                                debug!(user_id = %ctx.user_id, ?outcome, "inbound message evaluated");
                            }
                            Err(err) => {
                                // The session stays up; only this reply is lost.
                                warn!(user_id = %ctx.user_id, error = %err, "auto-reply failed");
                            }
                        }
                    }
                    ClientEvent::Disconnected { reason } => {
                        info!(user_id = %ctx.user_id, reason = %reason, "session disconnected");
                        finish(&ctx, GatewayEvent::Disconnected {
                            user_id: ctx.user_id,
                            reason,
                        })
                        .await;
                        return;
                    }
                    ClientEvent::AuthFailed => {
                        warn!(user_id = %ctx.user_id, "authentication failed, clearing session");
                        finish(&ctx, GatewayEvent::AuthFailure { user_id: ctx.user_id }).await;
                        return;
                    }
                }
            }
        }
    }
}

async fn pairing_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}

/// Terminal cleanup: drop the handle, mark the row inactive, broadcast.
///
/// The client is not destroyed here; on a terminal event the transport is
/// already gone.
async fn finish<S, C, R>(ctx: &AdapterContext<S, C, R>, event: GatewayEvent)
where
    S: SessionStore,
{
    ctx.registry.remove(ctx.user_id);
    if let Err(err) = ctx.store.set_active(ctx.user_id, false).await {
        warn!(user_id = %ctx.user_id, error = %err, "failed to mark session inactive");
    }
    ctx.broadcaster.publish(event);
}

/// Tear down a session whose pairing window expired. Unlike terminal
/// events, the client here is still live and must be destroyed.
async fn expire_pairing<S, C, R>(ctx: &AdapterContext<S, C, R>)
where
    S: SessionStore,
    C: ProtocolClient,
{
    warn!(user_id = %ctx.user_id, "pairing window expired, tearing session down");
    ctx.registry.remove(ctx.user_id);
    if let Err(err) = ctx.client.destroy().await {
        warn!(user_id = %ctx.user_id, error = %err, "destroy after pairing timeout failed");
    }
    if let Err(err) = ctx.store.set_active(ctx.user_id, false).await {
        warn!(user_id = %ctx.user_id, error = %err, "failed to mark session inactive");
    }
    ctx.broadcaster.publish(GatewayEvent::Disconnected {
        user_id: ctx.user_id,
        reason: "pairing timed out".to_string(),
    });
}
