//! Event types for the Awayline broadcast bus.
//!
//! `GatewayEvent` is the unified event type fanned out to subscribed
//! dashboard clients. All variants are Clone + Send + Sync for use with
//! tokio broadcast channels.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::user::UserId;

/// Payload of an `Activity` event as shown live on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityBroadcast {
    /// Phone number or protocol handle of the replied-to sender.
    pub sender_id: String,
    pub received_text: String,
    pub replied_text: String,
    pub timestamp: DateTime<Utc>,
}

/// Session state changes fanned out to subscribed dashboard clients.
///
/// Every variant belongs to exactly one user; the realtime layer routes a
/// frame named `channel()` with body `payload()` to that user's
/// subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GatewayEvent {
    /// A pairing artifact was rendered and is ready to scan.
    PairingReady { user_id: UserId, artifact: String },

    /// The session finished pairing and is live.
    Connected { user_id: UserId },

    /// The session's connection dropped.
    Disconnected { user_id: UserId, reason: String },

    /// The session's stored credentials were rejected.
    AuthFailure { user_id: UserId },

    /// An auto-reply was sent on the user's behalf.
    Activity {
        user_id: UserId,
        activity: ActivityBroadcast,
    },
}

impl GatewayEvent {
    /// The user this event belongs to.
    pub fn user_id(&self) -> UserId {
        match self {
            GatewayEvent::PairingReady { user_id, .. }
            | GatewayEvent::Connected { user_id }
            | GatewayEvent::Disconnected { user_id, .. }
            | GatewayEvent::AuthFailure { user_id }
            | GatewayEvent::Activity { user_id, .. } => *user_id,
        }
    }

    /// Per-user channel name the realtime layer emits on, e.g. `qr_7`.
    pub fn channel(&self) -> String {
        match self {
            GatewayEvent::PairingReady { user_id, .. } => format!("qr_{user_id}"),
            GatewayEvent::Connected { user_id } => format!("ready_{user_id}"),
            GatewayEvent::Disconnected { user_id, .. } => format!("disconnected_{user_id}"),
            GatewayEvent::AuthFailure { user_id } => format!("auth_failure_{user_id}"),
            GatewayEvent::Activity { user_id, .. } => format!("activity_{user_id}"),
        }
    }

    /// JSON body of the channel frame.
    ///
    /// `PairingReady` carries the bare artifact string (the dashboard drops
    /// it straight into an image tag); the rest are small objects.
    pub fn payload(&self) -> Value {
        match self {
            GatewayEvent::PairingReady { artifact, .. } => Value::String(artifact.clone()),
            GatewayEvent::Connected { .. } => json!({ "status": "connected" }),
            GatewayEvent::Disconnected { reason, .. } => json!({ "reason": reason }),
            GatewayEvent::AuthFailure { .. } => json!({ "error": "Authentication failed" }),
            GatewayEvent::Activity { activity, .. } => json!({
                "senderId": activity.sender_id,
                "receivedText": activity.received_text,
                "repliedText": activity.replied_text,
                "timestamp": activity.timestamp,
            }),
        }
    }
}
