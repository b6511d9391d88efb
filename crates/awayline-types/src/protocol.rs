//! Vocabulary shared with the messaging-protocol client.
//!
//! The protocol implementation itself lives outside this workspace; these
//! types are the normalized shape of its connection lifecycle and inbound
//! traffic as seen by the session adapter.

use serde::{Deserialize, Serialize};

/// Classification of the conversation an inbound message arrived on.
///
/// The protocol layer performs the classification; the policy engine only
/// ever auto-replies on `Direct` conversations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    /// One-on-one conversation.
    Direct,
    /// Multi-party group chat.
    Group,
    /// Status or broadcast channel traffic.
    Broadcast,
}

/// An inbound message, normalized by the protocol layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Protocol-level conversation identifier; also the reply target.
    pub conversation_id: String,
    pub chat: ChatKind,
    pub body: String,
    /// True when the account owner sent the message themselves.
    pub from_self: bool,
}

/// Sender details resolved for an inbound conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactInfo {
    /// Phone number or protocol handle of the sender.
    pub number: String,
    /// Whether the sender is already in the account's contact list.
    pub is_known_contact: bool,
}

/// Connection-lifecycle and traffic signals emitted by a protocol client.
///
/// Delivered per session through the typed event sink the client factory
/// hands out; delivery order matches emission order for a given session.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// A pairing payload is ready to be rendered and shown to the user.
    PairingCode { code: String },
    /// Pairing completed; the client is connected and receiving traffic.
    Ready,
    /// An inbound message arrived.
    Message(InboundMessage),
    /// The connection dropped.
    Disconnected { reason: String },
    /// The stored credentials were rejected.
    AuthFailed,
}
