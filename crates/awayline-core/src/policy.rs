//! Auto-reply policy engine.
//!
//! One entry point, [`ReplyPolicy::evaluate`], decides whether an inbound
//! message earns an auto-reply and, when it does, performs the fixed
//! reply/record/broadcast sequence. The drive task calls it once per
//! inbound message; everything else here is the skip ladder.

use std::sync::Arc;

use awayline_types::activity::NewActivityLog;
use awayline_types::error::GatewayError;
use awayline_types::event::{ActivityBroadcast, GatewayEvent};
use awayline_types::protocol::{ChatKind, ContactInfo, InboundMessage};
use awayline_types::user::UserId;
use chrono::Utc;
use tracing::{debug, info};

use crate::broadcast::EventBroadcaster;
use crate::protocol::ProtocolClient;
use crate::store::SessionStore;

/// Contact-based reply gate. Returns true when the sender should receive
/// an auto-reply.
pub type ReplyGate = fn(&ContactInfo) -> bool;

/// Default gate: reply only to senders outside the account's contact list.
pub fn unknown_contacts_only(contact: &ContactInfo) -> bool {
    !contact.is_known_contact
}

/// Why an inbound message was dropped before the contact gate ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Status or broadcast channel traffic.
    BroadcastChannel,
    /// The account owner sent the message themselves.
    OwnMessage,
    /// Group conversation.
    GroupChat,
    /// The user has no session row.
    NoSession,
    /// The session is paused.
    Paused,
}

/// Outcome of evaluating one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyOutcome {
    /// A reply was sent, recorded, and broadcast.
    Replied,
    /// The gate declined the sender.
    KnownSender,
    /// A structural or session-state check fired first.
    Skipped(SkipReason),
}

/// Decides whether an inbound message earns an auto-reply and performs the
/// reply/record/broadcast sequence when it does.
pub struct ReplyPolicy<S> {
    store: Arc<S>,
    broadcaster: EventBroadcaster,
    gate: ReplyGate,
}

impl<S: SessionStore> ReplyPolicy<S> {
    pub fn new(store: Arc<S>, broadcaster: EventBroadcaster) -> Self {
        Self {
            store,
            broadcaster,
            gate: unknown_contacts_only,
        }
    }

    /// Replace the default unknown-contacts gate.
    pub fn with_gate(mut self, gate: ReplyGate) -> Self {
        self.gate = gate;
        self
    }

    /// Evaluate one inbound message for `user_id`, replying through
    /// `client` when every check passes.
    ///
    /// Check order is fixed: structural skips, then session state, then
    /// the contact gate, then the send. The reply goes out before anything
    /// is recorded, so a failed send leaves no activity row and no
    /// broadcast behind.
    pub async fn evaluate<C: ProtocolClient>(
        &self,
        user_id: UserId,
        message: &InboundMessage,
        client: &C,
    ) -> Result<PolicyOutcome, GatewayError> {
        if message.chat == ChatKind::Broadcast {
            return Ok(PolicyOutcome::Skipped(SkipReason::BroadcastChannel));
        }
        if message.from_self {
            return Ok(PolicyOutcome::Skipped(SkipReason::OwnMessage));
        }
        if message.chat == ChatKind::Group {
            return Ok(PolicyOutcome::Skipped(SkipReason::GroupChat));
        }

        let Some(session) = self.store.get_session(user_id).await? else {
            return Ok(PolicyOutcome::Skipped(SkipReason::NoSession));
        };
        if session.is_paused {
            return Ok(PolicyOutcome::Skipped(SkipReason::Paused));
        }

        let contact = client.contact_info(&message.conversation_id).await?;
        if !(self.gate)(&contact) {
            debug!(user_id = %user_id, contact = %contact.number, "sender gated, not replying");
            return Ok(PolicyOutcome::KnownSender);
        }

        client
            .send_reply(&message.conversation_id, &session.auto_reply_message)
            .await?;
        info!(user_id = %user_id, contact = %contact.number, "auto-reply sent");

        self.store
            .append_activity(&NewActivityLog {
                user_id,
                contact_number: contact.number.clone(),
                message_received: message.body.clone(),
                replied_sent: session.auto_reply_message.clone(),
            })
            .await?;

        self.broadcaster.publish(GatewayEvent::Activity {
            user_id,
            activity: ActivityBroadcast {
                sender_id: contact.number,
                received_text: message.body.clone(),
                replied_text: session.auto_reply_message,
                timestamp: Utc::now(),
            },
        });

        Ok(PolicyOutcome::Replied)
    }
}
