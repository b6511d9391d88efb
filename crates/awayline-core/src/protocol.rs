//! Protocol-client port definitions.
//!
//! The messaging protocol implementation lives outside this workspace. The
//! orchestrator only ever sees these traits: a factory that builds one
//! client per user, the client's command surface, and a renderer that turns
//! raw pairing payloads into something a dashboard can display.

use awayline_types::error::{GatewayError, ProtocolError};
use awayline_types::protocol::{ClientEvent, ContactInfo};
use awayline_types::user::UserId;
use tokio::sync::mpsc;

/// Command surface of a connecting or connected protocol client.
pub trait ProtocolClient: Send + Sync {
    /// Open the connection. Pairing and readiness arrive later as events on
    /// the client's event stream; this only kicks the handshake off.
    fn connect(&self) -> impl std::future::Future<Output = Result<(), ProtocolError>> + Send;

    /// Send `text` as a reply on the given conversation.
    fn send_reply(
        &self,
        conversation_id: &str,
        text: &str,
    ) -> impl std::future::Future<Output = Result<(), ProtocolError>> + Send;

    /// Resolve sender details for a conversation.
    fn contact_info(
        &self,
        conversation_id: &str,
    ) -> impl std::future::Future<Output = Result<ContactInfo, ProtocolError>> + Send;

    /// Tear the connection down and release client resources.
    fn destroy(&self) -> impl std::future::Future<Output = Result<(), ProtocolError>> + Send;
}

/// Builds one protocol client per user.
///
/// The factory binds each client to the user's durable credential
/// namespace, so a rebuilt client resumes a previously paired identity
/// instead of pairing from scratch. Events flow back through the returned
/// receiver, which exactly one drive task consumes; the protocol layer
/// guarantees per-session serial delivery and the single receiver
/// preserves it.
pub trait ClientFactory: Send + Sync {
    type Client: ProtocolClient + 'static;

    fn build(
        &self,
        user_id: UserId,
    ) -> impl std::future::Future<
        Output = Result<(Self::Client, mpsc::Receiver<ClientEvent>), ProtocolError>,
    > + Send;
}

/// Renders a raw pairing payload into a transmissible artifact.
///
/// Defined in awayline-core so the adapter can render without coupling to a
/// specific encoding. The `SvgQrRenderer` adapter lives in awayline-infra.
pub trait PairingRenderer: Send + Sync {
    /// Encode `code` for display, e.g. as an SVG QR data URL.
    fn render(&self, code: &str) -> Result<String, GatewayError>;
}
