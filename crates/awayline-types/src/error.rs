use thiserror::Error;

/// Errors from session-store operations (used by trait definitions in
/// awayline-core).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached at all. Drives the startup
    /// reconciliation retry loop.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("record not found")]
    NotFound,

    /// Rejected before any write, e.g. an empty auto-reply message.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

/// Errors surfaced by the external messaging-protocol client.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("connect failed: {0}")]
    Connect(String),

    #[error("send failed: {0}")]
    Send(String),

    #[error("contact lookup failed: {0}")]
    ContactLookup(String),

    #[error("destroy failed: {0}")]
    Destroy(String),
}

/// Errors returned by gateway commands.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Session commands were invoked before the orchestrator was attached.
    #[error("session support not initialized")]
    NotInitialized,

    /// Starting a session failed; the half-built handle has been cleaned
    /// up and the caller may retry explicitly.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The pairing payload could not be rendered.
    #[error("pairing artifact error: {0}")]
    Pairing(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
