//! Unified error type for the LogiGo client.

use logigo_gateway::GatewayError;
use logigo_protocol::ProtocolError;
use logigo_session::SessionError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `logigo` facade you deal with this single error type
/// instead of importing errors from each sub-crate; `?` converts them.
#[derive(Debug, thiserror::Error)]
pub enum LogigoError {
    /// A payload could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The backend could not be reached or answered with an error.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// A session operation failed (not logged in, expired, rejected).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The session timer task panicked or was aborted.
    #[error("session timer task failed: {0}")]
    Timer(#[from] tokio::task::JoinError),
}
