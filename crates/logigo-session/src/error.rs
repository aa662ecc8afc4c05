//! Error types for the session layer.

use logigo_gateway::GatewayError;

/// Errors that can occur while creating, renewing, or using a session.
///
/// None of these escape the lifecycle manager's tick loop: every failure
/// there ends in a user-facing notification. They are returned to direct
/// callers of [`renew`](crate::SessionLifecycleManager::renew) and of the
/// [`AuthClient`](crate::AuthClient) operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The store holds no access token.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The session reached its expiry (or was already torn down).
    #[error("session expired")]
    SessionExpired,

    /// The backend rejected the stored token (HTTP 401).
    #[error("unauthorized")]
    Unauthorized,

    /// The backend could not be reached or answered with an error.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Renewal did not complete within its time budget.
    #[error("renewal timed out")]
    Timeout,

    /// A renewal response arrived after the session it was meant for had
    /// been cleared or replaced; it was discarded without writing.
    #[error("renewal response discarded: session changed while it was in flight")]
    Superseded,

    /// The backend accepted the request but returned no usable token.
    #[error("backend returned no access token: {0}")]
    MissingToken(String),
}

impl SessionError {
    /// Maps a gateway error, turning a 401 into [`SessionError::Unauthorized`].
    pub(crate) fn from_gateway(err: GatewayError) -> Self {
        if err.is_unauthorized() {
            Self::Unauthorized
        } else {
            Self::Gateway(err)
        }
    }
}
