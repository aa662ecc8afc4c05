use logigo_protocol::ProtocolError;

/// Errors that can occur while talking to the backend.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The request never got an HTTP answer (DNS, refused, TLS, reset).
    #[error("network error: {0}")]
    Network(String),

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The backend answered with a non-2xx status.
    ///
    /// `message` is the backend's `{ "error": ... }` text when present,
    /// otherwise the canonical reason phrase.
    #[error("backend returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The body could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The configured base URL cannot be used to build endpoint URLs.
    #[error("invalid base url: {0}")]
    InvalidUrl(String),
}

impl GatewayError {
    /// `true` for a 401 reply, i.e. the bearer token was rejected.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status: 401, .. })
    }

    /// `true` when the backend was never reached or never answered.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_unauthorized_only_for_401() {
        let unauthorized = GatewayError::Status {
            status: 401,
            message: "Unauthorized".into(),
        };
        let forbidden = GatewayError::Status {
            status: 403,
            message: "Forbidden".into(),
        };
        assert!(unauthorized.is_unauthorized());
        assert!(!forbidden.is_unauthorized());
        assert!(!GatewayError::Timeout.is_unauthorized());
    }

    #[test]
    fn test_is_transient() {
        assert!(GatewayError::Timeout.is_transient());
        assert!(GatewayError::Network("refused".into()).is_transient());
        assert!(
            !GatewayError::Status {
                status: 500,
                message: "boom".into()
            }
            .is_transient()
        );
    }

    #[test]
    fn test_status_display_includes_backend_message() {
        let err = GatewayError::Status {
            status: 422,
            message: "Token inválido".into(),
        };
        assert_eq!(err.to_string(), "backend returned 422: Token inválido");
    }
}
