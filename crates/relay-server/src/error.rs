//! Server error types.

use thiserror::Error;

/// Errors raised while building or starting the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Could not bind the listen socket.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address that was requested.
        addr: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A CORS setting cannot be turned into a header value.
    #[error("invalid CORS configuration: {0}")]
    InvalidCors(String),
    /// The global metrics recorder could not be installed.
    #[error("failed to install metrics recorder: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_error_display() {
        let err = ServerError::Bind {
            addr: "0.0.0.0:1".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("0.0.0.0:1"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn invalid_cors_display() {
        let err = ServerError::InvalidCors("bad origin".into());
        assert_eq!(err.to_string(), "invalid CORS configuration: bad origin");
    }
}
