//! Port Interfaces
//!
//! Defines the interface (port) for the authenticated streaming transport
//! following the Hexagonal Architecture pattern. The concrete transport —
//! request signing and the HTTP client that issues the streaming POST —
//! lives outside this crate; the connection supervisor only needs a way to
//! turn a parameter snapshot into a readable byte stream.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use crate::domain::filter::FilterParams;

// =============================================================================
// Error Type
// =============================================================================

/// Errors surfaced by the streaming transport.
///
/// All variants are recoverable: the supervisor reports them through a
/// reconnect notification and retries, it never propagates them as a fault.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// The connection request could not be issued or completed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The server answered with a non-success status.
    #[error("server returned status {status}: {message}")]
    Status {
        /// HTTP status code from the server.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },

    /// The byte stream ended without the client closing it.
    #[error("stream ended unexpectedly")]
    StreamEnded,

    /// No bytes arrived within the stall timeout.
    #[error("stream stalled: no data for {0:?}")]
    Stalled(Duration),
}

impl TransportError {
    /// Check if this failure indicates bad credentials rather than a
    /// generic transport problem.
    #[must_use]
    pub const fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::Status {
                status: 401 | 403,
                ..
            }
        )
    }
}

// =============================================================================
// Transport Port
// =============================================================================

/// A readable stream of byte chunks with arbitrary, non-aligned boundaries.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// Outbound port for opening an authenticated streaming connection.
///
/// Implementations issue the signed streaming request with the three
/// parameter fields and return the response body as a chunked byte stream.
/// Dropping the returned stream must release the underlying connection.
#[async_trait]
pub trait StreamTransport: Send + Sync {
    /// Open a streaming connection for the given parameter snapshot.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the request cannot be issued or the
    /// server answers with a non-success status.
    async fn open(&self, params: &FilterParams) -> Result<ByteStream, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failure_detection() {
        let unauthorized = TransportError::Status {
            status: 401,
            message: "Unauthorized".to_string(),
        };
        assert!(unauthorized.is_auth_failure());

        let rate_limited = TransportError::Status {
            status: 420,
            message: "Enhance Your Calm".to_string(),
        };
        assert!(!rate_limited.is_auth_failure());

        assert!(!TransportError::StreamEnded.is_auth_failure());
    }

    #[test]
    fn error_display_carries_status() {
        let err = TransportError::Status {
            status: 401,
            message: "Unauthorized".to_string(),
        };
        assert!(err.to_string().contains("401"));
    }
}
