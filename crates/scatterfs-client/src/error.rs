//! Error types for storage-node client operations.

use thiserror::Error;

/// Errors that can occur when talking to a storage node.
///
/// Every variant is treated as transient by the callers that drive
/// chunk transfer and deletion: after retries are exhausted the
/// attempt resolves to a failed outcome instead of propagating.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The node answered with an error status.
    #[error("node returned HTTP {status} for {url}")]
    Http {
        /// HTTP status code returned by the node.
        status: u16,
        /// Request URL.
        url: String,
    },

    /// The request did not complete within the attempt timeout.
    #[error("request to {url} timed out after {timeout_ms}ms")]
    Timeout {
        /// Request URL.
        url: String,
        /// Attempt timeout in milliseconds.
        timeout_ms: u64,
    },

    /// Connection-level failure (refused, reset, DNS, ...).
    #[error("network error for {url}: {msg}")]
    Network {
        /// Request URL.
        url: String,
        /// Underlying error message.
        msg: String,
    },

    /// The request could not be built or encoded.
    #[error("invalid request: {msg}")]
    InvalidRequest {
        /// Description of the malformed request.
        msg: String,
    },
}

/// Result alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
