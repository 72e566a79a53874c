//! Error taxonomy for the metadata plane.
//!
//! Transient wire failures never appear here: chunk send/delete/probe
//! errors are absorbed inside the batch components and folded into
//! per-attempt boolean outcomes. Everything that does reach a caller
//! is a distinct, named failure the boundary layer can map to a
//! response.

use thiserror::Error;

/// Errors surfaced by metadata-plane operations.
#[derive(Debug, Error)]
pub enum MetaError {
    /// Malformed or missing caller input.
    #[error("validation failed: {msg}")]
    Validation {
        /// What was wrong with the input.
        msg: String,
    },

    /// A referenced record does not exist.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Record kind ("file", "chunk", "node").
        kind: &'static str,
        /// Identifier that failed to resolve.
        id: String,
    },

    /// Computed content hash differs from the caller-declared hash.
    #[error("content hash mismatch: declared {declared}, computed {computed}")]
    HashMismatch {
        /// Hash declared by the caller.
        declared: String,
        /// Hash computed over the received bytes.
        computed: String,
    },

    /// No healthy storage node is available for placement.
    #[error("no healthy storage nodes available")]
    NoHealthyNodes,

    /// One or more chunks ended an upload with zero surviving replicas.
    #[error("distribution failed for file {file_id}: {failed_chunks} chunk(s) have no replica")]
    DistributionFailed {
        /// The file whose upload failed.
        file_id: String,
        /// Number of chunks left without any replica.
        failed_chunks: usize,
    },

    /// A delete removed zero replicas anywhere; metadata left untouched.
    #[error("delete rejected for file {file_id}: no chunk replica could be removed")]
    DeleteRejected {
        /// The file whose delete was rejected.
        file_id: String,
    },

    /// A node with this address is already registered and healthy.
    #[error("storage node {host}:{port} is already registered")]
    NodeAlreadyRegistered {
        /// Host of the duplicate registration.
        host: String,
        /// Port of the duplicate registration.
        port: u16,
    },

    /// The source byte stream could not be fully read.
    #[error("storage I/O error")]
    Io(#[from] std::io::Error),

    /// Anything uncategorized; carries no internal detail outward.
    #[error("internal error: {msg}")]
    Internal {
        /// Short description for logs.
        msg: String,
    },
}

impl MetaError {
    /// Convenience constructor for validation failures.
    pub fn validation(msg: impl Into<String>) -> Self {
        MetaError::Validation { msg: msg.into() }
    }

    /// Convenience constructor for not-found failures.
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        MetaError::NotFound {
            kind,
            id: id.into(),
        }
    }
}

/// Result alias for metadata-plane operations.
pub type Result<T> = std::result::Result<T, MetaError>;
