#![warn(missing_docs)]

//! ScatterFS storage-node client: wire contract, HTTP transport, retry with backoff

pub mod error;
pub mod node_client;
pub mod retry;
pub mod wire;

pub use error::{ClientError, Result};
pub use node_client::{HttpNodeClient, NodeClient};
pub use retry::{RetryConfig, RetryExecutor, RetryOutcome};
pub use wire::{ChunkDeleteRequest, ChunkUploadRequest, NodeAddr};
