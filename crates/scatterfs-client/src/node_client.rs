//! Async client for the storage-node endpoints.
//!
//! The `NodeClient` trait is the seam between coordination logic and
//! the wire: orchestration code (transfer, deletion, health probes)
//! only ever sees this trait, so tests substitute a scripted
//! implementation and never open a socket.

use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

use crate::error::{ClientError, Result};
use crate::wire::{ChunkDeleteRequest, ChunkUploadRequest, NodeAddr};

/// Operations the metadata plane performs against a single storage node.
#[async_trait]
pub trait NodeClient: Send + Sync {
    /// Sends one chunk payload plus its identifying metadata.
    async fn upload_chunk(
        &self,
        node: &NodeAddr,
        request: &ChunkUploadRequest,
        payload: Bytes,
    ) -> Result<()>;

    /// Asks the node to drop its replica of one chunk.
    async fn delete_chunk(&self, node: &NodeAddr, request: &ChunkDeleteRequest) -> Result<()>;

    /// Probes the node's health endpoint. Ok means a non-error status.
    async fn check_health(&self, node: &NodeAddr, path: &str) -> Result<()>;
}

/// HTTP implementation of [`NodeClient`] backed by `reqwest`.
pub struct HttpNodeClient {
    client: reqwest::Client,
}

impl HttpNodeClient {
    /// Creates a client with the given connect timeout.
    ///
    /// Per-attempt timeouts are enforced by the callers around whole
    /// requests; the connect timeout only bounds socket establishment.
    pub fn new(connect_timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .unwrap_or_default();
        Self { client }
    }

    fn map_error(url: &str, e: reqwest::Error) -> ClientError {
        if e.is_builder() {
            ClientError::InvalidRequest { msg: e.to_string() }
        } else if e.is_timeout() {
            ClientError::Timeout {
                url: url.to_string(),
                timeout_ms: 0,
            }
        } else {
            ClientError::Network {
                url: url.to_string(),
                msg: e.to_string(),
            }
        }
    }

    fn check_status(url: &str, response: &reqwest::Response) -> Result<()> {
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(ClientError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(())
    }
}

impl Default for HttpNodeClient {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

#[async_trait]
impl NodeClient for HttpNodeClient {
    async fn upload_chunk(
        &self,
        node: &NodeAddr,
        request: &ChunkUploadRequest,
        payload: Bytes,
    ) -> Result<()> {
        let url = node.upload_url();

        let part = reqwest::multipart::Part::bytes(payload.to_vec())
            .file_name(request.chunk_id.to_string());
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("chunkId", request.chunk_id.to_string())
            .text("fileId", request.file_id.to_string())
            .text("chunkIndex", request.chunk_index.to_string())
            .text("hash", request.chunk_hash.clone());

        tracing::debug!(chunk = %request.chunk_id, node = %node, "sending chunk");
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Self::map_error(&url, e))?;
        Self::check_status(&url, &response)
    }

    async fn delete_chunk(&self, node: &NodeAddr, request: &ChunkDeleteRequest) -> Result<()> {
        let url = node.delete_url();

        tracing::debug!(chunk = %request.chunk_id, node = %node, "sending chunk delete");
        let response = self
            .client
            .delete(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| Self::map_error(&url, e))?;
        Self::check_status(&url, &response)
    }

    async fn check_health(&self, node: &NodeAddr, path: &str) -> Result<()> {
        let url = node.health_url(path);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Self::map_error(&url, e))?;
        Self::check_status(&url, &response)
    }
}
