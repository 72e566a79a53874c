//! Allocation lookup: where a file's chunks currently live.
//!
//! Read-only view used by download clients to fetch chunks straight
//! from the holding nodes. Replica addresses come from the node
//! directory at lookup time, so a node registered since the upload
//! resolves correctly and a deregistered one silently drops out.

use std::collections::HashMap;
use std::sync::Arc;

use scatterfs_client::NodeAddr;
use serde::Serialize;

use crate::error::{MetaError, Result};
use crate::store::MetadataStore;
use crate::types::{ChunkId, FileId, NodeId, StorageNode};

/// Where one chunk can be fetched from.
#[derive(Clone, Debug, Serialize)]
pub struct ChunkAllocation {
    /// Identifier of the chunk.
    pub chunk_id: ChunkId,
    /// 1-based index within the file.
    pub index: u32,
    /// Size in bytes.
    pub size: u64,
    /// Hex content hash for verification after fetch.
    pub hash: String,
    /// Addresses of nodes currently holding a replica.
    pub replicas: Vec<NodeAddr>,
}

/// Full fetch plan for a file, chunks ordered by index.
#[derive(Clone, Debug, Serialize)]
pub struct FileAllocations {
    /// Identifier of the file.
    pub file_id: FileId,
    /// Filename the record carries.
    pub filename: String,
    /// Hex content hash of the whole file.
    pub hash: String,
    /// Total size in bytes.
    pub total_size: u64,
    /// Per-chunk locations, ordered by chunk index.
    pub chunks: Vec<ChunkAllocation>,
}

/// Resolves files to the node addresses holding their chunks.
pub struct AllocationLookup {
    store: Arc<dyn MetadataStore>,
}

impl AllocationLookup {
    /// Creates a lookup over the given store.
    pub fn new(store: Arc<dyn MetadataStore>) -> Self {
        Self { store }
    }

    /// Returns the fetch plan for a file.
    ///
    /// Replicas on nodes absent from the directory are omitted; a
    /// chunk may therefore list fewer addresses than its record holds,
    /// or none at all. Callers decide whether an empty list is fatal.
    pub async fn allocations(&self, file_id: &str) -> Result<FileAllocations> {
        let file_id = FileId::parse(file_id)?;
        let file = self
            .store
            .find_file(file_id)
            .await?
            .ok_or_else(|| MetaError::not_found("file", file_id.to_string()))?;

        let directory: HashMap<NodeId, StorageNode> = self
            .store
            .list_nodes()
            .await?
            .into_iter()
            .map(|n| (n.id, n))
            .collect();

        let chunks = self
            .store
            .chunks_for_file(file_id)
            .await?
            .into_iter()
            .map(|chunk| {
                let mut replicas: Vec<NodeAddr> = chunk
                    .replicas
                    .iter()
                    .filter_map(|id| directory.get(id).map(|n| n.addr()))
                    .collect();
                replicas.sort_by(|a, b| (&a.host, a.port).cmp(&(&b.host, b.port)));
                ChunkAllocation {
                    chunk_id: chunk.id,
                    index: chunk.index,
                    size: chunk.size,
                    hash: chunk.hash,
                    replicas,
                }
            })
            .collect();

        Ok(FileAllocations {
            file_id,
            filename: file.filename,
            hash: file.hash,
            total_size: file.total_size,
            chunks,
        })
    }
}
