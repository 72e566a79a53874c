//! Upload orchestration: validate, divide, place, transfer, record.
//!
//! Metadata is written ahead of the transfer, so a crash or partial
//! distribution leaves chunk records with thin replica sets that the
//! under-replication query can find later. The one check that runs
//! before any write is node availability: with zero healthy nodes the
//! upload is refused outright and nothing is persisted.

use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;

use scatterfs_client::NodeClient;

use crate::config::MetaConfig;
use crate::divider::{divide, ChunkPayload};
use crate::error::{MetaError, Result};
use crate::health::NodeHealthRegistry;
use crate::placement::round_robin;
use crate::replication::target_replication_factor;
use crate::store::MetadataStore;
use crate::transfer::ParallelTransfer;
use crate::types::{ChunkRecord, FileId, FileRecord, StorageNode};

/// What the caller learns about a completed upload.
#[derive(Clone, Debug)]
pub struct UploadSummary {
    /// Identifier assigned to the stored file.
    pub file_id: FileId,
    /// Filename as supplied by the caller.
    pub filename: String,
    /// Total size in bytes.
    pub total_size: u64,
    /// Number of chunks the file was divided into.
    pub total_chunks: u32,
    /// Replication factor the placement targeted.
    pub replication_factor: u32,
}

/// Drives a file upload end to end.
pub struct UploadOrchestrator {
    store: Arc<dyn MetadataStore>,
    registry: Arc<NodeHealthRegistry>,
    transfer: ParallelTransfer,
    config: MetaConfig,
}

impl UploadOrchestrator {
    /// Creates an orchestrator over the given store, registry and client.
    pub fn new(
        store: Arc<dyn MetadataStore>,
        registry: Arc<NodeHealthRegistry>,
        client: Arc<dyn NodeClient>,
        config: MetaConfig,
    ) -> Self {
        let transfer = ParallelTransfer::new(client, config.transfer.clone());
        Self {
            store,
            registry,
            transfer,
            config,
        }
    }

    /// Stores a file: divides the stream into chunks, replicates them
    /// across healthy nodes and records the resulting metadata.
    ///
    /// `declared_hash` is the caller's hex content hash of the whole
    /// stream; it is recomputed here and compared case-insensitively.
    /// Fails without persisting anything when validation fails, the
    /// hash does not match, or no healthy node exists. Fails with the
    /// write-ahead metadata left in place when any chunk ends the
    /// transfer without a single replica.
    pub async fn upload<R: Read>(
        &self,
        filename: &str,
        declared_hash: &str,
        total_size: u64,
        reader: R,
    ) -> Result<UploadSummary> {
        let filename = filename.trim();
        if filename.is_empty() {
            return Err(MetaError::validation("filename is blank"));
        }
        let declared_hash = declared_hash.trim();
        if declared_hash.is_empty() {
            return Err(MetaError::validation("content hash is blank"));
        }

        // Refuse before any metadata write so a dead cluster leaves
        // no orphaned records behind.
        let candidates = self.healthy_nodes().await?;

        let mut file = FileRecord::new(filename, declared_hash, total_size);
        let payloads = divide(&mut file, reader, &self.config.chunking)?;

        // The declared size drove chunk sizing; the stream must agree
        // with it or the persisted record would contradict its chunks.
        let bytes_read: u64 = payloads.iter().map(|p| p.record.size).sum();
        if bytes_read != total_size {
            tracing::warn!(filename, declared = total_size, bytes_read, "size mismatch");
            return Err(MetaError::validation(format!(
                "declared size {total_size} does not match stream length {bytes_read}"
            )));
        }

        let computed = whole_file_hash(&payloads);
        if !computed.eq_ignore_ascii_case(declared_hash) {
            tracing::warn!(filename, declared = declared_hash, computed, "content hash mismatch");
            return Err(MetaError::HashMismatch {
                declared: declared_hash.to_string(),
                computed,
            });
        }

        // Write-ahead: records exist before any byte leaves, replica
        // sets still empty.
        self.store.save_file(&file).await?;
        let records: Vec<ChunkRecord> = payloads.iter().map(|p| p.record.clone()).collect();
        self.store.save_chunks(&records).await?;

        let factor = target_replication_factor(candidates.len() as u32, &self.config.replication);
        let summary = UploadSummary {
            file_id: file.id,
            filename: file.filename.clone(),
            total_size: file.total_size,
            total_chunks: file.total_chunks,
            replication_factor: factor,
        };

        if payloads.is_empty() {
            tracing::info!(file = %file.id, "empty file stored without chunks");
            return Ok(summary);
        }

        let assignments = round_robin(&candidates, file.total_chunks, factor)?;
        let chunk_map: HashMap<u32, ChunkPayload> = payloads
            .into_iter()
            .map(|p| (p.record.index, p))
            .collect();
        let outcomes = self.transfer.send_all(&chunk_map, &assignments).await;

        let mut by_index: HashMap<u32, ChunkRecord> =
            records.into_iter().map(|r| (r.index, r)).collect();
        for outcome in &outcomes {
            if outcome.success {
                if let Some(record) = by_index.get_mut(&outcome.chunk_index) {
                    record.replicas.insert(outcome.node_id);
                }
            }
        }
        let mut updated: Vec<ChunkRecord> = by_index.into_values().collect();
        updated.sort_by_key(|c| c.index);
        self.store.save_chunks(&updated).await?;

        let failed_chunks = updated.iter().filter(|c| !c.is_stored()).count();
        if failed_chunks > 0 {
            tracing::error!(
                file = %file.id,
                failed_chunks,
                "upload left chunks without any replica"
            );
            return Err(MetaError::DistributionFailed {
                file_id: file.id.to_string(),
                failed_chunks,
            });
        }

        tracing::info!(
            file = %file.id,
            filename = %file.filename,
            chunks = file.total_chunks,
            factor,
            "file stored"
        );
        Ok(summary)
    }

    async fn healthy_nodes(&self) -> Result<Vec<StorageNode>> {
        let nodes = self.store.list_nodes().await?;
        let healthy: Vec<StorageNode> = nodes
            .into_iter()
            .filter(|n| self.registry.is_healthy(n.id))
            .collect();
        if healthy.is_empty() {
            return Err(MetaError::NoHealthyNodes);
        }
        Ok(healthy)
    }
}

fn whole_file_hash(payloads: &[ChunkPayload]) -> String {
    let mut hasher = blake3::Hasher::new();
    for payload in payloads {
        hasher.update(&payload.data);
    }
    hasher.finalize().to_hex().to_string()
}
