//! Delete orchestration: resolve, fan out deletes, drop metadata.
//!
//! Replica removal is best effort: a node that is down keeps its
//! stale copy and the metadata goes away regardless. The one guard is
//! total failure with replicas present, which leaves everything in
//! place so the caller can retry instead of stranding live bytes
//! without records.

use std::collections::HashMap;
use std::sync::Arc;

use scatterfs_client::NodeClient;

use crate::config::MetaConfig;
use crate::deletion::ParallelDeletion;
use crate::error::{MetaError, Result};
use crate::store::MetadataStore;
use crate::types::{FileId, NodeId, StorageNode};

/// What the caller learns about a completed delete.
#[derive(Clone, Debug)]
pub struct DeleteReceipt {
    /// Identifier of the removed file.
    pub file_id: FileId,
    /// Filename the record carried.
    pub filename: String,
}

/// Drives a file delete end to end.
pub struct DeleteOrchestrator {
    store: Arc<dyn MetadataStore>,
    deletion: ParallelDeletion,
}

impl DeleteOrchestrator {
    /// Creates an orchestrator over the given store and client.
    pub fn new(
        store: Arc<dyn MetadataStore>,
        client: Arc<dyn NodeClient>,
        config: MetaConfig,
    ) -> Self {
        let deletion = ParallelDeletion::new(client, config.deletion.clone());
        Self { store, deletion }
    }

    /// Removes a file: deletes its chunk replicas from their nodes,
    /// then drops the file and chunk records.
    ///
    /// Partial replica-removal failures are logged and tolerated. Only
    /// when replicas exist and not one could be removed is the delete
    /// rejected with metadata intact.
    pub async fn delete(&self, file_id: &str) -> Result<DeleteReceipt> {
        let file_id = FileId::parse(file_id)?;
        let file = self
            .store
            .find_file(file_id)
            .await?
            .ok_or_else(|| MetaError::not_found("file", file_id.to_string()))?;

        let chunks = self.store.chunks_for_file(file_id).await?;
        let directory = self.node_directory().await?;

        let outcomes = self.deletion.delete_all(&chunks, &directory).await;
        let removed = outcomes.iter().filter(|o| o.success).count();
        if removed == 0 && !outcomes.is_empty() {
            tracing::error!(file = %file_id, replicas = outcomes.len(), "no chunk replica could be removed");
            return Err(MetaError::DeleteRejected {
                file_id: file_id.to_string(),
            });
        }
        if removed < outcomes.len() {
            tracing::warn!(
                file = %file_id,
                removed,
                total = outcomes.len(),
                "some chunk replicas could not be removed"
            );
        }

        self.store.delete_file(file_id).await?;
        tracing::info!(file = %file_id, filename = %file.filename, "file deleted");
        Ok(DeleteReceipt {
            file_id,
            filename: file.filename,
        })
    }

    async fn node_directory(&self) -> Result<HashMap<NodeId, StorageNode>> {
        let nodes = self.store.list_nodes().await?;
        Ok(nodes.into_iter().map(|n| (n.id, n)).collect())
    }
}
