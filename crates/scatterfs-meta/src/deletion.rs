//! Parallel chunk deletion from storage nodes.
//!
//! The mirror image of transfer, keyed off each chunk's current
//! replica set instead of a fresh placement: every node a chunk record
//! claims to hold a copy on gets a delete request. Same semaphore
//! bound, retry discipline and batch deadline; every (chunk, node)
//! pair resolves to a success flag.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;

use scatterfs_client::{
    ChunkDeleteRequest, NodeClient, RetryConfig, RetryExecutor, RetryOutcome,
};

use crate::config::TransferConfig;
use crate::types::{ChunkId, ChunkRecord, NodeId, StorageNode};

/// Result of one (chunk, node) delete attempt after retries settle.
#[derive(Clone, Debug)]
pub struct DeletionOutcome {
    /// The chunk whose replica was targeted.
    pub chunk_id: ChunkId,
    /// 1-based index of the chunk within its file.
    pub chunk_index: u32,
    /// The node the delete was sent to.
    pub node_id: NodeId,
    /// True when the node acknowledged the removal.
    pub success: bool,
}

/// Deletes chunk replicas from their holding nodes concurrently.
pub struct ParallelDeletion {
    client: Arc<dyn NodeClient>,
    config: TransferConfig,
}

impl ParallelDeletion {
    /// Creates a deletion component with the given tuning.
    pub fn new(client: Arc<dyn NodeClient>, config: TransferConfig) -> Self {
        Self { client, config }
    }

    fn retry_executor(&self) -> RetryExecutor {
        RetryExecutor::new(RetryConfig {
            max_retries: self.config.max_retries,
            initial_backoff: self.config.initial_backoff,
            ..RetryConfig::default()
        })
    }

    /// Sends a delete for every current replica of every chunk.
    ///
    /// `nodes` resolves replica node ids to addresses; a replica whose
    /// node is missing from the directory resolves to a failed outcome.
    pub async fn delete_all(
        &self,
        chunks: &[ChunkRecord],
        nodes: &HashMap<NodeId, StorageNode>,
    ) -> Vec<DeletionOutcome> {
        let replica_count: usize = chunks.iter().map(|c| c.replicas.len()).sum();
        tracing::info!(
            chunks = chunks.len(),
            replicas = replica_count,
            "starting parallel chunk deletion"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let mut tasks = Vec::with_capacity(replica_count);

        for chunk in chunks {
            for node_id in &chunk.replicas {
                let Some(node) = nodes.get(node_id) else {
                    tracing::warn!(chunk = %chunk.id, node = %node_id, "replica node not in directory");
                    tasks.push(resolved_task(DeletionOutcome {
                        chunk_id: chunk.id,
                        chunk_index: chunk.index,
                        node_id: *node_id,
                        success: false,
                    }));
                    continue;
                };

                let client = Arc::clone(&self.client);
                let semaphore = Arc::clone(&semaphore);
                let executor = self.retry_executor();
                let node = node.clone();
                let chunk = chunk.clone();
                let attempt_timeout = self.config.attempt_timeout;
                let overall_timeout = self.config.overall_timeout;

                tasks.push(tokio::spawn(async move {
                    let attempt = delete_with_retry(
                        client, semaphore, executor, &node, &chunk, attempt_timeout,
                    );
                    let success = matches!(
                        tokio::time::timeout(overall_timeout, attempt).await,
                        Ok(true)
                    );
                    DeletionOutcome {
                        chunk_id: chunk.id,
                        chunk_index: chunk.index,
                        node_id: node.id,
                        success,
                    }
                }));
            }
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        for task in tasks {
            if let Ok(outcome) = task.await {
                outcomes.push(outcome);
            }
        }

        let removed = outcomes.iter().filter(|o| o.success).count();
        tracing::info!(
            removed,
            total = outcomes.len(),
            "parallel chunk deletion finished"
        );
        outcomes
    }
}

fn resolved_task(outcome: DeletionOutcome) -> tokio::task::JoinHandle<DeletionOutcome> {
    tokio::spawn(async move { outcome })
}

async fn delete_with_retry(
    client: Arc<dyn NodeClient>,
    semaphore: Arc<Semaphore>,
    executor: RetryExecutor,
    node: &StorageNode,
    chunk: &ChunkRecord,
    attempt_timeout: std::time::Duration,
) -> bool {
    let Ok(_permit) = semaphore.acquire().await else {
        return false;
    };

    let request = ChunkDeleteRequest {
        file_id: chunk.file_id.as_uuid(),
        chunk_id: chunk.id.as_uuid(),
        chunk_index: chunk.index,
    };
    let addr = node.addr();

    let outcome = executor
        .execute(|| {
            let request = request.clone();
            let addr = addr.clone();
            let client = Arc::clone(&client);
            async move {
                match tokio::time::timeout(attempt_timeout, client.delete_chunk(&addr, &request))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(scatterfs_client::ClientError::Timeout {
                        url: addr.delete_url(),
                        timeout_ms: attempt_timeout.as_millis() as u64,
                    }),
                }
            }
        })
        .await;

    match outcome {
        RetryOutcome::Success(()) => true,
        RetryOutcome::Exhausted {
            last_error,
            attempts,
        } => {
            tracing::warn!(
                chunk = %chunk.id,
                node = %addr,
                attempts,
                error = %last_error,
                "chunk delete failed after retries"
            );
            false
        }
    }
}
