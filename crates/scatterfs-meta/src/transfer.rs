//! Parallel chunk transfer to storage nodes.
//!
//! One task per (node, chunk) assignment, bounded by a semaphore.
//! Every attempt is retried with backoff and jitter; whatever remains
//! after the batch deadline is abandoned and counted as failed. Wire
//! errors never escape this module — each assignment resolves to a
//! success flag and the orchestrator judges the aggregate.

use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;

use scatterfs_client::{
    ChunkUploadRequest, NodeClient, RetryConfig, RetryExecutor, RetryOutcome,
};

use crate::config::TransferConfig;
use crate::divider::ChunkPayload;
use crate::placement::ChunkAssignment;
use crate::types::{ChunkRecord, NodeId, StorageNode};

/// Result of one (node, chunk) send attempt after retries settle.
///
/// Chunk indices are unique within a batch, so (index, node) fully
/// identifies the assignment.
#[derive(Clone, Debug)]
pub struct TransferOutcome {
    /// 1-based index of the chunk within its file.
    pub chunk_index: u32,
    /// The node the chunk was sent to.
    pub node_id: NodeId,
    /// True when the node acknowledged the chunk.
    pub success: bool,
}

/// Sends chunk payloads to their assigned nodes concurrently.
pub struct ParallelTransfer {
    client: Arc<dyn NodeClient>,
    config: TransferConfig,
}

impl ParallelTransfer {
    /// Creates a transfer component with the given tuning.
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

    /// Sends every assignment and returns exactly one outcome per
    /// assignment.
    ///
    /// `chunks` maps chunk index to payload. An assignment referencing
    /// an index absent from the map resolves to a failed outcome.
    pub async fn send_all(
        &self,
        chunks: &HashMap<u32, ChunkPayload>,
        assignments: &[ChunkAssignment],
    ) -> Vec<TransferOutcome> {
        tracing::info!(
            chunks = chunks.len(),
            assignments = assignments.len(),
            "starting parallel chunk transfer"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let mut tasks = Vec::with_capacity(assignments.len());

        for assignment in assignments {
            let Some(payload) = chunks.get(&assignment.chunk_index) else {
                tracing::warn!(
                    chunk_index = assignment.chunk_index,
                    "assignment references unknown chunk index"
                );
                tasks.push(resolved_task(TransferOutcome {
                    chunk_index: assignment.chunk_index,
                    node_id: assignment.node.id,
                    success: false,
                }));
                continue;
            };

            let client = Arc::clone(&self.client);
            let semaphore = Arc::clone(&semaphore);
            let executor = self.retry_executor();
            let node = assignment.node.clone();
            let record = payload.record.clone();
            let data = payload.data.clone();
            let attempt_timeout = self.config.attempt_timeout;
            let overall_timeout = self.config.overall_timeout;

            tasks.push(tokio::spawn(async move {
                let attempt = send_with_retry(
                    client, semaphore, executor, &node, &record, data, attempt_timeout,
                );
                let success = matches!(
                    tokio::time::timeout(overall_timeout, attempt).await,
                    Ok(true)
                );
                TransferOutcome {
                    chunk_index: record.index,
                    node_id: node.id,
                    success,
                }
            }));
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        for task in tasks {
            if let Ok(outcome) = task.await {
                outcomes.push(outcome);
            }
        }

        let sent = outcomes.iter().filter(|o| o.success).count();
        tracing::info!(
            sent,
            total = outcomes.len(),
            "parallel chunk transfer finished"
        );
        outcomes
    }
}

fn resolved_task(outcome: TransferOutcome) -> tokio::task::JoinHandle<TransferOutcome> {
    tokio::spawn(async move { outcome })
}

async fn send_with_retry(
    client: Arc<dyn NodeClient>,
    semaphore: Arc<Semaphore>,
    executor: RetryExecutor,
    node: &StorageNode,
    record: &ChunkRecord,
    data: Bytes,
    attempt_timeout: std::time::Duration,
) -> bool {
    // Closed only if the semaphore is dropped, which cannot happen
    // while this task holds a clone.
    let Ok(_permit) = semaphore.acquire().await else {
        return false;
    };

    let request = ChunkUploadRequest {
        file_id: record.file_id.as_uuid(),
        chunk_id: record.id.as_uuid(),
        chunk_index: record.index,
        chunk_hash: record.hash.clone(),
    };
    let addr = node.addr();

    let outcome = executor
        .execute(|| {
            let data = data.clone();
            let request = request.clone();
            let addr = addr.clone();
            let client = Arc::clone(&client);
            async move {
                match tokio::time::timeout(
                    attempt_timeout,
                    client.upload_chunk(&addr, &request, data),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => Err(scatterfs_client::ClientError::Timeout {
                        url: addr.upload_url(),
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
                chunk = %record.id,
                node = %addr,
                attempts,
                error = %last_error,
                "chunk send failed after retries"
            );
            false
        }
    }
}
