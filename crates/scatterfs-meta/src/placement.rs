//! Round-robin replica placement.
//!
//! Assigns `replication_factor` consecutive candidate nodes to each
//! chunk index from a single cursor shared across all chunks. The
//! cursor never resets, so replicas spread evenly over the whole node
//! set instead of clustering on the first nodes when the factor is
//! smaller than the node count.

use crate::error::{MetaError, Result};
use crate::types::StorageNode;

/// One (node, chunk) assignment produced by placement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkAssignment {
    /// Node that should receive a replica.
    pub node: StorageNode,
    /// 1-based index of the chunk to send.
    pub chunk_index: u32,
}

/// Distributes `chunk_count` chunks over `candidates` with the given
/// replication factor.
///
/// Candidates must already be filtered to healthy nodes. The effective
/// factor is clamped to the candidate count, so no chunk is ever
/// assigned the same node twice. Fails when no candidate is available.
pub fn round_robin(
    candidates: &[StorageNode],
    chunk_count: u32,
    replication_factor: u32,
) -> Result<Vec<ChunkAssignment>> {
    if candidates.is_empty() {
        return Err(MetaError::NoHealthyNodes);
    }

    let effective_factor = replication_factor.min(candidates.len() as u32);
    // Widened before multiplying; the product can exceed u32.
    let mut assignments = Vec::with_capacity(chunk_count as usize * effective_factor as usize);
    let mut cursor = 0usize;

    for chunk_index in 1..=chunk_count {
        for _ in 0..effective_factor {
            if cursor >= candidates.len() {
                cursor = 0;
            }
            assignments.push(ChunkAssignment {
                node: candidates[cursor].clone(),
                chunk_index,
            });
            cursor += 1;
        }
    }

    tracing::debug!(
        chunks = chunk_count,
        factor = effective_factor,
        nodes = candidates.len(),
        assignments = assignments.len(),
        "placed chunk replicas"
    );
    Ok(assignments)
}
