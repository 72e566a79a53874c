//! Tuning knobs for the metadata plane.
//!
//! One struct per concern, each with defaults matching the production
//! deployment; `MetaConfig` aggregates them. Transfer and deletion
//! carry independent copies of the same batch shape so they can be
//! tuned separately.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{MetaError, Result};

/// Bounds and shape for chunk-size calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Smallest allowed chunk, bytes (default 1 MiB).
    pub min_chunk_size: u64,
    /// Largest allowed chunk, bytes (default 64 MiB).
    pub max_chunk_size: u64,
    /// Preferred number of chunks per file (default 10).
    pub target_chunk_count: u32,
    /// Hard ceiling on chunks per file (default 20).
    pub max_chunk_count: u32,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            min_chunk_size: 1024 * 1024,
            max_chunk_size: 64 * 1024 * 1024,
            target_chunk_count: 10,
            max_chunk_count: 20,
        }
    }
}

impl ChunkingConfig {
    /// Checks internal consistency of the bounds.
    pub fn validate(&self) -> Result<()> {
        if self.min_chunk_size == 0 || self.min_chunk_size > self.max_chunk_size {
            return Err(MetaError::validation(
                "chunk size bounds must satisfy 0 < min <= max",
            ));
        }
        if self.target_chunk_count == 0 || self.target_chunk_count > self.max_chunk_count {
            return Err(MetaError::validation(
                "chunk counts must satisfy 0 < target <= max",
            ));
        }
        Ok(())
    }
}

/// Bounds for the replication-factor policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicationConfig {
    /// Minimum replication factor (default 2).
    pub min_factor: u32,
    /// Maximum replication factor (default 5).
    pub max_factor: u32,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            min_factor: 2,
            max_factor: 5,
        }
    }
}

impl ReplicationConfig {
    /// Checks internal consistency of the bounds.
    pub fn validate(&self) -> Result<()> {
        if self.min_factor == 0 || self.min_factor > self.max_factor {
            return Err(MetaError::validation(
                "replication bounds must satisfy 0 < min <= max",
            ));
        }
        Ok(())
    }
}

/// Cadence and shape of the node health monitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckConfig {
    /// Interval between probe cycles (default 15s).
    pub interval: Duration,
    /// Timeout for a single probe (default 2s).
    pub probe_timeout: Duration,
    /// Path of the node health endpoint.
    pub health_path: String,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(15),
            probe_timeout: Duration::from_secs(2),
            health_path: "/api/node/health".to_string(),
        }
    }
}

/// Tuning for one parallel batch (transfer or deletion).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Deadline for the whole batch (default 120s).
    pub overall_timeout: Duration,
    /// Timeout for one send/delete attempt (default 30s).
    pub attempt_timeout: Duration,
    /// Retries after the first attempt (default 3).
    pub max_retries: u32,
    /// Initial retry backoff (default 500ms).
    pub initial_backoff: Duration,
    /// Maximum simultaneous in-flight attempts (default 10).
    pub concurrency: usize,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            overall_timeout: Duration::from_secs(120),
            attempt_timeout: Duration::from_secs(30),
            max_retries: 3,
            initial_backoff: Duration::from_millis(500),
            concurrency: 10,
        }
    }
}

impl TransferConfig {
    /// Checks internal consistency of the batch shape.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(MetaError::validation("batch concurrency must be positive"));
        }
        if self.attempt_timeout > self.overall_timeout {
            return Err(MetaError::validation(
                "attempt timeout must not exceed the overall batch timeout",
            ));
        }
        Ok(())
    }
}

/// Aggregated configuration for the whole metadata plane.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetaConfig {
    /// Chunk sizing bounds.
    pub chunking: ChunkingConfig,
    /// Replication-factor bounds.
    pub replication: ReplicationConfig,
    /// Health monitor cadence.
    pub health: HealthCheckConfig,
    /// Chunk transfer batch tuning.
    pub transfer: TransferConfig,
    /// Chunk deletion batch tuning.
    pub deletion: TransferConfig,
}

impl MetaConfig {
    /// Validates every section.
    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;
        self.replication.validate()?;
        self.transfer.validate()?;
        self.deletion.validate()?;
        Ok(())
    }
}
