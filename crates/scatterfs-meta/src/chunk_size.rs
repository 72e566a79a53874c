//! Chunk-size calculation.
//!
//! Deterministic and side-effect free: file size plus the configured
//! bounds fully determine the chunk size. Files smaller than the
//! minimum chunk travel as a single chunk of their own size.

use crate::config::ChunkingConfig;

/// Computes the chunk size for a file of `file_size` bytes.
///
/// For sizes below the minimum chunk the file size itself is returned.
/// Otherwise the size targets `target_chunk_count` chunks, is raised so
/// the chunk count never exceeds `max_chunk_count`, and is clamped into
/// the configured `[min, max]` bounds and to the file size.
pub fn optimal_chunk_size(file_size: u64, config: &ChunkingConfig) -> u64 {
    if file_size < config.min_chunk_size {
        return file_size;
    }

    let target = file_size.div_ceil(u64::from(config.target_chunk_count));
    let count_floor = file_size.div_ceil(u64::from(config.max_chunk_count));

    let size = target
        .max(count_floor)
        .max(config.min_chunk_size)
        .min(config.max_chunk_size)
        .min(file_size);

    tracing::debug!(
        file_size,
        chunk_size = size,
        chunks = file_size.div_ceil(size),
        "calculated chunk size"
    );
    size
}
