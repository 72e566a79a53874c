//! File division into ordered chunks.
//!
//! Reads a byte stream sequentially in slices of the calculated chunk
//! size, producing one chunk record plus payload per slice. Indices
//! are 1-based and contiguous; the owning file record receives the
//! final chunk count and the ordered chunk-id list before return.

use bytes::Bytes;
use std::io::Read;

use crate::chunk_size::optimal_chunk_size;
use crate::config::ChunkingConfig;
use crate::error::Result;
use crate::types::{ChunkRecord, FileRecord};

/// One produced chunk: its metadata record and payload bytes.
#[derive(Clone, Debug)]
pub struct ChunkPayload {
    /// Chunk metadata, replica set still empty.
    pub record: ChunkRecord,
    /// The chunk's bytes.
    pub data: Bytes,
}

/// Hex blake3 hash of a byte slice.
pub fn content_hash(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

/// Splits `reader` into chunks sized for `file.total_size`.
///
/// Consumes the stream fully; a short or failing read surfaces as a
/// storage I/O error. On success `file.total_chunks` and
/// `file.chunk_ids` describe exactly the returned payloads.
pub fn divide<R: Read>(
    file: &mut FileRecord,
    mut reader: R,
    config: &ChunkingConfig,
) -> Result<Vec<ChunkPayload>> {
    let chunk_size = optimal_chunk_size(file.total_size, config) as usize;
    let mut payloads = Vec::new();

    if chunk_size > 0 {
        let mut buffer = vec![0u8; chunk_size];
        let mut index = 0u32;
        loop {
            let filled = fill_buffer(&mut reader, &mut buffer)?;
            if filled == 0 {
                break;
            }
            index += 1;
            let data = Bytes::copy_from_slice(&buffer[..filled]);
            let record = ChunkRecord::new(file.id, index, filled as u64, &content_hash(&data));
            file.chunk_ids.push(record.id);
            payloads.push(ChunkPayload { record, data });
            if filled < chunk_size {
                break;
            }
        }
    }

    file.total_chunks = payloads.len() as u32;
    tracing::info!(
        file = %file.id,
        filename = %file.filename,
        chunks = file.total_chunks,
        "divided file into chunks"
    );
    Ok(payloads)
}

/// Reads until the buffer is full or the stream ends.
fn fill_buffer<R: Read>(reader: &mut R, buffer: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        match reader.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
