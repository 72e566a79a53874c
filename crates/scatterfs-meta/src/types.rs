//! Records of the metadata plane: files, chunks, storage nodes.
//!
//! Records are plain values kept in an id-addressed store. A file
//! carries the ordered ids of its chunks; a chunk carries its owning
//! file id and the set of node ids currently holding a replica. Nodes
//! are referenced by id only — their lifecycle is independent of any
//! chunk, and health is never persisted on the record (it lives in
//! the in-process health registry).

use scatterfs_client::NodeAddr;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use uuid::Uuid;

fn parse_uuid(s: &str, kind: &'static str) -> crate::Result<Uuid> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(crate::MetaError::validation(format!("{kind} id is blank")));
    }
    Uuid::parse_str(trimmed)
        .map_err(|_| crate::MetaError::validation(format!("malformed {kind} id: {trimmed}")))
}

/// Unique identifier of a stored file, independent of its filename.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(Uuid);

impl FileId {
    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        FileId(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Parses an identifier from caller input.
    pub fn parse(s: &str) -> crate::Result<Self> {
        parse_uuid(s, "file").map(FileId)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier of one chunk of a file.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkId(Uuid);

impl ChunkId {
    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        ChunkId(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Parses an identifier from caller input.
    pub fn parse(s: &str) -> crate::Result<Self> {
        parse_uuid(s, "chunk").map(ChunkId)
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier of a storage node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(Uuid);

impl NodeId {
    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        NodeId(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Parses an identifier from caller input.
    pub fn parse(s: &str) -> crate::Result<Self> {
        parse_uuid(s, "node").map(NodeId)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Metadata record for a stored file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FileRecord {
    /// Generated identifier; uniqueness is by id, never by filename.
    pub id: FileId,
    /// Display filename as supplied by the caller.
    pub filename: String,
    /// Hex content hash of the whole file.
    pub hash: String,
    /// Total size in bytes.
    pub total_size: u64,
    /// Number of chunks the file was divided into.
    pub total_chunks: u32,
    /// Ids of the file's chunks, ordered by chunk index.
    pub chunk_ids: Vec<ChunkId>,
}

impl FileRecord {
    /// Creates a file shell before division; chunk fields are filled by the divider.
    pub fn new(filename: &str, hash: &str, total_size: u64) -> Self {
        Self {
            id: FileId::generate(),
            filename: filename.to_string(),
            hash: hash.to_string(),
            total_size,
            total_chunks: 0,
            chunk_ids: Vec::new(),
        }
    }
}

/// Metadata record for one chunk of a file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Generated identifier.
    pub id: ChunkId,
    /// Owning file; navigation only, ownership lives on the file record.
    pub file_id: FileId,
    /// 1-based index, unique and contiguous within the file.
    pub index: u32,
    /// Size in bytes.
    pub size: u64,
    /// Hex content hash of the chunk payload.
    pub hash: String,
    /// Nodes currently holding a replica of this chunk.
    pub replicas: HashSet<NodeId>,
}

impl ChunkRecord {
    /// Creates a chunk record with an empty replica set.
    pub fn new(file_id: FileId, index: u32, size: u64, hash: &str) -> Self {
        Self {
            id: ChunkId::generate(),
            file_id,
            index,
            size,
            hash: hash.to_string(),
            replicas: HashSet::new(),
        }
    }

    /// True once at least one node holds a replica.
    pub fn is_stored(&self) -> bool {
        !self.replicas.is_empty()
    }
}

/// A registered storage node. Health is tracked separately.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageNode {
    /// Generated identifier.
    pub id: NodeId,
    /// Host name or IP address.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

impl StorageNode {
    /// Creates a node record with a fresh id.
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            id: NodeId::generate(),
            host: host.to_string(),
            port,
        }
    }

    /// Wire address of this node.
    pub fn addr(&self) -> NodeAddr {
        NodeAddr::new(&self.host, self.port)
    }
}
