//! Wire contract to storage nodes: addressing and request shapes.
//!
//! A storage node exposes three endpoints: chunk upload (multipart
//! POST), chunk delete (DELETE with a JSON body), and a health probe
//! (bodiless GET). The structs here carry exactly the identifying
//! fields each endpoint requires.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Network address of a storage node.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeAddr {
    /// Host name or IP address.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

impl NodeAddr {
    /// Creates a new node address.
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
        }
    }

    /// URL of the chunk-upload endpoint.
    pub fn upload_url(&self) -> String {
        format!("http://{}:{}/api/chunk/upload", self.host, self.port)
    }

    /// URL of the chunk-delete endpoint.
    pub fn delete_url(&self) -> String {
        format!("http://{}:{}/api/chunk/delete", self.host, self.port)
    }

    /// URL of the health endpoint for the given probe path.
    pub fn health_url(&self, path: &str) -> String {
        format!("http://{}:{}{}", self.host, self.port, path)
    }
}

impl fmt::Display for NodeAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Identifying metadata sent alongside a chunk payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChunkUploadRequest {
    /// Id of the file the chunk belongs to.
    pub file_id: Uuid,
    /// Id of the chunk.
    pub chunk_id: Uuid,
    /// 1-based index of the chunk within its file.
    pub chunk_index: u32,
    /// Hex content hash of the chunk payload.
    pub chunk_hash: String,
}

/// Body of a chunk-delete request.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkDeleteRequest {
    /// Id of the file the chunk belongs to.
    pub file_id: Uuid,
    /// Id of the chunk to remove.
    pub chunk_id: Uuid,
    /// 1-based index of the chunk within its file.
    pub chunk_index: u32,
}
