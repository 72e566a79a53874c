//! Metadata-store contract and the in-memory reference implementation.
//!
//! Persistence is an external collaborator: the plane only needs
//! find/save/delete for the three record kinds, a batch chunk save
//! (the per-step mutation group), and two reconciliation queries.
//! `InMemoryMetaStore` backs tests and single-process deployments.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::{MetaError, Result};
use crate::types::{ChunkId, ChunkRecord, FileId, FileRecord, NodeId, StorageNode};

/// Store contract consumed by the orchestrators and the health monitor.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Inserts or replaces a file record.
    async fn save_file(&self, file: &FileRecord) -> Result<()>;

    /// Looks up a file record by id.
    async fn find_file(&self, id: FileId) -> Result<Option<FileRecord>>;

    /// Deletes a file record and all of its chunk records.
    async fn delete_file(&self, id: FileId) -> Result<()>;

    /// Inserts or replaces a batch of chunk records as one group.
    async fn save_chunks(&self, chunks: &[ChunkRecord]) -> Result<()>;

    /// Looks up a chunk record by id.
    async fn find_chunk(&self, id: ChunkId) -> Result<Option<ChunkRecord>>;

    /// Returns a file's chunk records ordered by chunk index.
    async fn chunks_for_file(&self, id: FileId) -> Result<Vec<ChunkRecord>>;

    /// Inserts or replaces a storage-node record.
    async fn save_node(&self, node: &StorageNode) -> Result<()>;

    /// Looks up a node record by id.
    async fn find_node(&self, id: NodeId) -> Result<Option<StorageNode>>;

    /// Looks up a node record by host and port.
    async fn find_node_by_addr(&self, host: &str, port: u16) -> Result<Option<StorageNode>>;

    /// Returns every registered node.
    async fn list_nodes(&self) -> Result<Vec<StorageNode>>;

    /// Chunks whose replica count is below `min_replicas`.
    async fn under_replicated_chunks(&self, min_replicas: usize) -> Result<Vec<ChunkRecord>>;

    /// Registered nodes that do not hold a replica of the given chunk.
    async fn nodes_missing_chunk(&self, id: ChunkId) -> Result<Vec<StorageNode>>;
}

/// Concurrent in-memory store keyed by record id.
#[derive(Default)]
pub struct InMemoryMetaStore {
    files: DashMap<FileId, FileRecord>,
    chunks: DashMap<ChunkId, ChunkRecord>,
    nodes: DashMap<NodeId, StorageNode>,
}

impl InMemoryMetaStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of file records currently stored.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Number of chunk records currently stored.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}

#[async_trait]
impl MetadataStore for InMemoryMetaStore {
    async fn save_file(&self, file: &FileRecord) -> Result<()> {
        self.files.insert(file.id, file.clone());
        Ok(())
    }

    async fn find_file(&self, id: FileId) -> Result<Option<FileRecord>> {
        Ok(self.files.get(&id).map(|f| f.clone()))
    }

    async fn delete_file(&self, id: FileId) -> Result<()> {
        let (_, file) = self
            .files
            .remove(&id)
            .ok_or_else(|| MetaError::not_found("file", id.to_string()))?;
        for chunk_id in &file.chunk_ids {
            self.chunks.remove(chunk_id);
        }
        Ok(())
    }

    async fn save_chunks(&self, chunks: &[ChunkRecord]) -> Result<()> {
        for chunk in chunks {
            self.chunks.insert(chunk.id, chunk.clone());
        }
        Ok(())
    }

    async fn find_chunk(&self, id: ChunkId) -> Result<Option<ChunkRecord>> {
        Ok(self.chunks.get(&id).map(|c| c.clone()))
    }

    async fn chunks_for_file(&self, id: FileId) -> Result<Vec<ChunkRecord>> {
        let mut chunks: Vec<ChunkRecord> = self
            .chunks
            .iter()
            .filter(|entry| entry.file_id == id)
            .map(|entry| entry.clone())
            .collect();
        chunks.sort_by_key(|c| c.index);
        Ok(chunks)
    }

    async fn save_node(&self, node: &StorageNode) -> Result<()> {
        self.nodes.insert(node.id, node.clone());
        Ok(())
    }

    async fn find_node(&self, id: NodeId) -> Result<Option<StorageNode>> {
        Ok(self.nodes.get(&id).map(|n| n.clone()))
    }

    async fn find_node_by_addr(&self, host: &str, port: u16) -> Result<Option<StorageNode>> {
        Ok(self
            .nodes
            .iter()
            .find(|entry| entry.host == host && entry.port == port)
            .map(|entry| entry.clone()))
    }

    async fn list_nodes(&self) -> Result<Vec<StorageNode>> {
        Ok(self.nodes.iter().map(|entry| entry.clone()).collect())
    }

    async fn under_replicated_chunks(&self, min_replicas: usize) -> Result<Vec<ChunkRecord>> {
        Ok(self
            .chunks
            .iter()
            .filter(|entry| entry.replicas.len() < min_replicas)
            .map(|entry| entry.clone())
            .collect())
    }

    async fn nodes_missing_chunk(&self, id: ChunkId) -> Result<Vec<StorageNode>> {
        let chunk = self
            .find_chunk(id)
            .await?
            .ok_or_else(|| MetaError::not_found("chunk", id.to_string()))?;
        Ok(self
            .nodes
            .iter()
            .filter(|entry| !chunk.replicas.contains(&entry.id))
            .map(|entry| entry.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_with_chunks(chunk_count: u32) -> (FileRecord, Vec<ChunkRecord>) {
        let mut file = FileRecord::new("data.bin", "hash", 1000);
        let chunks: Vec<ChunkRecord> = (1..=chunk_count)
            .map(|i| ChunkRecord::new(file.id, i, 100, "chunkhash"))
            .collect();
        file.total_chunks = chunk_count;
        file.chunk_ids = chunks.iter().map(|c| c.id).collect();
        (file, chunks)
    }

    #[tokio::test]
    async fn test_save_and_find_file() {
        let store = InMemoryMetaStore::new();
        let (file, _) = file_with_chunks(0);

        store.save_file(&file).await.unwrap();
        let found = store.find_file(file.id).await.unwrap().unwrap();
        assert_eq!(found.filename, "data.bin");
    }

    #[tokio::test]
    async fn test_find_missing_file_is_none() {
        let store = InMemoryMetaStore::new();
        assert!(store.find_file(FileId::generate()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_file_cascades_chunks() {
        let store = InMemoryMetaStore::new();
        let (file, chunks) = file_with_chunks(3);
        store.save_file(&file).await.unwrap();
        store.save_chunks(&chunks).await.unwrap();
        assert_eq!(store.chunk_count(), 3);

        store.delete_file(file.id).await.unwrap();
        assert_eq!(store.file_count(), 0);
        assert_eq!(store.chunk_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_missing_file_is_not_found() {
        let store = InMemoryMetaStore::new();
        let err = store.delete_file(FileId::generate()).await.unwrap_err();
        assert!(matches!(err, MetaError::NotFound { kind: "file", .. }));
    }

    #[tokio::test]
    async fn test_chunks_for_file_ordered_by_index() {
        let store = InMemoryMetaStore::new();
        let (file, mut chunks) = file_with_chunks(4);
        chunks.reverse();
        store.save_file(&file).await.unwrap();
        store.save_chunks(&chunks).await.unwrap();

        let found = store.chunks_for_file(file.id).await.unwrap();
        let indices: Vec<u32> = found.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_chunks_for_file_excludes_other_files() {
        let store = InMemoryMetaStore::new();
        let (file_a, chunks_a) = file_with_chunks(2);
        let (file_b, chunks_b) = file_with_chunks(3);
        store.save_file(&file_a).await.unwrap();
        store.save_file(&file_b).await.unwrap();
        store.save_chunks(&chunks_a).await.unwrap();
        store.save_chunks(&chunks_b).await.unwrap();

        assert_eq!(store.chunks_for_file(file_a.id).await.unwrap().len(), 2);
        assert_eq!(store.chunks_for_file(file_b.id).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_find_node_by_addr() {
        let store = InMemoryMetaStore::new();
        let node = StorageNode::new("10.0.0.1", 9000);
        store.save_node(&node).await.unwrap();

        let found = store.find_node_by_addr("10.0.0.1", 9000).await.unwrap();
        assert_eq!(found.unwrap().id, node.id);
        assert!(store
            .find_node_by_addr("10.0.0.1", 9001)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_under_replicated_chunks() {
        let store = InMemoryMetaStore::new();
        let (file, mut chunks) = file_with_chunks(3);
        chunks[0].replicas.insert(NodeId::generate());
        chunks[0].replicas.insert(NodeId::generate());
        chunks[1].replicas.insert(NodeId::generate());
        store.save_file(&file).await.unwrap();
        store.save_chunks(&chunks).await.unwrap();

        let under = store.under_replicated_chunks(2).await.unwrap();
        assert_eq!(under.len(), 2);
        assert!(under.iter().all(|c| c.replicas.len() < 2));
    }

    #[tokio::test]
    async fn test_nodes_missing_chunk() {
        let store = InMemoryMetaStore::new();
        let holder = StorageNode::new("10.0.0.1", 9000);
        let other = StorageNode::new("10.0.0.2", 9000);
        store.save_node(&holder).await.unwrap();
        store.save_node(&other).await.unwrap();

        let (file, mut chunks) = file_with_chunks(1);
        chunks[0].replicas.insert(holder.id);
        store.save_file(&file).await.unwrap();
        store.save_chunks(&chunks).await.unwrap();

        let missing = store.nodes_missing_chunk(chunks[0].id).await.unwrap();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].id, other.id);
    }

    #[tokio::test]
    async fn test_nodes_missing_chunk_unknown_chunk() {
        let store = InMemoryMetaStore::new();
        let err = store
            .nodes_missing_chunk(ChunkId::generate())
            .await
            .unwrap_err();
        assert!(matches!(err, MetaError::NotFound { kind: "chunk", .. }));
    }

    #[tokio::test]
    async fn test_save_chunks_replaces_existing() {
        let store = InMemoryMetaStore::new();
        let (file, mut chunks) = file_with_chunks(1);
        store.save_file(&file).await.unwrap();
        store.save_chunks(&chunks).await.unwrap();

        chunks[0].replicas.insert(NodeId::generate());
        store.save_chunks(&chunks).await.unwrap();

        let found = store.find_chunk(chunks[0].id).await.unwrap().unwrap();
        assert_eq!(found.replicas.len(), 1);
        assert_eq!(store.chunk_count(), 1);
    }
}
