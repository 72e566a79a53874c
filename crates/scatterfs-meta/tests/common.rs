//! Shared fixtures for end-to-end metadata-plane tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashSet;

use scatterfs_client::{ChunkDeleteRequest, ChunkUploadRequest, ClientError, NodeAddr, NodeClient};
use scatterfs_meta::config::{ChunkingConfig, HealthCheckConfig, MetaConfig, TransferConfig};
use scatterfs_meta::delete::DeleteOrchestrator;
use scatterfs_meta::health::NodeHealthRegistry;
use scatterfs_meta::lookup::AllocationLookup;
use scatterfs_meta::monitor::NodeHealthMonitor;
use scatterfs_meta::registrar::NodeRegistrar;
use scatterfs_meta::store::{InMemoryMetaStore, MetadataStore};
use scatterfs_meta::types::StorageNode;
use scatterfs_meta::upload::UploadOrchestrator;

/// Scriptable stand-in for the node wire client. Addresses added to a
/// fault set fail the corresponding operation until removed.
#[derive(Default)]
pub struct FaultyNodeClient {
    pub unreachable: DashSet<NodeAddr>,
    pub refuse_uploads: DashSet<NodeAddr>,
    pub refuse_deletes: DashSet<NodeAddr>,
}

impl FaultyNodeClient {
    fn reachable(&self, node: &NodeAddr) -> scatterfs_client::Result<()> {
        if self.unreachable.contains(node) {
            return Err(ClientError::Network {
                url: node.health_url("/api/node/health"),
                msg: "connection refused".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl NodeClient for FaultyNodeClient {
    async fn upload_chunk(
        &self,
        node: &NodeAddr,
        _request: &ChunkUploadRequest,
        _payload: Bytes,
    ) -> scatterfs_client::Result<()> {
        self.reachable(node)?;
        if self.refuse_uploads.contains(node) {
            return Err(ClientError::Http {
                status: 500,
                url: node.upload_url(),
            });
        }
        Ok(())
    }

    async fn delete_chunk(
        &self,
        node: &NodeAddr,
        _request: &ChunkDeleteRequest,
    ) -> scatterfs_client::Result<()> {
        self.reachable(node)?;
        if self.refuse_deletes.contains(node) {
            return Err(ClientError::Http {
                status: 500,
                url: node.delete_url(),
            });
        }
        Ok(())
    }

    async fn check_health(&self, node: &NodeAddr, _path: &str) -> scatterfs_client::Result<()> {
        self.reachable(node)
    }
}

/// Installs a fmt subscriber once so failing tests show their traces.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Configuration shrunk for fast tests: tiny chunks, short timeouts.
pub fn test_config() -> MetaConfig {
    let batch = TransferConfig {
        overall_timeout: Duration::from_secs(5),
        attempt_timeout: Duration::from_millis(500),
        max_retries: 1,
        initial_backoff: Duration::from_millis(1),
        concurrency: 8,
    };
    MetaConfig {
        chunking: ChunkingConfig {
            min_chunk_size: 16,
            max_chunk_size: 64,
            target_chunk_count: 4,
            max_chunk_count: 8,
        },
        health: HealthCheckConfig {
            interval: Duration::from_millis(10),
            probe_timeout: Duration::from_millis(50),
            health_path: "/api/node/health".to_string(),
        },
        deletion: batch.clone(),
        transfer: batch,
        ..MetaConfig::default()
    }
}

/// An in-process metadata plane wired against the faulty client.
pub struct TestPlane {
    pub store: Arc<InMemoryMetaStore>,
    pub registry: Arc<NodeHealthRegistry>,
    pub client: Arc<FaultyNodeClient>,
    pub nodes: Vec<StorageNode>,
    pub config: MetaConfig,
}

impl TestPlane {
    /// Builds a plane with `node_count` registered healthy nodes.
    pub async fn with_nodes(node_count: usize) -> Self {
        init_tracing();
        let store = Arc::new(InMemoryMetaStore::new());
        let registry = Arc::new(NodeHealthRegistry::new());
        let mut nodes = Vec::new();
        for i in 0..node_count {
            let node = StorageNode::new(&format!("10.0.0.{i}"), 9000);
            store.save_node(&node).await.expect("seed node");
            nodes.push(node);
        }
        registry.initialize(&nodes);
        Self {
            store,
            registry,
            client: Arc::new(FaultyNodeClient::default()),
            nodes,
            config: test_config(),
        }
    }

    pub fn uploader(&self) -> UploadOrchestrator {
        UploadOrchestrator::new(
            Arc::clone(&self.store) as Arc<dyn MetadataStore>,
            Arc::clone(&self.registry),
            Arc::clone(&self.client) as Arc<dyn NodeClient>,
            self.config.clone(),
        )
    }

    pub fn deleter(&self) -> DeleteOrchestrator {
        DeleteOrchestrator::new(
            Arc::clone(&self.store) as Arc<dyn MetadataStore>,
            Arc::clone(&self.client) as Arc<dyn NodeClient>,
            self.config.clone(),
        )
    }

    pub fn lookup(&self) -> AllocationLookup {
        AllocationLookup::new(Arc::clone(&self.store) as Arc<dyn MetadataStore>)
    }

    pub fn registrar(&self) -> NodeRegistrar {
        NodeRegistrar::new(
            Arc::clone(&self.store) as Arc<dyn MetadataStore>,
            Arc::clone(&self.registry),
        )
    }

    pub fn monitor(&self) -> NodeHealthMonitor {
        NodeHealthMonitor::new(
            Arc::clone(&self.store) as Arc<dyn MetadataStore>,
            Arc::clone(&self.registry),
            Arc::clone(&self.client) as Arc<dyn NodeClient>,
            self.config.health.clone(),
        )
    }

    /// Makes a node unreachable for every operation, probes included.
    pub fn take_down(&self, node: &StorageNode) {
        self.client.unreachable.insert(node.addr());
    }
}
