//! Storage-node enrollment.
//!
//! A node announces itself by host and port. A fresh address becomes a
//! new directory entry; a known address belonging to an unhealthy node
//! flips it back to healthy without minting a new id, so its existing
//! replicas stay attributed. Re-announcing while healthy is a conflict
//! rather than a no-op, which surfaces address collisions early.

use std::sync::Arc;

use crate::error::{MetaError, Result};
use crate::health::NodeHealthRegistry;
use crate::store::MetadataStore;
use crate::types::StorageNode;

/// How a registration request was resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Enrollment {
    /// A new node entered the directory.
    Registered(StorageNode),
    /// A known but unhealthy node came back at the same address.
    Reactivated(StorageNode),
}

impl Enrollment {
    /// The node record the enrollment resolved to.
    pub fn node(&self) -> &StorageNode {
        match self {
            Enrollment::Registered(node) | Enrollment::Reactivated(node) => node,
        }
    }
}

/// Handles node registration against the directory and health cache.
pub struct NodeRegistrar {
    store: Arc<dyn MetadataStore>,
    registry: Arc<NodeHealthRegistry>,
}

impl NodeRegistrar {
    /// Creates a registrar over the given store and registry.
    pub fn new(store: Arc<dyn MetadataStore>, registry: Arc<NodeHealthRegistry>) -> Self {
        Self { store, registry }
    }

    /// Enrolls a node by address.
    pub async fn register(&self, host: &str, port: u16) -> Result<Enrollment> {
        let host = host.trim();
        if host.is_empty() {
            return Err(MetaError::validation("node host is blank"));
        }
        if port == 0 {
            return Err(MetaError::validation("node port must be nonzero"));
        }

        if let Some(existing) = self.store.find_node_by_addr(host, port).await? {
            if self.registry.is_healthy(existing.id) {
                return Err(MetaError::NodeAlreadyRegistered {
                    host: host.to_string(),
                    port,
                });
            }
            self.registry.set_health(existing.id, true);
            tracing::info!(node = %existing.addr(), "node reactivated");
            return Ok(Enrollment::Reactivated(existing));
        }

        let node = StorageNode::new(host, port);
        self.store.save_node(&node).await?;
        self.registry.set_health(node.id, true);
        tracing::info!(node = %node.addr(), id = %node.id, "node registered");
        Ok(Enrollment::Registered(node))
    }
}
