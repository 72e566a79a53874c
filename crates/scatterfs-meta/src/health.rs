//! In-process node health cache.
//!
//! Health is ephemeral: it is seeded optimistically from the node
//! directory at startup, corrected by the monitor's probe cycles, and
//! flipped by the registration path when an unhealthy node re-enrolls.
//! A node the cache has never seen counts as unhealthy rather than an
//! error, and a registered node is never dropped from the cache.
//! Backed by a `DashMap` so updates are per-key atomic upserts; probe
//! fan-out across dozens of nodes must not serialize on one lock.

use dashmap::DashMap;

use crate::types::{NodeId, StorageNode};

/// Concurrency-safe cache of node id to health flag.
#[derive(Default)]
pub struct NodeHealthRegistry {
    cache: DashMap<NodeId, bool>,
}

impl NodeHealthRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the cache from the node directory, marking every known
    /// node healthy until the first probe cycle corrects it.
    pub fn initialize(&self, nodes: &[StorageNode]) {
        for node in nodes {
            self.cache.insert(node.id, true);
        }
        tracing::info!(nodes = nodes.len(), "health cache initialized");
    }

    /// Current health of a node; absent entries are unhealthy.
    pub fn is_healthy(&self, node_id: NodeId) -> bool {
        self.cache.get(&node_id).map(|h| *h).unwrap_or(false)
    }

    /// Upserts the health flag for a node.
    pub fn set_health(&self, node_id: NodeId, healthy: bool) {
        self.cache.insert(node_id, healthy);
    }

    /// Number of nodes currently marked healthy.
    pub fn healthy_count(&self) -> usize {
        self.cache.iter().filter(|entry| *entry.value()).count()
    }

    /// Number of nodes the cache knows about, healthy or not.
    pub fn known_count(&self) -> usize {
        self.cache.len()
    }
}
