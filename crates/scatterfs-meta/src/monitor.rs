//! Periodic storage-node health monitor.
//!
//! A recurring timer loop probes every registered node concurrently,
//! each probe bounded by its own timeout, and writes the results into
//! the health registry. Probe failures never propagate; they only flip
//! cache state. The monitor is the sole steady-state writer of health
//! transitions (node re-registration is the one other writer).

use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use scatterfs_client::NodeClient;

use crate::config::HealthCheckConfig;
use crate::health::NodeHealthRegistry;
use crate::store::MetadataStore;
use crate::types::StorageNode;

/// Probes all known nodes on a fixed interval.
pub struct NodeHealthMonitor {
    store: Arc<dyn MetadataStore>,
    registry: Arc<NodeHealthRegistry>,
    client: Arc<dyn NodeClient>,
    config: HealthCheckConfig,
}

/// Handle to a running monitor loop.
pub struct MonitorHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Stops the loop and waits for it to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

impl NodeHealthMonitor {
    /// Creates a monitor over the given directory, registry and client.
    pub fn new(
        store: Arc<dyn MetadataStore>,
        registry: Arc<NodeHealthRegistry>,
        client: Arc<dyn NodeClient>,
        config: HealthCheckConfig,
    ) -> Self {
        Self {
            store,
            registry,
            client,
            config,
        }
    }

    /// Starts the recurring probe loop on the runtime.
    pub fn spawn(self: Arc<Self>) -> MonitorHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let monitor = Arc::clone(&self);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(monitor.config.interval);
            // The first tick fires immediately; that seeds real probe
            // results right after startup's optimistic initialization.
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        monitor.check_all_nodes().await;
                    }
                    _ = shutdown_rx.changed() => {
                        tracing::info!("health monitor stopping");
                        return;
                    }
                }
            }
        });

        MonitorHandle {
            shutdown: shutdown_tx,
            task,
        }
    }

    /// Runs one probe cycle over every registered node.
    ///
    /// All probes run concurrently; the cycle returns once every probe
    /// has settled. No-op when the directory is empty.
    pub async fn check_all_nodes(&self) {
        let nodes = match self.store.list_nodes().await {
            Ok(nodes) => nodes,
            Err(e) => {
                tracing::warn!(error = %e, "health cycle skipped: node directory unavailable");
                return;
            }
        };
        if nodes.is_empty() {
            tracing::warn!("no storage nodes registered");
            return;
        }

        let total = nodes.len();
        tracing::debug!(
            healthy = self.registry.healthy_count(),
            total,
            "starting health probe cycle"
        );

        let mut probes = Vec::with_capacity(total);
        for node in nodes {
            let client = Arc::clone(&self.client);
            let path = self.config.health_path.clone();
            let timeout = self.config.probe_timeout;
            probes.push(tokio::spawn(async move {
                let healthy = matches!(
                    tokio::time::timeout(timeout, client.check_health(&node.addr(), &path)).await,
                    Ok(Ok(()))
                );
                (node, healthy)
            }));
        }

        for probe in probes {
            if let Ok((node, healthy)) = probe.await {
                self.record_probe(&node, healthy);
            }
        }

        tracing::info!(
            healthy = self.registry.healthy_count(),
            total,
            "health probe cycle complete"
        );
    }

    fn record_probe(&self, node: &StorageNode, healthy: bool) {
        let was_healthy = self.registry.is_healthy(node.id);
        match (was_healthy, healthy) {
            (false, true) => {
                tracing::info!(node = %node.addr(), "node recovered")
            }
            (true, false) => {
                tracing::warn!(node = %node.addr(), "node marked unhealthy")
            }
            (false, false) => {
                tracing::debug!(node = %node.addr(), "node remains unhealthy")
            }
            (true, true) => {}
        }
        self.registry.set_health(node.id, healthy);
    }
}
