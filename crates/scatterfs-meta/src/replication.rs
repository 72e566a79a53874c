//! Replication-factor policy.
//!
//! The target factor grows logarithmically with the healthy node
//! count: RF 2 for 3-4 nodes, 3 for 5-8, 4 for 9-16, 5 for 17-32,
//! capped at the configured maximum beyond that. Small clusters are
//! special-cased so one node stays available as a non-replica target.
//! The policy may ask for more replicas than a tiny cluster can hold;
//! placement clamps the effective factor to the candidate count.

use crate::config::ReplicationConfig;

/// Ceiling of log2 for n >= 1.
fn ceil_log2(n: u32) -> u32 {
    debug_assert!(n >= 1);
    if n <= 1 {
        0
    } else {
        32 - (n - 1).leading_zeros()
    }
}

/// Target replication factor for the given healthy node count.
///
/// Zero healthy nodes yields zero; callers placing chunks fail fast on
/// an empty candidate set long before this value matters.
pub fn target_replication_factor(healthy_nodes: u32, config: &ReplicationConfig) -> u32 {
    if healthy_nodes == 0 {
        return 0;
    }
    if healthy_nodes == 1 {
        return 1;
    }
    if healthy_nodes <= config.min_factor {
        // Keep one node free as a non-replica target on tiny clusters.
        return 2.max(healthy_nodes - 1);
    }
    ceil_log2(healthy_nodes).clamp(config.min_factor, config.max_factor)
}
