//! End-to-end scenarios across the whole metadata plane: enroll nodes,
//! probe health, upload, look up allocations, delete.

mod common;

use common::TestPlane;

use scatterfs_meta::divider::content_hash;
use scatterfs_meta::replication::target_replication_factor;
use scatterfs_meta::store::MetadataStore;
use scatterfs_meta::MetaError;

#[tokio::test]
async fn test_upload_then_lookup_round_trip() {
    let plane = TestPlane::with_nodes(5).await;
    let data: Vec<u8> = (0..200u16).map(|i| i as u8).collect();

    let summary = plane
        .uploader()
        .upload("archive.tar", &content_hash(&data), 200, &data[..])
        .await
        .expect("upload");

    // Five healthy nodes target a factor of three.
    assert_eq!(summary.replication_factor, 3);

    let plan = plane
        .lookup()
        .allocations(&summary.file_id.to_string())
        .await
        .expect("lookup");

    assert_eq!(plan.filename, "archive.tar");
    assert_eq!(plan.chunks.len() as u32, summary.total_chunks);
    let total: u64 = plan.chunks.iter().map(|c| c.size).sum();
    assert_eq!(total, 200);
    for chunk in &plan.chunks {
        assert_eq!(chunk.replicas.len(), 3);
    }
}

#[tokio::test]
async fn test_replication_follows_cluster_size() {
    for (node_count, expected) in [(1usize, 1u32), (2, 2), (3, 2), (6, 3), (10, 4)] {
        let plane = TestPlane::with_nodes(node_count).await;
        let factor = target_replication_factor(node_count as u32, &plane.config.replication);
        assert_eq!(factor, expected, "cluster of {node_count}");

        let data = vec![9u8; 100];
        let summary = plane
            .uploader()
            .upload("sized.bin", &content_hash(&data), 100, &data[..])
            .await
            .expect("upload");
        assert_eq!(summary.replication_factor, expected);
    }
}

#[tokio::test]
async fn test_dead_cluster_refuses_upload_without_metadata() {
    let plane = TestPlane::with_nodes(3).await;
    for node in &plane.nodes {
        plane.take_down(node);
    }
    plane.monitor().check_all_nodes().await;
    assert_eq!(plane.registry.healthy_count(), 0);

    let data = vec![1u8; 100];
    let err = plane
        .uploader()
        .upload("doomed.bin", &content_hash(&data), 100, &data[..])
        .await
        .unwrap_err();

    assert!(matches!(err, MetaError::NoHealthyNodes));
    assert_eq!(plane.store.file_count(), 0);
    assert_eq!(plane.store.chunk_count(), 0);
}

#[tokio::test]
async fn test_upload_routes_around_unhealthy_node() {
    let plane = TestPlane::with_nodes(3).await;
    plane.take_down(&plane.nodes[0]);
    plane.monitor().check_all_nodes().await;
    assert_eq!(plane.registry.healthy_count(), 2);

    let data = vec![2u8; 100];
    let summary = plane
        .uploader()
        .upload("routed.bin", &content_hash(&data), 100, &data[..])
        .await
        .expect("upload");

    let chunks = plane.store.chunks_for_file(summary.file_id).await.unwrap();
    let down = plane.nodes[0].id;
    assert!(chunks.iter().all(|c| !c.replicas.contains(&down)));
    assert!(chunks.iter().all(|c| !c.replicas.is_empty()));
}

#[tokio::test]
async fn test_upload_then_delete_clears_metadata() {
    let plane = TestPlane::with_nodes(3).await;
    let data = vec![3u8; 150];

    let summary = plane
        .uploader()
        .upload("ephemeral.bin", &content_hash(&data), 150, &data[..])
        .await
        .expect("upload");
    assert!(plane.store.file_count() > 0);

    let receipt = plane
        .deleter()
        .delete(&summary.file_id.to_string())
        .await
        .expect("delete");
    assert_eq!(receipt.filename, "ephemeral.bin");
    assert_eq!(plane.store.file_count(), 0);
    assert_eq!(plane.store.chunk_count(), 0);

    // A second delete finds nothing.
    let err = plane
        .deleter()
        .delete(&summary.file_id.to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, MetaError::NotFound { .. }));
}

#[tokio::test]
async fn test_delete_tolerates_one_dead_replica_holder() {
    let plane = TestPlane::with_nodes(3).await;
    let data = vec![4u8; 150];

    let summary = plane
        .uploader()
        .upload("sticky.bin", &content_hash(&data), 150, &data[..])
        .await
        .expect("upload");

    plane.take_down(&plane.nodes[1]);
    plane
        .deleter()
        .delete(&summary.file_id.to_string())
        .await
        .expect("delete survives one dead holder");
    assert_eq!(plane.store.file_count(), 0);
}

#[tokio::test]
async fn test_failed_distribution_is_reconcilable() {
    let plane = TestPlane::with_nodes(2).await;
    for node in &plane.nodes {
        plane.client.refuse_uploads.insert(node.addr());
    }

    let data = vec![5u8; 100];
    let err = plane
        .uploader()
        .upload("stranded.bin", &content_hash(&data), 100, &data[..])
        .await
        .unwrap_err();
    assert!(matches!(err, MetaError::DistributionFailed { .. }));

    // The write-ahead records remain visible to reconciliation.
    let min = plane.config.replication.min_factor as usize;
    let stranded = plane.store.under_replicated_chunks(min).await.unwrap();
    assert!(!stranded.is_empty());
    assert!(stranded.iter().all(|c| c.replicas.is_empty()));
}

#[tokio::test]
async fn test_registrar_enrolls_and_reactivates() {
    let plane = TestPlane::with_nodes(0).await;
    let registrar = plane.registrar();

    let enrollment = registrar.register("10.1.0.1", 9000).await.expect("enroll");
    let id = enrollment.node().id;
    assert!(plane.registry.is_healthy(id));

    // Announcing again while healthy is a conflict.
    let err = registrar.register("10.1.0.1", 9000).await.unwrap_err();
    assert!(matches!(err, MetaError::NodeAlreadyRegistered { .. }));

    // After the monitor marks it down, the same address reactivates.
    plane.registry.set_health(id, false);
    let again = registrar.register("10.1.0.1", 9000).await.expect("reenroll");
    assert_eq!(again.node().id, id);
    assert!(plane.registry.is_healthy(id));
}

#[tokio::test]
async fn test_monitor_recovers_node_and_placement_uses_it() {
    let plane = TestPlane::with_nodes(2).await;
    plane.take_down(&plane.nodes[0]);
    plane.monitor().check_all_nodes().await;
    assert!(!plane.registry.is_healthy(plane.nodes[0].id));

    plane.client.unreachable.remove(&plane.nodes[0].addr());
    plane.monitor().check_all_nodes().await;
    assert!(plane.registry.is_healthy(plane.nodes[0].id));

    let data = vec![6u8; 100];
    let summary = plane
        .uploader()
        .upload("healed.bin", &content_hash(&data), 100, &data[..])
        .await
        .expect("upload");

    let chunks = plane.store.chunks_for_file(summary.file_id).await.unwrap();
    let recovered = plane.nodes[0].id;
    assert!(chunks.iter().any(|c| c.replicas.contains(&recovered)));
}

#[tokio::test]
async fn test_file_below_minimum_chunk_size_stays_whole() {
    // Production chunking bounds (1 MiB minimum), fast batch tuning.
    let mut plane = TestPlane::with_nodes(2).await;
    plane.config.chunking = Default::default();

    let data = vec![8u8; 500];
    let summary = plane
        .uploader()
        .upload("note.txt", &content_hash(&data), 500, &data[..])
        .await
        .expect("upload");

    assert_eq!(summary.total_chunks, 1);
    let chunks = plane.store.chunks_for_file(summary.file_id).await.unwrap();
    assert_eq!(chunks[0].size, 500);
}

#[tokio::test]
async fn test_small_file_is_one_chunk() {
    let plane = TestPlane::with_nodes(2).await;
    let data = vec![7u8; 5];

    let summary = plane
        .uploader()
        .upload("tiny.bin", &content_hash(&data), 5, &data[..])
        .await
        .expect("upload");

    assert_eq!(summary.total_chunks, 1);
    let chunks = plane.store.chunks_for_file(summary.file_id).await.unwrap();
    assert_eq!(chunks[0].size, 5);
}
