//! Tests for the hash ring.
//!
//! # Test Strategy
//!
//! 1. **Construction**: empty list, duplicates, builder settings
//! 2. **Lookup**: consistency, wrap-around, walk order
//! 3. **Replica sets**: distinctness, primary agreement, N == R
//! 4. **Membership**: add/remove with index compaction
//! 5. **Determinism**: insertion-order independence, proptest properties

use corelib::partitioner::Partitioner;
use corelib::ring::RingBuilder;
use corelib::token::RingToken;
use corelib::{Error, HashRing, Node};
use proptest::prelude::*;
use std::sync::Arc;

fn node(port: u16) -> Node {
    Node::new("127.0.0.1", port)
}

fn cluster(ports: &[u16]) -> Vec<Node> {
    ports.iter().map(|&p| node(p)).collect()
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_empty_node_list_fails() {
    assert_eq!(HashRing::new(&[]).unwrap_err(), Error::EmptyNodeList);
}

#[test]
fn test_duplicate_node_fails() {
    let err = HashRing::new(&cluster(&[8081, 8081])).unwrap_err();
    assert_eq!(err, Error::DuplicateNode(node(8081)));
}

#[test]
fn test_default_vnode_count() {
    let ring = HashRing::new(&cluster(&[8081, 8082])).unwrap();
    assert_eq!(ring.node_count(), 2);
    // Default is 100 vnodes per node
    assert_eq!(ring.token_count(), 200);
}

#[test]
fn test_builder_custom_vnodes() {
    let ring = RingBuilder::new()
        .with_vnodes(8)
        .add_node(node(8081))
        .add_node(node(8082))
        .build()
        .unwrap();
    assert_eq!(ring.token_count(), 16);
}

#[test]
fn test_builder_rejects_zero_vnodes() {
    let result = RingBuilder::new().with_vnodes(0).add_node(node(8081)).build();
    assert!(result.is_err());
}

// ============================================================================
// Lookup
// ============================================================================

#[test]
fn test_consistent_lookup() {
    let ring = HashRing::new(&cluster(&[8081, 8082, 8083])).unwrap();
    let first = ring.primary_for_key(b"consistent-key");
    for _ in 0..10 {
        assert_eq!(ring.primary_for_key(b"consistent-key"), first);
    }
}

#[test]
fn test_single_node_owns_everything() {
    let ring = HashRing::new(&cluster(&[8081])).unwrap();
    for key in [&b"key1"[..], b"key2", b"key3", b"very-long-key-name"] {
        assert_eq!(ring.primary_for_key(key), node(8081));
    }
}

/// Partitioner with a fixed position table, so the walk order is known
/// exactly. Vnode keys are pinned; test keys select positions relative to
/// them.
struct FixedPartitioner;

impl Partitioner for FixedPartitioner {
    fn position(&self, key: &[u8]) -> RingToken {
        RingToken(match key {
            b"10.0.0.1:1:0" => 100,
            b"10.0.0.2:2:0" => 200,
            b"before-all" => 50,
            b"between" => 150,
            b"beyond-all" => 500,
            other => panic!("unexpected key {:?}", other),
        })
    }

    fn name(&self) -> &'static str {
        "FixedPartitioner"
    }
}

#[test]
fn test_wrap_around_past_highest_position() {
    let ring = RingBuilder::new()
        .with_vnodes(1)
        .with_partitioner(Arc::new(FixedPartitioner))
        .add_node(Node::new("10.0.0.1", 1))
        .add_node(Node::new("10.0.0.2", 2))
        .build()
        .unwrap();

    // Ring positions: 100 -> node1, 200 -> node2.
    // A key hashing past every position wraps to the lowest.
    assert_eq!(ring.primary_for_key(b"beyond-all"), Node::new("10.0.0.1", 1));
    // A key before every position takes the first.
    assert_eq!(ring.primary_for_key(b"before-all"), Node::new("10.0.0.1", 1));
    // A key between the two takes the successor.
    assert_eq!(ring.primary_for_key(b"between"), Node::new("10.0.0.2", 2));
}

#[test]
fn test_replica_walk_order_is_clockwise() {
    let ring = RingBuilder::new()
        .with_vnodes(1)
        .with_partitioner(Arc::new(FixedPartitioner))
        .add_node(Node::new("10.0.0.1", 1))
        .add_node(Node::new("10.0.0.2", 2))
        .build()
        .unwrap();

    // From position 150 the walk visits 200 then wraps to 100.
    let replicas = ring.replicas_for_key(b"between", 2).unwrap();
    assert_eq!(replicas, vec![Node::new("10.0.0.2", 2), Node::new("10.0.0.1", 1)]);
}

// ============================================================================
// Replica sets
// ============================================================================

#[test]
fn test_replicas_distinct_and_led_by_primary() {
    let ring = HashRing::new(&cluster(&[8081, 8082, 8083, 8084])).unwrap();

    for i in 0..100 {
        let key = format!("key-{}", i);
        let replicas = ring.replicas_for_key(key.as_bytes(), 3).unwrap();

        assert_eq!(replicas.len(), 3);
        assert_eq!(replicas[0], ring.primary_for_key(key.as_bytes()));

        let unique: std::collections::HashSet<_> = replicas.iter().collect();
        assert_eq!(unique.len(), 3, "replicas must be distinct physical nodes");
    }
}

#[test]
fn test_replicas_with_cluster_size_equal_to_factor() {
    let nodes = cluster(&[8081, 8082, 8083]);
    let ring = HashRing::new(&nodes).unwrap();

    // N == R: every node appears exactly once.
    let replicas = ring.replicas_for_key(b"any-key", 3).unwrap();
    let mut sorted = replicas.clone();
    sorted.sort();
    let mut expected = nodes.clone();
    expected.sort();
    assert_eq!(sorted, expected);
}

#[test]
fn test_replicas_insufficient_nodes() {
    let ring = HashRing::new(&cluster(&[8081, 8082])).unwrap();
    assert_eq!(
        ring.replicas_for_key(b"key", 3).unwrap_err(),
        Error::NotEnoughNodes { have: 2, need: 3 }
    );
}

// ============================================================================
// Membership
// ============================================================================

#[test]
fn test_add_existing_node_fails() {
    let mut ring = HashRing::new(&cluster(&[8081, 8082])).unwrap();
    assert_eq!(
        ring.add_node(node(8081)).unwrap_err(),
        Error::DuplicateNode(node(8081))
    );
}

#[test]
fn test_remove_unknown_node_fails() {
    let mut ring = HashRing::new(&cluster(&[8081, 8082])).unwrap();
    assert_eq!(
        ring.remove_node(&node(9999)).unwrap_err(),
        Error::UnknownNode(node(9999))
    );
}

#[test]
fn test_remove_node_compacts_indices() {
    let mut ring = RingBuilder::new()
        .with_vnodes(16)
        .add_nodes(&cluster(&[8081, 8082, 8083, 8084]))
        .build()
        .unwrap();

    // Remove a node from the middle of the slot vector; remaining entries
    // must keep resolving to valid, still-present nodes.
    ring.remove_node(&node(8082)).unwrap();
    assert_eq!(ring.node_count(), 3);
    assert_eq!(ring.token_count(), 48);

    let remaining = cluster(&[8081, 8083, 8084]);
    for i in 0..200 {
        let key = format!("key-{}", i);
        let primary = ring.primary_for_key(key.as_bytes());
        assert!(remaining.contains(&primary), "lookup returned removed node");

        for replica in ring.replicas_for_key(key.as_bytes(), 3).unwrap() {
            assert!(remaining.contains(&replica));
        }
    }
}

#[test]
fn test_remove_then_readd() {
    let mut ring = HashRing::new(&cluster(&[8081, 8082])).unwrap();
    ring.remove_node(&node(8081)).unwrap();
    assert_eq!(ring.node_count(), 1);
    assert_eq!(ring.nodes(), &[node(8082)]);
    ring.add_node(node(8081)).unwrap();
    assert_eq!(ring.node_count(), 2);
    assert_eq!(ring.token_count(), 200);
    assert_eq!(ring.nodes(), &[node(8082), node(8081)]);
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn test_insertion_order_does_not_matter() {
    // Two rings over the same node set, inserted in different orders, must
    // agree on primary and replica set for every key.
    let forward = HashRing::new(&cluster(&[8081, 8082, 8083, 8084])).unwrap();
    let backward = HashRing::new(&cluster(&[8084, 8083, 8082, 8081])).unwrap();

    for i in 0..10_000 {
        let key = format!("key-{}", i);
        assert_eq!(
            forward.primary_for_key(key.as_bytes()),
            backward.primary_for_key(key.as_bytes())
        );
        assert_eq!(
            forward.replicas_for_key(key.as_bytes(), 3).unwrap(),
            backward.replicas_for_key(key.as_bytes(), 3).unwrap()
        );
    }
}

proptest! {
    #[test]
    fn prop_replica_sets_agree_and_stay_distinct(key in any::<Vec<u8>>()) {
        let ports = [9001u16, 9002, 9003, 9004, 9005];
        let a = RingBuilder::new()
            .with_vnodes(16)
            .add_nodes(&cluster(&ports))
            .build()
            .unwrap();
        let mut reversed = cluster(&ports);
        reversed.reverse();
        let b = RingBuilder::new()
            .with_vnodes(16)
            .add_nodes(&reversed)
            .build()
            .unwrap();

        let ra = a.replicas_for_key(&key, 3).unwrap();
        let rb = b.replicas_for_key(&key, 3).unwrap();

        prop_assert_eq!(&ra, &rb);
        prop_assert_eq!(ra[0].clone(), a.primary_for_key(&key));
        let unique: std::collections::HashSet<_> = ra.iter().collect();
        prop_assert_eq!(unique.len(), 3);
    }
}
