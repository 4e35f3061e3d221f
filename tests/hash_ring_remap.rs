// ==============================================
// CONSISTENT HASH RING REMAPPING (integration)
// ==============================================
//
// Removing one node must only move the keys that node owned.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread;

use evictkit::hash_ring::HashRing;

fn ten_node_ring() -> HashRing {
    let ring = HashRing::new(3, None).unwrap();
    for i in 0..10 {
        ring.add_node(&format!("node-{i}"));
    }
    ring
}

fn assignments(ring: &HashRing) -> HashMap<String, String> {
    (0..1000)
        .map(|i| {
            let key = format!("key-{i}");
            let owner = ring.get_node(&key).unwrap();
            (key, owner)
        })
        .collect()
}

#[test]
fn removing_a_node_remaps_few_keys() {
    let ring = ten_node_ring();
    assert_eq!(ring.node_count(), 10);
    let before = assignments(&ring);

    assert!(ring.remove_node("node-3"));
    let after = assignments(&ring);

    let moved = before
        .iter()
        .filter(|(key, owner)| after[key.as_str()] != **owner)
        .count();
    assert!(moved < 150, "{moved} of 1000 keys moved");

    // Only keys owned by the removed node may move.
    for (key, owner) in &before {
        if owner != "node-3" {
            assert_eq!(&after[key.as_str()], owner, "{key} moved off a surviving node");
        }
    }
    assert!(after.values().all(|owner| owner != "node-3"));
}

#[test]
fn re_adding_a_node_restores_assignments() {
    let ring = ten_node_ring();
    let before = assignments(&ring);
    ring.remove_node("node-7");
    ring.add_node("node-7");
    assert_eq!(assignments(&ring), before);
}

#[test]
fn concurrent_lookups_during_membership_changes() {
    let ring = Arc::new(ten_node_ring());
    let readers: Vec<_> = (0..4)
        .map(|t| {
            let ring = Arc::clone(&ring);
            thread::spawn(move || {
                for i in 0..2_000 {
                    let owner = ring.get_node(&format!("t{t}-{i}"));
                    assert!(owner.is_some());
                }
            })
        })
        .collect();

    for round in 0..50 {
        let node = format!("extra-{}", round % 5);
        ring.add_node(&node);
        ring.remove_node(&node);
    }
    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(ring.node_count(), 10);
    assert_eq!(ring.virtual_node_count(), ring.node_stats().values().sum::<usize>());
}
