use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use tfexport_registry::{ResourceDescriptor, ResourceRegistry};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_inserts_keep_one_descriptor_per_key() {
    let registry = Arc::new(ResourceRegistry::new());
    let mut handles = Vec::new();

    for writer in 0..16 {
        let registry = registry.clone();
        handles.push(tokio::spawn(async move {
            for id in 0..50 {
                let descriptor = ResourceDescriptor::new(format!("id-{id}"), "Project")
                    .with_lookup(format!("writer-{writer}"));
                registry.insert([descriptor]);
                tokio::task::yield_now().await;
            }
        }));
    }

    for handle in handles {
        handle.await.expect("writer task should not panic");
    }

    assert_eq!(registry.len(), 50);
    assert_eq!(registry.count_of_type("Project"), 50);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_check_then_insert_is_resolved_by_first_writer() {
    let registry = Arc::new(ResourceRegistry::new());
    let barrier = Arc::new(tokio::sync::Barrier::new(2));
    let mut handles = Vec::new();

    for writer in ["first", "second"] {
        let registry = registry.clone();
        let barrier = barrier.clone();
        handles.push(tokio::spawn(async move {
            // Both producers observe the key as free before either inserts.
            let seen = registry.exists("Environment", "env-1");
            barrier.wait().await;
            let kept = registry.insert([
                ResourceDescriptor::new("env-1", "Environment").with_lookup(writer),
            ]);
            (seen, kept)
        }));
    }

    let mut kept_total = 0;
    for handle in handles {
        let (seen, kept) = handle.await.expect("producer should not panic");
        assert!(!seen);
        kept_total += kept;
    }

    assert_eq!(kept_total, 1);
    assert_eq!(registry.len(), 1);
    let winner = registry.resolve("Environment", "env-1");
    assert!(winner == "first" || winner == "second");
}

#[tokio::test]
async fn sequential_writers_from_different_tasks_keep_the_first() {
    let registry = Arc::new(ResourceRegistry::new());

    let first = registry.clone();
    tokio::spawn(async move {
        first.insert([ResourceDescriptor::new("p", "Project").with_lookup("D1")]);
    })
    .await
    .expect("first writer should finish");

    let second = registry.clone();
    tokio::spawn(async move {
        second.insert([ResourceDescriptor::new("p", "Project").with_lookup("D2")]);
    })
    .await
    .expect("second writer should finish");

    assert_eq!(registry.resolve("Project", "p"), "D1");
}

#[test]
fn lookup_misses_never_fail() {
    let registry = ResourceRegistry::new();

    assert_eq!(registry.resolve("Project", "missing"), "");
    assert_eq!(registry.resolve_dependency("Project", "missing"), "");
    assert_eq!(registry.resolve_count("Project", "missing"), "");
    assert_eq!(registry.resolve_name("Project", "missing"), "");
    assert_eq!(registry.resolve_version_lookup("Project", "missing"), "");
    assert_eq!(registry.resolve_version_current("Project", "missing"), "");
    assert!(registry.resolve_many("Project", ["missing"]).is_empty());
    assert!(registry.resolve_children("missing", "Step").is_empty());
    assert!(registry.select_by_type_below_sort("Project", i64::MAX).is_empty());
}

fn key_strategy() -> impl Strategy<Value = (String, String)> {
    (
        prop_oneof![Just(String::new()), "[a-c]{1,2}"],
        prop_oneof![Just(String::new()), Just("Project".to_string()), Just("Step".to_string())],
    )
}

proptest! {
    #[test]
    fn registry_holds_at_most_one_descriptor_per_key(
        batches in prop::collection::vec(prop::collection::vec(key_strategy(), 0..8), 0..8)
    ) {
        let registry = ResourceRegistry::new();
        let mut unkeyed = 0;
        let mut keys = HashSet::new();

        for batch in &batches {
            registry.insert(batch.iter().map(|(id, kind)| ResourceDescriptor::new(id, kind)));
            for (id, kind) in batch {
                if id.is_empty() || kind.is_empty() {
                    unkeyed += 1;
                } else {
                    keys.insert((id.clone(), kind.clone()));
                }
            }
        }

        prop_assert_eq!(registry.len(), keys.len() + unkeyed);
        for (id, kind) in &keys {
            prop_assert!(registry.exists(kind, id));
        }
    }
}
