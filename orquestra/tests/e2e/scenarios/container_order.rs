//! Dependency-ordered container start and stop.
//!
//! Validates that a container never starts before its dependencies and
//! never stops before its dependents, and that independent containers
//! start in parallel.

use std::time::Duration;

use orquestra::{BootstrapManager, BootstrapOptions, ContainerState};
use orquestra_core::context::ContextBuilder;

use crate::helpers::assertions::*;
use crate::helpers::mock_container::*;
use crate::helpers::tracker::EventTracker;

/// A <- B <- C: start A, B, C; stop C, B, A.
///
/// Only C is registered at the top level; A and B are reached through
/// `depends_on`.
#[tokio::test]
async fn test_e2e_chain_starts_dependencies_first() {
    let tracker = EventTracker::new();
    let a = container("a", &tracker);
    let b = container("b", &tracker).depends_on([a]);
    let c = container("c", &tracker).depends_on([b]);

    let ctx = ContextBuilder::new().container(c).build();
    let manager = BootstrapManager::new(ctx);
    assert_eq!(manager.graph().len(), 3);

    manager.start(BootstrapOptions::default()).await.unwrap();
    assert_eq!(tracker.entries(), vec!["start:a", "start:b", "start:c"]);
    assert!(
        manager
            .container_states()
            .iter()
            .all(|(_, s)| *s == ContainerState::Running)
    );

    manager.teardown(BootstrapOptions::default()).await.unwrap();
    assert_eq!(
        tracker.with_prefix("stop:"),
        vec!["stop:c", "stop:b", "stop:a"]
    );
    assert!(
        manager
            .container_states()
            .iter()
            .all(|(_, s)| *s == ContainerState::Stopped)
    );
}

/// Diamond: gateway -> {api, worker} -> db. The shared dependency starts
/// exactly once, before both of its dependents, and stops last.
#[tokio::test]
async fn test_e2e_diamond_shared_dependency_starts_once() {
    let tracker = EventTracker::new();
    let db = container("db", &tracker);
    let api = container("api", &tracker).depends_on([db.clone()]);
    let worker = container("worker", &tracker).depends_on([db.clone()]);
    let gateway = container("gateway", &tracker).depends_on([api.clone(), worker.clone()]);

    let ctx = ContextBuilder::new()
        .container(db)
        .container(api)
        .container(worker)
        .container(gateway)
        .build();
    let manager = BootstrapManager::new(ctx);

    within_timeout(manager.start(BootstrapOptions::default()))
        .await
        .unwrap();
    assert_eq!(tracker.count("start:db"), 1);
    assert_before(&tracker, "start:db", "start:api");
    assert_before(&tracker, "start:db", "start:worker");
    assert_before(&tracker, "start:api", "start:gateway");
    assert_before(&tracker, "start:worker", "start:gateway");

    within_timeout(manager.teardown(BootstrapOptions::default()))
        .await
        .unwrap();
    assert_eq!(tracker.with_prefix("stop:").len(), 4);
    assert_before(&tracker, "stop:gateway", "stop:api");
    assert_before(&tracker, "stop:gateway", "stop:worker");
    assert_before(&tracker, "stop:api", "stop:db");
    assert_before(&tracker, "stop:worker", "stop:db");
}

/// Independent containers start concurrently: two 100ms starts finish in
/// about 100ms of (paused) time, not 200ms.
#[tokio::test(start_paused = true)]
async fn test_e2e_independent_containers_start_in_parallel() {
    let tracker = EventTracker::new();
    let delay = Duration::from_millis(100);
    let ctx = ContextBuilder::new()
        .container(
            MockContainer::new("redis", &tracker)
                .with_start_delay(delay)
                .provider(),
        )
        .container(
            MockContainer::new("kafka", &tracker)
                .with_start_delay(delay)
                .provider(),
        )
        .build();
    let manager = BootstrapManager::new(ctx);

    let started = tokio::time::Instant::now();
    manager.start(BootstrapOptions::default()).await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(tracker.with_prefix("start:").len(), 2);
    assert!(
        elapsed < Duration::from_millis(150),
        "containers started sequentially: {elapsed:?}"
    );
}

/// Starting twice does not restart running containers.
#[tokio::test]
async fn test_e2e_restart_is_idempotent() {
    let tracker = EventTracker::new();
    let ctx = ContextBuilder::new()
        .container(container("db", &tracker))
        .build();
    let manager = BootstrapManager::new(ctx);

    manager.start(BootstrapOptions::default()).await.unwrap();
    manager.start(BootstrapOptions::default()).await.unwrap();
    assert_eq!(tracker.count("start:db"), 1);

    // stopped containers start again on the next start
    manager.teardown(BootstrapOptions::default()).await.unwrap();
    manager.start(BootstrapOptions::default()).await.unwrap();
    assert_eq!(tracker.count("start:db"), 2);
}

/// A container that fails to start aborts the start phase with its name.
#[tokio::test]
async fn test_e2e_container_start_failure_propagates() {
    let tracker = EventTracker::new();
    let db = MockContainer::new("db", &tracker).failing_start().provider();
    let api = container("api", &tracker).depends_on([db]);
    let ctx = ContextBuilder::new().container(api).build();
    let manager = BootstrapManager::new(ctx);

    let err = manager
        .start(BootstrapOptions::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("failed to start container 'db'"));
    assert_eq!(tracker.count("start:api"), 0);
}

/// A failing container does not cancel an independent sibling that is still
/// starting: the sibling finishes, stays running, and teardown stops it.
#[tokio::test(start_paused = true)]
async fn test_e2e_start_failure_lets_siblings_settle() {
    let tracker = EventTracker::new();
    let ctx = ContextBuilder::new()
        .container(
            MockContainer::new("slow", &tracker)
                .with_start_delay(Duration::from_millis(100))
                .provider(),
        )
        .container(MockContainer::new("broken", &tracker).failing_start().provider())
        .build();
    let manager = BootstrapManager::new(ctx);

    let err = manager
        .start(BootstrapOptions::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("failed to start container 'broken'"));
    assert_eq!(tracker.count("start-failed:broken"), 1);
    assert_eq!(tracker.count("start:slow"), 1);
    assert_before(&tracker, "start-failed:broken", "start:slow");

    let slow_state = manager
        .container_states()
        .into_iter()
        .find(|(t, _)| t.name() == "slow")
        .map(|(_, s)| s);
    assert_eq!(slow_state, Some(ContainerState::Running));

    manager.teardown(BootstrapOptions::default()).await.unwrap();
    assert_eq!(tracker.with_prefix("stop:"), vec!["stop:slow"]);
}
