//! Circular container dependencies.
//!
//! Validates that a declared cycle fails the start phase fast, before
//! anything is started, and that teardown of cyclic containers completes
//! by force-stopping the remainder.

use orquestra::{BootstrapManager, BootstrapOptions};
use orquestra_core::context::ContextBuilder;
use orquestra_core::error::{LifecycleError, OrquestraError};

use crate::helpers::assertions::*;
use crate::helpers::mock_container::*;
use crate::helpers::tracker::EventTracker;

/// a -> b -> a, declared through value providers sharing a token.
fn cyclic_manager(tracker: &std::sync::Arc<EventTracker>) -> BootstrapManager {
    let inner_a = container("a", tracker);
    let b = container("b", tracker).depends_on([inner_a]);
    let a = container("a", tracker).depends_on([b]);
    BootstrapManager::new(ContextBuilder::new().container(a).build())
}

/// A -> B -> A fails with a circular-dependency error and never hangs.
#[tokio::test]
async fn test_e2e_cycle_fails_fast() {
    let tracker = EventTracker::new();
    let manager = cyclic_manager(&tracker);

    let err = within_timeout(manager.start(BootstrapOptions::default()))
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            OrquestraError::Lifecycle(LifecycleError::CircularDependency { .. })
        ),
        "unexpected error: {err}"
    );
    assert!(tracker.entries().is_empty(), "nothing should start");
}

/// A cycle elsewhere in the graph still blocks an unrelated container:
/// the check runs before any container starts.
#[tokio::test]
async fn test_e2e_cycle_blocks_unrelated_containers() {
    let tracker = EventTracker::new();
    let inner_a = container("a", &tracker);
    let b = container("b", &tracker).depends_on([inner_a]);
    let a = container("a", &tracker).depends_on([b]);
    let ctx = ContextBuilder::new()
        .container(container("standalone", &tracker))
        .container(a)
        .build();
    let manager = BootstrapManager::new(ctx);

    assert!(manager.start(BootstrapOptions::default()).await.is_err());
    assert_eq!(tracker.count("start:standalone"), 0);
}

/// Running containers in a cycle have no stoppable wave; teardown
/// force-stops all of them instead of deadlocking.
#[tokio::test]
async fn test_e2e_cycle_teardown_force_stops_remaining() {
    let tracker = EventTracker::new();
    let manager = cyclic_manager(&tracker);
    let ctx = manager.context().clone();

    // start directly, bypassing the cycle check
    for name in ["a", "b"] {
        registered(&ctx, name).unwrap().start().await.unwrap();
    }
    assert_eq!(tracker.with_prefix("start:").len(), 2);

    within_timeout(manager.teardown(BootstrapOptions::default()))
        .await
        .unwrap();

    let mut stops = tracker.with_prefix("stop:");
    stops.sort();
    assert_eq!(stops, vec!["stop:a", "stop:b"]);
    assert!(!registered(&ctx, "a").unwrap().is_running());
    assert!(!registered(&ctx, "b").unwrap().is_running());
}
