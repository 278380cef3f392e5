//! Container stop failures during teardown.
//!
//! Validates that a failing stop does not block the containers it depends
//! on, that teardown still completes, and that strict mode reports the
//! collected failures after the walk.

use orquestra::{BootstrapManager, BootstrapOptions, ContainerState};
use orquestra_core::context::ContextBuilder;
use orquestra_core::error::{LifecycleError, OrquestraError};

use crate::helpers::assertions::*;
use crate::helpers::config::TestConfigBuilder;
use crate::helpers::mock_container::*;
use crate::helpers::tracker::EventTracker;

fn chain_with_failing_middle(
    tracker: &std::sync::Arc<EventTracker>,
) -> orquestra_core::container::ContainerProvider {
    let a = container("a", tracker);
    let b = MockContainer::new("b", tracker)
        .failing_stop()
        .provider()
        .depends_on([a]);
    container("c", tracker).depends_on([b])
}

/// B fails to stop: A is still stopped afterwards, teardown succeeds, and
/// every container is reported stopped.
#[tokio::test]
async fn test_e2e_failed_stop_does_not_block_dependencies() {
    let tracker = EventTracker::new();
    let ctx = ContextBuilder::new()
        .container(chain_with_failing_middle(&tracker))
        .build();
    let manager = BootstrapManager::new(ctx);

    manager.start(BootstrapOptions::default()).await.unwrap();
    within_timeout(manager.teardown(BootstrapOptions::default()))
        .await
        .unwrap();

    assert_before(&tracker, "stop:c", "stop-failed:b");
    assert_before(&tracker, "stop-failed:b", "stop:a");
    assert!(
        manager
            .container_states()
            .iter()
            .all(|(_, s)| *s == ContainerState::Stopped),
        "{:?}",
        manager.container_states()
    );
}

/// Strict mode: the same walk completes, then the failure is returned.
#[tokio::test]
async fn test_e2e_strict_teardown_reports_failures() {
    let dir = tempfile::tempdir().unwrap();
    let tracker = EventTracker::new();
    let config = TestConfigBuilder::new(dir.path())
        .strict_container_teardown(true)
        .build();
    let ctx = ContextBuilder::new()
        .config(config)
        .container(chain_with_failing_middle(&tracker))
        .build();
    let manager = BootstrapManager::new(ctx);

    manager.start(BootstrapOptions::default()).await.unwrap();
    let err = manager
        .teardown(BootstrapOptions::default())
        .await
        .unwrap_err();

    match err {
        OrquestraError::Lifecycle(LifecycleError::ContainerTeardown { failures }) => {
            assert_eq!(failures.len(), 1);
            assert!(failures[0].starts_with("b:"), "{failures:?}");
            assert!(failures[0].contains("refused to stop"));
        }
        other => panic!("unexpected error: {other}"),
    }
    // the rest of the walk still ran
    assert_eq!(tracker.count("stop:a"), 1);
}
