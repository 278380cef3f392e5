//! Phase ordering across component kinds.
//!
//! Validates helpers -> containers -> HTTP server -> plugins -> services on
//! start, the mirrored order on teardown, hook failure propagation, and
//! the non-fatal HTTP server close.

use orquestra::{BootstrapManager, BootstrapOptions};
use orquestra_core::context::ContextBuilder;
use orquestra_core::error::{LifecycleError, OrquestraError};
use orquestra_core::http::{HTTP_SERVER_TOKEN, OrquestraHttpServer};

use crate::helpers::mock_component::*;
use crate::helpers::mock_container::*;
use crate::helpers::tracker::EventTracker;

fn full_context(tracker: &std::sync::Arc<EventTracker>, fail_close: bool) -> ContextBuilder {
    ContextBuilder::new()
        .service(component("service", tracker))
        .plugin(component("plugin", tracker))
        .container(container("db", tracker))
        .helper(component("helper", tracker))
        .http_server_factory(http_factory(tracker, fail_close))
}

/// Start and teardown run the phases in mirrored order.
#[tokio::test]
async fn test_e2e_phase_order() {
    let tracker = EventTracker::new();
    let manager = BootstrapManager::new(full_context(&tracker, false).build());

    manager.start(BootstrapOptions::default()).await.unwrap();
    assert_eq!(
        tracker.entries(),
        vec![
            "start:helper",
            "start:db",
            "http:create",
            "start:plugin",
            "start:service",
        ]
    );

    manager.teardown(BootstrapOptions::default()).await.unwrap();
    assert_eq!(
        tracker.entries()[5..].to_vec(),
        vec![
            "teardown:service",
            "teardown:plugin",
            "http:close",
            "stop:db",
            "teardown:helper",
        ]
    );
}

/// `skip_containers` leaves the container phase out of both directions.
#[tokio::test]
async fn test_e2e_skip_containers() {
    let tracker = EventTracker::new();
    let manager = BootstrapManager::new(full_context(&tracker, false).build());

    manager
        .start(BootstrapOptions::skip_containers())
        .await
        .unwrap();
    manager
        .teardown(BootstrapOptions::skip_containers())
        .await
        .unwrap();

    assert_eq!(tracker.count("start:db"), 0);
    assert_eq!(tracker.count("stop:db"), 0);
    assert_eq!(tracker.count("start:service"), 1);
    assert_eq!(tracker.count("teardown:helper"), 1);
}

/// The factory result becomes the active server under the well-known token.
#[tokio::test]
async fn test_e2e_http_factory_registers_server() {
    let tracker = EventTracker::new();
    let ctx = ContextBuilder::new()
        .http_server_factory(http_factory(&tracker, false))
        .build();
    let manager = BootstrapManager::new(ctx.clone());
    assert!(ctx.registry().get(&HTTP_SERVER_TOKEN).is_none());

    manager.start(BootstrapOptions::default()).await.unwrap();
    assert_eq!(tracker.count("http:create"), 1);

    let server = ctx
        .registry()
        .get_as::<OrquestraHttpServer>(&HTTP_SERVER_TOKEN)
        .unwrap();
    assert_eq!(server.create_client().base_url(), "http://127.0.0.1:3000");
    assert!(server.app::<()>().is_some());
}

/// A failing close handler is logged and teardown continues.
#[tokio::test]
async fn test_e2e_http_close_failure_is_not_fatal() {
    let tracker = EventTracker::new();
    let manager = BootstrapManager::new(full_context(&tracker, true).build());

    manager.start(BootstrapOptions::default()).await.unwrap();
    manager.teardown(BootstrapOptions::default()).await.unwrap();

    assert_eq!(tracker.count("http:close"), 1);
    assert_eq!(tracker.count("stop:db"), 1);
    assert_eq!(tracker.count("teardown:helper"), 1);
}

/// No HTTP server at all is not an error.
#[tokio::test]
async fn test_e2e_without_http_server() {
    let tracker = EventTracker::new();
    let ctx = ContextBuilder::new()
        .helper(component("helper", &tracker))
        .build();
    let manager = BootstrapManager::new(ctx);

    manager.start(BootstrapOptions::default()).await.unwrap();
    manager.teardown(BootstrapOptions::default()).await.unwrap();
    assert_eq!(tracker.entries(), vec!["start:helper", "teardown:helper"]);
}

/// A failing helper hook aborts start before later phases run.
#[tokio::test]
async fn test_e2e_hook_failure_aborts_start() {
    let tracker = EventTracker::new();
    let ctx = ContextBuilder::new()
        .helper(RecordingComponent::new("helper", &tracker).failing_start().provider())
        .container(container("db", &tracker))
        .plugin(component("plugin", &tracker))
        .build();
    let manager = BootstrapManager::new(ctx);

    let err = manager
        .start(BootstrapOptions::default())
        .await
        .unwrap_err();
    match err {
        OrquestraError::Lifecycle(LifecycleError::Hook {
            component, hook, ..
        }) => {
            assert_eq!(component, "helper");
            assert_eq!(hook, "on_start");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(tracker.entries().is_empty());
}

/// `provision` starts infrastructure without creating the HTTP server.
#[tokio::test]
async fn test_e2e_provision_skips_http_server() {
    let tracker = EventTracker::new();
    let manager = BootstrapManager::new(full_context(&tracker, false).build());

    manager.provision().await.unwrap();
    assert_eq!(
        tracker.entries(),
        vec!["start:helper", "start:db", "start:plugin", "start:service"]
    );

    manager.deprovision().await.unwrap();
    assert_eq!(tracker.count("http:close"), 0);
    assert_eq!(tracker.count("stop:db"), 1);
    assert_eq!(tracker.count("teardown:helper"), 1);
}
