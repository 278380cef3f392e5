//! Full facade run: build, start, run a feature into the shard log,
//! teardown.

use orquestra::{BootstrapOptions, ContainerState, Orquestra};
use orquestra_bdd::{FeatureDefinition, StepContext};
use orquestra_core::component::{Constructible, Injectable};
use orquestra_core::context::Context;
use orquestra_core::error::{LifecycleError, OrquestraError, ProviderError};
use orquestra_core::macros::OrquestraMacro;
use orquestra_core::registry::{Provider, Token};
use orquestra_shard::{StepStatus, Timeline};
use serde_json::{Value, json};
use serial_test::serial;

use crate::helpers::config::TestConfigBuilder;
use crate::helpers::mock_component::*;
use crate::helpers::mock_container::*;
use crate::helpers::tracker::EventTracker;

#[derive(Debug)]
struct Inventory {
    items: u32,
}

impl Injectable for Inventory {}

impl Constructible for Inventory {
    fn construct(_ctx: &Context) -> Self {
        Self { items: 2 }
    }
}

struct RegisteredUser;

impl OrquestraMacro for RegisteredUser {
    fn title(&self) -> &str {
        "there is a user registered in database"
    }

    async fn execute(&self, _ctx: StepContext) -> anyhow::Result<Value> {
        Ok(json!({ "user": "alice" }))
    }
}

fn definition() -> FeatureDefinition {
    FeatureDefinition::new("shopper", "to pay for my cart", "my order ships")
}

/// "checkout": Given cart has 2 items -> When user pays -> Then order
/// confirmed. The shard log holds three pending events followed by three
/// success events, in declaration order.
#[tokio::test]
async fn test_e2e_checkout_feature_records_to_shard_log() {
    let dir = tempfile::tempdir().unwrap();
    let tracker = EventTracker::new();
    let orquestra = Orquestra::builder()
        .config(TestConfigBuilder::new(dir.path()).run_id("checkout").build())
        .helper(Provider::class::<Inventory>())
        .container(container("db", &tracker))
        .build()
        .unwrap();

    orquestra.start(None).await.unwrap();
    let inventory = orquestra.get::<Inventory>(Token::of::<Inventory>()).unwrap();
    assert_eq!(inventory.items, 2);

    let mut feature = orquestra.feature("checkout", definition());
    let items = inventory.items;
    feature
        .scenario("pay with card")
        .given("cart has 2 items", move |_| async move { Ok(json!({ "items": items })) })
        .when("user pays", |ctx: StepContext| async move {
            Ok(json!({ "paid": ctx.require::<u32>("items")? == 2 }))
        })
        .then("order confirmed", |ctx: StepContext| async move {
            anyhow::ensure!(ctx.get::<bool>("paid") == Some(true), "order not paid");
            Ok(())
        });
    assert_eq!(feature.run_id(), "checkout");

    feature.test().await.unwrap();
    orquestra.teardown().await.unwrap();

    let events = orquestra.shards().read_events().await.unwrap();
    let observed: Vec<_> = events
        .iter()
        .map(|e| (e.status, e.step_name.as_str()))
        .collect();
    assert_eq!(
        observed,
        vec![
            (StepStatus::Pending, "cart has 2 items"),
            (StepStatus::Pending, "user pays"),
            (StepStatus::Pending, "order confirmed"),
            (StepStatus::Success, "cart has 2 items"),
            (StepStatus::Success, "user pays"),
            (StepStatus::Success, "order confirmed"),
        ]
    );

    let summary = Timeline::fold(events).summary();
    assert_eq!(summary.success, 3);
    assert_eq!(summary.pending, 0);

    assert_eq!(tracker.entries(), vec!["start:db", "stop:db"]);
    assert_eq!(
        orquestra.container_states(),
        vec![(Token::named("db"), ContainerState::Stopped)]
    );
}

/// A registered macro is reachable from `given_step` by its title.
#[tokio::test]
async fn test_e2e_macro_given_step() {
    let dir = tempfile::tempdir().unwrap();
    let orquestra = Orquestra::builder()
        .config(TestConfigBuilder::new(dir.path()).run_id("macros").build())
        .macro_(RegisteredUser)
        .unwrap()
        .build()
        .unwrap();

    let mut feature = orquestra.feature("accounts", definition());
    feature
        .scenario("user logs in")
        .given_step("there is a user registered in database")
        .unwrap()
        .then("user is known", |ctx: StepContext| async move {
            anyhow::ensure!(ctx.get::<String>("user").as_deref() == Some("alice"));
            Ok(())
        });

    let outcomes = feature.test().await.unwrap();
    assert_eq!(outcomes[0].context.get::<String>("user").unwrap(), "alice");
}

/// `get` only returns already-resolved instances.
#[tokio::test]
async fn test_e2e_get_before_start_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let tracker = EventTracker::new();
    let orquestra = Orquestra::builder()
        .config(TestConfigBuilder::new(dir.path()).build())
        .helper(Provider::class::<Inventory>())
        .plugin(component("plugin", &tracker))
        .build()
        .unwrap();

    let err = orquestra
        .get::<Inventory>(Token::of::<Inventory>())
        .unwrap_err();
    assert!(matches!(
        err,
        OrquestraError::Provider(ProviderError::NotFound { .. })
    ));
    assert!(err.to_string().contains("Inventory"));

    // value providers are available immediately, with type checking
    assert!(orquestra.get::<RecordingComponent>("plugin").is_ok());
    assert!(matches!(
        orquestra.get::<Inventory>("plugin"),
        Err(OrquestraError::Provider(ProviderError::TypeMismatch { .. }))
    ));
}

/// `http()` fails without a server and returns a client once the factory
/// has run.
#[tokio::test]
async fn test_e2e_http_client_after_start() {
    let dir = tempfile::tempdir().unwrap();
    let tracker = EventTracker::new();
    let orquestra = Orquestra::builder()
        .config(TestConfigBuilder::new(dir.path()).build())
        .http_server_factory(http_factory(&tracker, false))
        .build()
        .unwrap();

    assert!(matches!(
        orquestra.http(),
        Err(OrquestraError::Lifecycle(LifecycleError::HttpServerMissing))
    ));

    orquestra.start(None).await.unwrap();
    let client = orquestra.http().unwrap();
    assert_eq!(client.base_url(), "http://127.0.0.1:3000");

    orquestra.teardown().await.unwrap();
    assert_eq!(tracker.entries(), vec!["http:create", "http:close"]);
}

/// Options given to `start` are reused by `teardown`.
#[tokio::test]
async fn test_e2e_start_options_are_remembered() {
    let dir = tempfile::tempdir().unwrap();
    let tracker = EventTracker::new();
    let orquestra = Orquestra::builder()
        .config(TestConfigBuilder::new(dir.path()).build())
        .container(container("db", &tracker))
        .build()
        .unwrap();

    orquestra
        .start(Some(BootstrapOptions::skip_containers()))
        .await
        .unwrap();
    orquestra.teardown().await.unwrap();
    assert!(tracker.entries().is_empty());
}

/// Without an explicit id, the run id comes from the configured
/// environment variable and is generated and published when unset.
#[tokio::test]
#[serial]
async fn test_e2e_run_id_from_environment() {
    const ENV: &str = "ORQUESTRA_E2E_RUN_ID";
    let dir = tempfile::tempdir().unwrap();

    // SAFETY: serialized test; no other thread reads this variable.
    unsafe { std::env::set_var(ENV, "from-env") };
    let orquestra = Orquestra::builder()
        .config(TestConfigBuilder::new(dir.path()).run_id_from_env(ENV).build())
        .build()
        .unwrap();
    assert_eq!(orquestra.run_id().as_str(), "from-env");

    // SAFETY: as above.
    unsafe { std::env::remove_var(ENV) };
    let orquestra = Orquestra::builder()
        .config(TestConfigBuilder::new(dir.path()).run_id_from_env(ENV).build())
        .build()
        .unwrap();
    let generated = orquestra.run_id().as_str().to_owned();
    assert!(!generated.is_empty());
    assert_eq!(std::env::var(ENV).unwrap(), generated);

    // SAFETY: as above.
    unsafe { std::env::remove_var(ENV) };
}

/// The reporter runs after teardown without affecting the result.
#[tokio::test]
async fn test_e2e_teardown_with_reporter() {
    let dir = tempfile::tempdir().unwrap();
    let orquestra = Orquestra::builder()
        .config(
            TestConfigBuilder::new(dir.path())
                .run_id("reported")
                .reporter(true)
                .build(),
        )
        .build()
        .unwrap();

    let mut feature = orquestra.feature("reporting", definition());
    feature
        .scenario("always passes")
        .given("nothing", |_| async { Ok(()) });
    feature.test().await.unwrap();

    orquestra.start(None).await.unwrap();
    orquestra.teardown().await.unwrap();
    assert_eq!(orquestra.shards().read_events().await.unwrap().len(), 2);
}
