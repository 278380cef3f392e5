//! The [`Orquestra`] facade -- one object a test suite builds, starts,
//! defines features on, and tears down.

use std::sync::{Arc, Mutex};

use orquestra_bdd::{DynEventSink, Feature, FeatureDefinition};
use orquestra_core::component::{Injectable, downcast};
use orquestra_core::config::OrquestraConfig;
use orquestra_core::container::ContainerProvider;
use orquestra_core::context::{Context, ContextBuilder};
use orquestra_core::error::{LifecycleError, MacroError, OrquestraError, ProviderError};
use orquestra_core::http::{
    HTTP_SERVER_TOKEN, HttpServerAdapter, HttpServerFactory, OrquestraHttpServer, TestClient,
};
use orquestra_core::macros::OrquestraMacro;
use orquestra_core::registry::{Provider, Token};
use orquestra_shard::{ConsoleReporter, RunId, ShardManager};

use crate::bootstrap::{BootstrapManager, BootstrapOptions, ContainerState};
use crate::logging;

/// Test-suite entry point.
///
/// # Example
///
/// ```ignore
/// let orquestra = Orquestra::builder()
///     .helper(Provider::class::<DatabaseHelper>())
///     .container(ContainerProvider::of::<PostgresContainer>())
///     .build()?;
///
/// orquestra.start(None).await?;
/// let mut feature = orquestra.feature("checkout", FeatureDefinition::new(
///     "customer", "to pay for my cart", "I receive my order",
/// ));
/// // ... declare scenarios, then `feature.test().await?`
/// orquestra.teardown().await?;
/// ```
pub struct Orquestra {
    bootstrap: BootstrapManager,
    shards: Arc<ShardManager>,
    reporter: Option<ConsoleReporter>,
    options: Mutex<BootstrapOptions>,
}

impl Orquestra {
    /// Create a builder.
    pub fn builder() -> OrquestraBuilder {
        OrquestraBuilder::new()
    }

    /// Start all components. Options passed here are remembered and reused
    /// by [`teardown`](Self::teardown); `None` keeps the previous options.
    pub async fn start(&self, options: Option<BootstrapOptions>) -> Result<(), OrquestraError> {
        if let Some(options) = options {
            *self.options.lock().unwrap_or_else(|e| e.into_inner()) = options;
        }
        self.bootstrap.start(self.options()).await
    }

    /// Tear down all components, then print the run report when the
    /// reporter is enabled. A report failure is logged, not returned.
    pub async fn teardown(&self) -> Result<(), OrquestraError> {
        self.bootstrap.teardown(self.options()).await?;

        if let Some(reporter) = &self.reporter {
            if let Err(e) = reporter.report(&self.shards).await {
                tracing::warn!(error = %e, "failed to print run report");
            }
        }
        Ok(())
    }

    /// Start helpers, containers, plugins, and services without the HTTP server.
    pub async fn provision(&self) -> Result<(), OrquestraError> {
        self.bootstrap.provision().await
    }

    /// Reverse of [`provision`](Self::provision).
    pub async fn deprovision(&self) -> Result<(), OrquestraError> {
        self.bootstrap.deprovision().await
    }

    /// Define a feature that records into this run's shard log and can
    /// reference registered macros.
    pub fn feature(&self, name: impl Into<String>, definition: FeatureDefinition) -> Feature {
        let sink: Arc<dyn DynEventSink> = self.shards.clone();
        Feature::from_shared(name, definition, sink).with_context(self.context().clone())
    }

    /// Already-resolved instance for `token`.
    ///
    /// Does not trigger resolution; components become available once the
    /// phase that owns them has started.
    pub fn get<T: Injectable>(&self, token: impl Into<Token>) -> Result<Arc<T>, OrquestraError> {
        let token = token.into();
        let instance = self
            .context()
            .registry()
            .get(&token)
            .ok_or_else(|| ProviderError::NotFound {
                token: token.to_string(),
            })?;
        downcast::<T>(instance).ok_or_else(|| {
            ProviderError::TypeMismatch {
                token: token.to_string(),
                expected: std::any::type_name::<T>(),
            }
            .into()
        })
    }

    /// Test client for the active HTTP server.
    pub fn http(&self) -> Result<TestClient, OrquestraError> {
        let server = self
            .context()
            .registry()
            .get_as::<OrquestraHttpServer>(&HTTP_SERVER_TOKEN)
            .ok_or(LifecycleError::HttpServerMissing)?;
        Ok(server.create_client())
    }

    pub fn context(&self) -> &Context {
        self.bootstrap.context()
    }

    pub fn config(&self) -> &OrquestraConfig {
        self.context().config()
    }

    pub fn run_id(&self) -> &RunId {
        ShardManager::run_id(&self.shards)
    }

    /// Shard log of the current run.
    pub fn shards(&self) -> &ShardManager {
        &self.shards
    }

    pub fn container_states(&self) -> Vec<(Token, ContainerState)> {
        self.bootstrap.container_states()
    }

    fn options(&self) -> BootstrapOptions {
        *self.options.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for Orquestra {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orquestra")
            .field("run_id", self.run_id())
            .field("bootstrap", &self.bootstrap)
            .finish()
    }
}

/// Builder for [`Orquestra`].
#[derive(Default)]
pub struct OrquestraBuilder {
    config: OrquestraConfig,
    context: ContextBuilder,
}

impl OrquestraBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the given configuration instead of the defaults.
    pub fn config(mut self, config: OrquestraConfig) -> Self {
        self.config = config;
        self
    }

    pub fn helper(mut self, provider: impl Into<Provider>) -> Self {
        self.context = self.context.helper(provider);
        self
    }

    pub fn plugin(mut self, provider: impl Into<Provider>) -> Self {
        self.context = self.context.plugin(provider);
        self
    }

    pub fn service(mut self, provider: impl Into<Provider>) -> Self {
        self.context = self.context.service(provider);
        self
    }

    pub fn container(mut self, provider: ContainerProvider) -> Self {
        self.context = self.context.container(provider);
        self
    }

    /// Pre-built HTTP server adapter.
    pub fn http_server(mut self, adapter: impl HttpServerAdapter) -> Self {
        self.context = self.context.http_server(adapter);
        self
    }

    /// HTTP server created during the start phase.
    pub fn http_server_factory(mut self, factory: HttpServerFactory) -> Self {
        self.context = self.context.http_server_factory(factory);
        self
    }

    /// Register a macro. Fails on an empty title.
    pub fn macro_(mut self, m: impl OrquestraMacro) -> Result<Self, MacroError> {
        self.context = self.context.macro_(m)?;
        Ok(self)
    }

    /// Validate the configuration, resolve the run id, and register all
    /// providers.
    ///
    /// Installs the global tracing subscriber on first use; later builds in
    /// the same process keep the existing subscriber.
    pub fn build(self) -> Result<Orquestra, OrquestraError> {
        self.config.validate()?;
        if let Err(e) = logging::init_tracing(&self.config.general) {
            tracing::debug!(error = %e, "tracing subscriber already installed");
        }

        let shards = Arc::new(ShardManager::from_config(&self.config.shard)?);
        let reporter = self
            .config
            .reporter
            .enabled
            .then(|| ConsoleReporter::from_config(&self.config.reporter));
        let options = BootstrapOptions::from_config(&self.config.bootstrap);

        tracing::info!(run_id = %ShardManager::run_id(&shards), "orquestra initialized");

        let ctx = self.context.config(self.config).build();
        Ok(Orquestra {
            bootstrap: BootstrapManager::new(ctx),
            shards,
            reporter,
            options: Mutex::new(options),
        })
    }
}
