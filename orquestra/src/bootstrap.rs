//! Lifecycle orchestration -- provider registration, phased start/teardown,
//! and dependency-ordered container management.
//!
//! The [`BootstrapManager`] takes a built [`Context`], registers every
//! provider it carries with the DI registry, and drives the system from
//! cold to ready and back.
//!
//! # Start Order
//!
//! 1. Helpers
//! 2. Containers (dependencies first, independent containers in parallel)
//! 3. HTTP server
//! 4. Plugins
//! 5. Services
//!
//! # Teardown Order (reverse of start)
//!
//! 1. Services
//! 2. Plugins
//! 3. HTTP server (errors are logged, never propagated)
//! 4. Containers (dependents first)
//! 5. Helpers

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use futures::future::join_all;
use indexmap::IndexMap;
use tokio::sync::OnceCell;

use orquestra_core::component::BoxFuture;
use orquestra_core::config::BootstrapConfig;
use orquestra_core::container::DynContainer;
use orquestra_core::context::Context;
use orquestra_core::error::{LifecycleError, OrquestraError};
use orquestra_core::http::{
    HTTP_SERVER_FACTORY_TOKEN, HTTP_SERVER_TOKEN, HttpServerFactory, HttpServerSource,
    OrquestraHttpServer,
};
use orquestra_core::registry::{Provider, Token};

use crate::graph::DependencyGraph;

/// Per-call options for [`BootstrapManager::start`] and
/// [`BootstrapManager::teardown`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BootstrapOptions {
    /// Skip the container phase (containers are managed externally).
    pub skip_containers: bool,
}

impl BootstrapOptions {
    /// Options that skip the container phase.
    pub fn skip_containers() -> Self {
        Self {
            skip_containers: true,
        }
    }

    /// Build options from the `[bootstrap]` config section.
    pub fn from_config(config: &BootstrapConfig) -> Self {
        Self {
            skip_containers: config.skip_containers,
        }
    }
}

/// Container state as tracked by the orchestrator.
///
/// A container whose stop call failed during teardown is still reported
/// as `Stopped`: teardown always completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Unstarted,
    Running,
    Stopped,
}

/// Lifecycle orchestrator.
pub struct BootstrapManager {
    ctx: Context,
    graph: DependencyGraph,
    states: Mutex<IndexMap<Token, ContainerState>>,
}

impl BootstrapManager {
    /// Register every provider carried by `ctx` and build the container graph.
    ///
    /// Registration order: HTTP server, helpers, containers (transitively
    /// through `depends_on`, deduplicated by token), plugins, services.
    pub fn new(ctx: Context) -> Self {
        let registry = ctx.registry();

        match ctx.http_server() {
            Some(HttpServerSource::Adapter(adapter)) => {
                registry.register(Provider::value(
                    HTTP_SERVER_TOKEN,
                    OrquestraHttpServer::new(Arc::clone(adapter)),
                ));
            }
            Some(HttpServerSource::Factory(factory)) => {
                registry.register(Provider::value(HTTP_SERVER_FACTORY_TOKEN, factory.clone()));
            }
            None => {}
        }

        for helper in ctx.helpers() {
            registry.register(helper.clone());
        }

        let graph = DependencyGraph::from_providers(ctx.containers());
        for container in graph.providers() {
            registry.register(container.provider().clone());
        }

        for plugin in ctx.plugins() {
            registry.register(plugin.clone());
        }
        for service in ctx.services() {
            registry.register(service.clone());
        }

        let states = graph
            .tokens()
            .map(|t| (t.clone(), ContainerState::Unstarted))
            .collect();

        tracing::debug!(
            helpers = ctx.helpers().len(),
            containers = graph.len(),
            plugins = ctx.plugins().len(),
            services = ctx.services().len(),
            "bootstrap manager initialized"
        );

        Self {
            ctx,
            graph,
            states: Mutex::new(states),
        }
    }

    /// Shared context.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Container dependency graph.
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Orchestrator view of every container, in first-seen order.
    pub fn container_states(&self) -> Vec<(Token, ContainerState)> {
        self.states()
            .iter()
            .map(|(t, s)| (t.clone(), *s))
            .collect()
    }

    /// Start everything: helpers, containers, HTTP server, plugins, services.
    pub async fn start(&self, options: BootstrapOptions) -> Result<(), OrquestraError> {
        tracing::info!(skip_containers = options.skip_containers, "starting orquestra");
        let started = Instant::now();

        self.start_components("helpers", self.ctx.helpers()).await?;
        if options.skip_containers {
            tracing::info!("skipping containers");
        } else {
            self.start_containers().await?;
        }
        self.start_http_server().await?;
        self.start_components("plugins", self.ctx.plugins()).await?;
        self.start_components("services", self.ctx.services()).await?;

        tracing::info!(elapsed_ms = elapsed_ms(started), "orquestra started");
        Ok(())
    }

    /// Tear everything down in reverse start order.
    pub async fn teardown(&self, options: BootstrapOptions) -> Result<(), OrquestraError> {
        tracing::info!(skip_containers = options.skip_containers, "tearing down orquestra");
        let started = Instant::now();

        self.teardown_components("services", self.ctx.services()).await?;
        self.teardown_components("plugins", self.ctx.plugins()).await?;
        self.teardown_http_server().await;
        if options.skip_containers {
            tracing::info!("skipping containers");
        } else {
            self.stop_containers().await?;
        }
        self.teardown_components("helpers", self.ctx.helpers()).await?;

        tracing::info!(elapsed_ms = elapsed_ms(started), "orquestra teardown complete");
        Ok(())
    }

    /// Start infrastructure only: helpers, containers, plugins, services.
    /// The HTTP server is left untouched.
    pub async fn provision(&self) -> Result<(), OrquestraError> {
        tracing::info!("provisioning infrastructure");
        let started = Instant::now();

        self.start_components("helpers", self.ctx.helpers()).await?;
        self.start_containers().await?;
        self.start_components("plugins", self.ctx.plugins()).await?;
        self.start_components("services", self.ctx.services()).await?;

        tracing::info!(elapsed_ms = elapsed_ms(started), "infrastructure provisioned");
        Ok(())
    }

    /// Reverse of [`provision`](Self::provision).
    pub async fn deprovision(&self) -> Result<(), OrquestraError> {
        tracing::info!("deprovisioning infrastructure");
        let started = Instant::now();

        self.teardown_components("services", self.ctx.services()).await?;
        self.teardown_components("plugins", self.ctx.plugins()).await?;
        self.stop_containers().await?;
        self.teardown_components("helpers", self.ctx.helpers()).await?;

        tracing::info!(elapsed_ms = elapsed_ms(started), "infrastructure deprovisioned");
        Ok(())
    }

    // --- helpers / plugins / services ---

    async fn start_components(
        &self,
        phase: &'static str,
        providers: &[Provider],
    ) -> Result<(), OrquestraError> {
        tracing::info!(phase, "starting components");
        let started = Instant::now();

        for provider in providers {
            let token = provider.token();
            let instance = self.ctx.registry().resolve(&self.ctx, token).await?;
            instance.on_start().await.map_err(|e| LifecycleError::Hook {
                component: token.to_string(),
                hook: "on_start",
                source: e.into(),
            })?;
            tracing::debug!(phase, component = %token, "component started");
        }

        tracing::info!(
            phase,
            count = providers.len(),
            elapsed_ms = elapsed_ms(started),
            "components started"
        );
        Ok(())
    }

    async fn teardown_components(
        &self,
        phase: &'static str,
        providers: &[Provider],
    ) -> Result<(), OrquestraError> {
        tracing::info!(phase, "tearing down components");
        let started = Instant::now();

        for provider in providers {
            let token = provider.token();
            let instance = self.ctx.registry().resolve(&self.ctx, token).await?;
            instance.on_teardown().await.map_err(|e| LifecycleError::Hook {
                component: token.to_string(),
                hook: "on_teardown",
                source: e.into(),
            })?;
            tracing::debug!(phase, component = %token, "component torn down");
        }

        tracing::info!(
            phase,
            count = providers.len(),
            elapsed_ms = elapsed_ms(started),
            "components torn down"
        );
        Ok(())
    }

    // --- HTTP server ---

    async fn start_http_server(&self) -> Result<(), OrquestraError> {
        tracing::info!("starting http server");
        let started = Instant::now();
        let registry = self.ctx.registry();

        if let Some(factory) = registry.get_as::<HttpServerFactory>(&HTTP_SERVER_FACTORY_TOKEN) {
            let adapter = factory
                .create(&self.ctx)
                .await
                .map_err(|e| LifecycleError::HttpServerFactory { source: e.into() })?;
            registry.register(Provider::value(
                HTTP_SERVER_TOKEN,
                OrquestraHttpServer::new(adapter),
            ));
        }

        if !registry.contains(&HTTP_SERVER_TOKEN) {
            tracing::info!("no http server registered, skipping");
            return Ok(());
        }

        let server = registry.resolve(&self.ctx, &HTTP_SERVER_TOKEN).await?;
        server.on_start().await.map_err(|e| LifecycleError::Hook {
            component: HTTP_SERVER_TOKEN.to_string(),
            hook: "on_start",
            source: e.into(),
        })?;

        tracing::info!(elapsed_ms = elapsed_ms(started), "http server started");
        Ok(())
    }

    async fn teardown_http_server(&self) {
        let Some(server) = self
            .ctx
            .registry()
            .get_as::<OrquestraHttpServer>(&HTTP_SERVER_TOKEN)
        else {
            return;
        };

        tracing::info!("closing http server");
        let started = Instant::now();
        match server.close().await {
            Ok(()) => tracing::info!(elapsed_ms = elapsed_ms(started), "http server closed"),
            Err(e) => tracing::error!(error = %e, "failed to close http server"),
        }
    }

    // --- containers ---

    async fn start_containers(&self) -> Result<(), OrquestraError> {
        tracing::info!(count = self.graph.len(), "starting containers");
        let started = Instant::now();

        self.graph.check_cycles().map_err(|e| {
            tracing::error!(error = %e, "container dependency graph is cyclic");
            e
        })?;

        let cells: HashMap<Token, OnceCell<()>> = self
            .graph
            .tokens()
            .map(|t| (t.clone(), OnceCell::new()))
            .collect();

        // Sibling starts are not cancelled; the first error surfaces once all settle.
        join_all(
            self.graph
                .tokens()
                .map(|token| self.start_container(token, &cells)),
        )
        .await
        .into_iter()
        .collect::<Result<(), _>>()?;

        tracing::info!(elapsed_ms = elapsed_ms(started), "containers started");
        Ok(())
    }

    /// Start `token` after all of its dependencies. Each token is started at
    /// most once per phase; callers that arrive while it is starting wait on
    /// the same cell.
    fn start_container<'a>(
        &'a self,
        token: &'a Token,
        cells: &'a HashMap<Token, OnceCell<()>>,
    ) -> BoxFuture<'a, Result<(), OrquestraError>> {
        Box::pin(async move {
            let cell = cells.get(token).ok_or_else(|| LifecycleError::NotAContainer {
                token: token.to_string(),
            })?;

            cell.get_or_try_init(|| async move {
                join_all(
                    self.graph
                        .dependencies(token)
                        .iter()
                        .map(|dep| self.start_container(dep, cells)),
                )
                .await
                .into_iter()
                .collect::<Result<(), _>>()?;

                let container = self.resolve_container(token).await?;
                tracing::info!(container = container.name(), "starting container");
                container
                    .start()
                    .await
                    .map_err(|e| LifecycleError::ContainerStart {
                        name: container.name().to_owned(),
                        source: e.into(),
                    })?;
                self.set_state(token, ContainerState::Running);
                tracing::info!(container = container.name(), "container started");
                Ok::<(), OrquestraError>(())
            })
            .await?;

            Ok(())
        })
    }

    /// Stop containers so that none stops before its dependents.
    ///
    /// Runs waves until every container has been attempted. A wave with no
    /// eligible container means a residual cycle; the rest are force-stopped
    /// together. Failed stops are logged and counted as stopped. In strict
    /// mode the failures are returned once the walk has finished.
    async fn stop_containers(&self) -> Result<(), OrquestraError> {
        tracing::info!(count = self.graph.len(), "stopping containers");
        let started = Instant::now();

        let dependents = self.graph.dependents();
        let tokens: Vec<&Token> = dependents.keys().collect();
        let mut stopped: HashSet<&Token> = HashSet::with_capacity(tokens.len());
        let mut failures = Vec::new();

        while stopped.len() < tokens.len() {
            let ready: Vec<&Token> = tokens
                .iter()
                .copied()
                .filter(|t| !stopped.contains(t))
                .filter(|t| {
                    dependents
                        .get(*t)
                        .is_none_or(|deps| deps.iter().all(|d| stopped.contains(d)))
                })
                .collect();

            let wave = if ready.is_empty() {
                let remaining: Vec<&Token> = tokens
                    .iter()
                    .copied()
                    .filter(|t| !stopped.contains(t))
                    .collect();
                let names: Vec<String> = remaining.iter().map(|t| t.to_string()).collect();
                tracing::warn!(
                    remaining = ?names,
                    "possible circular dependency, force-stopping remaining containers"
                );
                remaining
            } else {
                ready
            };

            let results = join_all(wave.iter().map(|t| self.stop_container(t))).await;
            for (token, result) in wave.into_iter().zip(results) {
                if let Err(e) = result {
                    tracing::error!(container = %token, error = %e, "failed to stop container");
                    failures.push(format!("{token}: {e:#}"));
                }
                stopped.insert(token);
            }
        }

        tracing::info!(
            elapsed_ms = elapsed_ms(started),
            failures = failures.len(),
            "containers stopped"
        );

        if self.ctx.config().bootstrap.strict_container_teardown && !failures.is_empty() {
            return Err(LifecycleError::ContainerTeardown { failures }.into());
        }
        Ok(())
    }

    async fn stop_container(&self, token: &Token) -> anyhow::Result<()> {
        let Some(container) = self.cached_container(token) else {
            return Ok(());
        };
        if !container.is_running() {
            self.mark_stopped(token);
            return Ok(());
        }

        tracing::info!(container = container.name(), "stopping container");
        let result = container.stop().await;
        self.mark_stopped(token);
        result?;
        tracing::info!(container = container.name(), "container stopped");
        Ok(())
    }

    async fn resolve_container(
        &self,
        token: &Token,
    ) -> Result<Arc<dyn DynContainer>, OrquestraError> {
        let provider = self
            .graph
            .provider(token)
            .ok_or_else(|| LifecycleError::NotAContainer {
                token: token.to_string(),
            })?;
        let instance = self.ctx.registry().resolve(&self.ctx, token).await?;
        provider.cast(instance).ok_or_else(|| {
            LifecycleError::NotAContainer {
                token: token.to_string(),
            }
            .into()
        })
    }

    /// Already-resolved container; never triggers resolution.
    fn cached_container(&self, token: &Token) -> Option<Arc<dyn DynContainer>> {
        let provider = self.graph.provider(token)?;
        let instance = self.ctx.registry().get(token)?;
        provider.cast(instance)
    }

    fn set_state(&self, token: &Token, state: ContainerState) {
        self.states().insert(token.clone(), state);
    }

    fn mark_stopped(&self, token: &Token) {
        let mut states = self.states();
        if let Some(state) = states.get_mut(token) {
            if *state == ContainerState::Running {
                *state = ContainerState::Stopped;
            }
        }
    }

    fn states(&self) -> MutexGuard<'_, IndexMap<Token, ContainerState>> {
        self.states.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for BootstrapManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapManager")
            .field("graph", &self.graph)
            .field("states", &self.container_states())
            .finish()
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use orquestra_core::component::{Constructible, Injectable};
    use orquestra_core::config::OrquestraConfig;
    use orquestra_core::container::{ContainerProvider, InfraContainer, StartedContainer};
    use orquestra_core::context::ContextBuilder;
    use orquestra_core::http::HttpServerBase;

    struct Noop;
    impl Injectable for Noop {}
    impl Constructible for Noop {
        fn construct(_ctx: &Context) -> Self {
            Noop
        }
    }

    struct Handle;
    impl StartedContainer for Handle {
        async fn stop(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    struct Store(&'static str);
    impl Injectable for Store {}
    impl InfraContainer for Store {
        type Handle = Handle;

        fn container_name(&self) -> &str {
            self.0
        }

        async fn up(&self) -> anyhow::Result<Handle> {
            Ok(Handle)
        }
    }

    #[test]
    fn test_options_from_config() {
        let mut config = OrquestraConfig::default();
        assert_eq!(
            BootstrapOptions::from_config(&config.bootstrap),
            BootstrapOptions::default()
        );

        config.bootstrap.skip_containers = true;
        assert_eq!(
            BootstrapOptions::from_config(&config.bootstrap),
            BootstrapOptions::skip_containers()
        );
    }

    #[test]
    fn test_new_registers_every_provider() {
        // Given: one of each component kind, with a nested container dependency
        let db = ContainerProvider::value("db", Store("db"));
        let api = ContainerProvider::value("api", Store("api")).depends_on([db]);
        let ctx = ContextBuilder::new()
            .helper(Provider::class::<Noop>())
            .plugin(Provider::value("plugin", Noop))
            .service(Provider::value("service", Noop))
            .container(api)
            .http_server(HttpServerBase::new((), "http://localhost"))
            .build();

        // When: the manager is created
        let manager = BootstrapManager::new(ctx.clone());

        // Then: every token is registered, including the transitive container
        let registry = ctx.registry();
        for token in [
            Token::of::<Noop>(),
            Token::named("plugin"),
            Token::named("service"),
            Token::named("api"),
            Token::named("db"),
            HTTP_SERVER_TOKEN,
        ] {
            assert!(registry.contains(&token), "{token} not registered");
        }
        assert_eq!(registry.len(), 6);
        assert_eq!(
            manager.container_states(),
            vec![
                (Token::named("api"), ContainerState::Unstarted),
                (Token::named("db"), ContainerState::Unstarted),
            ]
        );
    }

    #[test]
    fn test_factory_is_registered_under_well_known_token() {
        let ctx = ContextBuilder::new()
            .http_server_factory(HttpServerFactory::sync(|_ctx| {
                Ok(HttpServerBase::new((), "http://localhost"))
            }))
            .build();
        let _manager = BootstrapManager::new(ctx.clone());

        assert!(ctx.registry().contains(&HTTP_SERVER_FACTORY_TOKEN));
        assert!(!ctx.registry().contains(&HTTP_SERVER_TOKEN));
    }

    #[tokio::test]
    async fn test_teardown_before_start_is_noop() {
        let ctx = ContextBuilder::new()
            .container(ContainerProvider::value("db", Store("db")))
            .build();
        let manager = BootstrapManager::new(ctx);

        manager.teardown(BootstrapOptions::default()).await.unwrap();
        assert_eq!(
            manager.container_states(),
            vec![(Token::named("db"), ContainerState::Unstarted)]
        );
    }
}
