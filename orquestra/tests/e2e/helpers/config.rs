//! Test configuration builder for E2E tests.
//!
//! Provides [`TestConfigBuilder`] for creating `OrquestraConfig` instances
//! that write shard logs into a temporary directory and keep the console
//! reporter quiet.

use std::path::Path;

use orquestra_core::config::OrquestraConfig;

/// Builder for constructing test-friendly `OrquestraConfig` instances.
///
/// # Example
///
/// ```ignore
/// let dir = tempfile::tempdir().unwrap();
/// let config = TestConfigBuilder::new(dir.path())
///     .run_id("checkout-run")
///     .build();
/// ```
#[allow(dead_code)]
pub struct TestConfigBuilder {
    config: OrquestraConfig,
}

#[allow(dead_code)]
impl TestConfigBuilder {
    /// Shard root under `shard_root`, reporter disabled, fixed run id.
    pub fn new(shard_root: &Path) -> Self {
        let mut config = OrquestraConfig::default();
        config.shard.root_dir = shard_root.to_path_buf();
        config.shard.run_id = Some("e2e-run".to_owned());
        config.reporter.enabled = false;
        config.reporter.color = false;
        Self { config }
    }

    pub fn run_id(mut self, run_id: &str) -> Self {
        self.config.shard.run_id = Some(run_id.to_owned());
        self
    }

    /// Resolve the run id from `env_var` instead of a fixed value.
    pub fn run_id_from_env(mut self, env_var: &str) -> Self {
        self.config.shard.run_id = None;
        self.config.shard.run_id_env = env_var.to_owned();
        self
    }

    pub fn strict_container_teardown(mut self, strict: bool) -> Self {
        self.config.bootstrap.strict_container_teardown = strict;
        self
    }

    pub fn skip_containers(mut self, skip: bool) -> Self {
        self.config.bootstrap.skip_containers = skip;
        self
    }

    pub fn reporter(mut self, enabled: bool) -> Self {
        self.config.reporter.enabled = enabled;
        self
    }

    pub fn build(self) -> OrquestraConfig {
        self.config
    }
}
