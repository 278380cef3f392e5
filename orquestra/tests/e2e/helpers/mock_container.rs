//! Mock infrastructure containers for E2E lifecycle tests.
//!
//! [`MockContainer`] records `start:<name>` / `stop:<name>` into a shared
//! [`EventTracker`] and supports failure injection and start delays.

use std::sync::Arc;
use std::time::Duration;

use orquestra_core::component::Injectable;
use orquestra_core::container::{
    ContainerProvider, InfraContainer, OrquestraContainer, StartedContainer,
};
use orquestra_core::context::Context;
use orquestra_core::registry::Token;

use crate::helpers::tracker::EventTracker;

/// A mock container that tracks start/stop calls.
pub struct MockContainer {
    name: String,
    tracker: Arc<EventTracker>,
    fail_start: bool,
    fail_stop: bool,
    start_delay: Option<Duration>,
}

#[allow(dead_code)]
impl MockContainer {
    /// Create a healthy mock container.
    pub fn new(name: &str, tracker: &Arc<EventTracker>) -> Self {
        Self {
            name: name.to_owned(),
            tracker: Arc::clone(tracker),
            fail_start: false,
            fail_stop: false,
            start_delay: None,
        }
    }

    /// `up()` fails.
    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    /// The running handle's `stop()` fails.
    pub fn failing_stop(mut self) -> Self {
        self.fail_stop = true;
        self
    }

    /// Sleep before `up()` returns.
    pub fn with_start_delay(mut self, delay: Duration) -> Self {
        self.start_delay = Some(delay);
        self
    }

    /// Wrap into a value provider whose token is the container name.
    pub fn provider(self) -> ContainerProvider {
        ContainerProvider::value(self.name.clone(), self)
    }
}

/// Running handle of a [`MockContainer`].
pub struct MockHandle {
    name: String,
    tracker: Arc<EventTracker>,
    fail_stop: bool,
}

impl StartedContainer for MockHandle {
    async fn stop(&self) -> anyhow::Result<()> {
        if self.fail_stop {
            self.tracker.record(format!("stop-failed:{}", self.name));
            anyhow::bail!("container '{}' refused to stop", self.name);
        }
        self.tracker.record(format!("stop:{}", self.name));
        Ok(())
    }
}

impl Injectable for MockContainer {}

impl InfraContainer for MockContainer {
    type Handle = MockHandle;

    fn container_name(&self) -> &str {
        &self.name
    }

    async fn up(&self) -> anyhow::Result<MockHandle> {
        if let Some(delay) = self.start_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_start {
            self.tracker.record(format!("start-failed:{}", self.name));
            anyhow::bail!("container '{}' failed to start", self.name);
        }
        self.tracker.record(format!("start:{}", self.name));
        Ok(MockHandle {
            name: self.name.clone(),
            tracker: Arc::clone(&self.tracker),
            fail_stop: self.fail_stop,
        })
    }
}

/// Shorthand for a healthy container provider.
#[allow(dead_code)]
pub fn container(name: &str, tracker: &Arc<EventTracker>) -> ContainerProvider {
    MockContainer::new(name, tracker).provider()
}

/// Resolved mock container registered under `name`, if any.
#[allow(dead_code)]
pub fn registered(ctx: &Context, name: &str) -> Option<Arc<OrquestraContainer<MockContainer>>> {
    ctx.registry()
        .get_as::<OrquestraContainer<MockContainer>>(&Token::from(name.to_owned()))
}
