//! Mock helpers, plugins, services, and HTTP server factories.

use std::sync::Arc;

use orquestra_core::component::{BoxFuture, Injectable};
use orquestra_core::http::{HttpServerAdapter, HttpServerBase, HttpServerFactory};
use orquestra_core::registry::Provider;

use crate::helpers::tracker::EventTracker;

/// A component that records `start:<name>` / `teardown:<name>`.
pub struct RecordingComponent {
    pub name: String,
    tracker: Arc<EventTracker>,
    fail_start: bool,
}

#[allow(dead_code)]
impl RecordingComponent {
    pub fn new(name: &str, tracker: &Arc<EventTracker>) -> Self {
        Self {
            name: name.to_owned(),
            tracker: Arc::clone(tracker),
            fail_start: false,
        }
    }

    /// `on_start` fails.
    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    /// Value provider whose token is the component name.
    pub fn provider(self) -> Provider {
        Provider::value(self.name.clone(), self)
    }
}

impl Injectable for RecordingComponent {
    async fn on_start(&self) -> anyhow::Result<()> {
        if self.fail_start {
            anyhow::bail!("component '{}' failed to start", self.name);
        }
        self.tracker.record(format!("start:{}", self.name));
        Ok(())
    }

    async fn on_teardown(&self) -> anyhow::Result<()> {
        self.tracker.record(format!("teardown:{}", self.name));
        Ok(())
    }
}

/// Shorthand for a recording component provider.
#[allow(dead_code)]
pub fn component(name: &str, tracker: &Arc<EventTracker>) -> Provider {
    RecordingComponent::new(name, tracker).provider()
}

/// An HTTP server factory that records `http:create` when invoked and
/// `http:close` when the server is closed. With `fail_close`, closing
/// returns an error after recording.
#[allow(dead_code)]
pub fn http_factory(tracker: &Arc<EventTracker>, fail_close: bool) -> HttpServerFactory {
    let tracker = Arc::clone(tracker);
    HttpServerFactory::sync(move |_ctx| {
        tracker.record("http:create");
        let server = HttpServerBase::new((), "http://127.0.0.1:3000");
        let on_close = Arc::clone(&tracker);
        server.set_close_handler(Arc::new(move || {
            let on_close = Arc::clone(&on_close);
            Box::pin(async move {
                on_close.record("http:close");
                if fail_close {
                    anyhow::bail!("close handler failed");
                }
                Ok(())
            }) as BoxFuture<'static, anyhow::Result<()>>
        }));
        Ok(server)
    })
}
