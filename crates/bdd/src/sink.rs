//! 이벤트 싱크 -- 러너가 스텝 이벤트를 내보내는 곳
//!
//! 기본 구현은 [`ShardManager`](orquestra_shard::ShardManager)이며,
//! 테스트나 단일 프로세스 용도로 [`MemorySink`]를 제공합니다.

use std::future::Future;
use std::sync::{Arc, Mutex};

use orquestra_core::component::BoxFuture;
use orquestra_core::error::OrquestraError;
use orquestra_shard::{ShardManager, StepEvent};

/// 스텝 이벤트 기록 대상
pub trait EventSink: Send + Sync + 'static {
    /// 이벤트에 기록할 런 ID
    fn run_id(&self) -> &str;

    /// 이벤트를 기록합니다.
    fn write(&self, event: &StepEvent) -> impl Future<Output = Result<(), OrquestraError>> + Send;
}

/// dyn-compatible 이벤트 싱크
pub trait DynEventSink: Send + Sync + 'static {
    fn run_id(&self) -> &str;

    fn write<'a>(&'a self, event: &'a StepEvent) -> BoxFuture<'a, Result<(), OrquestraError>>;
}

impl<T: EventSink> DynEventSink for T {
    fn run_id(&self) -> &str {
        EventSink::run_id(self)
    }

    fn write<'a>(&'a self, event: &'a StepEvent) -> BoxFuture<'a, Result<(), OrquestraError>> {
        Box::pin(EventSink::write(self, event))
    }
}

impl EventSink for ShardManager {
    fn run_id(&self) -> &str {
        ShardManager::run_id(self).as_str()
    }

    async fn write(&self, event: &StepEvent) -> Result<(), OrquestraError> {
        ShardManager::write(self, event).await?;
        Ok(())
    }
}

impl<T: EventSink> EventSink for Arc<T> {
    fn run_id(&self) -> &str {
        EventSink::run_id(&**self)
    }

    fn write(&self, event: &StepEvent) -> impl Future<Output = Result<(), OrquestraError>> + Send {
        EventSink::write(&**self, event)
    }
}

/// 메모리에 이벤트를 모으는 싱크
#[derive(Debug)]
pub struct MemorySink {
    run_id: String,
    events: Mutex<Vec<StepEvent>>,
}

impl MemorySink {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            events: Mutex::new(Vec::new()),
        }
    }

    /// 지금까지 기록된 이벤트 (기록 순서)
    pub fn events(&self) -> Vec<StepEvent> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl EventSink for MemorySink {
    fn run_id(&self) -> &str {
        &self.run_id
    }

    async fn write(&self, event: &StepEvent) -> Result<(), OrquestraError> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event.clone());
        Ok(())
    }
}
