//! 스텝 정의
//!
//! 스텝 본문은 누적 컨텍스트 스냅샷을 받아 병합할 값을 반환하는 비동기 함수입니다.
//! 반환 타입은 `Serialize`이기만 하면 되며, JSON 객체는 얕게 병합되고
//! `()`는 컨텍스트를 바꾸지 않습니다.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use orquestra_core::component::BoxFuture;
use orquestra_core::macros::DynMacro;
use serde::Serialize;
use serde_json::Value;

pub use orquestra_core::step_context::StepContext;
pub use orquestra_shard::event::StepKind;

type StepFn = Arc<dyn Fn(StepContext) -> BoxFuture<'static, anyhow::Result<Value>> + Send + Sync>;

/// Given/When/Then 스텝
#[derive(Clone)]
pub struct Step {
    kind: StepKind,
    name: String,
    body: StepFn,
}

impl Step {
    /// 비동기 본문으로 스텝을 만듭니다.
    pub fn new<F, Fut, R>(kind: StepKind, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(StepContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
        R: Serialize,
    {
        let body: StepFn = Arc::new(move |ctx| {
            let fut = body(ctx);
            Box::pin(async move {
                let delta = fut.await?;
                Ok(serde_json::to_value(delta)?)
            }) as BoxFuture<'static, anyhow::Result<Value>>
        });
        Self {
            kind,
            name: name.into(),
            body,
        }
    }

    /// 매크로를 Given 스텝으로 감쌉니다. 스텝 이름은 매크로 제목입니다.
    pub fn from_macro(m: Arc<dyn DynMacro>) -> Self {
        let name = m.title().to_owned();
        let body: StepFn = Arc::new(move |ctx| {
            let m = Arc::clone(&m);
            Box::pin(async move { m.execute(ctx).await }) as BoxFuture<'static, anyhow::Result<Value>>
        });
        Self {
            kind: StepKind::Given,
            name,
            body,
        }
    }

    pub fn kind(&self) -> StepKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 스냅샷으로 본문을 실행하고 병합할 값을 반환합니다.
    pub async fn run(&self, ctx: StepContext) -> anyhow::Result<Value> {
        (self.body)(ctx).await
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Step({} {})", self.kind, self.name)
    }
}
