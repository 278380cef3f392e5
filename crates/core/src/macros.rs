//! 매크로 레지스트리 — 제목으로 참조하는 재사용 스텝
//!
//! 매크로는 여러 피처에서 공유하는 준비 동작(예: "there is a user registered in database")을
//! 제목으로 등록해 두고 `given` 참조에서 재사용할 수 있게 합니다.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, RwLock};

use serde_json::Value;

use crate::component::BoxFuture;
use crate::error::MacroError;
use crate::step_context::StepContext;

/// 제목으로 등록되는 재사용 스텝
pub trait OrquestraMacro: Send + Sync + 'static {
    /// 매크로 제목 (비어 있으면 등록 불가)
    fn title(&self) -> &str;

    /// 누적 컨텍스트 스냅샷으로 매크로를 실행하고 병합할 값을 반환합니다.
    fn execute(&self, ctx: StepContext) -> impl Future<Output = anyhow::Result<Value>> + Send;
}

/// dyn-compatible 매크로 trait
pub trait DynMacro: Send + Sync + 'static {
    /// 매크로 제목
    fn title(&self) -> &str;

    /// 매크로 실행
    fn execute(&self, ctx: StepContext) -> BoxFuture<'_, anyhow::Result<Value>>;
}

impl<T: OrquestraMacro> DynMacro for T {
    fn title(&self) -> &str {
        OrquestraMacro::title(self)
    }

    fn execute(&self, ctx: StepContext) -> BoxFuture<'_, anyhow::Result<Value>> {
        Box::pin(OrquestraMacro::execute(self, ctx))
    }
}

/// 제목 → 매크로 매핑
#[derive(Default)]
pub struct MacroRegistry {
    macros: RwLock<BTreeMap<String, Arc<dyn DynMacro>>>,
}

impl MacroRegistry {
    /// 빈 레지스트리를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 매크로를 등록합니다. 같은 제목은 덮어씁니다.
    pub fn register(&self, m: Arc<dyn DynMacro>) -> Result<(), MacroError> {
        let title = m.title();
        if title.trim().is_empty() {
            return Err(MacroError::EmptyTitle);
        }
        let title = title.to_owned();
        tracing::debug!(title = %title, "registered macro");
        self.write().insert(title, m);
        Ok(())
    }

    /// 제목으로 매크로를 조회합니다.
    pub fn get(&self, title: &str) -> Option<Arc<dyn DynMacro>> {
        self.read().get(title).cloned()
    }

    /// 등록된 제목 목록 (사전순)
    pub fn titles(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// 모든 매크로를 제거합니다.
    pub fn clear(&self) {
        self.write().clear();
    }

    /// 등록된 매크로 수
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, Arc<dyn DynMacro>>> {
        self.macros.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<String, Arc<dyn DynMacro>>> {
        self.macros.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for MacroRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MacroRegistry")
            .field("titles", &self.titles())
            .finish()
    }
}
