//! 피처, 시나리오, 스텝 레지스트리, 시나리오 빌더
//!
//! 스텝 레지스트리는 피처마다 하나이며, 시나리오 빌더가 명시적인 핸들로
//! 받아서 사용합니다. 같은 (종류, 이름)의 스텝은 먼저 선언된 정의가 등록됩니다.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use orquestra_core::context::Context;
use orquestra_core::macros::MacroRegistry;
use serde::Serialize;

use crate::error::BddError;
use crate::runner;
use crate::sink::{DynEventSink, EventSink};
use crate::step::{Step, StepContext, StepKind};

/// 피처 서술 (역할 / 목표 / 가치)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeatureDefinition {
    /// As a ...
    pub as_a: String,
    /// I want ...
    pub i_want: String,
    /// So that ...
    pub so_that: String,
}

impl FeatureDefinition {
    pub fn new(
        as_a: impl Into<String>,
        i_want: impl Into<String>,
        so_that: impl Into<String>,
    ) -> Self {
        Self {
            as_a: as_a.into(),
            i_want: i_want.into(),
            so_that: so_that.into(),
        }
    }
}

// ─── StepRegistry ────────────────────────────────────────────────────

/// 피처 범위의 스텝 정의 레지스트리
#[derive(Debug, Default)]
pub struct StepRegistry {
    steps: HashMap<(StepKind, String), Step>,
}

impl StepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 스텝을 등록합니다. 같은 (종류, 이름)이 이미 있으면 기존 정의를 유지하고 `false`를 반환합니다.
    pub fn register(&mut self, step: Step) -> bool {
        let key = (step.kind(), step.name().to_owned());
        if self.steps.contains_key(&key) {
            return false;
        }
        self.steps.insert(key, step);
        true
    }

    /// 등록된 스텝을 찾습니다.
    pub fn get(&self, kind: StepKind, name: &str) -> Option<&Step> {
        self.steps.get(&(kind, name.to_owned()))
    }

    pub fn contains(&self, kind: StepKind, name: &str) -> bool {
        self.get(kind, name).is_some()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

// ─── Scenario ────────────────────────────────────────────────────────

/// 순서가 있는 스텝 목록
#[derive(Debug, Clone)]
pub struct Scenario {
    name: String,
    steps: Vec<Step>,
}

impl Scenario {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 선언 순서의 스텝
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
}

/// 시나리오 실행 결과
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioOutcome {
    /// 시나리오 이름
    pub scenario: String,
    /// 마지막 스텝까지 누적된 컨텍스트
    pub context: StepContext,
}

/// 시나리오에 스텝을 추가하는 빌더
///
/// 선언형(`given`, `when`, `then`)은 스텝을 피처 레지스트리에 등록하고 시나리오에 추가합니다.
/// 참조형(`given_step`, `when_step`, `then_step`)은 이미 선언된 스텝을 찾아 추가합니다.
pub struct ScenarioBuilder<'a> {
    registry: &'a mut StepRegistry,
    macros: Option<&'a MacroRegistry>,
    scenario: &'a mut Scenario,
}

impl<'a> ScenarioBuilder<'a> {
    /// Given 스텝을 선언합니다.
    pub fn given<F, Fut, R>(self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(StepContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
        R: Serialize,
    {
        self.step(Step::new(StepKind::Given, name, body))
    }

    /// When 스텝을 선언합니다.
    pub fn when<F, Fut, R>(self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(StepContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
        R: Serialize,
    {
        self.step(Step::new(StepKind::When, name, body))
    }

    /// Then 스텝을 선언합니다.
    pub fn then<F, Fut, R>(self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(StepContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
        R: Serialize,
    {
        self.step(Step::new(StepKind::Then, name, body))
    }

    /// 이미 만든 스텝을 등록하고 추가합니다.
    pub fn step(self, step: Step) -> Self {
        self.registry.register(step.clone());
        self.scenario.steps.push(step);
        self
    }

    /// 선언된 Given 스텝을 참조합니다. 없으면 같은 제목의 매크로를 찾습니다.
    pub fn given_step(self, name: &str) -> Result<Self, BddError> {
        if let Some(step) = self.registry.get(StepKind::Given, name) {
            let step = step.clone();
            return Ok(self.push(step));
        }
        match self.macros.and_then(|m| m.get(name)) {
            Some(m) => Ok(self.push(Step::from_macro(m))),
            None => Err(not_found(StepKind::Given, name)),
        }
    }

    /// 선언된 When 스텝을 참조합니다.
    pub fn when_step(self, name: &str) -> Result<Self, BddError> {
        self.reference(StepKind::When, name)
    }

    /// 선언된 Then 스텝을 참조합니다.
    pub fn then_step(self, name: &str) -> Result<Self, BddError> {
        self.reference(StepKind::Then, name)
    }

    /// 시나리오 이름
    pub fn name(&self) -> &str {
        &self.scenario.name
    }

    fn reference(self, kind: StepKind, name: &str) -> Result<Self, BddError> {
        let step = self
            .registry
            .get(kind, name)
            .cloned()
            .ok_or_else(|| not_found(kind, name))?;
        Ok(self.push(step))
    }

    fn push(self, step: Step) -> Self {
        self.scenario.steps.push(step);
        self
    }
}

fn not_found(kind: StepKind, name: &str) -> BddError {
    tracing::error!(kind = %kind, step = name, "step not found");
    BddError::StepNotFound {
        kind,
        name: name.to_owned(),
    }
}

// ─── Feature ─────────────────────────────────────────────────────────

/// 시나리오 묶음과 그 스텝 레지스트리
pub struct Feature {
    pub(crate) name: String,
    definition: FeatureDefinition,
    registry: StepRegistry,
    pub(crate) scenarios: Vec<Scenario>,
    pub(crate) sink: Arc<dyn DynEventSink>,
    context: Option<Context>,
    pub(crate) collected: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl Feature {
    /// 피처를 생성합니다.
    pub fn new(
        name: impl Into<String>,
        definition: FeatureDefinition,
        sink: impl EventSink,
    ) -> Self {
        Self::from_shared(name, definition, Arc::new(sink))
    }

    /// 공유 싱크로 피처를 생성합니다.
    pub fn from_shared(
        name: impl Into<String>,
        definition: FeatureDefinition,
        sink: Arc<dyn DynEventSink>,
    ) -> Self {
        Self {
            name: name.into(),
            definition,
            registry: StepRegistry::new(),
            scenarios: Vec::new(),
            sink,
            context: None,
            collected: Mutex::new(HashMap::new()),
        }
    }

    /// 컨텍스트를 연결합니다. 참조형 Given 스텝이 컨텍스트의 매크로를 사용할 수 있게 됩니다.
    pub fn with_context(mut self, ctx: Context) -> Self {
        self.context = Some(ctx);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn definition(&self) -> &FeatureDefinition {
        &self.definition
    }

    /// 이벤트에 기록되는 런 ID
    pub fn run_id(&self) -> &str {
        DynEventSink::run_id(self.sink.as_ref())
    }

    /// 선언 순서의 시나리오
    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    /// 피처 스텝 레지스트리
    pub fn registry(&self) -> &StepRegistry {
        &self.registry
    }

    /// 새 시나리오를 추가하고 빌더를 반환합니다.
    pub fn scenario(&mut self, name: impl Into<String>) -> ScenarioBuilder<'_> {
        let index = self.scenarios.len();
        self.scenarios.push(Scenario::new(name));
        ScenarioBuilder {
            registry: &mut self.registry,
            macros: self.context.as_ref().map(Context::macros),
            scenario: &mut self.scenarios[index],
        }
    }

    /// 모든 스텝에 대해 pending 이벤트를 기록합니다.
    pub async fn collect(&self) -> Result<(), BddError> {
        runner::collect(self).await
    }

    /// 이름으로 시나리오 하나를 실행하고 누적 컨텍스트를 반환합니다.
    pub async fn run_scenario(
        &self,
        name: &str,
        initial: StepContext,
    ) -> Result<StepContext, BddError> {
        let scenario = self
            .scenarios
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| BddError::ScenarioNotFound(name.to_owned()))?;
        runner::run_scenario(self, scenario, initial).await
    }

    /// 수집 후 모든 시나리오를 선언 순서대로 실행합니다.
    ///
    /// 한 시나리오가 실패하면 이후 시나리오는 실행하지 않고 에러를 반환합니다.
    pub async fn test(&self) -> Result<Vec<ScenarioOutcome>, BddError> {
        self.collect().await?;
        let mut outcomes = Vec::with_capacity(self.scenarios.len());
        for scenario in &self.scenarios {
            let context = runner::run_scenario(self, scenario, StepContext::new()).await?;
            outcomes.push(ScenarioOutcome {
                scenario: scenario.name.clone(),
                context,
            });
        }
        Ok(outcomes)
    }
}

impl std::fmt::Debug for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Feature")
            .field("name", &self.name)
            .field("definition", &self.definition)
            .field("scenarios", &self.scenarios)
            .finish()
    }
}
