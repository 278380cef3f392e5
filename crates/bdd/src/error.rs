//! BDD 엔진 에러 타입

use orquestra_core::error::{OrquestraError, ScenarioError};

use crate::step::StepKind;

/// BDD 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum BddError {
    /// 이름으로 참조한 스텝이 피처 레지스트리(와 매크로)에 없음
    #[error("step not found: {kind} {name}")]
    StepNotFound { kind: StepKind, name: String },

    /// 스텝 본문 실패
    #[error("step '{kind} {step}' failed in {feature} / {scenario}")]
    StepFailed {
        feature: String,
        scenario: String,
        kind: StepKind,
        step: String,
        #[source]
        source: anyhow::Error,
    },

    /// 이름으로 찾은 시나리오가 없음
    #[error("scenario not found: {0}")]
    ScenarioNotFound(String),

    /// 이벤트 기록 실패
    #[error("event sink error: {0}")]
    Sink(#[source] OrquestraError),
}

impl From<BddError> for OrquestraError {
    fn from(err: BddError) -> Self {
        match err {
            BddError::StepNotFound { kind, name } => ScenarioError::StepNotFound {
                keyword: kind.to_string(),
                name,
            }
            .into(),
            BddError::StepFailed {
                feature,
                scenario,
                kind,
                step,
                source,
            } => ScenarioError::StepFailed {
                feature,
                scenario,
                keyword: kind.to_string(),
                step,
                reason: format!("{source:#}"),
            }
            .into(),
            BddError::ScenarioNotFound(name) => ScenarioError::StepNotFound {
                keyword: "Scenario".to_owned(),
                name,
            }
            .into(),
            BddError::Sink(inner) => inner,
        }
    }
}
