#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`feature`]: 피처, 시나리오, 스텝 레지스트리, 시나리오 빌더
//! - [`step`]: 스텝 정의와 누적 컨텍스트
//! - [`runner`]: 수집/실행과 결정적 스텝 ID
//! - [`sink`]: 스텝 이벤트 기록 대상
//! - [`error`]: 도메인 에러 타입

pub mod error;
pub mod feature;
pub mod runner;
pub mod sink;
pub mod step;

// --- 주요 타입 re-export ---

pub use error::BddError;
pub use feature::{Feature, FeatureDefinition, Scenario, ScenarioBuilder, ScenarioOutcome, StepRegistry};
pub use runner::step_id;
pub use sink::{DynEventSink, EventSink, MemorySink};
pub use step::{Step, StepContext, StepKind};
