#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`event`]: 스텝 이벤트 모델 (camelCase JSON)
//! - [`run_id`]: 런 식별자 해석 (명시값 → 환경변수 → 생성)
//! - [`manager`]: 런 디렉토리 기록/읽기/정리
//! - [`timeline`]: 스텝별 최종 상태 접기와 그룹 보기
//! - [`reporter`]: 콘솔 리포터
//! - [`error`]: 도메인 에러 타입

pub mod error;
pub mod event;
pub mod manager;
pub mod reporter;
pub mod run_id;
pub mod timeline;

// --- 주요 타입 re-export ---

pub use error::ShardError;
pub use event::{StepError, StepEvent, StepKind, StepStatus};
pub use manager::{RunInfo, ShardManager};
pub use reporter::ConsoleReporter;
pub use run_id::RunId;
pub use timeline::{FeatureReport, ScenarioReport, ScenarioStatus, Summary, Timeline};
