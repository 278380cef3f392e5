//! 스텝 이벤트 -- 워커 프로세스 간에 교환되는 실행 기록
//!
//! 필드 이름은 camelCase로 직렬화됩니다. 같은 스텝에 대해 여러 이벤트가
//! 기록되며(pending → success/failed), 소비자는 가장 최근 이벤트를 최종 상태로 봅니다.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 스텝 종류 (Given / When / Then)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepKind {
    Given,
    When,
    Then,
}

impl StepKind {
    /// 키워드 문자열
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Given => "Given",
            Self::When => "When",
            Self::Then => "Then",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 스텝 실행 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    /// 수집됨, 아직 실행 전
    Pending,
    /// 성공
    Success,
    /// 실패
    Failed,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 실패한 스텝의 에러 정보
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepError {
    /// 에러 메시지
    pub message: String,
    /// 원인 체인 (가장 바깥 에러부터)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

/// 한 시점의 스텝 실행 기록
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepEvent {
    /// 런 ID
    pub run_id: String,
    /// 기록한 워커 프로세스 ID
    pub worker_pid: u32,
    /// 이벤트를 만든 테스트 파일 (선택)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_file: Option<String>,

    /// 피처 이름
    pub feature: String,
    /// 시나리오 이름
    pub scenario: String,
    /// 결정적 스텝 ID
    pub step_id: String,
    /// 스텝 이름
    pub step_name: String,
    /// 스텝 종류
    pub keyword: StepKind,

    /// 이벤트 생성 시각
    pub ts: DateTime<Utc>,
    /// 수집 시각
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t_collect: Option<DateTime<Utc>>,
    /// 실행 시작 시각
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t_start: Option<DateTime<Utc>>,
    /// 실행 종료 시각
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t_end: Option<DateTime<Utc>>,
    /// 상태
    pub status: StepStatus,
    /// 실패 정보
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<StepError>,
}

impl StepEvent {
    /// 실행 시간 (시작/종료 시각이 모두 있을 때)
    pub fn duration(&self) -> Option<chrono::Duration> {
        Some(self.t_end? - self.t_start?)
    }
}

#[cfg(test)]
pub(crate) fn sample(step_id: &str, status: StepStatus) -> StepEvent {
    StepEvent {
        run_id: "run-1".to_owned(),
        worker_pid: 42,
        test_file: None,
        feature: "checkout".to_owned(),
        scenario: "pay with card".to_owned(),
        step_id: step_id.to_owned(),
        step_name: format!("step {step_id}"),
        keyword: StepKind::Given,
        ts: Utc::now(),
        t_collect: None,
        t_start: None,
        t_end: None,
        status,
        error: None,
    }
}
