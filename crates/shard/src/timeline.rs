//! 타임라인 -- 여러 워커의 이벤트를 스텝별 최종 상태로 접음
//!
//! 스텝 ID마다 가장 최근 이벤트만 남기고, 표시 순서는 그 스텝이 처음 등장한
//! 순서를 따릅니다. 최종 상태 이벤트가 로그의 어디에 있든 표시 순서는 바뀌지 않습니다.

use indexmap::IndexMap;
use serde::Serialize;

use crate::event::{StepEvent, StepStatus};

/// 스텝별 최종 상태
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    steps: IndexMap<String, StepEvent>,
}

impl Timeline {
    /// 이벤트를 순서대로 접습니다. 같은 스텝 ID는 나중 이벤트가 이깁니다.
    pub fn fold(events: impl IntoIterator<Item = StepEvent>) -> Self {
        let mut steps: IndexMap<String, StepEvent> = IndexMap::new();
        for event in events {
            // IndexMap::insert는 기존 키의 위치를 유지함
            steps.insert(event.step_id.clone(), event);
        }
        Self { steps }
    }

    /// 스텝 ID의 최종 이벤트
    pub fn latest(&self, step_id: &str) -> Option<&StepEvent> {
        self.steps.get(step_id)
    }

    /// 최종 이벤트를 처음 등장한 순서로 순회합니다.
    pub fn steps(&self) -> impl Iterator<Item = &StepEvent> {
        self.steps.values()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// 피처 → 시나리오 → 스텝으로 묶은 보기
    ///
    /// 피처는 처음 등장한 순서, 시나리오는 이름순, 스텝은 처음 등장한 순서입니다.
    pub fn features(&self) -> Vec<FeatureReport> {
        let mut grouped: IndexMap<&str, IndexMap<&str, Vec<StepEvent>>> = IndexMap::new();
        for event in self.steps.values() {
            grouped
                .entry(event.feature.as_str())
                .or_default()
                .entry(event.scenario.as_str())
                .or_default()
                .push(event.clone());
        }

        grouped
            .into_iter()
            .map(|(feature, scenarios)| {
                let mut scenarios: Vec<ScenarioReport> = scenarios
                    .into_iter()
                    .map(|(name, steps)| ScenarioReport {
                        name: name.to_owned(),
                        steps,
                    })
                    .collect();
                scenarios.sort_by(|a, b| a.name.cmp(&b.name));
                FeatureReport {
                    name: feature.to_owned(),
                    scenarios,
                }
            })
            .collect()
    }

    /// 상태별 스텝 수
    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for event in self.steps.values() {
            match event.status {
                StepStatus::Pending => summary.pending += 1,
                StepStatus::Success => summary.success += 1,
                StepStatus::Failed => summary.failed += 1,
            }
        }
        summary
    }
}

/// 피처 단위 보고
#[derive(Debug, Clone, Serialize)]
pub struct FeatureReport {
    pub name: String,
    pub scenarios: Vec<ScenarioReport>,
}

/// 시나리오 단위 보고
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub steps: Vec<StepEvent>,
}

/// 시나리오 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioStatus {
    /// 모든 스텝 성공
    Passed,
    /// 하나 이상 실패
    Failed,
    /// 실패는 없지만 완료되지 않은 스텝이 있음
    Incomplete,
}

impl ScenarioReport {
    pub fn status(&self) -> ScenarioStatus {
        if self.steps.iter().any(|s| s.status == StepStatus::Failed) {
            ScenarioStatus::Failed
        } else if self.steps.iter().all(|s| s.status == StepStatus::Success) {
            ScenarioStatus::Passed
        } else {
            ScenarioStatus::Incomplete
        }
    }
}

/// 상태별 스텝 수
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub pending: usize,
    pub success: usize,
    pub failed: usize,
}

impl Summary {
    pub fn total(&self) -> usize {
        self.pending + self.success + self.failed
    }
}
