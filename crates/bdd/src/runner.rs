//! 러너 -- 수집(pending 이벤트)과 실행(success/failed 이벤트)
//!
//! 스텝 ID는 (피처, 시나리오, 키워드, 스텝 이름)의 SHA-256 해시이므로
//! 어느 프로세스에서 계산해도 같습니다.

use std::time::Instant;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, warn};

use orquestra_shard::{StepError, StepEvent, StepStatus};

use crate::error::BddError;
use crate::feature::{Feature, Scenario};
use crate::sink::DynEventSink;
use crate::step::{Step, StepContext, StepKind};

const FIELD_SEPARATOR: &str = "\u{1}";

/// 결정적 스텝 ID
pub fn step_id(feature: &str, scenario: &str, keyword: StepKind, step: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(feature.as_bytes());
    hasher.update(FIELD_SEPARATOR);
    hasher.update(scenario.as_bytes());
    hasher.update(FIELD_SEPARATOR);
    hasher.update(keyword.as_str());
    hasher.update(FIELD_SEPARATOR);
    hasher.update(step.as_bytes());
    hex::encode(hasher.finalize())
}

fn event(feature: &Feature, scenario: &Scenario, step: &Step, status: StepStatus) -> StepEvent {
    StepEvent {
        run_id: feature.run_id().to_owned(),
        worker_pid: std::process::id(),
        test_file: None,
        feature: feature.name.clone(),
        scenario: scenario.name().to_owned(),
        step_id: step_id(&feature.name, scenario.name(), step.kind(), step.name()),
        step_name: step.name().to_owned(),
        keyword: step.kind(),
        ts: Utc::now(),
        t_collect: None,
        t_start: None,
        t_end: None,
        status,
        error: None,
    }
}

/// 모든 시나리오의 모든 스텝에 대해 pending 이벤트를 기록하고 수집 시각을 남깁니다.
pub(crate) async fn collect(feature: &Feature) -> Result<(), BddError> {
    let mut count = 0usize;
    for scenario in &feature.scenarios {
        for step in scenario.steps() {
            let mut pending = event(feature, scenario, step, StepStatus::Pending);
            pending.t_collect = Some(pending.ts);
            feature
                .collected
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .insert(pending.step_id.clone(), pending.ts);

            DynEventSink::write(feature.sink.as_ref(), &pending).await.map_err(BddError::Sink)?;
            count += 1;
        }
    }
    debug!(feature = %feature.name, steps = count, "collected steps");
    Ok(())
}

/// 시나리오의 스텝을 선언 순서대로 실행합니다.
///
/// 각 스텝은 누적 컨텍스트의 스냅샷을 받고, 반환값은 다음 스텝 전에 병합됩니다.
/// 스텝이 실패하면 failed 이벤트를 기록하고 남은 스텝을 실행하지 않습니다.
pub(crate) async fn run_scenario(
    feature: &Feature,
    scenario: &Scenario,
    initial: StepContext,
) -> Result<StepContext, BddError> {
    let started = Instant::now();
    let mut ctx = initial;

    for step in scenario.steps() {
        let mut record = event(feature, scenario, step, StepStatus::Success);
        record.t_collect = feature
            .collected
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&record.step_id)
            .copied();
        let t_start = Utc::now();

        let outcome = step.run(ctx.clone()).await;
        record.t_start = Some(t_start);
        record.t_end = Some(Utc::now());
        record.ts = Utc::now();

        match outcome {
            Ok(delta) => {
                ctx = ctx.merged(delta);
                debug!(
                    feature = %feature.name,
                    scenario = scenario.name(),
                    keyword = %step.kind(),
                    step = step.name(),
                    "step passed"
                );
                DynEventSink::write(feature.sink.as_ref(), &record).await.map_err(BddError::Sink)?;
            }
            Err(err) => {
                error!(
                    feature = %feature.name,
                    scenario = scenario.name(),
                    keyword = %step.kind(),
                    step = step.name(),
                    error = %format!("{err:#}"),
                    "step failed"
                );
                record.status = StepStatus::Failed;
                record.error = Some(StepError {
                    message: err.to_string(),
                    stack: Some(format!("{err:?}")),
                });
                if let Err(sink_err) = DynEventSink::write(feature.sink.as_ref(), &record).await {
                    warn!(error = %sink_err, "failed to record step failure");
                }
                return Err(BddError::StepFailed {
                    feature: feature.name.clone(),
                    scenario: scenario.name().to_owned(),
                    kind: step.kind(),
                    step: step.name().to_owned(),
                    source: err,
                });
            }
        }
    }

    info!(
        feature = %feature.name,
        scenario = scenario.name(),
        steps = scenario.steps().len(),
        elapsed_ms = elapsed_ms(started),
        "scenario passed"
    );
    Ok(ctx)
}

/// 경과 시간(ms), `u64` 범위를 넘으면 포화
fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
