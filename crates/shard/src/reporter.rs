//! 콘솔 리포터 -- 병합된 타임라인을 피처/시나리오/스텝 트리로 출력
//!
//! ```text
//! checkout
//!     pay with card            (모든 스텝 성공 시 초록색)
//!         Given cart has 2 items
//!         When user pays       (실패 시 빨간색)
//!             → card declined
//! ```

use std::io::Write;

use colored::{ColoredString, Colorize};
use orquestra_core::config::ReporterConfig;
use tracing::info;

use crate::error::ShardError;
use crate::event::StepStatus;
use crate::manager::ShardManager;
use crate::timeline::{ScenarioStatus, Timeline};

/// 표준 출력용 리포터
#[derive(Debug, Clone, Copy)]
pub struct ConsoleReporter {
    color: bool,
}

#[derive(Clone, Copy)]
enum Style {
    Bold,
    Green,
    Red,
    Gray,
}

impl ConsoleReporter {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// 리포터 설정으로 생성합니다.
    pub fn from_config(config: &ReporterConfig) -> Self {
        Self::new(config.color)
    }

    /// 런의 이벤트를 읽어 표준 출력에 보고하고, 접힌 타임라인을 반환합니다.
    pub async fn report(&self, shards: &ShardManager) -> Result<Timeline, ShardError> {
        let timeline = Timeline::fold(shards.read_events().await?);
        let summary = timeline.summary();

        let mut out = std::io::stdout().lock();
        self.render(&timeline, &mut out)
            .and_then(|()| out.flush())
            .map_err(ShardError::Output)?;

        info!(
            run_id = %shards.run_id(),
            steps = summary.total(),
            success = summary.success,
            failed = summary.failed,
            pending = summary.pending,
            "run report printed"
        );
        Ok(timeline)
    }

    /// 타임라인을 출력합니다.
    pub fn render(&self, timeline: &Timeline, w: &mut impl Write) -> std::io::Result<()> {
        for feature in timeline.features() {
            writeln!(w, "{}", self.paint(&feature.name, Style::Bold))?;

            for scenario in &feature.scenarios {
                let all_ok = scenario.status() == ScenarioStatus::Passed;
                let label = format!("\t{}", scenario.name);
                if all_ok {
                    writeln!(w, "{}", self.paint(&label, Style::Green))?;
                } else {
                    writeln!(w, "{label}")?;
                }

                for step in &scenario.steps {
                    let line = format!("\t\t{} {}", step.keyword, step.step_name);
                    match step.status {
                        StepStatus::Failed => {
                            writeln!(w, "{}", self.paint(&line, Style::Red))?;
                            if let Some(err) = step.error.as_ref().filter(|e| !e.message.is_empty())
                            {
                                let detail = format!("\t\t\t→ {}", err.message);
                                writeln!(w, "{}", self.paint(&detail, Style::Red))?;
                            }
                        }
                        _ if all_ok => writeln!(w, "{}", self.paint(&line, Style::Green))?,
                        _ => writeln!(w, "{}", self.paint(&line, Style::Gray))?,
                    }
                }
            }
        }
        Ok(())
    }

    fn paint(&self, text: &str, style: Style) -> String {
        if !self.color {
            return text.to_owned();
        }
        let styled: ColoredString = match style {
            Style::Bold => text.bold(),
            Style::Green => text.green(),
            Style::Red => text.red(),
            Style::Gray => text.bright_black(),
        };
        styled.to_string()
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new(true)
    }
}
