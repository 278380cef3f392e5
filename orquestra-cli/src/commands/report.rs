//! `orquestra report` command handler

use std::io::Write;

use serde::Serialize;
use tracing::{debug, info};

use orquestra_core::config::{OrquestraConfig, ShardConfig};
use orquestra_shard::{ConsoleReporter, FeatureReport, RunId, ShardManager, Summary, Timeline};

use crate::cli::{OutputFormat, ReportArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `report` command.
pub async fn execute(
    args: ReportArgs,
    config: &OrquestraConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let run_id = resolve_run_id(args.run_id.as_deref(), &config.shard)?;
    let shards = ShardManager::new(config.shard.resolved_root(), run_id);
    info!(run_id = %shards.run_id(), dir = %shards.run_dir().display(), "reading run events");

    let events = shards.read_events().await?;
    if events.is_empty() {
        return Err(CliError::Command(format!(
            "no events recorded for run '{}' under {}",
            shards.run_id(),
            shards.root().display()
        )));
    }

    let color = config.reporter.color && !args.no_color && writer.format() == OutputFormat::Text;
    let report = RunReport::new(shards.run_id().as_str(), Timeline::fold(events), color);
    writer.render(&report)?;
    Ok(())
}

/// `--run-id`, then `shard.run_id`, then the run id environment variable.
///
/// Unlike test bootstrap, reporting never generates a fresh id.
fn resolve_run_id(explicit: Option<&str>, shard: &ShardConfig) -> Result<RunId, CliError> {
    if let Some(id) = explicit.or(shard.run_id.as_deref()) {
        return Ok(RunId::new(id)?);
    }
    match RunId::from_env(&shard.run_id_env) {
        Some(id) => {
            let id = id?;
            debug!(run_id = %id, env_var = %shard.run_id_env, "using run id from environment");
            Ok(id)
        }
        None => Err(CliError::Command(format!(
            "no run id given: pass --run-id or set {}",
            shard.run_id_env
        ))),
    }
}

/// Folded run, rendered as the reporter tree (text) or structured groups (JSON).
#[derive(Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub summary: Summary,
    pub features: Vec<FeatureReport>,
    #[serde(skip)]
    timeline: Timeline,
    #[serde(skip)]
    reporter: ConsoleReporter,
}

impl RunReport {
    pub fn new(run_id: &str, timeline: Timeline, color: bool) -> Self {
        Self {
            run_id: run_id.to_owned(),
            summary: timeline.summary(),
            features: timeline.features(),
            timeline,
            reporter: ConsoleReporter::new(color),
        }
    }
}

impl Render for RunReport {
    fn render_text(&self, mut w: &mut dyn Write) -> std::io::Result<()> {
        self.reporter.render(&self.timeline, &mut w)?;
        writeln!(w)?;
        writeln!(
            w,
            "{} steps: {} passed, {} failed, {} pending (run {})",
            self.summary.total(),
            self.summary.success,
            self.summary.failed,
            self.summary.pending,
            self.run_id
        )?;
        Ok(())
    }
}
