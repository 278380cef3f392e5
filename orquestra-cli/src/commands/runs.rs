//! `orquestra runs` command handler

use std::io::Write;

use serde::Serialize;
use tracing::info;

use orquestra_core::config::OrquestraConfig;
use orquestra_shard::{RunInfo, ShardManager};

use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `runs` command.
pub async fn execute(config: &OrquestraConfig, writer: &OutputWriter) -> Result<(), CliError> {
    let root = config.shard.resolved_root();
    let runs = ShardManager::list_runs(&root).await?;
    info!(root = %root.display(), count = runs.len(), "listed runs");

    writer.render(&RunsReport {
        root: root.display().to_string(),
        runs,
    })?;
    Ok(())
}

/// Recorded runs under the shard root, in name order.
#[derive(Serialize)]
pub struct RunsReport {
    pub root: String,
    pub runs: Vec<RunInfo>,
}

impl Render for RunsReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        if self.runs.is_empty() {
            writeln!(w, "No runs recorded under {}", self.root)?;
            return Ok(());
        }

        writeln!(w, "Runs under {}", self.root.bold())?;
        let width = self.runs.iter().map(|r| r.run_id.len()).max().unwrap_or(0);
        for run in &self.runs {
            writeln!(w, "  {:<width$}  {} events", run.run_id, run.events)?;
        }
        Ok(())
    }
}
