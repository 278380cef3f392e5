//! `orquestra clean` command handler

use std::io::Write;

use serde::Serialize;
use tracing::info;

use orquestra_core::config::OrquestraConfig;
use orquestra_shard::{RunId, ShardManager};

use crate::cli::CleanArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `clean` command.
pub async fn execute(
    args: CleanArgs,
    config: &OrquestraConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let report = clean(args, config).await?;
    writer.render(&report)?;
    Ok(())
}

async fn clean(args: CleanArgs, config: &OrquestraConfig) -> Result<CleanReport, CliError> {
    let root = config.shard.resolved_root();

    let (target, removed) = match (args.run_id, args.all) {
        (_, true) => (CleanTarget::All, ShardManager::clean_all(&root).await?),
        (Some(id), false) => {
            let shards = ShardManager::new(&root, RunId::new(id)?);
            let removed = shards.clean().await?;
            (CleanTarget::Run(shards.run_id().as_str().to_owned()), removed)
        }
        (None, false) => {
            return Err(CliError::Command(
                "nothing to clean: pass --run-id ID or --all".to_owned(),
            ));
        }
    };

    info!(root = %root.display(), ?target, removed, "clean finished");
    Ok(CleanReport {
        root: root.display().to_string(),
        target,
        removed,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CleanTarget {
    All,
    Run(String),
}

#[derive(Serialize)]
pub struct CleanReport {
    pub root: String,
    pub target: CleanTarget,
    /// `false` when there was nothing to delete.
    pub removed: bool,
}

impl Render for CleanReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        match (&self.target, self.removed) {
            (CleanTarget::All, true) => writeln!(w, "Removed all runs under {}", self.root),
            (CleanTarget::All, false) => writeln!(w, "Nothing to remove under {}", self.root),
            (CleanTarget::Run(id), true) => writeln!(w, "Removed run {id}"),
            (CleanTarget::Run(id), false) => writeln!(w, "Nothing to remove for run {id}"),
        }
    }
}
