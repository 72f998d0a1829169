//! Affected command

use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;

use ci_jobs_core::{expand, CiJobsError};

use crate::cli::commands::workspace::Workspace;
use crate::cli::output;
use crate::cli::{Cli, OutputFormat};

/// List affected projects and why they are affected
#[derive(Debug, Args)]
pub struct AffectedCommand {
    /// Git ref to diff against; empty treats every project as changed
    #[arg(short, long, default_value = "", env = "CI_JOBS_BASE_REF")]
    pub base_ref: String,

    /// Configuration file (default: search from the working directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl AffectedCommand {
    /// Execute the affected command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(base_ref = %self.base_ref, "executing affected command");
        let workspace = Workspace::load(self.config.as_deref())?;
        let changes = workspace.changes(&self.base_ref, cli.chatty())?;
        let affected = expand(&workspace.graph, &changes).map_err(CiJobsError::from)?;

        match cli.format {
            OutputFormat::Json => {
                let projects: Vec<_> = affected.iter().collect();
                println!("{}", serde_json::to_string_pretty(&projects)?);
            }
            OutputFormat::Text => {
                if affected.is_empty() {
                    if !cli.quiet {
                        output::info("No projects affected");
                    }
                    return Ok(());
                }

                println!(
                    "{}",
                    output::header(&format!(
                        "Affected projects ({}/{})",
                        affected.len(),
                        workspace.graph.len()
                    ))
                );
                for project in affected.iter() {
                    println!(
                        "  {} {}",
                        output::project_style().apply_to(&project.name),
                        style(format!("({})", project.reason)).dim()
                    );
                    if cli.verbose {
                        for file in changes.files(&project.name).into_iter().flatten() {
                            println!("    {}", file.display());
                        }
                    }
                }
            }
        }

        Ok(())
    }
}
