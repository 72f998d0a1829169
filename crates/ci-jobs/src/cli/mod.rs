//! CLI definition and command handling

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use commands::{AffectedCommand, GraphCommand, InitCommand, JobsCommand};

/// ci-jobs - Affected-project CI job selection for monorepos
#[derive(Debug, Parser)]
#[command(name = "ci-jobs")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Working directory
    #[arg(short = 'C', long, global = true)]
    pub directory: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compute the CI jobs for the projects affected since a base ref
    Jobs(JobsCommand),

    /// List affected projects and why they are affected
    Affected(AffectedCommand),

    /// Show the project dependency graph
    Graph(GraphCommand),

    /// Write a starter configuration
    Init(InitCommand),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> anyhow::Result<()> {
        // Change to specified directory if provided
        if let Some(dir) = &self.directory {
            std::env::set_current_dir(dir)?;
        }

        match self.command {
            Commands::Jobs(ref cmd) => cmd.execute(&self),
            Commands::Affected(ref cmd) => cmd.execute(&self),
            Commands::Graph(ref cmd) => cmd.execute(&self),
            Commands::Init(ref cmd) => cmd.execute(&self),
        }
    }

    /// Whether human-readable status messages should be printed
    pub fn chatty(&self) -> bool {
        self.format == OutputFormat::Text && !self.quiet
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_subcommands() {
        let cmd = Cli::command();
        let names: Vec<&str> = cmd
            .get_subcommands()
            .map(|c| c.get_name())
            .filter(|name| *name != "help")
            .collect();
        assert_eq!(names, vec!["jobs", "affected", "graph", "init"]);
    }

    #[test]
    fn test_parse_jobs() {
        let cli = Cli::parse_from([
            "ci-jobs",
            "--format",
            "json",
            "jobs",
            "--base-ref",
            "origin/main",
            "--event",
            "pull_request",
            "--var",
            "node=20",
        ]);
        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Commands::Jobs(cmd) => {
                assert_eq!(cmd.base_ref, "origin/main");
                assert_eq!(cmd.event, "pull_request");
                assert_eq!(cmd.vars, vec![("node".to_string(), "20".to_string())]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_jobs_defaults() {
        let cli = Cli::parse_from(["ci-jobs", "jobs"]);
        match cli.command {
            Commands::Jobs(cmd) => {
                assert!(cmd.base_ref.is_empty());
                assert!(cmd.event.is_empty());
                assert!(cmd.vars.is_empty());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_reject_malformed_var() {
        assert!(Cli::try_parse_from(["ci-jobs", "jobs", "--var", "novalue"]).is_err());
    }
}
