//! Graph command

use std::path::PathBuf;

use clap::Args;
use console::style;
use serde::Serialize;
use tracing::info;

use ci_jobs_core::ProjectGraph;

use crate::cli::commands::workspace::Workspace;
use crate::cli::output;
use crate::cli::{Cli, OutputFormat};

/// Show the project dependency graph
#[derive(Debug, Args)]
pub struct GraphCommand {
    /// Configuration file (default: search from the working directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// List projects in dependency order instead of declaration order
    #[arg(long)]
    pub topo: bool,
}

/// One project of the rendered graph
#[derive(Debug, Serialize)]
struct GraphNode<'a> {
    name: &'a str,
    path: String,
    dependencies: Vec<&'a str>,
    dependents: Vec<&'a str>,
    test_types: Vec<&'a str>,
}

fn nodes(graph: &ProjectGraph, topo: bool) -> Vec<GraphNode<'_>> {
    let ids: Vec<_> = if topo {
        graph.sorted().to_vec()
    } else {
        graph.ids().collect()
    };

    ids.into_iter()
        .map(|id| {
            let project = graph.project(id);
            GraphNode {
                name: &project.name,
                path: project.path.display().to_string(),
                dependencies: graph
                    .dependencies_of(id)
                    .iter()
                    .map(|&dep| graph.name(dep))
                    .collect(),
                dependents: graph
                    .dependents_of(id)
                    .iter()
                    .map(|&dep| graph.name(dep))
                    .collect(),
                test_types: project.test_types().collect(),
            }
        })
        .collect()
}

impl GraphCommand {
    /// Execute the graph command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(topo = self.topo, "executing graph command");
        let workspace = Workspace::load(self.config.as_deref())?;
        let nodes = nodes(&workspace.graph, self.topo);

        match cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&nodes)?);
            }
            OutputFormat::Text => {
                println!(
                    "{}",
                    output::header(&format!("Projects ({})", nodes.len()))
                );
                println!(
                    "{}",
                    output::key_value("config", &workspace.config_path.display().to_string())
                );
                println!();

                for node in &nodes {
                    println!(
                        "  {} {}",
                        output::project_style().apply_to(node.name),
                        style(&node.path).dim()
                    );
                    if !node.dependencies.is_empty() {
                        println!("    depends on: {}", node.dependencies.join(", "));
                    }
                    if !node.dependents.is_empty() {
                        println!("    needed by:  {}", node.dependents.join(", "));
                    }
                    if cli.verbose && !node.test_types.is_empty() {
                        println!("    tests:      {}", node.test_types.join(", "));
                    }
                }
            }
        }

        Ok(())
    }
}
