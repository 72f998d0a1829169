//! Jobs command

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::{info, instrument, warn};

use ci_jobs_core::jobs::template::placeholders;
use ci_jobs_core::{synthesize, CiJobsError, Config, JobOptions, JobSet, ProjectGraph};

use crate::cli::commands::workspace::Workspace;
use crate::cli::output;
use crate::cli::{Cli, OutputFormat};

/// Compute the CI jobs for the projects affected since a base ref
#[derive(Debug, Args)]
pub struct JobsCommand {
    /// Git ref to diff against; empty treats every project as changed
    #[arg(short, long, default_value = "", env = "CI_JOBS_BASE_REF")]
    pub base_ref: String,

    /// Trigger event; empty keeps jobs for every event
    #[arg(short, long, default_value = "", env = "CI_JOBS_EVENT")]
    pub event: String,

    /// Extra command template variable (repeatable)
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_var)]
    pub vars: Vec<(String, String)>,

    /// Configuration file (default: search from the working directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Parse a `key=value` pair
fn parse_var(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty variable name in '{}'", raw));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Placeholders referenced by job commands that no variable provides
fn unresolved_placeholders<'a>(
    graph: &'a ProjectGraph,
    vars: &BTreeMap<String, String>,
) -> BTreeSet<&'a str> {
    graph
        .projects()
        .flat_map(|project| project.lint.iter().chain(project.tests.values().flatten()))
        .flat_map(|definition| placeholders(&definition.command))
        .filter(|name| !vars.contains_key(*name))
        .collect()
}

impl JobsCommand {
    /// Synthesizer options: config test types, the event filter and command variables
    fn job_options(&self, config: &Config) -> anyhow::Result<JobOptions> {
        let mut options = config
            .job_options()
            .with_event(&self.event)
            .with_var("baseRef", &self.base_ref)
            .with_var("event", &self.event);
        for (key, value) in &self.vars {
            options = options.with_var(key, value);
        }
        options.validate().map_err(CiJobsError::from)?;
        Ok(options)
    }

    /// Execute the jobs command
    #[instrument(skip_all, fields(base_ref = %self.base_ref, event = %self.event))]
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!("executing jobs command");
        let workspace = Workspace::load(self.config.as_deref())?;
        let affected = workspace.affected(&self.base_ref, cli.chatty())?;

        if self.event.is_empty() {
            info!("no event given, keeping jobs for every event");
        }

        let options = self.job_options(&workspace.config)?;

        for name in unresolved_placeholders(&workspace.graph, &options.command_vars) {
            warn!(placeholder = name, "no value for command placeholder, leaving it as is");
        }

        let jobs = synthesize(&workspace.graph, &affected, &options);
        info!(jobs = jobs.len(), affected = affected.len(), "synthesized jobs");

        if let Some(path) = output::github_output_path() {
            let names = output::write_github_outputs(&path, &jobs)?;
            if cli.chatty() {
                output::success(&format!(
                    "Wrote {} to {}",
                    names.join(", "),
                    path.display()
                ));
            }
            return Ok(());
        }

        match cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&jobs)?);
            }
            OutputFormat::Text => print_jobs(&jobs, cli.verbose),
        }

        Ok(())
    }
}

fn print_jobs(jobs: &JobSet, verbose: bool) {
    for (category, list) in jobs.categories() {
        println!(
            "{} {}",
            output::header(&category.to_string()),
            style(format!("({})", list.len())).dim()
        );
        if list.is_empty() {
            println!("  {}", style("no jobs").dim());
        }
        for job in list {
            let optional = if job.optional {
                format!(" {}", style("[optional]").yellow())
            } else {
                String::new()
            };
            println!(
                "  {} {}{}",
                output::project_style().apply_to(&job.project_name),
                job.name,
                optional
            );
            println!("    {}", output::command_style().apply_to(&job.command));

            if verbose {
                if let Some(env) = &job.test_env {
                    println!("{}", output::key_value("    test env", &env.start));
                    for (key, value) in &env.config {
                        println!("{}", output::key_value(&format!("      {}", key), value));
                    }
                }
            }
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_var() {
        assert_eq!(
            parse_var("node=20").unwrap(),
            ("node".to_string(), "20".to_string())
        );
        assert_eq!(
            parse_var("flags=--a=b").unwrap(),
            ("flags".to_string(), "--a=b".to_string())
        );
        assert_eq!(parse_var("empty=").unwrap(), ("empty".to_string(), String::new()));
    }

    #[test]
    fn test_unresolved_placeholders() {
        use ci_jobs_core::{JobDefinition, Project};

        let graph = ProjectGraph::build(vec![Project::new("core", "core")
            .with_lint(JobDefinition::new("lint --since={baseRef}"))
            .with_test("unit", JobDefinition::new("test --node={node} --os={os}"))])
        .unwrap();

        let mut vars = BTreeMap::new();
        vars.insert("baseRef".to_string(), "main".to_string());
        vars.insert("node".to_string(), "20".to_string());

        let unresolved: Vec<_> = unresolved_placeholders(&graph, &vars).into_iter().collect();
        assert_eq!(unresolved, vec!["os"]);
    }

    fn command(vars: &[(&str, &str)]) -> JobsCommand {
        JobsCommand {
            base_ref: "origin/trunk".to_string(),
            event: "push".to_string(),
            vars: vars
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            config: None,
        }
    }

    #[test]
    fn test_job_options_defaults() {
        let options = command(&[("node", "20")]).job_options(&Config::default()).unwrap();

        assert_eq!(options.event, "push");
        assert_eq!(options.command_vars["baseRef"], "origin/trunk");
        assert_eq!(options.command_vars["event"], "push");
        assert_eq!(options.command_vars["node"], "20");
        assert!(options.test_types.contains("unit"));
    }

    #[test]
    fn test_job_options_reject_nested_variable() {
        let err = command(&[("since", "--ref={baseRef}")])
            .job_options(&Config::default())
            .unwrap_err();
        assert_eq!(crate::exit_codes::for_error(&err), crate::exit_codes::CONFIG_ERROR);
    }

    #[test]
    fn test_parse_var_invalid() {
        assert!(parse_var("novalue").is_err());
        assert!(parse_var("=value").is_err());
    }
}
