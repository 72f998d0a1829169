//! Job synthesis from the affected project set

use tracing::{debug, info, instrument};

use crate::monorepo::affected::AffectedSet;
use crate::monorepo::graph::ProjectGraph;
use crate::monorepo::project::{JobDefinition, Project, TestEnvironment};

use super::template::render;
use super::{Job, JobCategory, JobOptions, JobSet};

const LINT_JOB_NAME: &str = "Lint";

/// Build the job lists for every affected project.
///
/// Projects are visited in graph declaration order, and each project's
/// definitions in their declared order, so identical inputs always produce
/// identical output.
#[instrument(skip_all, fields(affected = affected.len(), event = %options.event))]
pub fn synthesize(graph: &ProjectGraph, affected: &AffectedSet, options: &JobOptions) -> JobSet {
    let mut jobs = JobSet::default();
    for test_type in options.test_types.iter().map(String::as_str).chain(graph.test_types()) {
        jobs.test.entry(test_type.to_string()).or_default();
    }

    let mut filtered = 0usize;

    for id in graph.ids().filter(|&id| affected.contains_id(id)) {
        let project = graph.project(id);

        if let Some(lint) = &project.lint {
            if lint.applies_to(&options.event) {
                jobs.lint.push(lint_job(project, lint, options));
            } else {
                filtered += 1;
            }
        }

        for (test_type, definitions) in &project.tests {
            for definition in definitions {
                if !definition.applies_to(&options.event) {
                    filtered += 1;
                    continue;
                }
                jobs.test
                    .entry(test_type.clone())
                    .or_default()
                    .extend(test_jobs(project, test_type, definition, options));
            }
        }
    }

    if filtered > 0 {
        debug!(filtered, event = %options.event, "job definitions skipped by event filter");
    }
    info!(
        lint = jobs.lint.len(),
        test = jobs.len() - jobs.lint.len(),
        "jobs synthesized"
    );
    jobs
}

fn lint_job(project: &Project, definition: &JobDefinition, options: &JobOptions) -> Job {
    Job {
        project_name: project.name.clone(),
        category: JobCategory::Lint,
        name: definition
            .name
            .clone()
            .unwrap_or_else(|| LINT_JOB_NAME.to_string()),
        command: render(&definition.command, &options.command_vars),
        optional: definition.optional,
        shard: None,
        test_env: None,
    }
}

/// One job per shard, or a single job when the definition is not sharded
fn test_jobs(
    project: &Project,
    test_type: &str,
    definition: &JobDefinition,
    options: &JobOptions,
) -> Vec<Job> {
    let name = definition
        .name
        .clone()
        .unwrap_or_else(|| test_type.to_string());
    let command = render(&definition.command, &options.command_vars);
    let test_env = definition
        .test_env
        .as_ref()
        .map(|env| render_env(env, options));

    let base = Job {
        project_name: project.name.clone(),
        category: JobCategory::Test(test_type.to_string()),
        name,
        command,
        optional: definition.optional,
        shard: None,
        test_env,
    };

    if definition.shards.is_empty() {
        return vec![base];
    }

    let total = definition.shards.len();
    definition
        .shards
        .iter()
        .enumerate()
        .map(|(i, shard)| {
            let shard = render(shard, &options.command_vars);
            Job {
                name: format!("{} ({}/{})", base.name, i + 1, total),
                command: format!("{} {}", base.command, shard),
                shard: Some(shard),
                ..base.clone()
            }
        })
        .collect()
}

fn render_env(env: &TestEnvironment, options: &JobOptions) -> TestEnvironment {
    TestEnvironment {
        start: render(&env.start, &options.command_vars),
        config: env
            .config
            .iter()
            .map(|(k, v)| (k.clone(), render(v, &options.command_vars)))
            .collect(),
    }
}
