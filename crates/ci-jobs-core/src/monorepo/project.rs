//! Project and job definition records

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::jobs::event_applies;

/// A workspace project with its CI configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Unique project name
    pub name: String,
    /// Path (relative to the workspace root) owning changed files
    pub path: PathBuf,
    /// Names of projects this project depends on
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Lint job, if the project is linted
    #[serde(default)]
    pub lint: Option<JobDefinition>,
    /// Test job definitions keyed by test type
    #[serde(default)]
    pub tests: BTreeMap<String, Vec<JobDefinition>>,
}

impl Project {
    /// Create a project with no dependencies and no jobs
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            dependencies: Vec::new(),
            lint: None,
            tests: BTreeMap::new(),
        }
    }

    /// Add a dependency on another project
    pub fn with_dependency(mut self, name: impl Into<String>) -> Self {
        self.dependencies.push(name.into());
        self
    }

    /// Set the lint job
    pub fn with_lint(mut self, lint: JobDefinition) -> Self {
        self.lint = Some(lint);
        self
    }

    /// Add a test job under the given test type
    pub fn with_test(mut self, test_type: impl Into<String>, job: JobDefinition) -> Self {
        self.tests.entry(test_type.into()).or_default().push(job);
        self
    }

    /// Test types this project declares jobs for
    pub fn test_types(&self) -> impl Iterator<Item = &str> {
        self.tests.keys().map(String::as_str)
    }
}

/// Environment a test job needs before it can run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestEnvironment {
    /// Command that starts the environment
    pub start: String,
    /// Environment configuration passed to the job
    #[serde(default)]
    pub config: BTreeMap<String, String>,
}

/// Declarative definition of one CI job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDefinition {
    /// Display name; defaults to the category when absent
    #[serde(default)]
    pub name: Option<String>,
    /// Command template, may contain `{variable}` placeholders
    pub command: String,
    /// Events this job runs for; empty means every event
    #[serde(default)]
    pub events: BTreeSet<String>,
    /// Failure of an optional job does not block the pipeline
    #[serde(default)]
    pub optional: bool,
    /// Shard arguments; one job is emitted per entry
    #[serde(default)]
    pub shards: Vec<String>,
    /// Environment required by test jobs
    #[serde(default)]
    pub test_env: Option<TestEnvironment>,
}

impl JobDefinition {
    /// Create a job definition that runs for every event
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            name: None,
            command: command.into(),
            events: BTreeSet::new(),
            optional: false,
            shards: Vec::new(),
            test_env: None,
        }
    }

    /// Set the display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Restrict the job to an event
    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.events.insert(event.into());
        self
    }

    /// Mark the job optional
    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Split the job into shards
    pub fn with_shards<I, S>(mut self, shards: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.shards = shards.into_iter().map(Into::into).collect();
        self
    }

    /// Attach a test environment
    pub fn with_test_env(mut self, env: TestEnvironment) -> Self {
        self.test_env = Some(env);
        self
    }

    /// Whether this job should run for `event`
    pub fn applies_to(&self, event: &str) -> bool {
        event_applies(&self.events, event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let project = Project::new("core", "packages/core")
            .with_dependency("utils")
            .with_lint(JobDefinition::new("pnpm lint"))
            .with_test("unit", JobDefinition::new("pnpm test").with_name("Unit"))
            .with_test("unit", JobDefinition::new("pnpm test:php"));

        assert_eq!(project.dependencies, vec!["utils"]);
        assert_eq!(project.tests["unit"].len(), 2);
        assert_eq!(project.test_types().collect::<Vec<_>>(), vec!["unit"]);
    }

    #[test]
    fn test_applies_to() {
        let job = JobDefinition::new("x").with_event("push");
        assert!(job.applies_to("push"));
        assert!(!job.applies_to("pull_request"));
        assert!(job.applies_to(""));
    }

    #[test]
    fn test_deserialize_defaults() {
        let job: JobDefinition = serde_json::from_str(r#"{"command": "make test"}"#).unwrap();
        assert_eq!(job, JobDefinition::new("make test"));
    }
}
