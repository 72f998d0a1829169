//! CI job synthesis
//!
//! Turns the affected project set into categorized job lists:
//! - one `lint` list
//! - one list per declared test type
//!
//! Jobs are filtered by trigger event and their command templates are
//! rendered with the run's command variables.

mod synthesizer;
pub mod template;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Serialize, Serializer};

use crate::monorepo::project::TestEnvironment;

pub use synthesizer::synthesize;

/// Whether a job restricted to `events` runs for `event`.
///
/// An empty `event` means the caller asked for no filtering; an empty
/// `events` set means the job is unconstrained.
pub fn event_applies(events: &BTreeSet<String>, event: &str) -> bool {
    event.is_empty() || events.is_empty() || events.contains(event)
}

/// Category a job belongs to
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum JobCategory {
    /// Lint job
    Lint,
    /// Test job of the named test type
    Test(String),
}

impl fmt::Display for JobCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lint => write!(f, "lint"),
            Self::Test(test_type) => write!(f, "{}", test_type),
        }
    }
}

impl Serialize for JobCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A concrete job for the CI platform to run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Owning project
    pub project_name: String,
    /// Job category
    pub category: JobCategory,
    /// Display name
    pub name: String,
    /// Rendered command
    pub command: String,
    /// Failure does not block the pipeline
    pub optional: bool,
    /// Shard argument when the job is one shard of a split definition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shard: Option<String>,
    /// Rendered test environment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_env: Option<TestEnvironment>,
}

/// Job lists grouped by category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobSet {
    /// Lint jobs
    pub lint: Vec<Job>,
    /// Test jobs keyed by test type
    pub test: BTreeMap<String, Vec<Job>>,
}

impl JobSet {
    /// Test jobs of one type; empty when the type has none
    pub fn tests(&self, test_type: &str) -> &[Job] {
        self.test.get(test_type).map(Vec::as_slice).unwrap_or_default()
    }

    /// Every category with its jobs, lint first then test types in order
    pub fn categories(&self) -> impl Iterator<Item = (JobCategory, &[Job])> {
        std::iter::once((JobCategory::Lint, self.lint.as_slice())).chain(
            self.test
                .iter()
                .map(|(t, jobs)| (JobCategory::Test(t.clone()), jobs.as_slice())),
        )
    }

    /// Total number of jobs
    pub fn len(&self) -> usize {
        self.lint.len() + self.test.values().map(Vec::len).sum::<usize>()
    }

    /// Whether no job was selected
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Per-run options of the job synthesizer
#[derive(Debug, Clone, Default)]
pub struct JobOptions {
    /// Trigger event; empty disables event filtering
    pub event: String,
    /// Values substituted into `{name}` placeholders
    pub command_vars: BTreeMap<String, String>,
    /// Test types always present in the output, even without jobs
    pub test_types: BTreeSet<String>,
}

impl JobOptions {
    /// Options without event filtering or variables
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter jobs by trigger event
    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = event.into();
        self
    }

    /// Add a command variable
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.command_vars.insert(name.into(), value.into());
        self
    }

    /// Check the command variables render stably, see [`template::validate_vars`]
    pub fn validate(&self) -> Result<(), crate::error::ConfigError> {
        template::validate_vars(&self.command_vars)
    }

    /// Declare test types that must always appear in the output
    pub fn with_test_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.test_types.extend(types.into_iter().map(Into::into));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn test_event_applies() {
        let push = events(&["push"]);

        assert!(event_applies(&push, "push"));
        assert!(!event_applies(&push, "pull_request"));
        assert!(event_applies(&push, ""));
        assert!(event_applies(&events(&[]), "pull_request"));
        assert!(event_applies(&events(&[]), ""));
    }

    #[test]
    fn test_category_display() {
        assert_eq!(JobCategory::Lint.to_string(), "lint");
        assert_eq!(JobCategory::Test("e2e".into()).to_string(), "e2e");
    }

    #[test]
    fn test_job_serializes_camel_case() {
        let job = Job {
            project_name: "core".into(),
            category: JobCategory::Test("unit".into()),
            name: "Unit".into(),
            command: "pnpm test".into(),
            optional: true,
            shard: None,
            test_env: None,
        };

        let json = serde_json::to_string(&job).unwrap();
        assert_eq!(
            json,
            r#"{"projectName":"core","category":"unit","name":"Unit","command":"pnpm test","optional":true}"#
        );
    }

    #[test]
    fn test_empty_job_set_categories() {
        let mut jobs = JobSet::default();
        jobs.test.insert("unit".into(), Vec::new());

        let categories: Vec<_> = jobs.categories().map(|(c, j)| (c.to_string(), j.len())).collect();
        assert_eq!(categories, vec![("lint".to_string(), 0), ("unit".to_string(), 0)]);
        assert!(jobs.is_empty());
        assert!(jobs.tests("e2e").is_empty());
    }
}
