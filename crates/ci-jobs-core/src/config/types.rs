//! Configuration types

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, GraphError};
use crate::jobs::JobOptions;
use crate::monorepo::changes::ChangeFilter;
use crate::monorepo::graph::ProjectGraph;
use crate::monorepo::project::Project;

/// Workspace configuration for ci-jobs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Test types always reported, even when no job is selected
    pub test_types: Vec<String>,

    /// Glob patterns of changed files that never trigger jobs
    pub ignore: Vec<String>,

    /// Projects in declaration order
    pub projects: Vec<Project>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            test_types: vec!["unit".to_string()],
            ignore: Vec::new(),
            projects: Vec::new(),
        }
    }
}

impl Config {
    /// Build the project graph described by this configuration
    pub fn graph(&self) -> Result<ProjectGraph, GraphError> {
        ProjectGraph::build(self.projects.clone())
    }

    /// Compile the ignore patterns
    pub fn change_filter(&self) -> Result<ChangeFilter, ConfigError> {
        ChangeFilter::new(&self.ignore)
    }

    /// Job options seeded with the declared test types
    pub fn job_options(&self) -> JobOptions {
        JobOptions::new().with_test_types(self.test_types.iter().cloned())
    }
}
