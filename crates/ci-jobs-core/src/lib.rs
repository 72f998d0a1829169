//! ci-jobs core - dependency-aware CI job selection
//!
//! This crate provides the project graph, change detection, change
//! propagation and job synthesis used to decide which lint and test jobs a
//! workspace needs to run for a change.
//!
//! The stages are pure transformations:
//! 1. [`ProjectGraph::build`] validates projects and dependency edges
//! 2. [`ChangeDetector::detect_changes`] attributes changed files to projects
//! 3. [`expand`] adds every transitive dependent of a changed project
//! 4. [`synthesize`] turns the affected projects into job lists

pub mod config;
pub mod error;
pub mod jobs;
pub mod monorepo;

pub use config::Config;
pub use error::{ChangeError, CiJobsError, ConfigError, GitError, GraphError, Result};
pub use jobs::{event_applies, synthesize, Job, JobCategory, JobOptions, JobSet};
pub use monorepo::{
    expand, AffectReason, AffectedProject, AffectedSet, ChangeDetector, ChangeFilter, ChangeSet,
    DiffSource, JobDefinition, Project, ProjectGraph, ProjectId, StaticDiff, TestEnvironment,
};
