//! Workspace project graph and change propagation
//!
//! This module provides:
//! - Project records with their lint and test job definitions
//! - An immutable dependency graph with cycle detection
//! - Change detection mapping changed files to owning projects
//! - Propagation of changes to transitive dependents

pub mod affected;
pub mod changes;
pub mod graph;
pub mod project;

pub use affected::{expand, AffectReason, AffectedProject, AffectedSet};
pub use changes::{ChangeDetector, ChangeFilter, ChangeSet, DiffSource, StaticDiff};
pub use graph::{ProjectGraph, ProjectId};
pub use project::{JobDefinition, Project, TestEnvironment};
