//! Change detection for workspace projects

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::error::{ChangeError, ConfigError, Result};

use super::graph::{ProjectGraph, ProjectId};

/// Files changed per project, or the "everything changed" sentinel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeSet {
    /// Treat every project as changed
    AllChanged,
    /// Changed files keyed by owning project; projects without changes are absent
    Partial(BTreeMap<String, BTreeSet<PathBuf>>),
}

impl Default for ChangeSet {
    fn default() -> Self {
        Self::Partial(BTreeMap::new())
    }
}

impl ChangeSet {
    /// An empty partial change set
    pub fn empty() -> Self {
        Self::default()
    }

    /// Record a changed file for a project. No-op on [`ChangeSet::AllChanged`].
    pub fn with_file(mut self, project: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        self.insert(project, file);
        self
    }

    /// Record a changed file for a project. No-op on [`ChangeSet::AllChanged`].
    pub fn insert(&mut self, project: impl Into<String>, file: impl Into<PathBuf>) {
        if let Self::Partial(changes) = self {
            changes.entry(project.into()).or_default().insert(file.into());
        }
    }

    /// Whether this is the "everything changed" sentinel
    pub fn is_all_changed(&self) -> bool {
        matches!(self, Self::AllChanged)
    }

    /// Changed files of a project, `None` when it has none
    pub fn files(&self, project: &str) -> Option<&BTreeSet<PathBuf>> {
        match self {
            Self::AllChanged => None,
            Self::Partial(changes) => changes.get(project).filter(|files| !files.is_empty()),
        }
    }
}

/// Source of changed file paths relative to a base ref
///
/// Implemented by the git integration; [`StaticDiff`] serves precomputed lists.
pub trait DiffSource {
    /// Paths, relative to the workspace root, that differ from `base_ref`
    fn changed_files(&self, base_ref: &str) -> Result<Vec<PathBuf>>;
}

/// A precomputed list of changed files
#[derive(Debug, Clone, Default)]
pub struct StaticDiff(pub Vec<PathBuf>);

impl DiffSource for StaticDiff {
    fn changed_files(&self, _base_ref: &str) -> Result<Vec<PathBuf>> {
        Ok(self.0.clone())
    }
}

/// Filter dropping changed files that should never trigger jobs
#[derive(Debug, Clone)]
pub struct ChangeFilter {
    patterns: Vec<String>,
    ignore: GlobSet,
}

impl Default for ChangeFilter {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
            ignore: GlobSet::empty(),
        }
    }
}

impl ChangeFilter {
    /// Build a filter from ignore globs
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> std::result::Result<Self, ConfigError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern.as_ref()).map_err(|e| ConfigError::InvalidValue {
                field: "ignore".to_string(),
                message: e.to_string(),
            })?;
            builder.add(glob);
        }
        let ignore = builder.build().map_err(|e| ConfigError::InvalidValue {
            field: "ignore".to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            patterns: patterns.iter().map(|p| p.as_ref().to_string()).collect(),
            ignore,
        })
    }

    /// Configured ignore patterns
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Whether the file should be ignored
    pub fn is_ignored(&self, file: &Path) -> bool {
        self.ignore.is_match(file)
    }
}

/// Strip `.` components so `./a/b`, `a/b/` and `a/b` compare equal
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Project paths sorted by component order, used for prefix ownership lookup
struct Ownership {
    entries: Vec<(PathBuf, ProjectId)>,
}

impl Ownership {
    /// Index project paths, rejecting equal or nested paths.
    ///
    /// After sorting, any path nested under another sorts directly after
    /// it or after another path nested under it, so checking neighbours is
    /// enough.
    fn new(graph: &ProjectGraph) -> std::result::Result<Self, ChangeError> {
        let mut entries: Vec<(PathBuf, ProjectId)> = graph
            .ids()
            .map(|id| (normalize(&graph.project(id).path), id))
            .collect();
        entries.sort();

        for pair in entries.windows(2) {
            let (first_path, first) = &pair[0];
            let (second_path, second) = &pair[1];
            if second_path.starts_with(first_path) {
                return Err(ChangeError::AmbiguousOwnership {
                    first: graph.name(*first).to_string(),
                    first_path: first_path.clone(),
                    second: graph.name(*second).to_string(),
                    second_path: second_path.clone(),
                });
            }
        }

        Ok(Self { entries })
    }

    /// Project owning `file` by longest prefix match
    fn owner(&self, file: &Path) -> Option<ProjectId> {
        // Paths are disjoint, so only the greatest path <= file can own it.
        let idx = self.entries.partition_point(|(path, _)| path.as_path() <= file);
        let (path, id) = self.entries.get(idx.checked_sub(1)?)?;
        file.starts_with(path).then_some(*id)
    }
}

/// Maps changed files onto the projects owning them
#[derive(Debug, Clone, Default)]
pub struct ChangeDetector {
    /// Workspace root stripped from absolute file paths
    root: Option<PathBuf>,
    /// Workspace directory relative to the diff root; project paths are relative to it
    base: Option<PathBuf>,
    /// Files to drop before attribution
    filter: ChangeFilter,
}

impl ChangeDetector {
    /// Create a new change detector
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the workspace root used to relativize absolute paths
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Set the workspace directory, relative to the root diff paths are reported from.
    ///
    /// Diff paths are rebased onto it before attribution; paths outside it
    /// belong to no project.
    pub fn with_base(mut self, base: impl Into<PathBuf>) -> Self {
        let base = normalize(&base.into());
        self.base = (!base.as_os_str().is_empty()).then_some(base);
        self
    }

    /// Set the ignore filter
    pub fn with_filter(mut self, filter: ChangeFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Detect projects changed since `base_ref`.
    ///
    /// Path ownership is validated before the diff is requested; any diff
    /// failure is returned unchanged.
    #[instrument(skip(self, graph, source))]
    pub fn detect_changes<S>(&self, graph: &ProjectGraph, base_ref: &str, source: &S) -> Result<ChangeSet>
    where
        S: DiffSource + ?Sized,
    {
        if base_ref.trim().is_empty() {
            return Err(ChangeError::MissingBaseRef.into());
        }

        let ownership = Ownership::new(graph)?;
        let files = source.changed_files(base_ref)?;
        Ok(self.attribute(graph, &ownership, &files))
    }

    /// Attribute an already known list of changed files to projects
    pub fn map_files(&self, graph: &ProjectGraph, changed_files: &[PathBuf]) -> Result<ChangeSet> {
        let ownership = Ownership::new(graph)?;
        Ok(self.attribute(graph, &ownership, changed_files))
    }

    fn attribute(&self, graph: &ProjectGraph, ownership: &Ownership, changed_files: &[PathBuf]) -> ChangeSet {
        debug!(
            projects = graph.len(),
            changed_files = changed_files.len(),
            "attributing changed files"
        );

        let mut changes = ChangeSet::empty();
        let mut unowned = 0usize;
        let mut ignored = 0usize;

        for file in changed_files {
            let relative = match &self.root {
                Some(root) if file.is_absolute() => file.strip_prefix(root).unwrap_or(file.as_path()),
                _ => file.as_path(),
            };
            let mut relative = normalize(relative);

            if let Some(base) = &self.base {
                match relative.strip_prefix(base) {
                    Ok(inside) => relative = inside.to_path_buf(),
                    Err(_) => {
                        unowned += 1;
                        continue;
                    }
                }
            }

            if self.filter.is_ignored(&relative) {
                ignored += 1;
                continue;
            }

            match ownership.owner(&relative) {
                Some(id) => changes.insert(graph.name(id), relative),
                None => unowned += 1,
            }
        }

        if unowned > 0 {
            warn!(unowned, "changed files outside any project were ignored");
        }

        if let ChangeSet::Partial(map) = &changes {
            info!(changed_projects = map.len(), ignored, "change detection complete");
        }
        changes
    }
}
