//! Propagation of changes to dependent projects

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::error::GraphError;

use super::changes::ChangeSet;
use super::graph::{ProjectGraph, ProjectId};

/// Reason why a project is affected
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AffectReason {
    /// Every project was forced to be considered changed
    AllChanged,
    /// Files inside the project changed
    DirectChanges { files: usize },
    /// A dependency of the project is affected
    DependencyChanged { dependency: String },
}

impl fmt::Display for AffectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllChanged => write!(f, "all projects changed"),
            Self::DirectChanges { files: 1 } => write!(f, "1 changed file"),
            Self::DirectChanges { files } => write!(f, "{} changed files", files),
            Self::DependencyChanged { dependency } => {
                write!(f, "dependency '{}' changed", dependency)
            }
        }
    }
}

/// An affected project
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AffectedProject {
    /// Graph handle
    #[serde(skip)]
    pub id: ProjectId,
    /// Project name
    pub name: String,
    /// Why it is affected
    pub reason: AffectReason,
}

/// Projects whose jobs must run, keyed in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AffectedSet {
    members: BTreeMap<ProjectId, AffectedProject>,
    by_name: HashMap<String, ProjectId>,
}

impl AffectedSet {
    /// Number of affected projects
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether nothing is affected
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether the project behind `id` is affected
    pub fn contains_id(&self, id: ProjectId) -> bool {
        self.members.contains_key(&id)
    }

    /// Whether the named project is affected
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Reason the named project is affected
    pub fn reason(&self, name: &str) -> Option<&AffectReason> {
        let id = self.by_name.get(name)?;
        self.members.get(id).map(|p| &p.reason)
    }

    /// Affected projects in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &AffectedProject> {
        self.members.values()
    }

    /// Affected project names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.members.values().map(|p| p.name.as_str())
    }

    fn insert(&mut self, graph: &ProjectGraph, id: ProjectId, reason: AffectReason) -> bool {
        if self.members.contains_key(&id) {
            return false;
        }
        let name = graph.name(id).to_string();
        self.by_name.insert(name.clone(), id);
        self.members.insert(id, AffectedProject { id, name, reason });
        true
    }
}

/// Expand a change set to every project affected by it.
///
/// [`ChangeSet::AllChanged`] short-circuits to the full project set. A partial
/// set is expanded breadth-first over the reverse dependency index, seeded in
/// declaration order, so the work is O(V + E) and the recorded reasons are
/// stable between runs. Unknown project names in the change set fail with
/// [`GraphError::NotFound`].
#[instrument(skip_all, fields(all_changed = changes.is_all_changed()))]
pub fn expand(graph: &ProjectGraph, changes: &ChangeSet) -> Result<AffectedSet, GraphError> {
    let mut affected = AffectedSet::default();

    let map = match changes {
        ChangeSet::AllChanged => {
            for id in graph.ids() {
                affected.insert(graph, id, AffectReason::AllChanged);
            }
            info!(affected = affected.len(), "all projects marked as affected");
            return Ok(affected);
        }
        ChangeSet::Partial(map) => map,
    };

    let mut seeds: Vec<(ProjectId, usize)> = Vec::with_capacity(map.len());
    for (name, files) in map {
        let id = graph.id(name)?;
        if !files.is_empty() {
            seeds.push((id, files.len()));
        }
    }
    seeds.sort();

    let mut queue: VecDeque<ProjectId> = VecDeque::with_capacity(seeds.len());
    for (id, files) in seeds {
        affected.insert(graph, id, AffectReason::DirectChanges { files });
        queue.push_back(id);
    }
    let direct = queue.len();

    while let Some(current) = queue.pop_front() {
        for &dependent in graph.dependents_of(current) {
            let reason = AffectReason::DependencyChanged {
                dependency: graph.name(current).to_string(),
            };
            if affected.insert(graph, dependent, reason) {
                debug!(
                    project = graph.name(dependent),
                    via = graph.name(current),
                    "dependent affected"
                );
                queue.push_back(dependent);
            }
        }
    }

    info!(direct, affected = affected.len(), "change propagation complete");
    Ok(affected)
}


// Include property-based tests
#[cfg(test)]
#[path = "affected_proptests.rs"]
mod proptests;
