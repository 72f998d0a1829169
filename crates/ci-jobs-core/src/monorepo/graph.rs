//! Dependency graph for workspace projects

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::error::GraphError;

use super::project::Project;

/// Stable handle of a project inside a [`ProjectGraph`]
///
/// Handles are assigned in declaration order and are only meaningful for the
/// graph that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ProjectId(usize);

impl ProjectId {
    /// Position of the project in declaration order
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Immutable dependency graph of workspace projects
///
/// Projects live in a flat arena in declaration order. Edges are stored as
/// adjacency tables of [`ProjectId`]s in both directions.
#[derive(Debug, Clone)]
pub struct ProjectGraph {
    /// Project records in declaration order
    projects: Vec<Project>,
    /// Name to handle lookup
    index: HashMap<String, ProjectId>,
    /// Forward edges: projects each project depends on
    dependencies: Vec<Vec<ProjectId>>,
    /// Reverse edges: projects depending on each project
    dependents: Vec<Vec<ProjectId>>,
    /// Topologically sorted order (dependencies before dependents)
    sorted_order: Vec<ProjectId>,
}

impl ProjectGraph {
    /// Build and validate a graph from project records
    #[instrument(skip_all, fields(projects = projects.len()))]
    pub fn build(projects: Vec<Project>) -> Result<Self, GraphError> {
        let mut index = HashMap::with_capacity(projects.len());
        for (i, project) in projects.iter().enumerate() {
            if index.insert(project.name.clone(), ProjectId(i)).is_some() {
                return Err(GraphError::DuplicateProject(project.name.clone()));
            }
        }

        // Resolve dependency names to handles
        let mut dependencies = Vec::with_capacity(projects.len());
        for project in &projects {
            let mut deps: Vec<ProjectId> = Vec::with_capacity(project.dependencies.len());
            for dep in &project.dependencies {
                let id = *index.get(dep).ok_or_else(|| GraphError::DanglingDependency {
                    project: project.name.clone(),
                    dependency: dep.clone(),
                })?;
                if !deps.contains(&id) {
                    deps.push(id);
                }
            }
            dependencies.push(deps);
        }

        // Reverse index, filled in declaration order
        let mut dependents: Vec<Vec<ProjectId>> = vec![Vec::new(); projects.len()];
        for (i, deps) in dependencies.iter().enumerate() {
            for dep in deps {
                dependents[dep.0].push(ProjectId(i));
            }
        }

        let sorted_order = Self::topological_sort(&dependencies).map_err(|cycle| {
            GraphError::CyclicDependency {
                cycle: cycle.iter().map(|id| projects[id.0].name.clone()).collect(),
            }
        })?;

        let edges: usize = dependencies.iter().map(Vec::len).sum();
        info!(projects = projects.len(), edges, "project graph built");

        Ok(Self {
            projects,
            index,
            dependencies,
            dependents,
            sorted_order,
        })
    }

    /// Depth-first topological sort.
    ///
    /// Walks with an explicit stack of in-progress nodes, each paired with
    /// the index of its next unexplored edge. Returns the offending cycle
    /// (first node repeated at the end) when a node is reached again while
    /// still in progress.
    fn topological_sort(dependencies: &[Vec<ProjectId>]) -> Result<Vec<ProjectId>, Vec<ProjectId>> {
        let mut marks = vec![Mark::Unvisited; dependencies.len()];
        let mut stack: Vec<(ProjectId, usize)> = Vec::new();
        let mut sorted = Vec::with_capacity(dependencies.len());

        for root in 0..dependencies.len() {
            if marks[root] != Mark::Unvisited {
                continue;
            }
            marks[root] = Mark::InProgress;
            stack.push((ProjectId(root), 0));

            while let Some((id, next)) = stack.last_mut() {
                let id = *id;
                let Some(&dep) = dependencies[id.0].get(*next) else {
                    stack.pop();
                    marks[id.0] = Mark::Done;
                    sorted.push(id);
                    continue;
                };
                *next += 1;

                match marks[dep.0] {
                    Mark::InProgress => {
                        let start = stack.iter().position(|&(n, _)| n == dep).unwrap_or(0);
                        let mut cycle: Vec<ProjectId> = stack[start..].iter().map(|&(n, _)| n).collect();
                        cycle.push(dep);
                        return Err(cycle);
                    }
                    Mark::Unvisited => {
                        marks[dep.0] = Mark::InProgress;
                        stack.push((dep, 0));
                    }
                    Mark::Done => {}
                }
            }
        }

        Ok(sorted)
    }

    /// Number of projects
    pub fn len(&self) -> usize {
        self.projects.len()
    }

    /// Whether the graph has no projects
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Look up a project by name
    pub fn get(&self, name: &str) -> Result<&Project, GraphError> {
        self.id(name).map(|id| self.project(id))
    }

    /// Resolve a project name to its handle
    pub fn id(&self, name: &str) -> Result<ProjectId, GraphError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| GraphError::NotFound(name.to_string()))
    }

    /// Project record for a handle issued by this graph
    pub fn project(&self, id: ProjectId) -> &Project {
        &self.projects[id.0]
    }

    /// Name of the project behind a handle
    pub fn name(&self, id: ProjectId) -> &str {
        &self.projects[id.0].name
    }

    /// All projects in declaration order
    pub fn projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.iter()
    }

    /// All handles in declaration order
    pub fn ids(&self) -> impl Iterator<Item = ProjectId> {
        (0..self.projects.len()).map(ProjectId)
    }

    /// Projects the given project depends on directly
    pub fn dependencies_of(&self, id: ProjectId) -> &[ProjectId] {
        &self.dependencies[id.0]
    }

    /// Projects depending directly on the given project
    pub fn dependents_of(&self, id: ProjectId) -> &[ProjectId] {
        &self.dependents[id.0]
    }

    /// Names of the projects depending directly on `name`
    pub fn dependents(&self, name: &str) -> Result<Vec<&str>, GraphError> {
        let id = self.id(name)?;
        Ok(self.dependents_of(id).iter().map(|&d| self.name(d)).collect())
    }

    /// Handles in topological order (dependencies first)
    pub fn sorted(&self) -> &[ProjectId] {
        &self.sorted_order
    }

    /// Every test type declared by at least one project
    pub fn test_types(&self) -> BTreeSet<&str> {
        let types: BTreeSet<&str> = self.projects.iter().flat_map(Project::test_types).collect();
        debug!(count = types.len(), "collected declared test types");
        types
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_projects() -> Vec<Project> {
        vec![
            Project::new("core", "packages/core"),
            Project::new("utils", "packages/utils").with_dependency("core"),
            Project::new("cli", "packages/cli")
                .with_dependency("core")
                .with_dependency("utils"),
        ]
    }

    #[test]
    fn test_build_graph() {
        let graph = ProjectGraph::build(create_projects()).unwrap();

        assert_eq!(graph.len(), 3);
        assert_eq!(graph.sorted().len(), 3);
        let names: Vec<_> = graph.projects().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["core", "utils", "cli"]);
    }

    #[test]
    fn test_topological_order() {
        let mut projects = create_projects();
        projects.reverse();
        let graph = ProjectGraph::build(projects).unwrap();

        let sorted: Vec<_> = graph.sorted().iter().map(|&id| graph.name(id)).collect();
        let pos = |n: &str| sorted.iter().position(|s| *s == n).unwrap();

        assert!(pos("core") < pos("utils"));
        assert!(pos("utils") < pos("cli"));
    }

    #[test]
    fn test_dependents() {
        let graph = ProjectGraph::build(create_projects()).unwrap();

        assert_eq!(graph.dependents("core").unwrap(), vec!["utils", "cli"]);
        assert_eq!(graph.dependents("utils").unwrap(), vec!["cli"]);
        assert!(graph.dependents("cli").unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_dependency_edges_collapse() {
        let projects = vec![
            Project::new("a", "a"),
            Project::new("b", "b").with_dependency("a").with_dependency("a"),
        ];
        let graph = ProjectGraph::build(projects).unwrap();
        let b = graph.id("b").unwrap();
        assert_eq!(graph.dependencies_of(b).len(), 1);
    }

    #[test]
    fn test_not_found() {
        let graph = ProjectGraph::build(create_projects()).unwrap();
        assert_eq!(
            graph.get("missing").unwrap_err(),
            GraphError::NotFound("missing".to_string())
        );
        assert!(graph.dependents("missing").is_err());
    }

    #[test]
    fn test_dangling_dependency() {
        let projects = vec![Project::new("a", "a").with_dependency("ghost")];
        assert_eq!(
            ProjectGraph::build(projects).unwrap_err(),
            GraphError::DanglingDependency {
                project: "a".to_string(),
                dependency: "ghost".to_string(),
            }
        );
    }

    #[test]
    fn test_duplicate_project() {
        let projects = vec![Project::new("a", "a"), Project::new("a", "other")];
        assert_eq!(
            ProjectGraph::build(projects).unwrap_err(),
            GraphError::DuplicateProject("a".to_string())
        );
    }

    #[test]
    fn test_cycle_detection() {
        let projects = vec![
            Project::new("a", "a").with_dependency("b"),
            Project::new("b", "b").with_dependency("c"),
            Project::new("c", "c").with_dependency("a"),
        ];

        match ProjectGraph::build(projects).unwrap_err() {
            GraphError::CyclicDependency { cycle } => {
                assert_eq!(cycle, vec!["a", "b", "c", "a"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_self_dependency_is_cycle() {
        let projects = vec![Project::new("a", "a").with_dependency("a")];
        match ProjectGraph::build(projects).unwrap_err() {
            GraphError::CyclicDependency { cycle } => assert_eq!(cycle, vec!["a", "a"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_long_dependency_chain() {
        const DEPTH: usize = 200_000;
        let projects: Vec<Project> = (0..DEPTH)
            .map(|i| {
                let project = Project::new(format!("p{}", i), format!("p{}", i));
                if i + 1 < DEPTH {
                    project.with_dependency(format!("p{}", i + 1))
                } else {
                    project
                }
            })
            .collect();

        let graph = ProjectGraph::build(projects).unwrap();
        assert_eq!(graph.name(graph.sorted()[0]), format!("p{}", DEPTH - 1));
        assert_eq!(graph.name(graph.sorted()[DEPTH - 1]), "p0");
    }

    #[test]
    fn test_long_cycle_detection() {
        const DEPTH: usize = 200_000;
        let projects: Vec<Project> = (0..DEPTH)
            .map(|i| Project::new(format!("p{}", i), format!("p{}", i)).with_dependency(format!("p{}", (i + 1) % DEPTH)))
            .collect();

        match ProjectGraph::build(projects).unwrap_err() {
            GraphError::CyclicDependency { cycle } => {
                assert_eq!(cycle.len(), DEPTH + 1);
                assert_eq!(cycle.first(), cycle.last());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_declared_test_types() {
        use crate::monorepo::project::JobDefinition;

        let projects = vec![
            Project::new("a", "a").with_test("unit", JobDefinition::new("t")),
            Project::new("b", "b")
                .with_test("e2e", JobDefinition::new("t"))
                .with_test("unit", JobDefinition::new("t")),
        ];
        let graph = ProjectGraph::build(projects).unwrap();
        assert_eq!(graph.test_types().into_iter().collect::<Vec<_>>(), vec!["e2e", "unit"]);
    }
}
