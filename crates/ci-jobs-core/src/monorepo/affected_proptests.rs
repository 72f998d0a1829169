//! Property-based tests for graph construction and change propagation
//!
//! Graphs are generated as DAGs by only letting a project depend on
//! projects declared before it; cycles are injected explicitly.

use super::*;
use crate::monorepo::project::Project;
use proptest::prelude::*;

fn name(i: usize) -> String {
    format!("p{i}")
}

/// Projects `p0..pn` where `(a, b)` with `a > b` means `pa` depends on `pb`
fn dag_projects(n: usize, edges: &[(usize, usize)]) -> Vec<Project> {
    (0..n)
        .map(|i| {
            edges
                .iter()
                .filter(|(from, to)| *from == i && to < from)
                .fold(Project::new(name(i), name(i)), |p, (_, to)| {
                    p.with_dependency(name(*to))
                })
        })
        .collect()
}

fn dag_strategy() -> impl Strategy<Value = (usize, Vec<(usize, usize)>, Vec<bool>)> {
    (1usize..12).prop_flat_map(|n| {
        (
            Just(n),
            prop::collection::vec((0..n, 0..n), 0..n * 2),
            prop::collection::vec(any::<bool>(), n),
        )
    })
}

proptest! {
    #[test]
    fn prop_acyclic_graphs_build((n, edges, _) in dag_strategy()) {
        let graph = ProjectGraph::build(dag_projects(n, &edges));
        prop_assert!(graph.is_ok());
        prop_assert_eq!(graph.unwrap().sorted().len(), n);
    }

    #[test]
    fn prop_cycles_are_rejected((n, edges, _) in dag_strategy(), len in 1usize..6) {
        let len = len.min(n);
        let mut projects = dag_projects(n, &edges);
        // Close a ring p0 -> p1 -> ... -> p(len-1) -> p0
        for i in 0..len {
            let next = name((i + 1) % len);
            projects[i].dependencies.push(next);
        }

        match ProjectGraph::build(projects.clone()) {
            Err(GraphError::CyclicDependency { cycle }) => {
                prop_assert!(cycle.len() >= 2);
                prop_assert_eq!(cycle.first(), cycle.last());
                for pair in cycle.windows(2) {
                    let from = projects.iter().find(|p| p.name == pair[0]).unwrap();
                    prop_assert!(from.dependencies.contains(&pair[1]));
                }
            }
            other => prop_assert!(false, "expected cycle error, got {:?}", other.map(|g| g.len())),
        }
    }

    #[test]
    fn prop_expand_is_closed_and_minimal((n, edges, changed) in dag_strategy()) {
        let graph = ProjectGraph::build(dag_projects(n, &edges)).unwrap();
        let changes = changed
            .iter()
            .enumerate()
            .filter(|(_, c)| **c)
            .fold(ChangeSet::empty(), |set, (i, _)| set.with_file(name(i), format!("{}/f", name(i))));

        let affected = expand(&graph, &changes).unwrap();

        for id in graph.ids() {
            let project = graph.name(id);
            let direct = changes.files(project).is_some();
            let via_dependency = graph
                .dependencies_of(id)
                .iter()
                .any(|&dep| affected.contains_id(dep));

            // No omission: seeds and dependents of affected projects are in.
            if direct || via_dependency {
                prop_assert!(affected.contains_id(id), "{} missing", project);
            }
            // No spurious inclusion: anything else stays out.
            if affected.contains_id(id) {
                prop_assert!(direct || via_dependency, "{} spurious", project);
            }
        }
    }

    #[test]
    fn prop_all_changed_is_every_project((n, edges, _) in dag_strategy()) {
        let graph = ProjectGraph::build(dag_projects(n, &edges)).unwrap();
        let affected = expand(&graph, &ChangeSet::AllChanged).unwrap();
        let all: Vec<&str> = graph.projects().map(|p| p.name.as_str()).collect();
        prop_assert_eq!(affected.names().collect::<Vec<_>>(), all);
    }
}
