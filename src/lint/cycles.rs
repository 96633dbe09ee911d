//! Circular dependency detection.
//!
//! Runs over the converted project set before graph assembly, at two
//! granularities: project-level (a project transitively depending on
//! itself) and target-level (the full target graph, including the implicit
//! edge from a test target to its host). Detection is a three-color
//! depth-first traversal; the reported cycle is the first one found in
//! manifest-set order and always closes on itself.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::core::dependency::TargetDependency;
use crate::core::project::Project;

/// A dependency cycle, with the full ordered cycle path for diagnostics.
///
/// The first and last entries are the same node.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("circular dependency detected: {}", .cycle.join(" -> "))]
#[diagnostic(
    code(gantry::lint::circular_dependency),
    help("Break the cycle by removing or inverting one of the listed edges")
)]
pub struct CircularDependency {
    /// Ordered node names forming the cycle
    pub cycle: Vec<String>,
}

/// Verifies the converted project set is acyclic.
#[derive(Debug, Clone, Copy, Default)]
pub struct CircularDependencyLinter;

impl CircularDependencyLinter {
    /// Create a linter.
    pub fn new() -> Self {
        CircularDependencyLinter
    }

    /// Check both granularities; project-level first.
    pub fn lint_workspace(&self, projects: &[Project]) -> Result<(), CircularDependency> {
        self.lint_projects(projects)?;
        self.lint_targets(projects)
    }

    /// Check that no project transitively depends on itself.
    pub fn lint_projects(&self, projects: &[Project]) -> Result<(), CircularDependency> {
        let mut adjacency: BTreeMap<&PathBuf, BTreeSet<&PathBuf>> = BTreeMap::new();
        for project in projects {
            let edges = adjacency.entry(&project.path).or_default();
            for target in &project.targets {
                for dependency in &target.dependencies {
                    if let TargetDependency::Project { path, .. } = dependency {
                        if *path != project.path {
                            edges.insert(path);
                        }
                    }
                }
            }
        }

        if let Some(cycle) = find_cycle(&adjacency) {
            let names: BTreeMap<&PathBuf, &str> = projects
                .iter()
                .map(|p| (&p.path, p.name.as_str()))
                .collect();
            return Err(CircularDependency {
                cycle: cycle
                    .into_iter()
                    .map(|path| {
                        names
                            .get(path)
                            .map(|n| n.to_string())
                            .unwrap_or_else(|| path.display().to_string())
                    })
                    .collect(),
            });
        }
        Ok(())
    }

    /// Check the full target graph, within and across projects.
    pub fn lint_targets(&self, projects: &[Project]) -> Result<(), CircularDependency> {
        type Node<'a> = (&'a PathBuf, &'a str);
        let mut adjacency: BTreeMap<Node, BTreeSet<Node>> = BTreeMap::new();

        for project in projects {
            for target in &project.targets {
                let edges = adjacency.entry((&project.path, &target.name)).or_default();
                for dependency in &target.dependencies {
                    match dependency {
                        TargetDependency::Target { name } => {
                            edges.insert((&project.path, name));
                        }
                        TargetDependency::Project { target, path } => {
                            edges.insert((path, target));
                        }
                        TargetDependency::ExternalProduct { .. } => {}
                    }
                }
                if let Some(host) = &target.test_host {
                    edges.insert((&project.path, host));
                }
            }
        }

        if let Some(cycle) = find_cycle(&adjacency) {
            return Err(CircularDependency {
                cycle: cycle.into_iter().map(|(_, name)| name.to_string()).collect(),
            });
        }
        Ok(())
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Color {
    Gray,
    Black,
}

/// Find the first cycle in sorted-key order, as a closed path.
fn find_cycle<K: Ord + Clone>(adjacency: &BTreeMap<K, BTreeSet<K>>) -> Option<Vec<K>> {
    let mut colors: BTreeMap<&K, Color> = BTreeMap::new();
    let mut path: Vec<&K> = Vec::new();

    for node in adjacency.keys() {
        if !colors.contains_key(node) {
            if let Some(cycle) = visit(node, adjacency, &mut colors, &mut path) {
                return Some(cycle);
            }
        }
    }
    None
}

fn visit<'a, K: Ord + Clone>(
    node: &'a K,
    adjacency: &'a BTreeMap<K, BTreeSet<K>>,
    colors: &mut BTreeMap<&'a K, Color>,
    path: &mut Vec<&'a K>,
) -> Option<Vec<K>> {
    colors.insert(node, Color::Gray);
    path.push(node);

    for next in adjacency.get(node).into_iter().flatten() {
        match colors.get(&next) {
            Some(Color::Gray) => {
                // Close the cycle from its first occurrence on the path.
                let start = path.iter().position(|n| *n == next).unwrap_or(0);
                let mut cycle: Vec<K> = path[start..].iter().map(|n| (*n).clone()).collect();
                cycle.push(next.clone());
                return Some(cycle);
            }
            Some(Color::Black) => {}
            None => {
                // Nodes without declared edges cannot continue a cycle.
                if adjacency.contains_key(next) {
                    if let Some(cycle) = visit(next, adjacency, colors, path) {
                        return Some(cycle);
                    }
                } else {
                    colors.insert(next, Color::Black);
                }
            }
        }
    }

    path.pop();
    colors.insert(node, Color::Black);
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::target::{ProductKind, Target};

    fn project(path: &str, name: &str, targets: Vec<Target>) -> Project {
        let mut project = Project::new(path, name);
        project.targets = targets;
        project
    }

    #[test]
    fn test_acyclic_workspace_passes() {
        let projects = vec![
            project(
                "/ws/App",
                "App",
                vec![Target::new("App", ProductKind::App)
                    .with_dependency(TargetDependency::project("Lib", "/ws/Lib"))],
            ),
            project(
                "/ws/Lib",
                "Lib",
                vec![Target::new("Lib", ProductKind::Framework)],
            ),
        ];

        assert!(CircularDependencyLinter::new()
            .lint_workspace(&projects)
            .is_ok());
    }

    #[test]
    fn test_cross_project_cycle_reports_full_path() {
        let projects = vec![
            project(
                "/ws/App",
                "A",
                vec![Target::new("App", ProductKind::App)
                    .with_dependency(TargetDependency::project("Lib", "/ws/Lib"))],
            ),
            project(
                "/ws/Lib",
                "B",
                vec![Target::new("Lib", ProductKind::Framework)
                    .with_dependency(TargetDependency::project("App", "/ws/App"))],
            ),
        ];

        // Project-level detection fires first.
        let err = CircularDependencyLinter::new()
            .lint_workspace(&projects)
            .unwrap_err();
        assert_eq!(err.cycle, vec!["A", "B", "A"]);
        assert_eq!(err.cycle.first(), err.cycle.last());
    }

    #[test]
    fn test_target_cycle_within_project() {
        let projects = vec![project(
            "/ws/App",
            "App",
            vec![
                Target::new("App", ProductKind::App)
                    .with_dependency(TargetDependency::target("Lib")),
                Target::new("Lib", ProductKind::Framework)
                    .with_dependency(TargetDependency::target("App")),
            ],
        )];

        let err = CircularDependencyLinter::new()
            .lint_workspace(&projects)
            .unwrap_err();
        assert_eq!(err.cycle, vec!["App", "Lib", "App"]);
    }

    #[test]
    fn test_test_host_edge_participates_in_cycles() {
        let mut tests = Target::new("AppTests", ProductKind::UnitTests);
        tests.test_host = Some("App".to_string());

        let projects = vec![project(
            "/ws/App",
            "App",
            vec![
                Target::new("App", ProductKind::App)
                    .with_dependency(TargetDependency::target("AppTests")),
                tests,
            ],
        )];

        let err = CircularDependencyLinter::new()
            .lint_workspace(&projects)
            .unwrap_err();
        assert_eq!(err.cycle, vec!["App", "AppTests", "App"]);
    }

    #[test]
    fn test_reported_cycle_edges_exist() {
        let projects = vec![project(
            "/ws/App",
            "App",
            vec![
                Target::new("A", ProductKind::Framework)
                    .with_dependency(TargetDependency::target("B")),
                Target::new("B", ProductKind::Framework)
                    .with_dependency(TargetDependency::target("C")),
                Target::new("C", ProductKind::Framework)
                    .with_dependency(TargetDependency::target("B")),
            ],
        )];

        let err = CircularDependencyLinter::new()
            .lint_workspace(&projects)
            .unwrap_err();
        // The cycle is B -> C -> B, not A's entry path into it.
        assert_eq!(err.cycle, vec!["B", "C", "B"]);
    }
}
