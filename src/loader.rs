//! Graph assembly.
//!
//! Builds the final graph from the mapper-transformed workspace and
//! project set: one node per target, edges per resolved dependency.
//! Purely structural; no I/O, no caching across calls.

use crate::core::graph::{Graph, GraphNode};
use crate::core::project::Project;
use crate::core::workspace::Workspace;

/// Assembles the dependency graph from the resolved model.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphLoader;

impl GraphLoader {
    /// Create a loader.
    pub fn new() -> Self {
        GraphLoader
    }

    /// Assemble the graph. Idempotent: the same input always produces the
    /// same nodes and edges.
    pub fn load_workspace(&self, workspace: Workspace, projects: Vec<Project>) -> Graph {
        let mut graph = Graph::new(workspace);

        for project in projects {
            graph.add_project(project);
        }

        // Edges are added after every node exists, so cross-project
        // references resolve regardless of project order.
        let edges: Vec<(GraphNode, GraphNode)> = graph
            .targets()
            .flat_map(|(project, target)| {
                let from = GraphNode::target(&project.path, &target.name);
                let mut edges: Vec<(GraphNode, GraphNode)> = target
                    .dependencies
                    .iter()
                    .map(|dependency| (from.clone(), dependency_node(&project.path, dependency)))
                    .collect();
                // A test bundle implicitly depends on the target hosting it.
                if let Some(host) = &target.test_host {
                    edges.push((from, GraphNode::target(&project.path, host)));
                }
                edges
            })
            .collect();

        for (from, to) in edges {
            graph.add_edge(from, to);
        }

        tracing::debug!(
            nodes = graph.len(),
            projects = graph.projects().count(),
            "graph assembled"
        );
        graph
    }
}

fn dependency_node(
    project_path: &std::path::Path,
    dependency: &crate::core::dependency::TargetDependency,
) -> GraphNode {
    use crate::core::dependency::TargetDependency;

    match dependency {
        TargetDependency::Target { name } => GraphNode::target(project_path, name),
        TargetDependency::Project { target, path } => GraphNode::target(path, target),
        TargetDependency::ExternalProduct { product } => GraphNode::external_product(product),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dependency::TargetDependency;
    use crate::core::target::{ProductKind, Target};

    fn workspace() -> Workspace {
        Workspace::new("/ws", "ws")
    }

    #[test]
    fn test_assembles_nodes_and_edges() {
        let projects = vec![
            Project::new("/ws/App", "App").with_target(
                Target::new("App", ProductKind::App)
                    .with_dependency(TargetDependency::project("Lib", "/ws/Lib"))
                    .with_dependency(TargetDependency::external_product("Stream")),
            ),
            Project::new("/ws/Lib", "Lib")
                .with_target(Target::new("Lib", ProductKind::Framework)),
        ];

        let graph = GraphLoader::new().load_workspace(workspace(), projects);

        assert_eq!(graph.len(), 3);
        assert!(graph.contains_edge(
            &GraphNode::target("/ws/App", "App"),
            &GraphNode::target("/ws/Lib", "Lib"),
        ));
        assert!(graph.contains_edge(
            &GraphNode::target("/ws/App", "App"),
            &GraphNode::external_product("Stream"),
        ));
        assert_eq!(graph.external_products(), vec!["Stream"]);
    }

    #[test]
    fn test_test_host_edge_is_implicit() {
        let mut tests = Target::new("AppTests", ProductKind::UnitTests);
        tests.test_host = Some("App".to_string());

        let projects = vec![Project::new("/ws/App", "App")
            .with_target(Target::new("App", ProductKind::App))
            .with_target(tests)];

        let graph = GraphLoader::new().load_workspace(workspace(), projects);
        assert!(graph.contains_edge(
            &GraphNode::target("/ws/App", "AppTests"),
            &GraphNode::target("/ws/App", "App"),
        ));
    }

    #[test]
    fn test_assembly_is_idempotent() {
        let projects = || {
            vec![
                Project::new("/ws/App", "App").with_target(
                    Target::new("App", ProductKind::App)
                        .with_dependency(TargetDependency::project("Lib", "/ws/Lib")),
                ),
                Project::new("/ws/Lib", "Lib")
                    .with_target(Target::new("Lib", ProductKind::Framework)),
            ]
        };

        let first = GraphLoader::new().load_workspace(workspace(), projects());
        let second = GraphLoader::new().load_workspace(workspace(), projects());

        assert_eq!(first.len(), second.len());
        for (project, target) in first.targets() {
            let node = GraphNode::target(&project.path, &target.name);
            assert_eq!(
                first.direct_dependencies(&node),
                second.direct_dependencies(&node)
            );
        }
    }
}
