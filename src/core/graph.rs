//! The assembled dependency graph.
//!
//! Once loaded, a Graph is read-only: it is the single source of truth
//! handed to generation, linting, and inspection consumers. The edge
//! relation is a DAG by construction; the cycle linter runs before
//! assembly.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

use petgraph::graph::{DiGraph, NodeIndex};

use crate::core::project::Project;
use crate::core::target::Target;
use crate::core::workspace::Workspace;

/// A node of the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GraphNode {
    /// A target of a project in the workspace.
    Target {
        /// Project directory
        project_path: PathBuf,
        /// Target name
        name: String,
    },

    /// An externally resolved product without a backing project.
    ExternalProduct {
        /// Product name
        product: String,
    },
}

impl GraphNode {
    /// Create a target node.
    pub fn target(project_path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        GraphNode::Target {
            project_path: project_path.into(),
            name: name.into(),
        }
    }

    /// Create an external product node.
    pub fn external_product(product: impl Into<String>) -> Self {
        GraphNode::ExternalProduct {
            product: product.into(),
        }
    }
}

impl fmt::Display for GraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphNode::Target { name, .. } => write!(f, "{name}"),
            GraphNode::ExternalProduct { product } => write!(f, "{product}"),
        }
    }
}

/// The assembled, read-only dependency graph.
#[derive(Debug, Clone)]
pub struct Graph {
    /// The workspace root
    workspace: Workspace,

    /// All projects keyed by directory
    projects: BTreeMap<PathBuf, Project>,

    /// Node and edge storage
    graph: DiGraph<GraphNode, ()>,

    /// Map from node to its index
    node_indices: HashMap<GraphNode, NodeIndex>,
}

impl Graph {
    /// Create a graph with no projects.
    pub fn new(workspace: Workspace) -> Self {
        Graph {
            workspace,
            projects: BTreeMap::new(),
            graph: DiGraph::new(),
            node_indices: HashMap::new(),
        }
    }

    /// Add a project and one node per target.
    pub fn add_project(&mut self, project: Project) {
        for target in &project.targets {
            self.add_node(GraphNode::target(&project.path, &target.name));
        }
        self.projects.insert(project.path.clone(), project);
    }

    /// Add a node if not already present.
    pub fn add_node(&mut self, node: GraphNode) -> NodeIndex {
        if let Some(&index) = self.node_indices.get(&node) {
            return index;
        }
        let index = self.graph.add_node(node.clone());
        self.node_indices.insert(node, index);
        index
    }

    /// Add a dependency edge, creating missing endpoints.
    pub fn add_edge(&mut self, from: GraphNode, to: GraphNode) {
        let from = self.add_node(from);
        let to = self.add_node(to);
        if !self.graph.contains_edge(from, to) {
            self.graph.add_edge(from, to, ());
        }
    }

    /// Get the workspace.
    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Iterate over all projects in path order.
    pub fn projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.values()
    }

    /// Get a project by directory.
    pub fn project(&self, path: &Path) -> Option<&Project> {
        self.projects.get(path)
    }

    /// Iterate over every target with its owning project, in path order.
    pub fn targets(&self) -> impl Iterator<Item = (&Project, &Target)> {
        self.projects
            .values()
            .flat_map(|p| p.targets.iter().map(move |t| (p, t)))
    }

    /// Get a target by project directory and name.
    pub fn target(&self, project_path: &Path, name: &str) -> Option<&Target> {
        self.projects.get(project_path)?.target(name)
    }

    /// Check if the graph contains the given node.
    pub fn contains(&self, node: &GraphNode) -> bool {
        self.node_indices.contains_key(node)
    }

    /// Check if the graph contains the given edge.
    pub fn contains_edge(&self, from: &GraphNode, to: &GraphNode) -> bool {
        match (self.node_indices.get(from), self.node_indices.get(to)) {
            (Some(&from), Some(&to)) => self.graph.contains_edge(from, to),
            _ => false,
        }
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Check if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Direct dependencies of a node, sorted.
    pub fn direct_dependencies(&self, node: &GraphNode) -> Vec<GraphNode> {
        let Some(&index) = self.node_indices.get(node) else {
            return Vec::new();
        };
        let mut deps: Vec<GraphNode> = self
            .graph
            .neighbors(index)
            .map(|n| self.graph[n].clone())
            .collect();
        deps.sort();
        deps
    }

    /// Direct target dependencies of a target, resolved to the owning
    /// project and target. External product leaves are skipped.
    pub fn direct_target_dependencies(
        &self,
        project_path: &Path,
        name: &str,
    ) -> Vec<(&Project, &Target)> {
        self.direct_dependencies(&GraphNode::target(project_path, name))
            .into_iter()
            .filter_map(|dep| match dep {
                GraphNode::Target { project_path, name } => {
                    let project = self.projects.get(&project_path)?;
                    let target = project.target(&name)?;
                    Some((project, target))
                }
                GraphNode::ExternalProduct { .. } => None,
            })
            .collect()
    }

    /// All transitive dependencies of a node, sorted.
    pub fn transitive_dependencies(&self, node: &GraphNode) -> BTreeSet<GraphNode> {
        let mut visited = BTreeSet::new();
        let mut stack = vec![node.clone()];
        while let Some(current) = stack.pop() {
            for dep in self.direct_dependencies(&current) {
                if visited.insert(dep.clone()) {
                    stack.push(dep);
                }
            }
        }
        visited.remove(node);
        visited
    }

    /// Names of every external-product leaf node, sorted.
    pub fn external_products(&self) -> Vec<String> {
        let mut products: Vec<String> = self
            .graph
            .node_weights()
            .filter_map(|node| match node {
                GraphNode::ExternalProduct { product } => Some(product.clone()),
                GraphNode::Target { .. } => None,
            })
            .collect();
        products.sort();
        products
    }

    /// Nodes that directly depend on the given node, sorted.
    pub fn dependents(&self, node: &GraphNode) -> Vec<GraphNode> {
        let Some(&index) = self.node_indices.get(node) else {
            return Vec::new();
        };
        let mut deps: Vec<GraphNode> = self
            .graph
            .neighbors_directed(index, petgraph::Direction::Incoming)
            .map(|n| self.graph[n].clone())
            .collect();
        deps.sort();
        deps
    }
}
