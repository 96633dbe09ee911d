//! Resolved workspace model.

use std::path::PathBuf;

use crate::core::project::Project;

/// A scheme of the resolved workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scheme {
    /// Scheme name
    pub name: String,

    /// Targets built by this scheme
    pub build_targets: Vec<String>,

    /// Test targets run by this scheme
    pub test_targets: Vec<String>,
}

/// The resolved workspace: the root grouping of all projects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    /// Workspace root directory
    pub path: PathBuf,

    /// Workspace name
    pub name: String,

    /// Paths of the member projects, sorted
    pub project_paths: Vec<PathBuf>,

    /// Workspace schemes
    pub schemes: Vec<Scheme>,
}

impl Workspace {
    /// Create a workspace with no projects.
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Workspace {
            path: path.into(),
            name: name.into(),
            project_paths: Vec::new(),
            schemes: Vec::new(),
        }
    }
}

/// The combined value the model mapper pipeline transforms.
#[derive(Debug, Clone)]
pub struct WorkspaceWithProjects {
    /// The workspace
    pub workspace: Workspace,

    /// All resolved projects, in manifest-set order
    pub projects: Vec<Project>,
}

impl WorkspaceWithProjects {
    /// Get a project by path.
    pub fn project(&self, path: &std::path::Path) -> Option<&Project> {
        self.projects.iter().find(|p| p.path == path)
    }
}
