//! Resolved project model.
//!
//! A Project owns its targets after conversion. External packages are
//! converted to projects too, flagged so read-only passes can distinguish
//! the local surface from the resolved one.

use std::path::PathBuf;

use crate::core::manifest::ProjectOptionsManifest;
use crate::core::target::Target;

/// Options of a resolved project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectOptions {
    /// Generate schemes automatically for each target
    pub automatic_schemes: bool,

    /// Development region identifier
    pub development_region: Option<String>,
}

impl Default for ProjectOptions {
    fn default() -> Self {
        ProjectOptions {
            automatic_schemes: true,
            development_region: None,
        }
    }
}

impl From<ProjectOptionsManifest> for ProjectOptions {
    fn from(manifest: ProjectOptionsManifest) -> Self {
        ProjectOptions {
            automatic_schemes: manifest.automatic_schemes,
            development_region: manifest.development_region,
        }
    }
}

impl From<&ProjectOptions> for ProjectOptionsManifest {
    fn from(options: &ProjectOptions) -> Self {
        ProjectOptionsManifest {
            automatic_schemes: options.automatic_schemes,
            development_region: options.development_region.clone(),
        }
    }
}

/// A resolved project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    /// Absolute path of the project directory
    pub path: PathBuf,

    /// Project name
    pub name: String,

    /// Project options
    pub options: ProjectOptions,

    /// Targets in declaration order
    pub targets: Vec<Target>,

    /// Whether this project was synthesized from an external package
    pub is_external: bool,
}

impl Project {
    /// Create an empty local project.
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Project {
            path: path.into(),
            name: name.into(),
            options: ProjectOptions::default(),
            targets: Vec::new(),
            is_external: false,
        }
    }

    /// Add a target.
    pub fn with_target(mut self, target: Target) -> Self {
        self.targets.push(target);
        self
    }

    /// Get a target by name.
    pub fn target(&self, name: &str) -> Option<&Target> {
        self.targets.iter().find(|t| t.name == name)
    }
}
