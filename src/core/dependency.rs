//! Resolved dependency edges.
//!
//! A TargetDependency is a directed edge from one target to another target
//! or to an externally resolved product. Direction is always "depends on".

use std::fmt;
use std::path::PathBuf;

/// A resolved dependency edge of a target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TargetDependency {
    /// A target within the same project.
    Target {
        /// Target name
        name: String,
    },

    /// A target in another project of the workspace.
    Project {
        /// Target name inside the referenced project
        target: String,
        /// Absolute path of the referenced project directory
        path: PathBuf,
    },

    /// A product resolved by the external package manager that has no
    /// backing project in the graph (prebuilt artifact).
    ExternalProduct {
        /// Product name
        product: String,
    },
}

impl TargetDependency {
    /// Create a same-project target dependency.
    pub fn target(name: impl Into<String>) -> Self {
        TargetDependency::Target { name: name.into() }
    }

    /// Create a cross-project target dependency.
    pub fn project(target: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        TargetDependency::Project {
            target: target.into(),
            path: path.into(),
        }
    }

    /// Create an external product dependency.
    pub fn external_product(product: impl Into<String>) -> Self {
        TargetDependency::ExternalProduct {
            product: product.into(),
        }
    }

    /// Check if this edge leaves the local project set.
    pub fn is_external(&self) -> bool {
        matches!(self, TargetDependency::ExternalProduct { .. })
    }
}

impl fmt::Display for TargetDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetDependency::Target { name } => write!(f, "{name}"),
            TargetDependency::Project { target, path } => {
                write!(f, "{}:{}", path.display(), target)
            }
            TargetDependency::ExternalProduct { product } => write!(f, "{product}"),
        }
    }
}
