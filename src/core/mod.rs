//! Core data structures for the resolution engine.
//!
//! This module contains the foundational types:
//! - Raw manifests as returned by the evaluator, and the manifest set
//! - The resolved Project/Target/Dependency model
//! - Settings for the external dependency surface
//! - The assembled graph handed to downstream consumers

pub mod dependency;
pub mod graph;
pub mod manifest;
pub mod project;
pub mod settings;
pub mod target;
pub mod workspace;

pub use dependency::TargetDependency;
pub use graph::{Graph, GraphNode};
pub use manifest::{
    DependencyManifest, ManifestSet, PackageManifest, PluginManifest, ProjectManifest,
    RawManifest, SchemeManifest, TargetManifest, WorkspaceManifest,
};
pub use project::{Project, ProjectOptions};
pub use settings::PackageSettings;
pub use target::{ProductKind, Target};
pub use workspace::{Scheme, Workspace, WorkspaceWithProjects};
