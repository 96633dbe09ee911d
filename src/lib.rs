//! Gantry - the manifest-to-graph resolution engine of a project
//! generation tool.
//!
//! This crate turns a tree of declarative workspace, project, plugin, and
//! package manifests into a single validated, acyclic, in-memory
//! dependency graph. Downstream generators, linters, and inspectors
//! consume the graph; they never touch manifests directly.
//!
//! The entry point is [`ops::ManifestGraphLoader`]:
//!
//! ```no_run
//! use gantry::ops::ManifestGraphLoader;
//! use gantry::mappers::SideEffectExecutor;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let loaded = ManifestGraphLoader::default().load(std::path::Path::new("."))?;
//! SideEffectExecutor::new().execute(&loaded.side_effects)?;
//! for (project, target) in loaded.graph.targets() {
//!     println!("{}: {}", project.name, target.name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod convert;
pub mod core;
pub mod external;
pub mod lint;
pub mod loader;
pub mod manifests;
pub mod mappers;
pub mod ops;
pub mod plugins;
pub mod util;

pub use crate::core::{
    Graph, GraphNode, ManifestSet, PackageSettings, ProductKind, Project, Target,
    TargetDependency, Workspace,
};
pub use crate::ops::{LoadError, LoadedGraph, ManifestGraphLoader};
