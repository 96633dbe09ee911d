//! External dependency resolution.
//!
//! Bridges the package manager's resolved output into the manifest set:
//! settings loading, the resolver boundary, and normalization into
//! synthesized project manifests plus the external product table.

pub mod graph;
pub mod resolver;
pub mod settings;

pub use graph::ExternalDependenciesGraph;
pub use resolver::{
    LockfilePackageResolver, PackageResolveError, PackageResolving,
    RawExternalDependenciesGraph, RawExternalPackage, RawExternalProduct, RawExternalTarget,
    LOCKFILE_NAME,
};
pub use settings::PackageSettingsLoader;
