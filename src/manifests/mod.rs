//! Manifest discovery and evaluation.
//!
//! The evaluator turns manifest files into structured values; the cached
//! loader guarantees one evaluation per path per run; the recursive loader
//! closes the manifest set over cross-project references.

pub mod evaluator;
pub mod loader;
pub mod locator;
pub mod recursive;

pub use evaluator::{
    EvaluationError, ManifestEvaluating, TomlEvaluator, PACKAGE_MANIFEST, PLUGIN_MANIFEST,
    PROJECT_MANIFEST, WORKSPACE_MANIFEST,
};
pub use loader::CachedManifestLoader;
pub use locator::{
    ManifestFilesLocator, MissingRootManifest, RootManifest, RootManifestKind, CONFIG_FILE,
};
pub use recursive::RecursiveManifestLoader;
