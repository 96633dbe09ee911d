//! Memoized manifest loading.
//!
//! Loading a given manifest path happens at most once per resolution run.
//! The cache serializes concurrent loads of the same key behind a per-key
//! mutex (the first caller evaluates, later callers await its result) while
//! distinct keys load fully in parallel.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::core::manifest::{
    PackageManifest, PluginManifest, ProjectManifest, RawManifest, WorkspaceManifest,
};
use crate::manifests::evaluator::{EvaluationError, ManifestEvaluating};
use crate::util::fs::canonicalize_or_normalize;

type CacheSlot = Arc<Mutex<Option<Result<Arc<RawManifest>, EvaluationError>>>>;

/// A manifest loader that memoizes evaluator results by path.
pub struct CachedManifestLoader {
    evaluator: Arc<dyn ManifestEvaluating>,
    cache: Mutex<HashMap<PathBuf, CacheSlot>>,
}

impl CachedManifestLoader {
    /// Create a loader backed by the given evaluator.
    pub fn new(evaluator: Arc<dyn ManifestEvaluating>) -> Self {
        CachedManifestLoader {
            evaluator,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// The evaluator this loader delegates to.
    pub fn evaluator(&self) -> &Arc<dyn ManifestEvaluating> {
        &self.evaluator
    }

    /// Load the manifest at the given file path, evaluating at most once.
    ///
    /// Repeated loads of the same path return the same `Arc`.
    pub fn load(&self, path: &Path) -> Result<Arc<RawManifest>, EvaluationError> {
        let key = canonicalize_or_normalize(path);

        // Take the per-key slot while holding the map lock only briefly,
        // so loads of distinct keys proceed in parallel.
        let slot = {
            let mut cache = self.cache.lock().unwrap();
            cache.entry(key).or_default().clone()
        };

        let mut guard = slot.lock().unwrap();
        if let Some(cached) = guard.as_ref() {
            return cached.clone();
        }

        tracing::debug!(path = %path.display(), "evaluating manifest");
        let result = self.evaluator.evaluate(path).map(Arc::new);
        *guard = Some(result.clone());
        result
    }

    /// Load a workspace manifest.
    pub fn load_workspace(&self, path: &Path) -> Result<WorkspaceManifest, EvaluationError> {
        match self.load(path)?.as_ref() {
            RawManifest::Workspace(manifest) => Ok(manifest.clone()),
            other => Err(self.unexpected(path, "workspace", other)),
        }
    }

    /// Load a project manifest.
    pub fn load_project(&self, path: &Path) -> Result<ProjectManifest, EvaluationError> {
        match self.load(path)?.as_ref() {
            RawManifest::Project(manifest) => Ok(manifest.clone()),
            other => Err(self.unexpected(path, "project", other)),
        }
    }

    /// Load a plugin manifest.
    pub fn load_plugin(&self, path: &Path) -> Result<PluginManifest, EvaluationError> {
        match self.load(path)?.as_ref() {
            RawManifest::Plugin(manifest) => Ok(manifest.clone()),
            other => Err(self.unexpected(path, "plugin", other)),
        }
    }

    /// Load a package manifest.
    pub fn load_package(&self, path: &Path) -> Result<PackageManifest, EvaluationError> {
        match self.load(path)?.as_ref() {
            RawManifest::Package(manifest) => Ok(manifest.clone()),
            other => Err(self.unexpected(path, "package", other)),
        }
    }

    fn unexpected(
        &self,
        path: &Path,
        expected: &'static str,
        found: &RawManifest,
    ) -> EvaluationError {
        EvaluationError::UnexpectedKind {
            path: path.to_path_buf(),
            expected,
            found: found.kind(),
        }
    }
}
