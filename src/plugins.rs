//! Plugin resolution.
//!
//! Plugins extend the manifest helper surface, so the declared plugin set
//! must be resolved and registered with the evaluator before any workspace
//! or project manifest is evaluated. Failing to resolve a declared plugin
//! is fatal: manifests may not evaluate without it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use miette::Diagnostic;
use thiserror::Error;

use crate::config::ToolConfig;
use crate::core::manifest::PluginManifest;
use crate::manifests::evaluator::{EvaluationError, PLUGIN_MANIFEST};
use crate::manifests::loader::CachedManifestLoader;

/// Error resolving the declared plugin set.
#[derive(Debug, Error, Diagnostic)]
pub enum PluginError {
    #[error("plugin manifest not found at `{}`", .path.display())]
    #[diagnostic(
        code(gantry::plugins::not_found),
        help("Check the plugin path declared in Gantry.toml")
    )]
    NotFound { path: PathBuf },

    #[error(transparent)]
    Load(#[from] EvaluationError),
}

/// The resolved plugin set.
#[derive(Debug, Clone, Default)]
pub struct Plugins {
    manifests: Vec<PluginManifest>,
}

impl Plugins {
    /// Create a plugin set from resolved manifests.
    pub fn new(manifests: Vec<PluginManifest>) -> Self {
        Plugins { manifests }
    }

    /// The resolved plugin manifests, in declaration order.
    pub fn manifests(&self) -> &[PluginManifest] {
        &self.manifests
    }

    /// Check if no plugins are declared.
    pub fn is_empty(&self) -> bool {
        self.manifests.is_empty()
    }
}

/// Resolves declared plugins to their manifests.
pub struct PluginService {
    loader: Arc<CachedManifestLoader>,
}

impl PluginService {
    /// Create a plugin service.
    pub fn new(loader: Arc<CachedManifestLoader>) -> Self {
        PluginService { loader }
    }

    /// Resolve every plugin declared in the configuration.
    ///
    /// Safe to call more than once for the same root: resolution goes
    /// through the load cache and registration downstream is idempotent.
    pub fn load_plugins(&self, root: &Path, config: &ToolConfig) -> Result<Plugins, PluginError> {
        let mut manifests = Vec::with_capacity(config.plugins.len());

        for declaration in &config.plugins {
            let manifest_path = root.join(&declaration.path).join(PLUGIN_MANIFEST);
            if !manifest_path.is_file() {
                return Err(PluginError::NotFound {
                    path: manifest_path,
                });
            }
            let manifest = self.loader.load_plugin(&manifest_path)?;
            tracing::debug!(plugin = %manifest.name, "resolved plugin");
            manifests.push(manifest);
        }

        Ok(Plugins::new(manifests))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PluginDeclaration;
    use crate::manifests::evaluator::TomlEvaluator;
    use tempfile::TempDir;

    fn service() -> PluginService {
        PluginService::new(Arc::new(CachedManifestLoader::new(Arc::new(
            TomlEvaluator::new(),
        ))))
    }

    #[test]
    fn test_resolves_declared_plugins() {
        let tmp = TempDir::new().unwrap();
        let plugin_dir = tmp.path().join("Plugins/Signing");
        std::fs::create_dir_all(&plugin_dir).unwrap();
        std::fs::write(
            plugin_dir.join(PLUGIN_MANIFEST),
            r#"
name = "signing-plugin"
helpers = ["signing"]
"#,
        )
        .unwrap();

        let config = ToolConfig {
            plugins: vec![PluginDeclaration {
                path: "Plugins/Signing".into(),
            }],
        };

        let plugins = service().load_plugins(tmp.path(), &config).unwrap();
        assert_eq!(plugins.manifests().len(), 1);
        assert_eq!(plugins.manifests()[0].name, "signing-plugin");
    }

    #[test]
    fn test_unresolvable_plugin_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let config = ToolConfig {
            plugins: vec![PluginDeclaration {
                path: "Plugins/Missing".into(),
            }],
        };

        assert!(matches!(
            service().load_plugins(tmp.path(), &config),
            Err(PluginError::NotFound { .. })
        ));
    }
}
