//! Manifest evaluator boundary.
//!
//! The engine consumes manifests through the `ManifestEvaluating` trait and
//! never parses manifest content anywhere else. The default implementation
//! evaluates the TOML manifest files directly; plugin registration extends
//! the helper surface manifests may reference.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;

use crate::core::manifest::RawManifest;
use crate::plugins::Plugins;

/// File name of a workspace manifest.
pub const WORKSPACE_MANIFEST: &str = "Workspace.toml";

/// File name of a project manifest.
pub const PROJECT_MANIFEST: &str = "Project.toml";

/// File name of a package manifest.
pub const PACKAGE_MANIFEST: &str = "Package.toml";

/// File name of a plugin manifest.
pub const PLUGIN_MANIFEST: &str = "Plugin.toml";

/// Error produced when a manifest fails to evaluate.
///
/// Cloneable so the load cache can hand the same failure to every caller
/// awaiting an in-flight load.
#[derive(Debug, Clone, Error)]
pub enum EvaluationError {
    #[error("failed to read manifest `{}`: {message}", .path.display())]
    Read { path: PathBuf, message: String },

    #[error("failed to evaluate manifest `{}`: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("manifest `{}` references unknown plugin helper `{helper}`", .path.display())]
    UnknownHelper { path: PathBuf, helper: String },

    #[error("expected a {expected} manifest at `{}`, found {found}", .path.display())]
    UnexpectedKind {
        path: PathBuf,
        expected: &'static str,
        found: &'static str,
    },

    #[error("invalid project pattern `{pattern}`: {message}")]
    Pattern { pattern: String, message: String },
}

/// Evaluates manifest files into structured values.
///
/// Plugin registration must happen before any workspace or project manifest
/// is evaluated, since manifests may reference plugin-provided helpers.
pub trait ManifestEvaluating: Send + Sync {
    /// Evaluate the manifest at the given file path.
    fn evaluate(&self, path: &Path) -> Result<RawManifest, EvaluationError>;

    /// Register the helper surface of the given plugins. Idempotent:
    /// registering the same plugin twice must not double-register.
    fn register_plugins(&self, plugins: &Plugins) -> Result<(), EvaluationError>;
}

/// The default evaluator: parses the TOML manifest files.
#[derive(Debug, Default)]
pub struct TomlEvaluator {
    /// Names of registered plugins
    registered: Mutex<HashSet<String>>,

    /// Helper names contributed by registered plugins
    helpers: Mutex<HashSet<String>>,
}

impl TomlEvaluator {
    /// Create an evaluator with no registered plugins.
    pub fn new() -> Self {
        TomlEvaluator::default()
    }

    fn read(&self, path: &Path) -> Result<String, EvaluationError> {
        std::fs::read_to_string(path).map_err(|e| EvaluationError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn parse<T: serde::de::DeserializeOwned>(
        &self,
        path: &Path,
        content: &str,
    ) -> Result<T, EvaluationError> {
        toml::from_str(content).map_err(|e| EvaluationError::Parse {
            path: path.to_path_buf(),
            message: e.message().to_string(),
        })
    }

    fn check_helpers(&self, path: &Path, uses: &[String]) -> Result<(), EvaluationError> {
        let helpers = self.helpers.lock().unwrap();
        for helper in uses {
            if !helpers.contains(helper) {
                return Err(EvaluationError::UnknownHelper {
                    path: path.to_path_buf(),
                    helper: helper.clone(),
                });
            }
        }
        Ok(())
    }
}

impl ManifestEvaluating for TomlEvaluator {
    fn evaluate(&self, path: &Path) -> Result<RawManifest, EvaluationError> {
        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        let content = self.read(path)?;

        match file_name {
            WORKSPACE_MANIFEST => Ok(RawManifest::Workspace(self.parse(path, &content)?)),
            PROJECT_MANIFEST => {
                let manifest: crate::core::manifest::ProjectManifest =
                    self.parse(path, &content)?;
                self.check_helpers(path, &manifest.uses)?;
                Ok(RawManifest::Project(manifest))
            }
            PACKAGE_MANIFEST => Ok(RawManifest::Package(self.parse(path, &content)?)),
            PLUGIN_MANIFEST => Ok(RawManifest::Plugin(self.parse(path, &content)?)),
            other => Err(EvaluationError::Parse {
                path: path.to_path_buf(),
                message: format!("`{other}` is not a recognized manifest file"),
            }),
        }
    }

    fn register_plugins(&self, plugins: &Plugins) -> Result<(), EvaluationError> {
        let mut registered = self.registered.lock().unwrap();
        let mut helpers = self.helpers.lock().unwrap();

        for manifest in plugins.manifests() {
            if !registered.insert(manifest.name.clone()) {
                tracing::debug!(plugin = %manifest.name, "plugin already registered");
                continue;
            }
            tracing::debug!(plugin = %manifest.name, "registering plugin helpers");
            helpers.extend(manifest.helpers.iter().cloned());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::manifest::PluginManifest;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_evaluates_workspace_manifest() {
        let tmp = TempDir::new().unwrap();
        let path = write(
            tmp.path(),
            WORKSPACE_MANIFEST,
            r#"
name = "App"
projects = ["App", "Modules/*"]
"#,
        );

        let evaluator = TomlEvaluator::new();
        match evaluator.evaluate(&path).unwrap() {
            RawManifest::Workspace(ws) => {
                assert_eq!(ws.name, "App");
                assert_eq!(ws.projects.len(), 2);
            }
            other => panic!("expected workspace manifest, got {}", other.kind()),
        }
    }

    #[test]
    fn test_malformed_manifest_fails_evaluation() {
        let tmp = TempDir::new().unwrap();
        let path = write(tmp.path(), PROJECT_MANIFEST, "name = ");

        let evaluator = TomlEvaluator::new();
        assert!(matches!(
            evaluator.evaluate(&path),
            Err(EvaluationError::Parse { .. })
        ));
    }

    #[test]
    fn test_unknown_helper_fails_without_plugin() {
        let tmp = TempDir::new().unwrap();
        let path = write(
            tmp.path(),
            PROJECT_MANIFEST,
            r#"
name = "App"
uses = ["signing"]
"#,
        );

        let evaluator = TomlEvaluator::new();
        assert!(matches!(
            evaluator.evaluate(&path),
            Err(EvaluationError::UnknownHelper { .. })
        ));

        let plugins = Plugins::new(vec![PluginManifest {
            name: "signing-plugin".into(),
            description: None,
            helpers: vec!["signing".into()],
        }]);
        evaluator.register_plugins(&plugins).unwrap();
        assert!(evaluator.evaluate(&path).is_ok());
    }

    #[test]
    fn test_plugin_registration_is_idempotent() {
        let evaluator = TomlEvaluator::new();
        let plugins = Plugins::new(vec![PluginManifest {
            name: "signing-plugin".into(),
            description: None,
            helpers: vec!["signing".into()],
        }]);

        evaluator.register_plugins(&plugins).unwrap();
        evaluator.register_plugins(&plugins).unwrap();

        assert_eq!(evaluator.registered.lock().unwrap().len(), 1);
        assert_eq!(evaluator.helpers.lock().unwrap().len(), 1);
    }
}
