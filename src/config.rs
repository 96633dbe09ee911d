//! Tool configuration.
//!
//! `Gantry.toml` at the workspace root configures the tool itself, most
//! importantly the plugin set that must be registered before manifests are
//! evaluated. A missing configuration file is not an error.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::manifests::evaluator::EvaluationError;
use crate::manifests::locator::ManifestFilesLocator;

/// One declared plugin.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PluginDeclaration {
    /// Directory containing the plugin manifest, relative to the root
    pub path: PathBuf,
}

/// Parsed tool configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolConfig {
    /// Declared plugins, in declaration order
    #[serde(default)]
    pub plugins: Vec<PluginDeclaration>,
}

/// Loads the tool configuration of a root directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigLoader {
    locator: ManifestFilesLocator,
}

impl ConfigLoader {
    /// Create a config loader.
    pub fn new() -> Self {
        ConfigLoader {
            locator: ManifestFilesLocator::new(),
        }
    }

    /// Load the configuration at the given root, defaulting when absent.
    pub fn load(&self, root: &Path) -> Result<ToolConfig, EvaluationError> {
        let Some(path) = self.locator.locate_config(root) else {
            tracing::debug!(root = %root.display(), "no tool configuration, using defaults");
            return Ok(ToolConfig::default());
        };

        let content = std::fs::read_to_string(&path).map_err(|e| EvaluationError::Read {
            path: path.clone(),
            message: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| EvaluationError::Parse {
            path,
            message: e.message().to_string(),
        })
    }
}
