//! Package settings loading.

use std::path::Path;
use std::sync::Arc;

use crate::core::project::ProjectOptions;
use crate::core::settings::PackageSettings;
use crate::manifests::evaluator::EvaluationError;
use crate::manifests::loader::CachedManifestLoader;

/// Loads and normalizes package settings from the package manifest.
pub struct PackageSettingsLoader {
    loader: Arc<CachedManifestLoader>,
}

impl PackageSettingsLoader {
    /// Create a settings loader.
    pub fn new(loader: Arc<CachedManifestLoader>) -> Self {
        PackageSettingsLoader { loader }
    }

    /// Load the settings declared by the package manifest at the given path.
    pub fn load(&self, manifest_path: &Path) -> Result<PackageSettings, EvaluationError> {
        let manifest = self.loader.load_package(manifest_path)?;

        Ok(PackageSettings {
            product_types: manifest.product_types,
            product_destinations: manifest.product_destinations,
            base_settings: manifest.base_settings,
            target_settings: manifest.target_settings,
            project_options: manifest
                .project_options
                .into_iter()
                .map(|(name, options)| (name, ProjectOptions::from(options)))
                .collect(),
            include_local_package_test_targets: manifest.include_local_package_test_targets,
            toolchain_version: manifest.toolchain_version,
        })
    }
}
