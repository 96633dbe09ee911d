//! Normalized settings for externally resolved dependencies.

use std::collections::BTreeMap;

use semver::Version;

use crate::core::project::ProjectOptions;
use crate::core::target::ProductKind;

/// Normalized configuration applied to the external dependency surface.
///
/// Immutable value object, produced once per resolution run from the
/// package manifest. The one exception to immutability is the test-target
/// flag, which the engine force-enables for package-only checkouts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSettings {
    /// Product kind overrides keyed by product name
    pub product_types: BTreeMap<String, ProductKind>,

    /// Destination overrides keyed by product name
    pub product_destinations: BTreeMap<String, Vec<String>>,

    /// Base build settings applied to every external target
    pub base_settings: BTreeMap<String, String>,

    /// Per-target build setting overrides
    pub target_settings: BTreeMap<String, BTreeMap<String, String>>,

    /// Project options per generated external project, keyed by package name
    pub project_options: BTreeMap<String, ProjectOptions>,

    /// Include test targets of local packages in the generated surface
    pub include_local_package_test_targets: bool,

    /// Declared external-toolchain version
    pub toolchain_version: Version,
}

impl PackageSettings {
    /// Merged build settings for one external target: base settings
    /// overlaid with the target-specific overrides.
    pub fn settings_for_target(&self, target: &str) -> BTreeMap<String, String> {
        let mut merged = self.base_settings.clone();
        if let Some(overrides) = self.target_settings.get(target) {
            for (key, value) in overrides {
                merged.insert(key.clone(), value.clone());
            }
        }
        merged
    }
}
