//! Target definitions - the buildable units of a project.
//!
//! A Target is a single buildable artifact: an app, a framework, a test
//! bundle, and so on. Targets belong to exactly one project and carry the
//! resolved source file set plus the declared dependency edges.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::dependency::TargetDependency;

/// The kind of product a target builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    /// Application
    App,

    /// Dynamic framework
    Framework,

    /// Static library
    #[serde(alias = "static_lib")]
    StaticLibrary,

    /// Dynamic/shared library
    #[serde(alias = "dynamic_lib")]
    DynamicLibrary,

    /// Resource bundle
    Bundle,

    /// Unit test bundle
    #[serde(alias = "tests")]
    UnitTests,

    /// Command line tool
    #[serde(alias = "cli")]
    CommandLineTool,
}

impl Default for ProductKind {
    fn default() -> Self {
        ProductKind::Framework
    }
}

impl ProductKind {
    /// Check if this product is a test bundle.
    pub fn is_tests(&self) -> bool {
        matches!(self, ProductKind::UnitTests)
    }

    /// Check if this product is a resource bundle.
    pub fn is_bundle(&self) -> bool {
        matches!(self, ProductKind::Bundle)
    }

    /// Check if this product is a library (framework, static, or dynamic).
    pub fn is_library(&self) -> bool {
        matches!(
            self,
            ProductKind::Framework | ProductKind::StaticLibrary | ProductKind::DynamicLibrary
        )
    }

    /// Check if this product can be launched directly.
    pub fn is_runnable(&self) -> bool {
        matches!(self, ProductKind::App | ProductKind::CommandLineTool)
    }
}

/// A resolved target within a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Target name, unique within its project
    pub name: String,

    /// What kind of product this target builds
    pub product: ProductKind,

    /// Product name, importable by other targets' sources
    pub product_name: String,

    /// Destinations (platform tags) this target builds for
    pub destinations: Vec<String>,

    /// Resolved source files, sorted
    pub sources: Vec<PathBuf>,

    /// Build settings applied to this target
    pub settings: BTreeMap<String, String>,

    /// Declared dependency edges, direction "depends on"
    pub dependencies: Vec<TargetDependency>,

    /// Host target for test bundles that run inside another target
    pub test_host: Option<String>,
}

impl Target {
    /// Create a new target with the given name and product kind.
    ///
    /// The product name defaults to the target name; set the struct fields
    /// directly for anything more elaborate.
    pub fn new(name: impl Into<String>, product: ProductKind) -> Self {
        let name = name.into();
        Target {
            product_name: name.clone(),
            name,
            product,
            destinations: Vec::new(),
            sources: Vec::new(),
            settings: BTreeMap::new(),
            dependencies: Vec::new(),
            test_host: None,
        }
    }

    /// Set the product name.
    pub fn with_product_name(mut self, product_name: impl Into<String>) -> Self {
        self.product_name = product_name.into();
        self
    }

    /// Add a dependency edge.
    pub fn with_dependency(mut self, dependency: TargetDependency) -> Self {
        self.dependencies.push(dependency);
        self
    }
}
