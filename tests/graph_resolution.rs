//! End-to-end resolution tests.
//!
//! These tests drive the full pipeline over real manifest trees in
//! temporary directories: discovery, external resolution, lint, mapper
//! application, and graph assembly.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use gantry::core::graph::GraphNode;
use gantry::lint::{ImportsLinter, InspectImportsError, InspectType, RegexImportsScanner};
use gantry::mappers::{SideEffectDescriptor, SideEffectExecutor, FINGERPRINT_KEY};
use gantry::ops::{LoadError, LoadedGraph, ManifestGraphLoader};

/// Create a workspace directory and canonicalize away tempdir symlinks.
fn workspace_dir() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().canonicalize().unwrap();
    (tmp, root)
}

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn load(root: &Path) -> Result<LoadedGraph, LoadError> {
    ManifestGraphLoader::default().load(root)
}

/// Two projects, App depending on Lib.
fn write_app_and_lib(root: &Path, app_dependencies: &str) {
    write(
        root,
        "Workspace.toml",
        r#"
name = "Demo"
projects = ["App", "Lib"]
"#,
    );
    write(
        root,
        "App/Project.toml",
        &format!(
            r#"
name = "App"

[[targets]]
name = "App"
product = "app"
sources = ["Sources/**/*.sr"]
dependencies = [{app_dependencies}]
"#
        ),
    );
    write(
        root,
        "Lib/Project.toml",
        r#"
name = "Lib"

[[targets]]
name = "Lib"
product = "framework"
sources = ["Sources/**/*.sr"]
"#,
    );
    write(root, "App/Sources/Main.sr", "import Lib\n");
    write(root, "Lib/Sources/Lib.sr", "let lib = 1\n");
}

// ============================================================================
// Basic resolution
// ============================================================================

#[test]
fn test_two_project_workspace_resolves_one_edge() {
    let (_tmp, root) = workspace_dir();
    write_app_and_lib(&root, r#"{ project = "../Lib", target = "Lib" }"#);

    let loaded = load(&root).unwrap();

    assert!(loaded.issues.is_empty());
    assert_eq!(loaded.graph.projects().count(), 2);
    assert!(loaded.graph.contains_edge(
        &GraphNode::target(root.join("App"), "App"),
        &GraphNode::target(root.join("Lib"), "Lib"),
    ));
    assert!(loaded
        .graph
        .direct_dependencies(&GraphNode::target(root.join("Lib"), "Lib"))
        .is_empty());
}

#[test]
fn test_missing_root_manifest_is_fatal() {
    let (_tmp, root) = workspace_dir();

    assert!(matches!(
        load(&root),
        Err(LoadError::MissingRootManifest(_))
    ));
}

#[test]
fn test_bare_project_root_synthesizes_workspace() {
    let (_tmp, root) = workspace_dir();
    write(
        &root,
        "Project.toml",
        r#"
name = "Solo"

[[targets]]
name = "Solo"
product = "cli"
sources = ["Sources"]
"#,
    );
    write(&root, "Sources/Main.sr", "let main = 0\n");

    let loaded = load(&root).unwrap();
    assert_eq!(loaded.graph.workspace().name, "Solo");
    assert_eq!(loaded.graph.targets().count(), 1);
}

#[test]
fn test_resolution_is_deterministic_across_runs() {
    let (_tmp, root) = workspace_dir();
    write_app_and_lib(&root, r#"{ project = "../Lib", target = "Lib" }"#);

    let first = load(&root).unwrap();
    let second = load(&root).unwrap();

    assert_eq!(first.side_effects, second.side_effects);
    assert_eq!(
        first.environment.get::<String>(FINGERPRINT_KEY),
        second.environment.get::<String>(FINGERPRINT_KEY),
    );
}

// ============================================================================
// Lint aborts
// ============================================================================

#[test]
fn test_cycle_fails_with_full_path() {
    let (_tmp, root) = workspace_dir();
    write_app_and_lib(&root, r#"{ project = "../Lib", target = "Lib" }"#);
    // Point Lib back at App to close the cycle.
    write(
        &root,
        "Lib/Project.toml",
        r#"
name = "Lib"

[[targets]]
name = "Lib"
product = "framework"
sources = ["Sources/**/*.sr"]
dependencies = [{ project = "../App", target = "App" }]
"#,
    );

    match load(&root).unwrap_err() {
        LoadError::CircularDependency(cycle) => {
            assert_eq!(cycle.cycle, vec!["App", "Lib", "App"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_structural_errors_aggregate_across_projects() {
    let (_tmp, root) = workspace_dir();
    write_app_and_lib(&root, r#"{ project = "../Lib", target = "Lib" }"#);
    write(
        &root,
        "App/Project.toml",
        r#"
name = "App"

[[targets]]
name = "App"
product = "app"
sources = ["Sources/**/*.sr"]

[[targets]]
name = "App"
product = "framework"
sources = ["Sources/**/*.sr"]
"#,
    );
    write(
        &root,
        "Lib/Project.toml",
        r#"
name = "Lib"

[[targets]]
name = "Lib"
product = "framework"
sources = ["Sources/**/*.sr"]

[[schemes]]
name = "CI"
test_targets = ["Gone"]
"#,
    );

    match load(&root).unwrap_err() {
        LoadError::StructuralLint(lint) => {
            // One aggregate error naming every offender, not just the first.
            let message = lint.to_string();
            assert!(message.contains("`App` more than once"));
            assert!(message.contains("unknown target `Gone`"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_unresolved_external_reference_names_the_target() {
    let (_tmp, root) = workspace_dir();
    write_app_and_lib(&root, r#"{ external = "Nowhere" }"#);

    match load(&root).unwrap_err() {
        LoadError::UnresolvedDependency(unresolved) => {
            assert_eq!(unresolved.target, "App");
            assert_eq!(unresolved.reference, "Nowhere");
        }
        other => panic!("unexpected error: {other}"),
    }
}

// ============================================================================
// External dependencies
// ============================================================================

#[test]
fn test_external_products_splice_into_the_graph() {
    let (_tmp, root) = workspace_dir();
    write_app_and_lib(&root, r#"{ external = "Stream" }"#);
    write(
        &root,
        "Package.toml",
        r#"
name = "Demo"
toolchain_version = "1.0.0"
"#,
    );
    write(
        &root,
        "gantry.lock.json",
        r#"{
            "toolchain_version": "1.0.0",
            "packages": [
                {
                    "name": "Stream",
                    "version": "4.1.0",
                    "path": "checkouts/Stream",
                    "products": [{ "name": "Stream", "targets": ["StreamCore"] }],
                    "targets": [
                        { "name": "StreamCore", "product": "static_library", "sources": ["Sources"] }
                    ]
                }
            ]
        }"#,
    );

    let loaded = load(&root).unwrap();

    let stream = root.join("checkouts/Stream");
    assert!(loaded.graph.project(&stream).unwrap().is_external);
    assert!(loaded.graph.contains_edge(
        &GraphNode::target(root.join("App"), "App"),
        &GraphNode::target(&stream, "StreamCore"),
    ));
}

#[test]
fn test_package_only_checkout_always_includes_local_test_targets() {
    let (_tmp, root) = workspace_dir();
    // No local projects, and the manifest opts test targets out.
    write(
        &root,
        "Package.toml",
        r#"
name = "Stream"
toolchain_version = "1.0.0"
include_local_package_test_targets = false
"#,
    );
    write(
        &root,
        "gantry.lock.json",
        r#"{
            "packages": [
                {
                    "name": "Stream",
                    "version": "4.1.0",
                    "path": ".",
                    "local": true,
                    "products": [{ "name": "Stream", "targets": ["StreamCore"] }],
                    "targets": [
                        { "name": "StreamCore", "product": "static_library", "sources": ["Sources"] },
                        { "name": "StreamCoreTests", "product": "unit_tests", "sources": ["Tests"] }
                    ]
                }
            ]
        }"#,
    );

    let loaded = load(&root).unwrap();

    let names: Vec<&str> = loaded
        .graph
        .targets()
        .map(|(_, target)| target.name.as_str())
        .collect();
    assert!(names.contains(&"StreamCoreTests"));
}

// ============================================================================
// Plugins
// ============================================================================

#[test]
fn test_plugin_helpers_unlock_manifest_evaluation() {
    let (_tmp, root) = workspace_dir();
    write_app_and_lib(&root, r#"{ project = "../Lib", target = "Lib" }"#);
    write(
        &root,
        "App/Project.toml",
        r#"
name = "App"
uses = ["sign"]

[[targets]]
name = "App"
product = "app"
sources = ["Sources/**/*.sr"]
"#,
    );

    // Without the plugin the helper reference fails evaluation.
    assert!(matches!(load(&root), Err(LoadError::Evaluation(_))));

    write(
        &root,
        "Gantry.toml",
        r#"
[[plugins]]
path = "Plugins/Sign"
"#,
    );
    write(
        &root,
        "Plugins/Sign/Plugin.toml",
        r#"
name = "sign-plugin"
helpers = ["sign"]
"#,
    );
    assert!(load(&root).is_ok());
}

// ============================================================================
// Side effects and environment
// ============================================================================

#[test]
fn test_side_effects_are_deferred_until_executed() {
    let (_tmp, root) = workspace_dir();
    write_app_and_lib(&root, r#"{ project = "../Lib", target = "Lib" }"#);

    let loaded = load(&root).unwrap();

    let derived = root.join("App/Derived/BuildSettings.json");
    assert!(loaded.side_effects.iter().any(|effect| matches!(
        effect,
        SideEffectDescriptor::File(file) if file.path == derived
    )));
    // The engine itself performed no I/O.
    assert!(!derived.exists());

    SideEffectExecutor::new()
        .execute(&loaded.side_effects)
        .unwrap();
    assert!(derived.exists());

    assert!(loaded.environment.contains(FINGERPRINT_KEY));
    assert_eq!(
        loaded.environment.get::<usize>("graph.target_count"),
        Some(2)
    );
}

// ============================================================================
// Import drift
// ============================================================================

#[test]
fn test_undeclared_import_is_implicit_only() {
    let (_tmp, root) = workspace_dir();
    // App imports Lib in source but declares no dependencies at all.
    write_app_and_lib(&root, "");

    let loaded = load(&root).unwrap();
    let linter = ImportsLinter::new(Box::new(RegexImportsScanner::new()));

    match linter.lint(&loaded.graph, InspectType::Implicit).unwrap_err() {
        InspectImportsError::ImplicitImportsFound { issues } => {
            assert_eq!(issues.len(), 1);
            assert_eq!(issues[0].target, "App");
            assert!(issues[0].imports.contains("Lib"));
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!(linter.lint(&loaded.graph, InspectType::Redundant).is_ok());
}

#[test]
fn test_declared_and_imported_dependency_is_clean() {
    let (_tmp, root) = workspace_dir();
    write_app_and_lib(&root, r#"{ project = "../Lib", target = "Lib" }"#);

    let loaded = load(&root).unwrap();
    let linter = ImportsLinter::new(Box::new(RegexImportsScanner::new()));

    assert!(linter.lint(&loaded.graph, InspectType::Implicit).is_ok());
    assert!(linter.lint(&loaded.graph, InspectType::Redundant).is_ok());
}
