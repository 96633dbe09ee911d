//! Model mappers.
//!
//! Model mappers run between conversion and graph assembly, transforming
//! the combined workspace/project value and emitting deferred side effects.

use crate::core::workspace::WorkspaceWithProjects;
use crate::mappers::side_effect::SideEffectDescriptor;
use crate::mappers::MapperError;

/// An ordered transformation of the converted model.
pub trait ModelMapping: Send + Sync {
    /// Mapper name, used in pipeline diagnostics.
    fn name(&self) -> &str;

    /// Transform the value, returning the updated value plus the side
    /// effects this stage defers.
    fn map(
        &self,
        value: WorkspaceWithProjects,
    ) -> Result<(WorkspaceWithProjects, Vec<SideEffectDescriptor>), MapperError>;
}

/// Applies model mappers strictly in declaration order.
#[derive(Default)]
pub struct SequentialModelMapper {
    mappers: Vec<Box<dyn ModelMapping>>,
}

impl SequentialModelMapper {
    /// Create a driver over the given mappers.
    pub fn new(mappers: Vec<Box<dyn ModelMapping>>) -> Self {
        SequentialModelMapper { mappers }
    }

    /// Run the pipeline. Each mapper observes the output of the previous
    /// one; a failure aborts the run and no partial side-effect list is
    /// returned.
    pub fn map(
        &self,
        mut value: WorkspaceWithProjects,
    ) -> Result<(WorkspaceWithProjects, Vec<SideEffectDescriptor>), MapperError> {
        let mut side_effects = Vec::new();

        for mapper in &self.mappers {
            tracing::debug!(mapper = %mapper.name(), "applying model mapper");
            let (mapped, effects) = mapper.map(value)?;
            value = mapped;
            side_effects.extend(effects);
        }

        Ok((value, side_effects))
    }
}

/// Emits one derived build-settings file per local project.
///
/// Downstream generators read the derived file instead of recomputing the
/// merged settings per target.
#[derive(Debug, Clone, Copy, Default)]
pub struct DerivedSettingsMapper;

impl DerivedSettingsMapper {
    /// Create the mapper.
    pub fn new() -> Self {
        DerivedSettingsMapper
    }
}

impl ModelMapping for DerivedSettingsMapper {
    fn name(&self) -> &str {
        "derived-settings"
    }

    fn map(
        &self,
        value: WorkspaceWithProjects,
    ) -> Result<(WorkspaceWithProjects, Vec<SideEffectDescriptor>), MapperError> {
        let mut side_effects = Vec::new();

        for project in value.projects.iter().filter(|p| !p.is_external) {
            let settings: std::collections::BTreeMap<&str, _> = project
                .targets
                .iter()
                .map(|t| (t.name.as_str(), &t.settings))
                .collect();
            let contents = serde_json::to_string_pretty(&settings)
                .map_err(|e| MapperError::new(self.name(), e.to_string()))?;

            let derived = project.path.join("Derived");
            side_effects.push(SideEffectDescriptor::directory(&derived));
            side_effects.push(SideEffectDescriptor::file(
                derived.join("BuildSettings.json"),
                contents,
            ));
        }

        Ok((value, side_effects))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::project::Project;
    use crate::core::target::{ProductKind, Target};
    use crate::core::workspace::Workspace;
    use crate::mappers::side_effect::SideEffectState;

    fn model() -> WorkspaceWithProjects {
        WorkspaceWithProjects {
            workspace: Workspace::new("/ws", "ws"),
            projects: vec![
                Project::new("/ws/App", "App").with_target(Target::new("App", ProductKind::App)),
            ],
        }
    }

    /// Mapper that renames the workspace and records a marker file.
    struct TagMapper {
        tag: &'static str,
        fail: bool,
    }

    impl ModelMapping for TagMapper {
        fn name(&self) -> &str {
            self.tag
        }

        fn map(
            &self,
            mut value: WorkspaceWithProjects,
        ) -> Result<(WorkspaceWithProjects, Vec<SideEffectDescriptor>), MapperError> {
            if self.fail {
                return Err(MapperError::new(self.tag, "boom"));
            }
            value.workspace.name = format!("{}-{}", value.workspace.name, self.tag);
            Ok((
                value,
                vec![SideEffectDescriptor::file(format!("/tmp/{}", self.tag), "")],
            ))
        }
    }

    #[test]
    fn test_applies_in_declaration_order() {
        let driver = SequentialModelMapper::new(vec![
            Box::new(TagMapper { tag: "a", fail: false }),
            Box::new(TagMapper { tag: "b", fail: false }),
        ]);

        let (value, effects) = driver.map(model()).unwrap();
        assert_eq!(value.workspace.name, "ws-a-b");

        let paths: Vec<String> = effects
            .iter()
            .map(|e| match e {
                SideEffectDescriptor::File(f) => f.path.display().to_string(),
                SideEffectDescriptor::Directory(d) => d.path.display().to_string(),
            })
            .collect();
        assert_eq!(paths, vec!["/tmp/a", "/tmp/b"]);

        // Reversing declaration order reverses the side-effect order.
        let driver = SequentialModelMapper::new(vec![
            Box::new(TagMapper { tag: "b", fail: false }),
            Box::new(TagMapper { tag: "a", fail: false }),
        ]);
        let (value, effects) = driver.map(model()).unwrap();
        assert_eq!(value.workspace.name, "ws-b-a");
        assert_eq!(effects.len(), 2);
    }

    #[test]
    fn test_failure_aborts_without_partial_side_effects() {
        let driver = SequentialModelMapper::new(vec![
            Box::new(TagMapper { tag: "a", fail: false }),
            Box::new(TagMapper { tag: "b", fail: true }),
            Box::new(TagMapper { tag: "c", fail: false }),
        ]);

        let err = driver.map(model()).unwrap_err();
        assert_eq!(err.mapper, "b");
    }

    #[test]
    fn test_derived_settings_are_emitted_per_local_project() {
        let mut value = model();
        let mut external = Project::new("/ws/.checkouts/Stream", "Stream");
        external.is_external = true;
        value.projects.push(external);

        let (_, effects) = DerivedSettingsMapper::new().map(value).unwrap();
        assert_eq!(effects.len(), 2);
        match &effects[1] {
            SideEffectDescriptor::File(file) => {
                assert_eq!(
                    file.path,
                    std::path::Path::new("/ws/App/Derived/BuildSettings.json")
                );
                assert_eq!(file.state, SideEffectState::Present);
                assert!(file.contents.as_ref().unwrap().contains("App"));
            }
            other => panic!("unexpected side effect: {other}"),
        }
    }
}
