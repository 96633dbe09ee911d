//! Graph mappers.
//!
//! Graph mappers run after assembly, transforming the graph and sharing
//! the mapper environment. Later mappers may depend on environment keys
//! written by earlier ones, so application order is the declared order.

use std::hash::{DefaultHasher, Hash, Hasher};

use crate::core::graph::Graph;
use crate::mappers::environment::MapperEnvironment;
use crate::mappers::side_effect::SideEffectDescriptor;
use crate::mappers::MapperError;

/// Environment key under which the graph fingerprint is recorded.
///
/// Downstream cache-key mappers read this; keep the key stable.
pub const FINGERPRINT_KEY: &str = "graph.fingerprint";

/// An ordered transformation of the assembled graph.
pub trait GraphMapping: Send + Sync {
    /// Mapper name, used in pipeline diagnostics.
    fn name(&self) -> &str;

    /// Transform the graph, reading and writing the shared environment.
    fn map(
        &self,
        graph: Graph,
        environment: &mut MapperEnvironment,
    ) -> Result<(Graph, Vec<SideEffectDescriptor>), MapperError>;
}

/// Applies graph mappers strictly in declaration order.
#[derive(Default)]
pub struct SequentialGraphMapper {
    mappers: Vec<Box<dyn GraphMapping>>,
}

impl SequentialGraphMapper {
    /// Create a driver over the given mappers.
    pub fn new(mappers: Vec<Box<dyn GraphMapping>>) -> Self {
        SequentialGraphMapper { mappers }
    }

    /// Run the pipeline against the graph and a fresh environment.
    pub fn map(
        &self,
        graph: Graph,
    ) -> Result<(Graph, Vec<SideEffectDescriptor>, MapperEnvironment), MapperError> {
        self.map_with_environment(graph, MapperEnvironment::new())
    }

    /// Run the pipeline, threading the given environment through every
    /// stage. A failure aborts the run with no partial side-effect list.
    pub fn map_with_environment(
        &self,
        mut graph: Graph,
        mut environment: MapperEnvironment,
    ) -> Result<(Graph, Vec<SideEffectDescriptor>, MapperEnvironment), MapperError> {
        let mut side_effects = Vec::new();

        for mapper in &self.mappers {
            tracing::debug!(mapper = %mapper.name(), "applying graph mapper");
            let (mapped, effects) = mapper.map(graph, &mut environment)?;
            graph = mapped;
            side_effects.extend(effects);
        }

        Ok((graph, side_effects, environment))
    }
}

/// Records the graph fingerprint into the environment.
///
/// The fingerprint hashes every node with its sorted dependency list, so
/// any structural change to the graph changes the recorded value.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphFingerprintMapper;

impl GraphFingerprintMapper {
    /// Create the mapper.
    pub fn new() -> Self {
        GraphFingerprintMapper
    }
}

impl GraphMapping for GraphFingerprintMapper {
    fn name(&self) -> &str {
        "graph-fingerprint"
    }

    fn map(
        &self,
        graph: Graph,
        environment: &mut MapperEnvironment,
    ) -> Result<(Graph, Vec<SideEffectDescriptor>), MapperError> {
        let mut hasher = DefaultHasher::new();
        for (project, target) in graph.targets() {
            project.path.hash(&mut hasher);
            target.name.hash(&mut hasher);
            for dependency in
                graph.direct_dependencies(&crate::core::graph::GraphNode::target(
                    &project.path,
                    &target.name,
                ))
            {
                dependency.hash(&mut hasher);
            }
        }

        let target_count = graph.targets().count();
        environment
            .insert(FINGERPRINT_KEY, format!("{:016x}", hasher.finish()))
            .map_err(|e| MapperError::new(self.name(), e.to_string()))?;
        environment
            .insert("graph.target_count", target_count)
            .map_err(|e| MapperError::new(self.name(), e.to_string()))?;

        Ok((graph, Vec::new()))
    }
}
