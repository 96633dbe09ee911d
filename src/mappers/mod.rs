//! The mapper pipeline.
//!
//! Mappers are ordered transformations applied after conversion: model
//! mappers over the combined workspace/project value, then graph mappers
//! over the assembled graph plus a shared environment. Application is
//! strictly sequential in declaration order; each mapper observes the
//! output of the previous one, and a failure aborts the whole pipeline
//! with no partial side-effect list.

pub mod environment;
pub mod graph;
pub mod model;
pub mod side_effect;

use thiserror::Error;

pub use environment::MapperEnvironment;
pub use graph::{GraphFingerprintMapper, GraphMapping, SequentialGraphMapper, FINGERPRINT_KEY};
pub use model::{DerivedSettingsMapper, ModelMapping, SequentialModelMapper};
pub use side_effect::{
    DirectoryDescriptor, FileDescriptor, SideEffectDescriptor, SideEffectExecutor, SideEffectState,
};

/// A mapper failed; the pipeline run it belonged to is aborted.
#[derive(Debug, Clone, Error)]
#[error("mapper `{mapper}` failed: {message}")]
pub struct MapperError {
    /// Name of the failing mapper
    pub mapper: String,

    /// What went wrong
    pub message: String,
}

impl MapperError {
    /// Create a mapper error.
    pub fn new(mapper: impl Into<String>, message: impl Into<String>) -> Self {
        MapperError {
            mapper: mapper.into(),
            message: message.into(),
        }
    }
}
