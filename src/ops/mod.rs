//! High-level operations.
//!
//! The single operation this engine exposes is the resolution run: turn a
//! manifest tree into a validated graph plus deferred side effects.

pub mod load_graph;

pub use load_graph::{LoadError, LoadedGraph, ManifestGraphLoader};
