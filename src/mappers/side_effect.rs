//! Deferred side effects.
//!
//! Mappers never touch the filesystem. They emit declarative descriptors,
//! and the caller applies them in order through the executor after a
//! successful resolution.

use std::fmt;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::util::fs::{ensure_dir, write_string};

/// Whether the described entry should exist after execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideEffectState {
    Present,
    Absent,
}

/// A deferred file instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    /// Absolute path of the file
    pub path: PathBuf,

    /// Contents to write when the state is present
    pub contents: Option<String>,

    /// Desired state
    pub state: SideEffectState,
}

/// A deferred directory instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryDescriptor {
    /// Absolute path of the directory
    pub path: PathBuf,

    /// Desired state
    pub state: SideEffectState,
}

/// A deferred, declarative instruction emitted by a mapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffectDescriptor {
    File(FileDescriptor),
    Directory(DirectoryDescriptor),
}

impl SideEffectDescriptor {
    /// Describe a file to create with the given contents.
    pub fn file(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        SideEffectDescriptor::File(FileDescriptor {
            path: path.into(),
            contents: Some(contents.into()),
            state: SideEffectState::Present,
        })
    }

    /// Describe a file to delete.
    pub fn delete_file(path: impl Into<PathBuf>) -> Self {
        SideEffectDescriptor::File(FileDescriptor {
            path: path.into(),
            contents: None,
            state: SideEffectState::Absent,
        })
    }

    /// Describe a directory to create.
    pub fn directory(path: impl Into<PathBuf>) -> Self {
        SideEffectDescriptor::Directory(DirectoryDescriptor {
            path: path.into(),
            state: SideEffectState::Present,
        })
    }
}

impl fmt::Display for SideEffectDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SideEffectDescriptor::File(file) => match file.state {
                SideEffectState::Present => write!(f, "write file {}", file.path.display()),
                SideEffectState::Absent => write!(f, "delete file {}", file.path.display()),
            },
            SideEffectDescriptor::Directory(dir) => match dir.state {
                SideEffectState::Present => write!(f, "create directory {}", dir.path.display()),
                SideEffectState::Absent => write!(f, "remove directory {}", dir.path.display()),
            },
        }
    }
}

/// Applies side effects in order. Exposed to the caller; the resolution
/// engine itself never runs it.
#[derive(Debug, Clone, Copy, Default)]
pub struct SideEffectExecutor;

impl SideEffectExecutor {
    /// Create an executor.
    pub fn new() -> Self {
        SideEffectExecutor
    }

    /// Apply every descriptor, in order, stopping at the first failure.
    pub fn execute(&self, side_effects: &[SideEffectDescriptor]) -> Result<()> {
        for side_effect in side_effects {
            tracing::debug!("{side_effect}");
            self.apply(side_effect)?;
        }
        Ok(())
    }

    fn apply(&self, side_effect: &SideEffectDescriptor) -> Result<()> {
        match side_effect {
            SideEffectDescriptor::File(file) => match file.state {
                SideEffectState::Present => {
                    write_string(&file.path, file.contents.as_deref().unwrap_or(""))
                }
                SideEffectState::Absent => {
                    if file.path.exists() {
                        std::fs::remove_file(&file.path).with_context(|| {
                            format!("failed to delete file: {}", file.path.display())
                        })?;
                    }
                    Ok(())
                }
            },
            SideEffectDescriptor::Directory(dir) => match dir.state {
                SideEffectState::Present => ensure_dir(&dir.path),
                SideEffectState::Absent => {
                    if dir.path.exists() {
                        std::fs::remove_dir_all(&dir.path).with_context(|| {
                            format!("failed to remove directory: {}", dir.path.display())
                        })?;
                    }
                    Ok(())
                }
            },
        }
    }
}
