//! File I/O operations for YAML documents.
//!
//! This module loads YAML from disk or stdin, saves emitted YAML back with
//! atomic writes and optional backups, and patches whole files.

pub mod loader;
pub mod saver;

use crate::patch::condition::Condition;
use crate::patch::stream::{apply_str, PatchOptions, StreamReport};
use crate::patch::traversal::Traversal;
use anyhow::{Context, Result};
use std::path::Path;

/// Reads a YAML file and applies `patch` to each of its documents.
///
/// The file itself is not modified; the report's `output` holds the result.
pub fn apply_file<P: AsRef<Path>>(
    path: P,
    patch: &Traversal,
    condition: Option<&Condition>,
    options: &PatchOptions,
) -> Result<StreamReport> {
    let path = path.as_ref();
    let input = loader::read_yaml_file(path)?;
    apply_str(&input, patch, condition, options)
        .with_context(|| format!("Failed to patch {}", path.display()))
}
