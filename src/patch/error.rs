//! Error types for path-tree construction, traversal and the document codec.

use super::path::LabelPath;
use thiserror::Error;

/// Result type alias for patch operations.
pub type PatchResult<T> = Result<T, PatchError>;

/// Errors that can occur while building, probing or applying a patch.
#[derive(Debug, Error)]
pub enum PatchError {
    /// A path (full or partial) had zero matches in some subtree.
    #[error("value not found for path(s) under {at}")]
    ValueNotFound {
        /// The path-tree position whose subtree matched nothing.
        at: LabelPath,
    },

    /// A path-tree node met a document node of the wrong kind.
    #[error("structural mismatch at {path}: expected {expected}, found {found}")]
    StructuralMismatch {
        /// Where the mismatch happened.
        path: LabelPath,
        /// The node kind the path required.
        expected: &'static str,
        /// The node kind actually present.
        found: &'static str,
    },

    /// `set` was given a value that is neither a string nor an integer.
    #[error("unsupported value type for set: {found} (only strings and integers can be set)")]
    UnsupportedValueType {
        /// The kind of the rejected value.
        found: &'static str,
    },

    /// Two merged path trees disagree about what lives at a path.
    #[error("conflicting paths at {path}: {reason}")]
    ConflictingPaths {
        /// The label path where the trees collide.
        path: LabelPath,
        /// What the collision is.
        reason: &'static str,
    },

    /// A dotted path string could not be parsed.
    #[error("invalid path {input:?}: {reason}")]
    InvalidPath {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The YAML scanner rejected the input.
    #[error("failed to decode YAML: {0}")]
    Decode(#[from] yaml_rust2::scanner::ScanError),

    /// Writing the encoded document failed.
    #[error("failed to encode YAML: {0}")]
    Encode(#[from] std::fmt::Error),
}

impl PatchError {
    /// Create a value-not-found error.
    #[inline]
    pub fn value_not_found(at: LabelPath) -> Self {
        PatchError::ValueNotFound { at }
    }

    /// Create a structural mismatch error.
    #[inline]
    pub fn structural_mismatch(path: LabelPath, expected: &'static str, found: &'static str) -> Self {
        PatchError::StructuralMismatch {
            path,
            expected,
            found,
        }
    }

    /// Create a conflicting paths error.
    #[inline]
    pub fn conflicting_paths(path: LabelPath, reason: &'static str) -> Self {
        PatchError::ConflictingPaths { path, reason }
    }

    /// Create an invalid path error.
    #[inline]
    pub fn invalid_path(input: impl Into<String>, reason: &'static str) -> Self {
        PatchError::InvalidPath {
            input: input.into(),
            reason,
        }
    }

    /// Returns true for the recoverable "nothing matched" signal.
    pub fn is_value_not_found(&self) -> bool {
        matches!(self, PatchError::ValueNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_not_found_display() {
        let err = PatchError::value_not_found(LabelPath::from_labels(["metadata", "annotations"]));
        assert_eq!(
            err.to_string(),
            "value not found for path(s) under metadata.annotations"
        );
        assert!(err.is_value_not_found());
    }

    #[test]
    fn test_structural_mismatch_display() {
        let err = PatchError::structural_mismatch(LabelPath::from_labels(["a"]), "mapping", "sequence");
        assert_eq!(
            err.to_string(),
            "structural mismatch at a: expected mapping, found sequence"
        );
        assert!(!err.is_value_not_found());
    }

    #[test]
    fn test_root_path_display() {
        let err = PatchError::value_not_found(LabelPath::root());
        assert_eq!(err.to_string(), "value not found for path(s) under <root>");
    }
}
