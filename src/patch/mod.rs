//! Path-based patching of YAML documents.
//!
//! A patch is a [`Traversal`]: a tree of key paths whose leaves say what to
//! do with the node found there. [`set`] builds one for a single path,
//! [`eq`], [`and`] and [`or`] build [`Condition`]s, and [`apply`] runs a
//! patch on a document when its condition holds. [`apply_str`] does the same
//! for every document of a YAML stream.

pub mod apply;
pub mod builder;
pub mod condition;
pub mod engine;
pub mod error;
pub mod path;
pub mod stream;
pub mod traversal;

pub use apply::{apply, matches, ApplyOutcome};
pub use builder::{and, eq, merge, or, set};
pub use condition::{Condition, Predicate, ProbeOutcome};
pub use engine::{traverse, Mode};
pub use error::{PatchError, PatchResult};
pub use path::{parse_path, Label, LabelPath};
pub use stream::{apply_str, DocumentFailure, PatchOptions, StreamReport};
pub use traversal::{PatchValue, Traversal, Visit, VisitFn};
