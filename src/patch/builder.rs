//! Constructors for patches and conditions.
//!
//! # Example
//!
//! ```
//! use yamlpatch::patch::{and, eq, set};
//!
//! let patch = set(["metadata", "annotations", "argocd.argoproj.io/hook"], "PreSync").unwrap();
//! let when = and([
//!     eq(["kind"], "Pod").unwrap(),
//!     eq(["metadata", "annotations", "helm.sh/hook"], "pre-install,pre-upgrade").unwrap(),
//! ])
//! .unwrap();
//!
//! assert_eq!(patch.leaf_paths().len(), 1);
//! assert_eq!(when.traversal().leaf_paths().len(), 2);
//! ```

use super::condition::{Condition, Predicate};
use super::error::PatchResult;
use super::path::{Label, LabelPath};
use super::traversal::{PatchValue, Traversal, Visit};

/// A patch that sets the value at `path`.
///
/// Strings are written double-quoted (`!!str`), integers plain (`!!int`).
/// Any other value is `UnsupportedValueType`.
pub fn set<P, L, V>(path: P, value: V) -> PatchResult<Traversal>
where
    P: IntoIterator<Item = L>,
    L: Into<Label>,
    V: Into<serde_yaml::Value>,
{
    let value = PatchValue::from_yaml(value.into())?;
    Traversal::from_path(LabelPath::from_labels(path), Visit::Assign(value))
}

/// A condition that holds when the literal at `path` equals `expected`.
pub fn eq<P, L>(path: P, expected: impl Into<String>) -> PatchResult<Condition>
where
    P: IntoIterator<Item = L>,
    L: Into<Label>,
{
    let path = LabelPath::from_labels(path);
    let traversal = Traversal::from_path(path.clone(), Visit::Capture)?;
    Ok(Condition::new(
        traversal,
        Predicate::Eq {
            path,
            expected: expected.into(),
        },
    ))
}

/// A condition that holds when all of `conditions` hold.
pub fn and(conditions: impl IntoIterator<Item = Condition>) -> PatchResult<Condition> {
    combine(conditions, Predicate::All)
}

/// A condition that holds when any of `conditions` holds.
pub fn or(conditions: impl IntoIterator<Item = Condition>) -> PatchResult<Condition> {
    combine(conditions, Predicate::Any)
}

/// Merges two path trees into one.
pub fn merge(mut first: Traversal, second: Traversal) -> PatchResult<Traversal> {
    first.merge(second)?;
    Ok(first)
}

fn combine(
    conditions: impl IntoIterator<Item = Condition>,
    fold: fn(Vec<Predicate>) -> Predicate,
) -> PatchResult<Condition> {
    let mut traversal = Traversal::new();
    let mut predicates = Vec::new();
    for condition in conditions {
        let (tree, predicate) = condition.into_parts();
        traversal.merge(tree)?;
        predicates.push(predicate);
    }
    Ok(Condition::new(traversal, fold(predicates)))
}
