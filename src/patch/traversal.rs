//! The path tree.
//!
//! A [`Traversal`] is a radix tree of [`Label`]s. Every root-to-leaf path
//! names a location in a document, and every leaf carries the [`Visit`] to
//! run on the node found there. Children are kept in insertion order, so
//! keys created for missing paths appear in the order the paths were added.

use super::error::{PatchError, PatchResult};
use super::path::{Label, LabelPath};
use crate::document::node::{NodeKind, NodeStyle, YamlNode};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// A caller-supplied visit.
pub type VisitFn = Arc<dyn Fn(&mut YamlNode) -> PatchResult<()> + Send + Sync>;

/// A scalar assignment, fixed at construction time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchValue {
    text: String,
    tag: &'static str,
    style: NodeStyle,
}

impl PatchValue {
    /// A string value, written double-quoted with tag `!!str`.
    pub fn string(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tag: "!!str",
            style: NodeStyle::DoubleQuoted,
        }
    }

    /// An integer value, written plain with tag `!!int`.
    pub fn integer(value: impl Into<i128>) -> Self {
        Self {
            text: value.into().to_string(),
            tag: "!!int",
            style: NodeStyle::Default,
        }
    }

    /// Converts a YAML value. Only strings and integers are accepted.
    pub fn from_yaml(value: serde_yaml::Value) -> PatchResult<Self> {
        use serde_yaml::Value;

        match value {
            Value::String(s) => Ok(Self::string(s)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Self::integer(i))
                } else if let Some(u) = n.as_u64() {
                    Ok(Self::integer(u))
                } else {
                    Err(PatchError::UnsupportedValueType { found: "float" })
                }
            }
            Value::Null => Err(PatchError::UnsupportedValueType { found: "null" }),
            Value::Bool(_) => Err(PatchError::UnsupportedValueType { found: "bool" }),
            Value::Sequence(_) => Err(PatchError::UnsupportedValueType { found: "sequence" }),
            Value::Mapping(_) => Err(PatchError::UnsupportedValueType { found: "mapping" }),
            Value::Tagged(_) => Err(PatchError::UnsupportedValueType { found: "tagged value" }),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tag(&self) -> &'static str {
        self.tag
    }

    pub fn style(&self) -> NodeStyle {
        self.style
    }

    /// Writes this value into `node`. A mapping is collapsed to a scalar
    /// first; sequences, aliases and documents are left alone.
    pub(crate) fn assign(&self, node: &mut YamlNode, path: &LabelPath) -> PatchResult<()> {
        match node.kind() {
            NodeKind::Scalar => {}
            NodeKind::Mapping => node.collapse_to_scalar(""),
            other => {
                return Err(PatchError::structural_mismatch(
                    path.clone(),
                    "scalar or mapping",
                    other.as_str(),
                ))
            }
        }
        node.assign_scalar(self.text.as_str(), self.tag, self.style);
        Ok(())
    }
}

/// What happens at a leaf of the path tree.
#[derive(Clone)]
pub enum Visit {
    /// Overwrite the node with a scalar.
    Assign(PatchValue),
    /// Record the node's literal text for a condition.
    Capture,
    /// Run a caller-supplied function.
    Custom(VisitFn),
}

impl Visit {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&mut YamlNode) -> PatchResult<()> + Send + Sync + 'static,
    {
        Visit::Custom(Arc::new(f))
    }

    /// Runs the visit. A capture only reads, so it changes nothing here.
    pub(crate) fn run(&self, node: &mut YamlNode, path: &LabelPath) -> PatchResult<()> {
        match self {
            Visit::Assign(value) => value.assign(node, path),
            Visit::Capture => Ok(()),
            Visit::Custom(f) => f(node),
        }
    }
}

impl PartialEq for Visit {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Visit::Assign(a), Visit::Assign(b)) => a == b,
            (Visit::Capture, Visit::Capture) => true,
            (Visit::Custom(a), Visit::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Visit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visit::Assign(value) => f.debug_tuple("Assign").field(value).finish(),
            Visit::Capture => f.write_str("Capture"),
            Visit::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// A tree of labels with visits at its leaves.
///
/// # Examples
///
/// ```
/// use yamlpatch::patch::path::LabelPath;
/// use yamlpatch::patch::traversal::{PatchValue, Traversal, Visit};
///
/// let mut tree = Traversal::new();
/// tree.add(LabelPath::from_labels(["metadata", "name"]), Visit::Assign(PatchValue::string("web")))
///     .unwrap();
/// tree.add(LabelPath::from_labels(["metadata", "namespace"]), Visit::Assign(PatchValue::string("prod")))
///     .unwrap();
///
/// assert_eq!(tree.leaf_paths().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Traversal {
    visit: Option<Visit>,
    children: IndexMap<Label, Traversal>,
}

impl Traversal {
    /// An empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// A single chain from the root to one leaf.
    pub fn from_path(path: LabelPath, visit: Visit) -> PatchResult<Self> {
        if path.is_empty() {
            return Err(PatchError::invalid_path("", "a path needs at least one label"));
        }
        let mut node = Traversal {
            visit: Some(visit),
            children: IndexMap::new(),
        };
        for label in path.into_iter().rev() {
            let mut parent = Traversal::new();
            parent.children.insert(label, node);
            node = parent;
        }
        Ok(node)
    }

    /// Adds one path. Same conflict rules as [`Traversal::merge`].
    pub fn add(&mut self, path: LabelPath, visit: Visit) -> PatchResult<()> {
        self.merge(Traversal::from_path(path, visit)?)
    }

    /// Grafts `other` into this tree.
    ///
    /// A label that is a leaf on one side and a branch on the other, or two
    /// leaves with different visits, is `ConflictingPaths`. On error this
    /// tree is left unchanged.
    pub fn merge(&mut self, other: Traversal) -> PatchResult<()> {
        self.check_merge(&other, &mut Vec::new())?;
        self.graft(other);
        Ok(())
    }

    fn check_merge(&self, other: &Traversal, at: &mut Vec<Label>) -> PatchResult<()> {
        let conflict = |at: &[Label], reason| PatchError::conflicting_paths(LabelPath::from(at), reason);

        match (&self.visit, &other.visit) {
            (Some(mine), Some(theirs)) if mine != theirs => {
                return Err(conflict(at.as_slice(), "two different visits for the same path"))
            }
            (Some(_), None) if !other.children.is_empty() => {
                return Err(conflict(at.as_slice(), "path is both a leaf and a branch"))
            }
            (None, Some(_)) if !self.children.is_empty() => {
                return Err(conflict(at.as_slice(), "path is both a leaf and a branch"))
            }
            _ => {}
        }

        for (label, theirs) in &other.children {
            if let Some(mine) = self.children.get(label) {
                at.push(label.clone());
                mine.check_merge(theirs, at)?;
                at.pop();
            }
        }
        Ok(())
    }

    fn graft(&mut self, other: Traversal) {
        if self.visit.is_none() {
            self.visit = other.visit;
        }
        for (label, theirs) in other.children {
            match self.children.get_mut(&label) {
                Some(mine) => mine.graft(theirs),
                None => {
                    self.children.insert(label, theirs);
                }
            }
        }
    }

    /// True if this node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// True for a tree with no paths at all.
    pub fn is_empty(&self) -> bool {
        self.visit.is_none() && self.children.is_empty()
    }

    pub fn visit(&self) -> Option<&Visit> {
        self.visit.as_ref()
    }

    pub fn child(&self, label: &str) -> Option<&Traversal> {
        self.children.get(label)
    }

    /// Child labels and subtrees in insertion order.
    pub fn children(&self) -> impl Iterator<Item = (&Label, &Traversal)> {
        self.children.iter()
    }

    pub(crate) fn child_full(&self, label: &str) -> Option<(usize, &Label, &Traversal)> {
        self.children.get_full(label)
    }

    pub(crate) fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Every root-to-leaf path, depth first in insertion order.
    pub fn leaf_paths(&self) -> Vec<LabelPath> {
        let mut paths = Vec::new();
        self.collect_paths(&mut Vec::new(), &mut paths);
        paths
    }

    fn collect_paths(&self, prefix: &mut Vec<Label>, paths: &mut Vec<LabelPath>) {
        if self.visit.is_some() {
            paths.push(LabelPath::from(prefix.as_slice()));
        }
        for (label, child) in &self.children {
            prefix.push(label.clone());
            child.collect_paths(prefix, paths);
            prefix.pop();
        }
    }
}

impl fmt::Display for Traversal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let paths: Vec<String> = self.leaf_paths().iter().map(ToString::to_string).collect();
        write!(f, "[{}]", paths.join(", "))
    }
}
