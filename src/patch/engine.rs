//! Walking a document along a path tree.
//!
//! The walk descends only where a path tree label matches a mapping key, so
//! its depth is bounded by the longest path, not by the document.

use super::error::{PatchError, PatchResult};
use super::path::{Label, LabelPath};
use super::traversal::{Traversal, Visit};
use crate::document::node::{NodeKind, NodeStyle, YamlNode, YamlValue};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Value written to a created leaf before its visit runs.
const PLACEHOLDER: &str = "<no value>";

/// How missing paths are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Visit existing paths only.
    Probe,
    /// Visit existing paths and create the missing ones.
    Patch,
}

/// Walks `node` along `tree`, running each leaf's visit on the node it names.
///
/// Returns the number of visits run. A mapping (or document) under which
/// nothing matched reports `ValueNotFound`. A branch label whose value is not
/// a mapping is `StructuralMismatch`.
///
/// # Examples
///
/// ```
/// use yamlpatch::document::parser::parse_yaml_document;
/// use yamlpatch::patch::{engine::{traverse, Mode}, set};
///
/// let mut doc = parse_yaml_document("metadata:\n  name: web\n").unwrap();
/// let patch = set(["metadata", "namespace"], "prod").unwrap();
///
/// assert!(traverse(&mut doc, &patch, Mode::Probe).is_err());
/// assert_eq!(traverse(&mut doc, &patch, Mode::Patch).unwrap(), 1);
/// assert_eq!(doc.get_path(["metadata", "namespace"]).and_then(|n| n.as_scalar()), Some("prod"));
/// ```
pub fn traverse(node: &mut YamlNode, tree: &Traversal, mode: Mode) -> PatchResult<usize> {
    Walker::new(mode).walk(node, tree)
}

/// Returns the literal found at each path of `tree`.
///
/// Matches keys the way [`traverse`] does without creating anything, and
/// only reads the document.
pub(crate) fn capture(node: &YamlNode, tree: &Traversal) -> PatchResult<HashMap<LabelPath, String>> {
    let mut reader = Reader::default();
    reader.walk(node, tree)?;
    Ok(reader.captured)
}

struct Walker {
    mode: Mode,
    path: Vec<Label>,
}

impl Walker {
    fn new(mode: Mode) -> Self {
        Self {
            mode,
            path: Vec::new(),
        }
    }

    fn current(&self) -> LabelPath {
        LabelPath::from(self.path.as_slice())
    }

    fn walk(&mut self, node: &mut YamlNode, tree: &Traversal) -> PatchResult<usize> {
        let matched = match node.kind() {
            NodeKind::Document => self.walk_document(node, tree)?,
            NodeKind::Mapping => self.walk_mapping(node, tree)?,
            NodeKind::Sequence | NodeKind::Scalar | NodeKind::Alias => 0,
        };

        if matched == 0 {
            return Err(PatchError::value_not_found(self.current()));
        }
        Ok(matched)
    }

    fn walk_document(&mut self, node: &mut YamlNode, tree: &Traversal) -> PatchResult<usize> {
        let YamlValue::Document(children) = &mut node.value else {
            return Ok(0);
        };

        let mut matched = 0;
        for child in children.iter_mut() {
            match self.walk(child, tree) {
                Ok(count) => matched += count,
                Err(err) if err.is_value_not_found() => {
                    trace!(error = %err, "no match in document root");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(matched)
    }

    fn walk_mapping(&mut self, node: &mut YamlNode, tree: &Traversal) -> PatchResult<usize> {
        let YamlValue::Mapping(entries) = &mut node.value else {
            return Ok(0);
        };

        let mut matched = 0;
        let mut processed = vec![false; tree.child_count()];

        for (key, value) in entries.iter_mut() {
            let Some(name) = key.as_scalar() else {
                continue;
            };
            let Some((index, label, child)) = tree.child_full(name) else {
                continue;
            };
            processed[index] = true;

            self.path.push(label.clone());
            let result = self.visit_or_descend(value, child);
            self.path.pop();
            matched += result?;
        }

        if self.mode == Mode::Patch {
            let mut created = false;
            for ((label, child), done) in tree.children().zip(processed) {
                if done {
                    continue;
                }
                self.path.push(label.clone());
                let result = self.synthesize(label, child);
                self.path.pop();

                let (entry, count) = result?;
                entries.push(entry);
                matched += count;
                created = true;
            }
            if created {
                node.metadata.modified = true;
            }
        }

        Ok(matched)
    }

    fn visit_or_descend(&mut self, value: &mut YamlNode, child: &Traversal) -> PatchResult<usize> {
        if let Some(visit) = child.visit() {
            self.run(visit, value)?;
            return Ok(1);
        }
        if !value.is_mapping() {
            return Err(PatchError::structural_mismatch(
                self.current(),
                "mapping",
                value.kind().as_str(),
            ));
        }
        self.walk(value, child)
    }

    fn run(&mut self, visit: &Visit, node: &mut YamlNode) -> PatchResult<()> {
        let path = self.current();
        debug!(path = %path, visit = ?visit, "visiting node");
        visit.run(node, &path)
    }

    /// Builds the entry for a path tree node that had no matching key.
    fn synthesize(&mut self, label: &Label, tree: &Traversal) -> PatchResult<((YamlNode, YamlNode), usize)> {
        debug!(path = %self.current(), "creating missing key");

        let mut key = YamlNode::scalar(label.as_str(), NodeStyle::DoubleQuoted);
        key.set_tag(Some("!!str".to_string()));

        if let Some(visit) = tree.visit() {
            let mut value = YamlNode::scalar(PLACEHOLDER, NodeStyle::Default);
            self.run(visit, &mut value)?;
            return Ok(((key, value), 1));
        }

        let mut entries = Vec::new();
        let mut count = 0;
        for (child_label, child) in tree.children() {
            self.path.push(child_label.clone());
            let result = self.synthesize(child_label, child);
            self.path.pop();

            let (entry, created) = result?;
            entries.push(entry);
            count += created;
        }

        let mut value = YamlNode::new(YamlValue::Mapping(entries));
        value.set_tag(Some("!!map".to_string()));
        Ok(((key, value), count))
    }
}

/// The read-only walk behind [`capture`].
#[derive(Default)]
struct Reader {
    path: Vec<Label>,
    captured: HashMap<LabelPath, String>,
}

impl Reader {
    fn current(&self) -> LabelPath {
        LabelPath::from(self.path.as_slice())
    }

    fn walk(&mut self, node: &YamlNode, tree: &Traversal) -> PatchResult<usize> {
        let matched = match node.value() {
            YamlValue::Document(children) => {
                let mut matched = 0;
                for child in children {
                    match self.walk(child, tree) {
                        Ok(count) => matched += count,
                        Err(err) if err.is_value_not_found() => {
                            trace!(error = %err, "no match in document root");
                        }
                        Err(err) => return Err(err),
                    }
                }
                matched
            }
            YamlValue::Mapping(entries) => self.walk_entries(entries, tree)?,
            _ => 0,
        };

        if matched == 0 {
            return Err(PatchError::value_not_found(self.current()));
        }
        Ok(matched)
    }

    fn walk_entries(&mut self, entries: &[(YamlNode, YamlNode)], tree: &Traversal) -> PatchResult<usize> {
        let mut matched = 0;
        for (key, value) in entries {
            let Some((_, label, child)) = key.as_scalar().and_then(|name| tree.child_full(name)) else {
                continue;
            };

            self.path.push(label.clone());
            let result = self.read(value, child);
            self.path.pop();
            matched += result?;
        }
        Ok(matched)
    }

    fn read(&mut self, value: &YamlNode, child: &Traversal) -> PatchResult<usize> {
        if child.visit().is_some() {
            let path = self.current();
            trace!(path = %path, "capturing literal");
            self.captured.insert(path, value.literal().to_string());
            return Ok(1);
        }
        if !value.is_mapping() {
            return Err(PatchError::structural_mismatch(
                self.current(),
                "mapping",
                value.kind().as_str(),
            ));
        }
        self.walk(value, child)
    }
}
