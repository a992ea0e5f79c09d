//! YAML node representation with style, comment and modification tracking.
//!
//! Every value in a decoded stream is a `YamlNode`: a `YamlValue` plus the
//! presentation details (quoting style, explicit tag, anchor, comments) that
//! must survive a decode/encode round trip when the node is not patched.
//!
//! # Example
//!
//! ```
//! use yamlpatch::document::node::{NodeStyle, YamlNode, YamlValue};
//!
//! let key = YamlNode::scalar("name", NodeStyle::Default);
//! let value = YamlNode::scalar("yamlpatch", NodeStyle::DoubleQuoted);
//! let mapping = YamlNode::new(YamlValue::Mapping(vec![(key, value)]));
//!
//! assert!(mapping.is_mapping());
//! assert_eq!(mapping.get("name").and_then(|n| n.as_scalar()), Some("yamlpatch"));
//! ```

use super::scalar::resolve_plain;
use serde::Serialize;
use std::fmt;

/// The kind of a node, independent of its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeKind {
    Document,
    Mapping,
    Sequence,
    Scalar,
    Alias,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Document => "document",
            NodeKind::Mapping => "mapping",
            NodeKind::Sequence => "sequence",
            NodeKind::Scalar => "scalar",
            NodeKind::Alias => "alias",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a node is presented in YAML text.
///
/// `Default` means plain for scalars and block for collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum NodeStyle {
    #[default]
    Default,
    Flow,
    SingleQuoted,
    DoubleQuoted,
    Literal,
    Folded,
}

/// A YAML value without presentation metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum YamlValue {
    /// A document root; normally holds exactly one node.
    Document(Vec<YamlNode>),
    /// Key/value pairs in source order.
    Mapping(Vec<(YamlNode, YamlNode)>),
    /// Ordered items.
    Sequence(Vec<YamlNode>),
    /// A scalar's literal text.
    Scalar(String),
    /// A reference to an anchored node, by anchor name.
    Alias(String),
}

impl YamlValue {
    pub fn kind(&self) -> NodeKind {
        match self {
            YamlValue::Document(_) => NodeKind::Document,
            YamlValue::Mapping(_) => NodeKind::Mapping,
            YamlValue::Sequence(_) => NodeKind::Sequence,
            YamlValue::Scalar(_) => NodeKind::Scalar,
            YamlValue::Alias(_) => NodeKind::Alias,
        }
    }
}

/// Comments attached to a node, stored verbatim including the leading `#`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Comments {
    /// Full-line comments directly above the node.
    pub head: Vec<String>,
    /// Trailing comment on the node's line.
    pub line: Option<String>,
    /// Comments after the node's content (used on documents).
    pub foot: Vec<String>,
}

impl Comments {
    pub fn is_empty(&self) -> bool {
        self.head.is_empty() && self.line.is_none() && self.foot.is_empty()
    }
}

/// Bookkeeping that is not part of the YAML text.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct NodeMetadata {
    /// 1-based source line the node started on, if it was decoded.
    pub line: Option<usize>,
    /// Whether this node has been modified since it was decoded.
    pub modified: bool,
}

/// A YAML value wrapped with presentation metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YamlNode {
    pub(crate) value: YamlValue,
    pub(crate) style: NodeStyle,
    pub(crate) tag: Option<String>,
    pub(crate) anchor: Option<String>,
    pub(crate) comments: Comments,
    pub(crate) metadata: NodeMetadata,
}

impl YamlNode {
    /// Creates a new node with default style and no tag, anchor or comments.
    ///
    /// The node is marked as modified since it did not come from a decoder.
    pub fn new(value: YamlValue) -> Self {
        Self {
            value,
            style: NodeStyle::Default,
            tag: None,
            anchor: None,
            comments: Comments::default(),
            metadata: NodeMetadata {
                line: None,
                modified: true,
            },
        }
    }

    /// Creates a new scalar node.
    pub fn scalar(value: impl Into<String>, style: NodeStyle) -> Self {
        let mut node = Self::new(YamlValue::Scalar(value.into()));
        node.style = style;
        node
    }

    /// Creates a new empty block mapping.
    pub fn mapping() -> Self {
        Self::new(YamlValue::Mapping(Vec::new()))
    }

    /// Creates a document node holding a single root.
    pub fn document(root: YamlNode) -> Self {
        Self::new(YamlValue::Document(vec![root]))
    }

    /// Used by the decoder: an unmodified node that started on `line`.
    pub(crate) fn decoded(value: YamlValue, style: NodeStyle, line: usize) -> Self {
        Self {
            value,
            style,
            tag: None,
            anchor: None,
            comments: Comments::default(),
            metadata: NodeMetadata {
                line: Some(line),
                modified: false,
            },
        }
    }

    pub fn value(&self) -> &YamlValue {
        &self.value
    }

    /// Returns a mutable reference to the node's value.
    ///
    /// Calling this method marks the node as modified, even if the value is
    /// not actually changed.
    pub fn value_mut(&mut self) -> &mut YamlValue {
        self.metadata.modified = true;
        &mut self.value
    }

    pub fn kind(&self) -> NodeKind {
        self.value.kind()
    }

    pub fn style(&self) -> NodeStyle {
        self.style
    }

    /// The explicit tag written in the source (or assigned by a patch).
    pub fn explicit_tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// The effective tag: the explicit one, or the implicitly resolved one.
    pub fn tag(&self) -> &str {
        match &self.tag {
            Some(tag) => tag,
            None => self.implicit_tag(),
        }
    }

    /// The tag a YAML 1.2 core-schema resolver would assign without an explicit tag.
    pub fn implicit_tag(&self) -> &'static str {
        match &self.value {
            YamlValue::Document(_) => "",
            YamlValue::Mapping(_) => "!!map",
            YamlValue::Sequence(_) => "!!seq",
            YamlValue::Alias(_) => "",
            YamlValue::Scalar(s) => match self.style {
                NodeStyle::Default => resolve_plain(s),
                _ => "!!str",
            },
        }
    }

    pub fn set_tag(&mut self, tag: Option<String>) {
        self.tag = tag;
        self.metadata.modified = true;
    }

    pub fn anchor(&self) -> Option<&str> {
        self.anchor.as_deref()
    }

    pub fn comments(&self) -> &Comments {
        &self.comments
    }

    pub fn metadata(&self) -> &NodeMetadata {
        &self.metadata
    }

    /// Returns whether this node has been modified.
    ///
    /// Only the node itself is tracked; a parent whose child changed is not
    /// marked unless its own entries were added or removed.
    pub fn is_modified(&self) -> bool {
        self.metadata.modified
    }

    /// Returns true if this node or any node below it was modified.
    pub fn is_modified_deep(&self) -> bool {
        if self.metadata.modified {
            return true;
        }
        match &self.value {
            YamlValue::Document(children) | YamlValue::Sequence(children) => {
                children.iter().any(YamlNode::is_modified_deep)
            }
            YamlValue::Mapping(entries) => entries
                .iter()
                .any(|(k, v)| k.is_modified_deep() || v.is_modified_deep()),
            YamlValue::Scalar(_) | YamlValue::Alias(_) => false,
        }
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self.value, YamlValue::Mapping(_))
    }

    /// The scalar text, if this is a scalar.
    pub fn as_scalar(&self) -> Option<&str> {
        match &self.value {
            YamlValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// The node's literal text: scalar value, alias name, or empty for collections.
    pub fn literal(&self) -> &str {
        match &self.value {
            YamlValue::Scalar(s) | YamlValue::Alias(s) => s,
            _ => "",
        }
    }

    /// Looks up a mapping value by scalar key. Documents delegate to their root.
    pub fn get(&self, key: &str) -> Option<&YamlNode> {
        match &self.value {
            YamlValue::Mapping(entries) => entries
                .iter()
                .find(|(k, _)| k.as_scalar() == Some(key))
                .map(|(_, v)| v),
            YamlValue::Document(children) => children.first().and_then(|root| root.get(key)),
            _ => None,
        }
    }

    /// Follows a sequence of mapping keys from this node.
    pub fn get_path<'a, I>(&self, keys: I) -> Option<&YamlNode>
    where
        I: IntoIterator<Item = &'a str>,
    {
        keys.into_iter().try_fold(self, |node, key| node.get(key))
    }

    /// Replaces this node's value with a scalar, discarding any children.
    ///
    /// The explicit tag is cleared so a collection tag such as `!!map` does
    /// not end up on a scalar.
    pub fn collapse_to_scalar(&mut self, value: impl Into<String>) {
        self.value = YamlValue::Scalar(value.into());
        self.style = NodeStyle::Default;
        self.tag = None;
        self.metadata.modified = true;
    }

    /// Sets a scalar's text, tag and style in one step.
    pub fn assign_scalar(&mut self, value: impl Into<String>, tag: &str, style: NodeStyle) {
        self.value = YamlValue::Scalar(value.into());
        self.tag = Some(tag.to_string());
        self.style = style;
        self.metadata.modified = true;
    }
}
