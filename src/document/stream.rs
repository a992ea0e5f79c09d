//! A decoded multi-document YAML stream.

use super::node::{YamlNode, YamlValue};

/// All documents of a YAML stream, in source order.
///
/// Each entry is a `Document` node holding that document's root.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct YamlStream {
    documents: Vec<YamlNode>,
    comments: Vec<String>,
}

impl YamlStream {
    /// Creates a stream from document nodes.
    ///
    /// Nodes that are not `Document` nodes are wrapped in one.
    pub fn new(documents: Vec<YamlNode>) -> Self {
        let documents = documents
            .into_iter()
            .map(|node| match node.value() {
                YamlValue::Document(_) => node,
                _ => YamlNode::document(node),
            })
            .collect();
        Self {
            documents,
            comments: Vec::new(),
        }
    }

    /// Attaches comments that belong to no document.
    pub fn with_comments(mut self, comments: Vec<String>) -> Self {
        self.comments = comments;
        self
    }

    pub fn documents(&self) -> &[YamlNode] {
        &self.documents
    }

    /// Comments of a stream that has no documents to hold them.
    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    pub fn documents_mut(&mut self) -> &mut [YamlNode] {
        &mut self.documents
    }

    pub fn into_documents(self) -> Vec<YamlNode> {
        self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::node::NodeStyle;

    #[test]
    fn test_bare_roots_are_wrapped_in_documents() {
        let stream = YamlStream::new(vec![YamlNode::scalar("x", NodeStyle::Default)]);
        assert_eq!(stream.len(), 1);
        assert!(matches!(stream.documents()[0].value(), YamlValue::Document(children) if children.len() == 1));
    }

    #[test]
    fn test_documents_are_kept() {
        let doc = YamlNode::document(YamlNode::mapping());
        let stream = YamlStream::new(vec![doc.clone(), doc]);
        assert_eq!(stream.len(), 2);
        assert!(!stream.is_empty());
        assert!(stream.comments().is_empty());
    }

    #[test]
    fn test_stream_comments() {
        let stream = YamlStream::default().with_comments(vec!["# note".to_string()]);
        assert!(stream.is_empty());
        assert_eq!(stream.comments(), ["# note".to_string()]);
    }
}
