//! YAML parsing with style and comment preservation.
//!
//! This module decodes YAML text into `YamlNode` trees using `yaml-rust2`'s
//! marked event parser. Events give structure, scalar styles, tags and source
//! positions; flow vs block collections are read back from the source at the
//! event's position; comments and anchor names come from a separate source
//! scan and are attached to the nodes afterwards.
//!
//! # Example
//!
//! ```
//! use yamlpatch::document::parser::parse_yaml_stream;
//!
//! let stream = parse_yaml_stream("name: first\n---\nname: second\n").unwrap();
//! assert_eq!(stream.len(), 2);
//!
//! let second = &stream.documents()[1];
//! assert_eq!(second.get("name").and_then(|n| n.as_scalar()), Some("second"));
//! ```

use super::comments::SourceScan;
use super::node::{NodeStyle, YamlNode, YamlValue};
use super::stream::YamlStream;
use crate::patch::error::PatchResult;
use std::collections::HashMap;
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser, Tag};
use yaml_rust2::scanner::{Marker, TScalarStyle};

/// The expansion of the `!!` tag handle.
const CORE_TAG_PREFIX: &str = "tag:yaml.org,2002:";

/// Parses every document in a YAML stream.
///
/// # Errors
///
/// Returns `PatchError::Decode` if the input is not valid YAML.
pub fn parse_yaml_stream(source: &str) -> PatchResult<YamlStream> {
    let mut builder = TreeBuilder::new(source);
    let mut parser = Parser::new_from_str(source);
    parser.load(&mut builder, true)?;

    let scan = SourceScan::scan(source, &builder.block_scalar_lines);
    let mut decorations = Decorations::plan(&builder, scan);

    let mut documents = builder.documents;
    let mut next = 0;
    for document in documents.iter_mut() {
        decorations.apply(document, &mut next);
    }
    match documents.last_mut() {
        Some(last) => last.comments.foot = std::mem::take(&mut decorations.foot),
        None => {
            let mut comments: Vec<String> = decorations.head.into_values().flatten().collect();
            comments.append(&mut decorations.foot);
            return Ok(YamlStream::default().with_comments(comments));
        }
    }

    Ok(YamlStream::new(documents))
}

/// Parses a single-document YAML string.
///
/// Returns the first document; an input without documents yields an empty
/// `Document` node.
pub fn parse_yaml_document(source: &str) -> PatchResult<YamlNode> {
    let stream = parse_yaml_stream(source)?;
    Ok(stream
        .into_documents()
        .into_iter()
        .next()
        .unwrap_or_else(|| YamlNode::new(YamlValue::Document(Vec::new()))))
}

struct Frame {
    node: YamlNode,
    pending_key: Option<YamlNode>,
}

/// Assembles nodes from parser events.
///
/// Every node gets an index in event order, which is also the pre-order of
/// the finished tree (mapping keys before their values). Comments, anchor
/// names and alias targets are keyed by that index.
struct TreeBuilder<'s> {
    lines: Vec<&'s str>,
    documents: Vec<YamlNode>,
    stack: Vec<Frame>,
    node_lines: Vec<usize>,
    block_scalar_lines: Vec<usize>,
    anchored: Vec<(usize, usize)>,
    aliases: Vec<(usize, usize)>,
}

impl<'s> TreeBuilder<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            lines: source.lines().collect(),
            documents: Vec::new(),
            stack: Vec::new(),
            node_lines: Vec::new(),
            block_scalar_lines: Vec::new(),
            anchored: Vec::new(),
            aliases: Vec::new(),
        }
    }

    fn start_node(&mut self, value: YamlValue, style: NodeStyle, line: usize) -> YamlNode {
        self.node_lines.push(line);
        YamlNode::decoded(value, style, line)
    }

    fn properties(&mut self, node: &mut YamlNode, index: usize, anchor_id: usize, tag: Option<Tag>) {
        if anchor_id > 0 {
            self.anchored.push((index, anchor_id));
        }
        node.tag = tag.as_ref().map(render_tag);
    }

    fn attach(&mut self, node: YamlNode) {
        let Some(frame) = self.stack.last_mut() else {
            self.documents.push(node);
            return;
        };
        match &mut frame.node.value {
            YamlValue::Mapping(entries) => match frame.pending_key.take() {
                Some(key) => entries.push((key, node)),
                None => frame.pending_key = Some(node),
            },
            YamlValue::Document(children) | YamlValue::Sequence(children) => children.push(node),
            YamlValue::Scalar(_) | YamlValue::Alias(_) => {}
        }
    }

    fn char_at(&self, mark: &Marker) -> Option<char> {
        self.lines
            .get(mark.line().wrapping_sub(1))
            .and_then(|line| line.chars().nth(mark.col()))
    }

    /// Reads the source at a collection's position: `[` or `{` (after any
    /// anchor or tag) means flow style.
    fn collection_style(&self, mark: &Marker) -> NodeStyle {
        let mut col = mark.col();
        for line in self.lines.iter().skip(mark.line().saturating_sub(1)) {
            let mut chars = line.chars().skip(col).peekable();
            col = 0;
            while let Some(c) = chars.next() {
                match c {
                    ' ' | '\t' => {}
                    '&' | '!' => while chars.next_if(|c| !c.is_whitespace()).is_some() {},
                    '#' => break,
                    '[' | '{' => return NodeStyle::Flow,
                    _ => return NodeStyle::Default,
                }
            }
        }
        NodeStyle::Default
    }

    /// The 1-based line holding a block scalar's `|` or `>` indicator.
    ///
    /// The parser marks a block scalar at its first body line, so the header
    /// is normally the nearest non-blank line above the mark.
    fn block_scalar_header(&self, mark: &Marker) -> usize {
        let line = mark.line();
        let above = (1..line)
            .rev()
            .find(|&l| self.lines.get(l - 1).is_some_and(|text| !text.trim().is_empty()));

        match above {
            Some(header) if self.is_block_header(header) => header,
            _ if self.is_block_header(line) => line,
            Some(header) => header,
            None => line,
        }
    }

    /// True if `line` ends (before any comment) with a block scalar indicator
    /// such as `|`, `>-` or `|2+`.
    fn is_block_header(&self, line: usize) -> bool {
        let Some(text) = self.lines.get(line.wrapping_sub(1)) else {
            return false;
        };
        let code = match text.find(" #") {
            Some(pos) => &text[..pos],
            None => text,
        };
        code.split_whitespace().last().is_some_and(|token| {
            let mut chars = token.chars();
            matches!(chars.next(), Some('|' | '>'))
                && chars.all(|c| c.is_ascii_digit() || c == '+' || c == '-')
        })
    }

    fn open_collection(&mut self, value: YamlValue, anchor_id: usize, tag: Option<Tag>, mark: Marker) {
        let index = self.node_lines.len();
        let style = self.collection_style(&mark);
        let mut node = self.start_node(value, style, mark.line());
        self.properties(&mut node, index, anchor_id, tag);
        self.stack.push(Frame {
            node,
            pending_key: None,
        });
    }
}

impl MarkedEventReceiver for TreeBuilder<'_> {
    fn on_event(&mut self, ev: Event, mark: Marker) {
        match ev {
            Event::DocumentStart { .. } => {
                let node = self.start_node(YamlValue::Document(Vec::new()), NodeStyle::Default, mark.line());
                self.stack.push(Frame {
                    node,
                    pending_key: None,
                });
            }
            Event::DocumentEnd { .. } => {
                if let Some(frame) = self.stack.pop() {
                    self.documents.push(frame.node);
                }
            }
            Event::MappingStart(anchor_id, tag) => {
                self.open_collection(YamlValue::Mapping(Vec::new()), anchor_id, tag, mark);
            }
            Event::SequenceStart(anchor_id, tag) => {
                self.open_collection(YamlValue::Sequence(Vec::new()), anchor_id, tag, mark);
            }
            Event::MappingEnd | Event::SequenceEnd => {
                if let Some(frame) = self.stack.pop() {
                    self.attach(frame.node);
                }
            }
            Event::Scalar(value, style, anchor_id, tag) => {
                let style = scalar_style(style);
                let index = self.node_lines.len();

                // Implicit empty values arrive as a plain `~` (or nothing) positioned
                // at the following token; keep them empty and on the previous line.
                let implicit_empty = style == NodeStyle::Default
                    && (value.is_empty() || (value == "~" && self.char_at(&mark) != Some('~')));
                let (value, line) = if implicit_empty {
                    let line = self.node_lines.last().copied().unwrap_or(mark.line());
                    (String::new(), line)
                } else if matches!(style, NodeStyle::Literal | NodeStyle::Folded) {
                    let header = self.block_scalar_header(&mark);
                    self.block_scalar_lines.push(header);
                    (value, header)
                } else {
                    (value, mark.line())
                };

                let mut node = self.start_node(YamlValue::Scalar(value), style, line);
                self.properties(&mut node, index, anchor_id, tag);
                self.attach(node);
            }
            Event::Alias(anchor_id) => {
                let index = self.node_lines.len();
                let node = self.start_node(YamlValue::Alias(String::new()), NodeStyle::Default, mark.line());
                self.aliases.push((index, anchor_id));
                self.attach(node);
            }
            _ => {}
        }
    }
}

fn scalar_style(style: TScalarStyle) -> NodeStyle {
    match style {
        TScalarStyle::SingleQuoted => NodeStyle::SingleQuoted,
        TScalarStyle::DoubleQuoted => NodeStyle::DoubleQuoted,
        TScalarStyle::Literal => NodeStyle::Literal,
        TScalarStyle::Folded => NodeStyle::Folded,
        _ => NodeStyle::Default,
    }
}

fn render_tag(tag: &Tag) -> String {
    if tag.handle == CORE_TAG_PREFIX {
        format!("!!{}", tag.suffix)
    } else if tag.handle.is_empty() {
        format!("!<{}>", tag.suffix)
    } else {
        format!("{}{}", tag.handle, tag.suffix)
    }
}

/// Comments, anchor names and alias targets keyed by node index.
#[derive(Default)]
struct Decorations {
    head: HashMap<usize, Vec<String>>,
    line: HashMap<usize, String>,
    anchors: HashMap<usize, String>,
    aliases: HashMap<usize, String>,
    foot: Vec<String>,
}

impl Decorations {
    fn plan(builder: &TreeBuilder<'_>, scan: SourceScan) -> Self {
        let mut plan = Decorations::default();

        // Node lines are nearly sorted already; a running maximum makes them
        // searchable.
        let lines: Vec<usize> = builder
            .node_lines
            .iter()
            .scan(0, |max, &line| {
                *max = (*max).max(line);
                Some(*max)
            })
            .collect();

        for comment in scan.comments {
            let after = lines.partition_point(|&l| l <= comment.line);
            if comment.full_line {
                // Head of the first node that starts below the comment.
                if after < lines.len() {
                    plan.head.entry(after).or_default().push(comment.text);
                } else {
                    plan.foot.push(comment.text);
                }
            } else if after > 0 {
                // Line comment of the last node that started on or before this line.
                plan.line.insert(after - 1, comment.text);
            } else {
                plan.head.entry(0).or_default().push(comment.text);
            }
        }

        let mut names_by_id = HashMap::new();
        for (position, &(index, anchor_id)) in builder.anchored.iter().enumerate() {
            let name = scan
                .anchors
                .get(position)
                .cloned()
                .unwrap_or_else(|| format!("anchor{}", anchor_id));
            names_by_id.insert(anchor_id, name.clone());
            plan.anchors.insert(index, name);
        }
        for &(index, anchor_id) in &builder.aliases {
            let name = names_by_id
                .get(&anchor_id)
                .cloned()
                .unwrap_or_else(|| format!("anchor{}", anchor_id));
            plan.aliases.insert(index, name);
        }

        plan
    }

    fn apply(&mut self, node: &mut YamlNode, next: &mut usize) {
        let index = *next;
        *next += 1;

        if let Some(head) = self.head.remove(&index) {
            node.comments.head = head;
        }
        if let Some(line) = self.line.remove(&index) {
            node.comments.line = Some(line);
        }
        if let Some(anchor) = self.anchors.remove(&index) {
            node.anchor = Some(anchor);
        }
        if let Some(target) = self.aliases.remove(&index) {
            node.value = YamlValue::Alias(target);
        }

        match &mut node.value {
            YamlValue::Document(children) | YamlValue::Sequence(children) => {
                for child in children {
                    self.apply(child, next);
                }
            }
            YamlValue::Mapping(entries) => {
                for (key, value) in entries {
                    self.apply(key, next);
                    self.apply(value, next);
                }
            }
            YamlValue::Scalar(_) | YamlValue::Alias(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::node::NodeKind;
    use crate::patch::error::PatchError;

    fn root(source: &str) -> YamlNode {
        let doc = parse_yaml_document(source).unwrap();
        match doc.value() {
            YamlValue::Document(children) => children[0].clone(),
            _ => panic!("Expected document"),
        }
    }

    #[test]
    fn test_parse_simple_mapping() {
        let node = root("name: Alice\nage: 30\n");
        assert!(node.is_mapping());
        assert_eq!(node.get("name").and_then(|n| n.as_scalar()), Some("Alice"));
        assert_eq!(node.get("age").map(|n| n.tag()), Some("!!int"));
        assert!(!node.is_modified_deep());
    }

    #[test]
    fn test_parse_scalar_styles() {
        let node = root("a: plain\nb: 'single'\nc: \"double\"\nd: |\n  lit\ne: >\n  fold\n");
        let style = |key: &str| node.get(key).map(|n| n.style());
        assert_eq!(style("a"), Some(NodeStyle::Default));
        assert_eq!(style("b"), Some(NodeStyle::SingleQuoted));
        assert_eq!(style("c"), Some(NodeStyle::DoubleQuoted));
        assert_eq!(style("d"), Some(NodeStyle::Literal));
        assert_eq!(style("e"), Some(NodeStyle::Folded));
        assert_eq!(node.get("d").and_then(|n| n.as_scalar()), Some("lit\n"));
    }

    #[test]
    fn test_parse_flow_and_block_collections() {
        let node = root("block:\n  - a\nflow: [a, b]\nmap: {x: 1}\nnested:\n  k: v\n");
        assert_eq!(node.get("block").map(|n| n.style()), Some(NodeStyle::Default));
        assert_eq!(node.get("flow").map(|n| n.style()), Some(NodeStyle::Flow));
        assert_eq!(node.get("map").map(|n| n.style()), Some(NodeStyle::Flow));
        assert_eq!(node.get("nested").map(|n| n.style()), Some(NodeStyle::Default));
    }

    #[test]
    fn test_parse_quoted_keys() {
        let node = root("\"helm.sh/hook\": pre-install\n");
        if let YamlValue::Mapping(entries) = node.value() {
            assert_eq!(entries[0].0.as_scalar(), Some("helm.sh/hook"));
            assert_eq!(entries[0].0.style(), NodeStyle::DoubleQuoted);
        } else {
            panic!("Expected mapping");
        }
    }

    #[test]
    fn test_parse_empty_value_stays_empty() {
        let node = root("a:\nb: ~\n");
        assert_eq!(node.get("a").and_then(|n| n.as_scalar()), Some(""));
        assert_eq!(node.get("b").and_then(|n| n.as_scalar()), Some("~"));
        assert_eq!(node.get("a").map(|n| n.tag()), Some("!!null"));
    }

    #[test]
    fn test_block_scalar_starts_on_header_line() {
        let node = root("script: |\n  # not a comment\n  echo hi\nnext: 1 # real\n");
        let script = node.get("script").unwrap();
        assert_eq!(script.metadata().line, Some(1));
        assert_eq!(script.as_scalar(), Some("# not a comment\necho hi\n"));
        assert!(script.comments().is_empty());
        assert_eq!(node.get("next").and_then(|n| n.comments().line.as_deref()), Some("# real"));
    }

    #[test]
    fn test_block_header_with_indicators_and_comment() {
        let builder = TreeBuilder::new("a: >-\nb: |2+ # keep\nc: x|\n");
        assert!(builder.is_block_header(1));
        assert!(builder.is_block_header(2));
        assert!(!builder.is_block_header(3));
    }

    #[test]
    fn test_parse_explicit_tags() {
        let node = root("a: !!str 123\nb: !Ref thing\n");
        assert_eq!(node.get("a").and_then(|n| n.explicit_tag()), Some("!!str"));
        assert_eq!(node.get("b").and_then(|n| n.explicit_tag()), Some("!Ref"));
    }

    #[test]
    fn test_parse_anchors_and_aliases() {
        let node = root("base: &defaults\n  timeout: 30\nservice: *defaults\n");
        assert_eq!(node.get("base").and_then(|n| n.anchor()), Some("defaults"));
        let alias = node.get("service").unwrap();
        assert_eq!(alias.kind(), NodeKind::Alias);
        assert_eq!(alias.literal(), "defaults");
    }

    #[test]
    fn test_parse_comments() {
        let source = "# top\nname: Alice # inline\n# before age\nage: 30\n";
        let doc = parse_yaml_document(source).unwrap();
        let node = root(source);
        if let YamlValue::Mapping(entries) = node.value() {
            let (name_key, name_value) = &entries[0];
            let (age_key, _) = &entries[1];
            let top: Vec<&String> = doc
                .comments()
                .head
                .iter()
                .chain(node.comments().head.iter())
                .chain(name_key.comments().head.iter())
                .collect();
            assert_eq!(top, vec!["# top"]);
            assert_eq!(name_value.comments().line.as_deref(), Some("# inline"));
            assert_eq!(age_key.comments().head, vec!["# before age".to_string()]);
        } else {
            panic!("Expected mapping");
        }
    }

    #[test]
    fn test_parse_trailing_comments_become_foot() {
        let stream = parse_yaml_stream("a: 1\n# the end\n").unwrap();
        assert_eq!(stream.documents()[0].comments().foot, vec!["# the end".to_string()]);
    }

    #[test]
    fn test_comment_only_stream_keeps_comments() {
        let stream = parse_yaml_stream("# only comment\n\n# second\n").unwrap();
        assert!(stream.is_empty());
        assert_eq!(stream.comments(), ["# only comment".to_string(), "# second".to_string()]);
    }

    #[test]
    fn test_parse_multi_document() {
        let stream = parse_yaml_stream("---\nname: first\n---\nname: second\n---\nname: third\n").unwrap();
        assert_eq!(stream.len(), 3);
        assert_eq!(
            stream.documents()[2].get("name").and_then(|n| n.as_scalar()),
            Some("third")
        );
    }

    #[test]
    fn test_parse_empty_input() {
        let stream = parse_yaml_stream("").unwrap();
        assert!(stream.is_empty());
    }

    #[test]
    fn test_parse_invalid_yaml() {
        let invalid_cases = vec!["key: \"unterminated", "a: [1, 2", "a: b: c"];

        for invalid in invalid_cases {
            let result = parse_yaml_stream(invalid);
            assert!(
                matches!(result, Err(PatchError::Decode(_))),
                "Expected decode error for: {}",
                invalid
            );
        }
    }
}
