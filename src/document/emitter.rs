//! YAML text generation from `YamlNode` trees.
//!
//! The emitter writes block mappings and block sequences (sequences under a
//! mapping key are indentless), keeps flow collections on one line, and
//! renders scalars in their recorded style when that style can hold the
//! value. Comments and anchors are written back where the decoder found them.

use super::node::{NodeStyle, YamlNode, YamlValue};
use super::scalar::{is_plain_safe, resolve_plain};
use super::stream::YamlStream;
use crate::patch::error::PatchResult;
use std::fmt::{self, Write};

/// Formatting options for emitted YAML.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmitOptions {
    /// Spaces per nesting level.
    pub indent: usize,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self { indent: 2 }
    }
}

impl EmitOptions {
    /// Creates options with the given indent, clamped to 2..=8.
    pub fn with_indent(indent: usize) -> Self {
        Self {
            indent: indent.clamp(2, 8),
        }
    }
}

/// Emits every document of a stream, separated by `---` lines.
pub fn emit_stream(stream: &YamlStream, options: &EmitOptions) -> PatchResult<String> {
    if stream.is_empty() {
        let mut emitter = Emitter::new(options);
        emitter.head_comments(stream.comments(), 0)?;
        return Ok(emitter.out);
    }
    emit_documents(stream.documents(), options)
}

/// Emits a list of documents, separated by `---` lines.
pub fn emit_documents(documents: &[YamlNode], options: &EmitOptions) -> PatchResult<String> {
    let mut emitter = Emitter::new(options);
    for (index, document) in documents.iter().enumerate() {
        emitter.document(document, index)?;
    }
    Ok(emitter.out)
}

/// Emits a single document (or a bare node as a document).
pub fn emit_document(document: &YamlNode, options: &EmitOptions) -> PatchResult<String> {
    emit_documents(std::slice::from_ref(document), options)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Root,
    Value,
    Item,
}

struct Emitter {
    out: String,
    step: usize,
}

impl Emitter {
    fn new(options: &EmitOptions) -> Self {
        Self {
            out: String::new(),
            step: options.indent.clamp(2, 8),
        }
    }

    fn pad(&mut self, width: usize) {
        self.out.extend(std::iter::repeat(' ').take(width));
    }

    fn head_comments(&mut self, comments: &[String], indent: usize) -> fmt::Result {
        for comment in comments {
            self.pad(indent);
            writeln!(self.out, "{}", comment)?;
        }
        Ok(())
    }

    fn end_line(&mut self, comment: Option<&str>) -> fmt::Result {
        match comment {
            Some(comment) => writeln!(self.out, " {}", comment),
            None => writeln!(self.out),
        }
    }

    fn document(&mut self, document: &YamlNode, index: usize) -> fmt::Result {
        let (roots, comments) = match document.value() {
            YamlValue::Document(children) => (children.as_slice(), Some(document.comments())),
            _ => (std::slice::from_ref(document), None),
        };

        if let Some(comments) = comments {
            self.head_comments(&comments.head, 0)?;
        }
        if index > 0 {
            self.out.push_str("---");
            self.end_line(comments.and_then(|c| c.line.as_deref()))?;
        } else if let Some(line) = comments.and_then(|c| c.line.as_deref()) {
            writeln!(self.out, "{}", line)?;
        }

        for root in roots {
            self.head_comments(&root.comments().head, 0)?;
            self.block_value(root, 0, Position::Root, None)?;
        }

        if let Some(comments) = comments {
            self.head_comments(&comments.foot, 0)?;
        }
        Ok(())
    }

    /// Writes `node` after whatever prefix the caller wrote (`key:`, `-`, or
    /// nothing at the root), through the end of its last line.
    fn block_value(
        &mut self,
        node: &YamlNode,
        indent: usize,
        position: Position,
        extra_comment: Option<&str>,
    ) -> fmt::Result {
        let lead = if position == Position::Root { "" } else { " " };
        let comment = node.comments().line.as_deref().or(extra_comment);

        match node.value() {
            YamlValue::Mapping(entries) if is_block_collection(node) => {
                let child = match position {
                    Position::Root => 0,
                    Position::Value | Position::Item => indent + self.step,
                };
                if position == Position::Item && inline_first(node).is_some() {
                    self.pad(self.step - 1);
                    return self.entries(entries, child, true);
                }
                self.open_block(lead, &props(node, "!!map"), comment, position)?;
                if position == Position::Value {
                    self.head_comments(&node.comments().head, child)?;
                }
                self.entries(entries, child, false)
            }
            YamlValue::Sequence(items) if is_block_collection(node) => {
                let child = match position {
                    Position::Root | Position::Value => indent,
                    Position::Item => indent + self.step,
                };
                self.open_block(lead, &props(node, "!!seq"), comment, position)?;
                if position == Position::Value {
                    self.head_comments(&node.comments().head, child)?;
                }
                self.items(items, child)
            }
            YamlValue::Scalar(value) if block_scalar_fits(node, value) => {
                let (body_indent, indicator) = match position {
                    Position::Root => (self.step, self.step + 1),
                    Position::Value | Position::Item => (indent + self.step, self.step),
                };
                self.out.push_str(lead);
                self.block_scalar(node, value, body_indent, indicator, comment)
            }
            _ => {
                let text = inline(node, false);
                if !text.is_empty() {
                    self.out.push_str(lead);
                    self.out.push_str(&text);
                }
                self.end_line(gather_line_comment(node).or(extra_comment))
            }
        }
    }

    fn open_block(
        &mut self,
        lead: &str,
        props: &str,
        comment: Option<&str>,
        position: Position,
    ) -> fmt::Result {
        if position == Position::Root && props.is_empty() {
            if let Some(comment) = comment {
                writeln!(self.out, "{}", comment)?;
            }
            return Ok(());
        }
        if !props.is_empty() {
            self.out.push_str(lead);
            self.out.push_str(props);
        }
        self.end_line(comment)
    }

    fn lead_comments(&mut self, key: &YamlNode, value: &YamlNode, indent: usize) -> fmt::Result {
        self.head_comments(&key.comments().head, indent)?;
        if !is_block_collection(value) {
            self.head_comments(&value.comments().head, indent)?;
        }
        Ok(())
    }

    fn entries(&mut self, entries: &[(YamlNode, YamlNode)], indent: usize, first_inline: bool) -> fmt::Result {
        for (i, (key, value)) in entries.iter().enumerate() {
            if !(first_inline && i == 0) {
                self.lead_comments(key, value, indent)?;
                self.pad(indent);
            }
            self.out.push_str(&key_text(key));
            self.out.push(':');
            self.block_value(value, indent, Position::Value, key.comments().line.as_deref())?;
        }
        Ok(())
    }

    fn items(&mut self, items: &[YamlNode], indent: usize) -> fmt::Result {
        for item in items {
            self.head_comments(&item.comments().head, indent)?;
            if let Some((key, value)) = inline_first(item) {
                self.lead_comments(key, value, indent)?;
            }
            self.pad(indent);
            self.out.push('-');
            self.block_value(item, indent, Position::Item, None)?;
        }
        Ok(())
    }

    fn block_scalar(
        &mut self,
        node: &YamlNode,
        value: &str,
        body_indent: usize,
        indicator: usize,
        comment: Option<&str>,
    ) -> fmt::Result {
        let folded = node.style() == NodeStyle::Folded && !has_more_indented_line(value);

        let (body, chomp) = if value == "\n" || value.ends_with("\n\n") {
            (&value[..value.len() - 1], "+")
        } else if let Some(body) = value.strip_suffix('\n') {
            (body, "")
        } else {
            (value, "-")
        };

        let props = props(node, "!!str");
        if !props.is_empty() {
            write!(self.out, "{} ", props)?;
        }
        self.out.push(if folded { '>' } else { '|' });
        if needs_indentation_indicator(body) {
            write!(self.out, "{}", indicator)?;
        }
        self.out.push_str(chomp);
        self.end_line(comment)?;

        let segments: Vec<&str> = body.split('\n').collect();
        for (i, segment) in segments.iter().enumerate() {
            if segment.is_empty() {
                self.out.push('\n');
            } else {
                self.pad(body_indent);
                writeln!(self.out, "{}", segment)?;
                // A single line break between folded lines reads back as a space.
                if folded && segments[i + 1..].iter().any(|s| !s.is_empty()) {
                    self.out.push('\n');
                }
            }
        }
        Ok(())
    }
}

fn is_block_collection(node: &YamlNode) -> bool {
    if node.style() == NodeStyle::Flow {
        return false;
    }
    match node.value() {
        YamlValue::Mapping(entries) => !entries.is_empty(),
        YamlValue::Sequence(items) => !items.is_empty(),
        _ => false,
    }
}

/// The entry written on a sequence item's dash line, if the item is a plain
/// block mapping.
fn inline_first(node: &YamlNode) -> Option<&(YamlNode, YamlNode)> {
    if !is_block_collection(node) || node.comments().line.is_some() || !props(node, "!!map").is_empty() {
        return None;
    }
    match node.value() {
        YamlValue::Mapping(entries) => entries.first(),
        _ => None,
    }
}

fn block_scalar_fits(node: &YamlNode, value: &str) -> bool {
    matches!(node.style(), NodeStyle::Literal | NodeStyle::Folded)
        && !value.chars().any(|c| c.is_control() && c != '\n' && c != '\t')
        && !value.contains("\r")
}

fn has_more_indented_line(value: &str) -> bool {
    value.split('\n').any(|line| line.starts_with([' ', '\t']))
}

fn needs_indentation_indicator(body: &str) -> bool {
    body.split('\n')
        .find(|line| !line.is_empty())
        .is_some_and(|line| line.starts_with(' '))
}

fn gather_line_comment(node: &YamlNode) -> Option<&str> {
    if let Some(line) = node.comments().line.as_deref() {
        return Some(line);
    }
    match node.value() {
        YamlValue::Document(children) | YamlValue::Sequence(children) => {
            children.iter().find_map(gather_line_comment)
        }
        YamlValue::Mapping(entries) => entries
            .iter()
            .find_map(|(k, v)| gather_line_comment(v).or_else(|| gather_line_comment(k))),
        YamlValue::Scalar(_) | YamlValue::Alias(_) => None,
    }
}

fn key_text(key: &YamlNode) -> String {
    match key.value() {
        YamlValue::Alias(name) => format!("*{} ", name),
        _ => {
            let text = inline(key, false);
            if text.is_empty() {
                "~".to_string()
            } else {
                text
            }
        }
    }
}

/// Renders a node on a single line. `flow` is true inside `[...]`/`{...}`.
fn inline(node: &YamlNode, flow: bool) -> String {
    match node.value() {
        YamlValue::Scalar(value) => {
            let (text, implicit) = scalar_text(node, value, flow);
            join(props(node, implicit), text)
        }
        YamlValue::Alias(name) => format!("*{}", name),
        YamlValue::Mapping(entries) => {
            let body: Vec<String> = entries
                .iter()
                .map(|(key, value)| {
                    let key = match key.value() {
                        YamlValue::Alias(name) => format!("*{} ", name),
                        _ => inline(key, true),
                    };
                    format!("{}: {}", key, inline(value, true))
                })
                .collect();
            join(props(node, "!!map"), format!("{{{}}}", body.join(", ")))
        }
        YamlValue::Sequence(items) => {
            let body: Vec<String> = items.iter().map(|item| inline(item, true)).collect();
            join(props(node, "!!seq"), format!("[{}]", body.join(", ")))
        }
        YamlValue::Document(children) => children
            .first()
            .map(|root| inline(root, flow))
            .unwrap_or_default(),
    }
}

/// Scalar text in the node's style where possible, with the tag a reader
/// will resolve it to.
fn scalar_text(node: &YamlNode, value: &str, flow: bool) -> (String, &'static str) {
    match node.style() {
        NodeStyle::SingleQuoted if !value.chars().any(char::is_control) => {
            (format!("'{}'", value.replace('\'', "''")), "!!str")
        }
        NodeStyle::Default | NodeStyle::Flow if value.is_empty() => {
            match node.explicit_tag() {
                Some(tag) if flow && tag != "!!null" => ("\"\"".to_string(), "!!str"),
                _ if flow => ("~".to_string(), "!!null"),
                _ => (String::new(), "!!null"),
            }
        }
        NodeStyle::Default | NodeStyle::Flow if is_plain_safe(value, flow) => {
            (value.to_string(), resolve_plain(value))
        }
        _ => (double_quote(value), "!!str"),
    }
}

fn double_quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            c if c.is_control() => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Anchor and explicit tag, omitting a tag the reader would infer anyway.
fn props(node: &YamlNode, implicit: &str) -> String {
    let mut parts = Vec::new();
    if let Some(anchor) = node.anchor() {
        parts.push(format!("&{}", anchor));
    }
    if let Some(tag) = node.explicit_tag() {
        if tag != implicit {
            parts.push(render_tag(tag));
        }
    }
    parts.join(" ")
}

fn render_tag(tag: &str) -> String {
    if tag.starts_with('!') {
        tag.to_string()
    } else {
        format!("!<{}>", tag)
    }
}

fn join(props: String, text: String) -> String {
    match (props.is_empty(), text.is_empty()) {
        (true, _) => text,
        (false, true) => props,
        (false, false) => format!("{} {}", props, text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parser::parse_yaml_stream;

    fn roundtrip(source: &str) -> String {
        let stream = parse_yaml_stream(source).unwrap();
        emit_stream(&stream, &EmitOptions::default()).unwrap()
    }

    #[test]
    fn test_simple_mapping_roundtrip() {
        let source = "name: Alice\nage: 30\nactive: true\n";
        assert_eq!(roundtrip(source), source);
    }

    #[test]
    fn test_nested_mapping_roundtrip() {
        let source = "metadata:\n  name: app\n  labels:\n    tier: web\n";
        assert_eq!(roundtrip(source), source);
    }

    #[test]
    fn test_sequences_under_keys_are_indentless() {
        let source = "spec:\n  containers:\n    - name: web\n      image: nginx\n";
        let expected = "spec:\n  containers:\n  - name: web\n    image: nginx\n";
        assert_eq!(roundtrip(source), expected);
    }

    #[test]
    fn test_quoting_styles_preserved() {
        let source = "a: 'single'\nb: \"double\"\nc: 'it''s'\nd: \"tab\\there\"\n";
        assert_eq!(roundtrip(source), source);
    }

    #[test]
    fn test_flow_collections_stay_inline() {
        let source = "command: [\"/tools/db-migrate\"]\nports: {http: 80, https: 443}\nempty: []\nnone: {}\n";
        assert_eq!(roundtrip(source), source);
    }

    #[test]
    fn test_block_scalars_roundtrip() {
        let source = "script: |\n  echo one\n  echo two\nstrip: |-\n  no newline\nfolded: >\n  one\n  two\n";
        let stream = parse_yaml_stream(source).unwrap();
        let out = emit_stream(&stream, &EmitOptions::default()).unwrap();
        let reparsed = parse_yaml_stream(&out).unwrap();
        let root = &reparsed.documents()[0];
        assert_eq!(root.get("script").and_then(|n| n.as_scalar()), Some("echo one\necho two\n"));
        assert_eq!(root.get("strip").and_then(|n| n.as_scalar()), Some("no newline"));
        assert_eq!(root.get("folded").and_then(|n| n.as_scalar()), Some("one two\n"));
        assert!(out.starts_with("script: |\n  echo one\n"));
    }

    #[test]
    fn test_comments_roundtrip() {
        let source = "# top\nname: Alice # who\n# before age\nage: 30\n";
        assert_eq!(roundtrip(source), source);
    }

    #[test]
    fn test_comment_in_sequence_item() {
        let source = "items:\n# first\n- a\n- b # second\n";
        assert_eq!(roundtrip(source), source);
    }

    #[test]
    fn test_anchors_and_aliases_roundtrip() {
        let source = "base: &defaults\n  timeout: 30\nservice: *defaults\n";
        assert_eq!(roundtrip(source), source);
    }

    #[test]
    fn test_explicit_tags_roundtrip() {
        let source = "a: !!str 123\nb: !Ref thing\n";
        assert_eq!(roundtrip(source), source);
    }

    #[test]
    fn test_empty_values_roundtrip() {
        let source = "a:\nb: ~\nc: null\n";
        assert_eq!(roundtrip(source), source);
    }

    #[test]
    fn test_multi_document_separators() {
        let source = "a: 1\n---\nb: 2\n---\nc: 3\n";
        assert_eq!(roundtrip(source), source);
    }

    #[test]
    fn test_wider_indent() {
        let stream = parse_yaml_stream("a:\n  b:\n  - x: 1\n    y: 2\n").unwrap();
        let out = emit_stream(&stream, &EmitOptions::with_indent(4)).unwrap();
        assert_eq!(out, "a:\n    b:\n    -   x: 1\n        y: 2\n");
    }

    #[test]
    fn test_unsafe_plain_values_get_quoted() {
        let mut node = YamlNode::mapping();
        if let YamlValue::Mapping(entries) = node.value_mut() {
            entries.push((
                YamlNode::scalar("note", NodeStyle::Default),
                YamlNode::scalar("key: value", NodeStyle::Default),
            ));
            entries.push((
                YamlNode::scalar("multi", NodeStyle::SingleQuoted),
                YamlNode::scalar("a\nb", NodeStyle::SingleQuoted),
            ));
        }
        let out = emit_document(&YamlNode::document(node), &EmitOptions::default()).unwrap();
        assert_eq!(out, "note: \"key: value\"\n'multi': \"a\\nb\"\n");
    }

    #[test]
    fn test_explicit_tag_omitted_when_implied() {
        let mut value = YamlNode::scalar("PreSync", NodeStyle::DoubleQuoted);
        value.set_tag(Some("!!str".to_string()));
        let mut number = YamlNode::scalar("5", NodeStyle::Default);
        number.set_tag(Some("!!int".to_string()));
        let mut quoted_number = YamlNode::scalar("5", NodeStyle::Default);
        quoted_number.set_tag(Some("!!str".to_string()));

        assert_eq!(inline(&value, false), "\"PreSync\"");
        assert_eq!(inline(&number, false), "5");
        assert_eq!(inline(&quoted_number, false), "!!str 5");
    }

    #[test]
    fn test_double_quote_escapes() {
        assert_eq!(double_quote("a\"b\\c"), "\"a\\\"b\\\\c\"");
        assert_eq!(double_quote("bell\u{7}"), "\"bell\\x07\"");
    }

    #[test]
    fn test_empty_stream_emits_nothing() {
        assert_eq!(roundtrip(""), "");
    }
}
