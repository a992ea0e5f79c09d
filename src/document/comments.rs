//! Source scanning for what the YAML event parser drops.
//!
//! `yaml-rust2` reports neither comments nor anchor names, so the decoder
//! scans the raw text for them. The scanner tracks quoted scalars (which may
//! span lines) and flow collections, and skips the bodies of literal and
//! folded block scalars, where `#` and `&` are ordinary content.

use std::collections::HashSet;

/// A comment found in the source.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CommentLine {
    /// 1-based line number.
    pub line: usize,
    /// The comment text including the leading `#`, trailing whitespace removed.
    pub text: String,
    /// True if nothing but indentation precedes the comment.
    pub full_line: bool,
}

/// Comments and anchor names recovered from the source, in source order.
#[derive(Debug, Default)]
pub(crate) struct SourceScan {
    pub comments: Vec<CommentLine>,
    pub anchors: Vec<String>,
}

impl SourceScan {
    /// Scans `source`. `block_scalar_lines` are the 1-based header lines of
    /// literal/folded scalars, whose bodies are skipped.
    pub fn scan(source: &str, block_scalar_lines: &[usize]) -> Self {
        let lines: Vec<&str> = source.lines().collect();
        let skipped = block_scalar_bodies(&lines, block_scalar_lines);

        let mut scanner = LineScanner::default();
        let mut scan = SourceScan::default();

        for (idx, line) in lines.iter().enumerate() {
            let number = idx + 1;
            if skipped.contains(&number) {
                continue;
            }
            scanner.scan_line(line, number, &mut scan);
        }

        scan
    }
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Line numbers that belong to block scalar bodies.
///
/// The body's indentation is taken from its first non-blank line; the body
/// continues over blank lines and lines indented at least that far.
fn block_scalar_bodies(lines: &[&str], headers: &[usize]) -> HashSet<usize> {
    let mut skipped = HashSet::new();

    for &header in headers {
        let Some(header_line) = lines.get(header.wrapping_sub(1)) else {
            continue;
        };
        let base = indent_of(header_line);

        let Some(first) = (header..lines.len()).find(|&i| !is_blank(lines[i])) else {
            continue;
        };
        let body_indent = indent_of(lines[first]);
        if body_indent <= base {
            continue;
        }

        for (i, line) in lines.iter().enumerate().skip(header) {
            if !is_blank(line) && indent_of(line) < body_indent {
                break;
            }
            skipped.insert(i + 1);
        }
    }

    skipped
}

#[derive(Default)]
struct LineScanner {
    quote: Option<char>,
    flow_depth: usize,
}

impl LineScanner {
    fn scan_line(&mut self, line: &str, number: usize, scan: &mut SourceScan) {
        let chars: Vec<(usize, char)> = line.char_indices().collect();
        let mut at_value = true;
        let mut prev_ws = true;
        let mut i = 0;

        while i < chars.len() {
            let (offset, ch) = chars[i];
            let next = chars.get(i + 1).map(|&(_, c)| c);

            if let Some(q) = self.quote {
                if q == '"' && ch == '\\' {
                    i += 2;
                    continue;
                }
                if ch == q {
                    if q == '\'' && next == Some('\'') {
                        i += 2;
                        continue;
                    }
                    self.quote = None;
                    at_value = false;
                }
                prev_ws = false;
                i += 1;
                continue;
            }

            match ch {
                ' ' | '\t' => {
                    prev_ws = true;
                    i += 1;
                    continue;
                }
                '#' if prev_ws => {
                    scan.comments.push(CommentLine {
                        line: number,
                        text: line[offset..].trim_end().to_string(),
                        full_line: line[..offset].trim().is_empty(),
                    });
                    return;
                }
                '"' | '\'' if at_value => self.quote = Some(ch),
                '&' | '!' if at_value => {
                    let end = token_end(&chars, i + 1, self.flow_depth > 0);
                    if ch == '&' && end > i + 1 {
                        scan.anchors
                            .push(chars[i + 1..end].iter().map(|&(_, c)| c).collect());
                    }
                    i = end;
                    prev_ws = false;
                    continue;
                }
                '[' | '{' if at_value => self.flow_depth += 1,
                ']' | '}' if self.flow_depth > 0 => {
                    self.flow_depth -= 1;
                    at_value = false;
                }
                ',' if self.flow_depth > 0 => at_value = true,
                '-' | '?' | ':' if next.map_or(true, |c| c == ' ' || c == '\t') => at_value = true,
                ':' if self.flow_depth > 0 => at_value = true,
                _ => at_value = false,
            }

            prev_ws = false;
            i += 1;
        }
    }
}

/// Index just past a property token (`&anchor` or `!tag`) starting at `start`.
fn token_end(chars: &[(usize, char)], start: usize, flow: bool) -> usize {
    let mut end = start;
    while let Some(&(_, c)) = chars.get(end) {
        if c.is_whitespace() || (flow && matches!(c, ',' | '[' | ']' | '{' | '}')) {
            break;
        }
        end += 1;
    }
    end
}
