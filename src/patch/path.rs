//! Path segments and the dotted path syntax.
//!
//! A path such as `metadata.annotations.key` is a sequence of [`Label`]s. The
//! dot is the only separator; a backslash escapes a literal dot or backslash
//! inside a segment, so `metadata.annotations.argocd\.argoproj\.io/hook` has
//! three segments.

use super::error::{PatchError, PatchResult};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

const SEPARATOR: char = '.';
const ESCAPE: char = '\\';

/// One path segment, matched against mapping keys.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Label(String);

impl Label {
    pub fn new(s: impl Into<String>) -> Self {
        Label(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Label {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self {
        Label(s.to_owned())
    }
}

impl From<String> for Label {
    fn from(s: String) -> Self {
        Label(s)
    }
}

impl From<&String> for Label {
    fn from(s: &String) -> Self {
        Label(s.clone())
    }
}

impl From<&Label> for Label {
    fn from(l: &Label) -> Self {
        l.clone()
    }
}

/// An ordered sequence of labels, from the document root downwards.
///
/// # Examples
///
/// ```
/// use yamlpatch::patch::path::LabelPath;
///
/// let path: LabelPath = "metadata.annotations.argocd\\.argoproj\\.io/hook".parse().unwrap();
/// assert_eq!(path.len(), 3);
/// assert_eq!(path.labels()[2].as_str(), "argocd.argoproj.io/hook");
/// assert_eq!(path.to_string(), "metadata.annotations.argocd\\.argoproj\\.io/hook");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LabelPath(Vec<Label>);

impl LabelPath {
    /// The empty path (the document root).
    pub fn root() -> Self {
        LabelPath(Vec::new())
    }

    pub fn from_labels<I, L>(labels: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<Label>,
    {
        LabelPath(labels.into_iter().map(Into::into).collect())
    }

    pub fn labels(&self) -> &[Label] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&[Label]> for LabelPath {
    fn from(labels: &[Label]) -> Self {
        LabelPath(labels.to_vec())
    }
}

impl IntoIterator for LabelPath {
    type Item = Label;
    type IntoIter = std::vec::IntoIter<Label>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a LabelPath {
    type Item = &'a Label;
    type IntoIter = std::slice::Iter<'a, Label>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for LabelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for (i, label) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", SEPARATOR)?;
            }
            for ch in label.as_str().chars() {
                if ch == SEPARATOR || ch == ESCAPE {
                    write!(f, "{}", ESCAPE)?;
                }
                write!(f, "{}", ch)?;
            }
        }
        Ok(())
    }
}

impl FromStr for LabelPath {
    type Err = PatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_path(s)
    }
}

/// Splits a dotted path into labels.
///
/// Empty segments and unknown or dangling escapes are rejected rather than
/// guessed at.
///
/// # Examples
///
/// ```
/// use yamlpatch::patch::path::parse_path;
///
/// let path = parse_path("spec.template.metadata").unwrap();
/// assert_eq!(path.len(), 3);
///
/// assert!(parse_path("spec..metadata").is_err());
/// ```
pub fn parse_path(input: &str) -> PatchResult<LabelPath> {
    if input.is_empty() {
        return Err(PatchError::invalid_path(input, "path is empty"));
    }

    let mut labels = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars();

    while let Some(ch) = chars.next() {
        match ch {
            ESCAPE => match chars.next() {
                Some(next @ (SEPARATOR | ESCAPE)) => current.push(next),
                Some(_) => {
                    return Err(PatchError::invalid_path(
                        input,
                        "only '.' and '\\' may be escaped",
                    ))
                }
                None => return Err(PatchError::invalid_path(input, "dangling escape")),
            },
            SEPARATOR => {
                if current.is_empty() {
                    return Err(PatchError::invalid_path(input, "empty path segment"));
                }
                labels.push(Label(std::mem::take(&mut current)));
            }
            _ => current.push(ch),
        }
    }

    if current.is_empty() {
        return Err(PatchError::invalid_path(input, "empty path segment"));
    }
    labels.push(Label(current));

    Ok(LabelPath(labels))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(path: &LabelPath) -> Vec<&str> {
        path.labels().iter().map(Label::as_str).collect()
    }

    #[test]
    fn test_parse_simple_path() {
        let path = parse_path("metadata.annotations.key").unwrap();
        assert_eq!(labels(&path), vec!["metadata", "annotations", "key"]);
    }

    #[test]
    fn test_parse_single_segment() {
        let path = parse_path("a").unwrap();
        assert_eq!(labels(&path), vec!["a"]);
    }

    #[test]
    fn test_parse_escaped_dot() {
        let path = parse_path("a.b\\.c").unwrap();
        assert_eq!(labels(&path), vec!["a", "b.c"]);
    }

    #[test]
    fn test_parse_escaped_backslash() {
        let path = parse_path("a\\\\b.c").unwrap();
        assert_eq!(labels(&path), vec!["a\\b", "c"]);
    }

    #[test]
    fn test_parse_rejects_empty_segments() {
        for input in ["", ".", "a..b", ".a", "a."] {
            let err = parse_path(input).unwrap_err();
            assert!(
                matches!(err, PatchError::InvalidPath { .. }),
                "expected InvalidPath for {:?}",
                input
            );
        }
    }

    #[test]
    fn test_parse_rejects_bad_escapes() {
        assert!(parse_path("a\\").is_err());
        assert!(parse_path("a\\nb").is_err());
    }

    #[test]
    fn test_display_round_trips() {
        for input in ["a", "a.b", "a.b\\.c", "x\\\\y.z", "helm\\.sh/hook"] {
            let path = parse_path(input).unwrap();
            assert_eq!(path.to_string(), input);
            assert_eq!(parse_path(&path.to_string()).unwrap(), path);
        }
    }

    #[test]
    fn test_unicode_labels() {
        let path = parse_path("données.ключ").unwrap();
        assert_eq!(labels(&path), vec!["données", "ключ"]);
    }
}
