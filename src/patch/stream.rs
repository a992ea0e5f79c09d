//! Patching every document of a YAML stream.

use super::apply::{apply, ApplyOutcome};
use super::condition::Condition;
use super::error::{PatchError, PatchResult};
use super::traversal::Traversal;
use crate::document::emitter::{emit_stream, EmitOptions};
use crate::document::node::YamlNode;
use crate::document::parser::parse_yaml_stream;
use tracing::{debug, warn};

/// Options for [`apply_str`].
#[derive(Debug, Clone, Default)]
pub struct PatchOptions {
    pub emit: EmitOptions,
    /// Log each document's node tree as JSON at debug level after patching.
    pub dump_nodes: bool,
}

/// A document that could not be patched.
#[derive(Debug)]
pub struct DocumentFailure {
    /// 0-based position in the stream.
    pub index: usize,
    pub error: PatchError,
}

/// The result of patching a stream.
///
/// `output` always holds every document, patched or not, in source order.
#[derive(Debug)]
pub struct StreamReport {
    pub output: String,
    pub documents: usize,
    pub outcomes: Vec<Option<ApplyOutcome>>,
    pub failures: Vec<DocumentFailure>,
}

impl StreamReport {
    /// True when the stream had documents and none of them could be patched.
    pub fn all_failed(&self) -> bool {
        self.documents > 0 && self.failures.len() == self.documents
    }

    /// Number of documents the patch was actually applied to.
    pub fn patched(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.is_some_and(|o| o.is_patched()))
            .count()
    }

    /// Fails with the first document's error if every document failed.
    pub fn ensure_any_succeeded(mut self) -> PatchResult<Self> {
        if self.all_failed() {
            let first = self.failures.remove(0);
            return Err(first.error);
        }
        Ok(self)
    }

    /// The emitted stream, unless every document failed.
    pub fn into_result(self) -> PatchResult<String> {
        self.ensure_any_succeeded().map(|report| report.output)
    }
}

/// Decodes `input`, applies `patch` to each document independently, and
/// re-emits the whole stream.
///
/// Per-document errors are collected in the report; decode and encode errors
/// are returned directly.
///
/// # Examples
///
/// ```
/// use yamlpatch::patch::{apply_str, eq, set, PatchOptions};
///
/// let input = "kind: Service\n---\nkind: Pod\nmetadata:\n  name: job\n";
/// let patch = set(["metadata", "name"], "renamed").unwrap();
///
/// let report = apply_str(input, &patch, Some(&eq(["kind"], "Pod").unwrap()), &PatchOptions::default()).unwrap();
/// assert_eq!(report.patched(), 1);
/// assert_eq!(report.output, "kind: Service\n---\nkind: Pod\nmetadata:\n  name: \"renamed\"\n");
/// ```
pub fn apply_str(
    input: &str,
    patch: &Traversal,
    condition: Option<&Condition>,
    options: &PatchOptions,
) -> PatchResult<StreamReport> {
    let mut stream = parse_yaml_stream(input)?;
    let documents = stream.len();
    let mut outcomes = Vec::with_capacity(documents);
    let mut failures = Vec::new();

    for (index, document) in stream.documents_mut().iter_mut().enumerate() {
        match apply(document, patch, condition) {
            Ok(outcome) => {
                debug!(document = index, outcome = ?outcome, "document processed");
                outcomes.push(Some(outcome));
            }
            Err(error) => {
                warn!(document = index, error = %error, "failed to patch document");
                outcomes.push(None);
                failures.push(DocumentFailure { index, error });
            }
        }
        if options.dump_nodes {
            dump_node(index, document);
        }
    }

    let output = emit_stream(&stream, &options.emit)?;
    Ok(StreamReport {
        output,
        documents,
        outcomes,
        failures,
    })
}

fn dump_node(index: usize, node: &YamlNode) {
    match serde_json::to_string_pretty(node) {
        Ok(json) => debug!(document = index, "node tree:\n{}", json),
        Err(err) => debug!(document = index, error = %err, "could not dump node tree"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::builder::{eq, set};

    #[test]
    fn test_partial_failure_is_success() {
        let input = "a:\n  b: 1\n---\nc: 2\n";
        let patch = set(["a", "b"], 5).unwrap();
        let condition = eq(["a", "b"], "1").unwrap();
        let report = apply_str(input, &patch, Some(&condition), &PatchOptions::default()).unwrap();

        assert_eq!(report.documents, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].index, 1);
        assert!(report.failures[0].error.is_value_not_found());
        assert!(!report.all_failed());
        assert_eq!(report.into_result().unwrap(), "a:\n  b: 5\n---\nc: 2\n");
    }

    #[test]
    fn test_all_failed_returns_first_error() {
        let input = "x: 1\n---\ny: 2\n";
        let patch = set(["a"], "v").unwrap();
        let condition = eq(["a"], "v").unwrap();
        let report = apply_str(input, &patch, Some(&condition), &PatchOptions::default()).unwrap();
        assert!(report.all_failed());
        assert!(report.into_result().unwrap_err().is_value_not_found());
    }

    #[test]
    fn test_empty_stream_succeeds() {
        let report = apply_str("", &set(["a"], "v").unwrap(), None, &PatchOptions::default()).unwrap();
        assert_eq!(report.documents, 0);
        assert!(!report.all_failed());
        assert_eq!(report.into_result().unwrap(), "");
    }

    #[test]
    fn test_comment_only_stream_is_reemitted() {
        let report = apply_str("# only comment\n", &set(["a"], "v").unwrap(), None, &PatchOptions::default()).unwrap();
        assert_eq!(report.documents, 0);
        assert_eq!(report.into_result().unwrap(), "# only comment\n");
    }

    #[test]
    fn test_decode_error_is_returned() {
        let result = apply_str("a: [1", &set(["a"], "v").unwrap(), None, &PatchOptions::default());
        assert!(matches!(result, Err(PatchError::Decode(_))));
    }

    #[test]
    fn test_dump_nodes_does_not_change_output() {
        let options = PatchOptions {
            dump_nodes: true,
            ..PatchOptions::default()
        };
        let report = apply_str("a: 1\n", &set(["a"], 2).unwrap(), None, &options).unwrap();
        assert_eq!(report.output, "a: 2\n");
    }
}
