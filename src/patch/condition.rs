//! Conditions that gate a patch.
//!
//! A [`Condition`] is evaluated in two steps: [`Condition::probe`] walks the
//! document and captures the literal at every path the condition mentions,
//! then [`Condition::evaluate`] folds its predicate over what was captured.

use super::engine;
use super::error::PatchResult;
use super::path::LabelPath;
use super::traversal::Traversal;
use crate::document::node::YamlNode;
use std::collections::HashMap;

/// The boolean structure of a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// The literal at `path` equals `expected`.
    Eq { path: LabelPath, expected: String },
    /// Every inner predicate holds; true when empty.
    All(Vec<Predicate>),
    /// At least one inner predicate holds; false when empty.
    Any(Vec<Predicate>),
}

impl Predicate {
    pub fn evaluate(&self, outcome: &ProbeOutcome) -> bool {
        match self {
            Predicate::Eq { path, expected } => outcome.get(path) == Some(expected.as_str()),
            Predicate::All(inner) => inner.iter().all(|p| p.evaluate(outcome)),
            Predicate::Any(inner) => inner.iter().any(|p| p.evaluate(outcome)),
        }
    }
}

/// Literals captured by a probe, keyed by path.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOutcome {
    captured: HashMap<LabelPath, String>,
}

impl ProbeOutcome {
    fn empty() -> Self {
        Self {
            captured: HashMap::new(),
        }
    }

    /// The literal captured at `path`, if the probe reached it.
    pub fn get(&self, path: &LabelPath) -> Option<&str> {
        self.captured.get(path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.captured.len()
    }

    pub fn is_empty(&self) -> bool {
        self.captured.is_empty()
    }
}

/// A probe tree plus the predicate evaluated over its captures.
///
/// Conditions hold no mutable state; one value can be shared across threads
/// and probed against any number of documents.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    traversal: Traversal,
    predicate: Predicate,
}

impl Condition {
    pub(crate) fn new(traversal: Traversal, predicate: Predicate) -> Self {
        Self {
            traversal,
            predicate,
        }
    }

    pub(crate) fn into_parts(self) -> (Traversal, Predicate) {
        (self.traversal, self.predicate)
    }

    pub fn traversal(&self) -> &Traversal {
        &self.traversal
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    /// Walks `node` and captures the literal at each probed path.
    ///
    /// Fails like a traversal does: `ValueNotFound` when a probed mapping
    /// holds none of the probed keys, `StructuralMismatch` when a branch
    /// path meets a non-mapping. A condition without paths is not walked.
    pub fn probe(&self, node: &YamlNode) -> PatchResult<ProbeOutcome> {
        if self.traversal.is_empty() {
            return Ok(ProbeOutcome::empty());
        }
        let captured = engine::capture(node, &self.traversal)?;
        Ok(ProbeOutcome { captured })
    }

    pub fn evaluate(&self, outcome: &ProbeOutcome) -> bool {
        self.predicate.evaluate(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parser::parse_yaml_document;
    use crate::patch::builder::{and, eq, or};

    fn doc(source: &str) -> YamlNode {
        parse_yaml_document(source).unwrap()
    }

    #[test]
    fn test_probe_then_evaluate() {
        let node = doc("a: \"1\"\nb: 2\n");
        let condition = eq(["a"], "1").unwrap();
        let outcome = condition.probe(&node).unwrap();
        assert_eq!(outcome.len(), 1);
        assert!(condition.evaluate(&outcome));
    }

    #[test]
    fn test_collections_capture_empty_literal() {
        let node = doc("a:\n  b: 1\n");
        let condition = eq(["a"], "").unwrap();
        let outcome = condition.probe(&node).unwrap();
        assert_eq!(outcome.get(&LabelPath::from_labels(["a"])), Some(""));
        assert!(condition.evaluate(&outcome));
    }

    #[test]
    fn test_unreached_eq_is_false() {
        let node = doc("a: 1\nb: 2\n");
        let condition = or([eq(["a"], "1").unwrap(), eq(["c"], "3").unwrap()]).unwrap();
        let outcome = condition.probe(&node).unwrap();
        assert!(condition.evaluate(&outcome));

        let both = and([eq(["a"], "1").unwrap(), eq(["c"], "3").unwrap()]).unwrap();
        let outcome = both.probe(&node).unwrap();
        assert!(!both.evaluate(&outcome));
    }

    #[test]
    fn test_empty_combinators_skip_the_walk() {
        let node = doc("a: 1\n");
        let all = and([]).unwrap();
        let outcome = all.probe(&node).unwrap();
        assert!(outcome.is_empty());
        assert!(all.evaluate(&outcome));

        let any = or([]).unwrap();
        let outcome = any.probe(&node).unwrap();
        assert!(!any.evaluate(&outcome));
    }

    #[test]
    fn test_condition_reads_through_shared_borrow() {
        let node = doc("metadata:\n  name: web\n");
        let name = node.get_path(["metadata", "name"]);
        let condition = eq(["metadata", "name"], "web").unwrap();
        let outcome = condition.probe(&node).unwrap();
        assert!(condition.evaluate(&outcome));
        assert_eq!(name.and_then(|n| n.as_scalar()), Some("web"));
        assert!(!node.is_modified_deep());
    }

    #[test]
    fn test_condition_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Condition>();
    }
}
