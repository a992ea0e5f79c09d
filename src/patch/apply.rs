//! Conditional patching of a single document.

use super::condition::Condition;
use super::engine::{traverse, Mode};
use super::error::PatchResult;
use super::traversal::Traversal;
use crate::document::node::YamlNode;
use tracing::{debug, warn};

/// What [`apply`] did to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The patch ran; `matched` leaves were visited.
    Patched { matched: usize },
    /// The condition evaluated false; the document was not touched.
    ConditionNotMet,
}

impl ApplyOutcome {
    pub fn is_patched(&self) -> bool {
        matches!(self, ApplyOutcome::Patched { .. })
    }

    pub fn matched(&self) -> usize {
        match self {
            ApplyOutcome::Patched { matched } => *matched,
            ApplyOutcome::ConditionNotMet => 0,
        }
    }
}

/// Reports whether `node` satisfies `condition`.
///
/// No condition always matches. A probe that fails (the path is absent or
/// runs into a non-mapping) counts as no match.
pub fn matches(node: &YamlNode, condition: Option<&Condition>) -> bool {
    let Some(condition) = condition else {
        return true;
    };
    match condition.probe(node) {
        Ok(outcome) => condition.evaluate(&outcome),
        Err(err) => {
            debug!(error = %err, "condition probe failed, treating as no match");
            false
        }
    }
}

/// Applies `patch` to `node` if `condition` holds.
///
/// A failed probe is returned as an error. A condition that is false is not
/// an error: the document is left as it was and `ConditionNotMet` returned.
/// If the patch itself fails part way, every change it made is undone.
///
/// # Examples
///
/// ```
/// use yamlpatch::document::parser::parse_yaml_document;
/// use yamlpatch::patch::{apply, eq, set, ApplyOutcome};
///
/// let mut doc = parse_yaml_document("kind: Pod\nmetadata:\n  name: job\n").unwrap();
/// let patch = set(["metadata", "name"], "renamed").unwrap();
///
/// let skipped = apply(&mut doc, &patch, Some(&eq(["kind"], "Deployment").unwrap())).unwrap();
/// assert_eq!(skipped, ApplyOutcome::ConditionNotMet);
///
/// let patched = apply(&mut doc, &patch, Some(&eq(["kind"], "Pod").unwrap())).unwrap();
/// assert_eq!(patched, ApplyOutcome::Patched { matched: 1 });
/// ```
pub fn apply(node: &mut YamlNode, patch: &Traversal, condition: Option<&Condition>) -> PatchResult<ApplyOutcome> {
    if let Some(condition) = condition {
        let outcome = condition.probe(node)?;
        if !condition.evaluate(&outcome) {
            warn!("document did not match the condition, skipping patch");
            return Ok(ApplyOutcome::ConditionNotMet);
        }
    }

    // A failed patch pass leaves the document exactly as it was.
    let snapshot = node.clone();
    match traverse(node, patch, Mode::Patch) {
        Ok(matched) => {
            debug!(matched, paths = %patch, "patch applied");
            Ok(ApplyOutcome::Patched { matched })
        }
        Err(err) => {
            *node = snapshot;
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parser::parse_yaml_document;
    use crate::patch::builder::{and, eq, set};
    use crate::patch::error::PatchError;

    fn doc(source: &str) -> YamlNode {
        parse_yaml_document(source).unwrap()
    }

    #[test]
    fn test_no_condition_matches() {
        assert!(matches(&doc("a: 1\n"), None));
    }

    #[test]
    fn test_match_and_clauses() {
        let node = doc("a: \"1\"\nb:\n  bb: \"2\"\n");
        let yes = and([eq(["a"], "1").unwrap(), eq(["b", "bb"], "2").unwrap()]).unwrap();
        let no = and([eq(["a"], "1").unwrap(), eq(["b", "bb"], "3").unwrap()]).unwrap();
        assert!(matches(&node, Some(&yes)));
        assert!(!matches(&node, Some(&no)));
    }

    #[test]
    fn test_match_swallows_probe_errors() {
        let node = doc("a: 1\n");
        assert!(!matches(&node, Some(&eq(["a", "b"], "1").unwrap())));
        assert!(!matches(&node, Some(&eq(["missing"], "1").unwrap())));
    }

    #[test]
    fn test_match_is_idempotent_and_read_only() {
        let node = doc("a: 1\n");
        let condition = eq(["a"], "1").unwrap();
        assert!(matches(&node, Some(&condition)));
        assert!(matches(&node, Some(&condition)));
        assert!(!node.is_modified_deep());
    }

    #[test]
    fn test_apply_false_condition_is_noop() {
        let mut node = doc("a: 1\nb: 2\n");
        let before = node.clone();
        let outcome = apply(&mut node, &set(["b"], 3).unwrap(), Some(&eq(["a"], "9").unwrap())).unwrap();
        assert_eq!(outcome, ApplyOutcome::ConditionNotMet);
        assert_eq!(node, before);
    }

    #[test]
    fn test_apply_surfaces_probe_errors() {
        let mut node = doc("a: 1\n");
        let err = apply(&mut node, &set(["a"], 3).unwrap(), Some(&eq(["missing"], "x").unwrap())).unwrap_err();
        assert!(err.is_value_not_found());
    }

    #[test]
    fn test_apply_creates_missing_path() {
        let mut node = doc("c: keep\n");
        let outcome = apply(&mut node, &set(["a", "b"], "x").unwrap(), None).unwrap();
        assert_eq!(outcome.matched(), 1);
        assert_eq!(node.get_path(["a", "b"]).and_then(|n| n.as_scalar()), Some("x"));
        assert_eq!(node.get("c").and_then(|n| n.as_scalar()), Some("keep"));
    }

    #[test]
    fn test_apply_collapses_mapping_target() {
        let mut node = doc("a:\n  b: c\n");
        apply(&mut node, &set(["a"], 1).unwrap(), None).unwrap();
        let a = node.get("a").unwrap();
        assert_eq!(a.as_scalar(), Some("1"));
        assert_eq!(a.tag(), "!!int");
    }

    #[test]
    fn test_failed_patch_rolls_back_earlier_writes() {
        let mut node = doc("a:\n  x: 1\nb:\n  - 1\n");
        let before = node.clone();
        let mut patch = set(["a", "x"], "NEW").unwrap();
        patch.merge(set(["b", "y"], "v").unwrap()).unwrap();

        let err = apply(&mut node, &patch, None).unwrap_err();
        assert!(matches!(err, PatchError::StructuralMismatch { .. }));
        assert_eq!(node, before);
        assert_eq!(node.get_path(["a", "x"]).and_then(|n| n.as_scalar()), Some("1"));
    }

    #[test]
    fn test_apply_to_sequence_target_is_mismatch() {
        let mut node = doc("a:\n  - 1\n");
        let err = apply(&mut node, &set(["a"], "x").unwrap(), None).unwrap_err();
        assert!(matches!(err, PatchError::StructuralMismatch { .. }));
    }
}
