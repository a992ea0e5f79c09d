//! Conditional, path-based patching of YAML streams.
//!
//! ```
//! use yamlpatch::patch::{apply_str, eq, set, PatchOptions};
//!
//! let input = "metadata:\n  annotations:\n    \"helm.sh/hook\": pre-install\n";
//! let patch = set(["metadata", "annotations", "argocd.argoproj.io/hook"], "PreSync").unwrap();
//! let when = eq(["metadata", "annotations", "helm.sh/hook"], "pre-install").unwrap();
//!
//! let output = apply_str(input, &patch, Some(&when), &PatchOptions::default())
//!     .unwrap()
//!     .into_result()
//!     .unwrap();
//! assert!(output.contains("\"argocd.argoproj.io/hook\": \"PreSync\""));
//! ```

pub mod config;
pub mod document;
pub mod file;
pub mod patch;
