//! Configuration system for yamlpatch.
//!
//! This module provides the configuration structure for yamlpatch with sensible defaults
//! and support for serialization/deserialization via serde. Configuration is loaded
//! from a TOML file and command-line arguments override it.
//!
//! # Example
//!
//! ```
//! use yamlpatch::config::Config;
//!
//! // Use default configuration
//! let config = Config::default();
//! assert_eq!(config.indent_size, 2);
//! assert_eq!(config.log_level, "warn");
//!
//! // Create custom configuration
//! let custom = Config {
//!     indent_size: 4,
//!     ..Config::default()
//! };
//! assert_eq!(custom.patch_options().emit.indent, 4);
//! ```

use crate::document::emitter::EmitOptions;
use crate::patch::stream::PatchOptions;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for the yamlpatch application.
///
/// # Fields
///
/// * `indent_size` - Number of spaces per indentation level in the output (default: 2)
/// * `create_backup` - Create .bak files before writing in place (default: false)
/// * `log_level` - Default log filter when `RUST_LOG` is unset (default: "warn")
/// * `dump_nodes` - Log each patched document's node tree as JSON (default: false)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Number of spaces per indentation level
    #[serde(default = "default_indent_size")]
    pub indent_size: usize,

    /// Create .bak files before writing in place
    #[serde(default)]
    pub create_backup: bool,

    /// Log filter directive, e.g. "warn" or "yamlpatch=debug"
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log each patched document's node tree at debug level
    #[serde(default)]
    pub dump_nodes: bool,
}

/// Returns the default indentation size.
fn default_indent_size() -> usize {
    2
}

/// Returns the default log filter.
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            indent_size: default_indent_size(),
            create_backup: false,
            log_level: default_log_level(),
            dump_nodes: false,
        }
    }
}

impl Config {
    /// Returns the path to the config file.
    ///
    /// Uses `~/.config/yamlpatch/config.toml` on all platforms.
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|mut path| {
            path.push(".config");
            path.push("yamlpatch");
            path.push("config.toml");
            path
        })
    }

    /// Loads configuration from the default config file.
    ///
    /// Returns the default configuration if the file doesn't exist or can't be read.
    pub fn load() -> Self {
        let config_path = match Self::config_path() {
            Some(path) => path,
            None => return Self::default(),
        };

        if !config_path.exists() {
            return Self::default();
        }

        Self::load_from(&config_path).unwrap_or_else(|_| Self::default())
    }

    /// Loads configuration from `path`, failing if it can't be read or parsed.
    pub fn load_from<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Options for patching a stream with this configuration.
    pub fn patch_options(&self) -> PatchOptions {
        PatchOptions {
            emit: EmitOptions::with_indent(self.indent_size),
            dump_nodes: self.dump_nodes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str("indent_size = 4").unwrap();
        assert_eq!(config.indent_size, 4);
        assert_eq!(config.log_level, "warn");
        assert!(!config.create_backup);
    }

    #[test]
    fn test_patch_options_clamp_indent() {
        let config = Config {
            indent_size: 1,
            dump_nodes: true,
            ..Default::default()
        };
        let options = config.patch_options();
        assert_eq!(options.emit.indent, 2);
        assert!(options.dump_nodes);
    }
}
