//! YAML file saving functionality.
//!
//! This module writes emitted YAML back to disk with atomic write operations
//! and optional backup creation.

use crate::config::Config;
use crate::document::emitter::emit_stream;
use crate::document::parser::parse_yaml_stream;
use crate::document::stream::YamlStream;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Emits a stream with the configured indent and saves it to `path`.
///
/// # Examples
///
/// ```no_run
/// use yamlpatch::config::Config;
/// use yamlpatch::document::parser::parse_yaml_stream;
/// use yamlpatch::file::saver::save_yaml_stream;
///
/// let stream = parse_yaml_stream("name: web\n").unwrap();
/// save_yaml_stream("output.yaml", &stream, &Config::default()).unwrap();
/// ```
pub fn save_yaml_stream<P: AsRef<Path>>(path: P, stream: &YamlStream, config: &Config) -> Result<()> {
    let options = config.patch_options();
    let text = emit_stream(stream, &options.emit).context("Failed to encode YAML")?;
    save_yaml_text(path, &text, config)
}

/// Saves already-emitted YAML text to a file.
///
/// The text is decoded once more before anything is written, so a bad
/// encoding never replaces a good file. A `.bak` copy of an existing target
/// is made first when `config.create_backup` is set. Targets ending in `.gz`
/// are gzip-compressed.
///
/// # Errors
///
/// This function will return an error if:
/// - The text is not valid YAML
/// - Backup creation fails (if requested)
/// - Writing to the temp file fails
/// - Renaming the temp file to the target fails
pub fn save_yaml_text<P: AsRef<Path>>(path: P, text: &str, config: &Config) -> Result<()> {
    let path = path.as_ref();

    // Determine if we should compress based on target filename
    let should_compress = path.to_string_lossy().ends_with(".gz");

    parse_yaml_stream(text).context("Generated invalid YAML - refusing to overwrite the file")?;

    if config.create_backup && path.exists() {
        create_backup(path)?;
    }

    write_file_atomic(path, text.as_bytes(), should_compress)?;

    Ok(())
}

/// Creates a backup of a file by copying it with a .bak extension.
fn create_backup<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    let mut backup_path = path.to_path_buf();
    let original_name = backup_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid file name"))?;
    backup_path.set_file_name(format!("{}.bak", original_name));
    fs::copy(path, backup_path).context("Failed to create backup")?;
    Ok(())
}

/// Writes data to a file atomically, optionally compressing with gzip.
///
/// This function writes to a temporary file first, then atomically renames
/// it to the target path, so the target is never left partially written.
fn write_file_atomic<P: AsRef<Path>>(path: P, data: &[u8], compress: bool) -> Result<()> {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    let path = path.as_ref();
    let temp_path = path.with_extension("tmp");

    if compress {
        let file = fs::File::create(&temp_path).context("Failed to create temp file")?;
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder
            .write_all(data)
            .context("Failed to write compressed data")?;
        encoder.finish().context("Failed to finish compression")?;
    } else {
        fs::write(&temp_path, data).context("Failed to write temp file")?;
    }

    fs::rename(&temp_path, path).context("Failed to rename temp file")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_file_atomic_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.yaml");
        write_file_atomic(&path, b"a: 1\n", false).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "a: 1\n");
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_invalid_text_is_not_written() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.yaml");
        fs::write(&path, "keep: me\n").unwrap();

        assert!(save_yaml_text(&path, "a: [1", &Config::default()).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "keep: me\n");
    }

    #[test]
    fn test_create_backup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.yaml");
        fs::write(&path, "old: 1\n").unwrap();

        create_backup(&path).unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("out.yaml.bak")).unwrap(),
            "old: 1\n"
        );
    }
}
