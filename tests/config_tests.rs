use std::fs;
use tempfile::TempDir;
use yamlpatch::config::Config;

#[test]
fn test_config_defaults() {
    let config = Config::default();

    assert_eq!(config.indent_size, 2);
    assert!(!config.create_backup);
    assert_eq!(config.log_level, "warn");
    assert!(!config.dump_nodes);
}

#[test]
fn test_config_serialization() {
    let config = Config {
        indent_size: 4,
        create_backup: true,
        log_level: "yamlpatch=debug".to_string(),
        dump_nodes: true,
    };

    let toml_str = toml::to_string(&config).unwrap();
    assert!(toml_str.contains("indent_size = 4"));
    assert!(toml_str.contains("create_backup = true"));

    let deserialized: Config = toml::from_str(&toml_str).unwrap();
    assert_eq!(deserialized, config);
}

#[test]
fn test_load_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "indent_size = 4\ncreate_backup = true\n").unwrap();

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.indent_size, 4);
    assert!(config.create_backup);
    assert_eq!(config.log_level, "warn");
}

#[test]
fn test_load_from_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    assert!(Config::load_from(dir.path().join("nope.toml")).is_err());
}

#[test]
fn test_load_from_invalid_toml_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "indent_size = \"wide\"\n").unwrap();

    let err = Config::load_from(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
}

#[test]
fn test_config_path_location() {
    if let Some(path) = Config::config_path() {
        assert!(path.ends_with(".config/yamlpatch/config.toml"));
    }
}

#[test]
fn test_patch_options_follow_indent() {
    let config = Config {
        indent_size: 4,
        ..Config::default()
    };
    assert_eq!(config.patch_options().emit.indent, 4);

    let too_wide = Config {
        indent_size: 20,
        ..Config::default()
    };
    assert_eq!(too_wide.patch_options().emit.indent, 8);
}
