//! Config parsing (YAML, TOML), defaults, file loading, example generation
//! and error handling.

use std::path::PathBuf;
use reclaim_cli::config::*;

// =============================================================================
// Config defaults
// =============================================================================

#[test]
fn config_default_server() {
    let cfg = Config::default();
    assert_eq!(cfg.server.port, 8080);
    assert_eq!(cfg.server.bind, "0.0.0.0");
    assert_eq!(cfg.server.max_body_bytes, 65536);
}

#[test]
fn config_default_dirs() {
    let cfg = Config::default();
    assert_eq!(cfg.models.dir, PathBuf::from("models"));
    assert_eq!(cfg.pages.templates_dir, PathBuf::from("templates"));
    assert_eq!(cfg.pages.static_dir, PathBuf::from("static"));
}

#[test]
fn config_default_logging() {
    let cfg = Config::default();
    assert_eq!(cfg.logging.level, "info");
    assert_eq!(cfg.logging.format, "text");
}

// =============================================================================
// Config parsing
// =============================================================================

#[test]
fn config_yaml_full() {
    let yaml = r#"
server:
  port: 5000
  bind: "127.0.0.1"
  max_body_bytes: 1024
models:
  dir: /srv/models
pages:
  templates_dir: /srv/templates
  static_dir: /srv/static
  fallback_to_home: false
logging:
  level: debug
  format: json
"#;
    let cfg = Config::from_yaml(yaml).unwrap();
    assert_eq!(cfg.server.port, 5000);
    assert_eq!(cfg.server.bind, "127.0.0.1");
    assert_eq!(cfg.server.max_body_bytes, 1024);
    assert_eq!(cfg.models.dir, PathBuf::from("/srv/models"));
    assert_eq!(cfg.pages.templates_dir, PathBuf::from("/srv/templates"));
    assert_eq!(cfg.pages.static_dir, PathBuf::from("/srv/static"));
    assert!(!cfg.pages.fallback_to_home);
    assert_eq!(cfg.logging.level, "debug");
    assert_eq!(cfg.logging.format, "json");
}

#[test]
fn config_yaml_empty_is_default() {
    let cfg = Config::from_yaml("{}").unwrap();
    assert_eq!(cfg, Config::default());
}

#[test]
fn config_toml_partial() {
    let toml = r#"
[models]
dir = "artifacts"
"#;
    let cfg = Config::from_toml(toml).unwrap();
    assert_eq!(cfg.models.dir, PathBuf::from("artifacts"));
    assert_eq!(cfg.server.port, 8080);
}

#[test]
fn config_yaml_invalid() {
    let err = Config::from_yaml("server: [unclosed").unwrap_err();
    assert!(matches!(err, ConfigError::ParseError(_)));
}

#[test]
fn config_toml_wrong_type() {
    let err = Config::from_toml("[server]\nport = \"eighty\"").unwrap_err();
    assert!(err.to_string().contains("Failed to parse config"));
}

// =============================================================================
// Config file loading
// =============================================================================

#[test]
fn config_load_yaml_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reclaim.yaml");
    std::fs::write(&path, "server:\n  port: 7777\n").unwrap();
    let cfg = Config::load(&path).unwrap();
    assert_eq!(cfg.server.port, 7777);
}

#[test]
fn config_load_toml_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reclaim.toml");
    std::fs::write(&path, "[server]\nport = 5555\n").unwrap();
    let cfg = Config::load(&path).unwrap();
    assert_eq!(cfg.server.port, 5555);
}

#[test]
fn config_load_unknown_extension_tries_both() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reclaim.conf");
    std::fs::write(&path, "[pages]\nfallback_to_home = false\n").unwrap();
    let cfg = Config::load(&path).unwrap();
    assert!(!cfg.pages.fallback_to_home);
}

#[test]
fn config_load_missing_file() {
    let err = Config::load("/nonexistent/reclaim.yaml").unwrap_err();
    match err {
        ConfigError::IoError(path, _) => {
            assert_eq!(path, PathBuf::from("/nonexistent/reclaim.yaml"))
        }
        other => panic!("expected IoError, got {other:?}"),
    }
}

// =============================================================================
// Examples
// =============================================================================

#[test]
fn config_example_yaml_round_trips() {
    let cfg = Config::from_yaml(&Config::example_yaml()).unwrap();
    assert_eq!(cfg, Config::example());
}

#[test]
fn config_example_toml_round_trips() {
    let cfg = Config::from_toml(&Config::example_toml()).unwrap();
    assert_eq!(cfg, Config::example());
}
