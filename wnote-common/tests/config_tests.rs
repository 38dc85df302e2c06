//! Configuration resolution tests
//!
//! Priority order: overrides (CLI/env) > TOML file > compiled defaults.

use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;
use wnote_common::config::{
    ConfigOverrides, ServiceConfig, TomlConfig, DEFAULT_BIND_ADDR, DEFAULT_DATABASE_URL,
    DEFAULT_OUTBOUND_QUEUE, DEFAULT_SEND_TIMEOUT_MS,
};
use wnote_common::Error;

#[test]
fn test_defaults_when_nothing_configured() {
    let config = ServiceConfig::resolve(ConfigOverrides::default(), TomlConfig::default()).unwrap();

    assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
    assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
    assert_eq!(config.send_timeout, Duration::from_millis(DEFAULT_SEND_TIMEOUT_MS));
    assert_eq!(config.outbound_queue, DEFAULT_OUTBOUND_QUEUE);
    assert!(config.gemini_api_key.is_none());

    // No secret configured: one is generated for this run
    assert!(config.secret_generated);
    assert_eq!(config.secret_key.expose().len(), 64);
}

#[test]
fn test_toml_values_override_defaults() {
    let file = TomlConfig::parse(
        r#"
        bind_addr = "0.0.0.0:9000"
        database_url = "sqlite::memory:"
        secret_key = "from-file"
        send_timeout_ms = 500
        outbound_queue = 8
        gemini_api_key = "file-key"
        "#,
    )
    .unwrap();

    let config = ServiceConfig::resolve(ConfigOverrides::default(), file).unwrap();

    assert_eq!(config.bind_addr.to_string(), "0.0.0.0:9000");
    assert_eq!(config.database_url, "sqlite::memory:");
    assert_eq!(config.secret_key.expose(), "from-file");
    assert!(!config.secret_generated);
    assert_eq!(config.send_timeout, Duration::from_millis(500));
    assert_eq!(config.outbound_queue, 8);
    assert_eq!(config.gemini_api_key.unwrap().expose(), "file-key");
}

#[test]
fn test_overrides_beat_toml() {
    let file = TomlConfig::parse(
        r#"
        bind_addr = "0.0.0.0:9000"
        secret_key = "from-file"
        "#,
    )
    .unwrap();
    let overrides = ConfigOverrides {
        bind_addr: Some("127.0.0.1:7000".to_string()),
        secret_key: Some("from-cli".to_string()),
        ..Default::default()
    };

    let config = ServiceConfig::resolve(overrides, file).unwrap();

    assert_eq!(config.bind_addr.to_string(), "127.0.0.1:7000");
    assert_eq!(config.secret_key.expose(), "from-cli");
}

#[test]
fn test_empty_secret_treated_as_missing() {
    let overrides = ConfigOverrides {
        secret_key: Some(String::new()),
        ..Default::default()
    };

    let config = ServiceConfig::resolve(overrides, TomlConfig::default()).unwrap();
    assert!(config.secret_generated);
}

#[test]
fn test_invalid_values_rejected() {
    let bad_addr = ConfigOverrides {
        bind_addr: Some("not an address".to_string()),
        ..Default::default()
    };
    assert!(matches!(
        ServiceConfig::resolve(bad_addr, TomlConfig::default()),
        Err(Error::Config(_))
    ));

    let zero_queue = ConfigOverrides {
        outbound_queue: Some(0),
        ..Default::default()
    };
    assert!(matches!(
        ServiceConfig::resolve(zero_queue, TomlConfig::default()),
        Err(Error::Config(_))
    ));

    let zero_timeout = ConfigOverrides {
        send_timeout_ms: Some(0),
        ..Default::default()
    };
    assert!(matches!(
        ServiceConfig::resolve(zero_timeout, TomlConfig::default()),
        Err(Error::Config(_))
    ));
}

#[test]
fn test_load_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "bind_addr = \"127.0.0.1:8123\"").unwrap();
    writeln!(file, "outbound_queue = 4").unwrap();

    let loaded = TomlConfig::load_or_default(Some(file.path())).unwrap();

    assert_eq!(loaded.bind_addr.as_deref(), Some("127.0.0.1:8123"));
    assert_eq!(loaded.outbound_queue, Some(4));
}

#[test]
fn test_explicit_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");

    assert!(matches!(
        TomlConfig::load_or_default(Some(&missing)),
        Err(Error::Config(_))
    ));
}

#[test]
fn test_unknown_keys_rejected() {
    assert!(TomlConfig::parse("root_folder = \"/music\"").is_err());
}
