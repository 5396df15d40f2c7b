// ==== tests/unit/config_tests.rs ====
//! Settings loaded from files on disk.

use std::io::Write;

use authd_backend_lib::config::{Settings, StorageBackend};
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("Failed to create temp config");
    file.write_all(contents.as_bytes())
        .expect("Failed to write temp config");
    file
}

#[test]
fn test_default_settings() {
    let settings = Settings::default();
    assert_eq!(settings.bind_addr.port(), 50051);
    assert_eq!(settings.jwt.access_ttl_minutes, 15);
    assert_eq!(settings.jwt.refresh_ttl_days, 30);
    assert_eq!(settings.password.min_length, 6);
    assert_eq!(settings.password.max_length, 128);
    assert_eq!(settings.storage.backend, StorageBackend::Memory);
    // No secret is shipped, so defaults alone never validate.
    assert!(settings.validate().is_err());
}

#[test]
fn test_load_from_file() {
    let file = write_config(
        r#"
        log_level = "debug"

        [jwt]
        secret = "file-secret-file-secret-file-secret!"
        access_ttl_minutes = 5

        [storage]
        backend = "flat_file"
        path = "/var/lib/authd"

        [password]
        hash_cost = 15
        "#,
    );

    let settings = Settings::load_from(file.path()).expect("config should load");
    assert_eq!(settings.log_level, "debug");
    assert_eq!(settings.jwt.access_ttl_minutes, 5);
    assert_eq!(settings.jwt.refresh_ttl_days, 30);
    assert_eq!(settings.storage.backend, StorageBackend::FlatFile);
    assert_eq!(settings.storage.path.to_str(), Some("/var/lib/authd"));
    assert_eq!(settings.password.hash_cost, 15);
}

#[test]
fn test_load_from_file_rejects_invalid_values() {
    let file = write_config(
        r#"
        [jwt]
        secret = "short"
        "#,
    );
    assert!(Settings::load_from(file.path()).is_err());

    let file = write_config(
        r#"
        [jwt]
        secret = "file-secret-file-secret-file-secret!"

        [password]
        hash_cost = 40
        "#,
    );
    assert!(Settings::load_from(file.path()).is_err());
}

#[test]
fn test_shared_test_settings_are_valid() {
    assert!(crate::test_utils::test_settings().validate().is_ok());
}

#[test]
fn test_low_hash_cost_rejected() {
    let file = write_config(
        r#"
        [jwt]
        secret = "file-secret-file-secret-file-secret!"

        [password]
        hash_cost = 4
        "#,
    );
    assert!(Settings::load_from(file.path()).is_err());
}

#[test]
fn test_secret_not_printed() {
    let file = write_config(
        r#"
        [jwt]
        secret = "file-secret-file-secret-file-secret!"
        "#,
    );
    let settings = Settings::load_from(file.path()).expect("config should load");
    let debug = format!("{settings:?}");
    assert!(!debug.contains("file-secret"));
}
