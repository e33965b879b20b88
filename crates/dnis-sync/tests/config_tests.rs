use dnis_sync::{ConfigError, SyncConfig};
use std::io::Write;
use std::time::Duration;

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "max_dnis_per_request = 25\ninter_chunk_delay_ms = 500\n\n[validation]\nmax_attempts = 5"
    )
    .unwrap();

    let config = SyncConfig::load(file.path()).unwrap();

    assert_eq!(config.max_dnis_per_request, 25);
    assert_eq!(config.inter_chunk_delay(), Duration::from_millis(500));
    assert_eq!(config.validation.max_attempts, 5);
    assert_eq!(config.validation.retry_delay_ms, 3_000);
}

#[test]
fn test_missing_keys_take_defaults() {
    let file = tempfile::NamedTempFile::new().unwrap();

    let config = SyncConfig::load(file.path()).unwrap();

    assert_eq!(config, SyncConfig::default());
}

#[test]
fn test_zero_chunk_size_fails_validation() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "max_dnis_per_request = 0").unwrap();

    let err = SyncConfig::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = SyncConfig::load(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}
