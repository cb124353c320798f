//! Integration tests for loading connection settings from disk

use p4gate_config::ConnectionConfig;
use std::path::PathBuf;

#[test]
fn test_load_from_file() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[connection]
port = "ssl:perforce.example.com:1666"
user = "artist"
client = "artist-ws"
binary = "/opt/perforce/bin/p4"
overrideConnection = true
maxBatchLength = 512
"#,
    )
    .unwrap();

    let config = ConnectionConfig::load(&path).unwrap();

    assert_eq!(config.user.as_deref(), Some("artist"));
    assert_eq!(config.binary, Some(PathBuf::from("/opt/perforce/bin/p4")));
    assert_eq!(config.max_batch_length, 512);
    assert_eq!(config.timeout_secs, 15);
    assert!(config.override_connection);
}

#[test]
fn test_explicit_path_wins_over_default_location() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("custom.toml");
    std::fs::write(&path, "[connection]\nclient = \"custom-ws\"\n").unwrap();

    let config = ConnectionConfig::load_or_default(Some(&path)).unwrap();

    assert_eq!(config.client.as_deref(), Some("custom-ws"));
}

#[test]
fn test_invalid_toml_reports_file_name() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("broken.toml");
    std::fs::write(&path, "[connection\nport = ").unwrap();

    let err = ConnectionConfig::load(&path).unwrap_err();

    assert!(err.to_string().contains("broken.toml"), "{err}");
}
