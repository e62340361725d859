use bematech_usb::config::{Config, Error};
use bematech_usb::printer::{RetryPolicy, Settings};

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use tempfile::NamedTempFile;

#[test]
fn defaults_target_the_cdc_printer() {
    let config = Config::default();

    assert_eq!(config.product_id, 3);
    assert_eq!(config.log.level, "info");
    assert_eq!(config.log.file, None);
    assert_eq!(config.session.transfer_timeout(), Duration::from_millis(5000));
    assert_eq!(config.session.interrupt_timeout(), Duration::from_millis(5000));
    assert_eq!(config.session.settle_delay(), None);
    assert_eq!(
        config.session.claim_retry,
        RetryPolicy {
            max_attempts: 50,
            backoff_ms: 100
        }
    );
}

#[test]
fn empty_file_gives_the_defaults() {
    assert_eq!(Config::parse("").unwrap(), Config::default());
}

#[test]
fn full_file_is_parsed() {
    let config = Config::parse(
        r#"
            product_id = 1

            [session]
            transfer_timeout_ms = 2000
            interrupt_timeout_ms = 500
            settle_delay_ms = 3000

            [session.claim_retry]
            max_attempts = 10
            backoff_ms = 250

            [log]
            level = "bematech_usb=debug"
            file = "/var/log/bematech-usb.log"
        "#,
    )
    .unwrap();

    assert_eq!(config.product_id, 1);
    assert_eq!(
        config.session,
        Settings {
            transfer_timeout_ms: 2000,
            interrupt_timeout_ms: 500,
            settle_delay_ms: Some(3000),
            claim_retry: RetryPolicy {
                max_attempts: 10,
                backoff_ms: 250
            },
        }
    );
    assert_eq!(config.log.level, "bematech_usb=debug");
    assert_eq!(
        config.log.file,
        Some(PathBuf::from("/var/log/bematech-usb.log"))
    );
}

#[test]
fn partial_file_keeps_the_other_defaults() {
    let config = Config::parse(
        r#"
            [session.claim_retry]
            max_attempts = 3
        "#,
    )
    .unwrap();

    assert_eq!(config.product_id, 3);
    assert_eq!(config.session.claim_retry.max_attempts, 3);
    assert_eq!(config.session.claim_retry.backoff_ms, 100);
    assert_eq!(config.session.transfer_timeout_ms, 5000);
}

#[test]
fn config_is_loaded_from_a_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "product_id = 0x0001").unwrap();

    let config = Config::load_or_default(Some(file.path())).unwrap();

    assert_eq!(config.product_id, 1);
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.toml");

    match Config::load(&path) {
        Err(Error::Io { path: err_path, .. }) => assert_eq!(err_path, path),
        other => panic!("expected an I/O error, got {:?}", other),
    }
}

#[test]
fn invalid_file_is_an_error() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "product_id = \"three\"").unwrap();

    assert!(matches!(
        Config::load(file.path()),
        Err(Error::Parse { .. })
    ));
}
