//! Integration tests for configuration validation

#![allow(clippy::expect_used)]

use otp_protocol::config::{
    AdmissionPolicy, ServiceConfig, DEFAULT_BACKLOG, DEFAULT_MAX_CONNECTIONS, MAX_MESSAGE_SIZE,
};
use otp_protocol::core::codec::TRANSMISSION_UNIT;
use otp_protocol::error::ProtocolError;
use otp_protocol::{ServiceListener, ServiceRole};
use std::io::Write;
use std::time::Duration;
use tracing::Level;

#[test]
fn test_default_config_validates() {
    let config = ServiceConfig::default();
    let errors = config.validate();
    assert!(
        errors.is_empty(),
        "Default config should be valid, but got errors: {:?}",
        errors
    );
}

#[test]
fn test_defaults_match_deployed_services() {
    let config = ServiceConfig::default();
    assert_eq!(config.server.max_connections, DEFAULT_MAX_CONNECTIONS);
    assert_eq!(config.server.backlog, DEFAULT_BACKLOG);
    assert_eq!(config.server.admission_policy, AdmissionPolicy::Inclusive);
    assert_eq!(config.server.bind_address, "0.0.0.0");
    assert_eq!(config.server.io_timeout(), None);
    assert_eq!(config.transport.transmission_unit, TRANSMISSION_UNIT);
    assert_eq!(config.transport.max_message_size, MAX_MESSAGE_SIZE);
    assert_eq!(config.client.host, "localhost");
}

#[test]
fn test_admission_policies() {
    assert!(AdmissionPolicy::Inclusive.admits(5, 5));
    assert!(!AdmissionPolicy::Inclusive.admits(6, 5));
    assert!(AdmissionPolicy::Strict.admits(4, 5));
    assert!(!AdmissionPolicy::Strict.admits(5, 5));

    assert_eq!(AdmissionPolicy::Inclusive.effective_ceiling(5), 6);
    assert_eq!(AdmissionPolicy::Strict.effective_ceiling(5), 5);
}

#[test]
fn test_effective_ceiling_saturates() {
    assert_eq!(
        AdmissionPolicy::Inclusive.effective_ceiling(usize::MAX),
        usize::MAX
    );
    assert!(AdmissionPolicy::Inclusive.admits(usize::MAX, usize::MAX));
}

#[test]
fn test_bind_with_huge_limit_and_info_logging() {
    let config = ServiceConfig::default_with_overrides(|c| {
        c.server.bind_address = "127.0.0.1".into();
        c.server.max_connections = usize::MAX;
    });
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_test_writer()
        .finish();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_io()
        .build()
        .expect("runtime");
    let _guard = runtime.enter();

    let listener = tracing::subscriber::with_default(subscriber, || {
        ServiceListener::bind(ServiceRole::Encryption, 0, &config)
    })
    .expect("bind should succeed");
    assert_ne!(listener.local_addr().port(), 0);
}

#[test]
fn test_invalid_bind_address() {
    let mut config = ServiceConfig::default();
    config.server.bind_address = "invalid_address".to_string();

    let errors = config.validate();
    assert!(!errors.is_empty(), "Should have validation errors");
    assert!(errors
        .iter()
        .any(|e| e.contains("Invalid server bind address")));
}

#[test]
fn test_empty_bind_address() {
    let mut config = ServiceConfig::default();
    config.server.bind_address = String::new();

    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("cannot be empty")));
}

#[test]
fn test_zero_backlog() {
    let mut config = ServiceConfig::default();
    config.server.backlog = 0;

    let errors = config.validate();
    assert!(errors
        .iter()
        .any(|e| e.contains("Listen backlog must be greater than 0")));
}

#[test]
fn test_zero_limit_only_invalid_when_strict() {
    let mut config = ServiceConfig::default();
    config.server.max_connections = 0;
    assert!(config.validate().is_empty());

    config.server.admission_policy = AdmissionPolicy::Strict;
    let errors = config.validate();
    assert!(errors
        .iter()
        .any(|e| e.contains("Max connections must be greater than 0")));
}

#[test]
fn test_short_timeouts() {
    let mut config = ServiceConfig::default();
    config.client.connect_timeout = Duration::from_millis(50);
    config.server.io_timeout_ms = Some(1);

    let errors = config.validate();
    assert!(errors
        .iter()
        .any(|e| e.contains("Connection timeout too short")));
    assert!(errors.iter().any(|e| e.contains("I/O timeout too short")));
}

#[test]
fn test_long_shutdown_timeout() {
    let mut config = ServiceConfig::default();
    config.server.shutdown_timeout = Duration::from_secs(120);

    let errors = config.validate();
    assert!(errors
        .iter()
        .any(|e| e.contains("Shutdown timeout too long")));
}

#[test]
fn test_transport_limits() {
    let mut config = ServiceConfig::default();
    config.transport.transmission_unit = 1;
    config.transport.max_message_size = 0;

    let errors = config.validate();
    assert!(errors
        .iter()
        .any(|e| e.contains("Transmission unit too small")));
    assert!(errors
        .iter()
        .any(|e| e.contains("Max message size cannot be 0")));
}

#[test]
fn test_empty_client_host_and_app_name() {
    let mut config = ServiceConfig::default();
    config.client.host = String::new();
    config.logging.app_name = String::new();

    let errors = config.validate();
    assert!(errors
        .iter()
        .any(|e| e.contains("Client host cannot be empty")));
    assert!(errors
        .iter()
        .any(|e| e.contains("Application name cannot be empty")));
}

#[test]
fn test_multiple_errors_reported_together() {
    let mut config = ServiceConfig::default();
    config.server.bind_address = String::new();
    config.server.backlog = 0;
    config.transport.max_message_size = 0;

    let errors = config.validate();
    assert!(
        errors.len() >= 3,
        "Should report every problem: {:?}",
        errors
    );

    let err = config.validate_strict().expect_err("Should fail strict validation");
    assert!(matches!(err, ProtocolError::ConfigError(_)));
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn test_partial_toml_keeps_defaults() {
    let config = ServiceConfig::from_toml(
        r#"
        [server]
        max_connections = 2
        admission_policy = "strict"
        io_timeout_ms = 5000

        [logging]
        log_level = "debug"
        "#,
    )
    .expect("Partial config should parse");

    assert_eq!(config.server.max_connections, 2);
    assert_eq!(config.server.admission_policy, AdmissionPolicy::Strict);
    assert_eq!(config.server.io_timeout(), Some(Duration::from_secs(5)));
    assert_eq!(config.server.backlog, DEFAULT_BACKLOG);
    assert_eq!(config.logging.log_level, Level::DEBUG);
    assert_eq!(config.transport.transmission_unit, TRANSMISSION_UNIT);
}

#[test]
fn test_invalid_toml_is_a_config_error() {
    let err = ServiceConfig::from_toml("[server]\nadmission_policy = \"sometimes\"\n")
        .expect_err("Unknown policy should fail");
    assert!(matches!(err, ProtocolError::ConfigError(_)));
}

#[test]
fn test_example_config_round_trips() {
    let example = ServiceConfig::example_config();
    let parsed = ServiceConfig::from_toml(&example).expect("Example config should parse");
    assert!(parsed.validate().is_empty());
    assert_eq!(
        parsed.server.shutdown_timeout,
        ServiceConfig::default().server.shutdown_timeout
    );
}

#[test]
fn test_from_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "[client]\nhost = \"127.0.0.1\"\n")
        .expect("write config");

    let config = ServiceConfig::from_file(file.path()).expect("Config file should load");
    assert_eq!(config.client.host, "127.0.0.1");

    let err = ServiceConfig::from_file("/no/such/config.toml").expect_err("Missing file");
    assert!(matches!(err, ProtocolError::ConfigError(_)));
}

#[test]
fn test_from_env_overrides() {
    std::env::set_var("OTP_PROTOCOL_MAX_CONNECTIONS", "9");
    std::env::set_var("OTP_PROTOCOL_ADMISSION_POLICY", "STRICT");
    std::env::set_var("OTP_PROTOCOL_IO_TIMEOUT_MS", "250");
    std::env::set_var("OTP_PROTOCOL_HOST", "127.0.0.1");

    let config = ServiceConfig::from_env().expect("Env config should load");

    std::env::remove_var("OTP_PROTOCOL_MAX_CONNECTIONS");
    std::env::remove_var("OTP_PROTOCOL_ADMISSION_POLICY");
    std::env::remove_var("OTP_PROTOCOL_IO_TIMEOUT_MS");
    std::env::remove_var("OTP_PROTOCOL_HOST");

    assert_eq!(config.server.max_connections, 9);
    assert_eq!(config.server.admission_policy, AdmissionPolicy::Strict);
    assert_eq!(config.server.io_timeout(), Some(Duration::from_millis(250)));
    assert_eq!(config.client.io_timeout(), Some(Duration::from_millis(250)));
    assert_eq!(config.client.host, "127.0.0.1");
}
