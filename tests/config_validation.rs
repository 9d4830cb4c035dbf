//! Integration tests for configuration validation

#![allow(clippy::expect_used, clippy::unwrap_used)]

use paramserv_rpc::config::{
    CodecConfig, LoggingConfig, RpcConfig, DEFAULT_MAX_FRAME_SIZE, MAX_MESSAGE_SIZE,
};
use paramserv_rpc::core::codec::RpcCodec;
use paramserv_rpc::core::data::NamedCollection;
use paramserv_rpc::error::RpcError;
use tracing::Level;

#[test]
fn test_default_config_validates() {
    let config = RpcConfig::default();
    let errors = config.validate();
    assert!(
        errors.is_empty(),
        "Default config should be valid, but got errors: {:?}",
        errors
    );
    assert_eq!(config.codec.max_frame_size, DEFAULT_MAX_FRAME_SIZE);
}

#[test]
fn test_frame_size_may_reach_protocol_limit() {
    let config = CodecConfig {
        max_frame_size: MAX_MESSAGE_SIZE,
    };
    assert!(config.validate().is_empty());
    assert!(DEFAULT_MAX_FRAME_SIZE < MAX_MESSAGE_SIZE);
}

#[test]
fn test_zero_frame_size() {
    let mut config = RpcConfig::default();
    config.codec.max_frame_size = 0;

    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("cannot be 0")));
}

#[test]
fn test_frame_size_above_protocol_limit() {
    let config = CodecConfig {
        max_frame_size: MAX_MESSAGE_SIZE + 1,
    };
    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("too large")));
}

#[test]
fn test_empty_app_name() {
    let mut config = RpcConfig::default();
    config.logging.app_name = String::new();

    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("Application name cannot be empty")));
}

#[test]
fn test_file_logging_requires_path() {
    let config = LoggingConfig {
        log_to_file: true,
        log_file_path: None,
        ..LoggingConfig::default()
    };
    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("log_file_path must be specified")));
}

#[test]
fn test_missing_log_directory() {
    let config = LoggingConfig {
        log_to_file: true,
        log_file_path: Some("/nonexistent/paramserv/rpc.log".into()),
        ..LoggingConfig::default()
    };
    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("does not exist")));
}

#[test]
fn test_no_logging_output() {
    let config = LoggingConfig {
        log_to_console: false,
        log_to_file: false,
        ..LoggingConfig::default()
    };
    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("At least one logging output")));
}

#[test]
fn test_multiple_errors_reported_together() {
    let config = RpcConfig::default_with_overrides(|c| {
        c.codec.max_frame_size = 0;
        c.logging.app_name = String::new();
    });

    assert_eq!(config.validate().len(), 2);
    match config.validate_strict() {
        Err(RpcError::ConfigError(msg)) => {
            assert!(msg.contains("Max frame size"));
            assert!(msg.contains("Application name"));
        }
        other => panic!("Expected config error, got {other:?}"),
    }
}

#[test]
fn test_toml_parsing() {
    let toml = r#"
        [codec]
        max_frame_size = 1048576

        [logging]
        app_name = "ps-worker"
        log_level = "debug"
        log_to_console = true
        log_to_file = false
        json_format = true
    "#;

    let config = RpcConfig::from_toml(toml).expect("valid toml");
    assert_eq!(config.codec.max_frame_size, 1_048_576);
    assert_eq!(config.logging.app_name, "ps-worker");
    assert_eq!(config.logging.log_level, Level::DEBUG);
    assert!(config.logging.json_format);
    config.validate_strict().expect("valid config");

    let codec = RpcCodec::<NamedCollection>::from_config(&config.codec);
    assert_eq!(codec.max_frame_size(), 1_048_576);
}

#[test]
fn test_missing_sections_use_defaults() {
    let config = RpcConfig::from_toml("").expect("empty toml");
    assert_eq!(config.codec.max_frame_size, DEFAULT_MAX_FRAME_SIZE);
    assert_eq!(config.logging.app_name, "paramserv-rpc");
}

#[test]
fn test_invalid_toml_rejected() {
    assert!(matches!(
        RpcConfig::from_toml("[logging]\nlog_level = \"loud\"\napp_name = \"x\"\nlog_to_console = true\nlog_to_file = false\njson_format = false"),
        Err(RpcError::ConfigError(_))
    ));
    assert!(matches!(
        RpcConfig::from_toml("[codec]\nmax_frame_size = \"big\""),
        Err(RpcError::ConfigError(_))
    ));
}

#[test]
fn test_example_config_parses_back() {
    let example = RpcConfig::example_config();
    let parsed = RpcConfig::from_toml(&example).expect("example config parses");
    assert!(parsed.validate().is_empty());
}

#[test]
fn test_save_and_load_file() {
    let path = std::env::temp_dir().join(format!("paramserv-rpc-{}.toml", std::process::id()));
    let config = RpcConfig::default_with_overrides(|c| c.codec.max_frame_size = 4096);

    config.save_to_file(&path).expect("save");
    let loaded = RpcConfig::from_file(&path).expect("load");
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded.codec.max_frame_size, 4096);
    assert_eq!(loaded.logging.app_name, config.logging.app_name);
}

#[test]
fn test_missing_file() {
    assert!(matches!(
        RpcConfig::from_file("/nonexistent/paramserv-rpc.toml"),
        Err(RpcError::ConfigError(_))
    ));
}

#[test]
fn test_env_overrides() {
    // only this test touches these variables
    std::env::set_var("PARAMSERV_RPC_MAX_FRAME_SIZE", "65536");
    std::env::set_var("PARAMSERV_RPC_LOG_LEVEL", "warn");
    let config = RpcConfig::from_env();

    std::env::set_var("PARAMSERV_RPC_MAX_FRAME_SIZE", "lots");
    let bad = RpcConfig::from_env();

    std::env::remove_var("PARAMSERV_RPC_MAX_FRAME_SIZE");
    std::env::remove_var("PARAMSERV_RPC_LOG_LEVEL");

    let config = config.expect("valid env");
    assert_eq!(config.codec.max_frame_size, 65536);
    assert_eq!(config.logging.log_level, Level::WARN);
    assert!(matches!(bad, Err(RpcError::ConfigError(_))));
}
