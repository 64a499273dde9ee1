//! Integration tests for options-file loading across all file formats.

use std::path::PathBuf;

use correlation_id::config::model::{Config, ProviderKind};
use correlation_id::config::sources::{self, parse_config_str};
use correlation_id::config::validation::validate;
use correlation_id::config::ConfigSource;
use correlation_id::error::CorrelidError;
use correlation_id::logging::LogLevel;

fn load_example(name: &str) -> String {
    let path = format!("example/{name}");
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("failed to read {path}: {e}"))
}

#[test]
fn yaml_example_loads_and_validates() {
    let content = load_example("correlid.yaml");
    let config = parse_config_str("yaml", &content, "correlid.yaml").unwrap();
    validate(&config).unwrap();
    assert!(config.correlation.add_to_logging_scope);
    assert_eq!(config.provider, ProviderKind::Uuid);
}

#[test]
fn yaml_full_example_loads_and_validates() {
    let content = load_example("full.yaml");
    let config = parse_config_str("yaml", &content, "full.yaml").unwrap();
    validate(&config).unwrap();
    assert!(config.correlation.update_trace_id);
    assert_eq!(config.correlation.log_levels.missing_header, LogLevel::Warn);
    assert_eq!(config.provider, ProviderKind::TraceId);
    assert!(config.forwarding.mirror_response);
}

#[cfg(feature = "json")]
#[test]
fn json_example_loads_and_validates() {
    let content = load_example("correlid.json");
    let config = parse_config_str("json", &content, "correlid.json").unwrap();
    validate(&config).unwrap();
    assert!(config.correlation.add_to_logging_scope);
}

#[cfg(feature = "toml")]
#[test]
fn toml_example_loads_and_validates() {
    let content = load_example("correlid.toml");
    let config = parse_config_str("toml", &content, "correlid.toml").unwrap();
    validate(&config).unwrap();
    assert!(config.correlation.add_to_logging_scope);
}

#[cfg(all(feature = "json", feature = "toml"))]
#[test]
fn all_formats_produce_equivalent_configs() {
    let yaml_config = parse_config_str("yaml", &load_example("correlid.yaml"), "yaml").unwrap();
    let json_config = parse_config_str("json", &load_example("correlid.json"), "json").unwrap();
    let toml_config = parse_config_str("toml", &load_example("correlid.toml"), "toml").unwrap();

    for config in [&json_config, &toml_config] {
        assert_eq!(
            config.correlation.request_header,
            yaml_config.correlation.request_header
        );
        assert_eq!(
            config.correlation.add_to_logging_scope,
            yaml_config.correlation.add_to_logging_scope
        );
        assert_eq!(config.provider, yaml_config.provider);
    }
}

#[test]
fn unsupported_format_returns_error() {
    let result = parse_config_str("xml", "{}", "test.xml");
    assert!(matches!(result, Err(CorrelidError::UnsupportedFormat(_))));
}

#[test]
fn unknown_option_is_a_parse_error() {
    let result = parse_config_str("yaml", "correlation:\n  header: X-Id\n", "typo.yaml");
    assert!(matches!(result, Err(CorrelidError::ConfigParse { .. })));
}

#[test]
fn invalid_header_fails_validation() {
    let config: Config =
        serde_json::from_str(r#"{"correlation": {"request_header": ""}}"#).unwrap();
    let errors = validate(&config).unwrap_err();
    assert_eq!(errors[0].field, "correlation.request_header");
}

#[tokio::test]
async fn file_source_loads_and_builds_layers() {
    let source = sources::for_path(PathBuf::from("example/full.yaml")).unwrap();
    assert_eq!(source.name(), "yaml");

    let config = correlation_id::config::load(Some(source.as_ref())).await.unwrap();
    let layer = config.correlation_layer().unwrap();
    assert_eq!(layer.request_header().as_str(), "x-correlation-id");
    assert!(config.forwarding_layer().is_ok());
}

#[tokio::test]
async fn file_source_reports_missing_file() {
    let source = sources::for_path(PathBuf::from("example/does-not-exist.yaml")).unwrap();
    let result = source.load().await;
    assert!(matches!(
        result,
        Err(CorrelidError::ConfigFileNotFound { .. })
    ));
}

#[tokio::test]
async fn file_source_rejects_invalid_options() {
    let path = std::env::temp_dir().join(format!("correlid-invalid-{}.yaml", std::process::id()));
    std::fs::write(
        &path,
        "correlation:\n  add_to_logging_scope: true\n  logging_scope_key: ''\n",
    )
    .unwrap();

    let source = sources::for_path(path.clone()).unwrap();
    let result = source.load().await;
    std::fs::remove_file(&path).unwrap();

    let Err(CorrelidError::ConfigValidation { errors }) = result else {
        panic!("expected a validation error");
    };
    assert_eq!(errors[0].field, "correlation.logging_scope_key");
}

#[tokio::test]
async fn no_source_means_defaults() {
    let config = correlation_id::config::load(None).await.unwrap();
    assert_eq!(config.correlation.request_header, "X-Correlation-ID");
    assert_eq!(config.provider, ProviderKind::Uuid);
}
