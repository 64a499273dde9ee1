//! Configuration validation with detailed error reporting.
//!
//! The [`validate`] function checks a parsed [`Config`] for problems
//! that serde can't catch: empty or malformed header names and a logging
//! scope without a key. Returns every problem found, each with a
//! suggestion where one helps.

use http::HeaderName;

use super::model::{Config, ProviderKind};
use crate::error::ValidationError;

/// Validate a header name. Returns `Ok(())` or a human-readable error.
pub fn validate_header_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("header name cannot be empty".into());
    }
    HeaderName::from_bytes(name.as_bytes())
        .map(|_| ())
        .map_err(|_| format!("'{name}' is not a valid HTTP header name"))
}

fn header_suggestion(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if !trimmed.is_empty() && trimmed != name && validate_header_name(trimmed).is_ok() {
        return Some(format!("did you mean '{trimmed}'?"));
    }
    if name.contains(' ') {
        let dashed = name.trim().replace(' ', "-");
        if validate_header_name(&dashed).is_ok() {
            return Some(format!("did you mean '{dashed}'?"));
        }
    }
    None
}

pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let options = &config.correlation;

    if let Err(message) = validate_header_name(&options.request_header) {
        errors.push(ValidationError {
            field: "correlation.request_header".into(),
            message,
            suggestion: header_suggestion(&options.request_header),
        });
    }

    if let Some(ref response_header) = options.response_header {
        if let Err(message) = validate_header_name(response_header) {
            let suggestion = if response_header.is_empty() {
                Some("remove the field to reuse request_header".into())
            } else {
                header_suggestion(response_header)
            };
            errors.push(ValidationError {
                field: "correlation.response_header".into(),
                message,
                suggestion,
            });
        }
    }

    if options.add_to_logging_scope && options.logging_scope_key.is_empty() {
        errors.push(ValidationError {
            field: "correlation.logging_scope_key".into(),
            message: "key cannot be empty when add_to_logging_scope is enabled".into(),
            suggestion: Some("use 'CorrelationId'".into()),
        });
    }

    if config.forwarding.mirror_response && !options.include_in_response {
        errors.push(ValidationError {
            field: "forwarding.mirror_response".into(),
            message: "has no effect while correlation.include_in_response is false".into(),
            suggestion: None,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Format a summary for valid configs: the effective header names and
/// the policy switches that differ from the defaults.
#[must_use]
pub fn format_validation_report(path: &str, config: &Config) -> String {
    let options = &config.correlation;
    let provider = match config.provider {
        ProviderKind::Uuid => "uuid",
        ProviderKind::TraceId => "trace-id",
        ProviderKind::None => "none",
    };

    let mut switches = Vec::new();
    if options.enforce_header {
        switches.push("enforce_header");
    }
    if options.ignore_request_header {
        switches.push("ignore_request_header");
    }
    if options.update_trace_id {
        switches.push("update_trace_id");
    }
    if options.add_to_logging_scope {
        switches.push("add_to_logging_scope");
    }
    if !options.include_in_response {
        switches.push("no response header");
    }
    if config.forwarding.mirror_response {
        switches.push("mirror_response");
    }

    let mut report = format!(
        "{path} is valid\n  request header: {}\n  response header: {}\n  provider: {provider}",
        options.request_header,
        options.response_header(),
    );
    if !switches.is_empty() {
        report.push_str("\n  enabled: ");
        report.push_str(&switches.join(", "));
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::ForwardingConfig;
    use crate::options::CorrelationIdOptions;

    fn config_with(correlation: CorrelationIdOptions) -> Config {
        Config {
            correlation,
            ..Config::default()
        }
    }

    #[test]
    fn defaults_are_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn empty_request_header_fails() {
        let config = config_with(CorrelationIdOptions {
            request_header: String::new(),
            ..CorrelationIdOptions::default()
        });
        let errors = validate(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("cannot be empty"));
    }

    #[test]
    fn header_with_space_suggests_dashes() {
        let config = config_with(CorrelationIdOptions {
            request_header: "X Correlation ID".into(),
            ..CorrelationIdOptions::default()
        });
        let errors = validate(&config).unwrap_err();
        assert_eq!(
            errors[0].suggestion.as_deref(),
            Some("did you mean 'X-Correlation-ID'?")
        );
    }

    #[test]
    fn empty_response_header_suggests_removal() {
        let config = config_with(CorrelationIdOptions {
            response_header: Some(String::new()),
            ..CorrelationIdOptions::default()
        });
        let errors = validate(&config).unwrap_err();
        assert_eq!(errors[0].field, "correlation.response_header");
        assert!(errors[0]
            .suggestion
            .as_deref()
            .is_some_and(|s| s.contains("remove the field")));
    }

    #[test]
    fn logging_scope_needs_a_key() {
        let config = config_with(CorrelationIdOptions {
            add_to_logging_scope: true,
            logging_scope_key: String::new(),
            ..CorrelationIdOptions::default()
        });
        let errors = validate(&config).unwrap_err();
        assert_eq!(errors[0].field, "correlation.logging_scope_key");
    }

    #[test]
    fn empty_scope_key_is_fine_when_scope_is_off() {
        let config = config_with(CorrelationIdOptions {
            logging_scope_key: String::new(),
            ..CorrelationIdOptions::default()
        });
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn mirroring_without_response_header_fails() {
        let config = Config {
            correlation: CorrelationIdOptions {
                include_in_response: false,
                ..CorrelationIdOptions::default()
            },
            forwarding: ForwardingConfig {
                mirror_response: true,
            },
            ..Config::default()
        };
        let errors = validate(&config).unwrap_err();
        assert_eq!(errors[0].field, "forwarding.mirror_response");
    }

    #[test]
    fn report_lists_enabled_switches() {
        let config = config_with(CorrelationIdOptions {
            enforce_header: true,
            response_header: Some("X-Response-ID".into()),
            ..CorrelationIdOptions::default()
        });
        let report = format_validation_report("correlid.yaml", &config);
        assert!(report.contains("response header: X-Response-ID"));
        assert!(report.contains("enabled: enforce_header"));
    }
}
