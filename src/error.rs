//! Error types for the correlation middleware and the `correlid` host.
//!
//! [`CorrelationError`] covers setup and per-request failures of the
//! middleware itself. [`CorrelidError`] is the host's error enum, and
//! [`ValidationError`] describes a single problem found in an options file.
//! All use `thiserror` for `Display` and `Error` derives.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CorrelationError {
    #[error("A header must be provided.")]
    EmptyHeader,

    #[error(
        "No correlation id provider has been registered. Register one with \
         'CorrelationIdBuilder::with_uuid_provider', 'with_trace_id_provider' or \
         'with_custom_provider', or set a generator function on the options."
    )]
    MissingProvider,

    #[error("A provider has already been registered. Only a single provider may be registered.")]
    DuplicateProvider,

    #[error("Invalid header name '{name}' for {field}")]
    InvalidHeaderName {
        field: &'static str,
        name: String,
        #[source]
        source: http::header::InvalidHeaderName,
    },
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "  {}: {}", self.field, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " ({suggestion})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

fn format_errors(errors: &[ValidationError]) -> String {
    use std::fmt::Write;
    let mut buf = String::new();
    for (i, e) in errors.iter().enumerate() {
        if i > 0 {
            buf.push('\n');
        }
        // write! to String is infallible (only fails on OOM which is unrecoverable)
        let _ = write!(buf, "{e}");
    }
    buf
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CorrelidError {
    #[error("Config file not found: {}", path.display())]
    ConfigFileNotFound { path: PathBuf },

    #[error("Config parse error in {path}:\n  {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Config validation failed:\n{}", format_errors(.errors))]
    ConfigValidation { errors: Vec<ValidationError> },

    #[error("Unsupported config format: '{0}'")]
    UnsupportedFormat(String),

    #[error("Invalid address: {0}")]
    AddressParse(#[from] std::net::AddrParseError),

    #[error("Invalid upstream URL '{url}': {source}")]
    InvalidUpstream {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error(transparent)]
    Correlation(#[from] CorrelationError),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_listed_one_per_line() {
        let err = CorrelidError::ConfigValidation {
            errors: vec![
                ValidationError {
                    field: "correlation.request_header".into(),
                    message: "header name cannot be empty".into(),
                    suggestion: Some("use 'X-Correlation-ID'".into()),
                },
                ValidationError {
                    field: "correlation.logging_scope_key".into(),
                    message: "key cannot be empty".into(),
                    suggestion: None,
                },
            ],
        };

        let rendered = err.to_string();
        assert!(rendered.starts_with("Config validation failed:\n"));
        assert!(rendered.contains(
            "  correlation.request_header: header name cannot be empty (use 'X-Correlation-ID')"
        ));
        assert!(rendered.ends_with("  correlation.logging_scope_key: key cannot be empty"));
    }

    #[test]
    fn empty_header_message_matches_context_validation() {
        assert_eq!(
            CorrelationError::EmptyHeader.to_string(),
            "A header must be provided."
        );
    }
}
