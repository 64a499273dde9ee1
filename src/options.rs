//! [`CorrelationIdOptions`]: how the middleware reads, generates, and
//! writes correlation ids.
//!
//! Options are plain serde data with defaults for every field, so a host
//! can deserialize them from any config format. The generator override is
//! code, not data, and is only settable programmatically.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::logging::LogLevel;

pub const DEFAULT_HEADER: &str = "X-Correlation-ID";
pub const DEFAULT_LOGGING_SCOPE_KEY: &str = "CorrelationId";

/// Generator override. Takes no request context.
pub type IdGenerator = Arc<dyn Fn() -> String + Send + Sync>;

fn default_header() -> String {
    DEFAULT_HEADER.to_string()
}

fn default_logging_scope_key() -> String {
    DEFAULT_LOGGING_SCOPE_KEY.to_string()
}

const fn default_true() -> bool {
    true
}

const fn default_info() -> LogLevel {
    LogLevel::Info
}

fn is_default_header(v: &str) -> bool {
    v == DEFAULT_HEADER
}

fn is_default_logging_scope_key(v: &str) -> bool {
    v == DEFAULT_LOGGING_SCOPE_KEY
}

fn is_true(v: &bool) -> bool {
    *v
}

fn is_false(v: &bool) -> bool {
    !*v
}

#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CorrelationIdOptions {
    /// Header the correlation id is read from.
    #[serde(default = "default_header", skip_serializing_if = "is_default_header")]
    pub request_header: String,

    /// Header the correlation id is written to; `request_header` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_header: Option<String>,

    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub include_in_response: bool,

    /// Reject requests without the header with a `400`.
    #[serde(default, skip_serializing_if = "is_false")]
    pub enforce_header: bool,

    /// Always generate a new id, even when the request carries one.
    #[serde(default, skip_serializing_if = "is_false")]
    pub ignore_request_header: bool,

    /// Overwrite the request's trace identifier (`RequestId`) with the
    /// correlation id.
    #[serde(default, skip_serializing_if = "is_false")]
    pub update_trace_id: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub add_to_logging_scope: bool,

    /// Name of the logging scope. `tracing` field names are static, so this
    /// is recorded as the `scope_key` field of the `correlation_scope` span,
    /// next to `correlation_id`, rather than used as the field name.
    #[serde(
        default = "default_logging_scope_key",
        skip_serializing_if = "is_default_logging_scope_key"
    )]
    pub logging_scope_key: String,

    #[serde(default, skip_serializing_if = "LogLevelOptions::is_default")]
    pub log_levels: LogLevelOptions,

    #[serde(skip)]
    pub generator: Option<IdGenerator>,
}

impl Default for CorrelationIdOptions {
    fn default() -> Self {
        Self {
            request_header: default_header(),
            response_header: None,
            include_in_response: true,
            enforce_header: false,
            ignore_request_header: false,
            update_trace_id: false,
            add_to_logging_scope: false,
            logging_scope_key: default_logging_scope_key(),
            log_levels: LogLevelOptions::default(),
            generator: None,
        }
    }
}

impl fmt::Debug for CorrelationIdOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CorrelationIdOptions")
            .field("request_header", &self.request_header)
            .field("response_header", &self.response_header)
            .field("include_in_response", &self.include_in_response)
            .field("enforce_header", &self.enforce_header)
            .field("ignore_request_header", &self.ignore_request_header)
            .field("update_trace_id", &self.update_trace_id)
            .field("add_to_logging_scope", &self.add_to_logging_scope)
            .field("logging_scope_key", &self.logging_scope_key)
            .field("log_levels", &self.log_levels)
            .field("generator", &self.generator.as_ref().map(|_| "Fn() -> String"))
            .finish()
    }
}

impl CorrelationIdOptions {
    /// The effective response header name.
    #[must_use]
    pub fn response_header(&self) -> &str {
        self.response_header
            .as_deref()
            .unwrap_or(&self.request_header)
    }

    #[must_use]
    pub fn with_generator<F>(mut self, generator: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.generator = Some(Arc::new(generator));
        self
    }
}

/// Severity of the header-found / header-missing events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogLevelOptions {
    #[serde(default = "default_info")]
    pub found_header: LogLevel,

    #[serde(default = "default_info")]
    pub missing_header: LogLevel,
}

impl Default for LogLevelOptions {
    fn default() -> Self {
        Self {
            found_header: default_info(),
            missing_header: default_info(),
        }
    }
}

impl LogLevelOptions {
    fn is_default(&self) -> bool {
        *self == Self::default()
    }
}
