//! Correlation id generation strategies.
//!
//! An [`IdProvider`] is consulted only when a request needs a new id
//! (header missing, empty, or ignored). At most one provider is registered
//! per layer; see [`CorrelationIdBuilder`](crate::builder::CorrelationIdBuilder).

use std::fmt;

use http::request::Parts;
use tower_http::request_id::RequestId;

/// Generates a correlation id for the request described by `request`.
pub trait IdProvider: Send + Sync + fmt::Debug {
    fn generate_correlation_id(&self, request: &Parts) -> String;

    /// Name used in log output.
    fn name(&self) -> &'static str;
}

/// Random v4 UUIDs, hyphenated lowercase.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidProvider;

impl IdProvider for UuidProvider {
    fn generate_correlation_id(&self, _request: &Parts) -> String {
        uuid::Uuid::new_v4().to_string()
    }

    fn name(&self) -> &'static str {
        "uuid"
    }
}

/// Reuses the request's trace identifier, the [`RequestId`] extension set by
/// `tower_http::request_id::SetRequestIdLayer`.
///
/// Falls back to a v4 UUID when no usable trace identifier is present, so a
/// generated id is never empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceIdProvider;

impl IdProvider for TraceIdProvider {
    fn generate_correlation_id(&self, request: &Parts) -> String {
        let trace_id = request
            .extensions
            .get::<RequestId>()
            .and_then(|id| id.header_value().to_str().ok())
            .filter(|id| !id.is_empty());

        trace_id.map_or_else(
            || {
                tracing::debug!("request has no trace identifier, generating a uuid instead");
                uuid::Uuid::new_v4().to_string()
            },
            String::from,
        )
    }

    fn name(&self) -> &'static str {
        "trace-id"
    }
}
