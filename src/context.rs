//! The per-request [`CorrelationContext`] value.

use serde::Serialize;

use crate::error::CorrelationError;

/// The correlation id of one request and the header it travels under.
///
/// Immutable once built. Each request owns its own instance; code running
/// in the request's call chain reads a clone through the
/// [`accessor`](crate::accessor).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorrelationContext {
    correlation_id: String,
    header: String,
}

impl CorrelationContext {
    /// Fails with [`CorrelationError::EmptyHeader`] when `header` is empty.
    /// An empty `correlation_id` is allowed.
    pub fn new(
        correlation_id: impl Into<String>,
        header: impl Into<String>,
    ) -> Result<Self, CorrelationError> {
        let header = header.into();
        if header.is_empty() {
            return Err(CorrelationError::EmptyHeader);
        }
        Ok(Self {
            correlation_id: correlation_id.into(),
            header,
        })
    }

    #[must_use]
    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// The header name the id was read from and is written to.
    #[must_use]
    pub fn header(&self) -> &str {
        &self.header
    }
}
