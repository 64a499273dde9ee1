//! Setup-time configuration of the correlation middleware.
//!
//! [`CorrelationIdBuilder`] collects the options, at most one
//! [`IdProvider`], and the accessor, then validates header names once and
//! produces a [`CorrelationIdLayer`]. Registering a second provider fails
//! here, at setup, never at request time.

use std::sync::Arc;

use http::HeaderName;

use crate::accessor::{CorrelationContextAccessor, TaskLocalAccessor};
use crate::error::CorrelationError;
use crate::factory::ContextFactory;
use crate::middleware::correlation::{CorrelationIdLayer, Shared};
use crate::options::CorrelationIdOptions;
use crate::provider::{IdProvider, TraceIdProvider, UuidProvider};

#[derive(Debug)]
pub struct CorrelationIdBuilder {
    options: CorrelationIdOptions,
    provider: Option<Arc<dyn IdProvider>>,
    accessor: Arc<dyn CorrelationContextAccessor>,
}

impl CorrelationIdBuilder {
    #[must_use]
    pub fn new(options: CorrelationIdOptions) -> Self {
        Self {
            options,
            provider: None,
            accessor: Arc::new(TaskLocalAccessor),
        }
    }

    pub fn with_uuid_provider(self) -> Result<Self, CorrelationError> {
        self.with_custom_provider(UuidProvider)
    }

    pub fn with_trace_id_provider(self) -> Result<Self, CorrelationError> {
        self.with_custom_provider(TraceIdProvider)
    }

    pub fn with_custom_provider<P>(self, provider: P) -> Result<Self, CorrelationError>
    where
        P: IdProvider + 'static,
    {
        self.with_shared_provider(Arc::new(provider))
    }

    pub fn with_shared_provider(
        mut self,
        provider: Arc<dyn IdProvider>,
    ) -> Result<Self, CorrelationError> {
        if self.provider.is_some() {
            return Err(CorrelationError::DuplicateProvider);
        }
        self.provider = Some(provider);
        Ok(self)
    }

    /// Remove the registered provider, if any.
    #[must_use]
    pub fn clear_provider(mut self) -> Self {
        self.provider = None;
        self
    }

    #[must_use]
    pub fn with_accessor(mut self, accessor: Arc<dyn CorrelationContextAccessor>) -> Self {
        self.accessor = accessor;
        self
    }

    pub fn build(self) -> Result<CorrelationIdLayer, CorrelationError> {
        let request_header = parse_header("request_header", &self.options.request_header)?;
        let response_header = parse_header("response_header", self.options.response_header())?;

        if self.provider.is_none() && self.options.generator.is_none() {
            tracing::debug!(
                "no correlation id provider registered, requests without the header will fail"
            );
        }

        Ok(CorrelationIdLayer::from_shared(Shared {
            request_header,
            response_header,
            provider: self.provider,
            factory: ContextFactory::new(self.accessor),
            options: self.options,
        }))
    }
}

fn parse_header(field: &'static str, name: &str) -> Result<HeaderName, CorrelationError> {
    if name.is_empty() {
        return Err(CorrelationError::EmptyHeader);
    }
    HeaderName::from_bytes(name.as_bytes()).map_err(|source| CorrelationError::InvalidHeaderName {
        field,
        name: name.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_provider_is_rejected() {
        let result = CorrelationIdBuilder::new(CorrelationIdOptions::default())
            .with_uuid_provider()
            .unwrap()
            .with_trace_id_provider();
        assert!(matches!(result, Err(CorrelationError::DuplicateProvider)));
    }

    #[test]
    fn clear_provider_allows_reregistration() {
        let builder = CorrelationIdBuilder::new(CorrelationIdOptions::default())
            .with_uuid_provider()
            .unwrap()
            .clear_provider()
            .with_trace_id_provider();
        assert!(builder.is_ok());
    }

    #[test]
    fn building_without_provider_is_allowed() {
        assert!(CorrelationIdBuilder::new(CorrelationIdOptions::default())
            .build()
            .is_ok());
    }

    #[test]
    fn empty_request_header_is_rejected() {
        let options = CorrelationIdOptions {
            request_header: String::new(),
            ..CorrelationIdOptions::default()
        };
        let result = CorrelationIdBuilder::new(options).build();
        assert!(matches!(result, Err(CorrelationError::EmptyHeader)));
    }

    #[test]
    fn invalid_response_header_is_rejected() {
        let options = CorrelationIdOptions {
            response_header: Some("bad header".into()),
            ..CorrelationIdOptions::default()
        };
        let result = CorrelationIdBuilder::new(options).build();
        assert!(matches!(
            result,
            Err(CorrelationError::InvalidHeaderName {
                field: "response_header",
                ..
            })
        ));
    }
}
