//! Serde data structures for the `correlid` configuration file.
//!
//! [`Config`] wraps the library's
//! [`CorrelationIdOptions`](crate::options::CorrelationIdOptions) with the
//! host-level choices that are not plain options: which [`ProviderKind`]
//! to register and how outbound forwarding behaves. Every field has a
//! default, so an empty file is a valid config.

use http::HeaderName;
use serde::{Deserialize, Serialize};

use crate::builder::CorrelationIdBuilder;
use crate::error::CorrelationError;
use crate::middleware::correlation::CorrelationIdLayer;
use crate::middleware::outbound::ForwardCorrelationIdLayer;
use crate::options::CorrelationIdOptions;

fn is_false(v: &bool) -> bool {
    !*v
}

fn is_default_provider(v: &ProviderKind) -> bool {
    *v == ProviderKind::default()
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub correlation: CorrelationIdOptions,

    #[serde(default, skip_serializing_if = "is_default_provider")]
    pub provider: ProviderKind,

    #[serde(default, skip_serializing_if = "ForwardingConfig::is_default")]
    pub forwarding: ForwardingConfig,
}

/// Which id provider the host registers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    #[default]
    Uuid,
    TraceId,
    /// No provider: requests without the header get a `500`.
    None,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ForwardingConfig {
    /// Add the correlation id to upstream responses that lack it.
    #[serde(default, skip_serializing_if = "is_false")]
    pub mirror_response: bool,
}

impl ForwardingConfig {
    fn is_default(&self) -> bool {
        !self.mirror_response
    }
}

impl Config {
    pub fn correlation_layer(&self) -> Result<CorrelationIdLayer, CorrelationError> {
        let builder = CorrelationIdBuilder::new(self.correlation.clone());
        let builder = match self.provider {
            ProviderKind::Uuid => builder.with_uuid_provider()?,
            ProviderKind::TraceId => builder.with_trace_id_provider()?,
            ProviderKind::None => builder,
        };
        builder.build()
    }

    pub fn forwarding_layer(&self) -> Result<ForwardCorrelationIdLayer, CorrelationError> {
        let layer = ForwardCorrelationIdLayer::new();
        if !(self.forwarding.mirror_response && self.correlation.include_in_response) {
            return Ok(layer);
        }

        let name = self.correlation.response_header();
        let header = HeaderName::from_bytes(name.as_bytes()).map_err(|source| {
            CorrelationError::InvalidHeaderName {
                field: "response_header",
                name: name.to_string(),
                source,
            }
        })?;
        Ok(layer.mirror_response(header))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_a_valid_config() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.provider, ProviderKind::Uuid);
        assert!(!config.forwarding.mirror_response);
        assert!(config.correlation_layer().is_ok());
    }

    #[test]
    fn provider_kinds_are_kebab_case() {
        let config: Config = serde_json::from_str(r#"{"provider": "trace-id"}"#).unwrap();
        assert_eq!(config.provider, ProviderKind::TraceId);
        let config: Config = serde_json::from_str(r#"{"provider": "none"}"#).unwrap();
        assert_eq!(config.provider, ProviderKind::None);
    }

    #[test]
    fn nested_options_reject_unknown_fields() {
        let result: Result<Config, _> =
            serde_json::from_str(r#"{"correlation": {"use_guid": true}}"#);
        assert!(result.is_err());
    }
}
