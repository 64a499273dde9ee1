//! Configuration loading and validation for the `correlid` host.
//!
//! Defines the [`ConfigSource`] trait for pluggable config backends and
//! the [`load`] helper that falls back to defaults when no file is
//! given. Submodules provide the data model, validation logic, and the
//! file-based source implementations.

pub mod model;
pub mod sources;
pub mod validation;

use async_trait::async_trait;

use crate::error::CorrelidError;
use model::Config;

// async_trait is required here because ConfigSource is used as Box<dyn ConfigSource>
// and native async fn in traits does not support dyn dispatch.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    fn name(&self) -> &'static str;
    async fn load(&self) -> Result<Config, CorrelidError>;
}

/// Load from `source`, or use the defaults when there is none.
pub async fn load(source: Option<&dyn ConfigSource>) -> Result<Config, CorrelidError> {
    match source {
        Some(source) => {
            let config = source.load().await?;
            tracing::info!(source = source.name(), "config loaded");
            Ok(config)
        }
        None => {
            tracing::info!("no config file found, using default correlation options");
            Ok(Config::default())
        }
    }
}
