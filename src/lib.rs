//! Correlation ID middleware for tower / axum services.
//!
//! Every inbound request gets exactly one correlation id: read from the
//! request header, or generated when the header is missing (or ignored).
//! The id is bound as an ambient [`CorrelationContext`] for the request's
//! whole logical call chain, echoed on the response, and forwarded onto any
//! outbound HTTP call made while the request is being handled.
//!
//! # Architecture
//!
//! - [`context`] -- The immutable [`CorrelationContext`] value.
//! - [`accessor`] -- Task-local ambient storage with explicit fork helpers.
//! - [`factory`] -- Binds and unbinds contexts through an RAII guard.
//! - [`provider`] -- Pluggable [`IdProvider`] strategies (UUID, trace id).
//! - [`options`] -- [`CorrelationIdOptions`] and their defaults.
//! - [`builder`] -- Setup-time provider registration, produces the layer.
//! - [`middleware`] -- The inbound decision engine and the outbound
//!   forwarding layer.
//! - [`error`] -- Error types using `thiserror`.
//!
//! The host side of the crate (the `correlid` binary) lives in [`cli`],
//! [`cmd`], [`config`], [`logging`], [`server`], [`health`] and [`proxy`].
//!
//! # Example
//!
//! ```ignore
//! use axum::{routing::get, Router};
//! use correlation_id::{accessor, CorrelationIdBuilder, CorrelationIdOptions};
//!
//! let layer = CorrelationIdBuilder::new(CorrelationIdOptions::default())
//!     .with_uuid_provider()?
//!     .build()?;
//!
//! let app: Router = Router::new()
//!     .route("/", get(|| async { accessor::current_id().unwrap_or_default() }))
//!     .layer(layer);
//! ```
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `yaml` | YAML config file support _(enabled by default)_ |
//! | `json` | JSON config file support |
//! | `toml` | TOML config file support |
//! | `file-backends` | All file format backends |
//! | `full` | All features |

#![allow(clippy::missing_errors_doc)]

pub mod accessor;
pub mod builder;
pub mod cli;
pub mod cmd;
pub mod config;
pub mod context;
pub mod error;
pub mod factory;
pub mod health;
pub mod logging;
pub mod middleware;
pub mod options;
pub mod provider;
pub mod proxy;
pub mod server;

pub use accessor::{CorrelationContextAccessor, TaskLocalAccessor, WithCorrelation};
pub use builder::CorrelationIdBuilder;
pub use context::CorrelationContext;
pub use error::CorrelationError;
pub use factory::{ContextFactory, ContextGuard};
pub use middleware::correlation::{CorrelationIdLayer, CorrelationIdService};
pub use middleware::outbound::{ForwardCorrelationId, ForwardCorrelationIdLayer};
pub use options::{CorrelationIdOptions, LogLevelOptions};
pub use provider::{IdProvider, TraceIdProvider, UuidProvider};
