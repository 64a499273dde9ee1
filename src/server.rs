//! Axum server setup, shared application state, and graceful shutdown.
//!
//! Contains [`AppState`] (the `Arc`-shared state holding the optional
//! upstream, stats, and uptime), [`build_router`] for constructing the
//! Axum router with the middleware stack, [`build_http_client`] for the
//! connection-pooled hyper client, and [`shutdown_signal`] for
//! SIGTERM / Ctrl+C handling.

use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::routing::get;
use axum::Router;
use http::HeaderName;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tower::{Layer, ServiceBuilder};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use url::Url;

use crate::health::health_handler;
use crate::middleware::correlation::CorrelationIdLayer;
use crate::middleware::outbound::{ForwardCorrelationId, ForwardCorrelationIdLayer};
use crate::proxy;

#[derive(Debug)]
pub struct Stats {
    pub handled: AtomicU64,
    pub forwarded: AtomicU64,
    pub failed: AtomicU64,
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

impl Stats {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            handled: AtomicU64::new(0),
            forwarded: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }
}

pub type HttpsConnector =
    hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>;
pub type HttpClient = Client<HttpsConnector, http_body_util::Full<bytes::Bytes>>;

/// Where `run --upstream` sends requests, through a client that carries
/// the ambient correlation id.
#[derive(Debug, Clone)]
pub struct Upstream {
    pub base: Url,
    pub client: ForwardCorrelationId<HttpClient>,
    pub timeout: Duration,
}

impl Upstream {
    #[must_use]
    pub fn new(base: Url, forwarding: &ForwardCorrelationIdLayer, timeout: Duration) -> Self {
        Self {
            base,
            client: forwarding.layer(build_http_client()),
            timeout,
        }
    }
}

pub struct AppState {
    pub upstream: Option<Upstream>,
    /// Inbound correlation header, dropped before forwarding so the
    /// outbound layer sends the bound id.
    pub request_header: HeaderName,
    pub start_time: Instant,
    pub stats: Stats,
}

impl AppState {
    #[must_use]
    pub fn new(upstream: Option<Upstream>, request_header: HeaderName) -> Self {
        Self {
            upstream,
            request_header,
            start_time: Instant::now(),
            stats: Stats::new(),
        }
    }
}

#[must_use]
pub fn build_http_client() -> HttpClient {
    // rustls can't pick a crypto provider on its own when several are compiled in.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let https = hyper_rustls::HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .build();
    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(Duration::from_secs(30))
        .build(https)
}

/// `SetRequestId` → `Trace` → `RequestBodyLimit` → correlation → handler.
///
/// `/health` is added after the correlation layer and so bypasses it.
pub fn build_router(
    state: Arc<AppState>,
    correlation: CorrelationIdLayer,
    max_body: usize,
) -> Router {
    Router::new()
        .fallback(proxy::handler)
        .layer(correlation)
        .route("/health", get(health_handler))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(max_body)),
        )
        .with_state(state)
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C"),
        () = terminate => tracing::info!("received SIGTERM"),
    }
}
