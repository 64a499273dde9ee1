//! `correlid run`: start the server.
//!
//! Loads the options file (explicit or auto-detected), builds the
//! correlation layer, optionally prepares the upstream client wrapped in
//! the forwarding layer, and serves with graceful shutdown.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::cli::RunArgs;
use crate::config::{self, sources, ConfigSource};
use crate::error::CorrelidError;
use crate::logging;
use crate::server::{self, AppState, Upstream};

pub async fn execute(args: RunArgs) -> Result<(), CorrelidError> {
    let log_format = logging::resolve_format(args.pretty, args.json);
    logging::init(args.log_level, log_format);

    let source = resolve_file_source(args.config.as_deref())?;
    let config = config::load(source.as_deref()).await?;

    let correlation = config.correlation_layer()?;
    let request_header = correlation.request_header().clone();

    let upstream = match args.upstream {
        Some(ref raw) => Some(Upstream::new(
            parse_upstream(raw)?,
            &config.forwarding_layer()?,
            Duration::from_millis(args.timeout),
        )),
        None => None,
    };
    let mode = if upstream.is_some() { "proxy" } else { "echo" };

    let state = Arc::new(AppState::new(upstream, request_header));
    let router = server::build_router(state, correlation, args.max_body);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        addr = %addr,
        mode,
        request_header = %config.correlation.request_header,
        provider = ?config.provider,
        "correlid started"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(server::shutdown_signal())
        .await?;

    tracing::info!("correlid stopped");
    Ok(())
}

/// Accept only absolute `http`/`https` URLs.
pub fn parse_upstream(raw: &str) -> Result<Url, CorrelidError> {
    let url = Url::parse(raw).map_err(|source| CorrelidError::InvalidUpstream {
        url: raw.to_string(),
        source,
    })?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        _ => Err(CorrelidError::InvalidUpstream {
            url: raw.to_string(),
            source: url::ParseError::EmptyHost,
        }),
    }
}

fn resolve_file_source(
    explicit: Option<&Path>,
) -> Result<Option<Box<dyn ConfigSource>>, CorrelidError> {
    if let Some(path) = explicit {
        return sources::for_path(path.to_path_buf()).map(Some);
    }

    match sources::autodetect(Path::new(".")) {
        Some(path) => {
            tracing::info!(path = %path.display(), "auto-detected config file");
            sources::for_path(path).map(Some)
        }
        None => Ok(None),
    }
}
