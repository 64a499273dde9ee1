//! Fallback handler for every request other than `/health`.
//!
//! Runs inside the correlation layer, so the ambient
//! [`CorrelationContext`](crate::context::CorrelationContext) is bound.
//! Without an upstream the handler echoes that context back as JSON.
//! With one, it forwards the request through the upstream client, whose
//! outbound layer attaches the correlation header.

pub mod headers;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{Extensions, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use http_body_util::Full;
use serde::{Deserialize, Serialize};
use tower::ServiceExt;
use tower_http::request_id::RequestId;
use url::Url;

use crate::accessor;
use crate::server::{AppState, Upstream};

/// Body of the echo response.
#[derive(Debug, Serialize, Deserialize)]
pub struct EchoResponse {
    pub correlation_id: Option<String>,
    pub header: Option<String>,
    pub trace_id: Option<String>,
}

/// The parts of the inbound request the handler needs.
struct Inbound {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
}

pub async fn handler(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    extensions: Extensions,
    body: Bytes,
) -> Response {
    state.stats.handled.fetch_add(1, Ordering::Relaxed);

    match state.upstream {
        Some(ref upstream) => {
            let inbound = Inbound {
                method,
                uri,
                headers,
                body,
            };
            forward(&state, upstream, inbound).await
        }
        None => echo(&extensions).into_response(),
    }
}

fn echo(extensions: &Extensions) -> Json<EchoResponse> {
    let context = accessor::current();
    let trace_id = extensions
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .map(String::from);

    Json(EchoResponse {
        correlation_id: context.as_ref().map(|c| c.correlation_id().to_string()),
        header: context.as_ref().map(|c| c.header().to_string()),
        trace_id,
    })
}

/// Append the request's path and query to the upstream base URL.
#[must_use]
pub fn upstream_url(base: &Url, uri: &Uri) -> Url {
    let mut url = base.clone();
    let path = format!("{}{}", base.path().trim_end_matches('/'), uri.path());
    url.set_path(&path);
    url.set_query(uri.query());
    url
}

#[allow(clippy::cast_possible_truncation)]
async fn forward(state: &AppState, upstream: &Upstream, inbound: Inbound) -> Response {
    let target = upstream_url(&upstream.base, &inbound.uri);
    let correlation_id = accessor::current_id().unwrap_or_default();

    let uri = match target.as_str().parse::<Uri>() {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(target = %target, error = %e, "upstream URL is not a valid URI");
            state.stats.failed.fetch_add(1, Ordering::Relaxed);
            return StatusCode::BAD_GATEWAY.into_response();
        }
    };

    tracing::info!(
        correlation_id = %correlation_id,
        method = %inbound.method,
        target = %target,
        "forwarding request"
    );

    let mut request = http::Request::new(Full::new(inbound.body));
    *request.method_mut() = inbound.method;
    *request.uri_mut() = uri;
    *request.headers_mut() =
        headers::build_forwarded_headers(&inbound.headers, &target, &state.request_header);

    let result = tokio::time::timeout(upstream.timeout, upstream.client.clone().oneshot(request)).await;

    match result {
        Ok(Ok(response)) => {
            state.stats.forwarded.fetch_add(1, Ordering::Relaxed);
            let (mut head, incoming) = response.into_parts();
            headers::strip_hop_by_hop(&mut head.headers);
            tracing::debug!(
                correlation_id = %correlation_id,
                status = head.status.as_u16(),
                "upstream responded"
            );
            Response::from_parts(head, Body::new(incoming))
        }
        Ok(Err(e)) => {
            tracing::error!(
                correlation_id = %correlation_id,
                target = %target,
                error = %e,
                "upstream request failed"
            );
            state.stats.failed.fetch_add(1, Ordering::Relaxed);
            StatusCode::BAD_GATEWAY.into_response()
        }
        Err(_) => {
            tracing::warn!(
                correlation_id = %correlation_id,
                target = %target,
                timeout_ms = upstream.timeout.as_millis() as u64,
                "upstream request timed out"
            );
            state.stats.failed.fetch_add(1, Ordering::Relaxed);
            StatusCode::BAD_GATEWAY.into_response()
        }
    }
}
