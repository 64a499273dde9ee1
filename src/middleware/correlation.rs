//! The inbound correlation id layer.
//!
//! Per request, in order:
//!
//! 1. read the first value of the request header (empty counts as absent);
//! 2. if it is absent and the header is enforced, answer `400` and stop;
//! 3. generate an id when the header is absent or ignored, through the
//!    generator override or the registered [`IdProvider`](crate::provider::IdProvider);
//! 4. optionally overwrite the request's trace identifier;
//! 5. bind the [`CorrelationContext`](crate::context::CorrelationContext)
//!    for the downstream call, optionally inside a logging span;
//! 6. add the response header unless it is already present;
//! 7. unbind, whatever the outcome.
//!
//! Downstream errors are returned untouched.

use std::borrow::Cow;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use http::header::CONTENT_TYPE;
use http::request::Parts;
use http::{HeaderMap, HeaderName, HeaderValue, Request, Response, StatusCode};
use tower::{Layer, Service};
use tower_http::request_id::RequestId;
use tracing::Instrument;

use super::{header_value, insert_if_absent};
use crate::accessor;
use crate::builder::CorrelationIdBuilder;
use crate::error::CorrelationError;
use crate::factory::ContextFactory;
use crate::logging::LogLevel;
use crate::options::CorrelationIdOptions;
use crate::provider::IdProvider;

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Emit an event at a level chosen at runtime.
macro_rules! event_at {
    ($level:expr, $($arg:tt)+) => {
        match $level {
            LogLevel::Trace => tracing::trace!($($arg)+),
            LogLevel::Debug => tracing::debug!($($arg)+),
            LogLevel::Info => tracing::info!($($arg)+),
            LogLevel::Warn => tracing::warn!($($arg)+),
            LogLevel::Error => tracing::error!($($arg)+),
        }
    };
}

#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) options: CorrelationIdOptions,
    pub(crate) request_header: HeaderName,
    pub(crate) response_header: HeaderName,
    pub(crate) provider: Option<Arc<dyn IdProvider>>,
    pub(crate) factory: ContextFactory,
}

impl Shared {
    fn generate(&self, request: &Parts) -> Result<String, CorrelationError> {
        if let Some(ref generator) = self.options.generator {
            let correlation_id = generator();
            tracing::debug!(
                correlation_id = %correlation_id,
                "generated a correlation id using the configured generator function"
            );
            return Ok(correlation_id);
        }

        let provider = self
            .provider
            .as_ref()
            .ok_or(CorrelationError::MissingProvider)?;
        let correlation_id = provider.generate_correlation_id(request);
        tracing::debug!(
            correlation_id = %correlation_id,
            provider = provider.name(),
            "generated a correlation id using the provider"
        );
        Ok(correlation_id)
    }
}

#[derive(Debug, Clone)]
pub struct CorrelationIdLayer {
    shared: Arc<Shared>,
}

impl CorrelationIdLayer {
    pub(crate) fn from_shared(shared: Shared) -> Self {
        Self {
            shared: Arc::new(shared),
        }
    }

    /// Default options with the UUID provider.
    pub fn with_defaults() -> Result<Self, CorrelationError> {
        CorrelationIdBuilder::new(CorrelationIdOptions::default())
            .with_uuid_provider()?
            .build()
    }

    #[must_use]
    pub fn options(&self) -> &CorrelationIdOptions {
        &self.shared.options
    }

    #[must_use]
    pub fn request_header(&self) -> &HeaderName {
        &self.shared.request_header
    }
}

impl<S> Layer<S> for CorrelationIdLayer {
    type Service = CorrelationIdService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CorrelationIdService {
            inner,
            shared: Arc::clone(&self.shared),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CorrelationIdService<S> {
    inner: S,
    shared: Arc<Shared>,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for CorrelationIdService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    ReqBody: Send + 'static,
    ResBody: From<String> + Default + Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = BoxFuture<Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        // Keep the service that was driven to readiness, leave a fresh clone behind.
        let clone = self.inner.clone();
        let inner = std::mem::replace(&mut self.inner, clone);
        let shared = Arc::clone(&self.shared);

        Box::pin(accessor::scope(process(shared, inner, request)))
    }
}

#[allow(clippy::too_many_lines)]
async fn process<S, ReqBody, ResBody>(
    shared: Arc<Shared>,
    mut inner: S,
    request: Request<ReqBody>,
) -> Result<Response<ResBody>, S::Error>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    ResBody: From<String> + Default,
{
    let options = &shared.options;
    tracing::debug!("running correlation id processing");

    let (mut parts, body) = request.into_parts();
    let from_header = first_value(&parts.headers, &shared.request_header);
    let has_header = from_header.is_some();

    if !has_header && options.enforce_header {
        tracing::warn!(
            header = %options.request_header,
            "correlation id header is enforced but was not found in the request headers"
        );
        return Ok(enforcement_response(&options.request_header));
    }

    match from_header {
        Some(ref correlation_id) => event_at!(
            options.log_levels.found_header,
            correlation_id = %correlation_id,
            "correlation id was found in the request headers"
        ),
        None => event_at!(
            options.log_levels.missing_header,
            "no correlation id was found in the request headers"
        ),
    }

    let mut correlation_id = from_header.unwrap_or_default();

    if options.ignore_request_header || !has_header {
        correlation_id = match shared.generate(&parts) {
            Ok(generated) => generated,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    "correlation id middleware was called when no provider had been configured"
                );
                return Ok(server_error_response());
            }
        };
    }

    if options.update_trace_id && !correlation_id.is_empty() {
        if let Some(value) = header_value(&correlation_id) {
            tracing::debug!("updating the trace identifier of the request");
            parts.extensions.insert(RequestId::new(value));
        }
    }

    tracing::debug!("creating the correlation context for this request");
    let guard = match shared
        .factory
        .create(correlation_id.as_str(), &options.request_header)
    {
        Ok(guard) => guard,
        Err(e) => {
            tracing::error!(error = %e, "failed to create the correlation context");
            return Ok(server_error_response());
        }
    };

    let response_value = if options.include_in_response && !correlation_id.is_empty() {
        header_value(&correlation_id)
    } else {
        None
    };

    let logging_scope = options.add_to_logging_scope
        && !options.logging_scope_key.is_empty()
        && !correlation_id.is_empty();

    let request = Request::from_parts(parts, body);
    let result = if logging_scope {
        let span = tracing::info_span!(
            "correlation_scope",
            scope_key = %options.logging_scope_key,
            correlation_id = %correlation_id,
        );
        span.in_scope(|| tracing::debug!("correlation id processing was completed"));
        inner.call(request).instrument(span).await
    } else {
        tracing::debug!(
            correlation_id = %correlation_id,
            "correlation id processing was completed"
        );
        inner.call(request).await
    };

    let result = result.map(|mut response| {
        if let Some(value) = response_value {
            if insert_if_absent(response.headers_mut(), &shared.response_header, value) {
                tracing::debug!(
                    header = %shared.response_header,
                    correlation_id = %correlation_id,
                    "writing correlation id response header"
                );
            }
        }
        response
    });

    drop(guard);
    result
}

/// First value of `name`, or `None` when missing or empty. Bytes that are
/// not UTF-8 are replaced, so a sent header is never treated as missing.
fn first_value(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    let value = headers.get(name)?;
    if value.is_empty() {
        return None;
    }
    let correlation_id = String::from_utf8_lossy(value.as_bytes());
    if matches!(correlation_id, Cow::Owned(_)) {
        tracing::warn!(
            header = %name,
            "correlation id header is not valid UTF-8, replacing invalid bytes"
        );
    }
    Some(correlation_id.into_owned())
}

fn enforcement_response<B: From<String>>(header: &str) -> Response<B> {
    let mut response = Response::new(B::from(format!(
        "The '{header}' request header is required, but was not found."
    )));
    *response.status_mut() = StatusCode::BAD_REQUEST;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

fn server_error_response<B: Default>() -> Response<B> {
    let mut response = Response::new(B::default());
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}
