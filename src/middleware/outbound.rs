//! Forwarding the ambient correlation id onto outbound HTTP calls.
//!
//! [`ForwardCorrelationIdLayer`] wraps any HTTP client service (for example
//! the hyper-util legacy client). Before each call it reads the ambient
//! [`CorrelationContext`] and adds `header: correlation_id` to the outgoing
//! request unless the request already carries that header. Outside a
//! request scope it does nothing.
//!
//! With [`mirror_response`](ForwardCorrelationIdLayer::mirror_response) the
//! id is also added to the received response when missing, for loop-back
//! setups where one process is both caller and responder.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use http::{HeaderMap, HeaderName, Request, Response};
use tower::{Layer, Service};

use super::{header_value, insert_if_absent};
use crate::accessor::{CorrelationContextAccessor, TaskLocalAccessor};
use crate::context::CorrelationContext;

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Add the context's header to `headers` unless it is already set.
///
/// Returns whether the header was written. Useful on its own for clients
/// that are not tower services.
pub fn attach_correlation_header(headers: &mut HeaderMap, context: &CorrelationContext) -> bool {
    if context.correlation_id().is_empty() {
        return false;
    }
    let name = match HeaderName::from_bytes(context.header().as_bytes()) {
        Ok(name) => name,
        Err(e) => {
            tracing::warn!(header = %context.header(), error = %e, "invalid correlation header name");
            return false;
        }
    };
    if headers.contains_key(&name) {
        return false;
    }
    header_value(context.correlation_id()).is_some_and(|value| insert_if_absent(headers, &name, value))
}

#[derive(Debug, Clone)]
pub struct ForwardCorrelationIdLayer {
    accessor: Arc<dyn CorrelationContextAccessor>,
    mirror_response: Option<HeaderName>,
}

impl Default for ForwardCorrelationIdLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl ForwardCorrelationIdLayer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            accessor: Arc::new(TaskLocalAccessor),
            mirror_response: None,
        }
    }

    #[must_use]
    pub fn with_accessor(mut self, accessor: Arc<dyn CorrelationContextAccessor>) -> Self {
        self.accessor = accessor;
        self
    }

    /// Also add `header` to received responses that lack it.
    #[must_use]
    pub fn mirror_response(mut self, header: HeaderName) -> Self {
        self.mirror_response = Some(header);
        self
    }
}

impl<S> Layer<S> for ForwardCorrelationIdLayer {
    type Service = ForwardCorrelationId<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ForwardCorrelationId {
            inner,
            accessor: Arc::clone(&self.accessor),
            mirror_response: self.mirror_response.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ForwardCorrelationId<S> {
    inner: S,
    accessor: Arc<dyn CorrelationContextAccessor>,
    mirror_response: Option<HeaderName>,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for ForwardCorrelationId<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + 'static,
    S::Future: Send + 'static,
    S::Error: 'static,
    ReqBody: 'static,
    ResBody: 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = BoxFuture<Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<ReqBody>) -> Self::Future {
        let context = self.accessor.get();

        if let Some(ref context) = context {
            if attach_correlation_header(request.headers_mut(), context) {
                tracing::debug!(
                    header = %context.header(),
                    correlation_id = %context.correlation_id(),
                    "forwarding correlation id on outbound request"
                );
            }
        }

        let mirror = match (&self.mirror_response, &context) {
            (Some(name), Some(context)) if !context.correlation_id().is_empty() => {
                header_value(context.correlation_id()).map(|value| (name.clone(), value))
            }
            _ => None,
        };

        let future = self.inner.call(request);
        Box::pin(async move {
            let mut response = future.await?;
            if let Some((name, value)) = mirror {
                insert_if_absent(response.headers_mut(), &name, value);
            }
            Ok(response)
        })
    }
}
