//! Creating and disposing the per-request [`CorrelationContext`].
//!
//! [`ContextFactory::create`] builds the context and binds it through the
//! configured accessor. The returned [`ContextGuard`] unbinds it when
//! dropped, which covers normal completion, errors, and a cancelled
//! (dropped) request future alike.

use std::ops::Deref;
use std::sync::Arc;

use crate::accessor::CorrelationContextAccessor;
use crate::context::CorrelationContext;
use crate::error::CorrelationError;

#[derive(Debug, Clone, Default)]
pub struct ContextFactory {
    accessor: Option<Arc<dyn CorrelationContextAccessor>>,
}

impl ContextFactory {
    #[must_use]
    pub fn new(accessor: Arc<dyn CorrelationContextAccessor>) -> Self {
        Self {
            accessor: Some(accessor),
        }
    }

    /// A factory that builds contexts without binding them anywhere.
    #[must_use]
    pub fn detached() -> Self {
        Self { accessor: None }
    }

    pub fn create(
        &self,
        correlation_id: impl Into<String>,
        header: &str,
    ) -> Result<ContextGuard, CorrelationError> {
        let context = CorrelationContext::new(correlation_id, header)?;

        if let Some(ref accessor) = self.accessor {
            if !accessor.set(Some(context.clone())) {
                tracing::debug!("no correlation scope is active, context is not bound");
            }
        }

        Ok(ContextGuard {
            factory: self.clone(),
            context,
        })
    }

    /// Unbind the current context. Normally called by [`ContextGuard`].
    pub fn dispose(&self) {
        if let Some(ref accessor) = self.accessor {
            accessor.set(None);
        }
    }
}

/// Keeps a context bound until dropped.
#[derive(Debug)]
#[must_use = "dropping the guard unbinds the correlation context"]
pub struct ContextGuard {
    factory: ContextFactory,
    context: CorrelationContext,
}

impl ContextGuard {
    pub fn context(&self) -> &CorrelationContext {
        &self.context
    }
}

impl Deref for ContextGuard {
    type Target = CorrelationContext;

    fn deref(&self) -> &Self::Target {
        &self.context
    }
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        tracing::debug!("disposing the correlation context for this request");
        self.factory.dispose();
    }
}
