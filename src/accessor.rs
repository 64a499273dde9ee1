//! Ambient storage for the current request's [`CorrelationContext`].
//!
//! The value lives in a `tokio::task_local!` slot, so it follows the
//! logical request across suspension points and worker threads instead of
//! the OS thread. Each [`scope`] owns a private slot:
//!
//! - concurrent requests run in different scopes and never see each
//!   other's value;
//! - a child future forked with [`spawn`] or
//!   [`WithCorrelation::with_current_correlation`] starts with a copy of the
//!   parent's value at the moment of forking;
//! - a child's later [`set`](CorrelationContextAccessor::set) only writes
//!   its own slot, never the parent's or a sibling's.
//!
//! A plain `tokio::spawn` does not inherit the slot. Use [`spawn`] for work
//! that belongs to the request.

use std::cell::RefCell;
use std::fmt;
use std::future::Future;

use tokio::task::futures::TaskLocalFuture;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::context::CorrelationContext;

type Slot = RefCell<Option<CorrelationContext>>;

tokio::task_local! {
    static CURRENT: Slot;
}

/// Read and bind the ambient context of the current logical request.
pub trait CorrelationContextAccessor: Send + Sync + fmt::Debug {
    fn get(&self) -> Option<CorrelationContext>;

    /// Binds `context` (or clears it with `None`). Returns `false` when
    /// there is nowhere to bind it, e.g. outside any request scope.
    fn set(&self, context: Option<CorrelationContext>) -> bool;
}

/// The default accessor, backed by the task-local slot of this module.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskLocalAccessor;

impl CorrelationContextAccessor for TaskLocalAccessor {
    fn get(&self) -> Option<CorrelationContext> {
        current()
    }

    fn set(&self, context: Option<CorrelationContext>) -> bool {
        CURRENT
            .try_with(|slot| {
                *slot.borrow_mut() = context;
            })
            .is_ok()
    }
}

/// The context bound in the current scope, if any.
#[must_use]
pub fn current() -> Option<CorrelationContext> {
    CURRENT
        .try_with(|slot| slot.borrow().clone())
        .ok()
        .flatten()
}

/// Shorthand for the current correlation id.
#[must_use]
pub fn current_id() -> Option<String> {
    current().map(|ctx| ctx.correlation_id().to_string())
}

/// Run `future` in a fresh slot seeded with the current value.
pub fn scope<F: Future>(future: F) -> TaskLocalFuture<Slot, F> {
    future.with_correlation(current())
}

/// `tokio::spawn` that carries the current context and tracing span into
/// the spawned task.
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::spawn(future.with_current_correlation().in_current_span())
}

/// Attach a correlation scope to any future.
pub trait WithCorrelation: Future + Sized {
    /// Run `self` with `context` bound in its own slot.
    fn with_correlation(self, context: Option<CorrelationContext>) -> TaskLocalFuture<Slot, Self> {
        CURRENT.scope(RefCell::new(context), self)
    }

    /// Run `self` with a copy of the context that is current right now.
    fn with_current_correlation(self) -> TaskLocalFuture<Slot, Self> {
        self.with_correlation(current())
    }
}

impl<F: Future> WithCorrelation for F {}
