// ── Execution strategies ──
//
// Two interchangeable ways to run the same computation: on a blocking
// worker thread, or inline on the calling task. The pipeline picks one
// at construction and keeps the inline one as its fallback.

use std::any::Any;
use std::time::Duration;

use futures_util::future::BoxFuture;
use strum::Display;
use tokio::runtime::Handle;

use super::FilterJob;
use super::compute::{FilterOutcome, compute_visibility};
use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum StrategyKind {
    Worker,
    Inline,
}

/// A way of executing a [`FilterJob`].
pub trait FilterStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    fn run(&self, job: FilterJob) -> BoxFuture<'static, Result<FilterOutcome, CoreError>>;
}

// ── Inline ──────────────────────────────────────────────────────────

/// Computes on the calling task.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineStrategy;

impl FilterStrategy for InlineStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Inline
    }

    fn run(&self, job: FilterJob) -> BoxFuture<'static, Result<FilterOutcome, CoreError>> {
        Box::pin(async move { Ok(compute_visibility(&job)) })
    }
}

// ── Worker ──────────────────────────────────────────────────────────

/// Computes on tokio's blocking pool, bounded by a deadline.
///
/// A timed-out computation keeps running to completion on its thread;
/// its result is dropped.
#[derive(Debug, Clone)]
pub struct WorkerStrategy {
    handle: Handle,
    timeout: Duration,
}

impl WorkerStrategy {
    pub fn new(handle: Handle, timeout: Duration) -> Self {
        Self { handle, timeout }
    }

    /// Worker bound to the ambient runtime, if there is one.
    pub fn from_current(timeout: Duration) -> Result<Self, CoreError> {
        let handle = Handle::try_current().map_err(|e| CoreError::WorkerUnavailable {
            reason: e.to_string(),
        })?;
        Ok(Self::new(handle, timeout))
    }
}

impl FilterStrategy for WorkerStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Worker
    }

    fn run(&self, job: FilterJob) -> BoxFuture<'static, Result<FilterOutcome, CoreError>> {
        let handle = self.handle.clone();
        let timeout = self.timeout;
        Box::pin(async move {
            let task = handle.spawn_blocking(move || compute_visibility(&job));
            match tokio::time::timeout(timeout, task).await {
                Ok(Ok(outcome)) => Ok(outcome),
                Ok(Err(join_err)) if join_err.is_panic() => Err(CoreError::WorkerPanicked(
                    panic_message(join_err.into_panic().as_ref()),
                )),
                Ok(Err(join_err)) => Err(CoreError::WorkerUnavailable {
                    reason: join_err.to_string(),
                }),
                Err(_) => Err(CoreError::WorkerTimeout {
                    timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                }),
            }
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked with unknown payload".to_string()
    }
}
