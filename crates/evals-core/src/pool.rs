//! Bounded pool of isolated workers.
//!
//! Every job runs in its own spawned tokio task, so a panic inside one job
//! unwinds only that task and surfaces as [`EvalError::WorkerPanicked`].
//! A semaphore caps how many jobs run at once regardless of how many were
//! submitted.

use std::any::Any;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::domain::error::{EvalError, Result};

/// Upper bound on simultaneously running jobs.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl WorkerPool {
    /// Create a pool running at most `capacity` jobs (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Jobs currently running.
    pub fn busy(&self) -> usize {
        self.capacity - self.permits.available_permits()
    }

    /// Run `job` on a dedicated worker once a slot is free.
    pub async fn run<F>(&self, job: F) -> Result<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let _permit = Arc::clone(&self.permits).acquire_owned().await.ok();

        match tokio::spawn(job).await {
            Ok(output) => Ok(output),
            Err(e) if e.is_panic() => Err(EvalError::WorkerPanicked(panic_message(
                e.into_panic(),
            ))),
            Err(e) => Err(EvalError::WorkerPanicked(e.to_string())),
        }
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(10)
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
