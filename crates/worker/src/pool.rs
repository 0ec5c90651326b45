// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounds how many workers may run concurrently.

use std::sync::Arc;
use tokio::sync::{Semaphore, SemaphorePermit};

/// Caps concurrent worker processes at a fixed permit count, independent of
/// how many tasks the scheduler hands out in a batch.
#[derive(Clone)]
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
}

impl WorkerPool {
    pub fn new(max_parallel: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_parallel.max(1))),
        }
    }

    /// Acquire a permit, waiting if the pool is at capacity. The permit is
    /// released when dropped, freeing a slot for the next worker.
    pub async fn acquire(&self) -> SemaphorePermit<'_> {
        self.semaphore
            .acquire()
            .await
            .expect("worker pool semaphore is never closed")
    }

    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
