//! Cache-aware politeness delay
//!
//! After a response that actually went over the network the calling task
//! sleeps for a fixed delay; responses served from cache return at once.
//! The sleep suspends only the task that made the request, so concurrent
//! siblings are never serialized by it.

use std::time::Duration;

/// Default delay after a network (non-cached) response
pub const DEFAULT_POLITENESS_DELAY: Duration = Duration::from_millis(400);

/// Inserts a per-call delay after uncached fetches
#[derive(Debug, Clone, Copy)]
pub struct CacheAwarePacer {
    delay: Duration,
}

impl CacheAwarePacer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Waits for the politeness delay unless the response was a cache hit
    pub async fn pace(&self, was_cache_hit: bool) {
        if was_cache_hit || self.delay.is_zero() {
            return;
        }
        tracing::trace!("Pacing for {:?} after uncached response", self.delay);
        tokio::time::sleep(self.delay).await;
    }
}

impl Default for CacheAwarePacer {
    fn default() -> Self {
        Self::new(DEFAULT_POLITENESS_DELAY)
    }
}
