//! Shared limit on in-flight HTTP requests
//!
//! Every outbound request, geocoding or weather, holds a [`RequestPermit`]
//! for the whole exchange. The permit gives its slot back when dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

use crate::{CollectorError, Result};

/// Counting semaphore shared by the resolver and the fetcher
#[derive(Debug, Clone)]
pub struct RequestLimiter {
    inner: Arc<LimiterState>,
}

#[derive(Debug)]
struct LimiterState {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

/// One acquired slot; released on drop
#[derive(Debug)]
pub struct RequestPermit {
    _permit: OwnedSemaphorePermit,
    state: Arc<LimiterState>,
}

impl RequestLimiter {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(LimiterState {
                semaphore: Arc::new(Semaphore::new(capacity)),
                capacity,
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }),
        }
    }

    /// Wait for a free slot
    pub async fn acquire(&self) -> Result<RequestPermit> {
        let permit = Arc::clone(&self.inner.semaphore)
            .acquire_owned()
            .await
            .map_err(|e: AcquireError| {
                CollectorError::unavailable(format!("Request limiter closed: {e}"))
            })?;

        let now = self.inner.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.peak.fetch_max(now, Ordering::SeqCst);

        Ok(RequestPermit {
            _permit: permit,
            state: Arc::clone(&self.inner),
        })
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Slots currently held
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of slots held at the same time since the last reset
    #[must_use]
    pub fn peak(&self) -> usize {
        self.inner.peak.load(Ordering::SeqCst)
    }

    /// Start a new high-water mark from the slots held right now
    pub fn reset_peak(&self) {
        let current = self.inner.in_flight.load(Ordering::SeqCst);
        self.inner.peak.store(current, Ordering::SeqCst);
    }
}

impl Drop for RequestPermit {
    fn drop(&mut self) {
        // The semaphore slot itself is returned when `_permit` drops right after this.
        self.state.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_permit_released_on_drop() {
        let limiter = RequestLimiter::new(2);

        let first = limiter.acquire().await.unwrap();
        let second = limiter.acquire().await.unwrap();
        assert_eq!(limiter.in_flight(), 2);

        drop(first);
        assert_eq!(limiter.in_flight(), 1);
        drop(second);
        assert_eq!(limiter.in_flight(), 0);
        assert_eq!(limiter.peak(), 2);
    }

    #[tokio::test]
    async fn test_acquire_waits_for_capacity() {
        let limiter = RequestLimiter::new(1);
        let held = limiter.acquire().await.unwrap();

        let blocked = tokio::time::timeout(Duration::from_millis(50), limiter.acquire()).await;
        assert!(blocked.is_err());

        drop(held);
        let permit = tokio::time::timeout(Duration::from_millis(50), limiter.acquire()).await;
        assert!(permit.is_ok());
    }

    #[tokio::test]
    async fn test_peak_never_exceeds_capacity() {
        let limiter = RequestLimiter::new(3);

        let tasks = (0..20).map(|_| {
            let limiter = limiter.clone();
            async move {
                let _permit = limiter.acquire().await.unwrap();
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        });
        futures::future::join_all(tasks).await;

        assert_eq!(limiter.peak(), 3);
        assert_eq!(limiter.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_release_on_error_path() {
        let limiter = RequestLimiter::new(1);

        async fn failing(limiter: &RequestLimiter) -> Result<()> {
            let _permit = limiter.acquire().await?;
            Err(CollectorError::request("boom"))
        }

        assert!(failing(&limiter).await.is_err());
        assert_eq!(limiter.in_flight(), 0);
        assert!(limiter.acquire().await.is_ok());
    }

    #[tokio::test]
    async fn test_reset_peak_starts_from_current_load() {
        let limiter = RequestLimiter::new(4);

        let first = limiter.acquire().await.unwrap();
        let second = limiter.acquire().await.unwrap();
        let third = limiter.acquire().await.unwrap();
        drop(second);
        drop(third);
        assert_eq!(limiter.peak(), 3);

        limiter.reset_peak();
        assert_eq!(limiter.peak(), 1);

        drop(first);
        let _again = limiter.acquire().await.unwrap();
        assert_eq!(limiter.peak(), 1);
        assert_eq!(limiter.capacity(), 4);
    }
}
