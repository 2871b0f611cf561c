//! Rate limiter: a per-vendor bounded counting semaphore.
//! Tasks acquire the vendor's slot before the network call and release it
//! on completion, success or failure.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::types::Vendor;

const ALL_VENDORS: [Vendor; 5] =
    [Vendor::OpenAi, Vendor::Claude, Vendor::Gemini, Vendor::DeepSeek, Vendor::Xai];

/// Process-local map from vendor to its bounded-concurrency semaphore.
pub struct RateLimiter {
    semaphores: HashMap<Vendor, Arc<Semaphore>>,
}

impl RateLimiter {
    /// Builds a limiter using each vendor's default cap.
    pub fn with_default_caps() -> Self {
        Self::with_caps(ALL_VENDORS.iter().map(|&v| (v, v.default_rate_limit())).collect())
    }

    pub fn with_caps(caps: HashMap<Vendor, usize>) -> Self {
        let semaphores = caps
            .into_iter()
            .map(|(vendor, cap)| (vendor, Arc::new(Semaphore::new(cap.max(1)))))
            .collect();
        Self { semaphores }
    }

    /// Acquires one slot for `vendor`, blocking until available. Releases
    /// automatically when the returned permit is dropped.
    pub async fn acquire(&self, vendor: Vendor) -> OwnedSemaphorePermit {
        let semaphore = self
            .semaphores
            .get(&vendor)
            .cloned()
            .unwrap_or_else(|| Arc::new(Semaphore::new(10)));
        semaphore
            .acquire_owned()
            .await
            .expect("semaphore is never closed for the lifetime of a run")
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::with_default_caps()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn never_exceeds_configured_cap() {
        let limiter = Arc::new(RateLimiter::with_caps(HashMap::from([(Vendor::Xai, 10)])));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..100 {
            let limiter = limiter.clone();
            let in_flight = in_flight.clone();
            let max_seen = max_seen.clone();
            handles.push(tokio::spawn(async move {
                let _permit = limiter.acquire(Vendor::Xai).await;
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        assert!(max_seen.load(Ordering::SeqCst) <= 10);
    }

    #[tokio::test]
    async fn unconfigured_vendor_gets_default_cap_of_ten() {
        let limiter = RateLimiter::with_caps(HashMap::new());
        let _permit = limiter.acquire(Vendor::OpenAi).await;
    }
}
