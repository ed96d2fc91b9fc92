//! TTL-cached crime-stats snapshot with a single-flight refresh guard.
//!
//! Each adapter owns one cache slot. The refresh lock is held across the
//! upstream fetch, so concurrent requests racing an expired cache
//! serialize behind a single fetch: the winner pays the fetch latency,
//! the rest observe the freshly stored snapshot and return.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use stay_score_safety_models::CrimeStats;
use tokio::sync::Mutex;

use crate::SafetyError;

struct CacheSlot {
    stats: Arc<CrimeStats>,
    fetched_at: Instant,
}

/// A single-slot TTL cache for one city's crime-stats snapshot.
pub struct StatsCache {
    ttl: Duration,
    slot: Mutex<Option<CacheSlot>>,
}

impl StatsCache {
    /// Creates an empty cache with the given TTL.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    /// Returns the cached snapshot, refreshing it first if the TTL has
    /// expired.
    ///
    /// A failed refresh stores an empty snapshot stamped at the current
    /// time, so every area reads as zero crimes until the next expiry
    /// rather than re-fetching on every request or serving stale data
    /// forever.
    pub async fn get_or_refresh<F, Fut>(&self, label: &str, refresh: F) -> Arc<CrimeStats>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CrimeStats, SafetyError>> + Send,
    {
        let mut slot = self.slot.lock().await;

        if let Some(cached) = slot.as_ref()
            && cached.fetched_at.elapsed() < self.ttl
        {
            return Arc::clone(&cached.stats);
        }

        let stats = match refresh().await {
            Ok(stats) => {
                log::info!("[{label}] Crime stats refreshed: {} areas", stats.len());
                Arc::new(stats)
            }
            Err(e) => {
                log::error!("[{label}] Failed to fetch crime stats: {e}");
                Arc::new(CrimeStats::new())
            }
        };

        *slot = Some(CacheSlot {
            stats: Arc::clone(&stats),
            fetched_at: Instant::now(),
        });

        stats
    }
}
