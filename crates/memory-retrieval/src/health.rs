// SPDX-License-Identifier: MIT OR Apache-2.0
//! A cached vector-store health check, sampled at most once every five
//! seconds.

use std::sync::Arc;

use memory_core::Clock;
use memory_vector_store::VectorStore;
use tokio::sync::Mutex;

const HEALTH_CACHE_WINDOW: chrono::Duration = chrono::Duration::seconds(5);

struct CachedHealth {
    healthy: bool,
    sampled_at: chrono::DateTime<chrono::Utc>,
}

/// Wraps [`VectorStore::health`] behind a five-second cache so a busy
/// query stream doesn't re-probe the vector store on every request.
pub struct HealthCache {
    vector_store: Arc<dyn VectorStore>,
    clock: Arc<dyn Clock>,
    cached: Mutex<Option<CachedHealth>>,
}

impl HealthCache {
    /// Construct a health cache over a vector store and clock.
    #[must_use]
    pub fn new(vector_store: Arc<dyn VectorStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            vector_store,
            clock,
            cached: Mutex::new(None),
        }
    }

    /// Returns whether the vector store is currently considered healthy,
    /// re-probing only if the cached reading is stale or absent. A probe
    /// failure is treated as unhealthy, never propagated.
    pub async fn is_healthy(&self) -> bool {
        let now = self.clock.now();
        let mut cached = self.cached.lock().await;

        if let Some(entry) = cached.as_ref() {
            if now.signed_duration_since(entry.sampled_at) < HEALTH_CACHE_WINDOW {
                return entry.healthy;
            }
        }

        let healthy = self.vector_store.health().await.unwrap_or(false);
        *cached = Some(CachedHealth { healthy, sampled_at: now });
        healthy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memory_core::ManualClock;
    use memory_vector_store::InMemoryVectorStore;

    #[tokio::test]
    async fn healthy_when_vector_store_is_reachable() {
        let vector_store = Arc::new(InMemoryVectorStore::new());
        let clock = Arc::new(ManualClock::new(chrono::Utc::now()));
        let cache = HealthCache::new(vector_store, clock);
        assert!(cache.is_healthy().await);
    }

    #[tokio::test]
    async fn cached_reading_is_reused_within_the_window() {
        let vector_store = Arc::new(InMemoryVectorStore::new());
        let clock = Arc::new(ManualClock::new(chrono::Utc::now()));
        let cache = HealthCache::new(vector_store, clock.clone());

        assert!(cache.is_healthy().await);
        clock.advance(chrono::Duration::seconds(2));
        assert!(cache.is_healthy().await);
    }

    #[tokio::test]
    async fn stale_reading_triggers_a_fresh_probe() {
        let vector_store = Arc::new(InMemoryVectorStore::new());
        let clock = Arc::new(ManualClock::new(chrono::Utc::now()));
        let cache = HealthCache::new(vector_store, clock.clone());

        assert!(cache.is_healthy().await);
        clock.advance(chrono::Duration::seconds(6));
        assert!(cache.is_healthy().await);
    }
}
