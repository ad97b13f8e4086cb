use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct CachedPrice {
    price: f64,
    fetched_at: DateTime<Utc>,
}

/// Thread-safe TTL cache for oracle prices, injected into the oracle adapter
/// so tests can run against a fresh instance. Keys are "TICKER:asset_type".
#[derive(Clone)]
pub struct PriceCache {
    cache: Arc<DashMap<String, CachedPrice>>,
    ttl_seconds: i64,
}

impl PriceCache {
    pub fn new(ttl_seconds: i64) -> Self {
        Self {
            cache: Arc::new(DashMap::new()),
            ttl_seconds,
        }
    }

    fn key(ticker: &str, asset_type: &str) -> String {
        format!("{}:{}", ticker.to_uppercase(), asset_type.to_lowercase())
    }

    pub fn get(&self, ticker: &str, asset_type: &str) -> Option<f64> {
        let key = Self::key(ticker, asset_type);
        if let Some(entry) = self.cache.get(&key) {
            let cached = entry.value().clone();
            if Utc::now() < cached.fetched_at + Duration::seconds(self.ttl_seconds) {
                return Some(cached.price);
            }
            drop(entry);
            self.cache.remove(&key);
        }
        None
    }

    pub fn insert(&self, ticker: &str, asset_type: &str, price: f64) {
        self.cache.insert(
            Self::key(ticker, asset_type),
            CachedPrice {
                price,
                fetched_at: Utc::now(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_hit_within_ttl() {
        let cache = PriceCache::new(60);
        cache.insert("AAPL", "stock", 191.5);

        assert_eq!(cache.get("AAPL", "stock"), Some(191.5));
        assert_eq!(cache.get("aapl", "Stock"), Some(191.5));
    }

    #[test]
    fn test_cache_miss_for_unknown_ticker() {
        let cache = PriceCache::new(60);
        assert!(cache.get("MSFT", "stock").is_none());
    }

    #[test]
    fn test_expired_entry_is_evicted() {
        let cache = PriceCache::new(0);
        cache.insert("BTC", "crypto", 64000.0);

        assert!(cache.get("BTC", "crypto").is_none());
        assert!(cache.is_empty());
    }
}
