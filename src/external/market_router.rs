use crate::external::price_cache::PriceCache;
use crate::external::price_oracle::{PriceOracle, PriceOracleError};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::time::Duration;
use tracing::warn;

const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(8);

/// Routes price lookups to the right upstream by asset type and fronts them
/// with a TTL cache. A slow upstream is reported as `Unavailable` after the
/// timeout instead of stalling the whole report.
pub struct MarketRouter {
    equities: Box<dyn PriceOracle>,
    crypto: Box<dyn PriceOracle>,
    cache: PriceCache,
}

impl MarketRouter {
    pub fn new(equities: Box<dyn PriceOracle>, crypto: Box<dyn PriceOracle>, cache: PriceCache) -> Self {
        Self {
            equities,
            crypto,
            cache,
        }
    }

    fn upstream_for(&self, asset_type: &str) -> &dyn PriceOracle {
        if asset_type.to_lowercase().contains("crypto") {
            self.crypto.as_ref()
        } else {
            self.equities.as_ref()
        }
    }

    async fn with_timeout<F>(&self, ticker: &str, fut: F) -> Result<f64, PriceOracleError>
    where
        F: std::future::Future<Output = Result<f64, PriceOracleError>>,
    {
        match tokio::time::timeout(UPSTREAM_TIMEOUT, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!("price lookup for {} timed out after {:?}", ticker, UPSTREAM_TIMEOUT);
                Err(PriceOracleError::Unavailable(ticker.to_string()))
            }
        }
    }
}

#[async_trait]
impl PriceOracle for MarketRouter {
    async fn get_current_price(
        &self,
        ticker: &str,
        asset_type: &str,
    ) -> Result<f64, PriceOracleError> {
        if let Some(price) = self.cache.get(ticker, asset_type) {
            return Ok(price);
        }

        let upstream = self.upstream_for(asset_type);
        let price = self
            .with_timeout(ticker, upstream.get_current_price(ticker, asset_type))
            .await?;

        self.cache.insert(ticker, asset_type, price);
        Ok(price)
    }

    async fn get_historical_price(
        &self,
        ticker: &str,
        asset_type: &str,
        date: NaiveDate,
    ) -> Result<f64, PriceOracleError> {
        // Historical points are immutable; no TTL cache needed, but the
        // timeout policy still applies.
        let upstream = self.upstream_for(asset_type);
        self.with_timeout(ticker, upstream.get_historical_price(ticker, asset_type, date))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FixedPrice {
        price: f64,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl PriceOracle for FixedPrice {
        async fn get_current_price(&self, _t: &str, _a: &str) -> Result<f64, PriceOracleError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.price)
        }

        async fn get_historical_price(
            &self,
            _t: &str,
            _a: &str,
            _d: NaiveDate,
        ) -> Result<f64, PriceOracleError> {
            Ok(self.price)
        }
    }

    fn router(equity_price: f64, crypto_price: f64) -> (MarketRouter, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let equity_calls = Arc::new(AtomicUsize::new(0));
        let crypto_calls = Arc::new(AtomicUsize::new(0));
        let router = MarketRouter::new(
            Box::new(FixedPrice {
                price: equity_price,
                calls: equity_calls.clone(),
            }),
            Box::new(FixedPrice {
                price: crypto_price,
                calls: crypto_calls.clone(),
            }),
            PriceCache::new(300),
        );
        (router, equity_calls, crypto_calls)
    }

    #[tokio::test]
    async fn test_routes_crypto_types_to_crypto_upstream() {
        let (router, equity_calls, crypto_calls) = router(100.0, 50_000.0);

        let price = router.get_current_price("BTC", "Cryptocurrency").await.unwrap();
        assert_eq!(price, 50_000.0);
        assert_eq!(crypto_calls.load(Ordering::SeqCst), 1);
        assert_eq!(equity_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_routes_everything_else_to_equities() {
        let (router, equity_calls, _) = router(187.3, 0.0);

        let price = router.get_current_price("AAPL", "Stock").await.unwrap();
        assert_eq!(price, 187.3);
        assert_eq!(equity_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_second_lookup_is_served_from_cache() {
        let (router, equity_calls, _) = router(42.0, 0.0);

        router.get_current_price("MSFT", "Stock").await.unwrap();
        router.get_current_price("MSFT", "Stock").await.unwrap();

        assert_eq!(equity_calls.load(Ordering::SeqCst), 1);
    }
}
