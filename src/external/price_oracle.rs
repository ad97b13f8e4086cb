use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PriceOracleError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("rate limited")]
    RateLimited,

    #[error("price unavailable for {0}")]
    Unavailable(String),
}

/// Current/historical unit prices for a ticker. Upstreams are untrusted and
/// rate-limited; callers must treat any error as "price unavailable" for the
/// affected position rather than failing the whole report.
#[async_trait]
pub trait PriceOracle: Send + Sync {
    async fn get_current_price(
        &self,
        ticker: &str,
        asset_type: &str,
    ) -> Result<f64, PriceOracleError>;

    async fn get_historical_price(
        &self,
        ticker: &str,
        asset_type: &str,
        date: NaiveDate,
    ) -> Result<f64, PriceOracleError>;
}
