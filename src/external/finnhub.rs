use crate::external::price_oracle::{PriceOracle, PriceOracleError};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;

const BASE_URL: &str = "https://finnhub.io/api/v1";

/// Equity quotes backed by the Finnhub REST API.
pub struct FinnhubProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl FinnhubProvider {
    pub fn from_env() -> Result<Self, PriceOracleError> {
        let api_key = std::env::var("FINNHUB_API_KEY")
            .map_err(|_| PriceOracleError::BadResponse("FINNHUB_API_KEY not set".into()))?;

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: BASE_URL.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct FinnhubQuote {
    /// Current price. Finnhub reports 0 for unknown symbols.
    c: f64,
}

#[derive(Debug, Deserialize)]
struct FinnhubCandles {
    s: String,
    #[serde(default)]
    c: Vec<f64>,
}

#[async_trait]
impl PriceOracle for FinnhubProvider {
    async fn get_current_price(
        &self,
        ticker: &str,
        _asset_type: &str,
    ) -> Result<f64, PriceOracleError> {
        let url = format!(
            "{}/quote?symbol={}&token={}",
            self.base_url,
            ticker.to_uppercase(),
            self.api_key
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PriceOracleError::Network(e.to_string()))?;

        if response.status().as_u16() == 429 {
            return Err(PriceOracleError::RateLimited);
        }
        if !response.status().is_success() {
            return Err(PriceOracleError::BadResponse(format!(
                "finnhub quote returned {}",
                response.status()
            )));
        }

        let quote: FinnhubQuote = response
            .json()
            .await
            .map_err(|e| PriceOracleError::Parse(e.to_string()))?;

        if quote.c <= 0.0 {
            return Err(PriceOracleError::Unavailable(ticker.to_string()));
        }
        Ok(quote.c)
    }

    async fn get_historical_price(
        &self,
        ticker: &str,
        _asset_type: &str,
        date: NaiveDate,
    ) -> Result<f64, PriceOracleError> {
        let from = date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or(0);
        let to = from + 86_400;

        let url = format!(
            "{}/stock/candle?symbol={}&resolution=D&from={}&to={}&token={}",
            self.base_url,
            ticker.to_uppercase(),
            from,
            to,
            self.api_key
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PriceOracleError::Network(e.to_string()))?;

        if response.status().as_u16() == 429 {
            return Err(PriceOracleError::RateLimited);
        }

        let candles: FinnhubCandles = response
            .json()
            .await
            .map_err(|e| PriceOracleError::Parse(e.to_string()))?;

        if candles.s != "ok" {
            return Err(PriceOracleError::Unavailable(ticker.to_string()));
        }
        candles
            .c
            .last()
            .copied()
            .ok_or_else(|| PriceOracleError::Unavailable(ticker.to_string()))
    }
}
