use crate::external::price_oracle::{PriceOracle, PriceOracleError};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;

const BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Crypto quotes backed by the CoinGecko REST API (no API key required for
/// the public tier, but heavily rate-limited).
pub struct CoinGeckoProvider {
    client: reqwest::Client,
    base_url: String,
}

impl CoinGeckoProvider {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: BASE_URL.to_string(),
        }
    }

    /// CoinGecko keys prices by coin id, not exchange ticker.
    fn coin_id(ticker: &str) -> String {
        match ticker.to_uppercase().as_str() {
            "BTC" => "bitcoin".to_string(),
            "ETH" => "ethereum".to_string(),
            "SOL" => "solana".to_string(),
            "ADA" => "cardano".to_string(),
            "DOT" => "polkadot".to_string(),
            "DOGE" => "dogecoin".to_string(),
            "XRP" => "ripple".to_string(),
            other => other.to_lowercase(),
        }
    }
}

impl Default for CoinGeckoProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct UsdPrice {
    usd: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    market_data: Option<HistoryMarketData>,
}

#[derive(Debug, Deserialize)]
struct HistoryMarketData {
    current_price: HashMap<String, f64>,
}

#[async_trait]
impl PriceOracle for CoinGeckoProvider {
    async fn get_current_price(
        &self,
        ticker: &str,
        _asset_type: &str,
    ) -> Result<f64, PriceOracleError> {
        let id = Self::coin_id(ticker);
        let url = format!(
            "{}/simple/price?ids={}&vs_currencies=usd",
            self.base_url, id
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
                "coingecko returned {}",
                response.status()
            )));
        }

        let prices: HashMap<String, UsdPrice> = response
            .json()
            .await
            .map_err(|e| PriceOracleError::Parse(e.to_string()))?;

        prices
            .get(&id)
            .and_then(|p| p.usd)
            .filter(|p| *p > 0.0)
            .ok_or_else(|| PriceOracleError::Unavailable(ticker.to_string()))
    }

    async fn get_historical_price(
        &self,
        ticker: &str,
        _asset_type: &str,
        date: NaiveDate,
    ) -> Result<f64, PriceOracleError> {
        let id = Self::coin_id(ticker);
        let url = format!(
            "{}/coins/{}/history?date={}&localization=false",
            self.base_url,
            id,
            date.format("%d-%m-%Y")
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

        let history: HistoryResponse = response
            .json()
            .await
            .map_err(|e| PriceOracleError::Parse(e.to_string()))?;

        history
            .market_data
            .and_then(|m| m.current_price.get("usd").copied())
            .filter(|p| *p > 0.0)
            .ok_or_else(|| PriceOracleError::Unavailable(ticker.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_tickers_map_to_coin_ids() {
        assert_eq!(CoinGeckoProvider::coin_id("BTC"), "bitcoin");
        assert_eq!(CoinGeckoProvider::coin_id("eth"), "ethereum");
    }

    #[test]
    fn test_unknown_ticker_falls_back_to_lowercase() {
        assert_eq!(CoinGeckoProvider::coin_id("PEPE"), "pepe");
    }
}
