pub mod coingecko;
pub mod finnhub;
pub mod market_router;
pub mod price_cache;
pub mod price_oracle;
