mod app;
mod auth;
mod db;
mod errors;
mod external;
mod logging;
mod models;
mod routes;
mod services;
mod state;

use crate::external::coingecko::CoinGeckoProvider;
use crate::external::finnhub::FinnhubProvider;
use crate::external::market_router::MarketRouter;
use crate::external::price_cache::PriceCache;
use crate::external::price_oracle::PriceOracle;
use crate::services::scheduler_service::ReportScheduler;
use crate::state::AppState;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    logging::init_logging(logging::LoggingConfig::from_env())?;

    let database_url = std::env::var("DATABASE_URL")?;
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await?;
    sqlx::migrate!().run(&pool).await?;

    let cache_ttl = std::env::var("PRICE_CACHE_TTL_SECONDS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(300);

    let equities = Box::new(FinnhubProvider::from_env()?);
    let crypto = Box::new(CoinGeckoProvider::default());
    let oracle: Arc<dyn PriceOracle> =
        Arc::new(MarketRouter::new(equities, crypto, PriceCache::new(cache_ttl)));
    tracing::info!("📊 Price routing: Finnhub (equities) + CoinGecko (crypto), cache TTL {}s", cache_ttl);

    let mut scheduler = ReportScheduler::new(pool.clone(), oracle.clone()).await?;
    scheduler.start().await?;

    let state = AppState {
        pool,
        price_oracle: oracle,
    };
    let app = app::create_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("🚀 FINANCEPR backend running at http://{}/", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
