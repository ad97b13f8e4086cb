use crate::external::price_oracle::PriceOracle;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub price_oracle: Arc<dyn PriceOracle>,
}
