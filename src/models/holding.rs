use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// A single position owned by a user (stock, crypto, bond or fund).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Holding {
    pub id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    pub ticker: String,
    pub name: String,
    pub asset_type: String,
    pub quantity: BigDecimal,
    pub purchase_price: BigDecimal,
    pub purchase_date: NaiveDate,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
