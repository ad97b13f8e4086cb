use crate::models::Holding;
use sqlx::PgPool;
use uuid::Uuid;

pub async fn fetch_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Holding>, sqlx::Error> {
    sqlx::query_as::<_, Holding>(
        "SELECT id, user_id, ticker, name, asset_type, quantity,
                purchase_price, purchase_date, created_at
           FROM holdings
          WHERE user_id = $1
          ORDER BY created_at",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}
