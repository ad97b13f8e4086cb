use crate::models::User;
use sqlx::PgPool;
use uuid::Uuid;

pub async fn fetch_user(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT id, email, name, email_verified, report_enabled, report_frequency
           FROM users
          WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Users eligible for the daily summary email.
pub async fn fetch_daily_report_recipients(pool: &PgPool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT id, email, name, email_verified, report_enabled, report_frequency
           FROM users
          WHERE report_enabled = TRUE
            AND email_verified = TRUE
            AND report_frequency = 'daily'",
    )
    .fetch_all(pool)
    .await
}
