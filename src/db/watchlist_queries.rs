use sqlx::PgPool;
use uuid::Uuid;
use crate::models::Stock;

/// Returns false when the stock was already on the watchlist.
pub async fn add(pool: &PgPool, user_id: Uuid, stock_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO user_watchlist (user_id, stock_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(stock_id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn remove(pool: &PgPool, user_id: Uuid, stock_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM user_watchlist WHERE user_id = $1 AND stock_id = $2")
        .bind(user_id)
        .bind(stock_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn fetch_stocks(pool: &PgPool, user_id: Uuid) -> Result<Vec<Stock>, sqlx::Error> {
    sqlx::query_as::<_, Stock>(
        r#"
        SELECT s.* FROM stocks s
        JOIN user_watchlist w ON w.stock_id = s.id
        WHERE w.user_id = $1
        ORDER BY s.symbol
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}
