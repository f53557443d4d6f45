use sqlx::PgPool;
use uuid::Uuid;
use crate::models::FinancialData;

pub async fn insert_many(pool: &PgPool, rows: &[FinancialData]) -> Result<u64, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut inserted = 0;

    for row in rows {
        let result = sqlx::query(
            r#"
            INSERT INTO financial_data (id, stock_id, fiscal_year, fiscal_quarter, revenue, net_income,
                                        total_assets, total_debt, cash_flow_from_operations, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(row.id)
        .bind(row.stock_id)
        .bind(row.fiscal_year)
        .bind(row.fiscal_quarter)
        .bind(row.revenue)
        .bind(row.net_income)
        .bind(row.total_assets)
        .bind(row.total_debt)
        .bind(row.cash_flow_from_operations)
        .bind(row.created_at)
        .execute(&mut *tx)
        .await?;
        inserted += result.rows_affected();
    }

    tx.commit().await?;
    Ok(inserted)
}

pub async fn fetch_for_stock(pool: &PgPool, stock_id: Uuid) -> Result<Vec<FinancialData>, sqlx::Error> {
    sqlx::query_as::<_, FinancialData>(
        r#"
        SELECT * FROM financial_data
        WHERE stock_id = $1
        ORDER BY fiscal_year DESC, fiscal_quarter DESC NULLS FIRST, created_at DESC
        "#,
    )
    .bind(stock_id)
    .fetch_all(pool)
    .await
}
