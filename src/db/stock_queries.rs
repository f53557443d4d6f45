use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;
use crate::models::{ScreeningFilters, Stock, StockSnapshot};

pub async fn fetch_by_symbol(pool: &PgPool, symbol: &str) -> Result<Option<Stock>, sqlx::Error> {
    sqlx::query_as::<_, Stock>("SELECT * FROM stocks WHERE symbol = $1")
        .bind(symbol.to_uppercase())
        .fetch_optional(pool)
        .await
}

pub async fn fetch_all(pool: &PgPool) -> Result<Vec<Stock>, sqlx::Error> {
    sqlx::query_as::<_, Stock>("SELECT * FROM stocks ORDER BY symbol")
        .fetch_all(pool)
        .await
}

/// Insert or merge a provider snapshot in one statement.
///
/// Non-NULL snapshot values replace stored ones; NULLs keep what is there.
pub async fn upsert(pool: &PgPool, snapshot: &StockSnapshot) -> Result<Stock, sqlx::Error> {
    sqlx::query_as::<_, Stock>(
        r#"
        INSERT INTO stocks (id, symbol, name, sector, industry, market_cap, pe_ratio, pb_ratio,
                            dividend_yield, debt_to_equity, roe, current_price)
        VALUES ($1, $2, COALESCE($3, ''), $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ON CONFLICT (symbol) DO UPDATE SET
            name = COALESCE(NULLIF(TRIM(EXCLUDED.name), ''), stocks.name),
            sector = COALESCE(EXCLUDED.sector, stocks.sector),
            industry = COALESCE(EXCLUDED.industry, stocks.industry),
            market_cap = COALESCE(EXCLUDED.market_cap, stocks.market_cap),
            pe_ratio = COALESCE(EXCLUDED.pe_ratio, stocks.pe_ratio),
            pb_ratio = COALESCE(EXCLUDED.pb_ratio, stocks.pb_ratio),
            dividend_yield = COALESCE(EXCLUDED.dividend_yield, stocks.dividend_yield),
            debt_to_equity = COALESCE(EXCLUDED.debt_to_equity, stocks.debt_to_equity),
            roe = COALESCE(EXCLUDED.roe, stocks.roe),
            current_price = COALESCE(EXCLUDED.current_price, stocks.current_price),
            updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(snapshot.symbol.to_uppercase())
    .bind(snapshot.name.as_deref())
    .bind(snapshot.sector.as_deref())
    .bind(snapshot.industry.as_deref())
    .bind(snapshot.market_cap)
    .bind(snapshot.pe_ratio)
    .bind(snapshot.pb_ratio)
    .bind(snapshot.dividend_yield)
    .bind(snapshot.debt_to_equity)
    .bind(snapshot.roe)
    .bind(snapshot.current_price)
    .fetch_one(pool)
    .await
}

pub async fn screen(pool: &PgPool, filters: &ScreeningFilters) -> Result<Vec<Stock>, sqlx::Error> {
    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT * FROM stocks WHERE TRUE");

    // NULL metrics fail these comparisons, which is what excludes them
    for bound in filters.bounds() {
        let column = bound.metric.column();
        if let Some(min) = bound.min {
            query_builder.push(format!(" AND {column} >= "));
            query_builder.push_bind(min);
        }
        if let Some(max) = bound.max {
            query_builder.push(format!(" AND {column} <= "));
            query_builder.push_bind(max);
        }
    }

    if let Some(sectors) = filters.sector_allow_list() {
        query_builder.push(" AND sector = ANY(");
        query_builder.push_bind(sectors.to_vec());
        query_builder.push(")");
    }

    query_builder.push(" ORDER BY symbol");

    query_builder
        .build_query_as::<Stock>()
        .fetch_all(pool)
        .await
}
