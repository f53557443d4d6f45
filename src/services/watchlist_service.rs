use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::external::data_provider::FinancialDataProvider;
use crate::models::Stock;
use crate::services::stock_service;
use crate::store::Store;

/// Add a stock to the user's watchlist, fetching it first if it is not cached.
///
/// Returns `Ok(false)` when the symbol cannot be resolved at all, malformed
/// symbols included. Adding a stock that is already on the list is a
/// successful no-op.
pub async fn add(
    store: &dyn Store,
    provider: &dyn FinancialDataProvider,
    user_id: Uuid,
    symbol: &str,
) -> Result<bool, AppError> {
    let Some(symbol) = well_formed(symbol) else {
        return Ok(false);
    };
    let symbol = symbol.as_str();

    let stock = match stock_service::get_by_symbol(store, symbol).await? {
        Some(stock) => stock,
        None => match stock_service::upsert_from_provider(store, provider, symbol).await? {
            Some(stock) => stock,
            None => return Ok(false),
        },
    };

    let inserted = store.add_to_watchlist(user_id, stock.id).await.map_err(|e| {
        error!("Failed to add {} to watchlist of {}: {}", stock.symbol, user_id, e);
        AppError::Db(e)
    })?;

    if inserted {
        info!("User {} now watching {}", user_id, stock.symbol);
    }
    Ok(true)
}

/// Returns whether an entry was actually removed.
pub async fn remove(store: &dyn Store, user_id: Uuid, symbol: &str) -> Result<bool, AppError> {
    let Some(symbol) = well_formed(symbol) else {
        return Ok(false);
    };
    let Some(stock) = stock_service::get_by_symbol(store, &symbol).await? else {
        return Ok(false);
    };
    let removed = store.remove_from_watchlist(user_id, stock.id).await?;
    if removed {
        info!("User {} stopped watching {}", user_id, stock.symbol);
    }
    Ok(removed)
}

fn well_formed(symbol: &str) -> Option<String> {
    stock_service::normalize_symbol(symbol)
        .map_err(|e| warn!("Ignoring watchlist symbol {:?}: {}", symbol, e))
        .ok()
}

pub async fn list(store: &dyn Store, user_id: Uuid) -> Result<Vec<Stock>, AppError> {
    Ok(store.list_watchlist(user_id).await?)
}
