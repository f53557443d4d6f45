pub mod analysis_queries;
pub mod financial_data_queries;
pub mod stock_queries;
pub mod user_queries;
pub mod watchlist_queries;
