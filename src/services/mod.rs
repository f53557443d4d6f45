pub mod analysis_service;
pub mod auth_service;
pub mod job_tracker;
pub mod rate_limiter;
pub mod stock_service;
pub mod watchlist_service;
