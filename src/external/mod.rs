pub mod alphavantage;
pub mod data_provider;
