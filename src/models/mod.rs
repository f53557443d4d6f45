mod stock;
mod user;
mod financial_data;
pub mod analysis;
pub mod job;
pub mod screening;

pub use stock::{Stock, StockSnapshot, WatchlistResponse};
pub use user::{User, RegisterRequest, LoginRequest, TokenResponse};
pub use financial_data::FinancialData;
pub use analysis::{AiAnalysis, RedFlag, RiskEntry, Severity};
pub use job::{JobKey, JobKind, JobResult, JobState, JobStatus};
pub use screening::ScreeningFilters;
