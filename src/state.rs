use std::sync::Arc;

use crate::auth::AuthKeys;
use crate::external::data_provider::FinancialDataProvider;
use crate::services::analysis_service::AnalysisStrategy;
use crate::services::job_tracker::JobTracker;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub data_provider: Arc<dyn FinancialDataProvider>,
    pub analysis_strategy: Arc<dyn AnalysisStrategy>,
    pub auth: AuthKeys,
    pub jobs: JobTracker,
    pub populate_limit: usize,
}
