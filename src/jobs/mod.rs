//! Background jobs started from HTTP requests.
//!
//! A request starts a job through [`spawn_tracked`] and returns immediately;
//! progress and outcome are read back from the [`JobTracker`].

pub mod analysis_job;
pub mod populate_stocks_job;

use std::future::Future;
use std::sync::Arc;

use tracing::{error, info};

use crate::errors::AppError;
use crate::external::data_provider::FinancialDataProvider;
use crate::models::{JobKey, JobResult, JobStatus};
use crate::services::analysis_service::AnalysisStrategy;
use crate::services::job_tracker::JobTracker;
use crate::state::AppState;
use crate::store::Store;

/// Shared handles a job needs, detached from the request that started it.
#[derive(Clone)]
pub struct JobContext {
    pub store: Arc<dyn Store>,
    pub provider: Arc<dyn FinancialDataProvider>,
    pub strategy: Arc<dyn AnalysisStrategy>,
}

impl From<&AppState> for JobContext {
    fn from(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            provider: state.data_provider.clone(),
            strategy: state.analysis_strategy.clone(),
        }
    }
}

/// Run `job` on the runtime and record its outcome under `key`.
///
/// Returns `Err` with the existing status when a run for `key` is already in
/// progress; the job is not started in that case.
pub fn spawn_tracked<F>(tracker: &JobTracker, key: JobKey, job: F) -> Result<JobStatus, JobStatus>
where
    F: Future<Output = Result<JobResult, AppError>> + Send + 'static,
{
    let status = tracker.try_start(key)?;
    let tracker = tracker.clone();

    tokio::spawn(async move {
        // inner task so a panic is reported as a failed run instead of a stuck one
        let outcome = match tokio::spawn(job).await {
            Ok(Ok(result)) => {
                info!(
                    "Job {:?} finished: {} processed, {} failed",
                    key.kind, result.items_processed, result.items_failed
                );
                Ok(result)
            }
            Ok(Err(e)) => {
                error!("Job {:?} failed: {}", key.kind, e);
                Err(e.to_string())
            }
            Err(e) => {
                error!("Job {:?} aborted: {}", key.kind, e);
                Err(format!("Job aborted: {}", e))
            }
        };
        tracker.finish(key, outcome);
    });

    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobState;
    use std::time::Duration;
    use tokio::sync::oneshot;

    async fn wait_until_done(tracker: &JobTracker, key: JobKey) -> JobStatus {
        for _ in 0..100 {
            if !tracker.is_running(key) {
                return tracker.get(key).unwrap();
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job did not finish");
    }

    #[tokio::test]
    async fn test_duplicate_spawn_is_refused_while_running() {
        let tracker = JobTracker::new();
        let key = JobKey::populate();
        let (release, gate) = oneshot::channel::<()>();

        spawn_tracked(&tracker, key, async move {
            let _ = gate.await;
            Ok::<_, AppError>(JobResult { items_processed: 3, items_failed: 0 })
        })
        .unwrap();

        let refused = spawn_tracked(&tracker, key, async { Ok::<_, AppError>(JobResult::default()) });
        assert!(refused.is_err());

        release.send(()).unwrap();
        let status = wait_until_done(&tracker, key).await;
        assert_eq!(status.state, JobState::Succeeded);
        assert_eq!(status.items_processed, 3);
    }

    #[tokio::test]
    async fn test_failed_job_records_message() {
        let tracker = JobTracker::new();
        let key = JobKey::populate();

        spawn_tracked(&tracker, key, async { Err::<JobResult, _>(AppError::External("upstream down".into())) }).unwrap();

        let status = wait_until_done(&tracker, key).await;
        assert_eq!(status.state, JobState::Failed);
        assert!(status.message.unwrap().contains("upstream down"));
    }

    #[tokio::test]
    async fn test_panicking_job_is_marked_failed() {
        let tracker = JobTracker::new();
        let key = JobKey::populate();

        let job = async move {
            if key.stock_id.is_none() {
                panic!("boom");
            }
            Ok::<_, AppError>(JobResult::default())
        };
        spawn_tracked(&tracker, key, job).unwrap();

        let status = wait_until_done(&tracker, key).await;
        assert_eq!(status.state, JobState::Failed);
    }
}
