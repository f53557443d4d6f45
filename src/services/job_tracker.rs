use std::sync::Arc;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::models::{JobKey, JobResult, JobState, JobStatus};

/// Thread-safe record of background job runs, keyed by (kind, stock).
///
/// Only the most recent run per key is kept. A follow-up request reads the
/// status here instead of guessing from repeated GETs.
#[derive(Clone, Default)]
pub struct JobTracker {
    jobs: Arc<DashMap<JobKey, JobStatus>>,
}

impl JobTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a run as started.
    ///
    /// Returns `Err` with the current status if a run for the same key is still
    /// going.
    pub fn try_start(&self, key: JobKey) -> Result<JobStatus, JobStatus> {
        let status = JobStatus {
            kind: key.kind,
            stock_id: key.stock_id,
            state: JobState::Running,
            started_at: Utc::now(),
            finished_at: None,
            items_processed: 0,
            items_failed: 0,
            message: None,
        };

        match self.jobs.entry(key) {
            Entry::Occupied(mut entry) => {
                if entry.get().state == JobState::Running {
                    return Err(entry.get().clone());
                }
                entry.insert(status.clone());
            }
            Entry::Vacant(entry) => {
                entry.insert(status.clone());
            }
        }
        Ok(status)
    }

    pub fn finish(&self, key: JobKey, outcome: Result<JobResult, String>) {
        if let Some(mut status) = self.jobs.get_mut(&key) {
            status.finished_at = Some(Utc::now());
            match outcome {
                Ok(result) => {
                    status.state = JobState::Succeeded;
                    status.items_processed = result.items_processed;
                    status.items_failed = result.items_failed;
                }
                Err(message) => {
                    status.state = JobState::Failed;
                    status.message = Some(message);
                }
            }
        }
    }

    pub fn get(&self, key: JobKey) -> Option<JobStatus> {
        self.jobs.get(&key).map(|entry| entry.value().clone())
    }

    pub fn is_running(&self, key: JobKey) -> bool {
        self.get(key).is_some_and(|s| s.state == JobState::Running)
    }
}
