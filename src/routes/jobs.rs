use axum::{extract::State, routing::get, Json, Router};

use crate::errors::AppError;
use crate::models::{JobKey, JobStatus};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/populate", get(populate_status))
}

/// GET /api/v1/jobs/populate - Status of the most recent populate run
async fn populate_status(State(state): State<AppState>) -> Result<Json<JobStatus>, AppError> {
    state
        .jobs
        .get(JobKey::populate())
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Populate job has not run yet".into()))
}
