//! Download job API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use youcast_core::{
    metrics::JOBS_ENQUEUED, ItemError, ItemStatus, Job, JobQueue, JobStatus, StatusSink,
};

use super::handlers::ErrorResponse;
use crate::state::AppState;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn internal_error(e: impl ToString) -> ApiError {
    ErrorResponse::with_status(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

fn job_not_found(item_id: &str) -> ApiError {
    ErrorResponse::with_status(
        StatusCode::NOT_FOUND,
        format!("Job not found: {}", item_id),
    )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for enqueueing a job directly
#[derive(Debug, Deserialize)]
pub struct CreateJobBody {
    pub item_id: String,
    /// Where to fetch the media from
    pub source_uri: String,
    /// Final location of the media file
    pub target_uri: String,
}

/// Response for job operations
#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub item_id: String,
    pub status: JobStatus,
    pub source_uri: String,
    pub target_uri: String,
    pub active: bool,
}

impl From<Job> for JobResponse {
    fn from(job: Job) -> Self {
        Self {
            item_id: job.item_id,
            status: job.status,
            source_uri: job.source_uri,
            target_uri: job.target_uri,
            active: job.active,
        }
    }
}

/// Response for listing jobs
#[derive(Debug, Serialize)]
pub struct ListJobsResponse {
    pub jobs: Vec<JobResponse>,
    pub total: usize,
}

// ============================================================================
// Handlers
// ============================================================================

/// List every stored job, claimed or not
pub async fn list_jobs(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ListJobsResponse>, ApiError> {
    let jobs = state.queue().all().map_err(internal_error)?;

    Ok(Json(ListJobsResponse {
        total: jobs.len(),
        jobs: jobs.into_iter().map(JobResponse::from).collect(),
    }))
}

/// Get the job for an item
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<String>,
) -> Result<Json<JobResponse>, ApiError> {
    match state.queue().get(&item_id) {
        Ok(Some(job)) => Ok(Json(JobResponse::from(job))),
        Ok(None) => Err(job_not_found(&item_id)),
        Err(e) => Err(internal_error(e)),
    }
}

/// Enqueue a job in `Added`, replacing any job stored for the item
pub async fn create_job(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateJobBody>,
) -> Result<(StatusCode, Json<JobResponse>), ApiError> {
    for (field, value) in [
        ("item_id", &body.item_id),
        ("source_uri", &body.source_uri),
        ("target_uri", &body.target_uri),
    ] {
        if value.trim().is_empty() {
            return Err(ErrorResponse::with_status(
                StatusCode::BAD_REQUEST,
                format!("{} cannot be empty", field),
            ));
        }
    }

    let job = Job::new(body.item_id, body.source_uri, body.target_uri);
    state.queue().add(&job).map_err(internal_error)?;
    JOBS_ENQUEUED.inc();

    Ok((StatusCode::CREATED, Json(JobResponse::from(job))))
}

/// Re-enqueue a parked `Failed` job as a fresh `Added` job.
///
/// The item goes back to `Added`. If the item no longer exists the job is
/// dropped and 404 is returned.
pub async fn retry_job(
    State(state): State<Arc<AppState>>,
    Path(item_id): Path<String>,
) -> Result<Json<JobResponse>, ApiError> {
    let failed = match state.queue().get(&item_id) {
        Ok(Some(job)) => job,
        Ok(None) => return Err(job_not_found(&item_id)),
        Err(e) => return Err(internal_error(e)),
    };

    if failed.status != JobStatus::Failed {
        return Err(ErrorResponse::with_status(
            StatusCode::CONFLICT,
            format!(
                "Cannot retry job {}: current status is {}",
                item_id, failed.status
            ),
        ));
    }

    match state.items().update_status(&item_id, ItemStatus::Added) {
        Ok(_) => {}
        Err(ItemError::NotFound(_)) => {
            state.queue().remove(&item_id).map_err(internal_error)?;
            return Err(ErrorResponse::with_status(
                StatusCode::NOT_FOUND,
                format!("Item not found: {}", item_id),
            ));
        }
        Err(e) => return Err(internal_error(e)),
    }

    let job = Job::new(&item_id, failed.source_uri, failed.target_uri);
    state.queue().add(&job).map_err(internal_error)?;
    JOBS_ENQUEUED.inc();
    info!("Re-enqueued failed job {}", item_id);

    Ok(Json(JobResponse::from(job)))
}
