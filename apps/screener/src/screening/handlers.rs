//! Axum route handlers for the screening half of the console.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::fault::Rendered;
use crate::render::ResultCard;
use crate::screening::JobDescriptor;
use crate::session::AnalysisSummary;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ResultsResponse {
    pub is_analyzing: bool,
    pub is_engaging: bool,
    pub cards: Vec<Rendered<ResultCard>>,
}

/// PUT /api/v1/job
///
/// Stores the job as typed. Completeness is only enforced when analysis runs.
pub async fn handle_set_job(
    State(state): State<AppState>,
    Json(job): Json<JobDescriptor>,
) -> StatusCode {
    state.session.set_job(job).await;
    StatusCode::NO_CONTENT
}

/// GET /api/v1/job
pub async fn handle_get_job(State(state): State<AppState>) -> Result<Json<JobDescriptor>, AppError> {
    state
        .session
        .job()
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Job description has not been set".to_string()))
}

/// POST /api/v1/analyze
///
/// Uploads pending resumes, then screens every uploaded one against the job.
pub async fn handle_analyze(
    State(state): State<AppState>,
) -> Result<Json<AnalysisSummary>, AppError> {
    let summary = state.session.analyze(state.service.as_ref()).await?;
    Ok(Json(summary))
}

/// GET /api/v1/results
pub async fn handle_get_results(State(state): State<AppState>) -> Json<ResultsResponse> {
    Json(ResultsResponse {
        is_analyzing: state.session.is_analyzing(),
        is_engaging: state.session.is_engaging(),
        cards: state.session.render_results().await,
    })
}

/// POST /api/v1/render/:key/retry
///
/// `key` is a result id, or `engagement` for the engagement panel.
pub async fn handle_retry_render(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<StatusCode, AppError> {
    if state.session.retry_render(&key).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("No failed render for {key}")))
    }
}
