use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use super::{accepted, ApiError};
use crate::models::{triggered_by, AssessmentRun};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AssessmentsQuery {
    #[serde(default = "default_limit")]
    pub limit: i32,
}

fn default_limit() -> i32 {
    20
}

/// GET /api/assessments — list recent runs without their reports
pub async fn list_assessments(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AssessmentsQuery>,
) -> Result<Json<Vec<AssessmentRun>>, ApiError> {
    let limit = query.limit.clamp(1, 200);
    let runs = state.store.list_assessments_recent(limit).await?;
    Ok(Json(runs))
}

/// POST /api/assessments — queue a fleet assessment
pub async fn create_assessment(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<AssessmentRun>), ApiError> {
    let run = state
        .assessment_service
        .enqueue(triggered_by::API)
        .await?
        .ok_or_else(|| ApiError::conflict("an assessment is already queued or running"))?;
    Ok(accepted(run))
}

/// GET /api/assessments/latest — most recent completed run
pub async fn latest_assessment(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AssessmentRun>, ApiError> {
    let run = state
        .store
        .latest_assessment()
        .await?
        .ok_or_else(|| ApiError::not_found("completed assessment"))?;
    Ok(Json(run))
}

/// GET /api/assessments/:id
pub async fn get_assessment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<AssessmentRun>, ApiError> {
    let run = state.store.require_assessment(&id).await?;
    Ok(Json(run))
}

/// GET /api/assessments/:id/report — rendered HTML report
pub async fn get_assessment_report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Html<String>, ApiError> {
    let run = state.store.require_assessment(&id).await?;
    let html = run
        .report_html
        .ok_or_else(|| ApiError::not_found("assessment report"))?;
    Ok(Html(html))
}
