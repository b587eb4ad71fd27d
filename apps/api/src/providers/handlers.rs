//! Axum route handlers for external job search and candidate sourcing.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::candidates::handlers::split_list;
use crate::config::ProviderStatus;
use crate::errors::AppError;
use crate::models::analysis::ResumeAnalysisRow;
use crate::state::AppState;

use super::aggregate::MAX_JOB_RESULTS;
use super::import::{import_profile, ImportProfile};
use super::{JobPosting, JobQuery, SourcedCandidate, SourcingQuery};

const DEFAULT_SOURCING_LIMIT: usize = 10;
const MAX_SOURCING_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct JobSearchParams {
    pub q: String,
    pub location: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct JobSearchResponse {
    pub query: String,
    pub location: String,
    pub total: usize,
    pub jobs: Vec<JobPosting>,
}

#[derive(Debug, Deserialize)]
pub struct SourcingParams {
    pub title: String,
    pub location: Option<String>,
    pub skills: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SourcingResponse {
    pub total: usize,
    pub candidates: Vec<SourcedCandidate>,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub created: bool,
    pub candidate: ResumeAnalysisRow,
}

/// GET /api/v1/jobs/search
pub async fn handle_job_search(
    State(state): State<AppState>,
    Query(params): Query<JobSearchParams>,
) -> Result<Json<JobSearchResponse>, AppError> {
    let keywords = params.q.trim();
    if keywords.is_empty() {
        return Err(AppError::Validation("q cannot be empty".to_string()));
    }
    let limit = params.limit.unwrap_or(MAX_JOB_RESULTS).clamp(1, MAX_JOB_RESULTS);
    let query = JobQuery::new(keywords, params.location.as_deref(), limit);

    let jobs = state.job_search.search(&query).await;
    Ok(Json(JobSearchResponse {
        query: query.keywords,
        location: query.location,
        total: jobs.len(),
        jobs,
    }))
}

/// GET /api/v1/sourcing/search
pub async fn handle_sourcing_search(
    State(state): State<AppState>,
    Query(params): Query<SourcingParams>,
) -> Result<Json<SourcingResponse>, AppError> {
    let title = params.title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("title cannot be empty".to_string()));
    }
    let query = SourcingQuery {
        title: title.to_string(),
        location: params.location,
        skills: split_list(params.skills.as_deref()),
        limit: params
            .limit
            .unwrap_or(DEFAULT_SOURCING_LIMIT)
            .clamp(1, MAX_SOURCING_LIMIT),
    };

    if state.sourcing.is_empty() {
        debug!("No candidate sources configured; returning no results");
    }
    let candidates = state.sourcing.search(&query).await;
    Ok(Json(SourcingResponse {
        total: candidates.len(),
        candidates,
    }))
}

/// POST /api/v1/sourcing/import
///
/// Returns 201 for a new record, 200 with the existing record when the email is known.
pub async fn handle_import(
    State(state): State<AppState>,
    Json(profile): Json<ImportProfile>,
) -> Result<(StatusCode, Json<ImportResponse>), AppError> {
    let (candidate, created) = import_profile(&state.db, &profile).await?;
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(ImportResponse { created, candidate })))
}

/// GET /api/v1/providers
pub async fn handle_provider_status(State(state): State<AppState>) -> Json<ProviderStatus> {
    Json(state.config.provider_status())
}
