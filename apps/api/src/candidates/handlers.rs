//! Axum route handlers for stored candidates.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::analysis::{
    CandidateSkillRow, CandidateStatus, CandidateTagRow, NewSkill, ResumeAnalysisRow,
};
use crate::state::AppState;

use super::query::BoolQuery;
use super::repo::{self, CandidateDetail, DEFAULT_TAG_COLOR};
use super::search::{search_candidates, CandidateFilter, Pagination, SearchPage, SortOrder};
use super::similar::{rank_similar, SimilarCandidate, DEFAULT_SIMILAR_LIMIT};
use super::stats::{candidate_statistics, CandidateStatistics};

const DEFAULT_RECENT_LIMIT: i64 = 5;
const MAX_LIST_LIMIT: i64 = 50;
const MAX_TAG_LEN: usize = 50;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LimitParams {
    pub limit: Option<i64>,
}

/// Query string for `GET /api/v1/candidates`. List filters are comma-separated.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub skills: Option<String>,
    pub min_fit_rating: Option<f64>,
    pub max_risk_score: Option<f64>,
    pub min_reward_score: Option<f64>,
    pub location: Option<String>,
    pub status: Option<String>,
    pub experience: Option<String>,
    /// Boolean query over the resume text, e.g. `welding AND NOT apprentice`.
    pub q: Option<String>,
    pub sort_by: Option<SortOrder>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct SkillRequest {
    pub skill_name: String,
    pub skill_level: Option<String>,
    pub years_experience: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct TagRequest {
    pub tag_name: String,
    pub tag_color: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SimilarResponse {
    pub reference_id: Uuid,
    pub candidates: Vec<SimilarCandidate>,
}

pub(crate) fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

fn parse_status(raw: &str) -> Result<CandidateStatus, AppError> {
    CandidateStatus::parse(raw).ok_or_else(|| {
        AppError::Validation(format!(
            "Invalid status '{raw}'. Expected one of: active, contacted, archived, sourced"
        ))
    })
}

impl SearchParams {
    pub fn into_filter(self) -> Result<(CandidateFilter, Pagination), AppError> {
        let status = match self.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => Some(parse_status(raw)?),
            None => None,
        };
        let query = match self.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            Some(raw) => Some(
                BoolQuery::parse(raw)
                    .map_err(|e| AppError::Validation(format!("Invalid search query: {e}")))?,
            ),
            None => None,
        };
        let filter = CandidateFilter {
            skills: split_list(self.skills.as_deref()),
            min_fit_rating: self.min_fit_rating,
            max_risk_score: self.max_risk_score,
            min_reward_score: self.min_reward_score,
            location: self.location,
            status,
            experience_keywords: split_list(self.experience.as_deref()),
            query,
            sort: self.sort_by.unwrap_or_default(),
        };
        Ok((filter, Pagination::new(self.page, self.per_page)))
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Candidate {id} not found"))
}

async fn ensure_exists(state: &AppState, id: Uuid) -> Result<(), AppError> {
    repo::get_analysis(&state.db, id)
        .await?
        .map(|_| ())
        .ok_or_else(|| not_found(id))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/resumes/recent
pub async fn handle_recent(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Result<Json<Vec<ResumeAnalysisRow>>, AppError> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_RECENT_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);
    Ok(Json(repo::list_recent(&state.db, limit).await?))
}

/// GET /api/v1/resumes/history
pub async fn handle_history(
    State(state): State<AppState>,
) -> Result<Json<Vec<ResumeAnalysisRow>>, AppError> {
    Ok(Json(repo::list_history(&state.db).await?))
}

/// GET /api/v1/candidates
pub async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchPage>, AppError> {
    let (filter, pagination) = params.into_filter()?;
    Ok(Json(search_candidates(&state.db, &filter, pagination).await?))
}

/// GET /api/v1/candidates/stats
pub async fn handle_stats(
    State(state): State<AppState>,
) -> Result<Json<CandidateStatistics>, AppError> {
    Ok(Json(candidate_statistics(&state.db).await?))
}

/// GET /api/v1/candidates/:id
pub async fn handle_get_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CandidateDetail>, AppError> {
    repo::get_candidate_detail(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

/// DELETE /api/v1/candidates/:id
pub async fn handle_delete_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !repo::delete_analysis(&state.db, id).await? {
        return Err(not_found(id));
    }
    info!("Deleted candidate {id}");
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/v1/candidates/:id/status
pub async fn handle_update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<StatusRequest>,
) -> Result<Json<ResumeAnalysisRow>, AppError> {
    let status = parse_status(&request.status)?;
    let row = repo::update_status(&state.db, id, status)
        .await?
        .ok_or_else(|| not_found(id))?;
    info!("Candidate {id} status set to {}", status.as_str());
    Ok(Json(row))
}

/// POST /api/v1/candidates/:id/skills
pub async fn handle_add_skill(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SkillRequest>,
) -> Result<(StatusCode, Json<CandidateSkillRow>), AppError> {
    let name = request.skill_name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("skill_name cannot be empty".to_string()));
    }
    if let Some(years) = request.years_experience {
        if !years.is_finite() || years < 0.0 {
            return Err(AppError::Validation(
                "years_experience must be a non-negative number".to_string(),
            ));
        }
    }
    ensure_exists(&state, id).await?;

    let skill = NewSkill {
        name: name.to_string(),
        level: request
            .skill_level
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty()),
        years: request.years_experience,
    };
    let row = repo::add_skill(&state.db, id, &skill).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// POST /api/v1/candidates/:id/tags
pub async fn handle_add_tag(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<TagRequest>,
) -> Result<(StatusCode, Json<CandidateTagRow>), AppError> {
    let name = request.tag_name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("tag_name cannot be empty".to_string()));
    }
    if name.chars().count() > MAX_TAG_LEN {
        return Err(AppError::Validation(format!(
            "tag_name must be at most {MAX_TAG_LEN} characters"
        )));
    }
    let color = request
        .tag_color
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_TAG_COLOR);
    ensure_exists(&state, id).await?;

    let row = repo::add_tag(&state.db, id, name, color).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// DELETE /api/v1/candidates/:id/tags/:tag_id
pub async fn handle_remove_tag(
    State(state): State<AppState>,
    Path((id, tag_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    if !repo::remove_tag(&state.db, id, tag_id).await? {
        return Err(AppError::NotFound(format!(
            "Tag {tag_id} not found on candidate {id}"
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/candidates/:id/similar
pub async fn handle_similar(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<LimitParams>,
) -> Result<Json<SimilarResponse>, AppError> {
    let reference = repo::get_analysis(&state.db, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    let limit = params
        .limit
        .map(|l| l.clamp(1, MAX_LIST_LIMIT) as usize)
        .unwrap_or(DEFAULT_SIMILAR_LIMIT);

    let others = repo::list_others(&state.db, id).await?;
    Ok(Json(SimilarResponse {
        reference_id: id,
        candidates: rank_similar(&reference, others, limit),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list() {
        assert_eq!(
            split_list(Some("welding, HVAC,, ,plc")),
            vec!["welding", "HVAC", "plc"]
        );
        assert!(split_list(None).is_empty());
    }

    #[test]
    fn test_search_params_into_filter() {
        let params = SearchParams {
            skills: Some("welding,plc".to_string()),
            status: Some("Contacted".to_string()),
            sort_by: Some(SortOrder::RiskAsc),
            per_page: Some(1000),
            ..SearchParams::default()
        };
        let (filter, pagination) = params.into_filter().unwrap();
        assert_eq!(filter.skills.len(), 2);
        assert_eq!(filter.status, Some(CandidateStatus::Contacted));
        assert_eq!(filter.sort, SortOrder::RiskAsc);
        assert_eq!(pagination.per_page, 100);
    }

    #[test]
    fn test_invalid_status_rejected() {
        let params = SearchParams {
            status: Some("hired".to_string()),
            ..SearchParams::default()
        };
        assert!(matches!(params.into_filter(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_boolean_query_parsed_into_filter() {
        let params = SearchParams {
            q: Some("  electrician NOT apprentice ".to_string()),
            ..SearchParams::default()
        };
        let (filter, _) = params.into_filter().unwrap();
        assert!(matches!(filter.query, Some(BoolQuery::And(_))));

        let blank = SearchParams {
            q: Some("  ".to_string()),
            ..SearchParams::default()
        };
        assert!(blank.into_filter().unwrap().0.query.is_none());
    }

    #[test]
    fn test_malformed_boolean_query_rejected() {
        let params = SearchParams {
            q: Some("(welding OR".to_string()),
            ..SearchParams::default()
        };
        match params.into_filter() {
            Err(AppError::Validation(msg)) => assert!(msg.starts_with("Invalid search query")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
