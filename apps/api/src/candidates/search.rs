//! Filtered, sorted, paginated search over stored candidates.

use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::analysis::{CandidateSkillRow, CandidateStatus, CandidateTagRow, ResumeAnalysisRow};

use super::query::{expand_terms, BoolQuery};
use super::repo;

pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;
const SNIPPET_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    DateDesc,
    DateAsc,
    FitDesc,
    RiskAsc,
}

impl SortOrder {
    fn order_by(&self) -> &'static str {
        match self {
            SortOrder::DateDesc => " ORDER BY upload_date DESC",
            SortOrder::DateAsc => " ORDER BY upload_date ASC",
            SortOrder::FitDesc => " ORDER BY overall_fit_rating DESC NULLS LAST, upload_date DESC",
            SortOrder::RiskAsc => " ORDER BY risk_factor_score ASC NULLS LAST, upload_date DESC",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CandidateFilter {
    pub skills: Vec<String>,
    pub min_fit_rating: Option<f64>,
    pub max_risk_score: Option<f64>,
    pub min_reward_score: Option<f64>,
    pub location: Option<String>,
    pub status: Option<CandidateStatus>,
    pub experience_keywords: Vec<String>,
    /// Boolean expression over the resume text.
    pub query: Option<BoolQuery>,
    pub sort: SortOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Pagination {
    /// Pages start at 1; `per_page` is clamped to 1..=100.
    pub fn new(page: Option<u32>, per_page: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            per_page: per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.per_page)
    }

    pub fn pages(&self, total: i64) -> i64 {
        let per_page = i64::from(self.per_page);
        (total + per_page - 1) / per_page
    }
}

#[derive(Debug, Serialize)]
pub struct SkillSummary {
    pub skill: String,
    pub proficiency: Option<String>,
    pub years: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct TagSummary {
    pub id: Uuid,
    pub tag: String,
    pub color: String,
}

#[derive(Debug, Serialize)]
pub struct CandidateSummary {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub filename: String,
    pub upload_date: chrono::DateTime<chrono::Utc>,
    pub overall_fit_rating: Option<f64>,
    pub risk_factor_score: Option<f64>,
    pub reward_factor_score: Option<f64>,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub resume_snippet: String,
    pub status: String,
    pub source: String,
    pub skills: Vec<SkillSummary>,
    pub tags: Vec<TagSummary>,
}

#[derive(Debug, Serialize)]
pub struct SearchPage {
    pub candidates: Vec<CandidateSummary>,
    pub total: i64,
    pub pages: i64,
    pub current_page: u32,
    pub per_page: u32,
    pub has_prev: bool,
    pub has_next: bool,
}

/// First 200 characters of the resume text, with an ellipsis when cut.
pub fn snippet(text: &str) -> String {
    if text.chars().count() > SNIPPET_CHARS {
        let cut: String = text.chars().take(SNIPPET_CHARS).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

/// Escapes LIKE wildcards and wraps the term for a substring match.
pub fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// LIKE patterns for the terms and their synonyms.
fn patterns(terms: &[String]) -> Vec<String> {
    expand_terms(terms).iter().map(|t| like_pattern(t)).collect()
}

fn push_bool_query(builder: &mut QueryBuilder<'_, Postgres>, query: &BoolQuery) {
    match query {
        BoolQuery::Term(term) => {
            builder
                .push("resume_text ILIKE ANY(")
                .push_bind(patterns(std::slice::from_ref(term)))
                .push(")");
        }
        BoolQuery::Not(inner) => {
            builder.push("NOT (");
            push_bool_query(builder, inner);
            builder.push(")");
        }
        BoolQuery::And(items) | BoolQuery::Or(items) => {
            let joiner = if matches!(query, BoolQuery::And(_)) {
                " AND "
            } else {
                " OR "
            };
            builder.push("(");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    builder.push(joiner);
                }
                push_bool_query(builder, item);
            }
            builder.push(")");
        }
    }
}

/// Appends the WHERE clause for `filter`. Shared by the count and page queries.
fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &CandidateFilter) {
    builder.push(" WHERE TRUE");

    if let Some(min_fit) = filter.min_fit_rating {
        builder.push(" AND overall_fit_rating >= ").push_bind(min_fit);
    }
    if let Some(max_risk) = filter.max_risk_score {
        builder.push(" AND risk_factor_score <= ").push_bind(max_risk);
    }
    if let Some(min_reward) = filter.min_reward_score {
        builder.push(" AND reward_factor_score >= ").push_bind(min_reward);
    }

    let skills = patterns(&filter.skills);
    if !skills.is_empty() {
        builder
            .push(" AND (resume_text ILIKE ANY(")
            .push_bind(skills.clone())
            .push(") OR EXISTS (SELECT 1 FROM candidate_skills cs WHERE cs.candidate_id = resume_analyses.id AND cs.skill_name ILIKE ANY(")
            .push_bind(skills)
            .push(")))");
    }

    let keywords = patterns(&filter.experience_keywords);
    if !keywords.is_empty() {
        builder
            .push(" AND resume_text ILIKE ANY(")
            .push_bind(keywords)
            .push(")");
    }

    if let Some(location) = filter.location.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
        let pattern = like_pattern(location);
        builder
            .push(" AND (location ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR resume_text ILIKE ")
            .push_bind(pattern)
            .push(")");
    }

    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }

    if let Some(query) = &filter.query {
        builder.push(" AND ");
        push_bool_query(builder, query);
    }
}

pub async fn search_candidates(
    pool: &PgPool,
    filter: &CandidateFilter,
    pagination: Pagination,
) -> Result<SearchPage, sqlx::Error> {
    let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM resume_analyses");
    push_filters(&mut count_query, filter);
    let total: i64 = count_query.build_query_scalar().fetch_one(pool).await?;

    let mut page_query = QueryBuilder::<Postgres>::new("SELECT * FROM resume_analyses");
    push_filters(&mut page_query, filter);
    page_query
        .push(filter.sort.order_by())
        .push(" LIMIT ")
        .push_bind(i64::from(pagination.per_page))
        .push(" OFFSET ")
        .push_bind(pagination.offset());
    let rows: Vec<ResumeAnalysisRow> = page_query.build_query_as().fetch_all(pool).await?;

    let mut candidates = Vec::with_capacity(rows.len());
    for row in rows {
        let skills = repo::list_skills(pool, row.id).await?;
        let tags = repo::list_tags(pool, row.id).await?;
        candidates.push(summarize(row, skills, tags));
    }

    let pages = pagination.pages(total);
    Ok(SearchPage {
        candidates,
        total,
        pages,
        current_page: pagination.page,
        per_page: pagination.per_page,
        has_prev: pagination.page > 1,
        has_next: i64::from(pagination.page) < pages,
    })
}

pub fn summarize(
    row: ResumeAnalysisRow,
    skills: Vec<CandidateSkillRow>,
    tags: Vec<CandidateTagRow>,
) -> CandidateSummary {
    CandidateSummary {
        id: row.id,
        name: row.display_name(),
        resume_snippet: snippet(&row.resume_text),
        email: row.email,
        phone: row.phone,
        location: row.location,
        filename: row.filename,
        upload_date: row.upload_date,
        overall_fit_rating: row.overall_fit_rating,
        risk_factor_score: row.risk_factor_score,
        reward_factor_score: row.reward_factor_score,
        strengths: row.candidate_strengths,
        weaknesses: row.candidate_weaknesses,
        status: row.status,
        source: row.source,
        skills: skills
            .into_iter()
            .map(|s| SkillSummary {
                skill: s.skill_name,
                proficiency: s.skill_level,
                years: s.years_experience,
            })
            .collect(),
        tags: tags
            .into_iter()
            .map(|t| TagSummary {
                id: t.id,
                tag: t.tag_name,
                color: t.tag_color,
            })
            .collect(),
    }
}
