//! The upload pipeline after validation: extract, analyze, enrich, persist.
//!
//! Nothing is written until analysis succeeds; a failed step leaves no row behind.

use serde_json::Value;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::candidates::repo;
use crate::errors::AppError;
use crate::extraction::extract_text_blocking;
use crate::models::analysis::{
    CandidateSource, CandidateStatus, NewResumeAnalysis, NewSkill, ResumeAnalysisRow,
};
use crate::providers::aggregate::JobSearch;
use crate::providers::JobQuery;
use crate::upload::ValidatedUpload;

use super::contact::{extract_email, extract_phone};
use super::schema::AnalysisResponse;
use super::ResumeAnalyzer;

/// Skills used to look up relevant jobs.
const JOB_QUERY_SKILLS: usize = 3;
const RELEVANT_JOBS_LIMIT: usize = 5;

/// Runs extraction and analysis and assembles the record to insert.
pub async fn prepare_analysis(
    upload: ValidatedUpload,
    job_description: Option<String>,
    source: CandidateSource,
    analyzer: &dyn ResumeAnalyzer,
    job_search: &JobSearch,
) -> Result<NewResumeAnalysis, AppError> {
    let ValidatedUpload {
        filename,
        kind,
        bytes,
    } = upload;

    let resume_text = extract_text_blocking(kind, bytes).await?;
    info!(
        "Extracted {} characters from {filename} ({kind})",
        resume_text.chars().count()
    );

    let job_description = job_description
        .map(|jd| jd.trim().to_string())
        .filter(|jd| !jd.is_empty());

    let analysis = analyzer
        .analyze(&resume_text, job_description.as_deref())
        .await?;

    let skills = dedup_skills(&analysis);
    let relevant_jobs = find_relevant_jobs(job_search, &skills).await;

    Ok(build_record(
        filename,
        resume_text,
        job_description,
        source,
        analysis,
        skills,
        relevant_jobs,
    ))
}

/// Validated upload in, stored record out.
pub async fn process_upload(
    pool: &PgPool,
    upload: ValidatedUpload,
    job_description: Option<String>,
    source: CandidateSource,
    analyzer: &dyn ResumeAnalyzer,
    job_search: &JobSearch,
) -> Result<ResumeAnalysisRow, AppError> {
    let new = prepare_analysis(upload, job_description, source, analyzer, job_search).await?;
    Ok(repo::insert_analysis(pool, &new).await?)
}

fn dedup_skills(analysis: &AnalysisResponse) -> Vec<NewSkill> {
    let mut skills: Vec<NewSkill> = Vec::new();
    for insight in &analysis.skills {
        if skills.iter().any(|s| s.name.eq_ignore_ascii_case(&insight.name)) {
            continue;
        }
        skills.push(NewSkill {
            name: insight.name.clone(),
            level: insight.proficiency.clone(),
            years: insight.years,
        });
    }
    skills
}

/// Provider failures are already logged by the aggregator; an upload never fails here.
async fn find_relevant_jobs(job_search: &JobSearch, skills: &[NewSkill]) -> Value {
    if job_search.is_empty() || skills.is_empty() {
        return Value::Array(vec![]);
    }
    let keywords = skills
        .iter()
        .take(JOB_QUERY_SKILLS)
        .map(|s| s.name.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let jobs = job_search
        .search(&JobQuery::new(keywords, None, RELEVANT_JOBS_LIMIT))
        .await;
    serde_json::to_value(jobs).unwrap_or_else(|e| {
        warn!("Could not serialize relevant jobs: {e}");
        Value::Array(vec![])
    })
}

fn build_record(
    filename: String,
    resume_text: String,
    job_description: Option<String>,
    source: CandidateSource,
    analysis: AnalysisResponse,
    skills: Vec<NewSkill>,
    relevant_jobs: Value,
) -> NewResumeAnalysis {
    let email = analysis.email.or_else(|| extract_email(&resume_text));
    let phone = analysis.phone.or_else(|| extract_phone(&resume_text));

    NewResumeAnalysis {
        filename,
        first_name: analysis.first_name,
        last_name: analysis.last_name,
        email,
        phone,
        location: None,
        resume_text,
        job_description,
        candidate_strengths: analysis.candidate_strengths,
        candidate_weaknesses: analysis.candidate_weaknesses,
        risk_factor_score: Some(analysis.risk_factor.score),
        risk_factor_explanation: Some(analysis.risk_factor.explanation),
        reward_factor_score: Some(analysis.reward_factor.score),
        reward_factor_explanation: Some(analysis.reward_factor.explanation),
        overall_fit_rating: Some(analysis.overall_fit_rating),
        justification: Some(analysis.justification_for_rating),
        relevant_jobs,
        status: CandidateStatus::Active,
        source,
        skills,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::analysis::schema::{parse_analysis, tests::valid_response};
    use crate::analysis::AnalysisError;
    use crate::upload::validate_upload;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers every call with a fixed model response, run through schema validation.
    pub(crate) struct StubAnalyzer {
        pub response: Value,
        pub calls: AtomicUsize,
    }

    impl StubAnalyzer {
        pub(crate) fn new(response: Value) -> Self {
            Self {
                response,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ResumeAnalyzer for StubAnalyzer {
        async fn analyze(
            &self,
            _resume_text: &str,
            _job_description: Option<&str>,
        ) -> Result<AnalysisResponse, AnalysisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            parse_analysis(self.response.clone())
        }
    }

    fn text_upload(content: &'static str) -> ValidatedUpload {
        validate_upload("resume.txt", Some("text/plain"), Bytes::from_static(content.as_bytes()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_null_email_recovered_from_resume_text() {
        let mut response = valid_response();
        response["email"] = Value::Null;
        let analyzer = StubAnalyzer::new(response);

        let new = prepare_analysis(
            text_upload("John Doe, john@example.com"),
            None,
            CandidateSource::ManualUpload,
            &analyzer,
            &JobSearch::default(),
        )
        .await
        .unwrap();

        assert_eq!(new.email.as_deref(), Some("john@example.com"));
        assert_eq!(new.resume_text, "John Doe, john@example.com");
        assert_eq!(new.filename, "resume.txt");
        assert_eq!(new.status, CandidateStatus::Active);
        assert_eq!(new.relevant_jobs, Value::Array(vec![]));
    }

    #[tokio::test]
    async fn test_model_email_is_lowercased() {
        let analyzer = StubAnalyzer::new(valid_response());
        let new = prepare_analysis(
            text_upload("John Doe"),
            Some("  Electrician  ".to_string()),
            CandidateSource::Email,
            &analyzer,
            &JobSearch::default(),
        )
        .await
        .unwrap();

        assert_eq!(new.email.as_deref(), Some("john@example.com"));
        assert_eq!(new.job_description.as_deref(), Some("Electrician"));
        assert_eq!(new.overall_fit_rating, Some(7.5));
        assert_eq!(new.skills.len(), 2);
        assert_eq!(new.source, CandidateSource::Email);
    }

    #[tokio::test]
    async fn test_missing_field_produces_no_record() {
        let mut response = valid_response();
        response.as_object_mut().unwrap().remove("overall_fit_rating");
        let analyzer = StubAnalyzer::new(response);

        let result = prepare_analysis(
            text_upload("John Doe, john@example.com"),
            None,
            CandidateSource::ManualUpload,
            &analyzer,
            &JobSearch::default(),
        )
        .await;

        assert!(matches!(
            result,
            Err(AppError::Analysis(AnalysisError::MissingField("overall_fit_rating")))
        ));
    }

    #[tokio::test]
    async fn test_extraction_failure_skips_analysis() {
        let analyzer = StubAnalyzer::new(valid_response());
        let result = prepare_analysis(
            text_upload("   \n  "),
            None,
            CandidateSource::ManualUpload,
            &analyzer,
            &JobSearch::default(),
        )
        .await;

        assert!(matches!(result, Err(AppError::Extraction(_))));
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_dedup_skills_case_insensitive() {
        let mut response = valid_response();
        response["skills"] = serde_json::json!([
            {"name": "Welding"}, {"name": "welding"}, {"name": "PLC"}
        ]);
        let analysis = parse_analysis(response).unwrap();
        let skills = dedup_skills(&analysis);
        assert_eq!(skills.len(), 2);
        assert_eq!(skills[0].name, "Welding");
    }
}
