//! Turns a sourced profile into a stored candidate record.

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use sqlx::PgPool;
use tracing::info;

use crate::candidates::repo;
use crate::errors::AppError;
use crate::models::analysis::{
    CandidateSource, CandidateStatus, NewResumeAnalysis, NewSkill, ResumeAnalysisRow,
};

/// A profile as submitted for import, typically a `SourcedCandidate` edited by a recruiter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImportProfile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub title: Option<String>,
    pub company: Option<String>,
    pub experience: Option<String>,
    pub education: Option<String>,
    pub summary: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub profile_url: Option<String>,
    pub source: Option<String>,
}

fn clean(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl ImportProfile {
    /// First and last name, split from `full_name` when the parts are missing.
    fn names(&self) -> (Option<String>, Option<String>) {
        let first = clean(&self.first_name);
        let last = clean(&self.last_name);
        if first.is_some() || last.is_some() {
            return (first, last);
        }
        match clean(&self.full_name) {
            Some(full) => match full.split_once(' ') {
                Some((f, l)) => (Some(f.to_string()), Some(l.trim().to_string())),
                None => (Some(full), None),
            },
            None => (None, None),
        }
    }

    pub fn email(&self) -> Option<String> {
        clean(&self.email).map(|e| e.to_lowercase())
    }
}

/// Renders the profile as the text stored in place of a resume.
pub fn profile_summary(profile: &ImportProfile) -> String {
    let mut parts = Vec::new();
    let (first, last) = profile.names();

    if first.is_some() || last.is_some() {
        let name = format!(
            "{} {}",
            first.unwrap_or_default(),
            last.unwrap_or_default()
        );
        parts.push(format!("Name: {}", name.trim()));
    }
    if let Some(title) = clean(&profile.title) {
        parts.push(format!("Current Role: {title}"));
    }
    if let Some(company) = clean(&profile.company) {
        parts.push(format!("Company: {company}"));
    }
    if let Some(location) = clean(&profile.location) {
        parts.push(format!("Location: {location}"));
    }
    if let Some(url) = clean(&profile.profile_url) {
        parts.push(format!("Profile: {url}"));
    }
    if let Some(experience) = clean(&profile.experience) {
        parts.push(format!("\nExperience:\n{experience}"));
    }
    let skills: Vec<&str> = profile
        .skills
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if !skills.is_empty() {
        parts.push(format!("\nSkills: {}", skills.join(", ")));
    }
    if let Some(education) = clean(&profile.education) {
        parts.push(format!("\nEducation:\n{education}"));
    }
    if let Some(summary) = clean(&profile.summary) {
        parts.push(format!("\nSummary:\n{summary}"));
    }

    parts.join("\n")
}

/// Builds the record for a sourced profile. Analysis fields stay empty until a
/// resume is uploaded for the candidate.
pub fn to_new_analysis(profile: &ImportProfile) -> Result<NewResumeAnalysis, AppError> {
    let resume_text = profile_summary(profile);
    if resume_text.is_empty() {
        return Err(AppError::Validation(
            "Profile has no content to import".to_string(),
        ));
    }
    let (first_name, last_name) = profile.names();

    let mut skills: Vec<NewSkill> = Vec::new();
    for name in profile.skills.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        if !skills.iter().any(|s| s.name.eq_ignore_ascii_case(name)) {
            skills.push(NewSkill {
                name: name.to_string(),
                level: None,
                years: None,
            });
        }
    }

    Ok(NewResumeAnalysis {
        filename: format!("sourced_profile_{}.txt", Utc::now().timestamp()),
        first_name,
        last_name,
        email: profile.email(),
        phone: clean(&profile.phone),
        location: clean(&profile.location),
        resume_text,
        job_description: None,
        candidate_strengths: vec![],
        candidate_weaknesses: vec![],
        risk_factor_score: None,
        risk_factor_explanation: None,
        reward_factor_score: None,
        reward_factor_explanation: None,
        overall_fit_rating: None,
        justification: None,
        relevant_jobs: Value::Array(vec![]),
        status: CandidateStatus::Sourced,
        source: CandidateSource::ExternalSourcing,
        skills,
    })
}

/// Advisory lock key for imports of one email. Case and surrounding whitespace are ignored.
pub fn import_lock_key(email: &str) -> i64 {
    // 64-bit FNV-1a
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in email.trim().to_lowercase().bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash as i64
}

/// Imports a profile, returning the existing record when the email is already known.
/// The flag is `true` when a new record was created. Concurrent imports of one
/// email are serialized by a transaction-scoped advisory lock.
pub async fn import_profile(
    pool: &PgPool,
    profile: &ImportProfile,
) -> Result<(ResumeAnalysisRow, bool), AppError> {
    let mut tx = pool.begin().await?;

    if let Some(email) = profile.email() {
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(import_lock_key(&email))
            .execute(&mut *tx)
            .await?;
        if let Some(existing) = repo::find_by_email(&mut *tx, &email).await? {
            tx.commit().await?;
            info!("Sourced candidate already exists: {email}");
            return Ok((existing, false));
        }
    }

    let new = to_new_analysis(profile)?;
    let row = repo::insert_analysis_in(&mut *tx, &new).await?;
    tx.commit().await?;
    info!(
        "Imported sourced candidate {} from {}",
        row.id,
        profile.source.as_deref().unwrap_or("unknown source")
    );
    Ok((row, true))
}
