use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Recruiter-facing lifecycle of a candidate record. Changes are soft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStatus {
    Active,
    Contacted,
    Archived,
    Sourced,
}

impl CandidateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateStatus::Active => "active",
            CandidateStatus::Contacted => "contacted",
            CandidateStatus::Archived => "archived",
            CandidateStatus::Sourced => "sourced",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Some(CandidateStatus::Active),
            "contacted" => Some(CandidateStatus::Contacted),
            "archived" => Some(CandidateStatus::Archived),
            "sourced" => Some(CandidateStatus::Sourced),
            _ => None,
        }
    }
}

/// Where a candidate record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    ManualUpload,
    ExternalSourcing,
    Email,
}

impl CandidateSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateSource::ManualUpload => "manual_upload",
            CandidateSource::ExternalSourcing => "external_sourcing",
            CandidateSource::Email => "email",
        }
    }

    /// Sources a client may claim on upload. External records come in through import only.
    pub fn parse_upload(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "manual_upload" => Some(CandidateSource::ManualUpload),
            "email" => Some(CandidateSource::Email),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeAnalysisRow {
    pub id: Uuid,
    pub filename: String,
    pub upload_date: DateTime<Utc>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub resume_text: String,
    pub job_description: Option<String>,
    pub candidate_strengths: Vec<String>,
    pub candidate_weaknesses: Vec<String>,
    pub risk_factor_score: Option<f64>,
    pub risk_factor_explanation: Option<String>,
    pub reward_factor_score: Option<f64>,
    pub reward_factor_explanation: Option<String>,
    pub overall_fit_rating: Option<f64>,
    pub justification: Option<String>,
    pub relevant_jobs: Value,
    pub status: String,
    pub source: String,
    pub updated_at: DateTime<Utc>,
}

impl ResumeAnalysisRow {
    pub fn display_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or("Unknown"),
            self.last_name.as_deref().unwrap_or("")
        )
        .trim()
        .to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateSkillRow {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub skill_name: String,
    pub skill_level: Option<String>,
    pub years_experience: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateTagRow {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub tag_name: String,
    pub tag_color: String,
    pub created_at: DateTime<Utc>,
}

/// A skill to attach to a candidate on insert or by manual tagging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSkill {
    pub name: String,
    pub level: Option<String>,
    pub years: Option<f64>,
}

/// A fully prepared analysis, ready to be inserted in one transaction.
#[derive(Debug, Clone)]
pub struct NewResumeAnalysis {
    pub filename: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub resume_text: String,
    pub job_description: Option<String>,
    pub candidate_strengths: Vec<String>,
    pub candidate_weaknesses: Vec<String>,
    pub risk_factor_score: Option<f64>,
    pub risk_factor_explanation: Option<String>,
    pub reward_factor_score: Option<f64>,
    pub reward_factor_explanation: Option<String>,
    pub overall_fit_rating: Option<f64>,
    pub justification: Option<String>,
    pub relevant_jobs: Value,
    pub status: CandidateStatus,
    pub source: CandidateSource,
    pub skills: Vec<NewSkill>,
}
