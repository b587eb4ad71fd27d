//! Resume analysis: one structured-completion call per resume, validated against
//! a fixed schema.
//!
//! `AppState` holds an `Arc<dyn ResumeAnalyzer>` so handlers never depend on the
//! concrete model client.

pub mod contact;
pub mod intake;
pub mod prompts;
pub mod schema;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::llm_client::LlmClient;

use self::prompts::{
    ANALYSIS_PROMPT_TEMPLATE, ANALYSIS_SYSTEM, GENERAL_SCREENING_SECTION, JOB_SECTION_TEMPLATE,
};
use self::schema::{parse_analysis, AnalysisResponse};

const ANALYSIS_TEMPERATURE: f32 = 0.2;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("model call failed: {0}")]
    Llm(#[from] crate::llm_client::LlmError),

    #[error("response is missing required field '{0}'")]
    MissingField(&'static str),

    #[error("response does not match the schema: {0}")]
    Schema(String),

    #[error("{field} must be between 1 and 10, got {value}")]
    ScoreOutOfRange { field: &'static str, value: f64 },
}

#[async_trait]
pub trait ResumeAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        resume_text: &str,
        job_description: Option<&str>,
    ) -> Result<AnalysisResponse, AnalysisError>;
}

/// Analyzer backed by the chat-completion client. A failed call is not retried.
pub struct LlmResumeAnalyzer {
    llm: LlmClient,
}

impl LlmResumeAnalyzer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ResumeAnalyzer for LlmResumeAnalyzer {
    async fn analyze(
        &self,
        resume_text: &str,
        job_description: Option<&str>,
    ) -> Result<AnalysisResponse, AnalysisError> {
        let prompt = build_prompt(resume_text, job_description);
        let system = format!("{ANALYSIS_SYSTEM}\n\n{JSON_ONLY_INSTRUCTION}");
        let raw: Value = self
            .llm
            .call_json(&prompt, &system, ANALYSIS_TEMPERATURE)
            .await?;
        let analysis = parse_analysis(raw)?;

        info!(
            "Resume analyzed: fit={} skills={}",
            analysis.overall_fit_rating,
            analysis.skills.len()
        );
        Ok(analysis)
    }
}

/// Fills the analysis template. A blank job description means general screening.
pub fn build_prompt(resume_text: &str, job_description: Option<&str>) -> String {
    let job_section = match job_description.map(str::trim).filter(|jd| !jd.is_empty()) {
        Some(jd) => fill_template(JOB_SECTION_TEMPLATE, &[("{job_description}", jd)]),
        None => GENERAL_SCREENING_SECTION.to_string(),
    };
    fill_template(
        ANALYSIS_PROMPT_TEMPLATE,
        &[("{job_section}", job_section.as_str()), ("{resume_text}", resume_text)],
    )
}

/// Substitutes placeholders found in `template` only. Inserted values are never rescanned.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    loop {
        let next = values
            .iter()
            .filter_map(|(key, value)| rest.find(key).map(|at| (at, *key, *value)))
            .min_by_key(|(at, _, _)| *at);
        match next {
            Some((at, key, value)) => {
                out.push_str(&rest[..at]);
                out.push_str(value);
                rest = &rest[at + key.len()..];
            }
            None => {
                out.push_str(rest);
                return out;
            }
        }
    }
}
