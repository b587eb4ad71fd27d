use std::sync::Arc;

use sqlx::PgPool;

use crate::analysis::ResumeAnalyzer;
use crate::config::Config;
use crate::providers::aggregate::{CandidateSourcing, JobSearch};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// Pluggable resume analyzer. Default: LlmResumeAnalyzer.
    pub analyzer: Arc<dyn ResumeAnalyzer>,
    /// Job boards with credentials configured; may be empty.
    pub job_search: Arc<JobSearch>,
    pub sourcing: Arc<CandidateSourcing>,
}
