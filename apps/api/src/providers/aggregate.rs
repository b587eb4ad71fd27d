//! Concurrent fan-out over configured providers, merged in provider order.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::config::ProviderKeys;

use super::job_boards::{IndeedBoard, JSearchBoard, UsaJobsBoard, ZipRecruiterBoard};
use super::sourcing::{GitHubSource, PeopleDataLabsSource};
use super::{
    http_client, CandidateSource, IdentityKey, JobBoard, JobPosting, JobQuery, ProviderError,
    SourcedCandidate, SourcingQuery,
};

/// Upper bound on merged job results.
pub const MAX_JOB_RESULTS: usize = 20;
/// Fallback boards are queried only when the primary tier returns fewer results.
pub const FALLBACK_THRESHOLD: usize = 10;
const PRIMARY_PER_BOARD: usize = 15;
const FALLBACK_PER_BOARD: usize = 5;

/// Concatenates lists in order and keeps the first entry for each identity key.
pub fn merge_unique<T: IdentityKey>(lists: Vec<Vec<T>>) -> Vec<T> {
    let mut seen = HashSet::new();
    lists
        .into_iter()
        .flatten()
        .filter(|item| seen.insert(item.identity_key()))
        .collect()
}

#[derive(Default)]
pub struct JobSearch {
    primary: Vec<Arc<dyn JobBoard>>,
    fallback: Vec<Arc<dyn JobBoard>>,
}

impl JobSearch {
    pub fn new(primary: Vec<Arc<dyn JobBoard>>, fallback: Vec<Arc<dyn JobBoard>>) -> Self {
        Self { primary, fallback }
    }

    /// JSearch is the primary aggregator; the individual boards are fallbacks.
    pub fn from_config(keys: &ProviderKeys) -> Result<Self, ProviderError> {
        let client = http_client()?;
        let mut primary: Vec<Arc<dyn JobBoard>> = Vec::new();
        let mut fallback: Vec<Arc<dyn JobBoard>> = Vec::new();

        if let Some(key) = &keys.rapidapi_key {
            primary.push(Arc::new(JSearchBoard::new(client.clone(), key.clone())));
        }
        if let Some(key) = &keys.ziprecruiter_api_key {
            fallback.push(Arc::new(ZipRecruiterBoard::new(client.clone(), key.clone())));
        }
        if let Some(id) = &keys.indeed_publisher_id {
            fallback.push(Arc::new(IndeedBoard::new(client.clone(), id.clone())));
        }
        if let Some(key) = &keys.usajobs_api_key {
            fallback.push(Arc::new(UsaJobsBoard::new(
                client.clone(),
                key.clone(),
                keys.usajobs_user_agent.clone(),
            )));
        }

        info!(
            "Job boards configured: primary={} fallback={}",
            primary.len(),
            fallback.len()
        );
        Ok(Self::new(primary, fallback))
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_empty() && self.fallback.is_empty()
    }

    pub async fn search(&self, query: &JobQuery) -> Vec<JobPosting> {
        let primary_query = query.with_limit(query.limit.max(PRIMARY_PER_BOARD));
        let mut lists = query_boards(&self.primary, &primary_query).await;

        let primary_count: usize = lists.iter().map(Vec::len).sum();
        if primary_count < FALLBACK_THRESHOLD && !self.fallback.is_empty() {
            debug!("Primary boards returned {primary_count} jobs; querying fallback boards");
            let fallback_query = query.with_limit(FALLBACK_PER_BOARD);
            lists.extend(query_boards(&self.fallback, &fallback_query).await);
        }

        let mut jobs = merge_unique(lists);
        jobs.truncate(MAX_JOB_RESULTS.min(query.limit.max(1)));
        jobs
    }
}

async fn query_boards(boards: &[Arc<dyn JobBoard>], query: &JobQuery) -> Vec<Vec<JobPosting>> {
    let futures = boards.iter().map(|board| async move {
        match board.search(query).await {
            Ok(jobs) => jobs,
            Err(e) => {
                warn!(provider = board.name(), error = %e, "Job board search failed");
                Vec::new()
            }
        }
    });
    join_all(futures).await
}

#[derive(Default)]
pub struct CandidateSourcing {
    sources: Vec<Arc<dyn CandidateSource>>,
}

impl CandidateSourcing {
    pub fn new(sources: Vec<Arc<dyn CandidateSource>>) -> Self {
        Self { sources }
    }

    pub fn from_config(keys: &ProviderKeys) -> Result<Self, ProviderError> {
        let client = http_client()?;
        let mut sources: Vec<Arc<dyn CandidateSource>> = Vec::new();

        if let Some(token) = &keys.github_token {
            sources.push(Arc::new(GitHubSource::new(client.clone(), token.clone())));
        }
        if let Some(key) = &keys.peopledata_key {
            sources.push(Arc::new(PeopleDataLabsSource::new(client.clone(), key.clone())));
        }

        info!("Candidate sources configured: {}", sources.len());
        Ok(Self::new(sources))
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub async fn search(&self, query: &SourcingQuery) -> Vec<SourcedCandidate> {
        let futures = self.sources.iter().map(|source| async move {
            match source.search(query).await {
                Ok(found) => found,
                Err(e) => {
                    warn!(provider = source.name(), error = %e, "Candidate source search failed");
                    Vec::new()
                }
            }
        });
        merge_unique(join_all(futures).await)
    }
}
