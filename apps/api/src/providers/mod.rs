//! External job boards and candidate-sourcing APIs.
//!
//! Every integration is optional: a provider without credentials is never
//! constructed. Errors stay inside this module; `aggregate` logs and skips them.

pub mod aggregate;
pub mod handlers;
pub mod import;
pub mod job_boards;
pub mod sourcing;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

const PROVIDER_TIMEOUT_SECS: u64 = 10;
pub const USER_AGENT: &str = concat!("screener/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_LOCATION: &str = "United States";

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} returned status {status}")]
    Api { provider: &'static str, status: u16 },

    #[error("{provider} returned an unexpected payload: {message}")]
    Payload {
        provider: &'static str,
        message: String,
    },
}

/// A job posting normalized across boards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub url: Option<String>,
    pub summary: Option<String>,
    pub posted_date: Option<String>,
    pub salary: Option<String>,
    pub source: String,
    #[serde(default)]
    pub remote: Option<bool>,
    #[serde(default)]
    pub employment_type: Option<String>,
}

/// A candidate profile found through a sourcing API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcedCandidate {
    pub source: String,
    pub external_id: String,
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub profile_url: Option<String>,
    pub avatar_url: Option<String>,
    pub skills: Vec<String>,
    pub summary: Option<String>,
}

/// Identity used to drop duplicates when merging provider results.
pub trait IdentityKey {
    fn identity_key(&self) -> String;
}

impl IdentityKey for JobPosting {
    fn identity_key(&self) -> String {
        match self.url.as_deref().and_then(normalize_url) {
            Some(url) => format!("url:{url}"),
            None => format!(
                "job:{}|{}",
                self.title.trim().to_lowercase(),
                self.company.trim().to_lowercase()
            ),
        }
    }
}

impl IdentityKey for SourcedCandidate {
    fn identity_key(&self) -> String {
        if let Some(url) = self.profile_url.as_deref().and_then(normalize_url) {
            return format!("url:{url}");
        }
        if let Some(email) = self.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
            return format!("email:{}", email.to_lowercase());
        }
        format!("{}:{}", self.source.to_lowercase(), self.external_id)
    }
}

/// Lowercases and strips scheme, `www.`, fragment and trailing slash.
/// Placeholder links such as `#` normalize to `None`.
pub fn normalize_url(url: &str) -> Option<String> {
    let url = url.trim().to_lowercase();
    let url = url.split('#').next().unwrap_or("");
    let url = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    let url = url.strip_prefix("www.").unwrap_or(url);
    let url = url.trim_end_matches('/');
    if url.is_empty() {
        None
    } else {
        Some(url.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct JobQuery {
    pub keywords: String,
    pub location: String,
    pub limit: usize,
}

impl JobQuery {
    pub fn new(keywords: impl Into<String>, location: Option<&str>, limit: usize) -> Self {
        Self {
            keywords: keywords.into(),
            location: location
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .unwrap_or(DEFAULT_LOCATION)
                .to_string(),
            limit,
        }
    }

    pub fn with_limit(&self, limit: usize) -> Self {
        Self {
            limit,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone)]
pub struct SourcingQuery {
    pub title: String,
    pub location: Option<String>,
    pub skills: Vec<String>,
    pub limit: usize,
}

#[async_trait]
pub trait JobBoard: Send + Sync {
    fn name(&self) -> &'static str;

    async fn search(&self, query: &JobQuery) -> Result<Vec<JobPosting>, ProviderError>;
}

#[async_trait]
pub trait CandidateSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn search(&self, query: &SourcingQuery) -> Result<Vec<SourcedCandidate>, ProviderError>;
}

/// Shared outbound client for all providers.
pub fn http_client() -> Result<Client, ProviderError> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(PROVIDER_TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()?)
}

/// Sends a request and decodes a JSON body, mapping non-2xx to `ProviderError::Api`.
pub(crate) async fn fetch_json(
    provider: &'static str,
    request: RequestBuilder,
) -> Result<Value, ProviderError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ProviderError::Api {
            provider,
            status: status.as_u16(),
        });
    }
    Ok(response.json().await?)
}

/// Reads a string field, treating blank strings as missing.
pub(crate) fn str_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Joins the non-empty parts with ", ".
pub(crate) fn join_location(parts: &[Option<String>]) -> Option<String> {
    let joined = parts
        .iter()
        .flatten()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn job(title: &str, company: &str, url: Option<&str>, source: &str) -> JobPosting {
        JobPosting {
            title: title.to_string(),
            company: company.to_string(),
            location: None,
            url: url.map(str::to_string),
            summary: None,
            posted_date: None,
            salary: None,
            source: source.to_string(),
            remote: None,
            employment_type: None,
        }
    }

    pub(crate) fn candidate(
        source: &str,
        external_id: &str,
        profile_url: Option<&str>,
        email: Option<&str>,
    ) -> SourcedCandidate {
        SourcedCandidate {
            source: source.to_string(),
            external_id: external_id.to_string(),
            full_name: None,
            first_name: None,
            last_name: None,
            email: email.map(str::to_string),
            title: None,
            company: None,
            location: None,
            profile_url: profile_url.map(str::to_string),
            avatar_url: None,
            skills: vec![],
            summary: None,
        }
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(
            normalize_url("https://www.Example.com/jobs/42/"),
            Some("example.com/jobs/42".to_string())
        );
        assert_eq!(
            normalize_url("http://example.com/jobs/42#apply"),
            Some("example.com/jobs/42".to_string())
        );
        assert_eq!(normalize_url("#"), None);
        assert_eq!(normalize_url("   "), None);
    }

    #[test]
    fn test_job_identity_prefers_url() {
        let a = job("Electrician", "Acme", Some("https://acme.com/j/1"), "JSearch");
        let b = job("Journeyman Electrician", "ACME Inc", Some("http://www.acme.com/j/1/"), "Indeed");
        assert_eq!(a.identity_key(), b.identity_key());
    }

    #[test]
    fn test_job_identity_falls_back_to_title_company() {
        let a = job("Electrician", "Acme", None, "JSearch");
        let b = job(" electrician ", "ACME", Some("#"), "Indeed");
        assert_eq!(a.identity_key(), b.identity_key());
    }

    #[test]
    fn test_candidate_identity_order() {
        let by_url = candidate("GitHub", "1", Some("https://github.com/jdoe"), Some("j@x.com"));
        assert_eq!(by_url.identity_key(), "url:github.com/jdoe");

        let by_email = candidate("PeopleDataLabs", "abc", None, Some("J@X.com"));
        assert_eq!(by_email.identity_key(), "email:j@x.com");

        let by_id = candidate("PeopleDataLabs", "abc", None, None);
        assert_eq!(by_id.identity_key(), "peopledatalabs:abc");
    }

    #[test]
    fn test_job_query_defaults_location() {
        assert_eq!(JobQuery::new("welder", None, 5).location, DEFAULT_LOCATION);
        assert_eq!(JobQuery::new("welder", Some("  "), 5).location, DEFAULT_LOCATION);
        assert_eq!(JobQuery::new("welder", Some("Austin, TX"), 5).location, "Austin, TX");
    }

    #[test]
    fn test_join_location_skips_blanks() {
        assert_eq!(
            join_location(&[Some("Austin".into()), None, Some(" TX ".into())]),
            Some("Austin, TX".to_string())
        );
        assert_eq!(join_location(&[None, Some("".into())]), None);
    }
}
