//! Candidate-sourcing clients: GitHub user search and People Data Labs.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::warn;

use super::{fetch_json, str_field, CandidateSource, ProviderError, SourcedCandidate, SourcingQuery};

/// GitHub's search API is rate-limited; only the leading skills are queried.
const GITHUB_MAX_SKILL_QUERIES: usize = 2;

pub struct GitHubSource {
    client: Client,
    token: String,
}

impl GitHubSource {
    const URL: &'static str = "https://api.github.com/search/users";

    pub fn new(client: Client, token: String) -> Self {
        Self { client, token }
    }
}

/// Builds one GitHub search expression per skill, or one from the title when no
/// skills were given.
pub fn github_queries(query: &SourcingQuery) -> Vec<(String, String)> {
    let location = query
        .location
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| format!(" location:\"{l}\""))
        .unwrap_or_default();

    let skills: Vec<&str> = query
        .skills
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .take(GITHUB_MAX_SKILL_QUERIES)
        .collect();

    if skills.is_empty() {
        let title = query.title.trim();
        return vec![(title.to_string(), format!("{title} in:bio{location}"))];
    }
    skills
        .into_iter()
        .map(|skill| (skill.to_string(), format!("{skill} language:{skill}{location}")))
        .collect()
}

#[async_trait]
impl CandidateSource for GitHubSource {
    fn name(&self) -> &'static str {
        "GitHub"
    }

    async fn search(&self, query: &SourcingQuery) -> Result<Vec<SourcedCandidate>, ProviderError> {
        let mut results = Vec::new();
        for (skill, q) in github_queries(query) {
            let request = self
                .client
                .get(Self::URL)
                .header("Accept", "application/vnd.github.v3+json")
                .bearer_auth(&self.token)
                .query(&[("q", q), ("per_page", query.limit.to_string())]);
            let result = fetch_json(self.name(), request)
                .await
                .map(|body| map_github_users(&body, &skill));
            results.push(result);
        }
        merge_query_results(self.name(), results)
    }
}

/// Keeps users from the queries that succeeded. Fails only when every query failed.
fn merge_query_results(
    provider: &'static str,
    results: Vec<Result<Vec<SourcedCandidate>, ProviderError>>,
) -> Result<Vec<SourcedCandidate>, ProviderError> {
    let mut candidates = Vec::new();
    let mut succeeded = false;
    let mut last_error = None;
    for result in results {
        match result {
            Ok(found) => {
                succeeded = true;
                candidates.extend(found);
            }
            Err(e) => {
                warn!(provider, error = %e, "Sourcing query failed");
                last_error = Some(e);
            }
        }
    }
    match last_error {
        Some(e) if !succeeded => Err(e),
        _ => Ok(candidates),
    }
}

pub fn map_github_users(body: &Value, skill: &str) -> Vec<SourcedCandidate> {
    let Some(items) = body.get("items").and_then(Value::as_array) else {
        return vec![];
    };
    items
        .iter()
        .filter_map(|user| {
            let login = str_field(user, "login")?;
            let external_id = user
                .get("id")
                .and_then(Value::as_u64)
                .map(|id| id.to_string())
                .unwrap_or_else(|| login.clone());
            Some(SourcedCandidate {
                source: "GitHub".to_string(),
                external_id,
                full_name: Some(login),
                first_name: None,
                last_name: None,
                email: None,
                title: Some("Developer".to_string()),
                company: None,
                location: None,
                profile_url: str_field(user, "html_url"),
                avatar_url: str_field(user, "avatar_url"),
                skills: vec![skill.to_string()],
                summary: None,
            })
        })
        .collect()
}

pub struct PeopleDataLabsSource {
    client: Client,
    api_key: String,
}

impl PeopleDataLabsSource {
    const URL: &'static str = "https://api.peopledatalabs.com/v5/person/search";

    pub fn new(client: Client, api_key: String) -> Self {
        Self { client, api_key }
    }
}

/// Elasticsearch-style person query: title must match, location and skills narrow it.
pub fn peopledata_body(query: &SourcingQuery) -> Value {
    let mut must = vec![json!({"match": {"job_title": query.title.trim()}})];
    if let Some(location) = query.location.as_deref().map(str::trim).filter(|l| !l.is_empty()) {
        must.push(json!({"match": {"location_name": location}}));
    }
    let skills: Vec<String> = query
        .skills
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();
    if !skills.is_empty() {
        must.push(json!({"terms": {"skills": skills}}));
    }
    json!({
        "query": {"bool": {"must": must}},
        "size": query.limit,
    })
}

#[async_trait]
impl CandidateSource for PeopleDataLabsSource {
    fn name(&self) -> &'static str {
        "PeopleDataLabs"
    }

    async fn search(&self, query: &SourcingQuery) -> Result<Vec<SourcedCandidate>, ProviderError> {
        let request = self
            .client
            .post(Self::URL)
            .header("X-Api-Key", &self.api_key)
            .json(&peopledata_body(query));
        let body = fetch_json(self.name(), request).await?;
        map_peopledata(&body).map_err(|message| ProviderError::Payload {
            provider: "PeopleDataLabs",
            message,
        })
    }
}

pub fn map_peopledata(body: &Value) -> Result<Vec<SourcedCandidate>, String> {
    let items = body
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| "missing 'data' array".to_string())?;

    Ok(items
        .iter()
        .filter_map(|person| {
            let external_id = str_field(person, "id")?;
            let profile_url = str_field(person, "linkedin_url").map(|url| {
                if url.starts_with("http") {
                    url
                } else {
                    format!("https://{url}")
                }
            });
            let skills = person
                .get("skills")
                .and_then(Value::as_array)
                .map(|s| {
                    s.iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            Some(SourcedCandidate {
                source: "PeopleDataLabs".to_string(),
                external_id,
                full_name: str_field(person, "full_name"),
                first_name: str_field(person, "first_name"),
                last_name: str_field(person, "last_name"),
                email: str_field(person, "work_email")
                    .or_else(|| str_field(person, "recommended_personal_email")),
                title: str_field(person, "job_title"),
                company: str_field(person, "job_company_name"),
                location: str_field(person, "location_name"),
                profile_url,
                avatar_url: None,
                skills,
                summary: str_field(person, "summary"),
            })
        })
        .collect())
}
