//! Job-board clients. Each maps its own payload onto `JobPosting`.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::{fetch_json, join_location, str_field, JobBoard, JobPosting, JobQuery, ProviderError};

const SUMMARY_CHARS: usize = 200;

fn truncate_summary(text: Option<String>) -> Option<String> {
    text.map(|t| {
        if t.chars().count() > SUMMARY_CHARS {
            let cut: String = t.chars().take(SUMMARY_CHARS).collect();
            format!("{}...", cut.trim_end())
        } else {
            t
        }
    })
}

// ────────────────────────────────────────────────────────────────────────────
// JSearch (RapidAPI aggregator, primary)
// ────────────────────────────────────────────────────────────────────────────

pub struct JSearchBoard {
    client: Client,
    api_key: String,
}

impl JSearchBoard {
    const URL: &'static str = "https://jsearch.p.rapidapi.com/search";
    const HOST: &'static str = "jsearch.p.rapidapi.com";

    pub fn new(client: Client, api_key: String) -> Self {
        Self { client, api_key }
    }
}

#[async_trait]
impl JobBoard for JSearchBoard {
    fn name(&self) -> &'static str {
        "JSearch"
    }

    async fn search(&self, query: &JobQuery) -> Result<Vec<JobPosting>, ProviderError> {
        let request = self
            .client
            .get(Self::URL)
            .header("X-RapidAPI-Key", &self.api_key)
            .header("X-RapidAPI-Host", Self::HOST)
            .query(&[
                ("query", format!("{} in {}", query.keywords, query.location)),
                ("page", "1".to_string()),
                ("num_pages", "1".to_string()),
                ("date_posted", "month".to_string()),
                ("employment_types", "FULLTIME,PARTTIME,CONTRACTOR".to_string()),
            ]);
        let body = fetch_json(self.name(), request).await?;
        let jobs = map_jsearch(&body, query.limit);
        debug!("JSearch returned {} jobs", jobs.len());
        Ok(jobs)
    }
}

pub fn map_jsearch(body: &Value, limit: usize) -> Vec<JobPosting> {
    let Some(items) = body.get("data").and_then(Value::as_array) else {
        return vec![];
    };
    items
        .iter()
        .take(limit)
        .map(|job| {
            let salary = match (
                job.get("job_min_salary").and_then(Value::as_f64),
                job.get("job_max_salary").and_then(Value::as_f64),
            ) {
                (Some(min), Some(max)) => {
                    let mut s = format!("${min:.0} - ${max:.0}");
                    if let Some(period) = str_field(job, "job_salary_period") {
                        s.push(' ');
                        s.push_str(&period);
                    }
                    Some(s)
                }
                _ => None,
            };
            JobPosting {
                title: str_field(job, "job_title").unwrap_or_else(|| "N/A".to_string()),
                company: str_field(job, "employer_name").unwrap_or_else(|| "N/A".to_string()),
                location: join_location(&[
                    str_field(job, "job_city"),
                    str_field(job, "job_state"),
                    str_field(job, "job_country"),
                ]),
                url: str_field(job, "job_apply_link").or_else(|| str_field(job, "job_google_link")),
                summary: truncate_summary(str_field(job, "job_description")),
                posted_date: str_field(job, "job_posted_at_datetime_utc")
                    .map(|d| d.chars().take(10).collect()),
                salary,
                source: str_field(job, "job_publisher")
                    .map(|p| publisher_label(&p))
                    .unwrap_or_else(|| "JSearch".to_string()),
                remote: job.get("job_is_remote").and_then(Value::as_bool),
                employment_type: str_field(job, "job_employment_type"),
            }
        })
        .collect()
}

/// JSearch re-publishes listings; report the board a listing originally came from.
fn publisher_label(publisher: &str) -> String {
    let lower = publisher.to_lowercase();
    for (needle, label) in [
        ("linkedin", "LinkedIn"),
        ("indeed", "Indeed"),
        ("glassdoor", "Glassdoor"),
        ("ziprecruiter", "ZipRecruiter"),
        ("monster", "Monster"),
    ] {
        if lower.contains(needle) {
            return label.to_string();
        }
    }
    publisher.to_string()
}

// ────────────────────────────────────────────────────────────────────────────
// ZipRecruiter
// ────────────────────────────────────────────────────────────────────────────

pub struct ZipRecruiterBoard {
    client: Client,
    api_key: String,
}

impl ZipRecruiterBoard {
    const URL: &'static str = "https://api.ziprecruiter.com/jobs/v1";

    pub fn new(client: Client, api_key: String) -> Self {
        Self { client, api_key }
    }
}

#[async_trait]
impl JobBoard for ZipRecruiterBoard {
    fn name(&self) -> &'static str {
        "ZipRecruiter"
    }

    async fn search(&self, query: &JobQuery) -> Result<Vec<JobPosting>, ProviderError> {
        let request = self.client.get(Self::URL).query(&[
            ("search", query.keywords.clone()),
            ("location", query.location.clone()),
            ("radius_miles", "50".to_string()),
            ("days_ago", "30".to_string()),
            ("jobs_per_page", query.limit.to_string()),
            ("page", "1".to_string()),
            ("api_key", self.api_key.clone()),
        ]);
        let body = fetch_json(self.name(), request).await?;
        Ok(map_ziprecruiter(&body, query.limit))
    }
}

pub fn map_ziprecruiter(body: &Value, limit: usize) -> Vec<JobPosting> {
    let Some(items) = body.get("jobs").and_then(Value::as_array) else {
        return vec![];
    };
    items
        .iter()
        .take(limit)
        .map(|job| JobPosting {
            title: str_field(job, "name").unwrap_or_else(|| "N/A".to_string()),
            company: job
                .get("hiring_company")
                .and_then(|c| str_field(c, "name"))
                .unwrap_or_else(|| "N/A".to_string()),
            location: str_field(job, "location"),
            url: str_field(job, "url"),
            summary: str_field(job, "snippet"),
            posted_date: str_field(job, "posted_time_friendly"),
            salary: job
                .get("salary_interval")
                .and_then(|s| str_field(s, "formatted_salary")),
            source: "ZipRecruiter".to_string(),
            remote: None,
            employment_type: None,
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Indeed publisher API
// ────────────────────────────────────────────────────────────────────────────

pub struct IndeedBoard {
    client: Client,
    publisher_id: String,
}

impl IndeedBoard {
    const URL: &'static str = "https://api.indeed.com/ads/apisearch";

    pub fn new(client: Client, publisher_id: String) -> Self {
        Self {
            client,
            publisher_id,
        }
    }
}

#[async_trait]
impl JobBoard for IndeedBoard {
    fn name(&self) -> &'static str {
        "Indeed"
    }

    async fn search(&self, query: &JobQuery) -> Result<Vec<JobPosting>, ProviderError> {
        let request = self.client.get(Self::URL).query(&[
            ("publisher", self.publisher_id.clone()),
            ("q", query.keywords.clone()),
            ("l", query.location.clone()),
            ("sort", "date".to_string()),
            ("radius", "50".to_string()),
            ("limit", query.limit.to_string()),
            ("fromage", "30".to_string()),
            ("format", "json".to_string()),
            ("v", "2".to_string()),
        ]);
        let body = fetch_json(self.name(), request).await?;
        Ok(map_indeed(&body, query.limit))
    }
}

pub fn map_indeed(body: &Value, limit: usize) -> Vec<JobPosting> {
    let Some(items) = body.get("results").and_then(Value::as_array) else {
        return vec![];
    };
    items
        .iter()
        .take(limit)
        .map(|job| JobPosting {
            title: str_field(job, "jobtitle").unwrap_or_else(|| "N/A".to_string()),
            company: str_field(job, "company").unwrap_or_else(|| "N/A".to_string()),
            location: join_location(&[str_field(job, "city"), str_field(job, "state")]),
            url: str_field(job, "url"),
            summary: str_field(job, "snippet"),
            posted_date: str_field(job, "formattedRelativeTime"),
            salary: str_field(job, "salary"),
            source: "Indeed".to_string(),
            remote: None,
            employment_type: None,
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// USAJobs (federal)
// ────────────────────────────────────────────────────────────────────────────

pub struct UsaJobsBoard {
    client: Client,
    api_key: String,
    user_agent: String,
}

impl UsaJobsBoard {
    const URL: &'static str = "https://data.usajobs.gov/api/search";

    pub fn new(client: Client, api_key: String, user_agent: String) -> Self {
        Self {
            client,
            api_key,
            user_agent,
        }
    }
}

#[async_trait]
impl JobBoard for UsaJobsBoard {
    fn name(&self) -> &'static str {
        "USAJobs"
    }

    async fn search(&self, query: &JobQuery) -> Result<Vec<JobPosting>, ProviderError> {
        let request = self
            .client
            .get(Self::URL)
            .header("Host", "data.usajobs.gov")
            .header("User-Agent", &self.user_agent)
            .header("Authorization-Key", &self.api_key)
            .query(&[
                ("Keyword", query.keywords.clone()),
                ("LocationName", query.location.clone()),
                ("ResultsPerPage", query.limit.to_string()),
                ("Page", "1".to_string()),
            ]);
        let body = fetch_json(self.name(), request).await?;
        Ok(map_usajobs(&body, query.limit))
    }
}

pub fn map_usajobs(body: &Value, limit: usize) -> Vec<JobPosting> {
    let Some(items) = body
        .pointer("/SearchResult/SearchResultItems")
        .and_then(Value::as_array)
    else {
        return vec![];
    };
    items
        .iter()
        .filter_map(|item| item.get("MatchedObjectDescriptor"))
        .take(limit)
        .map(|job| {
            let locations: Vec<Option<String>> = job
                .get("PositionLocationDisplay")
                .and_then(Value::as_array)
                .map(|locs| locs.iter().map(|l| l.as_str().map(str::to_string)).collect())
                .or_else(|| Some(vec![str_field(job, "PositionLocationDisplay")]))
                .unwrap_or_default();
            let salary = job.pointer("/PositionRemuneration/0").and_then(|pay| {
                let min = str_field(pay, "MinimumRange")?;
                Some(match str_field(pay, "MaximumRange") {
                    Some(max) => format!("{min} - {max}"),
                    None => min,
                })
            });
            JobPosting {
                title: str_field(job, "PositionTitle").unwrap_or_else(|| "N/A".to_string()),
                company: str_field(job, "OrganizationName")
                    .unwrap_or_else(|| "U.S. Government".to_string()),
                location: join_location(&locations),
                url: str_field(job, "PositionURI"),
                summary: truncate_summary(str_field(job, "QualificationSummary")),
                posted_date: str_field(job, "PublicationStartDate"),
                salary,
                source: "USAJobs".to_string(),
                remote: None,
                employment_type: None,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_map_jsearch() {
        let body = json!({
            "status": "OK",
            "data": [{
                "job_title": "Journeyman Electrician",
                "employer_name": "Acme Electric",
                "job_city": "Austin",
                "job_state": "TX",
                "job_country": "US",
                "job_apply_link": "https://acme.com/apply/1",
                "job_description": "x".repeat(300),
                "job_posted_at_datetime_utc": "2025-03-01T12:00:00.000Z",
                "job_min_salary": 30.0,
                "job_max_salary": 45.0,
                "job_salary_period": "HOUR",
                "job_publisher": "LinkedIn Jobs",
                "job_is_remote": false,
                "job_employment_type": "FULLTIME"
            }, {
                "job_title": "Second",
                "employer_name": "Other"
            }]
        });
        let jobs = map_jsearch(&body, 1);
        assert_eq!(jobs.len(), 1);
        let job = &jobs[0];
        assert_eq!(job.title, "Journeyman Electrician");
        assert_eq!(job.location.as_deref(), Some("Austin, TX, US"));
        assert_eq!(job.posted_date.as_deref(), Some("2025-03-01"));
        assert_eq!(job.salary.as_deref(), Some("$30 - $45 HOUR"));
        assert_eq!(job.source, "LinkedIn");
        assert_eq!(job.summary.as_ref().map(|s| s.chars().count()), Some(203));
    }

    #[test]
    fn test_map_jsearch_missing_data() {
        assert!(map_jsearch(&json!({"status": "ERROR"}), 10).is_empty());
    }

    #[test]
    fn test_map_ziprecruiter() {
        let body = json!({"jobs": [{
            "name": "Pipefitter",
            "hiring_company": {"name": "Bay Mechanical"},
            "location": "Oakland, CA",
            "url": "https://ziprecruiter.com/j/9",
            "snippet": "Union shop",
            "salary_interval": {"formatted_salary": "$40/hr"}
        }]});
        let jobs = map_ziprecruiter(&body, 5);
        assert_eq!(jobs[0].company, "Bay Mechanical");
        assert_eq!(jobs[0].salary.as_deref(), Some("$40/hr"));
        assert_eq!(jobs[0].source, "ZipRecruiter");
    }

    #[test]
    fn test_map_indeed() {
        let body = json!({"results": [{
            "jobtitle": "HVAC Technician",
            "company": "CoolAir",
            "city": "Denver",
            "state": "CO",
            "url": "https://indeed.com/viewjob?jk=1"
        }]});
        let jobs = map_indeed(&body, 5);
        assert_eq!(jobs[0].location.as_deref(), Some("Denver, CO"));
        assert!(jobs[0].salary.is_none());
    }

    #[test]
    fn test_map_usajobs() {
        let body = json!({"SearchResult": {"SearchResultItems": [{
            "MatchedObjectDescriptor": {
                "PositionTitle": "Electrician",
                "PositionLocationDisplay": "Norfolk, Virginia",
                "PositionURI": "https://www.usajobs.gov/job/1",
                "PositionRemuneration": [{"MinimumRange": "28.50", "MaximumRange": "33.25"}]
            }
        }]}});
        let jobs = map_usajobs(&body, 5);
        assert_eq!(jobs[0].company, "U.S. Government");
        assert_eq!(jobs[0].location.as_deref(), Some("Norfolk, Virginia"));
        assert_eq!(jobs[0].salary.as_deref(), Some("28.50 - 33.25"));
    }

    #[test]
    fn test_publisher_label() {
        assert_eq!(publisher_label("Indeed.com"), "Indeed");
        assert_eq!(publisher_label("Trades Hub"), "Trades Hub");
    }
}
