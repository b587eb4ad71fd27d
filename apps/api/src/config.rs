use anyhow::{Context, Result};
use serde::Serialize;
use tracing::warn;

const DEV_SESSION_SECRET: &str = "dev-secret-key-change-in-production";

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    /// Sessions are handled outside this service; the secret is carried for
    /// deployments that share one `.env` with the session layer.
    #[allow(dead_code)]
    pub session_secret: String,
    pub port: u16,
    pub rust_log: String,
    pub providers: ProviderKeys,
    pub email: EmailSettings,
}

/// Optional credentials for external job boards and sourcing APIs.
/// A missing key disables the matching provider.
#[derive(Debug, Clone, Default)]
pub struct ProviderKeys {
    pub rapidapi_key: Option<String>,
    pub ziprecruiter_api_key: Option<String>,
    pub indeed_publisher_id: Option<String>,
    pub usajobs_api_key: Option<String>,
    pub usajobs_user_agent: String,
    pub github_token: Option<String>,
    pub peopledata_key: Option<String>,
    pub seekout_api_key: Option<String>,
    pub sourcehub_api_key: Option<String>,
}

/// Mailbox settings used by the external email poller. Only reported here.
#[derive(Debug, Clone)]
pub struct EmailSettings {
    pub user: Option<String>,
    pub password: Option<String>,
    pub imap_server: String,
    pub imap_port: u16,
    pub folder: String,
}

#[derive(Debug, Serialize)]
pub struct ProviderStatus {
    pub core: CoreStatus,
    pub job_search: JobSearchStatus,
    pub sourcing: SourcingStatus,
    pub email: EmailStatus,
}

#[derive(Debug, Serialize)]
pub struct CoreStatus {
    pub openai: bool,
}

#[derive(Debug, Serialize)]
pub struct JobSearchStatus {
    pub jsearch: bool,
    pub ziprecruiter: bool,
    pub indeed: bool,
    pub usajobs: bool,
}

#[derive(Debug, Serialize)]
pub struct SourcingStatus {
    pub github: bool,
    pub peopledata: bool,
    pub seekout: bool,
    pub sourcehub: bool,
}

#[derive(Debug, Serialize)]
pub struct EmailStatus {
    pub configured: bool,
    pub imap_server: String,
    pub folder: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| {
            get(key).with_context(|| format!("Required environment variable '{key}' is not set"))
        };

        let session_secret = get("SESSION_SECRET").unwrap_or_else(|| {
            warn!("SESSION_SECRET is not set; using the development default");
            DEV_SESSION_SECRET.to_string()
        });

        Ok(Config {
            database_url: require("DATABASE_URL")?,
            openai_api_key: require("OPENAI_API_KEY")?,
            openai_base_url: get("OPENAI_BASE_URL")
                .unwrap_or_else(|| crate::llm_client::DEFAULT_BASE_URL.to_string()),
            session_secret,
            port: get("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            providers: ProviderKeys {
                rapidapi_key: get("RAPIDAPI_KEY"),
                ziprecruiter_api_key: get("ZIPRECRUITER_API_KEY"),
                indeed_publisher_id: get("INDEED_PUBLISHER_ID"),
                usajobs_api_key: get("USAJOBS_API_KEY"),
                usajobs_user_agent: get("USAJOBS_USER_AGENT")
                    .unwrap_or_else(|| "TradesCompass".to_string()),
                github_token: get("GITHUB_TOKEN"),
                peopledata_key: get("PEOPLEDATA_KEY"),
                seekout_api_key: get("SEEKOUT_API_KEY"),
                sourcehub_api_key: get("SOURCEHUB_API_KEY"),
            },
            email: EmailSettings {
                user: get("EMAIL_USER"),
                password: get("EMAIL_PASSWORD"),
                imap_server: get("IMAP_SERVER").unwrap_or_else(|| "imap.gmail.com".to_string()),
                imap_port: get("IMAP_PORT")
                    .unwrap_or_else(|| "993".to_string())
                    .parse::<u16>()
                    .context("IMAP_PORT must be a valid port number")?,
                folder: get("EMAIL_FOLDER").unwrap_or_else(|| "INBOX".to_string()),
            },
        })
    }

    /// Reports which integrations have credentials configured.
    pub fn provider_status(&self) -> ProviderStatus {
        let p = &self.providers;
        ProviderStatus {
            core: CoreStatus {
                openai: !self.openai_api_key.is_empty(),
            },
            job_search: JobSearchStatus {
                jsearch: p.rapidapi_key.is_some(),
                ziprecruiter: p.ziprecruiter_api_key.is_some(),
                indeed: p.indeed_publisher_id.is_some(),
                usajobs: p.usajobs_api_key.is_some(),
            },
            sourcing: SourcingStatus {
                github: p.github_token.is_some(),
                peopledata: p.peopledata_key.is_some(),
                seekout: p.seekout_api_key.is_some(),
                sourcehub: p.sourcehub_api_key.is_some(),
            },
            email: EmailStatus {
                configured: self.email.user.is_some() && self.email.password.is_some(),
                imap_server: self.email.imap_server.clone(),
                folder: self.email.folder.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("DATABASE_URL", "postgres://localhost/screener"),
        ("OPENAI_API_KEY", "sk-test"),
    ];

    #[test]
    fn test_missing_required_key_fails() {
        let err = Config::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://x")]))
            .unwrap_err()
            .to_string();
        assert!(err.contains("OPENAI_API_KEY"), "{err}");
    }

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_lookup(lookup_from(REQUIRED)).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.rust_log, "info");
        assert_eq!(config.session_secret, DEV_SESSION_SECRET);
        assert_eq!(config.email.imap_port, 993);
        assert_eq!(config.providers.usajobs_user_agent, "TradesCompass");
        assert_eq!(config.openai_base_url, crate::llm_client::DEFAULT_BASE_URL);
    }

    #[test]
    fn test_empty_provider_key_counts_as_absent() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("RAPIDAPI_KEY", "  "));
        pairs.push(("GITHUB_TOKEN", "ghp_abc"));
        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();
        let status = config.provider_status();
        assert!(!status.job_search.jsearch);
        assert!(status.sourcing.github);
        assert!(!status.email.configured);
    }

    #[test]
    fn test_invalid_port_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("PORT", "eighty"));
        assert!(Config::from_lookup(lookup_from(&pairs)).is_err());
    }
}
