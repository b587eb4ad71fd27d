use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailLogStatus {
    Processed,
    Failed,
    Skipped,
}

impl EmailLogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailLogStatus::Processed => "processed",
            EmailLogStatus::Failed => "failed",
            EmailLogStatus::Skipped => "skipped",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EmailProcessingLogRow {
    pub id: Uuid,
    pub email_id: String,
    pub sender_email: Option<String>,
    pub subject: Option<String>,
    pub status: String,
    pub candidate_id: Option<Uuid>,
    pub error_message: Option<String>,
    pub processed_at: DateTime<Utc>,
}
