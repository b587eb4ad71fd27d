//! Processing log for inbound resume emails. The mailbox poller runs elsewhere
//! and reports each message here; a message id is recorded at most once.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::email_log::{EmailLogStatus, EmailProcessingLogRow};
use crate::state::AppState;

const DEFAULT_LOG_LIMIT: i64 = 50;
const MAX_LOG_LIMIT: i64 = 500;

#[derive(Debug, Deserialize)]
pub struct NewEmailLog {
    pub email_id: String,
    pub sender_email: Option<String>,
    pub subject: Option<String>,
    pub status: EmailLogStatus,
    pub candidate_id: Option<Uuid>,
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EmailLogParams {
    pub status: Option<EmailLogStatus>,
    pub limit: Option<i64>,
}

pub async fn email_already_processed(pool: &PgPool, email_id: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM email_processing_logs WHERE email_id = $1)")
        .bind(email_id)
        .fetch_one(pool)
        .await
}

/// Inserts a log row. Returns `None` when the message id is already recorded.
pub async fn record_email_log(
    pool: &PgPool,
    log: &NewEmailLog,
) -> Result<Option<EmailProcessingLogRow>, sqlx::Error> {
    sqlx::query_as::<_, EmailProcessingLogRow>(
        r#"
        INSERT INTO email_processing_logs
            (id, email_id, sender_email, subject, status, candidate_id, error_message)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (email_id) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(log.email_id.trim())
    .bind(&log.sender_email)
    .bind(&log.subject)
    .bind(log.status.as_str())
    .bind(log.candidate_id)
    .bind(&log.error_message)
    .fetch_optional(pool)
    .await
}

pub async fn list_email_logs(
    pool: &PgPool,
    status: Option<EmailLogStatus>,
    limit: i64,
) -> Result<Vec<EmailProcessingLogRow>, sqlx::Error> {
    sqlx::query_as::<_, EmailProcessingLogRow>(
        r#"
        SELECT * FROM email_processing_logs
        WHERE ($1::TEXT IS NULL OR status = $1)
        ORDER BY processed_at DESC
        LIMIT $2
        "#,
    )
    .bind(status.map(|s| s.as_str()))
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// GET /api/v1/email-logs
pub async fn handle_list_email_logs(
    State(state): State<AppState>,
    Query(params): Query<EmailLogParams>,
) -> Result<Json<Vec<EmailProcessingLogRow>>, AppError> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_LOG_LIMIT)
        .clamp(1, MAX_LOG_LIMIT);
    Ok(Json(list_email_logs(&state.db, params.status, limit).await?))
}

/// POST /api/v1/email-logs
pub async fn handle_record_email_log(
    State(state): State<AppState>,
    Json(log): Json<NewEmailLog>,
) -> Result<(StatusCode, Json<EmailProcessingLogRow>), AppError> {
    if log.email_id.trim().is_empty() {
        return Err(AppError::Validation("email_id cannot be empty".to_string()));
    }
    if log.status == EmailLogStatus::Failed
        && log.error_message.as_deref().map_or(true, |m| m.trim().is_empty())
    {
        return Err(AppError::Validation(
            "error_message is required for failed emails".to_string(),
        ));
    }

    let duplicate =
        || AppError::Conflict(format!("Email {} was already processed", log.email_id.trim()));
    if email_already_processed(&state.db, log.email_id.trim()).await? {
        return Err(duplicate());
    }
    // A concurrent report of the same message loses the insert race.
    let row = record_email_log(&state.db, &log)
        .await
        .map_err(|e| insert_error(e, log.candidate_id))?
        .ok_or_else(duplicate)?;
    info!("Recorded email {} as {}", row.email_id, row.status);
    Ok((StatusCode::CREATED, Json(row)))
}

/// An unknown `candidate_id` is a client error, not a database failure.
fn insert_error(err: sqlx::Error, candidate_id: Option<Uuid>) -> AppError {
    if let (sqlx::Error::Database(db), Some(id)) = (&err, candidate_id) {
        if db.is_foreign_key_violation() {
            return AppError::Validation(format!("candidate_id {id} does not exist"));
        }
    }
    AppError::Database(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::borrow::Cow;
    use std::error::Error as StdError;

    #[derive(Debug)]
    struct ForeignKeyViolation;

    impl std::fmt::Display for ForeignKeyViolation {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("insert or update on table \"email_processing_logs\" violates foreign key constraint")
        }
    }

    impl StdError for ForeignKeyViolation {}

    impl sqlx::error::DatabaseError for ForeignKeyViolation {
        fn message(&self) -> &str {
            "violates foreign key constraint"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed("23503"))
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::ForeignKeyViolation
        }
    }

    #[test]
    fn test_unknown_candidate_is_validation_error() {
        let id = Uuid::new_v4();
        let err = insert_error(sqlx::Error::Database(Box::new(ForeignKeyViolation)), Some(id));
        match err {
            AppError::Validation(message) => {
                assert_eq!(message, format!("candidate_id {id} does not exist"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_other_database_errors_pass_through() {
        let err = insert_error(sqlx::Error::RowNotFound, Some(Uuid::new_v4()));
        assert!(matches!(err, AppError::Database(_)));

        let err = insert_error(sqlx::Error::Database(Box::new(ForeignKeyViolation)), None);
        assert!(matches!(err, AppError::Database(_)));
    }

    #[test]
    fn test_unknown_status_rejected() {
        let parsed = serde_json::from_value::<NewEmailLog>(json!({
            "email_id": "msg-1",
            "status": "bounced"
        }));
        assert!(parsed.is_err());

        let log: NewEmailLog = serde_json::from_value(json!({
            "email_id": "msg-1",
            "status": "skipped"
        }))
        .unwrap();
        assert_eq!(log.status, EmailLogStatus::Skipped);
        assert!(log.candidate_id.is_none());
    }
}
