//! Axum route handlers for resume upload.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use tracing::info;

use crate::analysis::intake::process_upload;
use crate::candidates::repo::{self, CandidateDetail};
use crate::errors::AppError;
use crate::models::analysis::CandidateSource;
use crate::state::AppState;

use super::{upload_policy, validate_upload, UploadPolicy, ValidationError};

/// Maps a multipart read failure. A body cut off by the size limit reads as "too large".
fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ValidationError::TooLarge.into()
    } else {
        AppError::Validation(format!("Malformed upload: {}", err.body_text()))
    }
}

struct UploadForm {
    file: Option<(String, Option<String>, Bytes)>,
    job_description: Option<String>,
    source: Option<String>,
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut form = UploadForm {
        file: None,
        job_description: None,
        source: None,
    };

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name() {
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await.map_err(multipart_error)?;
                // A file input left blank still submits an empty, unnamed part.
                if filename.is_empty() && data.is_empty() {
                    continue;
                }
                form.file = Some((filename, content_type, data));
            }
            Some("job_description") => {
                form.job_description = Some(field.text().await.map_err(multipart_error)?);
            }
            Some("source") => {
                form.source = Some(field.text().await.map_err(multipart_error)?);
            }
            _ => {}
        }
    }
    Ok(form)
}

/// POST /api/v1/resumes
///
/// Multipart form with `file`, an optional `job_description`, and an optional
/// `source` (`manual_upload` or `email`). Validation and extraction failures are
/// reported before anything is stored.
pub async fn handle_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<CandidateDetail>), AppError> {
    let form = read_form(multipart).await?;
    let (filename, content_type, data) = form.file.ok_or(ValidationError::MissingFile)?;
    let source = match form.source.as_deref() {
        None => CandidateSource::ManualUpload,
        Some(raw) => CandidateSource::parse_upload(raw).ok_or_else(|| {
            AppError::Validation(format!("Unknown source '{raw}'; expected manual_upload or email"))
        })?,
    };

    let upload = validate_upload(&filename, content_type.as_deref(), data)?;
    info!(
        "Accepted upload {} ({}, {} bytes)",
        upload.filename,
        upload.kind,
        upload.bytes.len()
    );

    let row = process_upload(
        &state.db,
        upload,
        form.job_description,
        source,
        state.analyzer.as_ref(),
        state.job_search.as_ref(),
    )
    .await?;

    let detail = repo::get_candidate_detail(&state.db, row.id)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("stored analysis {} vanished", row.id)))?;

    Ok((StatusCode::CREATED, Json(detail)))
}

/// GET /api/v1/upload-policy
pub async fn handle_upload_policy() -> Json<UploadPolicy> {
    Json(upload_policy())
}
