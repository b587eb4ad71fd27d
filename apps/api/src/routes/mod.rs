pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post},
    Router,
};

use crate::candidates::handlers as candidates;
use crate::email_log;
use crate::providers::handlers as providers;
use crate::state::AppState;
use crate::upload::{handlers as upload, UPLOAD_BODY_LIMIT};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Resume intake
        .route("/api/v1/upload-policy", get(upload::handle_upload_policy))
        .route(
            "/api/v1/resumes",
            post(upload::handle_upload).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/api/v1/resumes/recent", get(candidates::handle_recent))
        .route("/api/v1/resumes/history", get(candidates::handle_history))
        // Candidate database
        .route("/api/v1/candidates", get(candidates::handle_search))
        .route("/api/v1/candidates/stats", get(candidates::handle_stats))
        .route(
            "/api/v1/candidates/:id",
            get(candidates::handle_get_candidate).delete(candidates::handle_delete_candidate),
        )
        .route(
            "/api/v1/candidates/:id/status",
            patch(candidates::handle_update_status),
        )
        .route(
            "/api/v1/candidates/:id/skills",
            post(candidates::handle_add_skill),
        )
        .route("/api/v1/candidates/:id/tags", post(candidates::handle_add_tag))
        .route(
            "/api/v1/candidates/:id/tags/:tag_id",
            delete(candidates::handle_remove_tag),
        )
        .route(
            "/api/v1/candidates/:id/similar",
            get(candidates::handle_similar),
        )
        // External providers
        .route("/api/v1/jobs/search", get(providers::handle_job_search))
        .route(
            "/api/v1/sourcing/search",
            get(providers::handle_sourcing_search),
        )
        .route("/api/v1/sourcing/import", post(providers::handle_import))
        .route("/api/v1/providers", get(providers::handle_provider_status))
        // Email processing log
        .route(
            "/api/v1/email-logs",
            get(email_log::handle_list_email_logs).post(email_log::handle_record_email_log),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use crate::analysis::intake::tests::StubAnalyzer;
    use crate::analysis::schema::tests::valid_response;
    use crate::config::Config;
    use crate::providers::aggregate::{CandidateSourcing, JobSearch};
    use crate::upload::MAX_UPLOAD_BYTES;

    const BOUNDARY: &str = "screener-test-boundary";

    fn test_state(analyzer: Arc<StubAnalyzer>) -> AppState {
        let config = Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://localhost/screener_test".to_string()),
            "OPENAI_API_KEY" => Some("sk-test".to_string()),
            "SESSION_SECRET" => Some("test-secret".to_string()),
            _ => None,
        })
        .unwrap();
        let db = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();
        AppState {
            db,
            config,
            analyzer,
            job_search: Arc::new(JobSearch::default()),
            sourcing: Arc::new(CandidateSourcing::default()),
        }
    }

    fn multipart_body(filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload_request(body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/resumes")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn email_log_request(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/email-logs")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = build_router(test_state(Arc::new(StubAnalyzer::new(valid_response()))));
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_upload_policy_published() {
        let app = build_router(test_state(Arc::new(StubAnalyzer::new(valid_response()))));
        let response = app
            .oneshot(Request::get("/api/v1/upload-policy").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["max_bytes"], MAX_UPLOAD_BYTES);
        assert_eq!(body["allowed_extensions"], serde_json::json!(["pdf", "docx", "txt"]));
    }

    #[tokio::test]
    async fn test_disallowed_type_rejected_before_analysis() {
        let analyzer = Arc::new(StubAnalyzer::new(valid_response()));
        let app = build_router(test_state(analyzer.clone()));

        let response = app
            .oneshot(upload_request(multipart_body("photo.png", "image/png", b"\x89PNG")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("Please upload a PDF, DOCX, or TXT file"));
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_oversized_file_rejected_before_analysis() {
        let analyzer = Arc::new(StubAnalyzer::new(valid_response()));
        let app = build_router(test_state(analyzer.clone()));

        let data = vec![b'a'; MAX_UPLOAD_BYTES + 1];
        let response = app
            .oneshot(upload_request(multipart_body("resume.txt", "text/plain", &data)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["message"], "File too large. Maximum size is 16MB.");
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_body_over_limit_reported_as_too_large() {
        let analyzer = Arc::new(StubAnalyzer::new(valid_response()));
        let app = build_router(test_state(analyzer.clone()));

        let data = vec![b'a'; UPLOAD_BODY_LIMIT + 1024];
        let response = app
            .oneshot(upload_request(multipart_body("resume.txt", "text/plain", &data)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["message"], "File too large. Maximum size is 16MB.");
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_file_field_rejected() {
        let app = build_router(test_state(Arc::new(StubAnalyzer::new(valid_response()))));
        let body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"job_description\"\r\n\r\nWelder\r\n--{BOUNDARY}--\r\n"
        );
        let response = app
            .oneshot(upload_request(body.into_bytes()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"]["message"], "No file selected");
    }

    #[tokio::test]
    async fn test_unreadable_file_is_unprocessable() {
        let analyzer = Arc::new(StubAnalyzer::new(valid_response()));
        let app = build_router(test_state(analyzer.clone()));

        let response = app
            .oneshot(upload_request(multipart_body(
                "resume.pdf",
                "application/pdf",
                b"not really a pdf",
            )))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json_body(response).await["error"]["code"], "EXTRACTION_ERROR");
        assert_eq!(analyzer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_candidate_id_is_bad_request() {
        let app = build_router(test_state(Arc::new(StubAnalyzer::new(valid_response()))));
        let response = app
            .oneshot(
                Request::get("/api/v1/candidates/not-a-uuid")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_job_search_requires_query() {
        let app = build_router(test_state(Arc::new(StubAnalyzer::new(valid_response()))));
        let response = app
            .oneshot(
                Request::get("/api/v1/jobs/search?q=%20")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_job_search_without_providers_is_empty() {
        let app = build_router(test_state(Arc::new(StubAnalyzer::new(valid_response()))));
        let response = app
            .oneshot(
                Request::get("/api/v1/jobs/search?q=electrician&location=Austin")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["total"], 0);
        assert_eq!(body["location"], "Austin");
    }

    #[tokio::test]
    async fn test_provider_status() {
        let app = build_router(test_state(Arc::new(StubAnalyzer::new(valid_response()))));
        let response = app
            .oneshot(Request::get("/api/v1/providers").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["core"]["openai"], true);
        assert_eq!(body["job_search"]["jsearch"], false);
        assert_eq!(body["email"]["imap_server"], "imap.gmail.com");
    }

    #[tokio::test]
    async fn test_email_log_requires_email_id() {
        let app = build_router(test_state(Arc::new(StubAnalyzer::new(valid_response()))));
        let response = app
            .oneshot(email_log_request(serde_json::json!({
                "email_id": "   ",
                "status": "processed"
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["message"], "email_id cannot be empty");
    }

    #[tokio::test]
    async fn test_failed_email_log_requires_error_message() {
        let app = build_router(test_state(Arc::new(StubAnalyzer::new(valid_response()))));
        let response = app
            .oneshot(email_log_request(serde_json::json!({
                "email_id": "msg-42",
                "status": "failed",
                "error_message": " "
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(
            body["error"]["message"],
            "error_message is required for failed emails"
        );
    }
}
