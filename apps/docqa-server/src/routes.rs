//! JSON API: `POST /api/upload`, `POST /api/ask`, `GET /api/health`.

use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use docqa_core::types::UploadedFile;
use docqa_rag::{AskError, IngestError, QaService};

pub type SharedService = Arc<QaService>;

const FILES_FIELD: &str = "files";

pub fn router(service: SharedService, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/api/upload", post(upload))
        .route("/api/ask", post(ask))
        .route("/api/health", get(health))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

#[derive(Debug, Deserialize)]
struct AskRequest {
    question: Option<String>,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

fn ingest_failure(err: IngestError) -> Response {
    if err.is_client_error() {
        return error_response(StatusCode::BAD_REQUEST, err.to_string());
    }
    tracing::error!(error = %err, "upload failed");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

fn ask_failure(err: AskError) -> Response {
    if err.is_client_error() {
        return error_response(StatusCode::BAD_REQUEST, err.to_string());
    }
    tracing::error!(error = %err, "ask failed");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

/// Every `files` part carrying a filename becomes an upload. A request that
/// is not multipart, or whose `files` parts are plain form values, counts as
/// having no files part.
async fn upload(State(service): State<SharedService>, multipart: Result<Multipart, MultipartRejection>) -> Response {
    let mut files = Vec::new();
    if let Ok(mut multipart) = multipart {
        loop {
            let field = match multipart.next_field().await {
                Ok(Some(field)) => field,
                Ok(None) => break,
                Err(e) => return error_response(e.status(), e.body_text()),
            };
            if field.name() != Some(FILES_FIELD) {
                continue;
            }
            let Some(filename) = field.file_name().map(str::to_string) else { continue };
            match field.bytes().await {
                Ok(bytes) => files.push(UploadedFile::new(filename, bytes.to_vec())),
                Err(e) => return error_response(e.status(), e.body_text()),
            }
        }
    }

    match service.ingest(files).await {
        Ok(report) => Json(json!({ "message": report.message() })).into_response(),
        Err(e) => ingest_failure(e),
    }
}

async fn ask(State(service): State<SharedService>, payload: Result<Json<AskRequest>, JsonRejection>) -> Response {
    let question = payload.ok().and_then(|Json(body)| body.question);
    match service.ask(question.as_deref()).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => ask_failure(e),
    }
}

async fn health(State(service): State<SharedService>) -> Response { Json(service.health()).into_response() }
