use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Failure taxonomy of the analysis/optimization core.
///
/// `SchemaValidation` never leaves the suggestion generator: it is recovered
/// locally with the fallback suggestion set.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Text extraction failed: {0}")]
    ExtractionFailure(String),

    #[error("Embedding service error: {0}")]
    EmbeddingService(String),

    #[error("Cannot compute similarity of a zero-magnitude vector")]
    DegenerateVector,

    #[error("Suggestion service unavailable: {0}")]
    SuggestionServiceUnavailable(String),

    #[error("Suggestion schema validation failed: {0}")]
    SchemaValidation(String),

    #[error("Unsupported output format: {0}")]
    UnsupportedOutputFormat(String),

    #[error("Document rendering failed: {0}")]
    RenderFailure(String),

    #[error("Storage failure: {0}")]
    Storage(String),

    #[error("Pipeline timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Analysis task aborted: {0}")]
    Aborted(String),
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unprocessable entity: {0}")]
    UnprocessableEntity(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("S3 error: {0}")]
    S3(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::UnsupportedFormat(_)
            | PipelineError::UnsupportedOutputFormat(_)
            | PipelineError::ExtractionFailure(_) => AppError::UnprocessableEntity(err.to_string()),
            PipelineError::SuggestionServiceUnavailable(_) => AppError::Llm(err.to_string()),
            PipelineError::Storage(_) => AppError::S3(err.to_string()),
            PipelineError::Timeout(_) => AppError::Timeout(err.to_string()),
            PipelineError::EmbeddingService(_)
            | PipelineError::DegenerateVector
            | PipelineError::SchemaValidation(_) => AppError::Pipeline(err.to_string()),
            PipelineError::RenderFailure(_) | PipelineError::Aborted(_) => {
                AppError::Internal(anyhow::anyhow!(err))
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::UnprocessableEntity(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNPROCESSABLE_ENTITY",
                msg.clone(),
            ),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "LLM_ERROR",
                    "An AI processing error occurred".to_string(),
                )
            }
            AppError::S3(msg) => {
                tracing::error!("S3 error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "S3_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Pipeline(msg) => {
                tracing::error!("Pipeline error: {msg}");
                (StatusCode::BAD_GATEWAY, "PIPELINE_ERROR", msg.clone())
            }
            AppError::Timeout(msg) => (StatusCode::GATEWAY_TIMEOUT, "TIMEOUT", msg.clone()),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
