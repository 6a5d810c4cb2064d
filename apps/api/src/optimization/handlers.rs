use axum::{
    extract::{Path, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        HeaderName,
    },
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::optimization::pipeline::{run_optimization, OptimizeRequest};
use crate::state::AppState;

/// Carries the stored artifact's object path.
pub const OPTIMIZED_FILE_HEADER: HeaderName = HeaderName::from_static("x-optimized-file");

/// POST /api/v1/analyses/:id/optimize
/// Returns the rendered document as an attachment.
pub async fn handle_optimize(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<OptimizeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let document = run_optimization(&state, id, req).await?;

    let headers = [
        (CONTENT_TYPE, document.format.content_type().to_string()),
        (
            CONTENT_DISPOSITION,
            format!(
                "attachment; filename=\"optimized-resume.{}\"",
                document.format
            ),
        ),
        (OPTIMIZED_FILE_HEADER, document.path),
    ];
    Ok((headers, document.bytes))
}
