use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::pipeline::{run_analysis, AnalyzeInput, UploadedDocument};
use crate::errors::AppError;
use crate::models::analysis::{Analysis, AnalysisStatus, Suggestion};
use crate::state::AppState;

/// Name given to a job description submitted as a text field.
const JOB_TEXT_FILENAME: &str = "job-description.txt";

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub analysis_id: Uuid,
    pub status: AnalysisStatus,
    pub similarity_score: Option<f64>,
    pub suggestions: Vec<Suggestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Analysis> for AnalysisResponse {
    fn from(analysis: Analysis) -> Self {
        let error = analysis.error_message().map(str::to_string);
        Self {
            analysis_id: analysis.id,
            status: analysis.status,
            similarity_score: analysis.similarity_score,
            suggestions: analysis.suggestions,
            error,
        }
    }
}

fn bad_multipart(e: impl std::fmt::Display) -> AppError {
    AppError::Validation(format!("Invalid multipart body: {e}"))
}

/// Reads `user_id`, `resume` and either `job_description` (file) or
/// `job_description_text` from the form.
async fn read_analysis_form(multipart: &mut Multipart) -> Result<AnalyzeInput, AppError> {
    let mut user_id = None;
    let mut resume = None;
    let mut job_description = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "user_id" => {
                let raw = field.text().await.map_err(bad_multipart)?;
                let id = raw
                    .trim()
                    .parse::<Uuid>()
                    .map_err(|_| AppError::Validation(format!("user_id '{raw}' is not a UUID")))?;
                user_id = Some(id);
            }
            "resume" | "job_description" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(bad_multipart)?;
                let document = UploadedDocument { filename, bytes };
                if name == "resume" {
                    resume = Some(document);
                } else {
                    job_description = Some(document);
                }
            }
            "job_description_text" => {
                let text = field.text().await.map_err(bad_multipart)?;
                job_description = Some(UploadedDocument {
                    filename: JOB_TEXT_FILENAME.to_string(),
                    bytes: Bytes::from(text),
                });
            }
            _ => {}
        }
    }

    let user_id = user_id.ok_or_else(|| AppError::Validation("user_id is required".into()))?;
    let resume = resume
        .filter(|d| !d.bytes.is_empty())
        .ok_or_else(|| AppError::Validation("a non-empty resume file is required".into()))?;
    let job_description = job_description
        .filter(|d| !d.bytes.is_empty())
        .ok_or_else(|| {
            AppError::Validation(
                "job_description file or job_description_text is required".into(),
            )
        })?;

    Ok(AnalyzeInput {
        user_id,
        resume,
        job_description,
    })
}

/// POST /api/v1/analyses
pub async fn handle_create_analysis(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalysisResponse>, AppError> {
    let input = read_analysis_form(&mut multipart).await?;
    let analysis = run_analysis(&state, input).await?;
    Ok(Json(analysis.into()))
}

/// GET /api/v1/analyses/:id?user_id=
pub async fn handle_get_analysis(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Analysis>, AppError> {
    let analysis = state
        .repository
        .get(id)
        .await?
        .filter(|a| a.user_id == params.user_id)
        .ok_or_else(|| AppError::NotFound(format!("Analysis {id} not found")))?;
    Ok(Json(analysis))
}
