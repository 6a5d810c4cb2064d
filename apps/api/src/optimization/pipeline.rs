//! The "optimize" pass: apply a selection of an Analysis' suggestions to the
//! stored résumé and render a new document.
//!
//! Every call renders and stores a fresh artifact; nothing is deduplicated.

use std::collections::HashSet;

use bytes::Bytes;
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::{AppError, PipelineError};
use crate::extraction::{extract_text_blocking, normalize_text};
use crate::models::analysis::{Analysis, AnalysisStatus, FileFormat, Suggestion};
use crate::optimization::applier::apply_optimizations;
use crate::render::render_document;
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
pub struct OptimizeRequest {
    pub user_id: Uuid,
    #[serde(default)]
    pub selected_suggestions: Vec<Uuid>,
    pub output_format: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OptimizedDocument {
    pub bytes: Vec<u8>,
    pub format: FileFormat,
    /// Object path in the optimized bucket.
    pub path: String,
    pub applied: Vec<Uuid>,
}

/// Stored suggestions whose ids were selected, in stored order. Unknown ids
/// and repeats are dropped.
pub fn resolve_selection(suggestions: &[Suggestion], selected: &[Uuid]) -> Vec<Suggestion> {
    let wanted: HashSet<&Uuid> = selected.iter().collect();
    suggestions
        .iter()
        .filter(|s| wanted.contains(&s.id))
        .cloned()
        .collect()
}

/// Explicit request format first, then the original format; plain-text
/// originals render to PDF.
pub fn output_format(
    requested: Option<&str>,
    original: FileFormat,
) -> Result<FileFormat, PipelineError> {
    match requested.map(str::parse::<FileFormat>) {
        Some(Ok(FileFormat::Txt)) => Err(PipelineError::UnsupportedOutputFormat(
            "'txt' (expected pdf or docx)".to_string(),
        )),
        Some(Ok(format)) => Ok(format),
        Some(Err(name)) => Err(PipelineError::UnsupportedOutputFormat(format!(
            "'{name}' (expected pdf or docx)"
        ))),
        None if original == FileFormat::Txt => Ok(FileFormat::Pdf),
        None => Ok(original),
    }
}

pub async fn run_optimization(
    state: &AppState,
    analysis_id: Uuid,
    request: OptimizeRequest,
) -> Result<OptimizedDocument, AppError> {
    let analysis = state
        .repository
        .get(analysis_id)
        .await?
        .filter(|a| a.user_id == request.user_id)
        .ok_or_else(|| AppError::NotFound(format!("Analysis {analysis_id} not found")))?;

    if analysis.status != AnalysisStatus::Completed {
        return Err(AppError::Validation(format!(
            "Analysis {analysis_id} is {}; only completed analyses can be optimized",
            analysis.status.as_str()
        )));
    }

    let format = output_format(request.output_format.as_deref(), analysis.file_format)?;
    let selected = resolve_selection(&analysis.suggestions, &request.selected_suggestions);
    info!(
        "Analysis {analysis_id}: optimizing with {}/{} selected suggestions as {format}",
        selected.len(),
        request.selected_suggestions.len()
    );

    let timeout = state.config.pipeline_timeout();
    let document = tokio::time::timeout(timeout, optimize_document(state, &analysis, &selected, format))
        .await
        .map_err(|_| PipelineError::Timeout(timeout))??;

    let applied: Vec<Uuid> = selected.iter().map(|s| s.id).collect();
    let optimized_at = Utc::now();
    let path = format!(
        "{}/{analysis_id}/{}-{}-optimized.{format}",
        analysis.user_id,
        optimized_at.timestamp_millis(),
        Uuid::new_v4().simple()
    );

    state
        .storage
        .upload(
            &state.config.optimized_bucket,
            &path,
            Bytes::from(document.clone()),
            format.content_type(),
        )
        .await
        .map_err(PipelineError::from)?;
    state
        .repository
        .record_optimization(analysis_id, &applied, &path, optimized_at)
        .await?;
    info!("Analysis {analysis_id}: stored optimized document at {path}");

    Ok(OptimizedDocument {
        bytes: document,
        format,
        path,
        applied,
    })
}

async fn optimize_document(
    state: &AppState,
    analysis: &Analysis,
    selected: &[Suggestion],
    format: FileFormat,
) -> Result<Vec<u8>, PipelineError> {
    let original = state
        .storage
        .download(&state.config.resume_bucket, &analysis.resume_path)
        .await?;
    let text = normalize_text(&extract_text_blocking(original, analysis.file_format).await?);
    let rewritten = apply_optimizations(&text, selected);

    let page_config = state.page_config.clone();
    tokio::task::spawn_blocking(move || render_document(&rewritten, format, &page_config))
        .await
        .map_err(|e| PipelineError::RenderFailure(format!("renderer aborted: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::analysis::{Impact, SuggestionCategory};
    use crate::testing::Harness;

    fn suggestion(category: SuggestionCategory, title: &str) -> Suggestion {
        Suggestion {
            id: Uuid::new_v4(),
            category,
            suggestion: title.to_string(),
            details: "details".to_string(),
            impact: Impact::Medium,
        }
    }

    /// Seeds a completed analysis whose résumé is stored as plain text.
    fn seed(harness: &Harness, resume: &str, format: FileFormat) -> Analysis {
        let id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let resume_path = format!("{user_id}/{id}/resume.{format}");
        harness.storage.put("resumes", &resume_path, Bytes::from(resume.to_string()));

        let now = Utc::now();
        let analysis = Analysis {
            id,
            user_id,
            resume_path,
            job_description_path: format!("{user_id}/{id}/job-description.txt"),
            file_format: format,
            original_filename: format!("resume.{format}"),
            status: AnalysisStatus::Completed,
            similarity_score: Some(0.8),
            suggestions: vec![
                suggestion(SuggestionCategory::Skills, "Add missing technical skills"),
                suggestion(SuggestionCategory::Experience, "Add quantifiable achievements"),
                suggestion(SuggestionCategory::Format, "Use consistent bullets"),
            ],
            results: None,
            selected_suggestions: Vec::new(),
            optimized_at: None,
            optimized_file_name: None,
            created_at: now,
            updated_at: now,
        };
        harness.repository.put(analysis.clone());
        analysis
    }

    fn request(analysis: &Analysis, selected: Vec<Uuid>, format: Option<&str>) -> OptimizeRequest {
        OptimizeRequest {
            user_id: analysis.user_id,
            selected_suggestions: selected,
            output_format: format.map(str::to_string),
        }
    }

    #[test]
    fn test_resolve_selection_skips_unknown_and_duplicate_ids() {
        let stored = vec![
            suggestion(SuggestionCategory::Skills, "a"),
            suggestion(SuggestionCategory::Format, "b"),
        ];
        let picked = resolve_selection(&stored, &[stored[1].id, Uuid::new_v4(), stored[1].id]);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].suggestion, "b");
    }

    #[test]
    fn test_output_format_selection() {
        assert_eq!(output_format(None, FileFormat::Docx).unwrap(), FileFormat::Docx);
        assert_eq!(output_format(None, FileFormat::Txt).unwrap(), FileFormat::Pdf);
        assert_eq!(output_format(Some("DOCX"), FileFormat::Pdf).unwrap(), FileFormat::Docx);
        assert!(matches!(
            output_format(Some("odt"), FileFormat::Pdf),
            Err(PipelineError::UnsupportedOutputFormat(_))
        ));
        assert!(matches!(
            output_format(Some("txt"), FileFormat::Pdf),
            Err(PipelineError::UnsupportedOutputFormat(_))
        ));
    }

    #[tokio::test]
    async fn test_optimize_applies_selection_and_stores_artifact() {
        let harness = Harness::happy();
        let analysis = seed(&harness, "Jane Doe\n5 years of experience in Java", FileFormat::Txt);
        let selected = vec![analysis.suggestions[0].id, analysis.suggestions[1].id, Uuid::new_v4()];

        let document = run_optimization(
            &harness.state(),
            analysis.id,
            request(&analysis, selected, Some("docx")),
        )
        .await
        .unwrap();

        assert_eq!(document.format, FileFormat::Docx);
        assert_eq!(document.applied.len(), 2);
        assert!(document.path.ends_with("-optimized.docx"));
        assert!(harness.storage.get("optimized-resumes", &document.path).is_some());

        let text = crate::extraction::docx::extract(&document.bytes).unwrap();
        assert!(text.starts_with("TECHNICAL SKILLS"));
        assert!(text.contains("in Java with demonstrated success"));

        let stored = harness.repository.snapshot(analysis.id).unwrap();
        assert_eq!(stored.selected_suggestions, document.applied);
        assert_eq!(stored.optimized_file_name.as_deref(), Some(document.path.as_str()));
        assert!(stored.optimized_at.is_some());
    }

    #[tokio::test]
    async fn test_txt_original_renders_pdf_by_default() {
        let harness = Harness::happy();
        let analysis = seed(&harness, "Jane Doe", FileFormat::Txt);

        let document = run_optimization(&harness.state(), analysis.id, request(&analysis, vec![], None))
            .await
            .unwrap();
        assert_eq!(document.format, FileFormat::Pdf);
        assert!(document.bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_each_call_creates_new_artifact() {
        let harness = Harness::happy();
        let analysis = seed(&harness, "Jane Doe", FileFormat::Txt);
        let state = harness.state();

        let (first, second) = tokio::join!(
            run_optimization(&state, analysis.id, request(&analysis, vec![], None)),
            run_optimization(&state, analysis.id, request(&analysis, vec![], None)),
        );
        let (first, second) = (first.unwrap(), second.unwrap());
        assert_ne!(first.path, second.path);
        assert_eq!(harness.storage.count("optimized-resumes"), 2);
    }

    #[tokio::test]
    async fn test_other_users_analysis_is_not_found() {
        let harness = Harness::happy();
        let analysis = seed(&harness, "Jane Doe", FileFormat::Txt);
        let mut req = request(&analysis, vec![], None);
        req.user_id = Uuid::new_v4();

        let err = run_optimization(&harness.state(), analysis.id, req).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_incomplete_analysis_rejected() {
        let harness = Harness::happy();
        let mut analysis = seed(&harness, "Jane Doe", FileFormat::Txt);
        analysis.status = AnalysisStatus::Processing;
        harness.repository.put(analysis.clone());

        let err = run_optimization(&harness.state(), analysis.id, request(&analysis, vec![], None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_txt_output_format_unsupported() {
        let harness = Harness::happy();
        let analysis = seed(&harness, "Jane Doe", FileFormat::Txt);

        let err = run_optimization(&harness.state(), analysis.id, request(&analysis, vec![], Some("txt")))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnprocessableEntity(_)));
        assert_eq!(harness.storage.count("optimized-resumes"), 0);
    }
}
