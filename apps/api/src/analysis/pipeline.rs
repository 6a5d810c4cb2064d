//! The "analyze" pass: store both documents, extract and normalize their
//! text, then score similarity and generate suggestions concurrently.
//!
//! Once the Analysis row exists, every exit path leaves it terminal: storage
//! failures, pipeline errors and the wall-clock timeout all end in
//! `mark_failed`. The work after the insert runs on its own task, so a caller
//! that goes away does not cancel it.

use bytes::Bytes;
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::analysis::keywords::{analyze_keywords, KeywordReport};
use crate::analysis::similarity::{match_score, score_similarity};
use crate::analysis::suggestions::generate_suggestions;
use crate::errors::{AppError, PipelineError};
use crate::extraction::{extract_text_blocking, normalize_text};
use crate::models::analysis::{Analysis, FileFormat, NewAnalysis, Suggestion};
use crate::state::AppState;

/// One uploaded document.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub filename: String,
    pub bytes: Bytes,
}

#[derive(Debug, Clone)]
pub struct AnalyzeInput {
    pub user_id: Uuid,
    pub resume: UploadedDocument,
    pub job_description: UploadedDocument,
}

struct AnalysisOutput {
    similarity: f64,
    suggestions: Vec<Suggestion>,
    keywords: KeywordReport,
    resume_chars: usize,
    job_chars: usize,
}

fn detect_format(document: &UploadedDocument) -> Result<FileFormat, PipelineError> {
    FileFormat::detect(&document.filename, &document.bytes).ok_or_else(|| {
        PipelineError::UnsupportedFormat(format!(
            "'{}' (expected .pdf, .docx or .txt)",
            document.filename
        ))
    })
}

/// Keeps `[A-Za-z0-9._-]` so user-supplied names are safe as object keys.
pub fn storage_file_name(filename: &str) -> String {
    let name = filename
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(filename);
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Runs the full analyze pass and returns the terminal Analysis.
///
/// Errors are returned only for problems found before the row is created
/// (unsupported formats) or for repository failures; pipeline failures are
/// reported through the returned Analysis' `failed` status.
pub async fn run_analysis(state: &AppState, input: AnalyzeInput) -> Result<Analysis, AppError> {
    let resume_format = detect_format(&input.resume)?;
    let job_format = detect_format(&input.job_description)?;

    let id = Uuid::new_v4();
    let new = NewAnalysis {
        id,
        user_id: input.user_id,
        resume_path: format!(
            "{}/{id}/{}",
            input.user_id,
            storage_file_name(&input.resume.filename)
        ),
        job_description_path: format!("{}/{id}/job-description.{job_format}", input.user_id),
        file_format: resume_format,
        original_filename: input.resume.filename.clone(),
    };
    state.repository.insert(&new).await?;
    info!("Analysis {id}: created for user {}", input.user_id);

    let task = tokio::spawn(drive_analysis(state.clone(), new, input, job_format));
    match task.await {
        Ok(result) => result,
        Err(join_err) => fail(state, id, PipelineError::Aborted(join_err.to_string())).await,
    }
}

/// Stores the uploads and carries the row from `pending` to a terminal status.
async fn drive_analysis(
    state: AppState,
    new: NewAnalysis,
    input: AnalyzeInput,
    job_format: FileFormat,
) -> Result<Analysis, AppError> {
    let state = &state;
    let id = new.id;

    if let Err(err) = store_uploads(state, &new, &input, job_format).await {
        return fail(state, id, err).await;
    }

    state.repository.mark_processing(id).await?;
    info!("Analysis {id}: processing");

    let timeout = state.config.pipeline_timeout();
    let outcome = match tokio::time::timeout(
        timeout,
        analyze_documents(state, id, input, new.file_format, job_format),
    )
    .await
    {
        Ok(result) => result,
        Err(_) => Err(PipelineError::Timeout(timeout)),
    };

    match outcome {
        Ok(output) => {
            let score = match_score(output.similarity);
            let keywords = &output.keywords;
            let results = json!({
                "raw_similarity": output.similarity,
                "suggestion_count": output.suggestions.len(),
                "resume_characters": output.resume_chars,
                "job_description_characters": output.job_chars,
                "skills_analysis": keywords.skills_analysis,
                "keyword_coverage": keywords.keyword_coverage,
                "recommendations": keywords.recommendations,
                "details": {
                    "resume_keywords": keywords.resume_keywords,
                    "job_keywords": keywords.job_keywords,
                },
            });
            state
                .repository
                .mark_completed(id, score, &output.suggestions, &results)
                .await?;
            info!(
                "Analysis {id}: completed (score {score:.3}, {} suggestions)",
                output.suggestions.len()
            );
            load(state, id).await
        }
        Err(err) => fail(state, id, err).await,
    }
}

/// Uploads both documents. If the job description cannot be stored, the
/// already-stored résumé is removed before returning the error.
async fn store_uploads(
    state: &AppState,
    new: &NewAnalysis,
    input: &AnalyzeInput,
    job_format: FileFormat,
) -> Result<(), PipelineError> {
    let config = &state.config;

    state
        .storage
        .upload(
            &config.resume_bucket,
            &new.resume_path,
            input.resume.bytes.clone(),
            new.file_format.content_type(),
        )
        .await?;

    let stored_job = state
        .storage
        .upload(
            &config.job_bucket,
            &new.job_description_path,
            input.job_description.bytes.clone(),
            job_format.content_type(),
        )
        .await;

    if let Err(err) = stored_job {
        if let Err(cleanup) = state
            .storage
            .remove(&config.resume_bucket, &new.resume_path)
            .await
        {
            warn!(
                "Analysis {}: could not remove orphaned resume {}: {cleanup}",
                new.id, new.resume_path
            );
        }
        return Err(err.into());
    }
    Ok(())
}

async fn analyze_documents(
    state: &AppState,
    id: Uuid,
    input: AnalyzeInput,
    resume_format: FileFormat,
    job_format: FileFormat,
) -> Result<AnalysisOutput, PipelineError> {
    let raw_resume = extract_text_blocking(input.resume.bytes, resume_format).await?;
    let raw_job = extract_text_blocking(input.job_description.bytes, job_format).await?;
    let resume_text = normalize_text(&raw_resume);
    let job_text = normalize_text(&raw_job);
    info!(
        "Analysis {id}: extracted {} resume chars, {} job description chars",
        resume_text.len(),
        job_text.len()
    );

    let (similarity, suggestions) = tokio::join!(
        score_similarity(state.embedder.as_ref(), &resume_text, &job_text),
        generate_suggestions(state.llm.as_ref(), &resume_text, &job_text),
    );

    let similarity = similarity?;
    let suggestions = suggestions?;
    let keywords = analyze_keywords(&resume_text, &job_text, match_score(similarity));

    Ok(AnalysisOutput {
        similarity,
        suggestions,
        keywords,
        resume_chars: resume_text.len(),
        job_chars: job_text.len(),
    })
}

async fn fail(state: &AppState, id: Uuid, err: PipelineError) -> Result<Analysis, AppError> {
    error!("Analysis {id}: failed: {err}");
    state.repository.mark_failed(id, &err.to_string()).await?;
    load(state, id).await
}

async fn load(state: &AppState, id: Uuid) -> Result<Analysis, AppError> {
    state
        .repository
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Analysis {id} not found")))
}
