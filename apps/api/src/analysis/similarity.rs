//! Similarity Scoring: cosine similarity of résumé and job-description embeddings.

use tracing::debug;

use crate::embeddings::EmbeddingService;
use crate::errors::PipelineError;

/// Embeds both texts in one request and returns their cosine similarity in [-1, 1].
pub async fn score_similarity(
    embedder: &dyn EmbeddingService,
    resume_text: &str,
    job_text: &str,
) -> Result<f64, PipelineError> {
    let vectors = embedder
        .embed(&[resume_text, job_text])
        .await
        .map_err(|e| PipelineError::EmbeddingService(e.to_string()))?;

    if vectors.len() < 2 {
        return Err(PipelineError::EmbeddingService(format!(
            "expected 2 embeddings, got {}",
            vectors.len()
        )));
    }

    let similarity = cosine_similarity(&vectors[0], &vectors[1])?;
    debug!("Cosine similarity: {similarity:.4}");
    Ok(similarity)
}

/// dot(a, b) / (|a| * |b|), accumulated in f64 and clamped to [-1, 1] to absorb rounding.
///
/// A zero-magnitude vector has no direction, so it is rejected instead of
/// producing NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64, PipelineError> {
    if a.len() != b.len() {
        return Err(PipelineError::EmbeddingService(format!(
            "embedding dimensions differ ({} vs {})",
            a.len(),
            b.len()
        )));
    }
    if a.iter().chain(b).any(|x| !x.is_finite()) {
        return Err(PipelineError::EmbeddingService(
            "embedding contains non-finite values".to_string(),
        ));
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0_f64, 0.0_f64, 0.0_f64);
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Err(PipelineError::DegenerateVector);
    }

    Ok((dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0))
}

/// Interprets a raw cosine similarity as a 0–1 match score.
pub fn match_score(similarity: f64) -> f64 {
    similarity.clamp(0.0, 1.0)
}
