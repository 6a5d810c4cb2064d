//! Text extraction from uploaded documents, plus normalization.
//!
//! Parsing is CPU-bound and third-party parsers may panic on hostile input,
//! so `extract_text_blocking` runs it on the blocking pool and turns a panic
//! into `ExtractionFailure`.

pub mod docx;
pub mod normalize;
pub mod pdf;

use bytes::Bytes;

use crate::errors::PipelineError;
use crate::models::analysis::FileFormat;

pub use normalize::normalize_text;

/// Produces UTF-8 text from raw bytes in the declared format.
pub fn extract_text(bytes: &[u8], format: FileFormat) -> Result<String, PipelineError> {
    let text = match format {
        FileFormat::Pdf => pdf::extract(bytes)?,
        FileFormat::Docx => docx::extract(bytes)?,
        FileFormat::Txt => String::from_utf8(bytes.to_vec()).map_err(|e| {
            PipelineError::ExtractionFailure(format!("text file is not valid UTF-8: {e}"))
        })?,
    };

    if text.trim().is_empty() {
        return Err(PipelineError::ExtractionFailure(format!(
            "no text found in {format} document"
        )));
    }
    Ok(text)
}

/// Runs `extract_text` on the blocking pool. The bytes are dropped when the
/// task finishes, whichever way it exits.
pub async fn extract_text_blocking(bytes: Bytes, format: FileFormat) -> Result<String, PipelineError> {
    tokio::task::spawn_blocking(move || extract_text(&bytes, format))
        .await
        .map_err(|e| {
            PipelineError::ExtractionFailure(format!("{format} parser aborted: {e}"))
        })?
}
