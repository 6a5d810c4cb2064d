use crate::errors::PipelineError;

/// Extracts the text layer of every page, in page order. Drawing operators,
/// images and other non-text content are ignored by the parser.
pub fn extract(bytes: &[u8]) -> Result<String, PipelineError> {
    pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| PipelineError::ExtractionFailure(format!("PDF extraction failed: {e}")))
}
