//! Document Renderer: rewritten text back into a PDF or DOCX byte stream.

pub mod docx;
pub mod font_metrics;
pub mod pdf;

use crate::errors::PipelineError;
use crate::models::analysis::FileFormat;

pub use font_metrics::{default_page_config, PageConfig};

/// Renders `text` in the requested format. Plain text is not a render target.
pub fn render_document(
    text: &str,
    format: FileFormat,
    config: &PageConfig,
) -> Result<Vec<u8>, PipelineError> {
    match format {
        FileFormat::Pdf => pdf::render_pdf(text, config),
        FileFormat::Docx => docx::render_docx(text),
        FileFormat::Txt => Err(PipelineError::UnsupportedOutputFormat(format.to_string())),
    }
}
