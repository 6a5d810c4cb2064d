use std::io::Cursor;

use docx_rs::{BreakType, Docx, Paragraph, Run, Style, StyleType};

use crate::errors::PipelineError;

const HEADING_STYLE: &str = "Heading1";
/// First lines longer than this are never treated as headings.
const MAX_HEADING_CHARS: usize = 40;

/// One paragraph of the output document.
#[derive(Debug, Clone, PartialEq)]
pub enum DocBlock {
    Heading(String),
    Body(Vec<String>),
}

/// A short line with at least one letter and no lowercase letters.
pub fn is_heading_line(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty()
        && line.chars().count() <= MAX_HEADING_CHARS
        && line.chars().any(|c| c.is_alphabetic())
        && !line.chars().any(|c| c.is_lowercase())
}

/// Splits text on blank lines. A block whose first line is a heading becomes
/// a heading paragraph followed by a body paragraph for any remaining lines.
pub fn plan_blocks(text: &str) -> Vec<DocBlock> {
    let mut blocks = Vec::new();

    for block in text.split("\n\n") {
        let lines: Vec<String> = block
            .lines()
            .map(str::trim_end)
            .filter(|l| !l.trim().is_empty())
            .map(str::to_string)
            .collect();
        let Some(first) = lines.first() else {
            continue;
        };

        if is_heading_line(first) {
            blocks.push(DocBlock::Heading(first.trim().to_string()));
            if lines.len() > 1 {
                blocks.push(DocBlock::Body(lines[1..].to_vec()));
            }
        } else {
            blocks.push(DocBlock::Body(lines));
        }
    }
    blocks
}

fn body_paragraph(lines: &[String]) -> Paragraph {
    let mut run = Run::new();
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            run = run.add_break(BreakType::TextWrapping);
        }
        run = run.add_text(line);
    }
    Paragraph::new().add_run(run)
}

/// Renders text to a DOCX byte buffer.
pub fn render_docx(text: &str) -> Result<Vec<u8>, PipelineError> {
    let heading_style = Style::new(HEADING_STYLE, StyleType::Paragraph)
        .name("Heading 1")
        .size(28)
        .bold();
    let mut docx = Docx::new().add_style(heading_style);

    for block in plan_blocks(text) {
        let paragraph = match block {
            DocBlock::Heading(title) => Paragraph::new()
                .add_run(Run::new().add_text(title))
                .style(HEADING_STYLE),
            DocBlock::Body(lines) => body_paragraph(&lines),
        };
        docx = docx.add_paragraph(paragraph);
    }

    let mut buffer = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buffer)
        .map_err(|e| PipelineError::RenderFailure(format!("DOCX packing failed: {e}")))?;
    Ok(buffer.into_inner())
}
