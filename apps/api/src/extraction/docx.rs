use docx_rs::{
    DocumentChild, Paragraph, ParagraphChild, RunChild, Table, TableCellContent, TableChild,
    TableRowChild,
};

use crate::errors::PipelineError;
use crate::render::docx::is_heading_line;

/// Extracts paragraph and table text from a DOCX body, one paragraph per line.
///
/// Section headings (a `Heading*`/`Title` style, or a short all-caps line)
/// open a new blank-line-delimited block. Styled headings are emitted in
/// capitals. List paragraphs are prefixed with `- `, indented two spaces per
/// nesting level.
pub fn extract(bytes: &[u8]) -> Result<String, PipelineError> {
    let docx = docx_rs::read_docx(bytes)
        .map_err(|e| PipelineError::ExtractionFailure(format!("DOCX parse error: {e}")))?;

    let mut lines: Vec<String> = Vec::new();
    for child in &docx.document.children {
        match child {
            DocumentChild::Paragraph(paragraph) => {
                let text = paragraph_text(paragraph);
                if is_styled_heading(paragraph) && !text.trim().is_empty() {
                    start_block(&mut lines);
                    lines.push(text.trim().to_uppercase());
                } else if let Some(prefix) = list_prefix(paragraph) {
                    lines.push(format!("{prefix}{}", text.trim_start()));
                } else if is_heading_line(&text) {
                    start_block(&mut lines);
                    lines.push(text);
                } else {
                    lines.push(text);
                }
            }
            DocumentChild::Table(table) => lines.extend(table_lines(table)),
            _ => {}
        }
    }

    Ok(lines.join("\n"))
}

/// Separates what follows from the previous block with one blank line.
fn start_block(lines: &mut Vec<String>) {
    if lines.last().is_some_and(|last| !last.trim().is_empty()) {
        lines.push(String::new());
    }
}

fn is_styled_heading(paragraph: &Paragraph) -> bool {
    paragraph
        .property
        .style
        .as_ref()
        .is_some_and(|style| style.val.starts_with("Heading") || style.val == "Title")
}

fn list_prefix(paragraph: &Paragraph) -> Option<String> {
    let numbering = paragraph.property.numbering_property.as_ref()?;
    let level = numbering.level.as_ref().map_or(0, |l| l.val);
    Some(format!("{}- ", "  ".repeat(level)))
}

fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut content = String::new();
    for child in &paragraph.children {
        if let ParagraphChild::Run(run) = child {
            for run_child in &run.children {
                match run_child {
                    RunChild::Text(text) => content.push_str(&text.text),
                    RunChild::Tab(_) => content.push('\t'),
                    RunChild::Break(_) => content.push('\n'),
                    _ => {}
                }
            }
        }
    }
    content
}

/// Each table row becomes one line with cells separated by " | ".
fn table_lines(table: &Table) -> Vec<String> {
    let mut lines = Vec::new();
    for TableChild::TableRow(row) in &table.rows {
        let cells: Vec<String> = row
            .cells
            .iter()
            .map(|TableRowChild::TableCell(cell)| {
                cell.children
                    .iter()
                    .filter_map(|content| match content {
                        TableCellContent::Paragraph(p) => Some(paragraph_text(p)),
                        _ => None,
                    })
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .filter(|cell| !cell.trim().is_empty())
            .collect();
        if !cells.is_empty() {
            lines.push(cells.join(" | "));
        }
    }
    lines
}
