//! Paginated PDF rendering.
//!
//! `layout_pages` is the pure layout pass (word-wrap, bullet indent, page
//! breaks); `render_pdf` encodes its output with lopdf using the built-in
//! Helvetica font, so no font file is embedded.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use crate::errors::PipelineError;
use crate::render::font_metrics::{measure_str, PageConfig};

const FONT_NAME: &str = "F1";
const BULLET_MARKERS: [&str; 3] = ["- ", "* ", "+ "];

/// One line of text positioned on a page. `x`/`y` are the PDF text origin
/// (left edge, baseline) in points from the bottom-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub x: f32,
    pub y: f32,
    pub text: String,
}

pub type Page = Vec<PlacedLine>;

/// Maps text onto the glyph set the renderer can draw: printable ASCII plus
/// newline. Bullet glyphs become `-`, anything else becomes a space.
fn sanitize(text: &str) -> String {
    text.replace("\r\n", "\n")
        .chars()
        .map(|c| match c {
            '\n' => '\n',
            '\u{2022}' | '\u{25CF}' | '\u{25AA}' | '\u{2013}' | '\u{2014}' => '-',
            c if (' '..='~').contains(&c) => c,
            _ => ' ',
        })
        .collect()
}

fn is_bullet(line: &str) -> bool {
    BULLET_MARKERS.iter().any(|m| line.starts_with(m))
}

/// Greedy word-wrap against `max_width`. A single word wider than the line is
/// broken between characters so no output line exceeds the limit.
pub fn wrap_line(line: &str, max_width: f32, font_size: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in line.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if measure_str(&candidate, font_size) <= max_width {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if measure_str(word, font_size) <= max_width {
            current = word.to_string();
            continue;
        }

        for c in word.chars() {
            current.push(c);
            if measure_str(&current, font_size) > max_width && current.chars().count() > 1 {
                current.pop();
                lines.push(std::mem::replace(&mut current, c.to_string()));
            }
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Lays text out into pages.
///
/// Paragraphs are separated by blank lines and followed by a half-line gap.
/// Within a paragraph every source line starts a new output line. Bullet
/// lines and their continuations are indented by `bullet_indent_pt`. A new
/// page starts whenever the next line would cross the bottom margin.
pub fn layout_pages(text: &str, config: &PageConfig) -> Vec<Page> {
    let text = sanitize(text);
    let top = config.page_height_pt - config.margin_pt;
    let bottom = config.margin_pt;
    let usable = config.usable_width_pt();

    let mut pages: Vec<Page> = Vec::new();
    let mut page: Page = Vec::new();
    let mut cursor = top;

    let paragraphs = text
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty());

    for (index, paragraph) in paragraphs.enumerate() {
        if index > 0 && !page.is_empty() {
            cursor -= config.line_height_pt / 2.0;
        }

        for source_line in paragraph.lines() {
            let source_line = source_line.trim();
            if source_line.is_empty() {
                continue;
            }
            let indent = if is_bullet(source_line) {
                config.bullet_indent_pt
            } else {
                0.0
            };

            for wrapped in wrap_line(source_line, usable - indent, config.font_size_pt) {
                if cursor - config.line_height_pt < bottom {
                    pages.push(std::mem::take(&mut page));
                    cursor = top;
                }
                cursor -= config.line_height_pt;
                page.push(PlacedLine {
                    x: config.margin_pt + indent,
                    y: cursor,
                    text: wrapped,
                });
            }
        }
    }

    if !page.is_empty() || pages.is_empty() {
        pages.push(page);
    }
    pages
}

/// Renders text to a PDF byte buffer. Always produces at least one page.
pub fn render_pdf(text: &str, config: &PageConfig) -> Result<Vec<u8>, PipelineError> {
    let pages = layout_pages(text, config);
    encode_pdf(&pages, config)
        .map_err(|e| PipelineError::RenderFailure(format!("PDF encoding failed: {e}")))
}

fn encode_pdf(pages: &[Page], config: &PageConfig) -> Result<Vec<u8>, lopdf::Error> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            FONT_NAME => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page in pages {
        let mut operations = Vec::with_capacity(page.len() * 5);
        for line in page {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new(
                "Tf",
                vec![FONT_NAME.into(), config.font_size_pt.into()],
            ));
            operations.push(Operation::new("Td", vec![line.x.into(), line.y.into()]));
            operations.push(Operation::new(
                "Tj",
                vec![Object::string_literal(line.text.as_str())],
            ));
            operations.push(Operation::new("ET", vec![]));
        }

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    let media_box: Vec<Object> = vec![
        Object::Integer(0),
        Object::Integer(0),
        config.page_width_pt.into(),
        config.page_height_pt.into(),
    ];
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "MediaBox" => media_box,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)?;
    Ok(buffer)
}
