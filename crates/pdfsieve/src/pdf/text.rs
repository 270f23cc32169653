//! Text providers: plain text through lopdf, layout-aware text through pdfium.

use super::bindings::pdfium;
use super::error::{PdfError, classify_load_error};
use super::layout::{Line, group_words_into_lines, page_words};
use crate::document::{Document, PageNumber};
use crate::providers::{ProviderResult, TextProvider};
use crate::types::TextSource;
use async_trait::async_trait;
use std::path::PathBuf;

/// Lines this much taller than body text become `#` headings.
const TITLE_RATIO: f32 = 1.8;
/// Lines this much taller than body text become `##` headings.
const HEADING_RATIO: f32 = 1.3;
/// Longer lines are never treated as headings.
const MAX_HEADING_CHARS: usize = 80;
/// Vertical gap, relative to body line height, that starts a new paragraph.
const PARAGRAPH_GAP_RATIO: f32 = 0.8;

const BULLETS: &[char] = &['•', '◦', '▪', '‣', '∙'];

/// Baseline text in content-stream order, read by the same library that
/// opened the document.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextProvider;

#[async_trait]
impl TextProvider for PlainTextProvider {
    fn name(&self) -> &str {
        "lopdf-plain"
    }

    fn source(&self) -> TextSource {
        TextSource::Plain
    }

    async fn extract_page(&self, document: &Document, page: PageNumber) -> ProviderResult<String> {
        let document = document.clone();
        let text = tokio::task::spawn_blocking(move || {
            document
                .pdf()
                .extract_text(&[page.get()])
                .map_err(|e| PdfError::TextExtractionFailed(format!("Page {}: {}", page, e)))
        })
        .await??;
        Ok(text)
    }
}

/// Layout-aware text: lines rebuilt from character positions, rendered as
/// markdown-like text with headings, bullets and paragraph breaks.
#[derive(Debug, Default, Clone)]
pub struct LayoutTextProvider {
    lib_dir: Option<PathBuf>,
}

impl LayoutTextProvider {
    pub fn new(lib_dir: Option<PathBuf>) -> Self {
        Self { lib_dir }
    }
}

#[async_trait]
impl TextProvider for LayoutTextProvider {
    fn name(&self) -> &str {
        "pdfium-layout"
    }

    fn source(&self) -> TextSource {
        TextSource::Layout
    }

    async fn extract_page(&self, document: &Document, page: PageNumber) -> ProviderResult<String> {
        let document = document.clone();
        let lib_dir = self.lib_dir.clone();

        let text = tokio::task::spawn_blocking(move || -> Result<String, PdfError> {
            let pdfium = pdfium(lib_dir.as_deref(), PdfError::TextExtractionFailed, "layout text")?;
            let pdf = pdfium
                .load_pdf_from_byte_slice(document.bytes(), None)
                .map_err(classify_load_error)?;
            let pdf_page = pdf
                .pages()
                .get(page.index() as u16)
                .map_err(|_| PdfError::PageNotFound(page.get()))?;

            let lines = group_words_into_lines(page_words(&pdf_page)?);
            Ok(render_markdown(&lines))
        })
        .await??;

        Ok(text)
    }
}

/// Render lines as markdown-like text.
pub(crate) fn render_markdown(lines: &[Line]) -> String {
    if lines.is_empty() {
        return String::new();
    }

    let body_height = median_height(lines);
    let mut out = String::new();
    let mut previous: Option<(&Line, bool)> = None;

    for line in lines {
        let text = line.text();
        let heading_level = heading_level(line, &text, body_height);

        if let Some((prev, prev_was_heading)) = previous {
            let gap = line.top - prev.bottom();
            if prev_was_heading || heading_level.is_some() || gap > body_height * PARAGRAPH_GAP_RATIO {
                out.push_str("\n\n");
            } else {
                out.push('\n');
            }
        }

        match heading_level {
            Some(level) => {
                out.push_str(&"#".repeat(level));
                out.push(' ');
                out.push_str(&text);
            }
            None => match text.strip_prefix(BULLETS) {
                Some(rest) => {
                    out.push_str("- ");
                    out.push_str(rest.trim_start());
                }
                None => out.push_str(&text),
            },
        }

        previous = Some((line, heading_level.is_some()));
    }

    out.push('\n');
    out
}

fn heading_level(line: &Line, text: &str, body_height: f32) -> Option<usize> {
    if body_height <= 0.0 || text.chars().count() > MAX_HEADING_CHARS {
        return None;
    }
    let ratio = line.height / body_height;
    if ratio >= TITLE_RATIO {
        Some(1)
    } else if ratio >= HEADING_RATIO {
        Some(2)
    } else {
        None
    }
}

fn median_height(lines: &[Line]) -> f32 {
    let mut heights: Vec<f32> = lines.iter().map(|l| l.height).collect();
    heights.sort_by(f32::total_cmp);
    heights[heights.len() / 2]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::layout::Word;

    fn line(text: &str, top: f32, height: f32) -> Line {
        Line {
            words: text
                .split(' ')
                .enumerate()
                .map(|(i, w)| Word {
                    text: w.to_string(),
                    left: i as f32 * 40.0,
                    top,
                    width: 30.0,
                    height,
                })
                .collect(),
            top,
            height,
        }
    }

    #[test]
    fn test_render_markdown_empty_page() {
        assert_eq!(render_markdown(&[]), "");
    }

    #[test]
    fn test_render_markdown_headings_and_paragraphs() {
        let lines = vec![
            line("Annual Report", 10.0, 24.0),
            line("Overview", 50.0, 14.0),
            line("Revenue grew this year", 70.0, 10.0),
            line("across all regions", 81.0, 10.0),
            line("Costs were flat", 110.0, 10.0),
        ];

        let md = render_markdown(&lines);
        assert_eq!(
            md,
            "# Annual Report\n\n## Overview\n\nRevenue grew this year\nacross all regions\n\nCosts were flat\n"
        );
    }

    #[test]
    fn test_render_markdown_bullets() {
        let lines = vec![line("• first", 10.0, 10.0), line("• second", 21.0, 10.0)];
        assert_eq!(render_markdown(&lines), "- first\n- second\n");
    }

    #[test]
    fn test_provider_names_and_sources() {
        assert_eq!(PlainTextProvider.source(), TextSource::Plain);
        assert_eq!(LayoutTextProvider::default().source(), TextSource::Layout);
        assert_ne!(PlainTextProvider.name(), LayoutTextProvider::default().name());
    }
}
