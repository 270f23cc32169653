//! Result types produced by an extraction run.

use crate::core::capabilities::Capabilities;
use crate::diagnostics::Diagnostic;
use crate::document::PageNumber;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Standard document properties from the PDF info dictionary.
///
/// Absent properties stay `None` and are omitted everywhere downstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub producer: Option<String>,
    /// ISO 8601 when the PDF date parses, otherwise the raw value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modification_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_version: Option<String>,
    pub page_count: u32,
}

impl DocumentMetadata {
    /// Present properties as `(key, value)` pairs in a fixed order.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let optional = [
            ("title", &self.title),
            ("author", &self.author),
            ("subject", &self.subject),
            ("keywords", &self.keywords),
            ("creator", &self.creator),
            ("producer", &self.producer),
            ("creation_date", &self.creation_date),
            ("modification_date", &self.modification_date),
            ("pdf_version", &self.pdf_version),
        ];

        let mut entries: Vec<(&'static str, String)> = optional
            .into_iter()
            .filter_map(|(key, value)| value.as_ref().map(|v| (key, v.clone())))
            .collect();
        entries.push(("pages", self.page_count.to_string()));
        entries
    }
}

/// Which text provider produced a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
    /// Layout-aware, markdown-like text.
    Layout,
    /// Plain text in content-stream order.
    Plain,
    /// Every provider failed; the block is empty.
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBlock {
    pub page: PageNumber,
    pub content: String,
    pub source: TextSource,
}

/// One detected table, header split from data rows.
///
/// Every data row has exactly `header.len()` cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub page: PageNumber,
    /// 1-based, restarts on every page.
    pub table_number: u32,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderOrigin {
    /// Batch render through the external rasterizer.
    HighFidelity,
    /// Per-page pixmap render through the baseline reader.
    Pixmap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
        }
    }

    pub(crate) fn as_image_format(self) -> image::ImageFormat {
        match self {
            ImageFormat::Png => image::ImageFormat::Png,
        }
    }
}

/// One rasterized page, independent of which path rendered it.
///
/// Pixels are shared, so handing a clone to OCR does not copy them.
#[derive(Debug, Clone)]
pub struct RenderedImage {
    pub page: PageNumber,
    pub image: Arc<DynamicImage>,
    pub dpi: u32,
    pub format: ImageFormat,
    pub origin: RenderOrigin,
}

impl RenderedImage {
    pub fn new(page: PageNumber, image: DynamicImage, dpi: u32, origin: RenderOrigin) -> Self {
        Self {
            page,
            image: Arc::new(image),
            dpi,
            format: ImageFormat::Png,
            origin,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Recognized text for one rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrText {
    pub page: PageNumber,
    pub content: String,
    /// Name of the engine that produced the text.
    pub engine: String,
}

/// The four content streams before assembly.
#[derive(Debug, Clone, Default)]
pub struct ExtractedStreams {
    pub text: Vec<TextBlock>,
    pub tables: Vec<Table>,
    pub images: Vec<RenderedImage>,
    pub ocr_text: Vec<OcrText>,
}

/// Aggregate of one extraction run. Every stream is present, possibly empty.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    pub metadata: DocumentMetadata,
    pub text: Vec<TextBlock>,
    pub tables: Vec<Table>,
    pub images: Vec<RenderedImage>,
    pub ocr_text: Vec<OcrText>,
    pub capabilities: Capabilities,
    pub diagnostics: Vec<Diagnostic>,
}

impl ExtractionResult {
    /// Combine finished streams. Entries are ordered by page (then table
    /// number); nothing is recomputed.
    pub fn assemble(
        metadata: DocumentMetadata,
        streams: ExtractedStreams,
        capabilities: Capabilities,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        let ExtractedStreams {
            mut text,
            mut tables,
            mut images,
            mut ocr_text,
        } = streams;

        text.sort_by_key(|block| block.page);
        tables.sort_by_key(|table| (table.page, table.table_number));
        images.sort_by_key(|image| image.page);
        ocr_text.sort_by_key(|ocr| ocr.page);

        Self {
            metadata,
            text,
            tables,
            images,
            ocr_text,
            capabilities,
            diagnostics,
        }
    }

    pub fn text_for(&self, page: PageNumber) -> Option<&TextBlock> {
        self.text.iter().find(|block| block.page == page)
    }

    pub fn tables_for(&self, page: PageNumber) -> impl Iterator<Item = &Table> {
        self.tables.iter().filter(move |table| table.page == page)
    }

    pub fn image_for(&self, page: PageNumber) -> Option<&RenderedImage> {
        self.images.iter().find(|image| image.page == page)
    }

    pub fn ocr_for(&self, page: PageNumber) -> Option<&OcrText> {
        self.ocr_text.iter().find(|ocr| ocr.page == page)
    }

    /// Serializable view without pixel data.
    pub fn summary(&self) -> ResultSummary {
        ResultSummary {
            metadata: self.metadata.clone(),
            text: self.text.clone(),
            tables: self.tables.clone(),
            images: self
                .images
                .iter()
                .map(|image| ImageSummary {
                    page: image.page,
                    width: image.width(),
                    height: image.height(),
                    dpi: image.dpi,
                    format: image.format,
                    origin: image.origin,
                })
                .collect(),
            ocr_text: self.ocr_text.clone(),
            capabilities: self.capabilities.clone(),
            diagnostics: self.diagnostics.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSummary {
    pub page: PageNumber,
    pub width: u32,
    pub height: u32,
    pub dpi: u32,
    pub format: ImageFormat,
    pub origin: RenderOrigin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultSummary {
    pub metadata: DocumentMetadata,
    pub text: Vec<TextBlock>,
    pub tables: Vec<Table>,
    pub images: Vec<ImageSummary>,
    pub ocr_text: Vec<OcrText>,
    pub capabilities: Capabilities,
    pub diagnostics: Vec<Diagnostic>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(n: u32) -> PageNumber {
        PageNumber::new(n).unwrap()
    }

    #[test]
    fn test_metadata_entries_omit_absent_fields() {
        let metadata = DocumentMetadata {
            title: Some("Quarterly Report".to_string()),
            producer: Some("LibreOffice".to_string()),
            page_count: 3,
            ..Default::default()
        };

        let entries = metadata.entries();
        assert_eq!(
            entries,
            vec![
                ("title", "Quarterly Report".to_string()),
                ("producer", "LibreOffice".to_string()),
                ("pages", "3".to_string()),
            ]
        );
    }

    #[test]
    fn test_metadata_serialization_skips_none() {
        let metadata = DocumentMetadata {
            author: Some("Ada".to_string()),
            page_count: 1,
            ..Default::default()
        };
        let json = serde_json::to_value(&metadata).unwrap();
        assert_eq!(json["author"], "Ada");
        assert!(json.get("title").is_none());
        assert_eq!(json["page_count"], 1);
    }

    #[test]
    fn test_assemble_orders_streams_by_page() {
        let streams = ExtractedStreams {
            text: vec![
                TextBlock {
                    page: page(2),
                    content: "b".to_string(),
                    source: TextSource::Plain,
                },
                TextBlock {
                    page: page(1),
                    content: "a".to_string(),
                    source: TextSource::Layout,
                },
            ],
            tables: vec![
                Table {
                    page: page(3),
                    table_number: 1,
                    header: vec![],
                    rows: vec![],
                },
                Table {
                    page: page(1),
                    table_number: 2,
                    header: vec![],
                    rows: vec![],
                },
                Table {
                    page: page(1),
                    table_number: 1,
                    header: vec![],
                    rows: vec![],
                },
            ],
            images: vec![],
            ocr_text: vec![
                OcrText {
                    page: page(2),
                    content: String::new(),
                    engine: "fake".to_string(),
                },
                OcrText {
                    page: page(1),
                    content: "x".to_string(),
                    engine: "fake".to_string(),
                },
            ],
        };

        let result = ExtractionResult::assemble(
            DocumentMetadata::default(),
            streams,
            Capabilities::none(),
            Vec::new(),
        );

        let text_pages: Vec<u32> = result.text.iter().map(|b| b.page.get()).collect();
        assert_eq!(text_pages, vec![1, 2]);
        let table_keys: Vec<(u32, u32)> = result.tables.iter().map(|t| (t.page.get(), t.table_number)).collect();
        assert_eq!(table_keys, vec![(1, 1), (1, 2), (3, 1)]);
        assert_eq!(result.ocr_for(page(1)).unwrap().content, "x");
        assert_eq!(result.tables_for(page(1)).count(), 2);
    }

    #[test]
    fn test_summary_drops_pixels() {
        let image = RenderedImage::new(
            page(1),
            DynamicImage::new_rgb8(20, 10),
            72,
            RenderOrigin::Pixmap,
        );
        let result = ExtractionResult::assemble(
            DocumentMetadata::default(),
            ExtractedStreams {
                images: vec![image],
                ..Default::default()
            },
            Capabilities::none(),
            Vec::new(),
        );

        let json = serde_json::to_value(result.summary()).unwrap();
        assert_eq!(json["images"][0]["width"], 20);
        assert_eq!(json["images"][0]["origin"], "pixmap");
        assert_eq!(json["images"][0]["format"], "png");
    }
}
