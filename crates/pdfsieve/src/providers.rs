//! Narrow interfaces to the external extraction providers.
//!
//! Each strategy holds an ordered list of these trait objects and stops at
//! the first one that succeeds. Real implementations live in [`crate::pdf`]
//! and [`crate::ocr`]; tests substitute their own.
//!
//! Providers are called from async strategy code. Implementations that block
//! (pdfium, lopdf, subprocesses) must move that work off the runtime threads,
//! typically with `tokio::task::spawn_blocking`.

use crate::document::{Document, PageNumber};
use crate::ocr::error::OcrError;
use crate::pdf::error::PdfError;
use crate::types::TextSource;
use async_trait::async_trait;
use image::DynamicImage;
use thiserror::Error;

/// A provider call failed. Always absorbed by the calling strategy.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error(transparent)]
    Pdf(#[from] PdfError),

    #[error(transparent)]
    Ocr(#[from] OcrError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("worker task failed: {0}")]
    Task(String),

    #[error("{0}")]
    Other(String),
}

impl From<tokio::task::JoinError> for ProviderError {
    fn from(err: tokio::task::JoinError) -> Self {
        ProviderError::Task(err.to_string())
    }
}

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// A table as returned by a detector: rows of cells, `None` for blank cells.
pub type RawTable = Vec<Vec<Option<String>>>;

/// Per-page text extraction.
#[async_trait]
pub trait TextProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Tag recorded on blocks this provider produces.
    fn source(&self) -> TextSource;

    /// Text for one page. An empty string is a valid result for a blank page.
    async fn extract_page(&self, document: &Document, page: PageNumber) -> ProviderResult<String>;
}

/// Per-page table detection.
#[async_trait]
pub trait TableProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Tables on one page in detection order. Zero tables is not an error.
    async fn detect_tables(&self, document: &Document, page: PageNumber) -> ProviderResult<Vec<RawTable>>;
}

/// Renders the whole document in one call.
#[async_trait]
pub trait BatchRasterizer: Send + Sync {
    fn name(&self) -> &str;

    /// One image per page, in page order.
    async fn rasterize_all(&self, document: &Document, dpi: u32) -> ProviderResult<Vec<DynamicImage>>;
}

/// Renders one page at a time.
#[async_trait]
pub trait PageRasterizer: Send + Sync {
    fn name(&self) -> &str;

    async fn rasterize_page(&self, document: &Document, page: PageNumber, dpi: u32) -> ProviderResult<DynamicImage>;
}

/// Recognizes text in a rendered page.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Recognized text, possibly empty when the image holds no text.
    async fn recognize(&self, image: &DynamicImage, language: &str) -> ProviderResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_is_transparent_over_pdf_error() {
        let err: ProviderError = PdfError::PageNotFound(9).into();
        assert_eq!(err.to_string(), "Page 9 not found");
    }

    #[tokio::test]
    async fn test_join_error_converts() {
        let handle = tokio::spawn(async { panic!("boom") });
        let join_err = handle.await.unwrap_err();
        let err: ProviderError = join_err.into();
        assert!(matches!(err, ProviderError::Task(_)));
    }
}
