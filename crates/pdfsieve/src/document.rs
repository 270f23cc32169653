//! The opened input document and page correlation keys.

use crate::error::{Result, SieveError};
use crate::pdf::error::PdfError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// 1-based page number, matching document order.
///
/// Every per-page artifact carries one; it is a correlation key only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageNumber(u32);

impl PageNumber {
    /// Returns `None` for 0.
    pub fn new(number: u32) -> Option<Self> {
        (number > 0).then_some(Self(number))
    }

    /// Page number for a 0-based page index.
    pub fn from_index(index: usize) -> Self {
        Self(index as u32 + 1)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// 0-based index, as used by pdfium.
    pub fn index(self) -> usize {
        (self.0 - 1) as usize
    }
}

impl fmt::Display for PageNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct DocumentInner {
    path: Option<PathBuf>,
    bytes: Vec<u8>,
    pdf: lopdf::Document,
    page_count: u32,
}

/// One opened PDF.
///
/// Parsed once per run and shared read-only by every strategy. Cloning is
/// cheap; the parsed document and its bytes are released when the last clone
/// is dropped.
#[derive(Clone)]
pub struct Document {
    inner: Arc<DocumentInner>,
}

impl Document {
    /// Read and parse a PDF file.
    ///
    /// Any failure, including a missing or unreadable file, is a document-open
    /// error: the run cannot proceed without the baseline reader.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| {
            SieveError::document_open_with_source(format!("Cannot read PDF file {}", path.display()), e)
        })?;
        Self::parse(bytes, Some(path.to_path_buf()))
    }

    /// Parse a PDF held in memory.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        Self::parse(bytes.into(), None)
    }

    fn parse(bytes: Vec<u8>, path: Option<PathBuf>) -> Result<Self> {
        let label = path
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<memory>".to_string());

        if bytes.is_empty() {
            return Err(SieveError::document_open(format!("{} is empty", label)));
        }

        let pdf = lopdf::Document::load_mem(&bytes).map_err(|e| {
            let err = PdfError::from(e);
            SieveError::document_open_with_source(format!("{} is not a readable PDF", label), err)
        })?;

        if pdf.is_encrypted() {
            tracing::warn!(document = %label, "Document is encrypted; per-page extraction may fail");
        }

        let page_count = pdf.get_pages().len() as u32;
        tracing::debug!(document = %label, page_count, "Document opened");

        Ok(Self {
            inner: Arc::new(DocumentInner {
                path,
                bytes,
                pdf,
                page_count,
            }),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.inner.path.as_deref()
    }

    /// Raw file bytes, for providers that parse the document themselves.
    pub fn bytes(&self) -> &[u8] {
        &self.inner.bytes
    }

    pub fn pdf(&self) -> &lopdf::Document {
        &self.inner.pdf
    }

    pub fn page_count(&self) -> u32 {
        self.inner.page_count
    }

    /// All pages in document order.
    pub fn pages(&self) -> impl Iterator<Item = PageNumber> + use<> {
        (1..=self.inner.page_count).map(PageNumber)
    }

    /// Whether `page` exists in this document.
    pub fn contains(&self, page: PageNumber) -> bool {
        page.get() <= self.inner.page_count
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("path", &self.inner.path)
            .field("bytes", &self.inner.bytes.len())
            .field("page_count", &self.inner.page_count)
            .finish()
    }
}
