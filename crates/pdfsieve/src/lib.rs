//! pdfsieve - PDF content extraction with capability-aware fallbacks
//!
//! pdfsieve pulls five kinds of content out of a PDF: document metadata,
//! per-page text, tables, rasterized page images and OCR text. Optional
//! providers (pdfium, poppler's `pdftoppm`, Tesseract) are detected once per
//! process; each content type degrades to whatever the environment offers
//! instead of failing the run.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use pdfsieve::{ExtractionConfig, export_to_dir, extract_file_sync};
//!
//! # fn main() -> pdfsieve::Result<()> {
//! let config = ExtractionConfig::default();
//! let result = extract_file_sync("report.pdf", &config)?;
//! for diagnostic in &result.diagnostics {
//!     eprintln!("{}", diagnostic);
//! }
//! export_to_dir(&result, "report_results")?;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Core** (`core`): configuration, capability detection, cancellation and
//!   the extraction entry points
//! - **Strategies** (`strategy`): text, tables, images and OCR, each an ordered
//!   provider list applied per page
//! - **Providers** (`providers`, `pdf`, `ocr`): the traits strategies call and
//!   their pdfium / lopdf / pdftoppm / Tesseract implementations
//! - **Export** (`export`): directory tree and ZIP archive output
//!
//! A failing provider only costs the unit it was working on (a page, a table,
//! an image); the failure is recorded in [`ExtractionResult::diagnostics`].
//! Only an unreadable document, an invalid config or cancellation fail a run.

#![deny(unsafe_code)]

pub mod core;
pub mod diagnostics;
pub mod document;
pub mod error;
pub mod export;
pub mod ocr;
pub mod pdf;
pub mod providers;
pub mod strategy;
pub mod types;

pub use error::{Result, SieveError};

pub use crate::core::cancel::CancelToken;
pub use crate::core::capabilities::{Capabilities, Capability};
pub use crate::core::config::{ExtractionConfig, OcrConfig};
pub use crate::core::extractor::{
    extract_bytes, extract_bytes_sync, extract_document, extract_file, extract_file_sync, extract_file_with,
};

pub use diagnostics::{Diagnostic, DiagnosticLevel, Diagnostics, Stream};
pub use document::{Document, PageNumber};
pub use export::{ExportSummary, archive_bytes, archive_file_name, export_archive, export_to_dir};
pub use strategy::ProviderSet;
pub use types::{
    DocumentMetadata, ExtractedStreams, ExtractionResult, ImageFormat, ImageSummary, OcrText, RenderOrigin,
    RenderedImage, ResultSummary, Table, TextBlock, TextSource,
};
