//! Run orchestration: configuration, capability detection, cancellation and
//! the extraction entry points.
//!
//! # Example
//!
//! ```rust,no_run
//! use pdfsieve::core::config::ExtractionConfig;
//! use pdfsieve::core::extractor::extract_file;
//!
//! # async fn example() -> pdfsieve::Result<()> {
//! let config = ExtractionConfig::default();
//! let result = extract_file("report.pdf", &config).await?;
//! println!("{} pages, {} tables", result.metadata.page_count, result.tables.len());
//! # Ok(())
//! # }
//! ```

pub mod cancel;
pub mod capabilities;
pub mod config;
pub mod extractor;

pub use cancel::CancelToken;
pub use capabilities::{Capabilities, Capability};
pub use config::{ExtractionConfig, OcrConfig};
pub use extractor::{
    extract_bytes, extract_bytes_sync, extract_document, extract_file, extract_file_sync, extract_file_with,
};
