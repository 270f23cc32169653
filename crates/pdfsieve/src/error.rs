//! Error types for pdfsieve.
//!
//! Only two kinds of failure ever leave an extraction run: the document could
//! not be opened, or the export destination rejected a write. Everything that
//! goes wrong inside a single page, table, image or OCR call is absorbed at that
//! unit's boundary and recorded as a [`crate::Diagnostic`] instead.
//!
//! **System errors bubble up unchanged:**
//! - `SieveError::Io` (from `std::io::Error`) surfaces at API boundaries that
//!   are not part of a run, such as reading a config file.
//!
//! **Application errors carry context:**
//! - `DocumentOpen` - the input is missing, unreadable, or not a PDF
//! - `Export` - writing the result tree or archive failed
//! - `Validation` - invalid configuration or parameters
//! - `Cancelled` - the run was aborted through its [`crate::CancelToken`]
//!
//! # Example
//!
//! ```rust
//! use pdfsieve::{Result, SieveError};
//!
//! fn check_dpi(dpi: u32) -> Result<u32> {
//!     if dpi == 0 {
//!         return Err(SieveError::validation("target_dpi must be positive"));
//!     }
//!     Ok(dpi)
//! }
//! ```
use thiserror::Error;

/// Result type alias using `SieveError`.
pub type Result<T> = std::result::Result<T, SieveError>;

/// Main error type for all pdfsieve operations.
#[derive(Debug, Error)]
pub enum SieveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Document open error: {message}")]
    DocumentOpen {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Export error: {message}")]
    Export {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Extraction cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for SieveError {
    fn from(err: serde_json::Error) -> Self {
        SieveError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<crate::pdf::error::PdfError> for SieveError {
    fn from(err: crate::pdf::error::PdfError) -> Self {
        SieveError::DocumentOpen {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<zip::result::ZipError> for SieveError {
    fn from(err: zip::result::ZipError) -> Self {
        SieveError::Export {
            message: format!("Archive write failed: {}", err),
            source: Some(Box::new(err)),
        }
    }
}

macro_rules! error_constructor {
    ($name:ident, $variant:ident) => {
        paste::paste! {
            #[doc = "Create a " $variant " error"]
            pub fn $name<S: Into<String>>(message: S) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: None,
                }
            }

            #[doc = "Create a " $variant " error with source"]
            pub fn [<$name _with_source>]<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
                message: S,
                source: E,
            ) -> Self {
                Self::$variant {
                    message: message.into(),
                    source: Some(Box::new(source)),
                }
            }
        }
    };
}

impl SieveError {
    error_constructor!(document_open, DocumentOpen);
    error_constructor!(export, Export);
    error_constructor!(validation, Validation);
    error_constructor!(serialization, Serialization);

    /// True for the only error kind that aborts a run before any stream exists.
    pub fn is_document_open(&self) -> bool {
        matches!(self, SieveError::DocumentOpen { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SieveError = io_err.into();
        assert!(matches!(err, SieveError::Io(_)));
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_document_open_error() {
        let err = SieveError::document_open("not a PDF");
        assert_eq!(err.to_string(), "Document open error: not a PDF");
        assert!(err.is_document_open());
    }

    #[test]
    fn test_export_error_with_source() {
        let source = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err = SieveError::export_with_source("cannot write metadata.txt", source);
        assert_eq!(err.to_string(), "Export error: cannot write metadata.txt");
        assert!(std::error::Error::source(&err).is_some());
        assert!(!err.is_document_open());
    }

    #[test]
    fn test_pdf_error_converts_to_document_open() {
        let err: SieveError = crate::pdf::error::PdfError::InvalidPdf("bad xref".to_string()).into();
        assert!(err.is_document_open());
        assert!(err.to_string().contains("bad xref"));
    }

    #[test]
    fn test_cancelled_display() {
        assert_eq!(SieveError::Cancelled.to_string(), "Extraction cancelled");
    }
}
