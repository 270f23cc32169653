use std::fmt;

#[derive(Debug, Clone)]
pub enum PdfError {
    InvalidPdf(String),
    PasswordRequired,
    PageNotFound(u32),
    TextExtractionFailed(String),
    TableDetectionFailed(String),
    RenderingFailed(String),
    RasterizerFailed(String),
    BindingFailed(String),
    IOError(String),
}

impl fmt::Display for PdfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PdfError::InvalidPdf(msg) => write!(f, "Invalid PDF: {}", msg),
            PdfError::PasswordRequired => write!(f, "PDF is password-protected"),
            PdfError::PageNotFound(page) => write!(f, "Page {} not found", page),
            PdfError::TextExtractionFailed(msg) => write!(f, "Text extraction failed: {}", msg),
            PdfError::TableDetectionFailed(msg) => write!(f, "Table detection failed: {}", msg),
            PdfError::RenderingFailed(msg) => write!(f, "Page rendering failed: {}", msg),
            PdfError::RasterizerFailed(msg) => write!(f, "Batch rasterization failed: {}", msg),
            PdfError::BindingFailed(msg) => write!(f, "Pdfium unavailable: {}", msg),
            PdfError::IOError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for PdfError {}

impl From<lopdf::Error> for PdfError {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(io_err) => PdfError::IOError(io_err.to_string()),
            _ => PdfError::InvalidPdf(err.to_string()),
        }
    }
}

/// Classify a pdfium load error, which only carries a message.
pub(crate) fn classify_load_error(err: impl fmt::Display) -> PdfError {
    let err_msg = err.to_string();
    if err_msg.contains("password") || err_msg.contains("Password") {
        PdfError::PasswordRequired
    } else {
        PdfError::InvalidPdf(err_msg)
    }
}

pub type Result<T> = std::result::Result<T, PdfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_pdf_error() {
        let err = PdfError::InvalidPdf("corrupted header".to_string());
        assert_eq!(err.to_string(), "Invalid PDF: corrupted header");
    }

    #[test]
    fn test_page_not_found_error() {
        assert_eq!(PdfError::PageNotFound(7).to_string(), "Page 7 not found");
    }

    #[test]
    fn test_table_detection_error() {
        let err = PdfError::TableDetectionFailed("no chars".to_string());
        assert_eq!(err.to_string(), "Table detection failed: no chars");
    }

    #[test]
    fn test_classify_load_error() {
        assert!(matches!(
            classify_load_error("PdfiumLibraryInternalError(PasswordError)"),
            PdfError::PasswordRequired
        ));
        assert!(matches!(classify_load_error("FormatError"), PdfError::InvalidPdf(_)));
    }

    #[test]
    fn test_from_lopdf_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: PdfError = lopdf::Error::IO(io).into();
        assert!(matches!(err, PdfError::IOError(_)));
    }
}
