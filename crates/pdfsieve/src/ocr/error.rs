use std::fmt;

/// OCR engine errors. Never leave a run; the OCR strategy turns them into
/// per-page warnings.
#[derive(Debug, Clone)]
pub enum OcrError {
    EngineUnavailable(String),
    TesseractInitializationFailed(String),
    InvalidLanguageCode(String),
    MissingLanguageData(String),
    ImageProcessingFailed(String),
    ProcessingFailed(String),
    IOError(String),
}

impl fmt::Display for OcrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EngineUnavailable(msg) => write!(f, "OCR engine unavailable: {}", msg),
            Self::TesseractInitializationFailed(msg) => {
                write!(f, "Tesseract initialization failed: {}", msg)
            }
            Self::InvalidLanguageCode(msg) => write!(f, "Invalid language code: {}", msg),
            Self::MissingLanguageData(msg) => write!(f, "Missing language data: {}", msg),
            Self::ImageProcessingFailed(msg) => write!(f, "Image processing failed: {}", msg),
            Self::ProcessingFailed(msg) => write!(f, "OCR processing failed: {}", msg),
            Self::IOError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for OcrError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_variants() {
        assert_eq!(
            OcrError::InvalidLanguageCode("xx!".to_string()).to_string(),
            "Invalid language code: xx!"
        );
        assert_eq!(
            OcrError::ProcessingFailed("exit status 1".to_string()).to_string(),
            "OCR processing failed: exit status 1"
        );
        assert!(
            OcrError::MissingLanguageData("eng.traineddata".to_string())
                .to_string()
                .starts_with("Missing language data")
        );
    }
}
