//! OCR engines and language-data discovery.

#[cfg(feature = "embedded-ocr")]
pub mod embedded;
pub mod error;
pub mod tessdata;
pub mod tesseract_cli;

#[cfg(feature = "embedded-ocr")]
pub use embedded::EmbeddedTesseract;
pub use error::OcrError;
pub use tesseract_cli::TesseractCli;
