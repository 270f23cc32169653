//! Secondary OCR engine: libtesseract linked in-process.
//!
//! Needs a tessdata directory with the language data, since there is no
//! executable to locate it on its own.

use super::error::OcrError;
use crate::providers::{OcrEngine, ProviderResult};
use async_trait::async_trait;
use image::DynamicImage;
use kreuzberg_tesseract::TesseractAPI;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct EmbeddedTesseract {
    tessdata_dir: PathBuf,
}

impl EmbeddedTesseract {
    pub fn new(tessdata_dir: PathBuf) -> Self {
        Self { tessdata_dir }
    }

    /// Version string of the linked library.
    pub fn library_version() -> String {
        TesseractAPI::version()
    }
}

#[async_trait]
impl OcrEngine for EmbeddedTesseract {
    fn name(&self) -> &str {
        "tesseract-embedded"
    }

    async fn recognize(&self, image: &DynamicImage, language: &str) -> ProviderResult<String> {
        let rgb = image.to_rgb8();
        let tessdata = self.tessdata_dir.to_string_lossy().into_owned();
        let language = language.to_string();

        let text = tokio::task::spawn_blocking(move || -> Result<String, OcrError> {
            let (width, height) = rgb.dimensions();
            let bytes_per_pixel = 3;
            let bytes_per_line = width * bytes_per_pixel;

            let api = TesseractAPI::new();
            api.init(&tessdata, &language).map_err(|e| {
                OcrError::TesseractInitializationFailed(format!("Failed to initialize language '{}': {}", language, e))
            })?;

            api.set_image(
                rgb.as_raw(),
                width as i32,
                height as i32,
                bytes_per_pixel as i32,
                bytes_per_line as i32,
            )
            .map_err(|e| OcrError::ProcessingFailed(format!("Failed to set image: {}", e)))?;

            api.recognize()
                .map_err(|e| OcrError::ProcessingFailed(format!("Failed to recognize text: {}", e)))?;

            let text = api
                .get_utf8_text()
                .map_err(|e| OcrError::ProcessingFailed(format!("Failed to extract text: {}", e)))?;
            Ok(text.trim().to_string())
        })
        .await??;

        Ok(text)
    }
}
