//! Dedicated OCR engine: the `tesseract` executable.

use super::error::OcrError;
use crate::providers::{OcrEngine, ProviderResult};
use async_trait::async_trait;
use image::DynamicImage;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::PathBuf;
use tokio::process::Command;

/// `--oem 3` (LSTM) needs Tesseract 4 or newer.
const MINIMAL_SUPPORTED_TESSERACT_VERSION: u32 = 4;

static VERSION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)tesseract\s+v?(\d+)\.(\d+)").expect("version pattern is valid"));

#[derive(Debug, Clone)]
pub struct TesseractCli {
    command: PathBuf,
    tessdata_dir: Option<PathBuf>,
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self::new("tesseract", None)
    }
}

impl TesseractCli {
    pub fn new(command: impl Into<PathBuf>, tessdata_dir: Option<PathBuf>) -> Self {
        Self {
            command: command.into(),
            tessdata_dir,
        }
    }

    /// Run `tesseract --version` and return the reported version.
    pub async fn probe(&self) -> Result<(u32, u32), OcrError> {
        let output = Command::new(&self.command)
            .arg("--version")
            .output()
            .await
            .map_err(|e| OcrError::EngineUnavailable(format!("{} not runnable: {}", self.command.display(), e)))?;

        // Tesseract 3 printed its version on stderr.
        let combined = format!(
            "{}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );

        let version = parse_version(&combined).ok_or_else(|| {
            OcrError::EngineUnavailable(format!("Could not parse Tesseract version from: {}", combined.trim()))
        })?;

        if version.0 < MINIMAL_SUPPORTED_TESSERACT_VERSION {
            return Err(OcrError::EngineUnavailable(format!(
                "Tesseract {} or newer is required, found {}.{}",
                MINIMAL_SUPPORTED_TESSERACT_VERSION, version.0, version.1
            )));
        }

        Ok(version)
    }
}

fn parse_version(output: &str) -> Option<(u32, u32)> {
    let caps = VERSION_PATTERN.captures(output)?;
    let major = caps.get(1)?.as_str().parse().ok()?;
    let minor = caps.get(2)?.as_str().parse().ok()?;
    Some((major, minor))
}

#[async_trait]
impl OcrEngine for TesseractCli {
    fn name(&self) -> &str {
        "tesseract"
    }

    async fn recognize(&self, image: &DynamicImage, language: &str) -> ProviderResult<String> {
        let workdir = tempfile::Builder::new().prefix("pdfsieve-ocr-").tempdir()?;
        let input = workdir.path().join("page.png");

        let rgb = image.to_rgb8();
        let input_for_encode = input.clone();
        tokio::task::spawn_blocking(move || rgb.save(&input_for_encode))
            .await?
            .map_err(|e| OcrError::ImageProcessingFailed(format!("Cannot write OCR input: {}", e)))?;

        let mut command = Command::new(&self.command);
        command.arg(&input).arg("stdout").arg("-l").arg(language);
        if let Some(dir) = &self.tessdata_dir {
            command.arg("--tessdata-dir").arg(dir);
        }
        command.arg("--oem").arg("3").arg("--psm").arg("3").kill_on_drop(true);

        let output = command
            .output()
            .await
            .map_err(|e| OcrError::ProcessingFailed(format!("Failed to run tesseract: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::ProcessingFailed(format!("Tesseract failed: {}", stderr.trim())).into());
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
