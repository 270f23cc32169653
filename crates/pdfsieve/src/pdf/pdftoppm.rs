//! High-fidelity batch rasterization through poppler's `pdftoppm`.

use super::error::PdfError;
use crate::document::Document;
use crate::providers::{BatchRasterizer, ProviderError, ProviderResult};
use async_trait::async_trait;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use tokio::process::Command;

const OUTPUT_PREFIX: &str = "page";

/// Renders every page in one `pdftoppm -png -r <dpi>` call.
///
/// Input and output files live in a temporary directory that is removed when
/// the call returns, including on error and when the future is dropped.
#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    command: PathBuf,
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self::new("pdftoppm")
    }
}

impl PdftoppmRasterizer {
    pub fn new(command: impl Into<PathBuf>) -> Self {
        Self { command: command.into() }
    }

    /// `pdftoppm -v` and return its version line.
    pub async fn probe(&self) -> Result<String, String> {
        let output = Command::new(&self.command)
            .arg("-v")
            .output()
            .await
            .map_err(|e| format!("{} not runnable: {}", self.command.display(), e))?;

        // Older poppler releases print the version on stderr and exit non-zero.
        let combined = format!(
            "{}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        combined
            .lines()
            .find(|line| line.to_ascii_lowercase().contains("pdftoppm version"))
            .map(|line| line.trim().to_string())
            .ok_or_else(|| format!("{} did not report a pdftoppm version", self.command.display()))
    }
}

#[async_trait]
impl BatchRasterizer for PdftoppmRasterizer {
    fn name(&self) -> &str {
        "pdftoppm"
    }

    async fn rasterize_all(&self, document: &Document, dpi: u32) -> ProviderResult<Vec<DynamicImage>> {
        let workdir = tempfile::Builder::new().prefix("pdfsieve-raster-").tempdir()?;
        let input = workdir.path().join("input.pdf");
        tokio::fs::write(&input, document.bytes()).await?;

        let output = Command::new(&self.command)
            .arg("-png")
            .arg("-r")
            .arg(dpi.to_string())
            .arg(&input)
            .arg(workdir.path().join(OUTPUT_PREFIX))
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PdfError::RasterizerFailed(format!(
                "pdftoppm exited with {}: {}",
                output.status,
                stderr.trim()
            ))
            .into());
        }

        let pages = collect_outputs(workdir.path())?;
        tracing::debug!(pages = pages.len(), dpi, "pdftoppm finished");

        let images = tokio::task::spawn_blocking(move || -> ProviderResult<Vec<DynamicImage>> {
            let images = pages
                .iter()
                .map(|(_, path)| {
                    image::open(path).map(|img| DynamicImage::ImageRgb8(img.into_rgb8())).map_err(|e| {
                        ProviderError::Pdf(PdfError::RasterizerFailed(format!(
                            "Cannot decode {}: {}",
                            path.display(),
                            e
                        )))
                    })
                })
                .collect::<ProviderResult<Vec<_>>>();
            // Keep the directory alive until decoding is done.
            drop(workdir);
            images
        })
        .await??;

        Ok(images)
    }
}

/// `<prefix>-<n>.png` files sorted by page number. pdftoppm zero-pads `n`
/// according to the page count, so the number is parsed rather than matched.
fn collect_outputs(dir: &Path) -> std::io::Result<Vec<(u32, PathBuf)>> {
    let mut pages = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if let Some(number) = page_number_from_output(&path) {
            pages.push((number, path));
        }
    }
    pages.sort_by_key(|(number, _)| *number);
    Ok(pages)
}

fn page_number_from_output(path: &Path) -> Option<u32> {
    if path.extension()?.to_str()? != "png" {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let (prefix, number) = stem.rsplit_once('-')?;
    if prefix != OUTPUT_PREFIX {
        return None;
    }
    number.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_page_number_from_output() {
        assert_eq!(page_number_from_output(Path::new("/tmp/x/page-1.png")), Some(1));
        assert_eq!(page_number_from_output(Path::new("/tmp/x/page-012.png")), Some(12));
        assert_eq!(page_number_from_output(Path::new("/tmp/x/input.pdf")), None);
        assert_eq!(page_number_from_output(Path::new("/tmp/x/other-1.png")), None);
    }

    #[test]
    fn test_collect_outputs_sorts_numerically() {
        let dir = tempdir().unwrap();
        for name in ["page-10.png", "page-02.png", "page-01.png", "input.pdf"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }

        let numbers: Vec<u32> = collect_outputs(dir.path()).unwrap().into_iter().map(|(n, _)| n).collect();
        assert_eq!(numbers, vec![1, 2, 10]);
    }

    #[tokio::test]
    async fn test_probe_missing_binary_reports_error() {
        let rasterizer = PdftoppmRasterizer::new("/nonexistent/pdftoppm-binary");
        assert!(rasterizer.probe().await.is_err());
    }
}
