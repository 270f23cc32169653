//! Baseline per-page pixmap rendering through pdfium.

use super::bindings::pdfium;
use super::error::{PdfError, Result, classify_load_error};
use crate::document::{Document, PageNumber};
use crate::providers::{PageRasterizer, ProviderResult};
use async_trait::async_trait;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::PathBuf;

const PDF_POINTS_PER_INCH: f32 = 72.0;

/// Largest edge, in pixels, a render may have before the DPI is scaled down.
const MAX_IMAGE_DIMENSION: f32 = 16384.0;

#[derive(Debug, Default, Clone)]
pub struct PdfiumPageRenderer {
    lib_dir: Option<PathBuf>,
}

impl PdfiumPageRenderer {
    pub fn new(lib_dir: Option<PathBuf>) -> Self {
        Self { lib_dir }
    }
}

#[async_trait]
impl PageRasterizer for PdfiumPageRenderer {
    fn name(&self) -> &str {
        "pdfium-pixmap"
    }

    async fn rasterize_page(&self, document: &Document, page: PageNumber, dpi: u32) -> ProviderResult<DynamicImage> {
        let document = document.clone();
        let lib_dir = self.lib_dir.clone();

        let image =
            tokio::task::spawn_blocking(move || render_page(lib_dir, document.bytes(), page, dpi)).await??;
        Ok(image)
    }
}

fn render_page(lib_dir: Option<PathBuf>, pdf_bytes: &[u8], page: PageNumber, dpi: u32) -> Result<DynamicImage> {
    let pdfium = pdfium(lib_dir.as_deref(), PdfError::RenderingFailed, "page rendering")?;
    let pdf = pdfium
        .load_pdf_from_byte_slice(pdf_bytes, None)
        .map_err(classify_load_error)?;
    let pdf_page = pdf
        .pages()
        .get(page.index() as u16)
        .map_err(|_| PdfError::PageNotFound(page.get()))?;

    let (width, height) = target_size(pdf_page.width().value, pdf_page.height().value, dpi);

    let config = PdfRenderConfig::new()
        .set_target_width(width)
        .set_target_height(height)
        .rotate_if_landscape(PdfPageRenderRotation::None, false);

    let bitmap = pdf_page
        .render_with_config(&config)
        .map_err(|e| PdfError::RenderingFailed(format!("Failed to render page {}: {}", page, e)))?;

    Ok(DynamicImage::ImageRgb8(bitmap.as_image().into_rgb8()))
}

/// Pixel size for a page at `dpi`, scaled down uniformly if either edge
/// would exceed the maximum dimension.
fn target_size(width_points: f32, height_points: f32, dpi: u32) -> (i32, i32) {
    let scale = dpi as f32 / PDF_POINTS_PER_INCH;
    let mut width = width_points * scale;
    let mut height = height_points * scale;

    let longest = width.max(height);
    if longest > MAX_IMAGE_DIMENSION {
        let shrink = MAX_IMAGE_DIMENSION / longest;
        width *= shrink;
        height *= shrink;
    }

    ((width.round() as i32).max(1), (height.round() as i32).max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_size_letter_at_300_dpi() {
        assert_eq!(target_size(612.0, 792.0, 300), (2550, 3300));
    }

    #[test]
    fn test_target_size_at_72_dpi_matches_points() {
        assert_eq!(target_size(595.0, 842.0, 72), (595, 842));
    }

    #[test]
    fn test_target_size_caps_huge_pages() {
        let (w, h) = target_size(14400.0, 7200.0, 300);
        assert_eq!(w, 16384);
        assert_eq!(h, 8192);
    }

    #[test]
    fn test_target_size_never_zero() {
        assert_eq!(target_size(0.0, 0.0, 300), (1, 1));
    }
}
