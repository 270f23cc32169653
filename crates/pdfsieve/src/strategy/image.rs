//! Image strategy: one batch render when the high-fidelity rasterizer is
//! present, otherwise (or when the batch fails) a pixmap render per page.

use super::{ProviderSet, RunContext, run_pages};
use crate::core::capabilities::Capabilities;
use crate::diagnostics::Stream;
use crate::document::{Document, PageNumber};
use crate::error::{Result, SieveError};
use crate::providers::{BatchRasterizer, PageRasterizer};
use crate::types::{RenderOrigin, RenderedImage};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// Rasterizers chosen for one run.
#[derive(Clone, Default)]
pub struct ImagePlan {
    pub batch: Option<Arc<dyn BatchRasterizer>>,
    pub per_page: Option<Arc<dyn PageRasterizer>>,
}

impl ImagePlan {
    pub fn new(providers: &ProviderSet, capabilities: &Capabilities) -> Self {
        Self {
            batch: providers
                .batch_rasterizer
                .clone()
                .filter(|_| capabilities.high_fidelity_raster),
            per_page: providers.page_rasterizer.clone().filter(|_| capabilities.pixmap_render),
        }
    }
}

/// Render every page at `ctx.dpi`.
///
/// Each image is also sent to `ocr_feed` as soon as it exists. The sender is
/// dropped on return, which tells the consumer no more images are coming.
#[tracing::instrument(skip_all, fields(pages = document.page_count(), dpi = ctx.dpi))]
pub async fn extract_images(
    document: &Document,
    plan: &ImagePlan,
    ctx: &RunContext,
    ocr_feed: UnboundedSender<RenderedImage>,
) -> Result<Vec<RenderedImage>> {
    if let Some(batch) = &plan.batch {
        tracing::info!(provider = batch.name(), "Image strategy selected: batch render");
        if let Some(images) = render_batch(document, batch.as_ref(), ctx).await? {
            for image in &images {
                let _ = ocr_feed.send(image.clone());
            }
            return Ok(images);
        }
    }

    let Some(renderer) = plan.per_page.clone() else {
        ctx.check_cancelled()?;
        ctx.diagnostics
            .info(Stream::Images, None, "no page renderer available; no images extracted");
        return Ok(Vec::new());
    };
    tracing::info!(provider = renderer.name(), "Image strategy selected: per-page render");

    let dpi = ctx.dpi;
    let outcomes = run_pages(document.pages(), ctx.max_concurrent_pages, &ctx.cancel, |page| {
        let renderer = Arc::clone(&renderer);
        let document = document.clone();
        let diagnostics = ctx.diagnostics.clone();
        let feed = ocr_feed.clone();
        async move {
            match renderer.rasterize_page(&document, page, dpi).await {
                Ok(image) => {
                    let rendered = RenderedImage::new(page, image, dpi, RenderOrigin::Pixmap);
                    let _ = feed.send(rendered.clone());
                    Some(rendered)
                }
                Err(err) => {
                    diagnostics.warn(
                        Stream::Images,
                        Some(page),
                        format!("page render failed ({}): {}", renderer.name(), err),
                    );
                    None
                }
            }
        }
    })
    .await?;

    for page in outcomes.lost {
        ctx.diagnostics
            .warn(Stream::Images, Some(page), "page render task aborted unexpectedly");
    }

    Ok(outcomes.done.into_iter().filter_map(|(_, image)| image).collect())
}

/// `Ok(None)` means the batch path is unusable for this document and the
/// caller should render page by page.
async fn render_batch(
    document: &Document,
    batch: &dyn BatchRasterizer,
    ctx: &RunContext,
) -> Result<Option<Vec<RenderedImage>>> {
    let rendered = tokio::select! {
        biased;
        _ = ctx.cancel.cancelled() => return Err(SieveError::Cancelled),
        rendered = batch.rasterize_all(document, ctx.dpi) => rendered,
    };

    match rendered {
        Ok(images) if images.len() == document.page_count() as usize => Ok(Some(
            images
                .into_iter()
                .enumerate()
                .map(|(index, image)| {
                    RenderedImage::new(PageNumber::from_index(index), image, ctx.dpi, RenderOrigin::HighFidelity)
                })
                .collect(),
        )),
        Ok(images) => {
            ctx.diagnostics.warn(
                Stream::Images,
                None,
                format!(
                    "{} returned {} images for {} pages; falling back to per-page rendering",
                    batch.name(),
                    images.len(),
                    document.page_count()
                ),
            );
            Ok(None)
        }
        Err(err) => {
            ctx.diagnostics.warn(
                Stream::Images,
                None,
                format!("{} failed: {}; falling back to per-page rendering", batch.name(), err),
            );
            Ok(None)
        }
    }
}
