//! OCR strategy: recognize text in rendered pages as they arrive.

use super::{ProviderSet, RunContext};
use crate::core::capabilities::Capabilities;
use crate::diagnostics::{Diagnostics, Stream};
use crate::error::{Result, SieveError};
use crate::providers::OcrEngine;
use crate::types::{OcrText, RenderedImage};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinSet;

/// OCR engines for one run, or why there are none.
#[derive(Clone)]
pub enum OcrPlan {
    Disabled(String),
    /// Tried in order for every image.
    Engines(Vec<Arc<dyn OcrEngine>>),
}

impl OcrPlan {
    /// Dedicated engine first, embedded library second.
    pub fn new(providers: &ProviderSet, capabilities: &Capabilities, enabled: bool) -> Self {
        if !enabled {
            return OcrPlan::Disabled("OCR disabled by configuration".to_string());
        }

        let mut engines = Vec::new();
        if capabilities.ocr_engine
            && let Some(engine) = &providers.ocr_engine
        {
            engines.push(Arc::clone(engine));
        }
        if capabilities.embedded_ocr
            && let Some(engine) = &providers.embedded_ocr
        {
            engines.push(Arc::clone(engine));
        }

        if engines.is_empty() {
            OcrPlan::Disabled("no OCR engine available; OCR skipped".to_string())
        } else {
            OcrPlan::Engines(engines)
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, OcrPlan::Engines(_))
    }
}

/// Consume rendered pages from `images` until the sender side closes.
///
/// Recognition for a page starts as soon as its image is received. Pages
/// where every engine fails are left out with a warning.
#[tracing::instrument(skip_all)]
pub async fn run_ocr(
    plan: OcrPlan,
    mut images: UnboundedReceiver<RenderedImage>,
    ctx: &RunContext,
) -> Result<Vec<OcrText>> {
    let engines: Arc<[Arc<dyn OcrEngine>]> = match plan {
        OcrPlan::Disabled(reason) => {
            ctx.check_cancelled()?;
            ctx.diagnostics.info(Stream::Ocr, None, reason);
            return Ok(Vec::new());
        }
        OcrPlan::Engines(engines) => engines.into(),
    };
    let names: Vec<&str> = engines.iter().map(|e| e.name()).collect();
    tracing::info!(engines = ?names, language = %ctx.ocr_language, "OCR strategy selected");

    let semaphore = Arc::new(Semaphore::new(ctx.max_concurrent_pages));
    let mut tasks = JoinSet::new();
    let mut results = Vec::new();
    let mut receiving = true;

    loop {
        if !receiving && tasks.is_empty() {
            break;
        }

        tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => {
                tasks.abort_all();
                return Err(SieveError::Cancelled);
            }
            received = images.recv(), if receiving => match received {
                Some(image) => {
                    let engines = Arc::clone(&engines);
                    let semaphore = Arc::clone(&semaphore);
                    let language = ctx.ocr_language.clone();
                    let diagnostics = ctx.diagnostics.clone();
                    tasks.spawn(async move {
                        let _permit = semaphore.acquire_owned().await.ok();
                        recognize_page(&engines, &image, &language, &diagnostics).await
                    });
                }
                None => receiving = false,
            },
            joined = tasks.join_next(), if !tasks.is_empty() => match joined {
                Some(Ok(Some(text))) => results.push(text),
                Some(Ok(None)) | None => {}
                Some(Err(err)) => {
                    ctx.diagnostics.warn(Stream::Ocr, None, format!("OCR task aborted unexpectedly: {}", err));
                }
            },
        }
    }

    Ok(results)
}

async fn recognize_page(
    engines: &[Arc<dyn OcrEngine>],
    image: &RenderedImage,
    language: &str,
    diagnostics: &Diagnostics,
) -> Option<OcrText> {
    let mut failures = Vec::new();

    for engine in engines {
        match engine.recognize(&image.image, language).await {
            Ok(content) => {
                tracing::debug!(engine = engine.name(), page = image.page.get(), chars = content.len(), "OCR done");
                return Some(OcrText {
                    page: image.page,
                    content,
                    engine: engine.name().to_string(),
                });
            }
            Err(err) => {
                tracing::debug!(engine = engine.name(), page = image.page.get(), error = %err, "OCR engine failed");
                failures.push(format!("{}: {}", engine.name(), err));
            }
        }
    }

    diagnostics.warn(
        Stream::Ocr,
        Some(image.page),
        format!("all OCR engines failed ({})", failures.join("; ")),
    );
    None
}
