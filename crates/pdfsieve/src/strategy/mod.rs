//! Per-content-type extraction strategies.
//!
//! A strategy owns an ordered list of providers, picked once per run from the
//! [`ProviderSet`] and the detected [`Capabilities`], and applies it to every
//! page. Provider failures stop at the unit they affect (a page, a table, an
//! image) and are recorded in the run's [`Diagnostics`]; a strategy only
//! returns an error when the run is cancelled.

pub mod image;
pub mod ocr;
pub mod table;
pub mod text;

use crate::core::cancel::CancelToken;
use crate::core::capabilities::Capabilities;
use crate::core::config::ExtractionConfig;
use crate::diagnostics::Diagnostics;
use crate::document::PageNumber;
use crate::error::{Result, SieveError};
use crate::ocr::TesseractCli;
use crate::pdf::{LayoutTextProvider, PdfiumPageRenderer, PdfiumTableDetector, PdftoppmRasterizer, PlainTextProvider};
use crate::providers::{BatchRasterizer, OcrEngine, PageRasterizer, TableProvider, TextProvider};
use std::collections::BTreeSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Every provider a run may use, before capability gating.
///
/// A slot left `None` is treated like an unavailable capability. Tests build
/// this directly with fake providers.
#[derive(Clone, Default)]
pub struct ProviderSet {
    pub layout_text: Option<Arc<dyn TextProvider>>,
    pub plain_text: Option<Arc<dyn TextProvider>>,
    pub tables: Option<Arc<dyn TableProvider>>,
    pub batch_rasterizer: Option<Arc<dyn BatchRasterizer>>,
    pub page_rasterizer: Option<Arc<dyn PageRasterizer>>,
    pub ocr_engine: Option<Arc<dyn OcrEngine>>,
    pub embedded_ocr: Option<Arc<dyn OcrEngine>>,
}

impl ProviderSet {
    /// The real providers, configured from `config`.
    pub fn from_config(config: &ExtractionConfig, capabilities: &Capabilities) -> Self {
        let lib_dir = config.pdfium_lib_dir.clone();

        Self {
            layout_text: Some(Arc::new(LayoutTextProvider::new(lib_dir.clone()))),
            plain_text: Some(Arc::new(PlainTextProvider)),
            tables: Some(Arc::new(PdfiumTableDetector::new(lib_dir.clone()))),
            batch_rasterizer: Some(Arc::new(PdftoppmRasterizer::new(config.pdftoppm_command()))),
            page_rasterizer: Some(Arc::new(PdfiumPageRenderer::new(lib_dir))),
            ocr_engine: Some(Arc::new(TesseractCli::new(
                config.tesseract_command(),
                capabilities.tessdata_dir.clone(),
            ))),
            embedded_ocr: embedded_engine(capabilities),
        }
    }
}

#[cfg(feature = "embedded-ocr")]
fn embedded_engine(capabilities: &Capabilities) -> Option<Arc<dyn OcrEngine>> {
    capabilities
        .tessdata_dir
        .clone()
        .map(|dir| Arc::new(crate::ocr::EmbeddedTesseract::new(dir)) as Arc<dyn OcrEngine>)
}

#[cfg(not(feature = "embedded-ocr"))]
fn embedded_engine(_capabilities: &Capabilities) -> Option<Arc<dyn OcrEngine>> {
    None
}

impl fmt::Debug for ProviderSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSet")
            .field("layout_text", &self.layout_text.as_ref().map(|p| p.name().to_string()))
            .field("plain_text", &self.plain_text.as_ref().map(|p| p.name().to_string()))
            .field("tables", &self.tables.as_ref().map(|p| p.name().to_string()))
            .field("batch_rasterizer", &self.batch_rasterizer.as_ref().map(|p| p.name().to_string()))
            .field("page_rasterizer", &self.page_rasterizer.as_ref().map(|p| p.name().to_string()))
            .field("ocr_engine", &self.ocr_engine.as_ref().map(|p| p.name().to_string()))
            .field("embedded_ocr", &self.embedded_ocr.as_ref().map(|p| p.name().to_string()))
            .finish()
    }
}

/// State shared by every strategy of one run.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub diagnostics: Diagnostics,
    pub cancel: CancelToken,
    pub max_concurrent_pages: usize,
    pub dpi: u32,
    pub ocr_language: String,
}

impl RunContext {
    pub fn new(config: &ExtractionConfig, diagnostics: Diagnostics, cancel: CancelToken) -> Self {
        Self {
            diagnostics,
            cancel,
            max_concurrent_pages: config.max_concurrent_pages.max(1),
            dpi: config.target_dpi,
            ocr_language: config.ocr.language.clone(),
        }
    }

    pub(crate) fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(SieveError::Cancelled);
        }
        Ok(())
    }
}

/// Results of a [`run_pages`] call.
pub(crate) struct PageOutcomes<T> {
    /// Completed pages, in completion order.
    pub done: Vec<(PageNumber, T)>,
    /// Pages whose task panicked.
    pub lost: Vec<PageNumber>,
}

/// Run `work` for every page, at most `limit` at a time.
///
/// Returns once every page finished, or with [`SieveError::Cancelled`] as soon
/// as the token fires; pending tasks are aborted in that case.
pub(crate) async fn run_pages<T, F, Fut>(
    pages: impl IntoIterator<Item = PageNumber>,
    limit: usize,
    cancel: &CancelToken,
    work: F,
) -> Result<PageOutcomes<T>>
where
    T: Send + 'static,
    F: Fn(PageNumber) -> Fut,
    Fut: Future<Output = T> + Send + 'static,
{
    if cancel.is_cancelled() {
        return Err(SieveError::Cancelled);
    }

    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let mut tasks = JoinSet::new();
    let mut pending = BTreeSet::new();

    for page in pages {
        pending.insert(page);
        let semaphore = Arc::clone(&semaphore);
        let job = work(page);
        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            (page, job.await)
        });
    }

    let mut done = Vec::with_capacity(pending.len());
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tasks.abort_all();
                return Err(SieveError::Cancelled);
            }
            joined = tasks.join_next() => match joined {
                Some(Ok((page, value))) => {
                    pending.remove(&page);
                    done.push((page, value));
                }
                Some(Err(err)) => {
                    tracing::error!(error = %err, "Page task failed");
                }
                None => break,
            },
        }
    }

    Ok(PageOutcomes {
        done,
        lost: pending.into_iter().collect(),
    })
}
