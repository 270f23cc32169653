//! Extraction entry points.
//!
//! Every entry point ends in [`extract_document`], which runs the text, table
//! and image strategies concurrently, feeds rendered pages into OCR as they
//! finish, and assembles the streams into one [`ExtractionResult`].
//!
//! # Functions
//!
//! - [`extract_file`] - extract from a path with detected capabilities
//! - [`extract_bytes`] - extract from an uploaded file held in memory
//! - [`extract_file_with`] - extract with explicit providers and cancellation

use crate::core::cancel::CancelToken;
use crate::core::capabilities::Capabilities;
use crate::core::config::ExtractionConfig;
use crate::diagnostics::{Diagnostics, Stream};
use crate::document::Document;
use crate::error::{Result, SieveError};
use crate::pdf::extract_metadata;
use crate::strategy::image::{ImagePlan, extract_images};
use crate::strategy::ocr::{OcrPlan, run_ocr};
use crate::strategy::table::{extract_tables, table_detector};
use crate::strategy::text::{extract_text, text_chain};
use crate::strategy::{ProviderSet, RunContext};
use crate::types::{ExtractedStreams, ExtractionResult};
use once_cell::sync::Lazy;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

const DEFAULT_UPLOAD_NAME: &str = "upload.pdf";

/// Global Tokio runtime for the synchronous wrappers.
///
/// Created on first use and shared by every sync call. Creation only fails
/// when the process is out of threads or memory.
static GLOBAL_RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to create global Tokio runtime - system may be out of resources")
});

/// Extract everything from the PDF at `path`.
///
/// Capabilities are detected on the first call of the process and reused
/// afterwards.
///
/// # Errors
///
/// Returns `SieveError::Validation` for an invalid config and
/// `SieveError::DocumentOpen` when the file cannot be read or parsed. Provider
/// failures never surface here; they are listed in
/// [`ExtractionResult::diagnostics`].
///
/// # Example
///
/// ```rust,no_run
/// use pdfsieve::{ExtractionConfig, extract_file};
///
/// # async fn example() -> pdfsieve::Result<()> {
/// let result = extract_file("report.pdf", &ExtractionConfig::default()).await?;
/// for block in &result.text {
///     println!("page {}: {} chars", block.page, block.content.len());
/// }
/// # Ok(())
/// # }
/// ```
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub async fn extract_file(path: impl AsRef<Path>, config: &ExtractionConfig) -> Result<ExtractionResult> {
    config.validate()?;
    let capabilities = Capabilities::detected(config).await;
    let providers = ProviderSet::from_config(config, capabilities);
    extract_file_with(path, config, capabilities, &providers, &CancelToken::new()).await
}

/// Extract from an upload: `bytes` is written as `file_name` into a scoped
/// temporary directory that is removed on every exit path.
#[tracing::instrument(skip_all, fields(file_name = %file_name, size = bytes.len()))]
pub async fn extract_bytes(bytes: &[u8], file_name: &str, config: &ExtractionConfig) -> Result<ExtractionResult> {
    config.validate()?;

    let upload_dir = tempfile::Builder::new().prefix("pdfsieve-upload-").tempdir()?;
    let upload_path = upload_dir.path().join(upload_name(file_name));
    tokio::fs::write(&upload_path, bytes).await?;

    extract_file(&upload_path, config).await
}

/// Extract with explicit capabilities, providers and cancellation.
pub async fn extract_file_with(
    path: impl AsRef<Path>,
    config: &ExtractionConfig,
    capabilities: &Capabilities,
    providers: &ProviderSet,
    cancel: &CancelToken,
) -> Result<ExtractionResult> {
    config.validate()?;

    let path: PathBuf = path.as_ref().to_path_buf();
    let document = tokio::task::spawn_blocking(move || Document::open(&path))
        .await
        .map_err(|e| SieveError::Other(format!("Document loader panicked: {}", e)))??;

    extract_document(&document, config, capabilities, providers, cancel).await
}

/// Run every strategy over an opened document.
///
/// Returns `SieveError::Cancelled` when `cancel` fires before the run
/// completes; no partial result is returned in that case.
#[tracing::instrument(skip_all, fields(pages = document.page_count()))]
pub async fn extract_document(
    document: &Document,
    config: &ExtractionConfig,
    capabilities: &Capabilities,
    providers: &ProviderSet,
    cancel: &CancelToken,
) -> Result<ExtractionResult> {
    config.validate()?;
    if cancel.is_cancelled() {
        return Err(SieveError::Cancelled);
    }

    let diagnostics = Diagnostics::new();
    for (capability, reason) in capabilities.unavailable() {
        diagnostics.info(
            Stream::Capabilities,
            None,
            format!("{} unavailable: {}", capability.label(), reason),
        );
    }

    let metadata = extract_metadata(document);
    let ctx = RunContext::new(config, diagnostics.clone(), cancel.clone());

    let chain = text_chain(providers, capabilities);
    let detector = table_detector(providers, capabilities);
    let image_plan = ImagePlan::new(providers, capabilities);
    let ocr_plan = OcrPlan::new(providers, capabilities, config.ocr.enabled);

    let (ocr_feed, ocr_queue) = mpsc::unbounded_channel();

    let (text, tables, (images, ocr_text)) = tokio::try_join!(
        extract_text(document, &chain, &ctx),
        extract_tables(document, detector, &ctx),
        async {
            tokio::try_join!(
                extract_images(document, &image_plan, &ctx, ocr_feed),
                run_ocr(ocr_plan, ocr_queue, &ctx),
            )
        },
    )?;

    tracing::info!(
        text_blocks = text.len(),
        tables = tables.len(),
        images = images.len(),
        ocr_pages = ocr_text.len(),
        warnings = diagnostics.len(),
        "Extraction finished"
    );

    Ok(ExtractionResult::assemble(
        metadata,
        ExtractedStreams {
            text,
            tables,
            images,
            ocr_text,
        },
        capabilities.clone(),
        diagnostics.snapshot(),
    ))
}

/// Synchronous wrapper for [`extract_file`].
///
/// Blocks the current thread on the global runtime; do not call from inside
/// an async context.
pub fn extract_file_sync(path: impl AsRef<Path>, config: &ExtractionConfig) -> Result<ExtractionResult> {
    GLOBAL_RUNTIME.block_on(extract_file(path, config))
}

/// Synchronous wrapper for [`extract_bytes`].
pub fn extract_bytes_sync(bytes: &[u8], file_name: &str, config: &ExtractionConfig) -> Result<ExtractionResult> {
    GLOBAL_RUNTIME.block_on(extract_bytes(bytes, file_name, config))
}

/// Base name of an uploaded file, without any directory part.
fn upload_name(file_name: &str) -> PathBuf {
    Path::new(file_name)
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_NAME))
}
