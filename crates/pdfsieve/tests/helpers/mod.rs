//! Shared fixtures for integration tests: generated PDFs and fake providers.

#![allow(dead_code)]

use async_trait::async_trait;
use image::DynamicImage;
use lopdf::content::{Content, Operation};
use lopdf::{Object, Stream, dictionary};
use pdfsieve::providers::{
    BatchRasterizer, OcrEngine, PageRasterizer, ProviderError, ProviderResult, RawTable, TableProvider, TextProvider,
};
use pdfsieve::{Document, PageNumber, ProviderSet, TextSource};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Document info entries written by [`build_pdf_with_info`].
#[derive(Debug, Clone, Default)]
pub struct PdfInfo {
    pub title: Option<&'static str>,
    pub author: Option<&'static str>,
    pub creation_date: Option<&'static str>,
}

/// A PDF with one line of Courier text per page.
pub fn build_pdf(pages: &[&str]) -> Vec<u8> {
    build_pdf_with_info(pages, None)
}

pub fn build_pdf_with_info(pages: &[&str], info: Option<PdfInfo>) -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    if let Some(info) = info {
        let mut dict = lopdf::Dictionary::new();
        if let Some(title) = info.title {
            dict.set("Title", Object::string_literal(title));
        }
        if let Some(author) = info.author {
            dict.set("Author", Object::string_literal(author));
        }
        if let Some(date) = info.creation_date {
            dict.set("CreationDate", Object::string_literal(date));
        }
        let info_id = doc.add_object(dict);
        doc.trailer.set("Info", info_id);
    }

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Write a generated PDF into `dir` and return its path.
pub fn write_pdf(dir: &Path, name: &str, pages: &[&str]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, build_pdf(pages)).unwrap();
    path
}

pub fn three_page_document() -> Document {
    Document::from_bytes(build_pdf(&["Intro page", "Inventory table", "Closing notes"])).unwrap()
}

pub fn page(n: u32) -> PageNumber {
    PageNumber::new(n).unwrap()
}

/// Text provider that fails on chosen pages and counts calls per page.
pub struct FakeText {
    name: &'static str,
    source: TextSource,
    fail_pages: HashSet<u32>,
    calls: CallLog,
}

/// Call counts per page.
#[derive(Default)]
pub struct CallLog(Mutex<HashMap<u32, usize>>);

impl CallLog {
    pub fn hit(&self, page: u32) {
        *self.0.lock().unwrap().entry(page).or_default() += 1;
    }

    pub fn get(&self, page: u32) -> usize {
        self.0.lock().unwrap().get(&page).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.0.lock().unwrap().values().sum()
    }
}

impl FakeText {
    pub fn new(name: &'static str, source: TextSource) -> Self {
        Self {
            name,
            source,
            fail_pages: HashSet::new(),
            calls: Default::default(),
        }
    }

    pub fn failing_on(mut self, pages: &[u32]) -> Self {
        self.fail_pages.extend(pages);
        self
    }

    pub fn calls_for(&self, page: u32) -> usize {
        self.calls.get(page)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.total()
    }
}

#[async_trait]
impl TextProvider for FakeText {
    fn name(&self) -> &str {
        self.name
    }

    fn source(&self) -> TextSource {
        self.source
    }

    async fn extract_page(&self, _document: &Document, page: PageNumber) -> ProviderResult<String> {
        self.calls.hit(page.get());
        if self.fail_pages.contains(&page.get()) {
            return Err(ProviderError::Other(format!("{} cannot read page {}", self.name, page)));
        }
        Ok(format!("{} text of page {}", self.name, page))
    }
}

/// Table detector with canned grids per page.
#[derive(Default)]
pub struct FakeTables {
    grids: HashMap<u32, Vec<RawTable>>,
    fail_pages: HashSet<u32>,
}

impl FakeTables {
    pub fn with_table(mut self, page: u32, grid: &[&[&str]]) -> Self {
        let grid = grid
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| (!cell.is_empty()).then(|| cell.to_string()))
                    .collect()
            })
            .collect();
        self.grids.entry(page).or_default().push(grid);
        self
    }

    pub fn failing_on(mut self, pages: &[u32]) -> Self {
        self.fail_pages.extend(pages);
        self
    }
}

#[async_trait]
impl TableProvider for FakeTables {
    fn name(&self) -> &str {
        "fake-tables"
    }

    async fn detect_tables(&self, _document: &Document, page: PageNumber) -> ProviderResult<Vec<RawTable>> {
        if self.fail_pages.contains(&page.get()) {
            return Err(ProviderError::Other("detector crashed".to_string()));
        }
        Ok(self.grids.get(&page.get()).cloned().unwrap_or_default())
    }
}

/// Batch rasterizer producing small blank pages.
pub struct FakeBatch {
    fail: bool,
    /// Pages to drop from the output, to simulate a short render.
    short_by: usize,
    pub calls: AtomicUsize,
}

impl FakeBatch {
    pub fn working() -> Self {
        Self {
            fail: false,
            short_by: 0,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::working()
        }
    }

    pub fn short_by(count: usize) -> Self {
        Self {
            short_by: count,
            ..Self::working()
        }
    }
}

#[async_trait]
impl BatchRasterizer for FakeBatch {
    fn name(&self) -> &str {
        "fake-batch"
    }

    async fn rasterize_all(&self, document: &Document, _dpi: u32) -> ProviderResult<Vec<DynamicImage>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProviderError::Other("rasterizer exited with status 1".to_string()));
        }
        let count = (document.page_count() as usize).saturating_sub(self.short_by);
        Ok((0..count).map(|_| DynamicImage::new_rgb8(8, 8)).collect())
    }
}

/// Per-page renderer producing small blank pages.
#[derive(Default)]
pub struct FakePixmap {
    fail_pages: HashSet<u32>,
    delay: Option<Duration>,
    pub calls: AtomicUsize,
}

impl FakePixmap {
    pub fn failing_on(mut self, pages: &[u32]) -> Self {
        self.fail_pages.extend(pages);
        self
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl PageRasterizer for FakePixmap {
    fn name(&self) -> &str {
        "fake-pixmap"
    }

    async fn rasterize_page(&self, _document: &Document, page: PageNumber, _dpi: u32) -> ProviderResult<DynamicImage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_pages.contains(&page.get()) {
            return Err(ProviderError::Other(format!("cannot render page {}", page)));
        }
        Ok(DynamicImage::new_rgb8(4, 4))
    }
}

/// OCR engine returning a fixed string, optionally always failing.
pub struct FakeOcr {
    name: &'static str,
    fail: bool,
    pub calls: AtomicUsize,
}

impl FakeOcr {
    pub fn working(name: &'static str) -> Self {
        Self {
            name,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(name: &'static str) -> Self {
        Self {
            fail: true,
            ..Self::working(name)
        }
    }
}

#[async_trait]
impl OcrEngine for FakeOcr {
    fn name(&self) -> &str {
        self.name
    }

    async fn recognize(&self, image: &DynamicImage, language: &str) -> ProviderResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProviderError::Other(format!("{} crashed", self.name)));
        }
        Ok(format!("{}x{} {}", image.width(), image.height(), language))
    }
}

/// Handles to the fakes inside a [`ProviderSet`], for call assertions.
pub struct Fakes {
    pub layout: Arc<FakeText>,
    pub plain: Arc<FakeText>,
    pub tables: Arc<FakeTables>,
    pub batch: Arc<FakeBatch>,
    pub pixmap: Arc<FakePixmap>,
    pub ocr: Arc<FakeOcr>,
    pub embedded: Arc<FakeOcr>,
}

impl Default for Fakes {
    fn default() -> Self {
        Self {
            layout: Arc::new(FakeText::new("fake-layout", TextSource::Layout)),
            plain: Arc::new(FakeText::new("fake-plain", TextSource::Plain)),
            tables: Arc::new(FakeTables::default().with_table(2, &[&["Item", "Qty"], &["Bolt", "4"], &["Nut", ""]])),
            batch: Arc::new(FakeBatch::working()),
            pixmap: Arc::new(FakePixmap::default()),
            ocr: Arc::new(FakeOcr::working("fake-ocr")),
            embedded: Arc::new(FakeOcr::working("fake-embedded")),
        }
    }
}

impl Fakes {
    pub fn providers(&self) -> ProviderSet {
        ProviderSet {
            layout_text: Some(self.layout.clone()),
            plain_text: Some(self.plain.clone()),
            tables: Some(self.tables.clone()),
            batch_rasterizer: Some(self.batch.clone()),
            page_rasterizer: Some(self.pixmap.clone()),
            ocr_engine: Some(self.ocr.clone()),
            embedded_ocr: Some(self.embedded.clone()),
        }
    }
}

/// Route library logs to the test output; `RUST_LOG` selects the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Whether an external executable answers `arg`.
pub fn command_available(command: &str, arg: &str) -> bool {
    std::process::Command::new(command)
        .arg(arg)
        .output()
        .map(|output| output.status.success() || !output.stderr.is_empty())
        .unwrap_or(false)
}
