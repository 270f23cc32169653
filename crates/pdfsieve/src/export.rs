//! Writing results to disk: a directory tree and a ZIP archive with the same
//! layout.
//!
//! ```text
//! metadata.txt
//! extracted_text.txt
//! tables/page_{p}_table_{t}.csv
//! images/page_{p}.png
//! ocr_text.txt
//! ```
//!
//! `metadata.txt` is always written. Every other file exists only when its
//! stream has entries.

use crate::error::{Result, SieveError};
use crate::types::{ExtractionResult, RenderedImage, Table};
use std::borrow::Cow;
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Cursor, Seek, Write};
use std::path::{Path, PathBuf};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

pub const METADATA_FILE: &str = "metadata.txt";
pub const TEXT_FILE: &str = "extracted_text.txt";
pub const OCR_FILE: &str = "ocr_text.txt";
pub const TABLES_DIR: &str = "tables";
pub const IMAGES_DIR: &str = "images";

/// One file of the export, path relative to the export root.
///
/// Text files are rendered up front. Images are encoded only when the entry
/// is written, so at most one encoded image is held at a time.
#[derive(Debug, Clone)]
pub struct ExportEntry<'a> {
    /// Always `/`-separated.
    pub path: String,
    body: EntryBody<'a>,
}

#[derive(Debug, Clone)]
enum EntryBody<'a> {
    Text(String),
    Image(&'a RenderedImage),
}

impl ExportEntry<'_> {
    /// File contents. Fails only when an image cannot be encoded.
    pub fn contents(&self) -> std::result::Result<Cow<'_, [u8]>, image::ImageError> {
        match &self.body {
            EntryBody::Text(text) => Ok(Cow::Borrowed(text.as_bytes())),
            EntryBody::Image(image) => encode_image(image).map(Cow::Owned),
        }
    }

    /// Contents, or `None` with a warning for an image that cannot be encoded.
    fn contents_or_skip(&self) -> Option<Cow<'_, [u8]>> {
        match self.contents() {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!(path = %self.path, error = %e, "Skipping image that could not be encoded");
                None
            }
        }
    }
}

/// What [`export_to_dir`] wrote.
#[derive(Debug, Clone, Default)]
pub struct ExportSummary {
    pub root: PathBuf,
    /// Written files, in write order.
    pub files: Vec<PathBuf>,
}

/// Every file of the export in a fixed order.
pub fn export_entries(result: &ExtractionResult) -> Vec<ExportEntry<'_>> {
    let mut entries = vec![ExportEntry {
        path: METADATA_FILE.to_string(),
        body: EntryBody::Text(render_metadata(result)),
    }];

    if !result.text.is_empty() {
        let pages = result.text.iter().map(|block| (block.page.get(), block.content.as_str()));
        entries.push(ExportEntry {
            path: TEXT_FILE.to_string(),
            body: EntryBody::Text(render_paged_text(pages)),
        });
    }

    for table in &result.tables {
        entries.push(ExportEntry {
            path: format!("{}/page_{}_table_{}.csv", TABLES_DIR, table.page, table.table_number),
            body: EntryBody::Text(render_csv(table)),
        });
    }

    for image in &result.images {
        entries.push(ExportEntry {
            path: format!("{}/page_{}.{}", IMAGES_DIR, image.page, image.format.extension()),
            body: EntryBody::Image(image),
        });
    }

    if !result.ocr_text.is_empty() {
        let pages = result.ocr_text.iter().map(|ocr| (ocr.page.get(), ocr.content.as_str()));
        entries.push(ExportEntry {
            path: OCR_FILE.to_string(),
            body: EntryBody::Text(render_paged_text(pages)),
        });
    }

    entries
}

/// Write the export tree under `dir`, creating it when missing.
///
/// An image that cannot be encoded is skipped with a warning.
///
/// # Errors
///
/// `SieveError::Export` when a directory or file cannot be written.
#[tracing::instrument(skip_all, fields(dir = %dir.as_ref().display()))]
pub fn export_to_dir(result: &ExtractionResult, dir: impl AsRef<Path>) -> Result<ExportSummary> {
    let root = dir.as_ref().to_path_buf();
    create_dir(&root)?;

    let mut files = Vec::new();
    for entry in export_entries(result) {
        let Some(contents) = entry.contents_or_skip() else {
            continue;
        };

        let target = root.join(&entry.path);
        if let Some(parent) = target.parent()
            && parent != root.as_path()
        {
            create_dir(parent)?;
        }
        std::fs::write(&target, &contents)
            .map_err(|e| SieveError::export_with_source(format!("Cannot write {}", target.display()), e))?;
        files.push(target);
    }

    tracing::info!(files = files.len(), "Export written");
    Ok(ExportSummary { root, files })
}

/// The export tree as ZIP archive bytes.
pub fn archive_bytes(result: &ExtractionResult) -> Result<Vec<u8>> {
    let cursor = write_archive(result, Cursor::new(Vec::new()))?;
    Ok(cursor.into_inner())
}

/// Write the export tree as a single ZIP archive at `zip_path`.
///
/// Entries are streamed into the file one at a time.
#[tracing::instrument(skip_all, fields(path = %zip_path.as_ref().display()))]
pub fn export_archive(result: &ExtractionResult, zip_path: impl AsRef<Path>) -> Result<PathBuf> {
    let zip_path = zip_path.as_ref();
    let cannot_write = |e: std::io::Error| SieveError::export_with_source(format!("Cannot write {}", zip_path.display()), e);

    if let Some(parent) = zip_path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir(parent)?;
    }

    let file = File::create(zip_path).map_err(cannot_write)?;
    let mut writer = write_archive(result, BufWriter::new(file))?;
    writer.flush().map_err(cannot_write)?;

    tracing::info!("Archive written");
    Ok(zip_path.to_path_buf())
}

fn write_archive<W: Write + Seek>(result: &ExtractionResult, writer: W) -> Result<W> {
    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default();

    for entry in export_entries(result) {
        let Some(contents) = entry.contents_or_skip() else {
            continue;
        };
        zip.start_file(entry.path.as_str(), options)?;
        zip.write_all(&contents)
            .map_err(|e| SieveError::export_with_source(format!("Cannot add {} to archive", entry.path), e))?;
    }

    Ok(zip.finish()?)
}

/// Download name for the archive of `input`: `{stem}_results.zip`.
pub fn archive_file_name(input: impl AsRef<Path>) -> String {
    let stem = input
        .as_ref()
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "document".to_string());
    format!("{}_results.zip", stem)
}

fn create_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .map_err(|e| SieveError::export_with_source(format!("Cannot create directory {}", dir.display()), e))
}

fn render_metadata(result: &ExtractionResult) -> String {
    let mut out = String::new();
    for (key, value) in result.metadata.entries() {
        let _ = writeln!(out, "{}: {}", key, value);
    }
    out
}

fn render_paged_text<'a>(pages: impl Iterator<Item = (u32, &'a str)>) -> String {
    let mut out = String::new();
    for (page, content) in pages {
        let _ = write!(out, "=== Page {} ===\n{}\n\n", page, content);
    }
    out
}

fn render_csv(table: &Table) -> String {
    let mut out = String::new();
    for row in std::iter::once(&table.header).chain(table.rows.iter()) {
        let line: Vec<String> = row.iter().map(|cell| csv_field(cell)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}

/// RFC 4180 quoting: fields with a comma, quote or line break are quoted and
/// inner quotes doubled.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn encode_image(image: &RenderedImage) -> image::ImageResult<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image.image.write_to(&mut buffer, image.format.as_image_format())?;
    Ok(buffer.into_inner())
}
