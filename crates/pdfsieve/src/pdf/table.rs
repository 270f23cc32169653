//! Table detection from pdfium character positions.
//!
//! Words are grouped into lines, lines into cells by horizontal gaps, and
//! runs of consecutive multi-cell lines into table regions. Column anchors are
//! the left edges that recur across the rows of a region.

use super::bindings::pdfium;
use super::error::{PdfError, classify_load_error};
use super::layout::{Line, Word, group_words_into_lines, page_words};
use crate::document::{Document, PageNumber};
use crate::providers::{ProviderResult, RawTable, TableProvider};
use async_trait::async_trait;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct TableDetectorConfig {
    /// Gap (points) between words that separates two cells on one line.
    pub min_cell_gap: f32,
    /// Left edges closer than this (points) belong to the same column.
    pub column_tolerance: f32,
    /// Vertical gap, relative to line height, that ends a table region.
    pub max_row_gap_ratio: f32,
    pub min_rows: usize,
    pub min_columns: usize,
    /// Share of region rows an edge must appear in to become a column.
    pub min_alignment_ratio: f32,
}

impl Default for TableDetectorConfig {
    fn default() -> Self {
        Self {
            min_cell_gap: 12.0,
            column_tolerance: 8.0,
            max_row_gap_ratio: 2.5,
            min_rows: 2,
            min_columns: 2,
            min_alignment_ratio: 0.5,
        }
    }
}

/// Table provider backed by pdfium text geometry.
#[derive(Debug, Default, Clone)]
pub struct PdfiumTableDetector {
    lib_dir: Option<PathBuf>,
    config: TableDetectorConfig,
}

impl PdfiumTableDetector {
    pub fn new(lib_dir: Option<PathBuf>) -> Self {
        Self {
            lib_dir,
            config: TableDetectorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: TableDetectorConfig) -> Self {
        self.config = config;
        self
    }
}

#[async_trait]
impl TableProvider for PdfiumTableDetector {
    fn name(&self) -> &str {
        "pdfium-grid"
    }

    async fn detect_tables(&self, document: &Document, page: PageNumber) -> ProviderResult<Vec<RawTable>> {
        let document = document.clone();
        let lib_dir = self.lib_dir.clone();
        let config = self.config.clone();

        let tables = tokio::task::spawn_blocking(move || -> Result<Vec<RawTable>, PdfError> {
            let pdfium = pdfium(lib_dir.as_deref(), PdfError::TableDetectionFailed, "table detection")?;
            let pdf = pdfium
                .load_pdf_from_byte_slice(document.bytes(), None)
                .map_err(classify_load_error)?;
            let pdf_page = pdf
                .pages()
                .get(page.index() as u16)
                .map_err(|_| PdfError::PageNotFound(page.get()))?;

            let lines = group_words_into_lines(page_words(&pdf_page)?);
            Ok(detect_tables_in_lines(&lines, &config))
        })
        .await??;

        Ok(tables)
    }
}

/// A run of words on one line with no large gap inside.
#[derive(Debug, Clone)]
struct Cell {
    text: String,
    left: f32,
}

#[derive(Debug)]
struct Row {
    cells: Vec<Cell>,
    top: f32,
    bottom: f32,
    height: f32,
}

fn split_cells(words: &[Word], min_cell_gap: f32) -> Vec<Cell> {
    let mut cells: Vec<Cell> = Vec::new();
    let mut last_right: Option<f32> = None;

    for word in words {
        let starts_cell = last_right.is_none_or(|right| word.left - right > min_cell_gap);
        match cells.last_mut() {
            Some(cell) if !starts_cell => {
                cell.text.push(' ');
                cell.text.push_str(&word.text);
            }
            _ => cells.push(Cell {
                text: word.text.clone(),
                left: word.left,
            }),
        }
        last_right = Some(word.right());
    }

    cells
}

pub(crate) fn detect_tables_in_lines(lines: &[Line], config: &TableDetectorConfig) -> Vec<RawTable> {
    let rows: Vec<Row> = lines
        .iter()
        .map(|line| Row {
            cells: split_cells(&line.words, config.min_cell_gap),
            top: line.top,
            bottom: line.bottom(),
            height: line.height,
        })
        .collect();

    let mut tables = Vec::new();
    for region in table_regions(&rows, config) {
        if let Some(table) = build_grid(region, config) {
            tables.push(table);
        }
    }

    tracing::debug!(lines = lines.len(), tables = tables.len(), "Table detection finished");
    tables
}

/// Maximal runs of consecutive multi-cell rows with small vertical gaps.
fn table_regions<'a>(rows: &'a [Row], config: &TableDetectorConfig) -> Vec<&'a [Row]> {
    let mut regions = Vec::new();
    let mut start: Option<usize> = None;

    for (i, row) in rows.iter().enumerate() {
        let is_candidate = row.cells.len() >= config.min_columns;
        let continues = start.is_some() && i > 0 && {
            let prev = &rows[i - 1];
            row.top - prev.bottom <= prev.height.max(row.height) * config.max_row_gap_ratio
        };

        match (is_candidate, start) {
            (true, Some(_)) if continues => {}
            (true, _) => {
                if let Some(s) = start.take() {
                    regions.push(&rows[s..i]);
                }
                start = Some(i);
            }
            (false, Some(s)) => {
                regions.push(&rows[s..i]);
                start = None;
            }
            (false, None) => {}
        }
    }

    if let Some(s) = start {
        regions.push(&rows[s..]);
    }

    regions.retain(|region| region.len() >= config.min_rows);
    regions
}

/// Column anchors: left edges recurring in enough rows, merged by tolerance.
fn column_anchors(region: &[Row], config: &TableDetectorConfig) -> Vec<f32> {
    let mut lefts: Vec<f32> = region.iter().flat_map(|r| r.cells.iter().map(|c| c.left)).collect();
    lefts.sort_by(f32::total_cmp);

    let mut clusters: Vec<Vec<f32>> = Vec::new();
    for left in lefts {
        match clusters.last_mut() {
            Some(cluster) if left - cluster[0] <= config.column_tolerance => cluster.push(left),
            _ => clusters.push(vec![left]),
        }
    }

    let min_occurrences = ((region.len() as f32 * config.min_alignment_ratio).ceil() as usize).max(2);

    clusters
        .into_iter()
        .filter(|cluster| {
            region
                .iter()
                .filter(|row| {
                    row.cells
                        .iter()
                        .any(|c| c.left >= cluster[0] && c.left <= cluster[cluster.len() - 1])
                })
                .count()
                >= min_occurrences
        })
        .map(|cluster| cluster[0])
        .collect()
}

fn build_grid(region: &[Row], config: &TableDetectorConfig) -> Option<RawTable> {
    let anchors = column_anchors(region, config);
    if anchors.len() < config.min_columns {
        return None;
    }

    let grid: RawTable = region
        .iter()
        .map(|row| {
            let mut cells: Vec<Option<String>> = vec![None; anchors.len()];
            for cell in &row.cells {
                let column = anchors
                    .iter()
                    .rposition(|&anchor| anchor <= cell.left + config.column_tolerance)
                    .unwrap_or(0);
                match &mut cells[column] {
                    Some(existing) => {
                        existing.push(' ');
                        existing.push_str(&cell.text);
                    }
                    slot => *slot = Some(cell.text.clone()),
                }
            }
            cells
        })
        .collect();

    Some(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::layout::test_support::word;

    fn line(words: Vec<Word>) -> Line {
        let top = words[0].top;
        Line {
            words,
            top,
            height: 10.0,
        }
    }

    fn row(top: f32, cells: &[(&str, f32)]) -> Line {
        line(cells.iter().map(|(text, left)| word(text, *left, top, 30.0)).collect())
    }

    #[test]
    fn test_split_cells_joins_close_words() {
        let words = vec![
            word("Unit", 10.0, 0.0, 20.0),
            word("price", 33.0, 0.0, 25.0),
            word("Qty", 120.0, 0.0, 20.0),
        ];
        let cells = split_cells(&words, 12.0);
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].text, "Unit price");
        assert_eq!(cells[1].left, 120.0);
    }

    #[test]
    fn test_detects_simple_grid() {
        let lines = vec![
            line(vec![word("Sales", 10.0, 10.0, 40.0)]),
            row(40.0, &[("Region", 10.0), ("Q1", 120.0), ("Q2", 220.0)]),
            row(52.0, &[("North", 10.0), ("10", 120.0), ("12", 220.0)]),
            row(64.0, &[("South", 10.0), ("7", 122.0)]),
        ];

        let tables = detect_tables_in_lines(&lines, &TableDetectorConfig::default());
        assert_eq!(tables.len(), 1);
        let table = &tables[0];
        assert_eq!(table.len(), 3);
        assert_eq!(
            table[0],
            vec![Some("Region".to_string()), Some("Q1".to_string()), Some("Q2".to_string())]
        );
        assert_eq!(table[2], vec![Some("South".to_string()), Some("7".to_string()), None]);
    }

    #[test]
    fn test_prose_is_not_a_table() {
        let lines = vec![
            line(vec![word("Just", 10.0, 10.0, 20.0), word("prose", 33.0, 10.0, 25.0)]),
            line(vec![word("more", 10.0, 22.0, 20.0), word("prose", 33.0, 22.0, 25.0)]),
        ];
        assert!(detect_tables_in_lines(&lines, &TableDetectorConfig::default()).is_empty());
    }

    #[test]
    fn test_separated_regions_become_separate_tables() {
        let lines = vec![
            row(10.0, &[("a", 10.0), ("b", 120.0)]),
            row(22.0, &[("1", 10.0), ("2", 120.0)]),
            line(vec![word("Interlude", 10.0, 60.0, 60.0)]),
            row(100.0, &[("x", 10.0), ("y", 200.0)]),
            row(112.0, &[("3", 10.0), ("4", 200.0)]),
        ];

        let tables = detect_tables_in_lines(&lines, &TableDetectorConfig::default());
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[1][0], vec![Some("x".to_string()), Some("y".to_string())]);
    }

    #[test]
    fn test_single_row_is_not_a_table() {
        let lines = vec![row(10.0, &[("a", 10.0), ("b", 120.0)])];
        assert!(detect_tables_in_lines(&lines, &TableDetectorConfig::default()).is_empty());
    }
}
