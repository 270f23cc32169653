//! Table strategy: detected grids become a header plus data rows of the same width.

use super::{ProviderSet, RunContext, run_pages};
use crate::core::capabilities::Capabilities;
use crate::diagnostics::Stream;
use crate::document::{Document, PageNumber};
use crate::error::Result;
use crate::providers::{RawTable, TableProvider};
use crate::types::Table;
use std::sync::Arc;

pub fn table_detector(providers: &ProviderSet, capabilities: &Capabilities) -> Option<Arc<dyn TableProvider>> {
    if !capabilities.table_detection {
        return None;
    }
    providers.tables.clone()
}

/// Detect tables on every page.
///
/// Tables keep the detector's order within a page; no reordering by position
/// is attempted.
#[tracing::instrument(skip_all, fields(pages = document.page_count()))]
pub async fn extract_tables(
    document: &Document,
    detector: Option<Arc<dyn TableProvider>>,
    ctx: &RunContext,
) -> Result<Vec<Table>> {
    let Some(detector) = detector else {
        ctx.check_cancelled()?;
        ctx.diagnostics
            .info(Stream::Tables, None, "table detection unavailable; no tables extracted");
        return Ok(Vec::new());
    };
    tracing::info!(provider = detector.name(), "Table strategy selected");

    let outcomes = run_pages(document.pages(), ctx.max_concurrent_pages, &ctx.cancel, |page| {
        let detector = Arc::clone(&detector);
        let document = document.clone();
        let diagnostics = ctx.diagnostics.clone();
        async move {
            match detector.detect_tables(&document, page).await {
                Ok(grids) => normalize_tables(page, grids),
                Err(err) => {
                    diagnostics.warn(
                        Stream::Tables,
                        Some(page),
                        format!("table detection failed ({}): {}", detector.name(), err),
                    );
                    Vec::new()
                }
            }
        }
    })
    .await?;

    for page in outcomes.lost {
        ctx.diagnostics
            .warn(Stream::Tables, Some(page), "table detection task aborted unexpectedly");
    }

    Ok(outcomes.done.into_iter().flat_map(|(_, tables)| tables).collect())
}

/// Turn raw grids into numbered tables.
///
/// The first row is the header and blank cells become `""`. Data rows are
/// padded or cut to the header width. Empty grids are skipped without using a
/// table number.
pub fn normalize_tables(page: PageNumber, grids: Vec<RawTable>) -> Vec<Table> {
    let mut tables = Vec::new();

    for grid in grids {
        let mut rows = grid
            .into_iter()
            .map(|row| row.into_iter().map(Option::unwrap_or_default).collect::<Vec<String>>());

        let Some(header) = rows.next() else {
            continue;
        };
        let data: Vec<Vec<String>> = rows
            .map(|mut row| {
                row.resize(header.len(), String::new());
                row
            })
            .collect();

        if header.is_empty() && data.iter().all(Vec::is_empty) {
            continue;
        }

        tables.push(Table {
            page,
            table_number: tables.len() as u32 + 1,
            header,
            rows: data,
        });
    }

    tables
}
