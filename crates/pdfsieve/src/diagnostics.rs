//! Per-run diagnostics sink.
//!
//! Strategies record every absorbed failure and every capability downgrade
//! here. The sink is handed down the call chain and its contents end up in
//! [`crate::ExtractionResult::diagnostics`]; each entry is mirrored to
//! `tracing` as it is recorded.

use crate::document::PageNumber;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    /// Reduced functionality, e.g. an optional provider is missing.
    Info,
    /// A single unit of work failed and was skipped.
    Warning,
}

/// Which part of the run produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stream {
    Capabilities,
    Metadata,
    Text,
    Tables,
    Images,
    Ocr,
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stream::Capabilities => "capabilities",
            Stream::Metadata => "metadata",
            Stream::Text => "text",
            Stream::Tables => "tables",
            Stream::Images => "images",
            Stream::Ocr => "ocr",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub stream: Stream,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<PageNumber>,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            DiagnosticLevel::Info => "info",
            DiagnosticLevel::Warning => "warning",
        };
        match self.page {
            Some(page) => write!(f, "[{}] {} page {}: {}", level, self.stream, page, self.message),
            None => write!(f, "[{}] {}: {}", level, self.stream, self.message),
        }
    }
}

/// Shared, append-only diagnostics collector.
///
/// Clones share the same buffer, so one sink can be handed to every task of
/// a run.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Arc<Mutex<Vec<Diagnostic>>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&self, stream: Stream, page: Option<PageNumber>, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(stream = %stream, page = page.map(PageNumber::get), "{}", message);
        self.push(DiagnosticLevel::Info, stream, page, message);
    }

    pub fn warn(&self, stream: Stream, page: Option<PageNumber>, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(stream = %stream, page = page.map(PageNumber::get), "{}", message);
        self.push(DiagnosticLevel::Warning, stream, page, message);
    }

    fn push(&self, level: DiagnosticLevel, stream: Stream, page: Option<PageNumber>, message: String) {
        self.entries.lock().push(Diagnostic {
            level,
            stream,
            page,
            message,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Copy of everything recorded so far, in recording order.
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.entries.lock().clone()
    }

    /// Warnings recorded for one stream.
    pub fn warnings_for(&self, stream: Stream) -> Vec<Diagnostic> {
        self.entries
            .lock()
            .iter()
            .filter(|d| d.stream == stream && d.level == DiagnosticLevel::Warning)
            .cloned()
            .collect()
    }
}
