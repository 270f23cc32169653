//! PDF providers: lopdf for metadata and plain text, pdfium for layout text,
//! tables and pixmaps, poppler's `pdftoppm` for high-fidelity renders.

pub(crate) mod bindings;
pub mod error;
mod layout;
pub mod metadata;
pub mod pdftoppm;
pub mod rendering;
pub mod table;
pub mod text;

pub use bindings::probe_pdfium;
pub use error::PdfError;
pub use metadata::extract_metadata;
pub use pdftoppm::PdftoppmRasterizer;
pub use rendering::PdfiumPageRenderer;
pub use table::{PdfiumTableDetector, TableDetectorConfig};
pub use text::{LayoutTextProvider, PlainTextProvider};
