//! Runtime detection of optional providers.
//!
//! Detection runs once per process (see [`Capabilities::detected`]) and the
//! resulting value is passed by reference to every strategy. Probes never fail
//! the run: a missing provider is reported as unavailable with the reason and
//! an install hint.

use crate::core::config::ExtractionConfig;
use crate::ocr::TesseractCli;
use crate::ocr::tessdata::resolve_tessdata_dir;
use crate::pdf::{PdftoppmRasterizer, probe_pdfium};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use tokio::sync::OnceCell;

static DETECTED: OnceCell<Capabilities> = OnceCell::const_new();

/// One optional feature of the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    EnhancedText,
    TableDetection,
    PixmapRender,
    HighFidelityRaster,
    OcrEngine,
    OcrLanguageData,
    EmbeddedOcr,
}

impl Capability {
    pub const ALL: [Capability; 7] = [
        Capability::EnhancedText,
        Capability::TableDetection,
        Capability::PixmapRender,
        Capability::HighFidelityRaster,
        Capability::OcrEngine,
        Capability::OcrLanguageData,
        Capability::EmbeddedOcr,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Capability::EnhancedText => "layout-aware text (pdfium)",
            Capability::TableDetection => "table detection (pdfium)",
            Capability::PixmapRender => "pixmap rendering (pdfium)",
            Capability::HighFidelityRaster => "high-fidelity rasterizer (pdftoppm)",
            Capability::OcrEngine => "OCR engine (tesseract)",
            Capability::OcrLanguageData => "OCR language data (tessdata)",
            Capability::EmbeddedOcr => "embedded OCR (libtesseract)",
        }
    }

    pub fn install_hint(self) -> &'static str {
        match self {
            Capability::EnhancedText | Capability::TableDetection | Capability::PixmapRender => {
                "Install the pdfium shared library on the library path or set pdfium_lib_dir"
            }
            Capability::HighFidelityRaster => "Install poppler: apt install poppler-utils / brew install poppler",
            Capability::OcrEngine => "Install Tesseract: apt install tesseract-ocr / brew install tesseract",
            Capability::OcrLanguageData => {
                "Install the language pack (e.g. tesseract-ocr-eng) or point TESSDATA_PREFIX at a tessdata directory"
            }
            Capability::EmbeddedOcr => "Rebuild with --features embedded-ocr and provide tessdata",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which optional providers this process can use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capabilities {
    pub enhanced_text: bool,
    pub table_detection: bool,
    pub pixmap_render: bool,
    pub high_fidelity_raster: bool,
    pub ocr_engine: bool,
    pub ocr_language_data: bool,
    pub embedded_ocr: bool,
    /// Resolved directory with `<lang>.traineddata`, when found.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tessdata_dir: Option<PathBuf>,
    /// Probe output per capability: a version when present, the failure
    /// reason when not.
    #[serde(skip)]
    details: BTreeMap<Capability, String>,
}

impl Capabilities {
    /// Nothing optional is available.
    pub fn none() -> Self {
        Self {
            enhanced_text: false,
            table_detection: false,
            pixmap_render: false,
            high_fidelity_raster: false,
            ocr_engine: false,
            ocr_language_data: false,
            embedded_ocr: false,
            tessdata_dir: None,
            details: BTreeMap::new(),
        }
    }

    /// Everything is available. Intended for runs with injected providers.
    pub fn all() -> Self {
        Self {
            enhanced_text: true,
            table_detection: true,
            pixmap_render: true,
            high_fidelity_raster: true,
            ocr_engine: true,
            ocr_language_data: true,
            embedded_ocr: true,
            tessdata_dir: None,
            details: BTreeMap::new(),
        }
    }

    pub fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::EnhancedText => self.enhanced_text,
            Capability::TableDetection => self.table_detection,
            Capability::PixmapRender => self.pixmap_render,
            Capability::HighFidelityRaster => self.high_fidelity_raster,
            Capability::OcrEngine => self.ocr_engine,
            Capability::OcrLanguageData => self.ocr_language_data,
            Capability::EmbeddedOcr => self.embedded_ocr,
        }
    }

    /// Same flags with `capability` switched off.
    pub fn without(mut self, capability: Capability) -> Self {
        let flag = match capability {
            Capability::EnhancedText => &mut self.enhanced_text,
            Capability::TableDetection => &mut self.table_detection,
            Capability::PixmapRender => &mut self.pixmap_render,
            Capability::HighFidelityRaster => &mut self.high_fidelity_raster,
            Capability::OcrEngine => &mut self.ocr_engine,
            Capability::OcrLanguageData => &mut self.ocr_language_data,
            Capability::EmbeddedOcr => &mut self.embedded_ocr,
        };
        *flag = false;
        self
    }

    /// Record probe output, folded onto one line.
    fn set_detail(&mut self, capability: Capability, detail: impl AsRef<str>) {
        let detail = detail.as_ref().split_whitespace().collect::<Vec<_>>().join(" ");
        self.details.insert(capability, detail);
    }

    /// Probe output recorded for `capability`, if any.
    pub fn detail(&self, capability: Capability) -> Option<&str> {
        self.details.get(&capability).map(String::as_str)
    }

    /// Probe the environment. Never fails; every probe runs even when an
    /// earlier one came back negative.
    pub async fn detect(config: &ExtractionConfig) -> Self {
        let lib_dir = config.pdfium_lib_dir.clone();
        let pdftoppm = PdftoppmRasterizer::new(config.pdftoppm_command());
        let tesseract = TesseractCli::new(config.tesseract_command(), None);

        let explicit_tessdata = config
            .tessdata_prefix
            .clone()
            .or_else(|| std::env::var_os("TESSDATA_PREFIX").map(PathBuf::from));
        let language = config.ocr.language.clone();

        let (pdfium, raster, ocr, tessdata) = tokio::join!(
            async {
                tokio::task::spawn_blocking(move || probe_pdfium(lib_dir.as_deref()).map_err(|e| e.to_string()))
                    .await
                    .unwrap_or_else(|e| Err(format!("pdfium probe panicked: {}", e)))
            },
            pdftoppm.probe(),
            async { tesseract.probe().await.map_err(|e| e.to_string()) },
            async {
                tokio::task::spawn_blocking(move || resolve_tessdata_dir(explicit_tessdata.as_deref(), &language))
                    .await
                    .ok()
                    .flatten()
            },
        );

        let mut caps = Self::none();

        match pdfium {
            Ok(()) => {
                for capability in [
                    Capability::EnhancedText,
                    Capability::TableDetection,
                    Capability::PixmapRender,
                ] {
                    caps.set_detail(capability, "pdfium library bound");
                }
                caps.enhanced_text = true;
                caps.table_detection = true;
                caps.pixmap_render = true;
            }
            Err(reason) => {
                for capability in [
                    Capability::EnhancedText,
                    Capability::TableDetection,
                    Capability::PixmapRender,
                ] {
                    caps.set_detail(capability, reason.as_str());
                }
            }
        }

        match raster {
            Ok(version) => {
                caps.high_fidelity_raster = true;
                caps.set_detail(Capability::HighFidelityRaster, version);
            }
            Err(reason) => {
                caps.set_detail(Capability::HighFidelityRaster, reason);
            }
        }

        match ocr {
            Ok((major, minor)) => {
                caps.ocr_engine = true;
                caps.set_detail(Capability::OcrEngine, format!("tesseract {}.{}", major, minor));
            }
            Err(reason) => {
                caps.set_detail(Capability::OcrEngine, reason);
            }
        }

        match tessdata {
            Some(dir) => {
                caps.ocr_language_data = true;
                caps.set_detail(Capability::OcrLanguageData, dir.display().to_string());
                caps.tessdata_dir = Some(dir);
            }
            None => {
                caps.set_detail(
                    Capability::OcrLanguageData,
                    format!("no traineddata for '{}' found", config.ocr.language),
                );
            }
        }

        caps.embedded_ocr = cfg!(feature = "embedded-ocr") && caps.ocr_language_data;
        let embedded_detail = if !cfg!(feature = "embedded-ocr") {
            "not compiled in".to_string()
        } else if caps.embedded_ocr {
            "linked".to_string()
        } else {
            "linked, but no language data".to_string()
        };
        caps.set_detail(Capability::EmbeddedOcr, embedded_detail);

        for line in caps.status_lines() {
            tracing::info!("{}", line);
        }

        caps
    }

    /// Process-wide detection result.
    ///
    /// The first call probes with its `config`; every later call returns the
    /// same value regardless of the config it passes.
    pub async fn detected(config: &ExtractionConfig) -> &'static Capabilities {
        DETECTED.get_or_init(|| Self::detect(config)).await
    }

    /// Capabilities that are missing, with the recorded reason.
    pub fn unavailable(&self) -> Vec<(Capability, String)> {
        Capability::ALL
            .into_iter()
            .filter(|capability| !self.has(*capability))
            .map(|capability| {
                let reason = self.detail(capability).unwrap_or("not detected").to_string();
                (capability, reason)
            })
            .collect()
    }

    /// One human-readable line per capability.
    pub fn status_lines(&self) -> Vec<String> {
        Capability::ALL
            .into_iter()
            .map(|capability| {
                let detail = self.detail(capability);
                if self.has(capability) {
                    match detail {
                        Some(detail) => format!("{}: available ({})", capability.label(), detail),
                        None => format!("{}: available", capability.label()),
                    }
                } else {
                    format!(
                        "{}: unavailable ({}). {}",
                        capability.label(),
                        detail.unwrap_or("not detected"),
                        capability.install_hint()
                    )
                }
            })
            .collect()
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::none()
    }
}
