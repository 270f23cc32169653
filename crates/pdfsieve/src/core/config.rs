//! Configuration loading and validation.
//!
//! Configuration can come from TOML or JSON files, from a `pdfsieve.toml`
//! discovered in the current directory or any parent, or from code. Which
//! optional providers exist is never configured here; that is detected at
//! runtime by [`crate::Capabilities`].

use crate::error::{Result, SieveError};
use crate::ocr::tessdata::validate_language;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the file [`ExtractionConfig::discover`] looks for.
pub const CONFIG_FILE_NAME: &str = "pdfsieve.toml";

const MIN_TARGET_DPI: u32 = 36;
const MAX_TARGET_DPI: u32 = 1200;

/// Main extraction configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Resolution for page renders, used by both rendering paths.
    #[serde(default = "default_target_dpi")]
    pub target_dpi: u32,

    #[serde(default)]
    pub ocr: OcrConfig,

    /// Directory holding `<lang>.traineddata`. Falls back to
    /// `TESSDATA_PREFIX` and then to well-known install locations.
    #[serde(default)]
    pub tessdata_prefix: Option<PathBuf>,

    /// Override for the `pdftoppm` executable.
    #[serde(default)]
    pub pdftoppm_path: Option<PathBuf>,

    /// Override for the `tesseract` executable.
    #[serde(default)]
    pub tesseract_path: Option<PathBuf>,

    /// Directory containing the pdfium shared library. System search paths
    /// are used when unset.
    #[serde(default)]
    pub pdfium_lib_dir: Option<PathBuf>,

    /// Upper bound on pages processed at once within one strategy.
    #[serde(default = "default_max_concurrent_pages")]
    pub max_concurrent_pages: usize,

    /// Also bundle exported results into a single ZIP archive.
    #[serde(default)]
    pub archive: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            target_dpi: default_target_dpi(),
            ocr: OcrConfig::default(),
            tessdata_prefix: None,
            pdftoppm_path: None,
            tesseract_path: None,
            pdfium_lib_dir: None,
            max_concurrent_pages: default_max_concurrent_pages(),
            archive: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Set to false to skip OCR even when an engine is available.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Tesseract language code(s), e.g. `eng` or `eng+deu`.
    #[serde(default = "default_eng")]
    pub language: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            language: default_eng(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_eng() -> String {
    "eng".to_string()
}
fn default_target_dpi() -> u32 {
    300
}
fn default_max_concurrent_pages() -> usize {
    num_cpus::get().max(1)
}

impl ExtractionConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            SieveError::validation(format!("Failed to read config file {}: {}", path.as_ref().display(), e))
        })?;

        toml::from_str(&content)
            .map_err(|e| SieveError::validation(format!("Invalid TOML in {}: {}", path.as_ref().display(), e)))
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            SieveError::validation(format!("Failed to read config file {}: {}", path.as_ref().display(), e))
        })?;

        serde_json::from_str(&content)
            .map_err(|e| SieveError::validation(format!("Invalid JSON in {}: {}", path.as_ref().display(), e)))
    }

    /// Load from a file, picking the format from its extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(SieveError::validation(format!(
                "Unsupported config file format: {} (expected .toml or .json)",
                path.display()
            ))),
        }
    }

    /// Search the current directory and its parents for `pdfsieve.toml`.
    pub fn discover() -> Result<Option<Self>> {
        let current = std::env::current_dir().map_err(SieveError::Io)?;
        Self::discover_from(&current)
    }

    pub(crate) fn discover_from(start: &Path) -> Result<Option<Self>> {
        let mut current = start.to_path_buf();

        loop {
            let candidate = current.join(CONFIG_FILE_NAME);
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "Using discovered config");
                return Ok(Some(Self::from_toml_file(candidate)?));
            }

            if let Some(parent) = current.parent() {
                current = parent.to_path_buf();
            } else {
                break;
            }
        }

        Ok(None)
    }

    /// Apply `TESSDATA_PREFIX` and `PDFSIEVE_TARGET_DPI` from the process
    /// environment.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    pub(crate) fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if self.tessdata_prefix.is_none()
            && let Some(prefix) = lookup("TESSDATA_PREFIX").filter(|p| !p.trim().is_empty())
        {
            self.tessdata_prefix = Some(PathBuf::from(prefix));
        }

        if let Some(raw) = lookup("PDFSIEVE_TARGET_DPI") {
            self.target_dpi = raw.trim().parse().map_err(|e| {
                SieveError::validation_with_source(format!("PDFSIEVE_TARGET_DPI is not a number: {:?}", raw), e)
            })?;
        }

        Ok(self)
    }

    /// Check value ranges. Called once at the start of every run.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_TARGET_DPI..=MAX_TARGET_DPI).contains(&self.target_dpi) {
            return Err(SieveError::validation(format!(
                "target_dpi must be between {} and {}, got {}",
                MIN_TARGET_DPI, MAX_TARGET_DPI, self.target_dpi
            )));
        }

        if self.max_concurrent_pages == 0 {
            return Err(SieveError::validation("max_concurrent_pages must be at least 1"));
        }

        validate_language(&self.ocr.language)
            .map_err(|e| SieveError::validation_with_source(format!("Invalid OCR language '{}'", self.ocr.language), e))
    }

    pub fn pdftoppm_command(&self) -> &Path {
        self.pdftoppm_path.as_deref().unwrap_or(Path::new("pdftoppm"))
    }

    pub fn tesseract_command(&self) -> &Path {
        self.tesseract_path.as_deref().unwrap_or(Path::new("tesseract"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = ExtractionConfig::default();
        assert_eq!(config.target_dpi, 300);
        assert!(config.ocr.enabled);
        assert_eq!(config.ocr.language, "eng");
        assert!(!config.archive);
        assert!(config.max_concurrent_pages >= 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        fs::write(
            &config_path,
            r#"
target_dpi = 150
archive = true
tessdata_prefix = "/opt/tessdata"

[ocr]
language = "deu"
            "#,
        )
        .unwrap();

        let config = ExtractionConfig::from_toml_file(&config_path).unwrap();
        assert_eq!(config.target_dpi, 150);
        assert!(config.archive);
        assert!(config.ocr.enabled);
        assert_eq!(config.ocr.language, "deu");
        assert_eq!(config.tessdata_prefix, Some(PathBuf::from("/opt/tessdata")));
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        fs::write(&config_path, r#"{"target_dpi": 200, "ocr": {"enabled": false}}"#).unwrap();

        let config = ExtractionConfig::from_file(&config_path).unwrap();
        assert_eq!(config.target_dpi, 200);
        assert!(!config.ocr.enabled);
        assert_eq!(config.ocr.language, "eng");
    }

    #[test]
    fn test_from_file_rejects_unknown_extension() {
        let err = ExtractionConfig::from_file("settings.yaml").unwrap_err();
        assert!(err.to_string().contains("Unsupported config file format"));
    }

    #[test]
    fn test_invalid_toml_is_validation_error() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&config_path, "target_dpi = [").unwrap();

        let err = ExtractionConfig::from_toml_file(&config_path).unwrap_err();
        assert!(matches!(err, SieveError::Validation { .. }));
    }

    #[test]
    fn test_discover_walks_parents() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "target_dpi = 96\n").unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        let config = ExtractionConfig::discover_from(&nested).unwrap().unwrap();
        assert_eq!(config.target_dpi, 96);
    }

    #[test]
    fn test_overrides_from_lookup() {
        let config = ExtractionConfig::default()
            .with_overrides_from(|key| match key {
                "TESSDATA_PREFIX" => Some("/data/tess".to_string()),
                "PDFSIEVE_TARGET_DPI" => Some("144".to_string()),
                _ => None,
            })
            .unwrap();

        assert_eq!(config.tessdata_prefix, Some(PathBuf::from("/data/tess")));
        assert_eq!(config.target_dpi, 144);
    }

    #[test]
    fn test_non_numeric_dpi_override_is_rejected() {
        let err = ExtractionConfig::default()
            .with_overrides_from(|key| (key == "PDFSIEVE_TARGET_DPI").then(|| "high".to_string()))
            .unwrap_err();
        assert!(matches!(err, SieveError::Validation { .. }));
    }

    #[test]
    fn test_explicit_tessdata_prefix_wins_over_env() {
        let config = ExtractionConfig {
            tessdata_prefix: Some(PathBuf::from("/explicit")),
            ..Default::default()
        }
        .with_overrides_from(|key| (key == "TESSDATA_PREFIX").then(|| "/from/env".to_string()))
        .unwrap();
        assert_eq!(config.tessdata_prefix, Some(PathBuf::from("/explicit")));
    }

    #[test]
    #[serial]
    #[allow(unsafe_code)]
    fn test_with_env_overrides_reads_process_env() {
        // SAFETY: serialized with other env-mutating tests.
        unsafe {
            std::env::set_var("PDFSIEVE_TARGET_DPI", "120");
        }
        let config = ExtractionConfig::default().with_env_overrides();
        unsafe {
            std::env::remove_var("PDFSIEVE_TARGET_DPI");
        }

        assert_eq!(config.unwrap().target_dpi, 120);
    }

    #[test]
    fn test_validate_rejects_out_of_range_dpi() {
        let config = ExtractionConfig {
            target_dpi: 5000,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("target_dpi"));
    }

    #[test]
    fn test_validate_rejects_bad_language() {
        let config = ExtractionConfig {
            ocr: OcrConfig {
                enabled: true,
                language: "english!".to_string(),
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_command_defaults() {
        let config = ExtractionConfig::default();
        assert_eq!(config.pdftoppm_command(), Path::new("pdftoppm"));
        assert_eq!(config.tesseract_command(), Path::new("tesseract"));

        let config = ExtractionConfig {
            tesseract_path: Some(PathBuf::from("/usr/local/bin/tesseract")),
            ..Default::default()
        };
        assert_eq!(config.tesseract_command(), Path::new("/usr/local/bin/tesseract"));
    }
}
