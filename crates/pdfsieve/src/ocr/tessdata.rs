//! Language code validation and tessdata directory resolution.

use super::error::OcrError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

static LANGUAGE_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z]{3}(?:_[a-z]+)?$").expect("language code pattern is valid"));

/// Well-known tessdata locations, checked after the configured directory and
/// `TESSDATA_PREFIX`.
const FALLBACK_TESSDATA_DIRS: &[&str] = &[
    "/opt/homebrew/share/tessdata",
    "/opt/homebrew/opt/tesseract/share/tessdata",
    "/usr/local/opt/tesseract/share/tessdata",
    "/usr/share/tesseract-ocr/5/tessdata",
    "/usr/share/tesseract-ocr/4/tessdata",
    "/usr/share/tessdata",
    "/usr/local/share/tessdata",
    r"C:\Program Files\Tesseract-OCR\tessdata",
    r"C:\ProgramData\Tesseract-OCR\tessdata",
];

/// Validate a Tesseract language string such as `eng` or `eng+chi_sim`.
pub fn validate_language(language: &str) -> Result<(), OcrError> {
    if language.trim().is_empty() {
        return Err(OcrError::InvalidLanguageCode("language must not be empty".to_string()));
    }

    for code in language.split('+') {
        if !LANGUAGE_CODE.is_match(code) {
            return Err(OcrError::InvalidLanguageCode(code.to_string()));
        }
    }

    Ok(())
}

/// Whether `dir` holds a `.traineddata` file for every language in `language`.
pub fn has_language_data(dir: &Path, language: &str) -> bool {
    language
        .split('+')
        .all(|code| dir.join(format!("{}.traineddata", code)).is_file())
}

/// Find a tessdata directory that covers `language`.
///
/// The explicit directory wins when it has the data; otherwise the well-known
/// install locations are scanned in order.
pub fn resolve_tessdata_dir(explicit: Option<&Path>, language: &str) -> Option<PathBuf> {
    let candidates = explicit
        .into_iter()
        .map(Path::to_path_buf)
        .chain(FALLBACK_TESSDATA_DIRS.iter().map(PathBuf::from));

    resolve_from(candidates, language)
}

fn resolve_from(candidates: impl IntoIterator<Item = PathBuf>, language: &str) -> Option<PathBuf> {
    for candidate in candidates {
        // Some installs point TESSDATA_PREFIX at the parent of tessdata/.
        for dir in [candidate.clone(), candidate.join("tessdata")] {
            if has_language_data(&dir, language) {
                tracing::debug!(path = %dir.display(), language, "Resolved tessdata directory");
                return Some(dir);
            }
        }
    }
    None
}
