use super::error::PdfError;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};

/// Cached outcome of the first pdfium binding attempt.
enum InitializationState {
    Uninitialized,
    /// `lib_dir` is `None` when the system library was used.
    Initialized { lib_dir: Option<PathBuf> },
    Failed(String),
}

/// Pdfium is located once per process. Later calls create fresh bindings from
/// the cached location, or fail fast with the cached error.
static PDFIUM_STATE: Lazy<Mutex<InitializationState>> = Lazy::new(|| Mutex::new(InitializationState::Uninitialized));

fn bind_at(lib_dir: Option<&Path>) -> Result<Box<dyn PdfiumLibraryBindings>, PdfiumError> {
    match lib_dir {
        Some(dir) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir)),
        None => Pdfium::bind_to_system_library(),
    }
}

/// Try the configured directory first, then the system library.
fn bind_pdfium_impl(lib_dir: Option<&Path>) -> Result<(Option<PathBuf>, Box<dyn PdfiumLibraryBindings>), String> {
    if let Some(dir) = lib_dir {
        match bind_at(Some(dir)) {
            Ok(bindings) => return Ok((Some(dir.to_path_buf()), bindings)),
            Err(e) => {
                tracing::debug!(lib_dir = %dir.display(), error = %e, "Pdfium not found in configured directory");
            }
        }
    }

    let bindings = bind_at(None).map_err(|e| format!("Failed to initialize Pdfium: {}", e))?;
    Ok((None, bindings))
}

/// Get pdfium bindings, locating the library on first use.
///
/// * `lib_dir` - directory to try before the system library; only consulted on
///   the first call of the process
/// * `map_err` - wraps error messages in the caller's `PdfError` variant
/// * `context` - short label for error messages
pub(crate) fn bind_pdfium(
    lib_dir: Option<&Path>,
    map_err: fn(String) -> PdfError,
    context: &'static str,
) -> Result<Box<dyn PdfiumLibraryBindings>, PdfError> {
    let mut state = PDFIUM_STATE.lock();

    match &*state {
        InitializationState::Uninitialized => match bind_pdfium_impl(lib_dir) {
            Ok((resolved, bindings)) => {
                *state = InitializationState::Initialized { lib_dir: resolved };
                return Ok(bindings);
            }
            Err(err) => {
                *state = InitializationState::Failed(err.clone());
                return Err(map_err(format!("Pdfium initialization failed ({}): {}", context, err)));
            }
        },
        InitializationState::Failed(err) => {
            return Err(map_err(format!(
                "Pdfium initialization previously failed ({}): {}",
                context, err
            )));
        }
        InitializationState::Initialized { .. } => {}
    }

    let resolved = match &*state {
        InitializationState::Initialized { lib_dir } => lib_dir.clone(),
        _ => None,
    };

    bind_at(resolved.as_deref()).map_err(|e| map_err(format!("Failed to create Pdfium bindings ({}): {}", context, e)))
}

/// Bind and wrap in a [`Pdfium`] handle.
pub(crate) fn pdfium(
    lib_dir: Option<&Path>,
    map_err: fn(String) -> PdfError,
    context: &'static str,
) -> Result<Pdfium, PdfError> {
    let bindings = bind_pdfium(lib_dir, map_err, context)?;
    Ok(Pdfium::new(bindings))
}

/// Capability probe: can pdfium be bound at all?
pub fn probe_pdfium(lib_dir: Option<&Path>) -> Result<(), PdfError> {
    bind_pdfium(lib_dir, PdfError::BindingFailed, "capability probe").map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_pdfium_is_stable_across_calls() {
        // Whatever the first attempt decided, later calls agree with it.
        let first = bind_pdfium(None, PdfError::BindingFailed, "test 1").is_ok();
        let second = bind_pdfium(None, PdfError::BindingFailed, "test 2").is_ok();
        assert_eq!(first, second);
    }

    #[test]
    fn test_bind_pdfium_error_mapping() {
        let result = bind_pdfium(None, PdfError::RenderingFailed, "mapping test");
        if let Err(err) = result {
            assert!(matches!(err, PdfError::RenderingFailed(msg) if msg.contains("mapping test")));
        }
    }
}
