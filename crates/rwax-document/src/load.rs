// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pick a text source for a file by its extension.

use std::path::Path;

use rwax_core::{AttestError, error::Result};
use tracing::debug;

use crate::pdf::PdfTextSource;
use crate::text::{PlainTextSource, TextSource};

const TEXT_EXTENSIONS: &[&str] = &["txt", "text", "md"];
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff", "bmp", "webp"];

/// Open `path` with the collaborator that understands it.
///
/// Images need the `ocr` feature; without it they are rejected as
/// unsupported rather than silently read as empty text.
pub fn open_source(path: impl AsRef<Path>) -> Result<Box<dyn TextSource>> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    debug!(path = %path.display(), %ext, "selecting text source");

    if ext == "pdf" {
        return Ok(Box::new(PdfTextSource::open(path)?));
    }
    if TEXT_EXTENSIONS.contains(&ext.as_str()) {
        return Ok(Box::new(PlainTextSource::open(path)?));
    }
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        return open_image(path);
    }
    Err(AttestError::UnsupportedDocument(format!(
        "{} (expected PDF, text or image)",
        path.display()
    )))
}

#[cfg(feature = "ocr")]
fn open_image(path: &Path) -> Result<Box<dyn TextSource>> {
    use std::sync::Arc;

    use crate::ocr::{OcrConfig, OcrEngine, OcrTextSource};

    let engine = Arc::new(OcrEngine::new(&OcrConfig::locate())?);
    Ok(Box::new(OcrTextSource::open(path, engine)?))
}

#[cfg(not(feature = "ocr"))]
fn open_image(path: &Path) -> Result<Box<dyn TextSource>> {
    Err(AttestError::UnsupportedDocument(format!(
        "{}: image input needs the `ocr` feature",
        path.display()
    )))
}
