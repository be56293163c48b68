// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Text-extraction collaborators.
//
// A `TextSource` turns one uploaded document into raw text. Paged sources
// (PDF) are read one page at a time, in page order; cancellation is checked
// between pages.

use std::path::Path;

use async_trait::async_trait;
use rwax_core::events::{PipelineEvent, PipelineObserver};
use rwax_core::{AttestError, CancelToken, error::Result};
use tracing::{debug, info};

/// Anything that can produce the raw text of a document.
#[async_trait]
pub trait TextSource: Send + Sync {
    /// Display name of the document (file name or similar).
    fn name(&self) -> &str;

    /// Size of the source document in bytes.
    fn byte_len(&self) -> usize;

    /// Extract the full text. Progress goes to `observer`; returns
    /// [`AttestError::Cancelled`] if `cancel` fires before completion.
    async fn extract_text(
        &self,
        observer: &dyn PipelineObserver,
        cancel: &CancelToken,
    ) -> Result<String>;
}

/// Text that is already text: `.txt` uploads and test fixtures.
#[derive(Debug, Clone)]
pub struct PlainTextSource {
    name: String,
    text: String,
}

impl PlainTextSource {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    /// Read a UTF-8 text file. Invalid UTF-8 is replaced rather than rejected.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        Ok(Self::new(
            display_name(path),
            String::from_utf8_lossy(&bytes).into_owned(),
        ))
    }
}

#[async_trait]
impl TextSource for PlainTextSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn byte_len(&self) -> usize {
        self.text.len()
    }

    async fn extract_text(
        &self,
        _observer: &dyn PipelineObserver,
        cancel: &CancelToken,
    ) -> Result<String> {
        if cancel.is_cancelled() {
            return Err(AttestError::Cancelled);
        }
        Ok(self.text.clone())
    }
}

/// Read `total` pages through `read_page` (1-indexed) and join them in page
/// order with a newline between pages.
///
/// Emits the page-extraction events and yields to the runtime between pages
/// so a cancel request is noticed before the next page starts.
pub async fn concat_pages<F>(
    total: usize,
    mut read_page: F,
    observer: &dyn PipelineObserver,
    cancel: &CancelToken,
) -> Result<String>
where
    F: FnMut(usize) -> Result<String>,
{
    observer.on_event(&PipelineEvent::PdfExtractionStarted { pages: total });

    let mut pages = Vec::with_capacity(total);
    for page in 1..=total {
        if cancel.is_cancelled() {
            info!(page, total, "page extraction cancelled");
            return Err(AttestError::Cancelled);
        }
        let text = read_page(page)?;
        debug!(page, chars = text.len(), "page text read");
        pages.push(text);
        observer.on_event(&PipelineEvent::PdfPageProcessed {
            page,
            total_pages: total,
        });
        tokio::task::yield_now().await;
    }

    let text = pages.join("\n");
    observer.on_event(&PipelineEvent::PdfExtractionComplete {
        pages: total,
        text_length: text.len(),
    });
    Ok(text)
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
