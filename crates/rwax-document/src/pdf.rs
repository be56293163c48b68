// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF text source using the `lopdf` crate.

use std::path::Path;

use async_trait::async_trait;
use lopdf::Document;
use rwax_core::events::PipelineObserver;
use rwax_core::{AttestError, CancelToken, error::Result};
use tracing::{debug, instrument};

use crate::text::{TextSource, concat_pages, display_name};

/// A PDF held in memory, read page by page.
pub struct PdfTextSource {
    name: String,
    document: Document,
    byte_len: usize,
}

impl PdfTextSource {
    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        Self::from_bytes(display_name(path), &data)
    }

    /// Parse raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(name: impl Into<String>, data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data)
            .map_err(|err| AttestError::PdfError(format!("failed to load PDF: {err}")))?;
        debug!(pages = document.get_pages().len(), "PDF loaded");
        Ok(Self {
            name: name.into(),
            document,
            byte_len: data.len(),
        })
    }

    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Text of one page, 1-indexed.
    pub fn page_text(&self, page: usize) -> Result<String> {
        let number = u32::try_from(page)
            .map_err(|_| AttestError::PdfError(format!("page {page} out of range")))?;
        self.document
            .extract_text(&[number])
            .map_err(|err| AttestError::PdfError(format!("page {page}: {err}")))
    }
}

#[async_trait]
impl TextSource for PdfTextSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn byte_len(&self) -> usize {
        self.byte_len
    }

    async fn extract_text(
        &self,
        observer: &dyn PipelineObserver,
        cancel: &CancelToken,
    ) -> Result<String> {
        let total = self.page_count();
        concat_pages(total, |page| self.page_text(page), observer, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use lopdf::content::{Content, Operation};
    use lopdf::{Object, Stream, dictionary};
    use rwax_core::events::{PipelineEvent, RecordingObserver};

    use super::*;

    /// Build an in-memory PDF with one line of text per page.
    fn pdf_with_pages(lines: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for line in lines {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*line)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    #[test]
    fn garbage_bytes_are_a_pdf_error() {
        let result = PdfTextSource::from_bytes("junk.pdf", b"not a pdf at all");
        assert!(matches!(result, Err(AttestError::PdfError(_))));
    }

    #[tokio::test]
    async fn pages_are_read_in_order() {
        let bytes = pdf_with_pages(&["Name: Jane Tan", "NRIC S1234567A"]);
        let source = PdfTextSource::from_bytes("id.pdf", &bytes).unwrap();
        assert_eq!(source.page_count(), 2);

        let rec = RecordingObserver::new();
        let text = source.extract_text(&rec, &CancelToken::new()).await.unwrap();

        let name_at = text.find("Jane Tan").unwrap();
        let nric_at = text.find("S1234567A").unwrap();
        assert!(name_at < nric_at);
        assert_eq!(
            rec.count(|e| matches!(e, PipelineEvent::PdfPageProcessed { .. })),
            2
        );
    }
}
