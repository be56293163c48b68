// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document analysis: text -> fields -> category -> validation -> hash.

use rwax_core::events::{PipelineEvent, PipelineObserver};
use rwax_core::{CancelToken, ExtractedDocument, error::Result};
use tracing::{info, instrument};

use crate::extract::FieldExtractor;
use crate::hash::content_hash;
use crate::text::TextSource;
use crate::validate::validate;

/// Runs the analysis steps strictly in order, once per upload.
///
/// Text goes through field extraction, category inference, validation and
/// hashing. Each step starts only after the previous one finished, and the
/// observer sees `DocumentParsingStarted` before and `DocumentClassified`
/// after. The analyser holds no per-document state, so one value can serve
/// any number of uploads.
///
/// # Example
///
/// ```
/// use rwax_core::DocumentCategory;
/// use rwax_core::events::NullObserver;
/// use rwax_document::DocumentAnalyzer;
///
/// let doc = DocumentAnalyzer::new().analyze_text("Name: Jane Tan NRIC S1234567A", &NullObserver);
///
/// assert_eq!(doc.category, DocumentCategory::Identity);
/// assert_eq!(doc.fields.identity_number.as_deref(), Some("S1234567A"));
/// assert_eq!(doc.fields.holder_name.as_deref(), Some("Jane Tan"));
/// assert!(doc.is_valid);
/// assert_eq!(doc.content_hash.len(), 64);
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentAnalyzer {
    extractor: FieldExtractor,
}

impl DocumentAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyse text that has already been extracted.
    ///
    /// Never fails: unrecognisable text becomes an `Unknown`, invalid
    /// document with its defects listed.
    pub fn analyze_text(&self, text: &str, observer: &dyn PipelineObserver) -> ExtractedDocument {
        observer.on_event(&PipelineEvent::DocumentParsingStarted {
            rules: self.extractor.rule_count(),
        });

        let extraction = self.extractor.extract(text);
        let validation = validate(extraction.category, &extraction.fields);
        let document = ExtractedDocument {
            category: extraction.category,
            matched_categories: extraction.matched,
            fields: extraction.fields,
            raw_text: text.to_owned(),
            content_hash: content_hash(text),
            is_valid: validation.is_valid,
            defects: validation.defects,
        };

        observer.on_event(&PipelineEvent::DocumentClassified {
            category: document.category,
            is_valid: document.is_valid,
            content_hash: document.content_hash.clone(),
        });
        document
    }

    /// Extract text from `source`, then analyse it.
    ///
    /// Only the text extraction can fail (unreadable PDF, OCR error,
    /// cancellation); analysis itself is total.
    #[instrument(skip_all, fields(document = source.name()))]
    pub async fn analyze(
        &self,
        source: &dyn TextSource,
        observer: &dyn PipelineObserver,
        cancel: &CancelToken,
    ) -> Result<ExtractedDocument> {
        observer.on_event(&PipelineEvent::DocumentReceived {
            name: source.name().to_owned(),
            bytes: source.byte_len(),
        });

        let text = source.extract_text(observer, cancel).await?;
        let document = self.analyze_text(&text, observer);
        info!(
            category = %document.category,
            is_valid = document.is_valid,
            defects = document.defects.len(),
            "document analysed"
        );
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use rwax_core::events::RecordingObserver;
    use rwax_core::{AttestError, DocumentCategory};

    use super::*;
    use crate::text::PlainTextSource;
    use crate::validate::UNKNOWN_TYPE;

    #[test]
    fn identity_document_is_valid_and_kyc_verified() {
        let rec = RecordingObserver::new();
        let doc = DocumentAnalyzer::new().analyze_text("Name: Jane Tan NRIC S1234567A", &rec);

        assert_eq!(doc.category, DocumentCategory::Identity);
        assert!(doc.is_valid);
        assert!(doc.defects.is_empty());
        assert!(doc.is_kyc_verified());
        assert_eq!(doc.content_hash, content_hash("Name: Jane Tan NRIC S1234567A"));
    }

    #[test]
    fn unknown_document_is_data_not_an_error() {
        let doc = DocumentAnalyzer::new().analyze_text("lorem ipsum", &RecordingObserver::new());
        assert_eq!(doc.category, DocumentCategory::Unknown);
        assert!(!doc.is_valid);
        assert_eq!(doc.defects, vec![UNKNOWN_TYPE]);
    }

    #[tokio::test]
    async fn events_follow_pipeline_order() {
        let rec = RecordingObserver::new();
        let source = PlainTextSource::new("id.txt", "NRIC S1234567A");
        DocumentAnalyzer::new()
            .analyze(&source, &rec, &CancelToken::new())
            .await
            .unwrap();

        let events = rec.events();
        assert!(matches!(events[0], PipelineEvent::DocumentReceived { .. }));
        assert!(matches!(events[1], PipelineEvent::DocumentParsingStarted { rules: 4 }));
        assert!(matches!(
            events[2],
            PipelineEvent::DocumentClassified {
                category: DocumentCategory::Identity,
                is_valid: true,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn cancelled_before_extraction() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let source = PlainTextSource::new("id.txt", "NRIC S1234567A");
        let result = DocumentAnalyzer::new()
            .analyze(&source, &RecordingObserver::new(), &cancel)
            .await;
        assert!(matches!(result, Err(AttestError::Cancelled)));
    }
}
