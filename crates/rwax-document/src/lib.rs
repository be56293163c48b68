// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// rwax-document: from an uploaded document to an `ExtractedDocument`.
//
// Provides text-extraction collaborators (plain text, PDF, OCR behind the
// `ocr` feature), the recognition rule table, field extraction, category
// inference, validation and content hashing.

pub mod analyze;
pub mod extract;
pub mod hash;
pub mod load;
pub mod patterns;
pub mod pdf;
pub mod text;
pub mod validate;

#[cfg(feature = "ocr")]
pub mod ocr;

pub use analyze::DocumentAnalyzer;
pub use extract::{Extraction, FieldExtractor};
pub use hash::content_hash;
pub use load::open_source;
pub use pdf::PdfTextSource;
pub use text::{PlainTextSource, TextSource};
pub use validate::{Validation, validate};

#[cfg(feature = "ocr")]
pub use ocr::{OcrConfig, OcrEngine, OcrTextSource};
