// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for rwax-document: field extraction and full text
// analysis on a noisy, OCR-sized identity document.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use rwax_core::events::NullObserver;
use rwax_document::{DocumentAnalyzer, FieldExtractor};

/// Roughly one page of OCR output with the interesting fields buried in it.
fn sample_text() -> String {
    let mut text = String::new();
    for i in 0..40 {
        text.push_str(&format!("line {i}: REPUBLIC OF SINGAPORE IDENTITY CARD ~~ 0x{i:04X}\n"));
    }
    text.push_str("Name: Jane Tan NRIC S1234567A\nAddress: 10 Anson Road #12-01\n");
    text.push_str("Tax Ref: 201912345K\n");
    text
}

fn bench_extraction(c: &mut Criterion) {
    let text = sample_text();
    let extractor = FieldExtractor::new();

    c.bench_function("extract (one page)", |b| {
        b.iter(|| black_box(extractor.extract(black_box(&text))));
    });
}

fn bench_analysis(c: &mut Criterion) {
    let text = sample_text();
    let analyzer = DocumentAnalyzer::new();

    c.bench_function("analyze_text (one page)", |b| {
        b.iter(|| black_box(analyzer.analyze_text(black_box(&text), &NullObserver)));
    });
}

criterion_group!(benches, bench_extraction, bench_analysis);
criterion_main!(benches);
