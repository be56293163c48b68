// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Field extraction and category inference over raw document text.

use regex::Regex;
use rwax_core::{CategoryMatch, DocumentCategory, FieldMap};
use tracing::debug;

use crate::patterns::{
    ACCREDITATION_MARKER, ADDRESS, CLASSIFICATION_RULES, NAME_CANDIDATES, NRIC, PASSPORT,
    PROPERTY_REFERENCE, TAX_REFERENCE,
};

/// Fields and category recognised in one piece of text.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub fields: FieldMap,
    pub category: DocumentCategory,
    /// Every matched category, highest priority first.
    pub matched: Vec<CategoryMatch>,
}

/// Applies the recognition patterns to raw text. Stateless and cheap to copy.
#[derive(Debug, Default, Clone, Copy)]
pub struct FieldExtractor;

impl FieldExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Number of classification rules evaluated per document.
    pub fn rule_count(&self) -> usize {
        CLASSIFICATION_RULES.len()
    }

    /// Extract fields and infer a category. Never fails; absent fields are
    /// simply `None` and unrecognisable text is `Unknown`.
    pub fn extract(&self, text: &str) -> Extraction {
        let fields = self.extract_fields(text);
        let matched = self.classify(text);
        let category = matched
            .first()
            .map(|m| m.category)
            .unwrap_or(DocumentCategory::Unknown);

        debug!(
            %category,
            matches = matched.len(),
            has_name = fields.holder_name.is_some(),
            "fields extracted"
        );

        Extraction {
            fields,
            category,
            matched,
        }
    }

    /// Structured fields only.
    pub fn extract_fields(&self, text: &str) -> FieldMap {
        let identity_number = first_capture(&NRIC, text);
        // The identity number takes precedence; a passport is only recorded
        // when there is none.
        let passport_number = match identity_number {
            Some(_) => None,
            None => first_capture(&PASSPORT, text).map(|p| p.to_ascii_uppercase()),
        };

        FieldMap {
            holder_name: extract_name(text),
            identity_number,
            passport_number,
            property_reference: first_capture(&PROPERTY_REFERENCE, text),
            address: first_capture(&ADDRESS, text),
            accreditation_status: ACCREDITATION_MARKER.is_match(text).then_some(true),
            tax_reference: first_capture(&TAX_REFERENCE, text),
        }
    }

    /// Evaluate every classification rule once and order the matched
    /// categories by priority. Within a category the strongest rule's
    /// confidence is kept.
    pub fn classify(&self, text: &str) -> Vec<CategoryMatch> {
        let mut matched: Vec<CategoryMatch> = Vec::new();
        for rule in CLASSIFICATION_RULES.iter().filter(|r| r.matches(text)) {
            debug!(rule = rule.name, category = %rule.category, "classification rule matched");
            match matched.iter_mut().find(|m| m.category == rule.category) {
                Some(existing) => existing.confidence = existing.confidence.max(rule.confidence),
                None => matched.push(CategoryMatch {
                    category: rule.category,
                    confidence: rule.confidence,
                }),
            }
        }
        matched.sort_by(|a, b| b.category.priority().cmp(&a.category.priority()));
        matched
    }
}

fn first_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_owned())
        .filter(|s| !s.is_empty())
}

fn extract_name(text: &str) -> Option<String> {
    NAME_CANDIDATES.iter().find_map(|re| {
        first_capture(re, text).map(|name| name.trim_end_matches([',', '.', '-']).trim().to_owned())
    })
}
