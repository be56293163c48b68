// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Recognition patterns for identity, property and accreditation documents.
//
// Pure data. Every pattern is compiled once on first use; the classification
// rules reference the same compiled patterns the field extractor uses, so a
// document can never be classified on a pattern that yields no field.

use once_cell::sync::Lazy;
use regex::Regex;
use rwax_core::DocumentCategory;

/// Singapore NRIC / FIN: prefix letter, seven digits, checksum letter.
pub static NRIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([STFGM]\d{7}[A-Z])\b").expect("Invalid NRIC regex"));

/// Passport number introduced by a "Passport" label.
pub static PASSPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?i:passport)(?:\s*(?i:no\.?|number|#))?\s*[:\-]?\s*([A-Z]{1,2}\d{6,8}[A-Z]?)\b")
        .expect("Invalid passport regex")
});

/// URA property reference: `URA-` followed by six to eight digits.
pub static PROPERTY_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(URA-\d{6,8})\b").expect("Invalid property reference regex"));

/// Any phrase that marks the holder as an accredited or institutional investor.
pub static ACCREDITATION_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:accredited\s+investor|accredited\s+status|institutional\s+investor)\b")
        .expect("Invalid accreditation regex")
});

/// Tax reference introduced by a "Tax ref / Tax ID / Tax no." label.
pub static TAX_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?i:tax)\s*(?i:ref(?:erence)?|id|no\.?|number)\s*[:\-]?\s*([A-Z0-9][A-Z0-9\-]{5,14})\b")
        .expect("Invalid tax reference regex")
});

/// Address line snippet following an "Address" label.
pub static ADDRESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)\baddress\s*[:\-]\s*([^\n]{5,120})").expect("Invalid address regex")
});

/// Holder-name candidates, tried in order. The first capture group is the name.
pub static NAME_CANDIDATES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // "Name: Jane Tan NRIC ..." stops before the next field label.
        r"(?im)\bname\s*[:\-]\s*([A-Za-z][A-Za-z ,.'\-]*?)\s*(?:\b(?:NRIC|FIN|ID|Passport|Date|DOB|Sex|Nationality|Address)\b|$)",
        r"(?im)\b(?:holder|investor|owner)\s*[:\-]\s*([A-Za-z][A-Za-z ,.'\-]*?)\s*(?:\b(?:NRIC|FIN|ID|Passport|Date|Address)\b|$)",
        r"(?m)^[ \t]*(?:Mr|Mrs|Ms|Mdm|Dr)\.?[ \t]+([A-Z][A-Za-z'\-]+(?:[ \t]+[A-Z][A-Za-z'\-]+){0,3})",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Invalid name regex"))
    .collect()
});

/// One tagged classification rule.
pub struct ClassificationRule {
    pub name: &'static str,
    pub category: DocumentCategory,
    pub confidence: f32,
    pub pattern: &'static Lazy<Regex>,
}

impl ClassificationRule {
    pub fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

/// Every rule is evaluated once per document. Resolution between categories
/// is by [`DocumentCategory::priority`], never by rule order.
pub static CLASSIFICATION_RULES: &[ClassificationRule] = &[
    ClassificationRule {
        name: "nric",
        category: DocumentCategory::Identity,
        confidence: 0.95,
        pattern: &NRIC,
    },
    ClassificationRule {
        name: "passport",
        category: DocumentCategory::Identity,
        confidence: 0.85,
        pattern: &PASSPORT,
    },
    ClassificationRule {
        name: "ura_reference",
        category: DocumentCategory::Property,
        confidence: 0.9,
        pattern: &PROPERTY_REFERENCE,
    },
    ClassificationRule {
        name: "accreditation_marker",
        category: DocumentCategory::Accreditation,
        confidence: 0.8,
        pattern: &ACCREDITATION_MARKER,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nric_needs_prefix_and_checksum_letter() {
        assert!(NRIC.is_match("S1234567A"));
        assert!(NRIC.is_match("FIN: G7654321X"));
        assert!(!NRIC.is_match("X1234567A"));
        assert!(!NRIC.is_match("S123456A"));
        assert!(!NRIC.is_match("S12345678A"));
    }

    #[test]
    fn property_reference_digit_bounds() {
        assert!(PROPERTY_REFERENCE.is_match("URA-000123"));
        assert!(PROPERTY_REFERENCE.is_match("URA-12345678"));
        assert!(!PROPERTY_REFERENCE.is_match("URA-12345"));
        assert!(!PROPERTY_REFERENCE.is_match("URA-123456789"));
    }

    #[test]
    fn passport_requires_label() {
        let caps = PASSPORT.captures("Passport No: K1234567").unwrap();
        assert_eq!(&caps[1], "K1234567");
        assert!(!PASSPORT.is_match("K1234567"));
    }

    #[test]
    fn accreditation_marker_is_case_insensitive() {
        assert!(ACCREDITATION_MARKER.is_match("ACCREDITED INVESTOR"));
        assert!(ACCREDITATION_MARKER.is_match("an Institutional  Investor"));
        assert!(!ACCREDITATION_MARKER.is_match("accredited course"));
    }

    #[test]
    fn tax_reference_captures_identifier() {
        let caps = TAX_REFERENCE.captures("Tax Ref: 201912345K").unwrap();
        assert_eq!(&caps[1], "201912345K");
    }

    #[test]
    fn name_stops_at_next_label() {
        let caps = NAME_CANDIDATES[0].captures("Name: Jane Tan NRIC S1234567A").unwrap();
        assert_eq!(&caps[1], "Jane Tan");
    }

    #[test]
    fn every_rule_compiles() {
        for rule in CLASSIFICATION_RULES {
            // Forces the lazy pattern.
            let _ = rule.matches("");
        }
        assert_eq!(CLASSIFICATION_RULES.len(), 4);
    }
}
