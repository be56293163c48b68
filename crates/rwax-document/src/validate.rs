// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Category-specific completeness checks.

use rwax_core::{DocumentCategory, FieldMap};
use serde::{Deserialize, Serialize};

pub const MISSING_IDENTITY: &str = "missing name or ID number";
pub const MISSING_PROPERTY_REFERENCE: &str = "missing property reference";
pub const MISSING_ACCREDITATION: &str = "missing accreditation status";
pub const UNKNOWN_TYPE: &str = "could not determine document type";

/// Outcome of validating one document. An invalid result always carries at
/// least one defect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    pub is_valid: bool,
    pub defects: Vec<String>,
}

impl Validation {
    fn pass() -> Self {
        Self {
            is_valid: true,
            defects: Vec::new(),
        }
    }

    fn fail(defect: &str) -> Self {
        Self {
            is_valid: false,
            defects: vec![defect.to_owned()],
        }
    }
}

/// Validate `fields` against the rules for `category`. Total: never fails.
pub fn validate(category: DocumentCategory, fields: &FieldMap) -> Validation {
    match category {
        DocumentCategory::Identity => {
            if fields.holder_name.is_some() || fields.has_identity_number() {
                Validation::pass()
            } else {
                Validation::fail(MISSING_IDENTITY)
            }
        }
        DocumentCategory::Property => {
            if fields.property_reference.is_some() {
                Validation::pass()
            } else {
                Validation::fail(MISSING_PROPERTY_REFERENCE)
            }
        }
        DocumentCategory::Accreditation => {
            if fields.is_accredited() {
                Validation::pass()
            } else {
                Validation::fail(MISSING_ACCREDITATION)
            }
        }
        DocumentCategory::Unknown => Validation::fail(UNKNOWN_TYPE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_needs_name_or_number() {
        let empty = FieldMap::default();
        let result = validate(DocumentCategory::Identity, &empty);
        assert!(!result.is_valid);
        assert_eq!(result.defects, vec![MISSING_IDENTITY]);

        let name_only = FieldMap {
            holder_name: Some("Jane Tan".into()),
            ..Default::default()
        };
        assert!(validate(DocumentCategory::Identity, &name_only).is_valid);

        let passport_only = FieldMap {
            passport_number: Some("K7654321".into()),
            ..Default::default()
        };
        assert!(validate(DocumentCategory::Identity, &passport_only).is_valid);
    }

    #[test]
    fn property_needs_reference() {
        let result = validate(DocumentCategory::Property, &FieldMap::default());
        assert_eq!(result.defects, vec![MISSING_PROPERTY_REFERENCE]);

        let fields = FieldMap {
            property_reference: Some("URA-000123".into()),
            ..Default::default()
        };
        assert!(validate(DocumentCategory::Property, &fields).is_valid);
    }

    #[test]
    fn accreditation_needs_flag() {
        let fields = FieldMap {
            accreditation_status: Some(true),
            ..Default::default()
        };
        assert!(validate(DocumentCategory::Accreditation, &fields).is_valid);
        assert!(!validate(DocumentCategory::Accreditation, &FieldMap::default()).is_valid);
    }

    #[test]
    fn unknown_is_always_invalid() {
        let full = FieldMap {
            holder_name: Some("Jane Tan".into()),
            identity_number: Some("S1234567A".into()),
            property_reference: Some("URA-000123".into()),
            accreditation_status: Some(true),
            ..Default::default()
        };
        let result = validate(DocumentCategory::Unknown, &full);
        assert!(!result.is_valid);
        assert_eq!(result.defects, vec![UNKNOWN_TYPE]);
    }
}
