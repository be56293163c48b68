// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the RWAX attestation engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::classify::ClassifiedError;

/// What kind of document an upload turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentCategory {
    /// NRIC / FIN card or passport.
    Identity,
    /// Property title or URA reference document.
    Property,
    /// Accredited-investor declaration or certificate.
    Accreditation,
    /// Nothing recognisable.
    Unknown,
}

impl DocumentCategory {
    /// Resolution priority when a document matches several categories.
    ///
    /// Higher wins. Accreditation outranks identity, identity outranks
    /// property; `Unknown` never wins against a real match.
    pub fn priority(&self) -> u8 {
        match self {
            Self::Accreditation => 3,
            Self::Identity => 2,
            Self::Property => 1,
            Self::Unknown => 0,
        }
    }

    /// Short label for logs and UI.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Property => "property",
            Self::Accreditation => "accreditation",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for DocumentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One category a document matched, with the confidence of the rule that
/// produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryMatch {
    pub category: DocumentCategory,
    pub confidence: f32,
}

/// Structured fields pulled out of raw document text. Absence is normal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMap {
    pub holder_name: Option<String>,
    /// NRIC / FIN number.
    pub identity_number: Option<String>,
    /// Only populated when no identity number was found.
    pub passport_number: Option<String>,
    pub property_reference: Option<String>,
    pub address: Option<String>,
    /// `Some(true)` when an accreditation marker appears anywhere in the text.
    pub accreditation_status: Option<bool>,
    pub tax_reference: Option<String>,
}

impl FieldMap {
    /// True if either identity document number was recognised.
    pub fn has_identity_number(&self) -> bool {
        self.identity_number.is_some() || self.passport_number.is_some()
    }

    pub fn is_accredited(&self) -> bool {
        self.accreditation_status == Some(true)
    }
}

/// The result of analysing one upload. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedDocument {
    pub category: DocumentCategory,
    /// Every category the rule table matched, strongest first.
    pub matched_categories: Vec<CategoryMatch>,
    pub fields: FieldMap,
    pub raw_text: String,
    /// Upper-case hex SHA-256 of `raw_text`.
    pub content_hash: String,
    pub is_valid: bool,
    pub defects: Vec<String>,
}

impl ExtractedDocument {
    /// True for identity documents that passed validation.
    pub fn is_kyc_verified(&self) -> bool {
        self.category == DocumentCategory::Identity && self.is_valid
    }
}

/// Unique identifier for a submission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttemptId(pub Uuid);

impl AttemptId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AttemptId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AttemptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle states of a credential submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionStatus {
    Idle,
    /// Filling fee / sequence / expiry via the ledger.
    Preparing,
    /// Handed to the wallet, waiting for the user to sign.
    AwaitingSignature,
    /// Wallet returned a transaction hash.
    Submitted,
    /// Polling the ledger for the credential object.
    Confirming,
    Confirmed,
    Failed,
}

impl SubmissionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Failed)
    }

    /// Whether the state machine may move from `self` to `next`.
    ///
    /// `Preparing -> Idle` is the dry-run exit. Any non-terminal state may
    /// fail.
    pub fn can_transition_to(&self, next: SubmissionStatus) -> bool {
        use SubmissionStatus::*;
        match (self, next) {
            (Idle, Preparing) => true,
            (Preparing, AwaitingSignature) | (Preparing, Idle) => true,
            (AwaitingSignature, Submitted) => true,
            (Submitted, Confirming) => true,
            (Confirming, Confirmed) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

/// One attempt at registering a credential for a holder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionAttempt {
    pub id: AttemptId,
    pub holder: String,
    pub status: SubmissionStatus,
    /// Status checks used by the confirmation poll.
    pub attempts_used: u32,
    pub max_attempts: u32,
    pub tx_hash: Option<String>,
    pub last_error: Option<ClassifiedError>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubmissionAttempt {
    pub fn new(holder: impl Into<String>, max_attempts: u32) -> Self {
        let now = Utc::now();
        Self {
            id: AttemptId::new(),
            holder: holder.into(),
            status: SubmissionStatus::Idle,
            attempts_used: 0,
            max_attempts,
            tx_hash: None,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_transitions_are_allowed() {
        use SubmissionStatus::*;
        let path = [Idle, Preparing, AwaitingSignature, Submitted, Confirming, Confirmed];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{:?} -> {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn dry_run_returns_to_idle_only_from_preparing() {
        use SubmissionStatus::*;
        assert!(Preparing.can_transition_to(Idle));
        assert!(!AwaitingSignature.can_transition_to(Idle));
        assert!(!Idle.can_transition_to(AwaitingSignature));
    }

    #[test]
    fn terminal_states_are_final() {
        use SubmissionStatus::*;
        assert!(!Confirmed.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Preparing));
        assert!(Confirming.can_transition_to(Failed));
    }

    #[test]
    fn accreditation_outranks_identity() {
        assert!(DocumentCategory::Accreditation.priority() > DocumentCategory::Identity.priority());
        assert!(DocumentCategory::Identity.priority() > DocumentCategory::Property.priority());
    }
}
