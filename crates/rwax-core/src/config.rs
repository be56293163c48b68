// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AttestError, Result};

/// Wire-format bounds. Settings may tighten these, never loosen them.
pub const WIRE_MAX_BYTES: usize = 256;
pub const WIRE_NAME_MAX_CHARS: usize = 20;
pub const WIRE_HASH_PREFIX_LEN: usize = 16;

/// What the payload encoder may drop when the serialized payload is too big.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TruncationPolicy {
    /// Drop the name only; anything still oversized is an error.
    NameOnly,
    /// Drop name, then kyc flag, then accreditation flag, then property
    /// reference. Version and hash are never dropped.
    Cascade,
}

/// Credential payload limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayloadConfig {
    /// Hard ceiling on the serialized payload.
    pub max_bytes: usize,
    /// Holder name is cut to this many characters.
    pub name_max_chars: usize,
    /// Hex characters of the content hash carried in the payload.
    pub hash_prefix_len: usize,
    pub truncation: TruncationPolicy,
}

impl Default for PayloadConfig {
    fn default() -> Self {
        Self {
            max_bytes: WIRE_MAX_BYTES,
            name_max_chars: WIRE_NAME_MAX_CHARS,
            hash_prefix_len: WIRE_HASH_PREFIX_LEN,
            truncation: TruncationPolicy::NameOnly,
        }
    }
}

/// How credential transactions are shaped for the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Network tag mixed into the holder-derived document identifier.
    pub network_tag: String,
    /// Endpoint written to the URI slot. Without one the slot carries a
    /// locator derived from the document hash.
    pub credential_uri: Option<String>,
    /// Derive the document-identifier slot from the holder address.
    pub holder_document_fallback: bool,
    /// Per-slot ceiling in raw bytes (before hex encoding).
    pub slot_max_bytes: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            network_tag: "testnet".into(),
            credential_uri: None,
            holder_document_fallback: true,
            slot_max_bytes: WIRE_MAX_BYTES,
        }
    }
}

/// Timing and bounds for submission and confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionConfig {
    /// Pause after submission before the first status check.
    pub settle_delay_ms: u64,
    pub poll_interval_ms: u64,
    pub max_poll_attempts: u32,
    /// Wall-clock bound on the whole confirmation phase, settle delay included.
    pub confirmation_timeout_ms: u64,
    /// How long to wait for the wallet before giving up.
    pub signature_timeout_ms: u64,
    /// Ask the wallet to submit as soon as the user signs.
    pub auto_submit: bool,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 2_000,
            poll_interval_ms: 2_000,
            max_poll_attempts: 10,
            confirmation_timeout_ms: 30_000,
            signature_timeout_ms: 120_000,
            auto_submit: true,
        }
    }
}

impl SubmissionConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_millis(self.confirmation_timeout_ms)
    }

    pub fn signature_timeout(&self) -> Duration {
        Duration::from_millis(self.signature_timeout_ms)
    }
}

/// Complete pipeline settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub payload: PayloadConfig,
    pub ledger: LedgerConfig,
    pub submission: SubmissionConfig,
}

impl PipelineConfig {
    /// Load settings from a JSON file. Missing keys fall back to defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        debug!(path = %path.display(), "pipeline config loaded");
        Ok(config)
    }

    /// Write settings as pretty-printed JSON.
    pub fn persist(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Reject settings that would break the pipeline's bounds.
    pub fn validate(&self) -> Result<()> {
        let payload = &self.payload;
        if !(1..=WIRE_MAX_BYTES).contains(&payload.max_bytes) {
            return Err(AttestError::Config(format!(
                "payload.max_bytes must be between 1 and {WIRE_MAX_BYTES}"
            )));
        }
        if !(1..=WIRE_NAME_MAX_CHARS).contains(&payload.name_max_chars) {
            return Err(AttestError::Config(format!(
                "payload.name_max_chars must be between 1 and {WIRE_NAME_MAX_CHARS}"
            )));
        }
        if payload.hash_prefix_len != WIRE_HASH_PREFIX_LEN {
            return Err(AttestError::Config(format!(
                "payload.hash_prefix_len must be {WIRE_HASH_PREFIX_LEN}"
            )));
        }
        if !(1..=WIRE_MAX_BYTES).contains(&self.ledger.slot_max_bytes) {
            return Err(AttestError::Config(format!(
                "ledger.slot_max_bytes must be between 1 and {WIRE_MAX_BYTES}"
            )));
        }
        if self.submission.max_poll_attempts == 0 {
            return Err(AttestError::Config(
                "submission.max_poll_attempts must be at least 1".into(),
            ));
        }
        if self.submission.confirmation_timeout_ms <= self.submission.settle_delay_ms {
            return Err(AttestError::Config(
                "submission.confirmation_timeout_ms must exceed settle_delay_ms".into(),
            ));
        }
        Ok(())
    }
}
