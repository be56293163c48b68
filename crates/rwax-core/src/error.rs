// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for RWAX.

use std::fmt;

use thiserror::Error;

/// A failure exactly as the ledger or wallet reported it.
///
/// Ledger responses arrive as JSON with the interesting bits nested under
/// `data`, `result` or `error`; wallets and transports usually just hand back
/// a message. Both shapes are kept verbatim here and normalised once by
/// [`crate::classify::normalize`].
#[derive(Debug, Clone, PartialEq)]
pub enum RawFailure {
    /// Structured response body (JSON-RPC result, wallet error object, ...).
    Response(serde_json::Value),
    /// Plain exception-style message.
    Message(String),
}

impl RawFailure {
    pub fn message(msg: impl Into<String>) -> Self {
        Self::Message(msg.into())
    }
}

impl fmt::Display for RawFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Response(value) => write!(f, "{value}"),
            Self::Message(msg) => f.write_str(msg),
        }
    }
}

/// Top-level error type for all RWAX operations.
#[derive(Debug, Error)]
pub enum AttestError {
    // -- Text extraction --
    #[error("unsupported document type: {0}")]
    UnsupportedDocument(String),

    #[error("PDF text extraction failed: {0}")]
    PdfError(String),

    #[error("OCR failed: {0}")]
    OcrError(String),

    // -- Credential construction --
    #[error("credential has no URI, data or document slot")]
    EmptyCredential,

    #[error("payload is {size} bytes, limit is {limit}")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("malformed credential payload: {0}")]
    MalformedPayload(String),

    #[error("invalid holder address: {0}")]
    InvalidHolder(String),

    #[error("document failed validation: {}", defects.join("; "))]
    DocumentRejected { defects: Vec<String> },

    // -- Submission --
    #[error("ledger request failed: {0}")]
    Ledger(RawFailure),

    #[error("wallet request failed: {0}")]
    Wallet(RawFailure),

    #[error("wallet is not connected")]
    WalletNotConnected,

    #[error("wallet did not respond within {0}s")]
    SignatureTimeout(u64),

    #[error("submission response carried no transaction hash")]
    MissingTxHash,

    #[error("credential not confirmed after {polls} status checks")]
    ConfirmationTimeout { polls: u32 },

    #[error("an attempt is already active for holder {0}")]
    AttemptInProgress(String),

    #[error("attempt cancelled")]
    Cancelled,

    // -- Configuration / persistence --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, AttestError>;
