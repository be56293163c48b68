// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Failure classification for the submission path.
//
// Every ledger or wallet failure, whatever shape it arrived in, is folded into
// one `ClassifiedError` with a fixed kind and fixed guidance text. Guidance is
// never derived from the raw message so the UI renders the same advice for
// the same kind of failure every time.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AttestError, RawFailure};

/// The fixed failure taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// No usable URI, data or document slot. Fatal, never retried.
    EmptyCredential,
    /// Account cannot cover the reserve or fee. Fatal for this attempt.
    InsufficientFunds,
    /// Ledger amendment not enabled on this network. Fatal.
    FeatureDisabled,
    /// User declined in the wallet. Fatal for this attempt, retriable by hand.
    UserRejected,
    /// Connectivity problem. Safe to retry the whole attempt.
    NetworkFailure,
    /// Anything else, surfaced verbatim with generic guidance.
    Unknown,
}

impl ErrorKind {
    /// What the user should do next.
    pub fn guidance(&self) -> &'static str {
        match self {
            Self::EmptyCredential => {
                "The credential had nothing to record. Upload the document again so its details can be read."
            }
            Self::InsufficientFunds => {
                "Your account does not hold enough XRP to cover the reserve and fee. Top up your wallet, then try again."
            }
            Self::FeatureDisabled => {
                "Credential registration is not enabled on this network yet. Switch to a network that supports it."
            }
            Self::UserRejected => {
                "The request was declined in your wallet. Start again and approve it when your wallet asks."
            }
            Self::NetworkFailure => {
                "We could not reach the ledger. Check your connection, then try again."
            }
            Self::Unknown => {
                "Something went wrong while registering your credential. Try again, and contact support if it keeps happening."
            }
        }
    }

    /// Whether the failure is transient (retrying the whole attempt is safe).
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::NetworkFailure)
    }

    /// Whether the user can usefully try again straight away.
    pub fn user_retriable(&self) -> bool {
        matches!(self, Self::NetworkFailure | Self::UserRejected)
    }
}

/// A failure in the one shape the rest of the system understands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    /// Ledger result code or wallet error code, when there was one.
    pub raw_code: Option<String>,
    pub message: String,
    pub guidance: String,
}

impl ClassifiedError {
    pub fn new(kind: ErrorKind, raw_code: Option<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            raw_code,
            message: message.into(),
            guidance: kind.guidance().to_owned(),
        }
    }
}

impl std::fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.raw_code {
            Some(code) => write!(f, "{} ({code})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// A raw failure reduced to an optional code and a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedFailure {
    pub code: Option<String>,
    pub message: String,
}

/// Keys that hold a machine-readable result or error code.
const CODE_KEYS: &[&str] = &["engine_result", "error_code", "code", "error"];
/// Keys that hold human-readable text.
const MESSAGE_KEYS: &[&str] = &[
    "engine_result_message",
    "error_message",
    "error_exception",
    "message",
];
/// Keys under which ledger and wallet libraries nest the real failure.
const NESTED_KEYS: &[&str] = &["data", "result", "error"];
const MAX_DEPTH: usize = 4;

/// Reduce any raw failure shape to `(code, message)`.
///
/// Nested objects are searched in `data`, `result`, `error` order; the first
/// code found wins, messages are collected in the order they are found.
pub fn normalize(raw: &RawFailure) -> NormalizedFailure {
    match raw {
        RawFailure::Message(msg) => NormalizedFailure {
            code: None,
            message: msg.trim().to_owned(),
        },
        RawFailure::Response(value) => {
            let mut code = None;
            let mut messages = Vec::new();
            walk(value, 0, &mut code, &mut messages);
            let message = if messages.is_empty() {
                code.clone().unwrap_or_else(|| value.to_string())
            } else {
                messages.join(": ")
            };
            NormalizedFailure { code, message }
        }
    }
}

fn walk(value: &Value, depth: usize, code: &mut Option<String>, messages: &mut Vec<String>) {
    if depth > MAX_DEPTH {
        return;
    }
    match value {
        Value::String(s) => push_unique(messages, s),
        Value::Object(map) => {
            for key in CODE_KEYS {
                if let Some(Value::String(s)) = map.get(*key) {
                    if code.is_none() && looks_like_code(s) {
                        *code = Some(s.clone());
                    } else if !looks_like_code(s) {
                        push_unique(messages, s);
                    }
                }
                if let Some(Value::Number(n)) = map.get(*key) {
                    if code.is_none() {
                        *code = Some(n.to_string());
                    }
                }
            }
            for key in MESSAGE_KEYS {
                if let Some(Value::String(s)) = map.get(*key) {
                    push_unique(messages, s);
                }
            }
            for key in NESTED_KEYS {
                if let Some(nested @ Value::Object(_)) = map.get(*key) {
                    walk(nested, depth + 1, code, messages);
                }
            }
        }
        _ => {}
    }
}

fn looks_like_code(s: &str) -> bool {
    !s.is_empty() && !s.contains(char::is_whitespace)
}

fn push_unique(messages: &mut Vec<String>, s: &str) {
    let s = s.trim();
    if !s.is_empty() && !messages.iter().any(|m| m == s) {
        messages.push(s.to_owned());
    }
}

/// Classify a raw ledger or wallet failure. First matching rule wins.
pub fn classify_failure(raw: &RawFailure) -> ClassifiedError {
    let normalized = normalize(raw);
    let kind = kind_for(normalized.code.as_deref(), &normalized.message);
    ClassifiedError::new(kind, normalized.code, normalized.message)
}

fn kind_for(code: Option<&str>, message: &str) -> ErrorKind {
    let haystack = format!("{} {}", code.unwrap_or_default(), message).to_ascii_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| haystack.contains(n));

    if has(&["empty_did", "emptydid", "empty credential", "empty_credential"]) {
        ErrorKind::EmptyCredential
    } else if has(&[
        "insufficient",
        "insuf_fee",
        "unfunded",
        "reserve",
        "not enough xrp",
        "balance",
    ]) {
        ErrorKind::InsufficientFunds
    } else if has(&["disabled", "amendment", "not enabled", "not supported"]) {
        ErrorKind::FeatureDisabled
    } else if has(&["reject", "denied", "declined", "cancelled by user", "canceled by user"]) {
        ErrorKind::UserRejected
    } else if has(&[
        "network",
        "timeout",
        "timed out",
        "connection",
        "websocket",
        "econnrefused",
        "disconnected",
        "unreachable",
        "not connected",
    ]) {
        ErrorKind::NetworkFailure
    } else {
        ErrorKind::Unknown
    }
}

/// Convert any `AttestError` into a `ClassifiedError`.
pub fn classify_error(err: &AttestError) -> ClassifiedError {
    match err {
        AttestError::Ledger(raw) | AttestError::Wallet(raw) => classify_failure(raw),

        AttestError::EmptyCredential => {
            ClassifiedError::new(ErrorKind::EmptyCredential, None, err.to_string())
        }

        AttestError::WalletNotConnected
        | AttestError::SignatureTimeout(_)
        | AttestError::ConfirmationTimeout { .. } => {
            ClassifiedError::new(ErrorKind::NetworkFailure, None, err.to_string())
        }

        AttestError::MissingTxHash => ClassifiedError::new(
            ErrorKind::Unknown,
            Some("missing_tx_hash".into()),
            err.to_string(),
        ),

        _ => ClassifiedError::new(ErrorKind::Unknown, None, err.to_string()),
    }
}
