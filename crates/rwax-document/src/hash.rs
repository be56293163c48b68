// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content fingerprinting: SHA-256 of the raw document text.

use sha2::{Digest, Sha256};

/// SHA-256 of `text` as upper-case hex (64 characters).
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode_upper(hasher.finalize())
}

/// Whether `text` hashes to `expected`. Hex case is ignored.
pub fn verify_content_hash(text: &str, expected: &str) -> bool {
    content_hash(text).eq_ignore_ascii_case(expected)
}

/// The first `len` hex characters of a content hash.
pub fn hash_prefix(hash: &str, len: usize) -> &str {
    hash.get(..len).unwrap_or(hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// SHA-256 of the empty string (well-known constant).
    const EMPTY_SHA256: &str = "E3B0C44298FC1C149AFBF4C8996FB92427AE41E4649B934CA495991B7852B855";

    #[test]
    fn hash_empty_input() {
        assert_eq!(content_hash(""), EMPTY_SHA256);
    }

    #[test]
    fn hash_known_value() {
        // SHA-256("hello"), checked against coreutils sha256sum.
        let expected = "2CF24DBA5FB0A30E26E83B2AC5B9E29E1B161E5C1FA7425E73043362938B9824";
        assert_eq!(content_hash("hello"), expected);
    }

    #[test]
    fn hash_is_stable_across_calls() {
        let text = "Name: Jane Tan NRIC S1234567A";
        let first = content_hash(text);
        for _ in 0..10 {
            assert_eq!(content_hash(text), first);
        }
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn verify_accepts_lower_case() {
        assert!(verify_content_hash("hello", &content_hash("hello").to_lowercase()));
        assert!(!verify_content_hash("hello", EMPTY_SHA256));
    }

    #[test]
    fn prefix_is_clamped() {
        assert_eq!(hash_prefix(EMPTY_SHA256, 16), "E3B0C44298FC1C14");
        assert_eq!(hash_prefix("ABC", 16), "ABC");
    }
}
