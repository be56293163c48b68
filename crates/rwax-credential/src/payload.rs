// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Compact credential payload.
//
// Wire form is a flat JSON object with one-letter keys, serialized in
// priority order `v p a k h n`. The serialized form never exceeds the
// configured ceiling (256 bytes by default); fields are dropped from the
// lowest priority up until it fits.

use rwax_core::config::{PayloadConfig, TruncationPolicy};
use rwax_core::{AttestError, ExtractedDocument, error::Result};
use rwax_document::hash::hash_prefix;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const PAYLOAD_VERSION: u8 = 1;

/// The credential payload. `version` and `hash` are always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialPayload {
    #[serde(rename = "v")]
    pub version: u8,
    #[serde(rename = "p", default, skip_serializing_if = "Option::is_none")]
    pub property_reference: Option<String>,
    #[serde(rename = "a", default, skip_serializing_if = "Option::is_none")]
    pub accredited: Option<bool>,
    #[serde(rename = "k", default, skip_serializing_if = "Option::is_none")]
    pub kyc_verified: Option<bool>,
    /// Leading hex characters of the document content hash.
    #[serde(rename = "h")]
    pub hash: String,
    #[serde(rename = "n", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Optional payload fields, lowest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PayloadField {
    Name,
    KycVerified,
    Accredited,
    PropertyReference,
}

impl PayloadField {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Name => "n",
            Self::KycVerified => "k",
            Self::Accredited => "a",
            Self::PropertyReference => "p",
        }
    }
}

/// What each truncation policy is allowed to drop, in order.
fn drop_order(policy: TruncationPolicy) -> &'static [PayloadField] {
    match policy {
        TruncationPolicy::NameOnly => &[PayloadField::Name],
        TruncationPolicy::Cascade => &[
            PayloadField::Name,
            PayloadField::KycVerified,
            PayloadField::Accredited,
            PayloadField::PropertyReference,
        ],
    }
}

impl CredentialPayload {
    /// Remove `field`. Returns whether it was present.
    fn take(&mut self, field: PayloadField) -> bool {
        match field {
            PayloadField::Name => self.name.take().is_some(),
            PayloadField::KycVerified => self.kyc_verified.take().is_some(),
            PayloadField::Accredited => self.accredited.take().is_some(),
            PayloadField::PropertyReference => self.property_reference.take().is_some(),
        }
    }
}

/// A payload that fits, with the bytes that go on the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPayload {
    /// The fields actually retained.
    pub payload: CredentialPayload,
    pub bytes: Vec<u8>,
    /// Fields removed to meet the size ceiling, in removal order.
    pub dropped: Vec<PayloadField>,
}

impl EncodedPayload {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_str(&self) -> &str {
        // Serialized by serde_json, so always UTF-8.
        std::str::from_utf8(&self.bytes).unwrap_or_default()
    }
}

/// Builds, encodes and decodes credential payloads.
///
/// [`build`](Self::build) maps a validated document onto the one-letter wire
/// fields. [`encode`](Self::encode) serializes it under the size ceiling,
/// dropping fields per the configured [`TruncationPolicy`]. [`decode`](Self::decode)
/// reads ledger bytes back and applies the same wire rules, so anything
/// `encode` produced decodes to exactly the payload it reports.
///
/// # Example
///
/// ```
/// use rwax_core::events::NullObserver;
/// use rwax_credential::PayloadEncoder;
/// use rwax_document::DocumentAnalyzer;
///
/// let doc = DocumentAnalyzer::new().analyze_text("Name: Jane Tan NRIC S1234567A", &NullObserver);
/// let encoder = PayloadEncoder::default();
///
/// let encoded = encoder.encode(&encoder.build(&doc)).unwrap();
/// assert!(encoded.len() <= 256);
/// assert!(encoded.as_str().starts_with(r#"{"v":1,"k":true,"h":""#));
/// assert_eq!(encoder.decode(&encoded.bytes).unwrap(), encoded.payload);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PayloadEncoder {
    config: PayloadConfig,
}

impl PayloadEncoder {
    pub fn new(config: PayloadConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PayloadConfig {
        &self.config
    }

    /// Derive the payload for `document`. Deterministic.
    ///
    /// The accreditation flag is carried only when the document had one; the
    /// kyc flag only when it is true.
    pub fn build(&self, document: &ExtractedDocument) -> CredentialPayload {
        let fields = &document.fields;
        CredentialPayload {
            version: PAYLOAD_VERSION,
            property_reference: fields.property_reference.clone(),
            accredited: fields.accreditation_status,
            kyc_verified: document.is_kyc_verified().then_some(true),
            hash: hash_prefix(&document.content_hash, self.config.hash_prefix_len).to_owned(),
            name: fields
                .holder_name
                .as_ref()
                .map(|n| n.chars().take(self.config.name_max_chars).collect()),
        }
    }

    /// Serialize `payload` into the bytes that go on the ledger.
    ///
    /// Fields are dropped per the truncation policy until the candidate fits
    /// the size ceiling; a surviving name longer than the configured maximum
    /// is then cut to it. The result always decodes back to
    /// [`EncodedPayload::payload`].
    ///
    /// # Errors
    ///
    /// `MalformedPayload` for a version other than 1 or a hash that is not
    /// the configured number of hex characters; `PayloadTooLarge` when the
    /// policy runs out of fields to drop.
    ///
    /// # Example
    ///
    /// ```
    /// use rwax_credential::{CredentialPayload, PayloadEncoder, PayloadField};
    ///
    /// let encoder = PayloadEncoder::default();
    /// let candidate = CredentialPayload {
    ///     version: 1,
    ///     property_reference: None,
    ///     accredited: None,
    ///     kyc_verified: Some(true),
    ///     hash: "E3B0C44298FC1C14".into(),
    ///     name: Some("N".repeat(300)),
    /// };
    /// let encoded = encoder.encode(&candidate).unwrap();
    ///
    /// assert_eq!(encoded.dropped, vec![PayloadField::Name]);
    /// assert_eq!(encoded.as_str(), r#"{"v":1,"k":true,"h":"E3B0C44298FC1C14"}"#);
    /// assert_eq!(encoder.decode(&encoded.bytes).unwrap(), encoded.payload);
    /// ```
    pub fn encode(&self, payload: &CredentialPayload) -> Result<EncodedPayload> {
        self.check_header(payload)?;
        let limit = self.config.max_bytes;
        let mut retained = payload.clone();
        let mut bytes = serde_json::to_vec(&retained)?;
        let mut dropped = Vec::new();

        for field in drop_order(self.config.truncation) {
            if bytes.len() <= limit {
                break;
            }
            if retained.take(*field) {
                dropped.push(*field);
                bytes = serde_json::to_vec(&retained)?;
                debug!(field = field.key(), size = bytes.len(), limit, "payload field dropped");
            }
        }

        if self.cap_name(&mut retained) {
            bytes = serde_json::to_vec(&retained)?;
            debug!(size = bytes.len(), max_chars = self.config.name_max_chars, "payload name shortened");
        }

        if bytes.len() > limit {
            warn!(size = bytes.len(), limit, policy = ?self.config.truncation, "payload still oversized");
            return Err(AttestError::PayloadTooLarge {
                size: bytes.len(),
                limit,
            });
        }

        Ok(EncodedPayload {
            payload: retained,
            bytes,
            dropped,
        })
    }

    /// Parse a payload and check it against the wire rules: version 1, known
    /// keys only, hash of the configured length in hex, bounded name.
    pub fn decode(&self, bytes: &[u8]) -> Result<CredentialPayload> {
        if bytes.len() > self.config.max_bytes {
            return Err(AttestError::PayloadTooLarge {
                size: bytes.len(),
                limit: self.config.max_bytes,
            });
        }
        let payload: CredentialPayload = serde_json::from_slice(bytes)
            .map_err(|err| AttestError::MalformedPayload(err.to_string()))?;

        self.check_header(&payload)?;
        if let Some(name) = &payload.name {
            if name.chars().count() > self.config.name_max_chars {
                return Err(AttestError::MalformedPayload(format!(
                    "name longer than {} characters",
                    self.config.name_max_chars
                )));
            }
        }
        Ok(payload)
    }

    /// Version and hash rules shared by `encode` and `decode`.
    fn check_header(&self, payload: &CredentialPayload) -> Result<()> {
        if payload.version != PAYLOAD_VERSION {
            return Err(AttestError::MalformedPayload(format!(
                "unsupported version {}",
                payload.version
            )));
        }
        if payload.hash.len() != self.config.hash_prefix_len
            || !payload.hash.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(AttestError::MalformedPayload(format!(
                "hash must be {} hex characters",
                self.config.hash_prefix_len
            )));
        }
        Ok(())
    }

    /// Cut the name to `name_max_chars`. Returns whether it changed.
    fn cap_name(&self, payload: &mut CredentialPayload) -> bool {
        let max = self.config.name_max_chars;
        match payload.name.as_mut() {
            Some(name) if name.chars().count() > max => {
                *name = name.chars().take(max).collect();
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use rwax_core::{DocumentCategory, FieldMap};

    use super::*;

    const HASH: &str = "E3B0C44298FC1C149AFBF4C8996FB92427AE41E4649B934CA495991B7852B855";

    fn document(category: DocumentCategory, fields: FieldMap, is_valid: bool) -> ExtractedDocument {
        ExtractedDocument {
            category,
            matched_categories: Vec::new(),
            fields,
            raw_text: String::new(),
            content_hash: HASH.into(),
            is_valid,
            defects: Vec::new(),
        }
    }

    fn payload_with(name: Option<String>, property: Option<String>) -> CredentialPayload {
        CredentialPayload {
            version: 1,
            property_reference: property,
            accredited: Some(true),
            kyc_verified: Some(true),
            hash: "E3B0C44298FC1C14".into(),
            name,
        }
    }

    #[test]
    fn build_from_identity_document() {
        let fields = FieldMap {
            holder_name: Some("Jane Tan".into()),
            identity_number: Some("S1234567A".into()),
            ..Default::default()
        };
        let payload = PayloadEncoder::default().build(&document(DocumentCategory::Identity, fields, true));

        assert_eq!(payload.kyc_verified, Some(true));
        assert_eq!(payload.accredited, None);
        assert_eq!(payload.hash, "E3B0C44298FC1C14");
        assert_eq!(payload.name.as_deref(), Some("Jane Tan"));
    }

    #[test]
    fn invalid_identity_has_no_kyc_flag() {
        let payload = PayloadEncoder::default().build(&document(
            DocumentCategory::Identity,
            FieldMap::default(),
            false,
        ));
        assert_eq!(payload.kyc_verified, None);
    }

    #[test]
    fn build_truncates_name_to_twenty_chars() {
        let fields = FieldMap {
            holder_name: Some("Maximilian Alexander Featherstonehaugh".into()),
            ..Default::default()
        };
        let payload =
            PayloadEncoder::default().build(&document(DocumentCategory::Identity, fields, true));
        assert_eq!(payload.name.as_deref(), Some("Maximilian Alexander"));
    }

    #[test]
    fn wire_keys_in_priority_order() {
        let encoded = PayloadEncoder::default()
            .encode(&payload_with(Some("Jane Tan".into()), Some("URA-000123".into())))
            .unwrap();
        assert_eq!(
            encoded.as_str(),
            r#"{"v":1,"p":"URA-000123","a":true,"k":true,"h":"E3B0C44298FC1C14","n":"Jane Tan"}"#
        );
        assert!(encoded.dropped.is_empty());
    }

    #[test]
    fn oversized_name_is_dropped() {
        let encoded = PayloadEncoder::default()
            .encode(&payload_with(Some("x".repeat(300)), Some("URA-000123".into())))
            .unwrap();
        assert!(encoded.len() <= 256);
        assert_eq!(encoded.payload.name, None);
        assert_eq!(encoded.dropped, vec![PayloadField::Name]);
        assert_eq!(encoded.payload.property_reference.as_deref(), Some("URA-000123"));
    }

    #[test]
    fn name_only_policy_surfaces_oversize() {
        let result = PayloadEncoder::default().encode(&payload_with(None, Some("U".repeat(300))));
        assert!(matches!(
            result,
            Err(AttestError::PayloadTooLarge { limit: 256, .. })
        ));
    }

    #[test]
    fn cascade_policy_drops_in_order() {
        let encoder = PayloadEncoder::new(PayloadConfig {
            truncation: TruncationPolicy::Cascade,
            ..Default::default()
        });
        let encoded = encoder
            .encode(&payload_with(Some("Jane".into()), Some("U".repeat(300))))
            .unwrap();
        assert_eq!(
            encoded.dropped,
            vec![
                PayloadField::Name,
                PayloadField::KycVerified,
                PayloadField::Accredited,
                PayloadField::PropertyReference,
            ]
        );
        assert_eq!(encoded.as_str(), r#"{"v":1,"h":"E3B0C44298FC1C14"}"#);
    }

    #[test]
    fn cascade_stops_once_it_fits() {
        let encoder = PayloadEncoder::new(PayloadConfig {
            truncation: TruncationPolicy::Cascade,
            ..Default::default()
        });
        let encoded = encoder
            .encode(&payload_with(Some("n".repeat(240)), Some("URA-000123".into())))
            .unwrap();
        assert_eq!(encoded.dropped, vec![PayloadField::Name]);
        assert_eq!(encoded.payload.kyc_verified, Some(true));
    }

    #[test]
    fn decode_returns_retained_fields() {
        let encoder = PayloadEncoder::default();
        let encoded = encoder
            .encode(&payload_with(Some("x".repeat(300)), Some("URA-000123".into())))
            .unwrap();
        assert_eq!(encoder.decode(&encoded.bytes).unwrap(), encoded.payload);
    }

    #[test]
    fn decode_rejects_unknown_keys() {
        let result = PayloadEncoder::default().decode(br#"{"v":1,"h":"E3B0C44298FC1C14","z":1}"#);
        assert!(matches!(result, Err(AttestError::MalformedPayload(_))));
    }

    #[test]
    fn decode_rejects_wrong_version_and_bad_hash() {
        let encoder = PayloadEncoder::default();
        assert!(encoder.decode(br#"{"v":2,"h":"E3B0C44298FC1C14"}"#).is_err());
        assert!(encoder.decode(br#"{"v":1,"h":"E3B0"}"#).is_err());
        assert!(encoder.decode(br#"{"v":1,"h":"ZZZZZZZZZZZZZZZZ"}"#).is_err());
        assert!(encoder.decode(br#"{"v":1}"#).is_err());
    }

    #[test]
    fn decode_rejects_long_name() {
        let json = format!(r#"{{"v":1,"h":"E3B0C44298FC1C14","n":"{}"}}"#, "a".repeat(21));
        assert!(PayloadEncoder::default().decode(json.as_bytes()).is_err());
    }

    #[test]
    fn encode_caps_a_name_that_fits() {
        let encoder = PayloadEncoder::default();
        let encoded = encoder
            .encode(&payload_with(Some("Maximilian Alexander Featherstonehaugh".into()), None))
            .unwrap();
        assert!(encoded.dropped.is_empty());
        assert_eq!(encoded.payload.name.as_deref(), Some("Maximilian Alexander"));
        assert_eq!(encoder.decode(&encoded.bytes).unwrap(), encoded.payload);
    }

    #[test]
    fn encode_refuses_what_decode_would_refuse() {
        let encoder = PayloadEncoder::default();
        let mut short_hash = payload_with(None, None);
        short_hash.hash = "E3B0".into();
        let mut not_hex = payload_with(None, None);
        not_hex.hash = "not-a-hex-prefix".into();
        let mut future = payload_with(None, None);
        future.version = 2;

        for candidate in [short_hash, not_hex, future] {
            assert!(matches!(
                encoder.encode(&candidate),
                Err(AttestError::MalformedPayload(_))
            ));
        }
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn payload_strategy() -> impl Strategy<Value = CredentialPayload> {
        (
            proptest::option::of("[A-Z0-9-]{0,280}"),
            proptest::option::of(any::<bool>()),
            proptest::option::of(Just(true)),
            "[0-9A-F]{16}",
            proptest::option::of("\\PC{0,300}"),
        )
            .prop_map(|(property_reference, accredited, kyc_verified, hash, name)| {
                CredentialPayload {
                    version: PAYLOAD_VERSION,
                    property_reference,
                    accredited,
                    kyc_verified,
                    hash,
                    name,
                }
            })
    }

    fn cascade() -> PayloadEncoder {
        PayloadEncoder::new(PayloadConfig {
            truncation: TruncationPolicy::Cascade,
            ..Default::default()
        })
    }

    proptest! {
        /// Whatever encode accepts, decode reads back unchanged.
        #[test]
        fn encoded_payload_decodes_back(candidate in payload_strategy()) {
            for encoder in [PayloadEncoder::default(), cascade()] {
                match encoder.encode(&candidate) {
                    Ok(encoded) => {
                        prop_assert_eq!(encoder.decode(&encoded.bytes)?, encoded.payload);
                    }
                    Err(err) => {
                        let too_large = matches!(err, AttestError::PayloadTooLarge { .. });
                        prop_assert!(too_large);
                        prop_assert_eq!(encoder.config().truncation, TruncationPolicy::NameOnly);
                    }
                }
            }
        }

        /// An oversized candidate loses its name first and still fits.
        #[test]
        fn oversized_candidate_fits_without_name(candidate in payload_strategy()) {
            let encoded = cascade().encode(&candidate)?;
            prop_assert!(encoded.len() <= 256);
            if serde_json::to_vec(&candidate)?.len() > 256 {
                prop_assert_eq!(&encoded.payload.name, &None);
                if candidate.name.is_some() {
                    prop_assert_eq!(encoded.dropped.first(), Some(&PayloadField::Name));
                }
            }
        }

        /// Encoding is a pure function of the candidate.
        #[test]
        fn encoding_is_deterministic(candidate in payload_strategy()) {
            let encoder = cascade();
            prop_assert_eq!(encoder.encode(&candidate)?, encoder.encode(&candidate)?);
        }
    }
}
