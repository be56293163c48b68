// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Credential transaction skeleton (XRPL `DIDSet`).

use rwax_core::config::LedgerConfig;
use rwax_core::{AttestError, error::Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::payload::EncodedPayload;

pub const TRANSACTION_TYPE: &str = "DIDSet";

/// Characters of the ledger's base58 dictionary.
const ADDRESS_ALPHABET: &str = "rpshnaf39wBUDNEGHJKLM4PQRST7VWXYZ2bcdeCg65jkm8oFqi1tuvAxyz";

/// A `DIDSet` transaction. Slots are upper-case hex of raw bytes; fee,
/// sequence and expiry are filled by the ledger during preparation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CredentialTransaction {
    pub transaction_type: String,
    pub account: String,
    #[serde(rename = "URI", default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(rename = "DIDDocument", default, skip_serializing_if = "Option::is_none")]
    pub did_document: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_ledger_sequence: Option<u32>,
}

impl CredentialTransaction {
    /// Whether the ledger has filled in fee and sequence.
    pub fn is_prepared(&self) -> bool {
        self.fee.is_some() && self.sequence.is_some()
    }

    pub fn has_content(&self) -> bool {
        [&self.uri, &self.data, &self.did_document]
            .iter()
            .any(|slot| slot.as_ref().is_some_and(|s| !s.is_empty()))
    }

    /// Raw bytes of the data slot.
    pub fn data_bytes(&self) -> Option<Vec<u8>> {
        self.data.as_deref().and_then(|d| hex::decode(d).ok())
    }

    pub fn uri_text(&self) -> Option<String> {
        decode_text(self.uri.as_deref())
    }

    pub fn did_document_text(&self) -> Option<String> {
        decode_text(self.did_document.as_deref())
    }
}

fn decode_text(slot: Option<&str>) -> Option<String> {
    slot.and_then(|s| hex::decode(s).ok())
        .and_then(|b| String::from_utf8(b).ok())
}

/// Check the classic address shape: `r` prefix, 25 to 35 base58 characters.
pub fn validate_holder(holder: &str) -> Result<()> {
    let len = holder.chars().count();
    if !holder.starts_with('r') || !(25..=35).contains(&len) {
        return Err(AttestError::InvalidHolder(holder.to_owned()));
    }
    if !holder.chars().all(|c| ADDRESS_ALPHABET.contains(c)) {
        return Err(AttestError::InvalidHolder(holder.to_owned()));
    }
    Ok(())
}

/// Maps a payload plus holder into a transaction skeleton.
#[derive(Debug, Clone, Default)]
pub struct CredentialTransactionBuilder {
    config: LedgerConfig,
}

impl CredentialTransactionBuilder {
    pub fn new(config: LedgerConfig) -> Self {
        Self { config }
    }

    /// Identifier slot derived from the holder and network tag.
    pub fn holder_document(&self, holder: &str) -> String {
        format!("did:xrpl:{}:{holder}", self.config.network_tag)
    }

    /// Build the skeleton.
    ///
    /// - URI: the configured endpoint, else a `sha256:` locator for
    ///   `document_hash`.
    /// - Data: the encoded payload.
    /// - DIDDocument: the holder-derived identifier, when enabled.
    ///
    /// Fails with `EmptyCredential` when all three would be empty.
    pub fn build(
        &self,
        holder: &str,
        payload: Option<&EncodedPayload>,
        document_hash: Option<&str>,
    ) -> Result<CredentialTransaction> {
        validate_holder(holder)?;

        let uri = self
            .config
            .credential_uri
            .clone()
            .or_else(|| document_hash.map(|h| format!("sha256:{h}")));
        let data = payload.filter(|p| !p.is_empty()).map(|p| p.bytes.clone());
        let did_document = self
            .config
            .holder_document_fallback
            .then(|| self.holder_document(holder));

        let tx = CredentialTransaction {
            transaction_type: TRANSACTION_TYPE.into(),
            account: holder.to_owned(),
            uri: self.slot(uri.map(String::into_bytes))?,
            data: self.slot(data)?,
            did_document: self.slot(did_document.map(String::into_bytes))?,
            fee: None,
            sequence: None,
            last_ledger_sequence: None,
        };

        if !tx.has_content() {
            return Err(AttestError::EmptyCredential);
        }
        debug!(
            account = %tx.account,
            uri = tx.uri.is_some(),
            data = tx.data.is_some(),
            did_document = tx.did_document.is_some(),
            "credential transaction built"
        );
        Ok(tx)
    }

    fn slot(&self, raw: Option<Vec<u8>>) -> Result<Option<String>> {
        match raw {
            Some(bytes) if bytes.is_empty() => Ok(None),
            Some(bytes) if bytes.len() > self.config.slot_max_bytes => {
                Err(AttestError::PayloadTooLarge {
                    size: bytes.len(),
                    limit: self.config.slot_max_bytes,
                })
            }
            Some(bytes) => Ok(Some(hex::encode_upper(bytes))),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{CredentialPayload, PayloadEncoder};

    const HOLDER: &str = "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh";

    fn encoded() -> EncodedPayload {
        PayloadEncoder::default()
            .encode(&CredentialPayload {
                version: 1,
                property_reference: None,
                accredited: None,
                kyc_verified: Some(true),
                hash: "E3B0C44298FC1C14".into(),
                name: Some("Jane Tan".into()),
            })
            .unwrap()
    }

    #[test]
    fn all_slots_filled_and_hex_encoded() {
        let tx = CredentialTransactionBuilder::default()
            .build(HOLDER, Some(&encoded()), Some("ABCDEF"))
            .unwrap();

        assert_eq!(tx.transaction_type, "DIDSet");
        assert_eq!(tx.account, HOLDER);
        assert_eq!(tx.data_bytes().unwrap(), encoded().bytes);
        assert_eq!(tx.uri_text().as_deref(), Some("sha256:ABCDEF"));
        assert_eq!(
            tx.did_document_text(),
            Some(format!("did:xrpl:testnet:{HOLDER}"))
        );
        let data = tx.data.as_deref().unwrap();
        assert!(data.chars().all(|c| !c.is_ascii_lowercase()));
        assert!(!tx.is_prepared());
    }

    #[test]
    fn configured_endpoint_wins_for_uri() {
        let builder = CredentialTransactionBuilder::new(LedgerConfig {
            credential_uri: Some("https://rwax.example/credentials".into()),
            ..Default::default()
        });
        let tx = builder.build(HOLDER, None, Some("ABCDEF")).unwrap();
        assert_eq!(tx.uri_text().as_deref(), Some("https://rwax.example/credentials"));
        assert_eq!(tx.data, None);
    }

    #[test]
    fn holder_fallback_alone_is_enough() {
        let tx = CredentialTransactionBuilder::default()
            .build(HOLDER, None, None)
            .unwrap();
        assert!(tx.has_content());
        assert_eq!(tx.uri, None);
    }

    #[test]
    fn nothing_to_record_is_empty_credential() {
        let builder = CredentialTransactionBuilder::new(LedgerConfig {
            holder_document_fallback: false,
            ..Default::default()
        });
        let result = builder.build(HOLDER, None, None);
        assert!(matches!(result, Err(AttestError::EmptyCredential)));
    }

    #[test]
    fn oversized_slot_is_rejected() {
        let builder = CredentialTransactionBuilder::new(LedgerConfig {
            credential_uri: Some(format!("https://{}", "a".repeat(300))),
            ..Default::default()
        });
        let result = builder.build(HOLDER, None, None);
        assert!(matches!(result, Err(AttestError::PayloadTooLarge { limit: 256, .. })));
    }

    #[test]
    fn serializes_with_ledger_field_names() {
        let tx = CredentialTransactionBuilder::default()
            .build(HOLDER, Some(&encoded()), None)
            .unwrap();
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["TransactionType"], "DIDSet");
        assert_eq!(json["Account"], HOLDER);
        assert!(json.get("Data").is_some());
        assert!(json.get("DIDDocument").is_some());
        assert!(json.get("URI").is_none());
        assert!(json.get("Fee").is_none());
    }

    #[test]
    fn holder_shape_is_checked() {
        assert!(validate_holder(HOLDER).is_ok());
        assert!(validate_holder("xHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh").is_err());
        assert!(validate_holder("rShort").is_err());
        // '0' and 'l' are not in the alphabet.
        assert!(validate_holder("rHb9CJAWyB4rj91VRWn96DkukG4bwdty0l").is_err());
    }
}
