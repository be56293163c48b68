// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end attestation: document in, credential transaction out.

use std::sync::Arc;

use rwax_core::config::PipelineConfig;
use rwax_core::events::{PipelineEvent, PipelineObserver, TracingObserver};
use rwax_core::{AttestError, CancelToken, ExtractedDocument, classify_error, error::Result};
use rwax_document::hash::verify_content_hash;
use rwax_document::{DocumentAnalyzer, TextSource};
use tracing::{info, instrument};

use crate::ledger::{self, LedgerClient, WalletClient};
use crate::payload::{EncodedPayload, PayloadEncoder};
use crate::registry::AttemptRegistry;
use crate::submission::{SubmissionReport, SubmissionStateMachine};
use crate::transaction::{CredentialTransaction, CredentialTransactionBuilder};

/// A validated document turned into an unsigned transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedCredential {
    pub payload: EncodedPayload,
    pub transaction: CredentialTransaction,
}

/// Everything one `attest` call produced.
#[derive(Debug, Clone)]
pub struct AttestationReport {
    pub document: ExtractedDocument,
    pub credential: PreparedCredential,
    pub submission: SubmissionReport,
}

/// Wires the analyser, encoder, builder and state machine together.
pub struct AttestationPipeline {
    config: PipelineConfig,
    analyzer: DocumentAnalyzer,
    encoder: PayloadEncoder,
    builder: CredentialTransactionBuilder,
    ledger: Arc<dyn LedgerClient>,
    submitter: SubmissionStateMachine,
    observer: Arc<dyn PipelineObserver>,
}

impl AttestationPipeline {
    /// Fails only when `config` is inconsistent.
    pub fn new(
        config: PipelineConfig,
        ledger: Arc<dyn LedgerClient>,
        wallet: Arc<dyn WalletClient>,
    ) -> Result<Self> {
        config.validate()?;
        let observer: Arc<dyn PipelineObserver> = Arc::new(TracingObserver);
        let submitter =
            SubmissionStateMachine::new(Arc::clone(&ledger), wallet, config.submission.clone())
                .with_observer(Arc::clone(&observer));
        Ok(Self {
            analyzer: DocumentAnalyzer::new(),
            encoder: PayloadEncoder::new(config.payload.clone()),
            builder: CredentialTransactionBuilder::new(config.ledger.clone()),
            ledger,
            submitter,
            observer,
            config,
        })
    }

    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.submitter = self.submitter.with_observer(Arc::clone(&observer));
        self.observer = observer;
        self
    }

    pub fn with_registry(mut self, registry: AttemptRegistry) -> Self {
        self.submitter = self.submitter.with_registry(registry);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub async fn analyze(
        &self,
        source: &dyn TextSource,
        cancel: &CancelToken,
    ) -> Result<ExtractedDocument> {
        self.analyzer
            .analyze(source, self.observer.as_ref(), cancel)
            .await
            .inspect_err(|err| self.report(err))
    }

    /// Turn a validated document into an unsigned transaction for `holder`.
    ///
    /// Invalid documents are refused with their defects; nothing about them
    /// reaches the ledger.
    pub fn prepare_credential(
        &self,
        document: &ExtractedDocument,
        holder: &str,
    ) -> Result<PreparedCredential> {
        self.try_prepare(document, holder)
            .inspect_err(|err| self.report(err))
    }

    fn try_prepare(&self, document: &ExtractedDocument, holder: &str) -> Result<PreparedCredential> {
        if !document.is_valid {
            return Err(AttestError::DocumentRejected {
                defects: document.defects.clone(),
            });
        }
        // The credential commits to this hash, so it must still describe the text.
        if !verify_content_hash(&document.raw_text, &document.content_hash) {
            return Err(AttestError::DocumentRejected {
                defects: vec!["content hash does not match the document text".into()],
            });
        }
        let payload = self.encoder.encode(&self.encoder.build(document))?;
        let transaction =
            self.builder
                .build(holder, Some(&payload), Some(&document.content_hash))?;
        Ok(PreparedCredential {
            payload,
            transaction,
        })
    }

    /// Fresh ledger read; never cached.
    pub async fn credential_exists(&self, holder: &str) -> Result<bool> {
        ledger::credential_exists(self.ledger.as_ref(), holder, self.observer.as_ref()).await
    }

    pub async fn submit(
        &self,
        credential: &PreparedCredential,
        dry_run: bool,
        cancel: &CancelToken,
    ) -> Result<SubmissionReport> {
        self.submitter
            .submit(credential.transaction.clone(), dry_run, cancel)
            .await
    }

    /// Analyse `source`, build the credential and submit it for `holder`.
    ///
    /// Errors before submission (unreadable document, rejected document,
    /// oversized payload, bad holder) are returned as `Err`. Submission
    /// failures end up in the report's attempt instead.
    #[instrument(skip_all, fields(document = source.name(), dry_run = dry_run))]
    pub async fn attest(
        &self,
        source: &dyn TextSource,
        holder: &str,
        dry_run: bool,
        cancel: &CancelToken,
    ) -> Result<AttestationReport> {
        let document = self.analyze(source, cancel).await?;
        let credential = self.prepare_credential(&document, holder)?;
        info!(
            payload_bytes = credential.payload.len(),
            dropped = credential.payload.dropped.len(),
            "credential prepared"
        );
        let submission = self.submit(&credential, dry_run, cancel).await?;
        Ok(AttestationReport {
            document,
            credential,
            submission,
        })
    }

    fn report(&self, err: &AttestError) {
        self.observer.on_event(&PipelineEvent::VerificationError {
            error: classify_error(err),
        });
    }
}
