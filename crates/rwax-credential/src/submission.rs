// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Submission state machine.
//
//   Idle -> Preparing -> AwaitingSignature -> Submitted -> Confirming
//        -> Confirmed | Failed
//
// A dry run leaves from Preparing straight back to Idle with a preview.
// Every failure after the attempt starts is classified and recorded on the
// attempt. Each attempt opens its own ledger session and closes it before the
// attempt is reported, whatever happened.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use rwax_core::config::SubmissionConfig;
use rwax_core::events::{PipelineEvent, PipelineObserver, TracingObserver};
use rwax_core::{
    AttestError, CancelToken, ClassifiedError, SubmissionAttempt, SubmissionStatus,
    classify_error, error::Result,
};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::ledger::{LedgerClient, LedgerSession, SubmitResponse, WalletClient};
use crate::poll::{PollOutcome, PollPolicy, poll_until};
use crate::registry::AttemptRegistry;
use crate::transaction::CredentialTransaction;

/// What a dry run shows the user. Nothing was signed or submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preview {
    pub transaction: CredentialTransaction,
    /// Fee the ledger asked for, in drops.
    pub estimated_fee: Option<String>,
}

/// Final state of one attempt.
#[derive(Debug, Clone)]
pub struct SubmissionReport {
    pub attempt: SubmissionAttempt,
    /// Present only for dry runs.
    pub preview: Option<Preview>,
}

impl SubmissionReport {
    pub fn status(&self) -> SubmissionStatus {
        self.attempt.status
    }

    pub fn is_confirmed(&self) -> bool {
        self.attempt.status == SubmissionStatus::Confirmed
    }

    pub fn error(&self) -> Option<&ClassifiedError> {
        self.attempt.last_error.as_ref()
    }
}

/// Drives one credential transaction from preparation to confirmation.
///
/// Each call to [`submit`](Self::submit) is one attempt. The attempt opens
/// its own ledger session, has the ledger fill in fee and sequence, hands the
/// transaction to the wallet under the signature timeout, then polls for the
/// credential within the confirmation bounds. The session is closed before
/// the report is returned, on every path.
///
/// A holder can have one attempt in flight at a time. State machines that
/// share an [`AttemptRegistry`] enforce that across each other.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use rwax_core::config::SubmissionConfig;
/// use rwax_core::{CancelToken, SubmissionStatus};
/// use rwax_credential::{
///     CredentialTransaction, InMemoryLedger, InMemoryWallet, SubmissionStateMachine,
///     WalletBehavior,
/// };
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> rwax_core::error::Result<()> {
/// let ledger = InMemoryLedger::new();
/// let wallet = InMemoryWallet::new(WalletBehavior::NoHash);
/// let machine = SubmissionStateMachine::new(
///     Arc::new(ledger.clone()),
///     Arc::new(wallet),
///     SubmissionConfig::default(),
/// );
///
/// let tx = CredentialTransaction {
///     transaction_type: "DIDSet".into(),
///     account: "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh".into(),
///     uri: None,
///     data: Some("7B7D".into()),
///     did_document: None,
///     fee: None,
///     sequence: None,
///     last_ledger_sequence: None,
/// };
///
/// // A dry run stops once the ledger has priced the transaction.
/// let report = machine.submit(tx, true, &CancelToken::new()).await?;
/// assert_eq!(report.status(), SubmissionStatus::Idle);
/// assert!(report.preview.is_some());
/// assert!(!ledger.is_connected());
/// # Ok(())
/// # }
/// ```
pub struct SubmissionStateMachine {
    ledger: Arc<dyn LedgerClient>,
    wallet: Arc<dyn WalletClient>,
    config: SubmissionConfig,
    registry: AttemptRegistry,
    observer: Arc<dyn PipelineObserver>,
}

impl SubmissionStateMachine {
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        wallet: Arc<dyn WalletClient>,
        config: SubmissionConfig,
    ) -> Self {
        Self {
            ledger,
            wallet,
            config,
            registry: AttemptRegistry::new(),
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Share a registry with other state machines talking to the same ledger.
    pub fn with_registry(mut self, registry: AttemptRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry(&self) -> &AttemptRegistry {
        &self.registry
    }

    /// Run one attempt for `tx`.
    ///
    /// Returns `Err` only when the holder already has an attempt in flight;
    /// every other failure ends in a `Failed` attempt carrying a classified
    /// error.
    #[instrument(skip_all, fields(holder = %tx.account, dry_run = dry_run))]
    pub async fn submit(
        &self,
        tx: CredentialTransaction,
        dry_run: bool,
        cancel: &CancelToken,
    ) -> Result<SubmissionReport> {
        let _guard = self.registry.acquire(&tx.account)?;
        let mut attempt = SubmissionAttempt::new(tx.account.clone(), self.config.max_poll_attempts);
        info!(attempt = %attempt.id, "submission started");

        self.transition(&mut attempt, SubmissionStatus::Preparing);
        let result = match self.ledger.connect().await {
            Ok(session) => {
                let result = self
                    .drive(session.as_ref(), &mut attempt, tx, dry_run, cancel)
                    .await;
                release(session.as_ref()).await;
                result
            }
            Err(err) => Err(err),
        };

        let preview = match result {
            Ok(preview) => preview,
            Err(err) => {
                self.fail(&mut attempt, &err);
                None
            }
        };
        info!(attempt = %attempt.id, status = ?attempt.status, polls = attempt.attempts_used, "submission finished");
        Ok(SubmissionReport { attempt, preview })
    }

    async fn drive(
        &self,
        session: &dyn LedgerSession,
        attempt: &mut SubmissionAttempt,
        tx: CredentialTransaction,
        dry_run: bool,
        cancel: &CancelToken,
    ) -> Result<Option<Preview>> {
        let prepared = until_cancelled(cancel, session.prepare(tx)).await?;

        if dry_run {
            let preview = Preview {
                estimated_fee: prepared.fee.clone(),
                transaction: prepared,
            };
            self.transition(attempt, SubmissionStatus::Idle);
            return Ok(Some(preview));
        }

        if !self.wallet.is_connected() {
            return Err(AttestError::WalletNotConnected);
        }
        self.transition(attempt, SubmissionStatus::AwaitingSignature);

        let response = until_cancelled(cancel, self.await_signature(&prepared)).await?;
        let tx_hash = response
            .tx_hash
            .filter(|hash| !hash.trim().is_empty())
            .ok_or(AttestError::MissingTxHash)?;
        attempt.tx_hash = Some(tx_hash.clone());
        self.transition(attempt, SubmissionStatus::Submitted);

        self.transition(attempt, SubmissionStatus::Confirming);
        let holder = attempt.holder.clone();
        let outcome = poll_until(
            PollPolicy::from(&self.config),
            |_| {
                let holder = holder.as_str();
                async move { session.credential_object_count(holder).await.map(|n| n > 0) }
            },
            self.observer.as_ref(),
            cancel,
        )
        .await;
        attempt.attempts_used = outcome.attempts();

        match outcome {
            PollOutcome::Confirmed { .. } => {
                self.transition(attempt, SubmissionStatus::Confirmed);
                self.observer.on_event(&PipelineEvent::CredentialConfirmed {
                    holder,
                    tx_hash,
                });
                Ok(None)
            }
            PollOutcome::Exhausted { attempts } | PollOutcome::TimedOut { attempts } => {
                Err(AttestError::ConfirmationTimeout { polls: attempts })
            }
            PollOutcome::Cancelled { .. } => Err(AttestError::Cancelled),
        }
    }

    /// Hand `tx` to the wallet, bounded by the signature timeout.
    async fn await_signature(&self, tx: &CredentialTransaction) -> Result<SubmitResponse> {
        let limit = self.config.signature_timeout();
        match tokio::time::timeout(limit, self.wallet.sign_and_submit(tx, self.config.auto_submit))
            .await
        {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout_secs = limit.as_secs(), "wallet did not answer");
                Err(AttestError::SignatureTimeout(limit.as_secs()))
            }
        }
    }

    fn transition(&self, attempt: &mut SubmissionAttempt, to: SubmissionStatus) {
        let from = attempt.status;
        debug_assert!(from.can_transition_to(to), "illegal transition {from:?} -> {to:?}");
        attempt.status = to;
        attempt.updated_at = Utc::now();
        self.observer.on_event(&PipelineEvent::StatusChanged {
            attempt: attempt.id,
            from,
            to,
        });
    }

    fn fail(&self, attempt: &mut SubmissionAttempt, err: &AttestError) {
        let classified = classify_error(err);
        warn!(
            attempt = %attempt.id,
            kind = ?classified.kind,
            error = %classified,
            "submission failed"
        );
        self.observer.on_event(&PipelineEvent::VerificationError {
            error: classified.clone(),
        });
        attempt.last_error = Some(classified);
        self.transition(attempt, SubmissionStatus::Failed);
    }
}

/// Best-effort disconnect. Failures are logged and swallowed.
async fn release(session: &dyn LedgerSession) {
    match session.disconnect().await {
        Ok(()) => debug!("ledger session closed"),
        Err(err) => warn!(error = %err, "ledger disconnect failed during cleanup, ignoring"),
    }
}

async fn until_cancelled<T>(
    cancel: &CancelToken,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AttestError::Cancelled),
        result = fut => result,
    }
}
