// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Ledger and wallet collaborator ports.
//
// Implementations report failures as `AttestError::Ledger` /
// `AttestError::Wallet` carrying the raw failure untouched; classification
// happens once, in the state machine.

use async_trait::async_trait;
use rwax_core::error::Result;
use rwax_core::events::{PipelineEvent, PipelineObserver};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::transaction::CredentialTransaction;

/// Opens connections to the ledger.
///
/// Every `connect` hands back a session owned by the caller. Sessions are
/// independent: closing one never affects another opened on the same client,
/// so concurrent attempts for different holders can share one client.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn LedgerSession>>;
}

/// One open connection, used by a single attempt or check.
#[async_trait]
pub trait LedgerSession: Send + Sync {
    /// Number of credential objects the ledger holds for `holder`.
    async fn credential_object_count(&self, holder: &str) -> Result<usize>;

    /// Fill fee, sequence and expiry.
    async fn prepare(&self, tx: CredentialTransaction) -> Result<CredentialTransaction>;

    /// Close this session. Later calls on it fail as not connected.
    async fn disconnect(&self) -> Result<()>;
}

/// What the wallet returned after signing and submitting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    /// Absent or empty means the submission cannot be tracked.
    pub tx_hash: Option<String>,
}

/// The user's wallet. Signing may never resolve if the user walks away.
#[async_trait]
pub trait WalletClient: Send + Sync {
    fn is_connected(&self) -> bool;

    async fn sign_and_submit(
        &self,
        tx: &CredentialTransaction,
        auto_submit: bool,
    ) -> Result<SubmitResponse>;
}

/// Whether `holder` already has a credential on the ledger.
///
/// Opens its own session and always reads the ledger; the answer is never
/// cached. A failed disconnect is logged and otherwise ignored.
#[instrument(skip(ledger, observer))]
pub async fn credential_exists(
    ledger: &dyn LedgerClient,
    holder: &str,
    observer: &dyn PipelineObserver,
) -> Result<bool> {
    let session = ledger.connect().await?;
    let count = session.credential_object_count(holder).await;
    if let Err(err) = session.disconnect().await {
        warn!(error = %err, "ledger disconnect failed after credential check");
    }

    let present = count? > 0;
    debug!(present, "credential check");
    observer.on_event(&PipelineEvent::CredentialCheck {
        holder: holder.to_owned(),
        present,
    });
    Ok(present)
}
