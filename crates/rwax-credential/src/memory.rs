// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory ledger and wallet for offline previews and tests.
//
// Both are scriptable: failures, delays in confirmation and wallet behaviour
// can be set up front, and every call is counted so callers can assert on
// resource handling.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rwax_core::{AttestError, RawFailure, error::Result};
use tracing::debug;

use crate::ledger::{LedgerClient, LedgerSession, SubmitResponse, WalletClient};
use crate::transaction::CredentialTransaction;

const BASE_FEE_DROPS: &str = "12";
/// Ledgers a prepared transaction stays valid for.
const EXPIRY_LEDGERS: u32 = 20;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Default)]
struct LedgerState {
    /// Ids of sessions that are still open.
    open: HashSet<u64>,
    next_session: u64,
    connects: u32,
    disconnects: u32,
    queries: u32,
    credentials: HashMap<String, usize>,
    /// Holder -> queries to answer "absent" before the credential appears.
    pending: HashMap<String, u32>,
    query_failures: VecDeque<RawFailure>,
    connect_failure: Option<RawFailure>,
    prepare_failure: Option<RawFailure>,
    disconnect_failure: Option<RawFailure>,
    next_sequence: u32,
    ledger_index: u32,
}

fn not_connected() -> AttestError {
    AttestError::Ledger(RawFailure::message("NotConnectedError: not connected"))
}

/// A ledger that lives in process memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    state: Arc<Mutex<LedgerState>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        let ledger = Self::default();
        {
            let mut state = lock(&ledger.state);
            state.next_sequence = 1;
            state.ledger_index = 1_000;
        }
        ledger
    }

    /// Put a credential on the ledger for `holder` immediately.
    pub fn insert_credential(&self, holder: &str) {
        *lock(&self.state)
            .credentials
            .entry(holder.to_owned())
            .or_default() += 1;
    }

    /// Record a submission; the credential becomes visible after
    /// `after_queries` status queries (0 = on the next one).
    pub fn confirm_after(&self, holder: &str, after_queries: u32) {
        lock(&self.state)
            .pending
            .insert(holder.to_owned(), after_queries);
    }

    /// The next status queries fail with these raw failures, in order.
    pub fn fail_queries(&self, failures: impl IntoIterator<Item = RawFailure>) {
        lock(&self.state).query_failures.extend(failures);
    }

    pub fn fail_connect(&self, failure: RawFailure) {
        lock(&self.state).connect_failure = Some(failure);
    }

    pub fn fail_prepare(&self, failure: RawFailure) {
        lock(&self.state).prepare_failure = Some(failure);
    }

    pub fn fail_disconnect(&self, failure: RawFailure) {
        lock(&self.state).disconnect_failure = Some(failure);
    }

    /// Whether any session is still open.
    pub fn is_connected(&self) -> bool {
        !lock(&self.state).open.is_empty()
    }

    pub fn open_sessions(&self) -> usize {
        lock(&self.state).open.len()
    }

    pub fn connect_calls(&self) -> u32 {
        lock(&self.state).connects
    }

    pub fn disconnect_calls(&self) -> u32 {
        lock(&self.state).disconnects
    }

    /// Status queries answered so far, failed ones included.
    pub fn query_calls(&self) -> u32 {
        lock(&self.state).queries
    }
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    async fn connect(&self) -> Result<Box<dyn LedgerSession>> {
        let mut state = lock(&self.state);
        state.connects += 1;
        if let Some(failure) = state.connect_failure.clone() {
            return Err(AttestError::Ledger(failure));
        }
        state.next_session += 1;
        let id = state.next_session;
        state.open.insert(id);
        debug!(session = id, open = state.open.len(), "ledger session opened");
        Ok(Box::new(InMemorySession {
            id,
            state: Arc::clone(&self.state),
        }))
    }
}

/// A session on an [`InMemoryLedger`]. Dropping it closes it without
/// counting as a disconnect call.
#[derive(Debug)]
pub struct InMemorySession {
    id: u64,
    state: Arc<Mutex<LedgerState>>,
}

#[async_trait]
impl LedgerSession for InMemorySession {
    async fn credential_object_count(&self, holder: &str) -> Result<usize> {
        let mut state = lock(&self.state);
        state.queries += 1;
        if !state.open.contains(&self.id) {
            return Err(not_connected());
        }
        if let Some(failure) = state.query_failures.pop_front() {
            return Err(AttestError::Ledger(failure));
        }
        match state.pending.get(holder).copied() {
            Some(0) => {
                state.pending.remove(holder);
                *state.credentials.entry(holder.to_owned()).or_default() += 1;
            }
            Some(remaining) => {
                state.pending.insert(holder.to_owned(), remaining - 1);
            }
            None => {}
        }
        Ok(state.credentials.get(holder).copied().unwrap_or(0))
    }

    async fn prepare(&self, mut tx: CredentialTransaction) -> Result<CredentialTransaction> {
        let mut state = lock(&self.state);
        if !state.open.contains(&self.id) {
            return Err(not_connected());
        }
        if let Some(failure) = state.prepare_failure.clone() {
            return Err(AttestError::Ledger(failure));
        }
        tx.fee = Some(BASE_FEE_DROPS.to_owned());
        tx.sequence = Some(state.next_sequence);
        tx.last_ledger_sequence = Some(state.ledger_index + EXPIRY_LEDGERS);
        state.next_sequence += 1;
        debug!(account = %tx.account, sequence = ?tx.sequence, "transaction prepared");
        Ok(tx)
    }

    async fn disconnect(&self) -> Result<()> {
        let mut state = lock(&self.state);
        state.disconnects += 1;
        state.open.remove(&self.id);
        debug!(session = self.id, open = state.open.len(), "ledger session closed");
        match state.disconnect_failure.clone() {
            Some(failure) => Err(AttestError::Ledger(failure)),
            None => Ok(()),
        }
    }
}

impl Drop for InMemorySession {
    fn drop(&mut self) {
        lock(&self.state).open.remove(&self.id);
    }
}

/// How the in-memory wallet answers `sign_and_submit`.
#[derive(Debug, Clone)]
pub enum WalletBehavior {
    /// Sign and return this hash. When the wallet is linked to a ledger the
    /// credential becomes visible after `confirm_after` queries.
    Sign { tx_hash: String, confirm_after: u32 },
    /// Succeed but return no hash.
    NoHash,
    /// Fail with this raw failure (user rejection, funds, ...).
    Fail(RawFailure),
    /// Never answer, like a user who walked away from the wallet.
    Hang,
}

#[derive(Debug)]
struct WalletState {
    connected: bool,
    behavior: WalletBehavior,
    submitted: Vec<CredentialTransaction>,
}

/// A wallet that lives in process memory.
#[derive(Debug, Clone)]
pub struct InMemoryWallet {
    state: Arc<Mutex<WalletState>>,
    ledger: Option<InMemoryLedger>,
}

impl InMemoryWallet {
    pub fn new(behavior: WalletBehavior) -> Self {
        Self {
            state: Arc::new(Mutex::new(WalletState {
                connected: true,
                behavior,
                submitted: Vec::new(),
            })),
            ledger: None,
        }
    }

    /// Successful signatures are recorded on `ledger`.
    pub fn with_ledger(mut self, ledger: InMemoryLedger) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn set_connected(&self, connected: bool) {
        lock(&self.state).connected = connected;
    }

    /// Transactions handed to the wallet, in order.
    pub fn submitted(&self) -> Vec<CredentialTransaction> {
        lock(&self.state).submitted.clone()
    }
}

#[async_trait]
impl WalletClient for InMemoryWallet {
    fn is_connected(&self) -> bool {
        lock(&self.state).connected
    }

    async fn sign_and_submit(
        &self,
        tx: &CredentialTransaction,
        _auto_submit: bool,
    ) -> Result<SubmitResponse> {
        let behavior = {
            let mut state = lock(&self.state);
            state.submitted.push(tx.clone());
            state.behavior.clone()
        };

        match behavior {
            WalletBehavior::Sign {
                tx_hash,
                confirm_after,
            } => {
                if let Some(ledger) = &self.ledger {
                    ledger.confirm_after(&tx.account, confirm_after);
                }
                Ok(SubmitResponse {
                    tx_hash: Some(tx_hash),
                })
            }
            WalletBehavior::NoHash => Ok(SubmitResponse { tx_hash: None }),
            WalletBehavior::Fail(failure) => Err(AttestError::Wallet(failure)),
            WalletBehavior::Hang => std::future::pending().await,
        }
    }
}
