// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// rwax-credential: payload encoding, DID transaction building and the
// bounded submission state machine.

pub mod ledger;
pub mod memory;
pub mod payload;
pub mod pipeline;
pub mod poll;
pub mod registry;
pub mod submission;
pub mod transaction;

pub use ledger::{LedgerClient, LedgerSession, SubmitResponse, WalletClient, credential_exists};
pub use memory::{InMemoryLedger, InMemorySession, InMemoryWallet, WalletBehavior};
pub use payload::{CredentialPayload, EncodedPayload, PayloadEncoder, PayloadField};
pub use pipeline::{AttestationPipeline, AttestationReport, PreparedCredential};
pub use poll::{PollOutcome, PollPolicy, poll_until};
pub use registry::{AttemptGuard, AttemptRegistry};
pub use submission::{Preview, SubmissionReport, SubmissionStateMachine};
pub use transaction::{CredentialTransaction, CredentialTransactionBuilder, validate_holder};
