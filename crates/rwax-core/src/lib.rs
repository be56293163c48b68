// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// RWAX: core types, errors, failure classification and configuration shared
// across all crates.

pub mod cancel;
pub mod classify;
pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use cancel::CancelToken;
pub use classify::{ClassifiedError, ErrorKind, classify_error, classify_failure};
pub use config::PipelineConfig;
pub use error::{AttestError, RawFailure};
pub use events::{PipelineEvent, PipelineObserver};
pub use types::*;
