// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// One active submission per holder.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use rwax_core::{AttestError, error::Result};
use tracing::{debug, warn};

/// Holders with an attempt in flight. Clones share the same set.
#[derive(Debug, Clone, Default)]
pub struct AttemptRegistry {
    active: Arc<Mutex<HashSet<String>>>,
}

impl AttemptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `holder` for the lifetime of the returned guard.
    ///
    /// Fails with `AttemptInProgress` while another guard for the same holder
    /// is alive. Re-entrant calls are rejected, never queued.
    pub fn acquire(&self, holder: &str) -> Result<AttemptGuard> {
        let inserted = self
            .active
            .lock()
            .map(|mut active| active.insert(holder.to_owned()))
            .unwrap_or_else(|poisoned| poisoned.into_inner().insert(holder.to_owned()));

        if !inserted {
            warn!(%holder, "rejecting overlapping submission");
            return Err(AttestError::AttemptInProgress(holder.to_owned()));
        }
        debug!(%holder, "attempt slot claimed");
        Ok(AttemptGuard {
            registry: self.clone(),
            holder: holder.to_owned(),
        })
    }

    pub fn is_active(&self, holder: &str) -> bool {
        self.active
            .lock()
            .map(|active| active.contains(holder))
            .unwrap_or_else(|poisoned| poisoned.into_inner().contains(holder))
    }

    fn release(&self, holder: &str) {
        let mut active = self
            .active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        active.remove(holder);
    }
}

/// Releases the holder's slot when dropped, including when the owning future
/// is cancelled.
#[derive(Debug)]
pub struct AttemptGuard {
    registry: AttemptRegistry,
    holder: String,
}

impl AttemptGuard {
    pub fn holder(&self) -> &str {
        &self.holder
    }
}

impl Drop for AttemptGuard {
    fn drop(&mut self) {
        self.registry.release(&self.holder);
        debug!(holder = %self.holder, "attempt slot released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOLDER: &str = "rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh";

    #[test]
    fn second_claim_is_rejected_until_release() {
        let registry = AttemptRegistry::new();
        let guard = registry.acquire(HOLDER).unwrap();
        assert!(registry.is_active(HOLDER));
        assert!(matches!(
            registry.acquire(HOLDER),
            Err(AttestError::AttemptInProgress(_))
        ));

        drop(guard);
        assert!(!registry.is_active(HOLDER));
        assert!(registry.acquire(HOLDER).is_ok());
    }

    #[test]
    fn different_holders_do_not_conflict() {
        let registry = AttemptRegistry::new();
        let _a = registry.acquire(HOLDER).unwrap();
        assert!(registry.acquire("rPEPPER7kfTD9w2To4CQk6UCfuHM9c6GDY").is_ok());
    }

    #[tokio::test]
    async fn aborted_task_releases_slot() {
        let registry = AttemptRegistry::new();
        let task_registry = registry.clone();
        let handle = tokio::spawn(async move {
            let _guard = task_registry.acquire(HOLDER).unwrap();
            std::future::pending::<()>().await;
        });

        while !registry.is_active(HOLDER) {
            tokio::task::yield_now().await;
        }
        handle.abort();
        let _ = handle.await;
        assert!(!registry.is_active(HOLDER));
    }
}
