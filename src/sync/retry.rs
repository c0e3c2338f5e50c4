//! Retry policy and per-operation attempt bookkeeping.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use crate::queue::OperationKind;

// == Retry Policy ==
/// How often a failing head-of-queue operation is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// `None` retries forever; `Some(n)` dead-letters after `n` failures
    pub max_attempts: Option<u32>,
    /// Pause imposed on a kind after a failed cycle
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn unbounded() -> Self {
        Self {
            max_attempts: None,
            backoff: Duration::ZERO,
        }
    }

    pub fn bounded(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: Some(max_attempts.max(1)),
            backoff,
        }
    }

    pub fn is_exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::unbounded()
    }
}

// == Attempt Ledger ==
/// Failure counts and backoff deadlines, kept outside the operations
/// themselves so queued operations stay immutable.
#[derive(Debug, Default)]
pub(crate) struct AttemptLedger {
    failures: HashMap<u64, u32>,
    not_before: HashMap<OperationKind, Instant>,
}

impl AttemptLedger {
    /// Records a failure for `id` and returns its failure count.
    pub(crate) fn record_failure(
        &mut self,
        kind: OperationKind,
        id: u64,
        policy: &RetryPolicy,
    ) -> u32 {
        let attempts = self.failures.entry(id).or_insert(0);
        *attempts += 1;
        if !policy.backoff.is_zero() {
            self.not_before.insert(kind, Instant::now() + policy.backoff);
        }
        *attempts
    }

    pub(crate) fn record_success(&mut self, kind: OperationKind, id: u64) {
        self.failures.remove(&id);
        self.not_before.remove(&kind);
    }

    pub(crate) fn forget(&mut self, id: u64) {
        self.failures.remove(&id);
    }

    #[cfg(test)]
    pub(crate) fn failures(&self, id: u64) -> u32 {
        self.failures.get(&id).copied().unwrap_or(0)
    }

    /// Remaining backoff for `kind`, if it is still paused.
    pub(crate) fn deferral(&self, kind: OperationKind) -> Option<Duration> {
        let deadline = self.not_before.get(&kind)?;
        let now = Instant::now();
        (*deadline > now).then(|| *deadline - now)
    }
}
