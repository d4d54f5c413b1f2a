//! Commit-conflict retry policy

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::future::Future;

use crate::ledger::transaction::{Invocation, Operation};
use crate::types::*;

/// Attempts made for a retry-eligible operation, first try included
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;

/// Which submitted operations are replayed after losing an optimistic
/// concurrency race, and how many attempts each gets.
///
/// Replaying is safe for these operations because every attempt re-reads the
/// balance and recomputes the update from it. Business-rule failures and
/// every other ledger error are never retried.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_operations")]
    pub operations: BTreeSet<Operation>,
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_operations() -> BTreeSet<Operation> {
    [
        Operation::PutTokens,
        Operation::DeleteClient,
        Operation::ContributeResource,
        Operation::ConsumeResource,
    ]
    .into_iter()
    .collect()
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            operations: default_operations(),
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            operations: BTreeSet::new(),
        }
    }

    pub fn validate(&self) -> LedgerResult<()> {
        if self.max_attempts == 0 {
            return Err(LedgerError::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if let Some(op) = self
            .operations
            .iter()
            .find(|op| op.invocation() != Invocation::Submit)
        {
            return Err(LedgerError::Config(format!(
                "retry.operations lists read-only operation {}",
                op
            )));
        }
        Ok(())
    }

    pub fn is_eligible(&self, op: Operation) -> bool {
        op.invocation() == Invocation::Submit && self.operations.contains(&op)
    }

    /// Attempts `op` may make under this policy
    pub fn attempts_for(&self, op: Operation) -> u32 {
        if self.is_eligible(op) {
            self.max_attempts.max(1)
        } else {
            1
        }
    }

    /// Run `attempt` until it succeeds, fails with anything other than a
    /// commit conflict, or the attempt budget for `op` is spent. The last
    /// error is returned unchanged.
    pub async fn run<T, F, Fut>(&self, op: Operation, mut attempt: F) -> LedgerResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = LedgerResult<T>>,
    {
        let attempts = self.attempts_for(op);
        let mut n = 1;
        loop {
            match attempt().await {
                Ok(value) => {
                    if n > 1 {
                        tracing::debug!(operation = %op, attempt = n, "succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) if err.is_commit_conflict() && n < attempts => {
                    tracing::warn!(
                        operation = %op,
                        attempt = n,
                        max_attempts = attempts,
                        error = %err,
                        "commit conflict, retrying"
                    );
                    n += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
