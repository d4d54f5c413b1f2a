//! Traits for the ledger store boundary

use async_trait::async_trait;

use crate::types::*;

/// In-transaction view of the ledger store handed to contract code.
///
/// Every call operates on the simulation of a single transaction: reads are
/// recorded in its read set and writes are buffered until the store commits.
/// Nothing written through this trait is visible to other transactions
/// unless the enclosing transaction commits.
pub trait TransactionContext {
    /// Identifier of the transaction being simulated
    fn tx_id(&self) -> &str;

    /// Organization (MSP identifier) of the submitting identity
    fn creator_org(&self) -> &str;

    /// Read the current value of a key
    fn get_state(&mut self, key: &str) -> LedgerResult<Option<Vec<u8>>>;

    /// Write a value to a key
    fn put_state(&mut self, key: &str, value: Vec<u8>) -> LedgerResult<()>;

    /// Remove a key
    fn delete_state(&mut self, key: &str) -> LedgerResult<()>;

    /// All present keys in `[start, end)`, ordered by key. Empty bounds are open.
    fn get_state_by_range(&mut self, start: &str, end: &str)
        -> LedgerResult<Vec<(String, Vec<u8>)>>;

    /// Replace the key-level endorsement policy of a key
    fn set_state_endorsement_policy(
        &mut self,
        key: &str,
        policy: EndorsementPolicy,
    ) -> LedgerResult<()>;

    /// Set the event published if this transaction commits (last call wins)
    fn set_event(&mut self, event: ContractEvent) -> LedgerResult<()>;
}

/// Connection to the ledger store as seen by the submission client
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Read-only invocation. Never ordered, never committed, no conflicts.
    async fn evaluate(&self, function: &str, args: &[String]) -> LedgerResult<Vec<u8>>;

    /// Mutating invocation. Blocks until the commit outcome is known; a stale
    /// read surfaces as [`LedgerError::CommitConflict`].
    async fn submit(&self, function: &str, args: &[String]) -> LedgerResult<Vec<u8>>;

    /// Release the connection
    async fn close(&self) -> LedgerResult<()>;
}
