//! Core types and data structures for the token ledger

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A single client's token balance, keyed by client identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique client identifier (the ledger key)
    pub id: String,
    /// Current token balance
    pub balance: u64,
}

impl Account {
    /// Create a new account view
    pub fn new(id: impl Into<String>, balance: u64) -> Self {
        Self {
            id: id.into(),
            balance,
        }
    }
}

/// Commit position of a ledger record.
///
/// Assigned by the ledger store when a transaction commits. Contract code never
/// reads or writes it; it only backs the optimistic-concurrency check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version {
    /// Block number the write was committed in
    pub block: u64,
    /// Position of the transaction within its block
    pub tx: u64,
}

impl Version {
    pub fn new(block: u64, tx: u64) -> Self {
        Self { block, tx }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.block, self.tx)
    }
}

/// Key-level endorsement requirement: any single member of any listed
/// organization may co-sign a mutation of the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndorsementPolicy {
    /// Organizations (MSP identifiers) allowed to endorse
    pub orgs: BTreeSet<String>,
}

impl EndorsementPolicy {
    /// Build a 1-of-N "member" policy over the given organizations
    pub fn any_member_of<I, S>(orgs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            orgs: orgs.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether a member of `org` satisfies this policy
    pub fn is_satisfied_by(&self, org: &str) -> bool {
        self.orgs.contains(org)
    }
}

/// The ledger store's representation of one key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub key: String,
    pub value: Vec<u8>,
    pub version: Version,
    /// Key-level endorsement policy, if one has been attached
    pub policy: Option<EndorsementPolicy>,
}

/// Domain event published when a mutating transaction commits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractEvent {
    /// Operation name (`AddClient`, `PutTokens`, ...)
    pub name: String,
    /// Client key the operation targeted
    pub key: String,
    /// JSON encoding of the resulting value
    pub payload: Vec<u8>,
    /// Transaction that emitted the event
    pub tx_id: String,
    pub timestamp: NaiveDateTime,
}

impl ContractEvent {
    pub fn new(
        name: impl Into<String>,
        key: impl Into<String>,
        payload: Vec<u8>,
        tx_id: &str,
    ) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            payload,
            tx_id: tx_id.to_string(),
            timestamp: chrono::Utc::now().naive_utc(),
        }
    }
}

/// Errors that can occur in the token ledger
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("Client {0} already exists")]
    AlreadyExists(String),
    #[error("Client {0} does not exist")]
    NotFound(String),
    #[error("Insufficient balance for client {id}: balance {balance}, cost {cost}")]
    InsufficientBalance { id: String, balance: u64, cost: u64 },
    #[error("MVCC read conflict in transaction {tx_id} on key {key}")]
    CommitConflict { tx_id: String, key: String },
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Endorsement policy failure on key {key}: org {org} may not endorse")]
    PolicyViolation { key: String, org: String },
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl LedgerError {
    /// True only for an optimistic-concurrency conflict reported at commit
    pub fn is_commit_conflict(&self) -> bool {
        matches!(self, LedgerError::CommitConflict { .. })
    }

    /// Deterministic domain rejections; replaying the same input fails again
    pub fn is_business_rule(&self) -> bool {
        matches!(
            self,
            LedgerError::AlreadyExists(_)
                | LedgerError::NotFound(_)
                | LedgerError::InsufficientBalance { .. }
        )
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
