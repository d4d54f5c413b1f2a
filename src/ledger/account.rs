//! Account state machine
//!
//! Pure decision logic: given the observed state of a client key and an
//! operation, compute the next state or reject the operation. No I/O happens
//! here; the contract driver reads the state, calls into this module and
//! applies the result.

use crate::types::*;

/// Number of payload units that cost (or earn) one token
pub const RESOURCE_UNIT: u64 = 10;

/// Token cost of a resource of the given length: `ceil(length / 10)`
pub fn resource_cost(length: u64) -> u64 {
    length.div_ceil(RESOURCE_UNIT)
}

/// Observed state of a client key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountState {
    /// No record for the key
    Absent,
    /// Record present with its current balance
    Present(u64),
}

impl AccountState {
    /// Decode the stored value of a key
    pub fn from_stored(value: Option<&[u8]>) -> LedgerResult<Self> {
        match value {
            None => Ok(AccountState::Absent),
            Some(bytes) => Ok(AccountState::Present(decode_balance(bytes)?)),
        }
    }

    pub fn exists(&self) -> bool {
        matches!(self, AccountState::Present(_))
    }

    /// Current balance, or `NotFound` if the account does not exist
    pub fn balance(&self, id: &str) -> LedgerResult<u64> {
        match self {
            AccountState::Present(balance) => Ok(*balance),
            AccountState::Absent => Err(LedgerError::NotFound(id.to_string())),
        }
    }

    /// `absent -> present(init_amount)`
    pub fn add_client(&self, id: &str, init_amount: u64) -> LedgerResult<AccountState> {
        match self {
            AccountState::Absent => Ok(AccountState::Present(init_amount)),
            AccountState::Present(_) => Err(LedgerError::AlreadyExists(id.to_string())),
        }
    }

    /// `present(_) -> present(new_amount)`
    pub fn put_tokens(&self, id: &str, new_amount: u64) -> LedgerResult<AccountState> {
        self.balance(id)?;
        Ok(AccountState::Present(new_amount))
    }

    /// `present(_) -> absent`
    pub fn delete_client(&self, id: &str) -> LedgerResult<AccountState> {
        self.balance(id)?;
        Ok(AccountState::Absent)
    }

    /// Earn `ceil(data_len / 10)` tokens
    pub fn contribute_resource(&self, id: &str, data_len: u64) -> LedgerResult<AccountState> {
        let balance = self.balance(id)?;
        let reward = resource_cost(data_len);
        let new_balance = balance.checked_add(reward).ok_or_else(|| {
            LedgerError::InvalidArgument(format!(
                "Balance of client {} would overflow: {} + {}",
                id, balance, reward
            ))
        })?;
        self.put_tokens(id, new_balance)
    }

    /// Spend `ceil(required_length / 10)` tokens, never going below zero
    pub fn consume_resource(&self, id: &str, required_length: u64) -> LedgerResult<AccountState> {
        let balance = self.balance(id)?;
        let cost = resource_cost(required_length);
        let new_balance =
            balance
                .checked_sub(cost)
                .ok_or_else(|| LedgerError::InsufficientBalance {
                    id: id.to_string(),
                    balance,
                    cost,
                })?;
        self.put_tokens(id, new_balance)
    }
}

/// Stored representation of a balance: its decimal string
pub fn encode_balance(balance: u64) -> Vec<u8> {
    balance.to_string().into_bytes()
}

pub fn decode_balance(bytes: &[u8]) -> LedgerResult<u64> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .ok_or_else(|| {
            LedgerError::Serialization(format!(
                "Stored balance is not a non-negative integer: {:?}",
                String::from_utf8_lossy(bytes)
            ))
        })
}
