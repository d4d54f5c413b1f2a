//! Ledger module containing the account state machine and the token contract

pub mod account;
pub mod core;
pub mod policy;
pub mod transaction;

pub use account::*;
pub use self::core::*;
pub use transaction::*;
