//! # Token Ledger
//!
//! Per-client token balances kept on a shared, append-only ledger, traded for
//! resource contribution and consumption under optimistic concurrency control.
//!
//! ## Features
//!
//! - **Account state machine**: create, read, update and delete balances with a
//!   never-negative invariant
//! - **Resource pricing**: contributions earn and consumption costs
//!   `ceil(length / 10)` tokens
//! - **Endorsement policies**: every created or updated key is restricted to the
//!   submitting organization
//! - **Conflict-aware submission**: writes that lose an MVCC race are replayed
//!   from a fresh read, bounded by an explicit retry policy
//! - **Gateway abstraction**: trait-based ledger store boundary with an
//!   in-memory implementation for tests and local runs
//!
//! ## Quick Start
//!
//! ```rust
//! use token_ledger::{ClientConfig, MemoryLedger, TokenClient};
//!
//! # async fn run() -> token_ledger::LedgerResult<()> {
//! let ledger = MemoryLedger::new();
//! let config = ClientConfig::default();
//! let client = TokenClient::new(&config, ledger.connect(&config)?)?;
//!
//! client.add_client("Hospital 1", 100).await?;
//! client.contribute_resource("Hospital 1", "23 characters of data!!").await?;
//! assert_eq!(client.get_tokens("Hospital 1").await?, 103);
//! client.close().await
//! # }
//! ```

pub mod client;
pub mod ledger;
pub mod logging;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use client::*;
pub use ledger::*;
pub use traits::*;
pub use types::*;
pub use utils::{MemoryGateway, MemoryLedger};
