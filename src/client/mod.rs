//! Client side of the token ledger: configuration, retry policy and the
//! submission client

pub mod config;
pub mod retry;
pub mod submission;

pub use config::*;
pub use retry::*;
pub use submission::*;
