//! Catalogue of contract operations

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::*;

/// How an operation reaches the ledger store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Invocation {
    /// Ordered and committed; may lose an optimistic-concurrency race
    Submit,
    /// Read-only query against current state
    Evaluate,
}

/// One contract operation per account transition or query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Operation {
    AddClient,
    GetTokens,
    PutTokens,
    DeleteClient,
    ClientExists,
    ContributeResource,
    ConsumeResource,
    GetAllTokens,
}

impl Operation {
    pub const ALL: [Operation; 8] = [
        Operation::AddClient,
        Operation::GetTokens,
        Operation::PutTokens,
        Operation::DeleteClient,
        Operation::ClientExists,
        Operation::ContributeResource,
        Operation::ConsumeResource,
        Operation::GetAllTokens,
    ];

    /// Function name used on the wire
    pub fn name(&self) -> &'static str {
        match self {
            Operation::AddClient => "AddClient",
            Operation::GetTokens => "GetTokens",
            Operation::PutTokens => "PutTokens",
            Operation::DeleteClient => "DeleteClient",
            Operation::ClientExists => "ClientExists",
            Operation::ContributeResource => "ContributeResource",
            Operation::ConsumeResource => "ConsumeResource",
            Operation::GetAllTokens => "GetAllTokens",
        }
    }

    pub fn from_name(name: &str) -> LedgerResult<Operation> {
        Operation::ALL
            .into_iter()
            .find(|op| op.name() == name)
            .ok_or_else(|| LedgerError::InvalidArgument(format!("Unknown function: {}", name)))
    }

    /// Number of string arguments the operation takes
    pub fn arity(&self) -> usize {
        match self {
            Operation::GetAllTokens => 0,
            Operation::GetTokens | Operation::DeleteClient | Operation::ClientExists => 1,
            Operation::AddClient
            | Operation::PutTokens
            | Operation::ContributeResource
            | Operation::ConsumeResource => 2,
        }
    }

    pub fn invocation(&self) -> Invocation {
        match self {
            Operation::GetTokens | Operation::ClientExists | Operation::GetAllTokens => {
                Invocation::Evaluate
            }
            _ => Invocation::Submit,
        }
    }

    /// Name of the event emitted when the operation commits
    pub fn event_name(&self) -> Option<&'static str> {
        match self.invocation() {
            Invocation::Submit => Some(self.name()),
            Invocation::Evaluate => None,
        }
    }

    /// Reject argument lists of the wrong length
    pub fn check_arity(&self, args: &[String]) -> LedgerResult<()> {
        if args.len() != self.arity() {
            return Err(LedgerError::InvalidArgument(format!(
                "{} expects {} argument(s), got {}",
                self.name(),
                self.arity(),
                args.len()
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_lookup() {
        for op in Operation::ALL {
            assert_eq!(Operation::from_name(op.name()).unwrap(), op);
        }
        assert!(matches!(
            Operation::from_name("Transfer"),
            Err(LedgerError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_reads_are_evaluated_and_silent() {
        for op in [
            Operation::GetTokens,
            Operation::ClientExists,
            Operation::GetAllTokens,
        ] {
            assert_eq!(op.invocation(), Invocation::Evaluate);
            assert_eq!(op.event_name(), None);
        }
        assert_eq!(
            Operation::ConsumeResource.event_name(),
            Some("ConsumeResource")
        );
    }

    #[test]
    fn test_arity_check() {
        let args = vec!["alice".to_string()];
        assert!(Operation::GetTokens.check_arity(&args).is_ok());
        assert!(Operation::PutTokens.check_arity(&args).is_err());
    }
}
