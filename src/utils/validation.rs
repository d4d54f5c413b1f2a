//! Validation utilities for contract arguments

use crate::types::*;

/// Longest client identifier accepted as a ledger key
pub const MAX_CLIENT_ID_LEN: usize = 256;

/// Validate that a client ID is usable as a ledger key
pub fn validate_client_id(client_id: &str) -> LedgerResult<()> {
    if client_id.trim().is_empty() {
        return Err(LedgerError::InvalidArgument(
            "Client ID cannot be empty".to_string(),
        ));
    }

    if client_id.len() > MAX_CLIENT_ID_LEN {
        return Err(LedgerError::InvalidArgument(format!(
            "Client ID cannot exceed {} bytes",
            MAX_CLIENT_ID_LEN
        )));
    }

    // Composite-key namespace on the ledger
    if client_id.starts_with('\u{0}') {
        return Err(LedgerError::InvalidArgument(
            "Client ID cannot start with a null character".to_string(),
        ));
    }

    Ok(())
}

/// Parse a non-negative integer argument
pub fn parse_amount(value: &str, field: &str) -> LedgerResult<u64> {
    value.trim().parse::<u64>().map_err(|_| {
        LedgerError::InvalidArgument(format!(
            "{} must be a non-negative integer, got {:?}",
            field, value
        ))
    })
}

/// Length of a contributed resource, counted in characters
pub fn payload_length(data: &str) -> u64 {
    data.chars().count() as u64
}
