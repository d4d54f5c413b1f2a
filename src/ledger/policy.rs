//! Key-level endorsement policy setter

use crate::traits::TransactionContext;
use crate::types::*;

/// Replace the endorsement policy of `key` so that any single member of
/// `orgs` may co-sign its next mutation.
///
/// Errors abort the enclosing transaction; the policy and the mutation that
/// triggered it commit together or not at all.
pub fn set_endorsing_orgs<C, I, S>(ctx: &mut C, key: &str, orgs: I) -> LedgerResult<()>
where
    C: TransactionContext + ?Sized,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let policy = EndorsementPolicy::any_member_of(orgs);
    if policy.orgs.is_empty() {
        return Err(LedgerError::InvalidArgument(format!(
            "Endorsement policy for key {} must name at least one organization",
            key
        )));
    }
    if policy.orgs.iter().any(|org| org.trim().is_empty()) {
        return Err(LedgerError::InvalidArgument(
            "Organization identifier cannot be empty".to_string(),
        ));
    }

    tracing::trace!(key, orgs = ?policy.orgs, "setting key endorsement policy");
    ctx.set_state_endorsement_policy(key, policy)
}

/// Restrict `key` to the organization of the submitting identity
pub fn restrict_to_creator_org<C>(ctx: &mut C, key: &str) -> LedgerResult<()>
where
    C: TransactionContext + ?Sized,
{
    let org = ctx.creator_org().to_string();
    set_endorsing_orgs(ctx, key, [org])
}
