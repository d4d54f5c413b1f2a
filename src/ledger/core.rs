//! Token contract: the transaction-execution driver for account operations

use crate::ledger::account::{encode_balance, AccountState};
use crate::ledger::policy;
use crate::ledger::transaction::Operation;
use crate::traits::TransactionContext;
use crate::types::*;
use crate::utils::validation::{parse_amount, payload_length, validate_client_id};

/// Default name the contract is deployed under
pub const DEFAULT_CONTRACT_NAME: &str = "tokens";

/// Pure state transition of a mutating operation: `(state, id, args) -> state`
type Transition = fn(&AccountState, &str, &[String]) -> LedgerResult<AccountState>;

/// Read-only query against the transaction context
type Query = fn(&mut dyn TransactionContext, &[String]) -> LedgerResult<Vec<u8>>;

#[derive(Clone, Copy)]
enum Handler {
    Transition(Transition),
    Query(Query),
}

/// Every operation the contract answers, in one place
const OPERATIONS: [(Operation, Handler); 8] = [
    (Operation::AddClient, Handler::Transition(add_client)),
    (Operation::GetTokens, Handler::Query(get_tokens)),
    (Operation::PutTokens, Handler::Transition(put_tokens)),
    (Operation::DeleteClient, Handler::Transition(delete_client)),
    (Operation::ClientExists, Handler::Query(client_exists)),
    (
        Operation::ContributeResource,
        Handler::Transition(contribute_resource),
    ),
    (Operation::ConsumeResource, Handler::Transition(consume_resource)),
    (Operation::GetAllTokens, Handler::Query(get_all_tokens)),
];

/// Contract hosting the account state machine on the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenContract {
    name: String,
}

impl Default for TokenContract {
    fn default() -> Self {
        Self::new(DEFAULT_CONTRACT_NAME)
    }
}

impl TokenContract {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Execute one operation inside the transaction represented by `ctx`.
    ///
    /// Mutating operations read the key, run the pure transition, write or
    /// delete the key, attach the endorsement policy for the creator's
    /// organization and set the domain event. The returned bytes are the JSON
    /// encoding of the resulting value.
    pub fn invoke(
        &self,
        ctx: &mut dyn TransactionContext,
        function: &str,
        args: &[String],
    ) -> LedgerResult<Vec<u8>> {
        let op = Operation::from_name(function)?;
        op.check_arity(args)?;

        let handler = OPERATIONS
            .iter()
            .find(|(candidate, _)| *candidate == op)
            .map(|(_, handler)| *handler)
            .ok_or_else(|| LedgerError::InvalidArgument(format!("Unhandled function: {}", op)))?;

        match handler {
            Handler::Query(query) => query(ctx, args),
            Handler::Transition(transition) => self.apply(ctx, op, transition, args),
        }
    }

    fn apply(
        &self,
        ctx: &mut dyn TransactionContext,
        op: Operation,
        transition: Transition,
        args: &[String],
    ) -> LedgerResult<Vec<u8>> {
        let id = args[0].as_str();
        validate_client_id(id)?;

        let current = read_state(ctx, id)?;
        let next = transition(&current, id, args)?;

        let payload = match next {
            AccountState::Present(balance) => {
                policy::restrict_to_creator_org(ctx, id)?;
                ctx.put_state(id, encode_balance(balance))?;
                serde_json::to_vec(&balance)?
            }
            AccountState::Absent => {
                ctx.delete_state(id)?;
                serde_json::to_vec(&Option::<u64>::None)?
            }
        };

        if let Some(event) = op.event_name() {
            let event = ContractEvent::new(event, id, payload.clone(), ctx.tx_id());
            ctx.set_event(event)?;
        }

        tracing::debug!(
            tx_id = ctx.tx_id(),
            operation = %op,
            client = id,
            from = ?current,
            to = ?next,
            "account transition"
        );
        Ok(payload)
    }
}

fn read_state(ctx: &mut dyn TransactionContext, id: &str) -> LedgerResult<AccountState> {
    let stored = ctx.get_state(id)?;
    AccountState::from_stored(stored.as_deref())
}

fn add_client(state: &AccountState, id: &str, args: &[String]) -> LedgerResult<AccountState> {
    let init_amount = parse_amount(&args[1], "initAmount")?;
    state.add_client(id, init_amount)
}

fn put_tokens(state: &AccountState, id: &str, args: &[String]) -> LedgerResult<AccountState> {
    let new_amount = parse_amount(&args[1], "newAmount")?;
    state.put_tokens(id, new_amount)
}

fn delete_client(state: &AccountState, id: &str, _args: &[String]) -> LedgerResult<AccountState> {
    state.delete_client(id)
}

fn contribute_resource(
    state: &AccountState,
    id: &str,
    args: &[String],
) -> LedgerResult<AccountState> {
    state.contribute_resource(id, payload_length(&args[1]))
}

fn consume_resource(
    state: &AccountState,
    id: &str,
    args: &[String],
) -> LedgerResult<AccountState> {
    let required_length = parse_amount(&args[1], "requiredLength")?;
    state.consume_resource(id, required_length)
}

fn get_tokens(ctx: &mut dyn TransactionContext, args: &[String]) -> LedgerResult<Vec<u8>> {
    let id = args[0].as_str();
    let balance = read_state(ctx, id)?.balance(id)?;
    Ok(serde_json::to_vec(&balance)?)
}

fn client_exists(ctx: &mut dyn TransactionContext, args: &[String]) -> LedgerResult<Vec<u8>> {
    let exists = read_state(ctx, &args[0])?.exists();
    Ok(serde_json::to_vec(&exists)?)
}

fn get_all_tokens(ctx: &mut dyn TransactionContext, _args: &[String]) -> LedgerResult<Vec<u8>> {
    let mut accounts = ctx
        .get_state_by_range("", "")?
        .into_iter()
        .map(|(key, value)| -> LedgerResult<Account> {
            let balance = AccountState::from_stored(Some(value.as_slice()))?.balance(&key)?;
            Ok(Account::new(key, balance))
        })
        .collect::<LedgerResult<Vec<Account>>>()?;
    accounts.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(serde_json::to_vec(&accounts)?)
}
