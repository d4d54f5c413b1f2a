//! In-memory ledger store for testing and development
//!
//! Models the parts of a permissioned ledger the token contract depends on:
//! versioned world state, execute-then-validate transactions with MVCC read
//! checks, key-level endorsement policies and committed events. Ordering,
//! consensus and gossip are out of scope; commits are serialized by a lock.

use async_trait::async_trait;
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::client::ClientConfig;
use crate::ledger::account::encode_balance;
use crate::ledger::TokenContract;
use crate::traits::*;
use crate::types::*;

/// Default channel name of a fresh ledger
pub const DEFAULT_CHANNEL: &str = "mychannel";

/// Work run between endorsement and commit of the next submitted transaction
pub type Interleaved = Box<dyn FnOnce(&MemoryLedger) -> LedgerResult<()> + Send>;

/// Commit counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerStats {
    pub submitted: u64,
    pub committed: u64,
    pub mvcc_conflicts: u64,
    pub policy_failures: u64,
}

#[derive(Debug, Default)]
struct WorldState {
    records: BTreeMap<String, LedgerRecord>,
    height: u64,
    events: Vec<ContractEvent>,
    stats: LedgerStats,
}

/// In-memory ledger store
#[derive(Clone)]
pub struct MemoryLedger {
    state: Arc<RwLock<WorldState>>,
    interleaved: Arc<Mutex<VecDeque<Interleaved>>>,
    channel: String,
    contract: TokenContract,
}

impl fmt::Debug for MemoryLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryLedger")
            .field("channel", &self.channel)
            .field("contract", &self.contract)
            .finish_non_exhaustive()
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> LedgerError {
    LedgerError::Transport("ledger state lock poisoned".to_string())
}

impl MemoryLedger {
    /// Create an empty ledger with the token contract deployed on the default channel
    pub fn new() -> Self {
        Self::with_contract(DEFAULT_CHANNEL, TokenContract::default())
    }

    pub fn with_contract(channel: impl Into<String>, contract: TokenContract) -> Self {
        Self {
            state: Arc::new(RwLock::new(WorldState::default())),
            interleaved: Arc::new(Mutex::new(VecDeque::new())),
            channel: channel.into(),
            contract,
        }
    }

    fn read(&self) -> LedgerResult<RwLockReadGuard<'_, WorldState>> {
        self.state.read().map_err(poisoned)
    }

    fn write(&self) -> LedgerResult<RwLockWriteGuard<'_, WorldState>> {
        self.state.write().map_err(poisoned)
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn contract(&self) -> &TokenContract {
        &self.contract
    }

    /// Open a gateway connection for the identity named in `config`
    pub fn connect(&self, config: &ClientConfig) -> LedgerResult<MemoryGateway> {
        config.validate()?;
        if config.channel != self.channel {
            return Err(LedgerError::Config(format!(
                "Unknown channel {}",
                config.channel
            )));
        }
        if config.contract != self.contract.name() {
            return Err(LedgerError::Config(format!(
                "Contract {} is not deployed on channel {}",
                config.contract, self.channel
            )));
        }

        tracing::debug!(
            endpoint = %config.endpoint,
            identity = %config.identity.name,
            org = %config.identity.msp_id,
            channel = %self.channel,
            "gateway connected"
        );
        Ok(MemoryGateway {
            ledger: self.clone(),
            org: config.identity.msp_id.clone(),
            closed: AtomicBool::new(false),
        })
    }

    /// Start simulating a transaction on behalf of `creator_org`
    pub fn begin(&self, creator_org: impl Into<String>) -> TxSimulation {
        TxSimulation {
            ledger: self.clone(),
            tx_id: uuid::Uuid::new_v4().simple().to_string(),
            creator_org: creator_org.into(),
            reads: BTreeMap::new(),
            writes: BTreeMap::new(),
            policies: BTreeMap::new(),
            event: None,
        }
    }

    /// Validate a simulated transaction and apply it atomically.
    ///
    /// Key-level endorsement policies are checked first, then every recorded
    /// read version must still be current. On any failure nothing is applied.
    pub fn commit(&self, sim: TxSimulation) -> LedgerResult<Version> {
        let mut guard = self.write()?;
        let state = &mut *guard;

        let touched = sim.writes.keys().chain(sim.policies.keys());
        for key in touched {
            let policy = state.records.get(key).and_then(|r| r.policy.as_ref());
            if let Some(policy) = policy {
                if !policy.is_satisfied_by(&sim.creator_org) {
                    state.stats.policy_failures += 1;
                    return Err(LedgerError::PolicyViolation {
                        key: key.clone(),
                        org: sim.creator_org.clone(),
                    });
                }
            }
        }

        for (key, seen) in &sim.reads {
            let current = state.records.get(key).map(|r| r.version);
            if current != *seen {
                state.stats.mvcc_conflicts += 1;
                return Err(LedgerError::CommitConflict {
                    tx_id: sim.tx_id.clone(),
                    key: key.clone(),
                });
            }
        }

        state.height += 1;
        let version = Version::new(state.height, 0);

        for (key, value) in sim.writes {
            match value {
                Some(value) => {
                    let policy = state.records.get(&key).and_then(|r| r.policy.clone());
                    let record = LedgerRecord {
                        key: key.clone(),
                        value,
                        version,
                        policy,
                    };
                    state.records.insert(key, record);
                }
                None => {
                    state.records.remove(&key);
                }
            }
        }
        for (key, policy) in sim.policies {
            if let Some(record) = state.records.get_mut(&key) {
                record.policy = Some(policy);
            }
        }
        if let Some(event) = sim.event {
            state.events.push(event);
        }
        state.stats.committed += 1;

        Ok(version)
    }

    /// Write a balance directly as a committed block, bypassing contract
    /// logic and endorsement. Used for genesis data and test fixtures.
    pub fn seed(&self, key: &str, balance: u64) -> LedgerResult<Version> {
        let mut guard = self.write()?;
        let state = &mut *guard;
        state.height += 1;
        let version = Version::new(state.height, 0);
        let policy = state.records.get(key).and_then(|r| r.policy.clone());
        state.records.insert(
            key.to_string(),
            LedgerRecord {
                key: key.to_string(),
                value: encode_balance(balance),
                version,
                policy,
            },
        );
        Ok(version)
    }

    /// Queue work to run after the next submitted transaction is endorsed and
    /// before it is validated, emulating a competing transaction that is
    /// ordered first.
    pub fn interleave<F>(&self, work: F) -> LedgerResult<()>
    where
        F: FnOnce(&MemoryLedger) -> LedgerResult<()> + Send + 'static,
    {
        self.interleaved
            .lock()
            .map_err(poisoned)?
            .push_back(Box::new(work));
        Ok(())
    }

    fn run_interleaved(&self) -> LedgerResult<()> {
        let next = self.interleaved.lock().map_err(poisoned)?.pop_front();
        match next {
            Some(work) => work(self),
            None => Ok(()),
        }
    }

    pub fn record(&self, key: &str) -> LedgerResult<Option<LedgerRecord>> {
        Ok(self.read()?.records.get(key).cloned())
    }

    /// Events of committed transactions, in commit order
    pub fn events(&self) -> LedgerResult<Vec<ContractEvent>> {
        Ok(self.read()?.events.clone())
    }

    pub fn stats(&self) -> LedgerResult<LedgerStats> {
        Ok(self.read()?.stats)
    }

    pub fn height(&self) -> LedgerResult<u64> {
        Ok(self.read()?.height)
    }

    fn count_submitted(&self) -> LedgerResult<()> {
        self.write()?.stats.submitted += 1;
        Ok(())
    }
}

/// Read/write set of one transaction under simulation
pub struct TxSimulation {
    ledger: MemoryLedger,
    tx_id: String,
    creator_org: String,
    reads: BTreeMap<String, Option<Version>>,
    writes: BTreeMap<String, Option<Vec<u8>>>,
    policies: BTreeMap<String, EndorsementPolicy>,
    event: Option<ContractEvent>,
}

impl TxSimulation {
    /// True when the simulation buffered no writes or policy updates
    pub fn is_read_only(&self) -> bool {
        self.writes.is_empty() && self.policies.is_empty()
    }

    pub fn pending_policy(&self, key: &str) -> Option<&EndorsementPolicy> {
        self.policies.get(key)
    }

    pub fn pending_event(&self) -> Option<&ContractEvent> {
        self.event.as_ref()
    }
}

impl TransactionContext for TxSimulation {
    fn tx_id(&self) -> &str {
        &self.tx_id
    }

    fn creator_org(&self) -> &str {
        &self.creator_org
    }

    // Reads see committed state only, not this transaction's own writes.
    fn get_state(&mut self, key: &str) -> LedgerResult<Option<Vec<u8>>> {
        let state = self.ledger.read()?;
        let record = state.records.get(key);
        self.reads
            .entry(key.to_string())
            .or_insert_with(|| record.map(|r| r.version));
        Ok(record.map(|r| r.value.clone()))
    }

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> LedgerResult<()> {
        if key.is_empty() {
            return Err(LedgerError::InvalidArgument(
                "State key cannot be empty".to_string(),
            ));
        }
        self.writes.insert(key.to_string(), Some(value));
        Ok(())
    }

    fn delete_state(&mut self, key: &str) -> LedgerResult<()> {
        self.writes.insert(key.to_string(), None);
        self.policies.remove(key);
        Ok(())
    }

    fn get_state_by_range(
        &mut self,
        start: &str,
        end: &str,
    ) -> LedgerResult<Vec<(String, Vec<u8>)>> {
        let state = self.ledger.read()?;
        let results: Vec<(String, Vec<u8>)> = state
            .records
            .range(start.to_string()..)
            .take_while(|(key, _)| end.is_empty() || key.as_str() < end)
            .map(|(key, record)| {
                self.reads
                    .entry(key.clone())
                    .or_insert(Some(record.version));
                (key.clone(), record.value.clone())
            })
            .collect();
        Ok(results)
    }

    fn set_state_endorsement_policy(
        &mut self,
        key: &str,
        policy: EndorsementPolicy,
    ) -> LedgerResult<()> {
        self.policies.insert(key.to_string(), policy);
        Ok(())
    }

    fn set_event(&mut self, event: ContractEvent) -> LedgerResult<()> {
        self.event = Some(event);
        Ok(())
    }
}

/// Gateway connection to a [`MemoryLedger`] for one identity
#[derive(Debug)]
pub struct MemoryGateway {
    ledger: MemoryLedger,
    org: String,
    closed: AtomicBool,
}

impl MemoryGateway {
    pub fn org(&self) -> &str {
        &self.org
    }

    pub fn ledger(&self) -> &MemoryLedger {
        &self.ledger
    }

    fn ensure_open(&self) -> LedgerResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(LedgerError::Transport("gateway connection closed".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerGateway for MemoryGateway {
    async fn evaluate(&self, function: &str, args: &[String]) -> LedgerResult<Vec<u8>> {
        self.ensure_open()?;
        let mut sim = self.ledger.begin(self.org.clone());
        self.ledger.contract.invoke(&mut sim, function, args)
    }

    async fn submit(&self, function: &str, args: &[String]) -> LedgerResult<Vec<u8>> {
        self.ensure_open()?;
        self.ledger.count_submitted()?;
        let mut sim = self.ledger.begin(self.org.clone());
        let tx_id = sim.tx_id.clone();
        let result = self.ledger.contract.invoke(&mut sim, function, args)?;

        self.ledger.run_interleaved()?;

        match self.ledger.commit(sim) {
            Ok(version) => {
                tracing::info!(tx_id = %tx_id, function, %version, "transaction committed");
                Ok(result)
            }
            Err(err) => {
                tracing::debug!(tx_id = %tx_id, function, error = %err, "transaction invalidated");
                Err(err)
            }
        }
    }

    async fn close(&self) -> LedgerResult<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
