//! In-memory collaborators for unit tests.

use anyhow::{Result, bail};
use async_trait::async_trait;
use clmm_rebalancer_domain::entities::{BalanceRecord, PoolSnapshot, PositionSnapshot};
use clmm_rebalancer_protocols::client::{
    AddLiquidityRequest, ExecutionResult, LedgerClient, ProtocolClient, RemoveLiquidityRequest,
};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

pub(crate) const POOL: &str = "pool";
pub(crate) const MINT_A: &str = "mint-a";
pub(crate) const MINT_B: &str = "mint-b";
pub(crate) const NEW_POSITION: &str = "pos-new";

/// Position snapshot flagged in range; readers re-derive the flag anyway.
pub(crate) fn position(
    id: &str,
    pool: &str,
    tick_lower: i32,
    tick_upper: i32,
    liquidity: u128,
) -> PositionSnapshot {
    PositionSnapshot {
        position_id: id.to_string(),
        pool_id: pool.to_string(),
        tick_lower,
        tick_upper,
        liquidity,
        in_range: true,
    }
}

/// Transactions built by [`FakeProtocol`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FakeTransaction {
    Remove(RemoveLiquidityRequest),
    Add(AddLiquidityRequest),
}

struct ProtocolState {
    pool: PoolSnapshot,
    positions: Vec<PositionSnapshot>,
    fail_pool_reads: bool,
    built: Vec<FakeTransaction>,
}

pub(crate) struct FakeProtocol {
    state: Mutex<ProtocolState>,
}

impl FakeProtocol {
    pub(crate) fn new(current_tick: i32, tick_spacing: i32) -> Self {
        let pool = PoolSnapshot::new(POOL, current_tick, 1 << 64, tick_spacing, MINT_A, MINT_B)
            .unwrap();
        Self {
            state: Mutex::new(ProtocolState {
                pool,
                positions: Vec::new(),
                fail_pool_reads: false,
                built: Vec::new(),
            }),
        }
    }

    pub(crate) fn add_position(&self, position: PositionSnapshot) {
        self.state.lock().unwrap().positions.push(position);
    }

    /// Drops a position, as a committed removal does on chain.
    pub(crate) fn remove_position(&self, position_id: &str) {
        self.state
            .lock()
            .unwrap()
            .positions
            .retain(|p| p.position_id != position_id);
    }

    pub(crate) fn fail_pool_reads(&self, fail: bool) {
        self.state.lock().unwrap().fail_pool_reads = fail;
    }

    pub(crate) fn built(&self) -> Vec<FakeTransaction> {
        self.state.lock().unwrap().built.clone()
    }
}

#[async_trait]
impl ProtocolClient for FakeProtocol {
    type Transaction = FakeTransaction;

    async fn pool_state(&self, pool_id: &str) -> Result<PoolSnapshot> {
        let state = self.state.lock().unwrap();
        if state.fail_pool_reads {
            bail!("rpc unavailable");
        }
        if state.pool.pool_id != pool_id {
            bail!("pool {pool_id} not found");
        }
        Ok(state.pool.clone())
    }

    async fn positions(&self, _owner: &str) -> Result<Vec<PositionSnapshot>> {
        Ok(self.state.lock().unwrap().positions.clone())
    }

    async fn build_remove_liquidity(
        &self,
        request: &RemoveLiquidityRequest,
    ) -> Result<FakeTransaction> {
        let tx = FakeTransaction::Remove(request.clone());
        self.state.lock().unwrap().built.push(tx.clone());
        Ok(tx)
    }

    async fn build_add_liquidity(&self, request: &AddLiquidityRequest) -> Result<FakeTransaction> {
        let tx = FakeTransaction::Add(request.clone());
        self.state.lock().unwrap().built.push(tx.clone());
        Ok(tx)
    }
}

struct LedgerState {
    records: HashMap<String, Vec<BalanceRecord>>,
    balance_queries: HashMap<String, u32>,
    merges: Vec<(String, Vec<String>)>,
    merge_effective: bool,
    fail_merges: bool,
    scripted: VecDeque<ExecutionResult>,
    executed: Vec<FakeTransaction>,
}

pub(crate) struct FakeLedger {
    state: Mutex<LedgerState>,
}

impl FakeLedger {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(LedgerState {
                records: HashMap::new(),
                balance_queries: HashMap::new(),
                merges: Vec::new(),
                merge_effective: true,
                fail_merges: false,
                scripted: VecDeque::new(),
                executed: Vec::new(),
            }),
        }
    }

    /// Ledger holding one record per pool asset.
    pub(crate) fn funded() -> Self {
        let ledger = Self::new();
        ledger.set_records(MINT_A, &[("a-1", 1_000)]);
        ledger.set_records(MINT_B, &[("b-1", 2_000)]);
        ledger
    }

    pub(crate) fn set_records(&self, asset: &str, records: &[(&str, u64)]) {
        let records = records
            .iter()
            .map(|(id, amount)| BalanceRecord::new(*id, asset, *amount))
            .collect();
        self.state
            .lock()
            .unwrap()
            .records
            .insert(asset.to_string(), records);
    }

    pub(crate) fn set_merge_effective(&self, effective: bool) {
        self.state.lock().unwrap().merge_effective = effective;
    }

    pub(crate) fn fail_merges(&self, fail: bool) {
        self.state.lock().unwrap().fail_merges = fail;
    }

    /// Queues outcomes for the next `execute` calls. Unscripted calls succeed.
    pub(crate) fn script(&self, results: Vec<ExecutionResult>) {
        self.state.lock().unwrap().scripted.extend(results);
    }

    pub(crate) fn merges(&self) -> Vec<(String, Vec<String>)> {
        self.state.lock().unwrap().merges.clone()
    }

    pub(crate) fn executed(&self) -> Vec<FakeTransaction> {
        self.state.lock().unwrap().executed.clone()
    }

    pub(crate) fn balance_queries(&self, asset: &str) -> u32 {
        self.state
            .lock()
            .unwrap()
            .balance_queries
            .get(asset)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl LedgerClient for FakeLedger {
    type Transaction = FakeTransaction;

    fn owner(&self) -> String {
        "owner".to_string()
    }

    fn network(&self) -> String {
        "localnet".to_string()
    }

    async fn balance_records(&self, _owner: &str, asset: &str) -> Result<Vec<BalanceRecord>> {
        let mut state = self.state.lock().unwrap();
        *state.balance_queries.entry(asset.to_string()).or_default() += 1;
        Ok(state.records.get(asset).cloned().unwrap_or_default())
    }

    async fn merge_balance_records(
        &self,
        target: &BalanceRecord,
        sources: &[BalanceRecord],
    ) -> Result<ExecutionResult> {
        let mut state = self.state.lock().unwrap();
        if state.fail_merges {
            return Ok(ExecutionResult::failure(
                Some("merge-sig".to_string()),
                "insufficient gas",
            ));
        }
        state.merges.push((
            target.id.clone(),
            sources.iter().map(|r| r.id.clone()).collect(),
        ));

        if state.merge_effective {
            let moved: u64 = sources.iter().map(|r| r.amount).sum();
            let merged = BalanceRecord::new(target.id.clone(), &target.asset, target.amount + moved);
            state.records.insert(target.asset.clone(), vec![merged]);
        }
        Ok(ExecutionResult::success("merge-sig", Vec::new()))
    }

    async fn execute(&self, transaction: FakeTransaction) -> Result<ExecutionResult> {
        let mut state = self.state.lock().unwrap();
        state.executed.push(transaction.clone());
        let n = state.executed.len();

        if let Some(result) = state.scripted.pop_front() {
            return Ok(result);
        }
        let created = match transaction {
            FakeTransaction::Add(_) => vec![NEW_POSITION.to_string()],
            FakeTransaction::Remove(_) => Vec::new(),
        };
        Ok(ExecutionResult::success(format!("sig-{n}"), created))
    }
}
