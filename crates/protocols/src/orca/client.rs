//! Protocol client for Orca Whirlpools.

use super::executor::{PositionAccounts, WhirlpoolInstructions};
use super::whirlpool::{Whirlpool, WhirlpoolPosition, derive_position, derive_tick_array};
use crate::client::{AddLiquidityRequest, ProtocolClient, RemoveLiquidityRequest};
use crate::rpc::RpcProvider;
use crate::token::{create_ata_idempotent, derive_ata, parse_pubkey, unpack_token_account};
use crate::transaction::SolanaTransaction;
use anyhow::{Result, bail};
use async_trait::async_trait;
use clmm_rebalancer_domain::entities::{PoolSnapshot, PositionSnapshot};
use clmm_rebalancer_domain::math::concentrated_liquidity::get_liquidity_for_amounts;
use solana_client::rpc_filter::{Memcmp, RpcFilterType};
use solana_program_pack::Pack;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

const BPS_DENOMINATOR: u128 = 10_000;

/// Reads Whirlpool state and builds liquidity transactions for one wallet.
pub struct WhirlpoolClient {
    /// RPC provider for blockchain interaction.
    provider: Arc<RpcProvider>,
    /// Instruction builder.
    instructions: WhirlpoolInstructions,
    /// Wallet that owns and funds positions.
    owner: Pubkey,
}

impl WhirlpoolClient {
    /// Creates a client acting for `owner`.
    pub fn new(provider: Arc<RpcProvider>, owner: Pubkey) -> Result<Self> {
        Ok(Self {
            provider,
            instructions: WhirlpoolInstructions::new()?,
            owner,
        })
    }

    async fn fetch_whirlpool(&self, address: &Pubkey) -> Result<Whirlpool> {
        let account = self.provider.get_account(address).await?;
        if account.owner != *self.instructions.program_id() {
            bail!("account {address} is not a Whirlpool");
        }
        Whirlpool::parse(&account.data)
    }

    async fn fetch_position(&self, address: &Pubkey) -> Result<WhirlpoolPosition> {
        let account = self.provider.get_account(address).await?;
        if account.owner != *self.instructions.program_id() {
            bail!("account {address} is not a Whirlpool position");
        }
        WhirlpoolPosition::parse(&account.data)
    }

    fn snapshot(address: &Pubkey, pool: &Whirlpool) -> Result<PoolSnapshot> {
        let snapshot = PoolSnapshot::new(
            address.to_string(),
            pool.tick_current_index,
            pool.sqrt_price,
            i32::from(pool.tick_spacing),
            pool.mint_a().to_string(),
            pool.mint_b().to_string(),
        )?;
        Ok(snapshot)
    }

    /// Mints of the single-token accounts held by the wallet.
    async fn candidate_position_mints(&self, owner: &Pubkey) -> Result<Vec<Pubkey>> {
        let filters = vec![
            RpcFilterType::DataSize(spl_token::state::Account::LEN as u64),
            RpcFilterType::Memcmp(Memcmp::new_raw_bytes(32, owner.to_bytes().to_vec())),
        ];
        let accounts = self
            .provider
            .get_program_accounts(&spl_token::id(), filters)
            .await?;

        Ok(accounts
            .iter()
            .filter_map(|(_, account)| unpack_token_account(&account.data).ok())
            .filter(|token| token.amount == 1)
            .map(|token| token.mint)
            .collect())
    }

    #[allow(clippy::too_many_arguments)]
    fn position_accounts(
        &self,
        whirlpool: &Pubkey,
        pool: &Whirlpool,
        position: Pubkey,
        position_mint: Pubkey,
        owner_account_a: Pubkey,
        owner_account_b: Pubkey,
        tick_lower: i32,
        tick_upper: i32,
    ) -> Result<PositionAccounts> {
        let program_id = self.instructions.program_id();
        let spacing = i32::from(pool.tick_spacing);
        Ok(PositionAccounts {
            whirlpool: *whirlpool,
            position,
            position_mint,
            position_token_account: derive_ata(&self.owner, &position_mint),
            authority: self.owner,
            owner_account_a,
            owner_account_b,
            vault_a: pool.vault_a(),
            vault_b: pool.vault_b(),
            tick_array_lower: derive_tick_array(program_id, whirlpool, tick_lower, spacing),
            tick_array_upper: derive_tick_array(program_id, whirlpool, tick_upper, spacing),
        })
    }

    /// Withdraws everything from a position and closes it.
    ///
    /// Owed rewards must be collected before `close_position` accepts the
    /// position, so every initialized reward slot gets its own collect.
    fn remove_instructions(
        &self,
        pool: &Whirlpool,
        accounts: &PositionAccounts,
        request: &RemoveLiquidityRequest,
    ) -> Result<Vec<Instruction>> {
        let mut instructions = vec![
            create_ata_idempotent(&self.owner, &self.owner, &pool.mint_a()),
            create_ata_idempotent(&self.owner, &self.owner, &pool.mint_b()),
        ];
        if request.liquidity > 0 {
            instructions.push(self.instructions.update_fees_and_rewards(accounts));
            instructions.push(self.instructions.decrease_liquidity(
                accounts,
                request.liquidity,
                request.min_amount_a,
                request.min_amount_b,
            )?);
        }
        instructions.push(self.instructions.collect_fees(accounts));
        for (index, reward) in pool.active_rewards() {
            let reward_mint = reward.mint();
            instructions.push(create_ata_idempotent(&self.owner, &self.owner, &reward_mint));
            instructions.push(self.instructions.collect_reward(
                accounts,
                index,
                &derive_ata(&self.owner, &reward_mint),
                &reward.vault(),
            ));
        }
        instructions.push(self.instructions.close_position(accounts));
        Ok(instructions)
    }
}

#[async_trait]
impl ProtocolClient for WhirlpoolClient {
    type Transaction = SolanaTransaction;

    async fn pool_state(&self, pool_id: &str) -> Result<PoolSnapshot> {
        let address = parse_pubkey(pool_id)?;
        let pool = self.fetch_whirlpool(&address).await?;
        debug!(
            pool = %address,
            tick = pool.tick_current_index,
            tick_spacing = pool.tick_spacing,
            "Fetched pool state"
        );
        Self::snapshot(&address, &pool)
    }

    async fn positions(&self, owner: &str) -> Result<Vec<PositionSnapshot>> {
        let owner = parse_pubkey(owner)?;
        let program_id = *self.instructions.program_id();

        let position_keys: Vec<Pubkey> = self
            .candidate_position_mints(&owner)
            .await?
            .iter()
            .map(|mint| derive_position(&program_id, mint).0)
            .collect();
        let accounts = self.provider.get_multiple_accounts(&position_keys).await?;

        let mut positions = Vec::new();
        let mut current_ticks: HashMap<Pubkey, i32> = HashMap::new();

        for (address, account) in position_keys.iter().zip(accounts) {
            let Some(account) = account else { continue };
            if account.owner != program_id {
                continue;
            }
            let position = match WhirlpoolPosition::parse(&account.data) {
                Ok(position) => position,
                Err(e) => {
                    warn!(position = %address, error = %e, "Skipping unreadable position");
                    continue;
                }
            };

            let whirlpool = position.whirlpool();
            let current_tick = match current_ticks.get(&whirlpool) {
                Some(tick) => *tick,
                None => {
                    let tick = self.fetch_whirlpool(&whirlpool).await?.tick_current_index;
                    current_ticks.insert(whirlpool, tick);
                    tick
                }
            };

            positions.push(PositionSnapshot::observe(
                address.to_string(),
                whirlpool.to_string(),
                position.tick_lower_index,
                position.tick_upper_index,
                position.liquidity,
                current_tick,
            )?);
        }

        debug!(owner = %owner, count = positions.len(), "Fetched positions");
        Ok(positions)
    }

    async fn build_remove_liquidity(
        &self,
        request: &RemoveLiquidityRequest,
    ) -> Result<SolanaTransaction> {
        let position_key = parse_pubkey(&request.position_id)?;
        let whirlpool_key = parse_pubkey(&request.pool_id)?;

        let position = self.fetch_position(&position_key).await?;
        if position.whirlpool() != whirlpool_key {
            bail!(
                "position {} belongs to pool {}, not {}",
                position_key,
                position.whirlpool(),
                whirlpool_key
            );
        }
        let pool = self.fetch_whirlpool(&whirlpool_key).await?;

        let accounts = self.position_accounts(
            &whirlpool_key,
            &pool,
            position_key,
            position.position_mint(),
            derive_ata(&self.owner, &pool.mint_a()),
            derive_ata(&self.owner, &pool.mint_b()),
            position.tick_lower_index,
            position.tick_upper_index,
        )?;
        let instructions = self.remove_instructions(&pool, &accounts, request)?;

        info!(
            position = %position_key,
            liquidity = request.liquidity,
            rewards = pool.active_rewards().count(),
            "Built remove-liquidity transaction"
        );
        Ok(SolanaTransaction::new("remove_liquidity", instructions))
    }

    async fn build_add_liquidity(&self, request: &AddLiquidityRequest) -> Result<SolanaTransaction> {
        let whirlpool_key = parse_pubkey(&request.pool_id)?;
        let pool = self.fetch_whirlpool(&whirlpool_key).await?;

        if request.input_a.asset != pool.mint_a().to_string()
            || request.input_b.asset != pool.mint_b().to_string()
        {
            bail!("input balance records do not match the pool's mints");
        }

        let (max_a, max_b) = request.amounts.maxima();
        let keep = BPS_DENOMINATOR.saturating_sub(u128::from(request.slippage_bps));
        let budget_a = (u128::from(max_a) * keep / BPS_DENOMINATOR) as u64;
        let budget_b = (u128::from(max_b) * keep / BPS_DENOMINATOR) as u64;

        let liquidity = get_liquidity_for_amounts(
            pool.tick_current_index,
            request.range.lower,
            request.range.upper,
            budget_a,
            budget_b,
        )?;
        if liquidity == 0 {
            bail!("token amounts ({max_a}, {max_b}) are too small to mint liquidity");
        }

        let position_mint = Keypair::new();
        let (position_key, position_bump) =
            derive_position(self.instructions.program_id(), &position_mint.pubkey());

        let accounts = self.position_accounts(
            &whirlpool_key,
            &pool,
            position_key,
            position_mint.pubkey(),
            parse_pubkey(&request.input_a.id)?,
            parse_pubkey(&request.input_b.id)?,
            request.range.lower,
            request.range.upper,
        )?;

        let instructions = vec![
            self.instructions.open_position(
                &accounts,
                position_bump,
                request.range.lower,
                request.range.upper,
            )?,
            self.instructions
                .increase_liquidity(&accounts, liquidity, max_a, max_b)?,
        ];

        info!(
            pool = %whirlpool_key,
            range = %request.range,
            liquidity = liquidity,
            position = %position_key,
            "Built add-liquidity transaction"
        );
        Ok(SolanaTransaction::new("add_liquidity", instructions)
            .with_signer(position_mint)
            .creating(position_key.to_string()))
    }
}
