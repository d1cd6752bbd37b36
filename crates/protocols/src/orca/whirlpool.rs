use anyhow::{Context, Result};
use borsh::BorshDeserialize;
use solana_sdk::pubkey::Pubkey;

/// Orca Whirlpool program ID (mainnet).
pub const WHIRLPOOL_PROGRAM_ID: &str = "whirLbMiicVdio4qvUfM5KAg6Ct8VwpYzGff3uctyCc";

/// Number of ticks stored in one tick array.
pub const TICK_ARRAY_SIZE: i32 = 88;

/// Reward slots per Whirlpool.
pub const NUM_REWARDS: usize = 3;

/// One emission slot of a Whirlpool.
#[derive(BorshDeserialize, Debug, Clone)]
pub struct WhirlpoolRewardInfo {
    pub mint: [u8; 32],
    pub vault: [u8; 32],
    pub authority: [u8; 32],
    pub emissions_per_second_x64: u128,
    pub growth_global_x64: u128,
}

impl WhirlpoolRewardInfo {
    /// A slot is in use once a reward mint has been set.
    pub fn is_initialized(&self) -> bool {
        self.mint != [0u8; 32]
    }

    pub fn mint(&self) -> Pubkey {
        Pubkey::new_from_array(self.mint)
    }

    pub fn vault(&self) -> Pubkey {
        Pubkey::new_from_array(self.vault)
    }
}

#[derive(BorshDeserialize, Debug, Clone)]
pub struct Whirlpool {
    pub discriminator: [u8; 8],
    pub whirlpools_config: [u8; 32],
    pub whirlpool_bump: [u8; 1],
    pub tick_spacing: u16,
    pub tick_spacing_seed: [u8; 2],
    pub fee_rate: u16,
    pub protocol_fee_rate: u16,
    pub liquidity: u128,
    pub sqrt_price: u128,
    pub tick_current_index: i32,
    pub protocol_fee_owed_a: u64,
    pub protocol_fee_owed_b: u64,
    pub token_mint_a: [u8; 32],
    pub token_vault_a: [u8; 32],
    pub fee_growth_global_a: u128,
    pub token_mint_b: [u8; 32],
    pub token_vault_b: [u8; 32],
    pub fee_growth_global_b: u128,
    pub reward_last_updated_timestamp: u64,
    pub reward_infos: [WhirlpoolRewardInfo; NUM_REWARDS],
}

impl Whirlpool {
    /// Decodes a Whirlpool account.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut cursor = data;
        Self::deserialize(&mut cursor).context("Failed to decode Whirlpool account")
    }

    pub fn mint_a(&self) -> Pubkey {
        Pubkey::new_from_array(self.token_mint_a)
    }

    pub fn mint_b(&self) -> Pubkey {
        Pubkey::new_from_array(self.token_mint_b)
    }

    pub fn vault_a(&self) -> Pubkey {
        Pubkey::new_from_array(self.token_vault_a)
    }

    pub fn vault_b(&self) -> Pubkey {
        Pubkey::new_from_array(self.token_vault_b)
    }

    /// Initialized reward slots with their index.
    pub fn active_rewards(&self) -> impl Iterator<Item = (u8, &WhirlpoolRewardInfo)> {
        (0u8..)
            .zip(self.reward_infos.iter())
            .filter(|(_, reward)| reward.is_initialized())
    }
}

// Leading fields of a Whirlpool position account.
#[derive(BorshDeserialize, Debug, Clone)]
pub struct WhirlpoolPosition {
    pub discriminator: [u8; 8],
    pub whirlpool: [u8; 32],
    pub position_mint: [u8; 32],
    pub liquidity: u128,
    pub tick_lower_index: i32,
    pub tick_upper_index: i32,
}

impl WhirlpoolPosition {
    /// Decodes a position account.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut cursor = data;
        Self::deserialize(&mut cursor).context("Failed to decode Whirlpool position")
    }

    pub fn whirlpool(&self) -> Pubkey {
        Pubkey::new_from_array(self.whirlpool)
    }

    pub fn position_mint(&self) -> Pubkey {
        Pubkey::new_from_array(self.position_mint)
    }
}

/// Derives the position PDA for a position mint.
pub fn derive_position(program_id: &Pubkey, position_mint: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[b"position", position_mint.as_ref()], program_id)
}

/// First tick of the tick array holding `tick`.
pub fn tick_array_start_index(tick: i32, tick_spacing: i32) -> i32 {
    let ticks_per_array = tick_spacing * TICK_ARRAY_SIZE;
    tick.div_euclid(ticks_per_array) * ticks_per_array
}

/// Derives the tick array PDA holding `tick`.
pub fn derive_tick_array(
    program_id: &Pubkey,
    whirlpool: &Pubkey,
    tick: i32,
    tick_spacing: i32,
) -> Pubkey {
    let start = tick_array_start_index(tick, tick_spacing).to_string();
    let (address, _bump) = Pubkey::find_program_address(
        &[b"tick_array", whirlpool.as_ref(), start.as_bytes()],
        program_id,
    );
    address
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_program_id() {
        assert!(Pubkey::from_str(WHIRLPOOL_PROGRAM_ID).is_ok());
    }

    #[test]
    fn test_tick_array_start_index() {
        assert_eq!(tick_array_start_index(0, 64), 0);
        assert_eq!(tick_array_start_index(5631, 64), 0);
        assert_eq!(tick_array_start_index(5632, 64), 5632);
        assert_eq!(tick_array_start_index(-1, 64), -5632);
    }

    #[test]
    fn test_parse_position() {
        let pool = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let mut data = vec![0u8; 216];
        data[8..40].copy_from_slice(pool.as_ref());
        data[40..72].copy_from_slice(mint.as_ref());
        data[72..88].copy_from_slice(&7u128.to_le_bytes());
        data[88..92].copy_from_slice(&(-128i32).to_le_bytes());
        data[92..96].copy_from_slice(&256i32.to_le_bytes());

        let position = WhirlpoolPosition::parse(&data).unwrap();
        assert_eq!(position.whirlpool(), pool);
        assert_eq!(position.position_mint(), mint);
        assert_eq!(position.liquidity, 7);
        assert_eq!(position.tick_lower_index, -128);
        assert_eq!(position.tick_upper_index, 256);
    }

    #[test]
    fn test_parse_whirlpool() {
        let mut data = vec![0u8; 653];
        // tick_spacing at 41, sqrt_price at 65, tick_current_index at 81
        data[41..43].copy_from_slice(&64u16.to_le_bytes());
        data[65..81].copy_from_slice(&(1u128 << 64).to_le_bytes());
        data[81..85].copy_from_slice(&(-30i32).to_le_bytes());

        let pool = Whirlpool::parse(&data).unwrap();
        assert_eq!(pool.tick_spacing, 64);
        assert_eq!(pool.sqrt_price, 1u128 << 64);
        assert_eq!(pool.tick_current_index, -30);
        assert_eq!(pool.active_rewards().count(), 0);
    }

    #[test]
    fn test_parse_whirlpool_rewards() {
        let reward_mint = Pubkey::new_unique();
        let reward_vault = Pubkey::new_unique();
        let mut data = vec![0u8; 653];
        // reward_infos start at 269, 128 bytes per slot
        let slot = 269 + 128;
        data[slot..slot + 32].copy_from_slice(reward_mint.as_ref());
        data[slot + 32..slot + 64].copy_from_slice(reward_vault.as_ref());

        let pool = Whirlpool::parse(&data).unwrap();
        let active: Vec<_> = pool.active_rewards().collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].0, 1);
        assert_eq!(active[0].1.mint(), reward_mint);
        assert_eq!(active[0].1.vault(), reward_vault);
    }
}
