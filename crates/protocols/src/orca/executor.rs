//! Whirlpool instruction builders.
//!
//! Provides the instructions needed to move liquidity on Orca Whirlpools:
//! - Open positions
//! - Increase/decrease liquidity
//! - Collect fees and rewards
//! - Close positions

use super::whirlpool::WHIRLPOOL_PROGRAM_ID;
use anyhow::{Context, Result};
use borsh::BorshSerialize;
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;

const OPEN_POSITION_DISCRIMINATOR: [u8; 8] = [0x87, 0x80, 0x2f, 0x4d, 0x0f, 0x98, 0xf0, 0x31];
const INCREASE_LIQUIDITY_DISCRIMINATOR: [u8; 8] = [0x2e, 0x9c, 0xf3, 0x76, 0x0d, 0xcd, 0xfb, 0xb2];
pub(crate) const DECREASE_LIQUIDITY_DISCRIMINATOR: [u8; 8] = [0xa0, 0x26, 0xd0, 0x6f, 0x68, 0x5b, 0x2c, 0x01];
pub(crate) const UPDATE_FEES_AND_REWARDS_DISCRIMINATOR: [u8; 8] = [0x9a, 0xe6, 0xfa, 0x0d, 0xec, 0xd1, 0x4b, 0xdf];
pub(crate) const COLLECT_FEES_DISCRIMINATOR: [u8; 8] = [0xa4, 0x98, 0xcf, 0x63, 0x1e, 0xba, 0x13, 0xb6];
pub(crate) const COLLECT_REWARD_DISCRIMINATOR: [u8; 8] = [0x46, 0x05, 0x84, 0x57, 0x56, 0xeb, 0xb1, 0x22];
pub(crate) const CLOSE_POSITION_DISCRIMINATOR: [u8; 8] = [0x7b, 0x86, 0x51, 0x00, 0x31, 0x44, 0x62, 0x62];

/// System program ID.
const SYSTEM_PROGRAM_ID: &str = "11111111111111111111111111111111";

#[derive(BorshSerialize)]
struct OpenPositionArgs {
    position_bump: u8,
    tick_lower_index: i32,
    tick_upper_index: i32,
}

#[derive(BorshSerialize)]
struct ModifyLiquidityArgs {
    liquidity_amount: u128,
    token_amount_a: u64,
    token_amount_b: u64,
}

/// Accounts shared by the liquidity instructions of one position.
#[derive(Debug, Clone)]
pub struct PositionAccounts {
    /// Whirlpool address.
    pub whirlpool: Pubkey,
    /// Position PDA.
    pub position: Pubkey,
    /// Position NFT mint.
    pub position_mint: Pubkey,
    /// Token account holding the position NFT.
    pub position_token_account: Pubkey,
    /// Position authority (the wallet).
    pub authority: Pubkey,
    /// Wallet token account for token A.
    pub owner_account_a: Pubkey,
    /// Wallet token account for token B.
    pub owner_account_b: Pubkey,
    /// Pool vault for token A.
    pub vault_a: Pubkey,
    /// Pool vault for token B.
    pub vault_b: Pubkey,
    /// Tick array holding the lower tick.
    pub tick_array_lower: Pubkey,
    /// Tick array holding the upper tick.
    pub tick_array_upper: Pubkey,
}

/// Builder for Orca Whirlpool instructions.
pub struct WhirlpoolInstructions {
    /// Whirlpool program ID.
    program_id: Pubkey,
    /// Token program ID.
    token_program: Pubkey,
    /// Associated token program ID.
    ata_program: Pubkey,
    /// System program ID.
    system_program: Pubkey,
}

impl WhirlpoolInstructions {
    /// Creates a builder for the mainnet program.
    pub fn new() -> Result<Self> {
        Ok(Self {
            program_id: Pubkey::from_str(WHIRLPOOL_PROGRAM_ID).context("Invalid program ID")?,
            token_program: spl_token::id(),
            ata_program: spl_associated_token_account::id(),
            system_program: Pubkey::from_str(SYSTEM_PROGRAM_ID)
                .context("Invalid system program ID")?,
        })
    }

    /// Whirlpool program ID.
    pub fn program_id(&self) -> &Pubkey {
        &self.program_id
    }

    /// Opens an empty position. `position_mint` must co-sign.
    pub fn open_position(
        &self,
        accounts: &PositionAccounts,
        position_bump: u8,
        tick_lower: i32,
        tick_upper: i32,
    ) -> Result<Instruction> {
        let data = encode(
            OPEN_POSITION_DISCRIMINATOR,
            &OpenPositionArgs {
                position_bump,
                tick_lower_index: tick_lower,
                tick_upper_index: tick_upper,
            },
        )?;

        Ok(Instruction {
            program_id: self.program_id,
            accounts: vec![
                AccountMeta::new(accounts.authority, true), // funder
                AccountMeta::new_readonly(accounts.authority, false), // owner
                AccountMeta::new(accounts.position, false),
                AccountMeta::new(accounts.position_mint, true),
                AccountMeta::new(accounts.position_token_account, false),
                AccountMeta::new_readonly(accounts.whirlpool, false),
                AccountMeta::new_readonly(self.token_program, false),
                AccountMeta::new_readonly(self.system_program, false),
                AccountMeta::new_readonly(solana_sdk::sysvar::rent::ID, false),
                AccountMeta::new_readonly(self.ata_program, false),
            ],
            data,
        })
    }

    /// Deposits up to the token maxima for `liquidity_amount`.
    pub fn increase_liquidity(
        &self,
        accounts: &PositionAccounts,
        liquidity_amount: u128,
        token_max_a: u64,
        token_max_b: u64,
    ) -> Result<Instruction> {
        let data = encode(
            INCREASE_LIQUIDITY_DISCRIMINATOR,
            &ModifyLiquidityArgs {
                liquidity_amount,
                token_amount_a: token_max_a,
                token_amount_b: token_max_b,
            },
        )?;
        Ok(self.modify_liquidity(accounts, data))
    }

    /// Withdraws `liquidity_amount`, requiring at least the token minima.
    pub fn decrease_liquidity(
        &self,
        accounts: &PositionAccounts,
        liquidity_amount: u128,
        token_min_a: u64,
        token_min_b: u64,
    ) -> Result<Instruction> {
        let data = encode(
            DECREASE_LIQUIDITY_DISCRIMINATOR,
            &ModifyLiquidityArgs {
                liquidity_amount,
                token_amount_a: token_min_a,
                token_amount_b: token_min_b,
            },
        )?;
        Ok(self.modify_liquidity(accounts, data))
    }

    /// Collects accrued fees into the wallet's token accounts.
    pub fn collect_fees(&self, accounts: &PositionAccounts) -> Instruction {
        Instruction {
            program_id: self.program_id,
            accounts: vec![
                AccountMeta::new_readonly(accounts.whirlpool, false),
                AccountMeta::new_readonly(accounts.authority, true),
                AccountMeta::new(accounts.position, false),
                AccountMeta::new_readonly(accounts.position_token_account, false),
                AccountMeta::new(accounts.owner_account_a, false),
                AccountMeta::new(accounts.vault_a, false),
                AccountMeta::new(accounts.owner_account_b, false),
                AccountMeta::new(accounts.vault_b, false),
                AccountMeta::new_readonly(self.token_program, false),
            ],
            data: COLLECT_FEES_DISCRIMINATOR.to_vec(),
        }
    }

    /// Brings the position's owed fees and rewards up to date.
    ///
    /// Only valid while the position holds liquidity.
    pub fn update_fees_and_rewards(&self, accounts: &PositionAccounts) -> Instruction {
        Instruction {
            program_id: self.program_id,
            accounts: vec![
                AccountMeta::new(accounts.whirlpool, false),
                AccountMeta::new(accounts.position, false),
                AccountMeta::new_readonly(accounts.tick_array_lower, false),
                AccountMeta::new_readonly(accounts.tick_array_upper, false),
            ],
            data: UPDATE_FEES_AND_REWARDS_DISCRIMINATOR.to_vec(),
        }
    }

    /// Collects the reward owed for one reward slot into `owner_account`.
    pub fn collect_reward(
        &self,
        accounts: &PositionAccounts,
        reward_index: u8,
        owner_account: &Pubkey,
        reward_vault: &Pubkey,
    ) -> Instruction {
        let mut data = COLLECT_REWARD_DISCRIMINATOR.to_vec();
        data.push(reward_index);
        Instruction {
            program_id: self.program_id,
            accounts: vec![
                AccountMeta::new_readonly(accounts.whirlpool, false),
                AccountMeta::new_readonly(accounts.authority, true),
                AccountMeta::new(accounts.position, false),
                AccountMeta::new_readonly(accounts.position_token_account, false),
                AccountMeta::new(*owner_account, false),
                AccountMeta::new(*reward_vault, false),
                AccountMeta::new_readonly(self.token_program, false),
            ],
            data,
        }
    }

    /// Closes an empty position and burns its NFT.
    pub fn close_position(&self, accounts: &PositionAccounts) -> Instruction {
        Instruction {
            program_id: self.program_id,
            accounts: vec![
                AccountMeta::new_readonly(accounts.authority, true),
                AccountMeta::new(accounts.authority, false), // receiver
                AccountMeta::new(accounts.position, false),
                AccountMeta::new(accounts.position_mint, false),
                AccountMeta::new(accounts.position_token_account, false),
                AccountMeta::new_readonly(self.token_program, false),
            ],
            data: CLOSE_POSITION_DISCRIMINATOR.to_vec(),
        }
    }

    fn modify_liquidity(&self, accounts: &PositionAccounts, data: Vec<u8>) -> Instruction {
        Instruction {
            program_id: self.program_id,
            accounts: vec![
                AccountMeta::new(accounts.whirlpool, false),
                AccountMeta::new_readonly(self.token_program, false),
                AccountMeta::new_readonly(accounts.authority, true),
                AccountMeta::new(accounts.position, false),
                AccountMeta::new_readonly(accounts.position_token_account, false),
                AccountMeta::new(accounts.owner_account_a, false),
                AccountMeta::new(accounts.owner_account_b, false),
                AccountMeta::new(accounts.vault_a, false),
                AccountMeta::new(accounts.vault_b, false),
                AccountMeta::new(accounts.tick_array_lower, false),
                AccountMeta::new(accounts.tick_array_upper, false),
            ],
            data,
        }
    }
}

fn encode<T: BorshSerialize>(discriminator: [u8; 8], args: &T) -> Result<Vec<u8>> {
    let mut data = discriminator.to_vec();
    args.serialize(&mut data)
        .context("Failed to encode instruction arguments")?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accounts() -> PositionAccounts {
        PositionAccounts {
            whirlpool: Pubkey::new_unique(),
            position: Pubkey::new_unique(),
            position_mint: Pubkey::new_unique(),
            position_token_account: Pubkey::new_unique(),
            authority: Pubkey::new_unique(),
            owner_account_a: Pubkey::new_unique(),
            owner_account_b: Pubkey::new_unique(),
            vault_a: Pubkey::new_unique(),
            vault_b: Pubkey::new_unique(),
            tick_array_lower: Pubkey::new_unique(),
            tick_array_upper: Pubkey::new_unique(),
        }
    }

    #[test]
    fn test_open_position_encoding() {
        let builder = WhirlpoolInstructions::new().unwrap();
        let ix = builder.open_position(&accounts(), 254, -128, 128).unwrap();

        assert_eq!(&ix.data[..8], &OPEN_POSITION_DISCRIMINATOR);
        assert_eq!(ix.data[8], 254);
        assert_eq!(&ix.data[9..13], &(-128i32).to_le_bytes());
        assert_eq!(&ix.data[13..17], &128i32.to_le_bytes());
        assert_eq!(ix.accounts.len(), 10);
        assert!(ix.accounts[3].is_signer);
    }

    #[test]
    fn test_decrease_liquidity_encoding() {
        let builder = WhirlpoolInstructions::new().unwrap();
        let ix = builder.decrease_liquidity(&accounts(), 1_000, 0, 0).unwrap();

        assert_eq!(ix.data.len(), 8 + 16 + 8 + 8);
        assert_eq!(&ix.data[8..24], &1_000u128.to_le_bytes());
        assert_eq!(ix.accounts.len(), 11);
    }

    #[test]
    fn test_collect_reward_encodes_index() {
        let builder = WhirlpoolInstructions::new().unwrap();
        let (owner_account, vault) = (Pubkey::new_unique(), Pubkey::new_unique());
        let ix = builder.collect_reward(&accounts(), 2, &owner_account, &vault);

        assert_eq!(&ix.data[..8], &COLLECT_REWARD_DISCRIMINATOR);
        assert_eq!(ix.data[8], 2);
        assert_eq!(ix.accounts[4].pubkey, owner_account);
        assert_eq!(ix.accounts[5].pubkey, vault);
        assert_eq!(ix.accounts[6].pubkey, spl_token::id());
    }

    #[test]
    fn test_close_position_requires_authority() {
        let builder = WhirlpoolInstructions::new().unwrap();
        let accounts = accounts();
        let ix = builder.close_position(&accounts);
        assert_eq!(ix.accounts[0].pubkey, accounts.authority);
        assert!(ix.accounts[0].is_signer);
    }
}
