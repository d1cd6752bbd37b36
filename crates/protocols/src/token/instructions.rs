use anyhow::{Result, anyhow};
use solana_compute_budget_interface::ComputeBudgetInstruction;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use spl_associated_token_account::get_associated_token_address;

/// SPL token `Transfer` signed by a single `authority`.
pub fn transfer(
    source: &Pubkey,
    destination: &Pubkey,
    authority: &Pubkey,
    amount: u64,
) -> Result<Instruction> {
    spl_token::instruction::transfer(
        &spl_token::id(),
        source,
        destination,
        authority,
        &[],
        amount,
    )
    .map_err(|e| anyhow!("Failed to build token transfer: {e}"))
}

/// SPL token `CloseAccount`, returning rent to `destination`.
pub fn close_account(
    account: &Pubkey,
    destination: &Pubkey,
    owner: &Pubkey,
) -> Result<Instruction> {
    spl_token::instruction::close_account(&spl_token::id(), account, destination, owner, &[])
        .map_err(|e| anyhow!("Failed to build close account: {e}"))
}

/// Associated token account of `owner` for `mint`.
pub fn derive_ata(owner: &Pubkey, mint: &Pubkey) -> Pubkey {
    get_associated_token_address(owner, mint)
}

/// Creates the associated token account unless it already exists.
pub fn create_ata_idempotent(payer: &Pubkey, owner: &Pubkey, mint: &Pubkey) -> Instruction {
    spl_associated_token_account::instruction::create_associated_token_account_idempotent(
        payer,
        owner,
        mint,
        &spl_token::id(),
    )
}

pub fn set_compute_unit_price(micro_lamports: u64) -> Instruction {
    ComputeBudgetInstruction::set_compute_unit_price(micro_lamports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use spl_token::instruction::TokenInstruction;

    #[test]
    fn test_transfer_targets_token_program() {
        let (a, b, owner) = (Pubkey::new_unique(), Pubkey::new_unique(), Pubkey::new_unique());
        let ix = transfer(&a, &b, &owner, 500).unwrap();

        assert_eq!(ix.program_id, spl_token::id());
        assert_eq!(
            TokenInstruction::unpack(&ix.data).unwrap(),
            TokenInstruction::Transfer { amount: 500 }
        );
        assert!(ix.accounts[2].is_signer);
    }

    #[test]
    fn test_close_account_refunds_destination() {
        let (account, wallet) = (Pubkey::new_unique(), Pubkey::new_unique());
        let ix = close_account(&account, &wallet, &wallet).unwrap();

        assert_eq!(ix.accounts[0].pubkey, account);
        assert_eq!(ix.accounts[1].pubkey, wallet);
        assert_eq!(
            TokenInstruction::unpack(&ix.data).unwrap(),
            TokenInstruction::CloseAccount
        );
    }

    #[test]
    fn test_ata_matches_created_account() {
        let (owner, mint) = (Pubkey::new_unique(), Pubkey::new_unique());
        let ix = create_ata_idempotent(&owner, &owner, &mint);

        assert_eq!(ix.program_id, spl_associated_token_account::id());
        assert_eq!(ix.accounts[1].pubkey, derive_ata(&owner, &mint));
    }
}
