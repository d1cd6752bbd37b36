//! SPL token ledger adapter.
//!
//! A wallet may hold several token accounts for the same mint. Each one is a
//! balance record; merging moves every source balance into the target
//! account and closes the emptied sources, returning their rent to the
//! wallet.

mod instructions;

pub use instructions::{
    close_account, create_ata_idempotent, derive_ata, set_compute_unit_price, transfer,
};

use crate::client::{ExecutionResult, LedgerClient};
use crate::rpc::RpcProvider;
use crate::transaction::SolanaTransaction;
use crate::wallet::Wallet;
use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use clmm_rebalancer_domain::entities::BalanceRecord;
use solana_client::rpc_filter::{Memcmp, RpcFilterType};
use solana_program_pack::Pack;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signer;
use solana_sdk::transaction::Transaction;
use spl_token::state::Account as TokenAccount;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Ledger client backed by SPL token accounts.
pub struct TokenLedger {
    provider: Arc<RpcProvider>,
    wallet: Arc<Wallet>,
    /// Compute unit price attached to every transaction (micro-lamports).
    priority_fee_micro_lamports: u64,
}

impl TokenLedger {
    /// Creates a ledger client that signs with `wallet`.
    pub fn new(provider: Arc<RpcProvider>, wallet: Arc<Wallet>) -> Self {
        Self {
            provider,
            wallet,
            priority_fee_micro_lamports: 0,
        }
    }

    /// Sets the compute unit price paid by every transaction.
    #[must_use]
    pub fn with_priority_fee(mut self, micro_lamports: u64) -> Self {
        self.priority_fee_micro_lamports = micro_lamports;
        self
    }

    fn merge_instructions(
        &self,
        target: &BalanceRecord,
        sources: &[BalanceRecord],
    ) -> Result<Vec<solana_sdk::instruction::Instruction>> {
        let owner = self.wallet.pubkey();
        let target_account = parse_pubkey(&target.id)?;
        let mut instructions = Vec::with_capacity(sources.len() * 2);

        for source in sources {
            if source.asset != target.asset {
                bail!(
                    "cannot merge {} ({}) into {} ({})",
                    source.id,
                    source.asset,
                    target.id,
                    target.asset
                );
            }
            let source_account = parse_pubkey(&source.id)?;
            if source.amount > 0 {
                instructions.push(transfer(
                    &source_account,
                    &target_account,
                    &owner,
                    source.amount,
                )?);
            }
            instructions.push(close_account(&source_account, &owner, &owner)?);
        }
        Ok(instructions)
    }
}

#[async_trait]
impl LedgerClient for TokenLedger {
    type Transaction = SolanaTransaction;

    fn owner(&self) -> String {
        self.wallet.pubkey().to_string()
    }

    fn network(&self) -> String {
        self.provider.network().to_string()
    }

    async fn balance_records(&self, owner: &str, asset: &str) -> Result<Vec<BalanceRecord>> {
        let owner_key = parse_pubkey(owner)?;
        let mint = parse_pubkey(asset)?;
        let filters = vec![
            RpcFilterType::DataSize(TokenAccount::LEN as u64),
            RpcFilterType::Memcmp(Memcmp::new_raw_bytes(0, mint.to_bytes().to_vec())),
            RpcFilterType::Memcmp(Memcmp::new_raw_bytes(32, owner_key.to_bytes().to_vec())),
        ];
        let accounts = self
            .provider
            .get_program_accounts(&spl_token::id(), filters)
            .await?;

        let mut records = Vec::with_capacity(accounts.len());
        for (address, account) in accounts {
            match unpack_token_account(&account.data) {
                Ok(token) => records.push(BalanceRecord::new(
                    address.to_string(),
                    asset,
                    token.amount,
                )),
                Err(e) => warn!(account = %address, error = %e, "Skipping unreadable token account"),
            }
        }
        debug!(asset = asset, count = records.len(), "Fetched balance records");
        Ok(records)
    }

    async fn merge_balance_records(
        &self,
        target: &BalanceRecord,
        sources: &[BalanceRecord],
    ) -> Result<ExecutionResult> {
        info!(
            target = %target.id,
            asset = %target.asset,
            sources = sources.len(),
            "Merging balance records"
        );
        let instructions = self.merge_instructions(target, sources)?;
        self.execute(SolanaTransaction::new("merge_balance_records", instructions))
            .await
    }

    async fn execute(&self, transaction: SolanaTransaction) -> Result<ExecutionResult> {
        let payer = self.wallet.keypair();
        let mut instructions = Vec::with_capacity(transaction.instructions.len() + 1);
        if self.priority_fee_micro_lamports > 0 {
            instructions.push(set_compute_unit_price(self.priority_fee_micro_lamports));
        }
        instructions.extend(transaction.instructions);

        let recent_blockhash = self.provider.get_latest_blockhash().await?;

        // Signer trait objects are not Send; they must be gone before the next await.
        let signed = {
            let mut signers: Vec<&dyn Signer> = Vec::with_capacity(1 + transaction.signers.len());
            signers.push(payer);
            for signer in &transaction.signers {
                signers.push(signer);
            }
            Transaction::new_signed_with_payer(
                &instructions,
                Some(&payer.pubkey()),
                &signers,
                recent_blockhash,
            )
        };
        let expected_signature = signed.signatures.first().map(ToString::to_string);

        debug!(label = transaction.label, "Sending transaction...");

        let signature = match self.provider.send_and_confirm_transaction(&signed).await {
            Ok(signature) => signature,
            Err(e) => {
                warn!(label = transaction.label, error = %e, "Transaction submission failed");
                return Ok(ExecutionResult::failure(
                    expected_signature,
                    format!("{e:#}"),
                ));
            }
        };

        let result = match self.provider.get_signature_status(&signature).await? {
            Some(Ok(())) => {
                info!(label = transaction.label, signature = %signature, "Transaction confirmed");
                ExecutionResult::success(signature.to_string(), transaction.creates)
            }
            Some(Err(e)) => ExecutionResult::failure(Some(signature.to_string()), e),
            None => ExecutionResult::failure(
                Some(signature.to_string()),
                "ledger reported no execution status",
            ),
        };
        Ok(result)
    }
}

/// Decodes an SPL token account.
pub fn unpack_token_account(data: &[u8]) -> Result<TokenAccount> {
    TokenAccount::unpack(data).map_err(|e| anyhow!("Failed to decode token account: {e}"))
}

pub(crate) fn parse_pubkey(address: &str) -> Result<Pubkey> {
    Pubkey::from_str(address).with_context(|| format!("Invalid address '{address}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::Network;
    use solana_sdk::signature::Keypair;

    fn ledger() -> TokenLedger {
        let provider = Arc::new(RpcProvider::new(Network::Localnet));
        TokenLedger::new(provider, Arc::new(Wallet::new(Keypair::new())))
    }

    #[test]
    fn test_merge_instructions_transfer_and_close() {
        let ledger = ledger();
        let mint = Pubkey::new_unique().to_string();
        let target = BalanceRecord::new(Pubkey::new_unique().to_string(), &mint, 100);
        let sources = vec![
            BalanceRecord::new(Pubkey::new_unique().to_string(), &mint, 10),
            BalanceRecord::new(Pubkey::new_unique().to_string(), &mint, 0),
        ];

        let ixs = ledger.merge_instructions(&target, &sources).unwrap();
        // One transfer + close for the funded source, close only for the empty one.
        assert_eq!(ixs.len(), 3);
        assert_eq!(ixs[0].data[0], 3);
        assert_eq!(ixs[1].data, vec![9]);
        assert_eq!(ixs[2].data, vec![9]);
    }

    #[test]
    fn test_merge_rejects_mixed_assets() {
        let ledger = ledger();
        let target = BalanceRecord::new(Pubkey::new_unique().to_string(), "mint-a", 100);
        let sources = vec![BalanceRecord::new(
            Pubkey::new_unique().to_string(),
            "mint-b",
            10,
        )];
        assert!(ledger.merge_instructions(&target, &sources).is_err());
    }

    fn assert_send<T: Send>(_: &T) {}

    #[test]
    fn test_execute_future_is_send() {
        let ledger = ledger();
        let future = ledger.execute(SolanaTransaction::new("noop", Vec::new()));
        assert_send(&future);
    }

    #[test]
    fn test_unpack_token_account() {
        let account = TokenAccount {
            mint: Pubkey::new_unique(),
            owner: Pubkey::new_unique(),
            amount: 42,
            state: spl_token::state::AccountState::Initialized,
            ..TokenAccount::default()
        };
        let mut data = vec![0u8; TokenAccount::LEN];
        TokenAccount::pack(account, &mut data).unwrap();

        let decoded = unpack_token_account(&data).unwrap();
        assert_eq!(decoded.mint, account.mint);
        assert_eq!(decoded.owner, account.owner);
        assert_eq!(decoded.amount, 42);
        assert!(unpack_token_account(&data[..40]).is_err());
    }

    #[test]
    fn test_owner_and_network() {
        let ledger = ledger();
        assert_eq!(ledger.network(), "localnet");
        assert!(parse_pubkey(&ledger.owner()).is_ok());
    }
}
