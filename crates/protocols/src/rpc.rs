//! Thin wrapper over the nonblocking Solana RPC client.

use anyhow::{Context, Result, bail};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_account_decoder::{UiAccount, UiAccountEncoding};
use solana_client::rpc_config::{RpcAccountInfoConfig, RpcProgramAccountsConfig};
use solana_client::rpc_filter::RpcFilterType;
use solana_sdk::account::Account;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Maximum number of accounts per `getMultipleAccounts` call.
const MULTIPLE_ACCOUNTS_CHUNK: usize = 100;

/// Cluster the bot connects to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Network {
    /// Solana mainnet-beta.
    Mainnet,
    /// Solana devnet.
    Devnet,
    /// A local validator.
    Localnet,
    /// Any other RPC endpoint.
    Custom(String),
}

impl Network {
    /// RPC endpoint for this network.
    #[must_use]
    pub fn rpc_url(&self) -> &str {
        match self {
            Self::Mainnet => "https://api.mainnet-beta.solana.com",
            Self::Devnet => "https://api.devnet.solana.com",
            Self::Localnet => "http://127.0.0.1:8899",
            Self::Custom(url) => url,
        }
    }
}

impl FromStr for Network {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" | "mainnet-beta" => Ok(Self::Mainnet),
            "devnet" => Ok(Self::Devnet),
            "localnet" | "localhost" => Ok(Self::Localnet),
            url if url.starts_with("http://") || url.starts_with("https://") => {
                Ok(Self::Custom(s.to_string()))
            }
            other => bail!("unknown network '{other}'"),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mainnet => write!(f, "mainnet"),
            Self::Devnet => write!(f, "devnet"),
            Self::Localnet => write!(f, "localnet"),
            Self::Custom(url) => write!(f, "{url}"),
        }
    }
}

/// RPC provider shared by the protocol and ledger adapters.
pub struct RpcProvider {
    client: RpcClient,
    network: Network,
}

impl RpcProvider {
    /// Creates a provider for a network.
    #[must_use]
    pub fn new(network: Network) -> Self {
        let client = RpcClient::new(network.rpc_url().to_string());
        Self { client, network }
    }

    /// Network this provider talks to.
    #[must_use]
    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Fetches a single account.
    pub async fn get_account(&self, address: &Pubkey) -> Result<Account> {
        self.client
            .get_account(address)
            .await
            .with_context(|| format!("Failed to fetch account {address}"))
    }

    /// Fetches many accounts, chunking requests to the RPC limit.
    pub async fn get_multiple_accounts(&self, addresses: &[Pubkey]) -> Result<Vec<Option<Account>>> {
        let mut accounts = Vec::with_capacity(addresses.len());
        for chunk in addresses.chunks(MULTIPLE_ACCOUNTS_CHUNK) {
            let batch = self
                .client
                .get_multiple_accounts(chunk)
                .await
                .context("Failed to fetch multiple accounts")?;
            accounts.extend(batch);
        }
        Ok(accounts)
    }

    /// Fetches every account of `program` matching all `filters`.
    pub async fn get_program_accounts(
        &self,
        program: &Pubkey,
        filters: Vec<RpcFilterType>,
    ) -> Result<Vec<(Pubkey, Account)>> {
        let config = RpcProgramAccountsConfig {
            filters: Some(filters),
            account_config: RpcAccountInfoConfig {
                encoding: Some(UiAccountEncoding::Base64),
                ..RpcAccountInfoConfig::default()
            },
            ..RpcProgramAccountsConfig::default()
        };
        let ui_accounts = self
            .client
            .get_program_ui_accounts_with_config(program, config)
            .await
            .with_context(|| format!("Failed to query accounts of program {program}"))?;
        let accounts = decode_program_accounts(ui_accounts);
        debug!(program = %program, count = accounts.len(), "Fetched program accounts");
        Ok(accounts)
    }

    /// Gets a recent blockhash.
    pub async fn get_latest_blockhash(&self) -> Result<Hash> {
        self.client
            .get_latest_blockhash()
            .await
            .context("Failed to get recent blockhash")
    }

    /// Sends a transaction and waits for confirmation.
    pub async fn send_and_confirm_transaction(&self, transaction: &Transaction) -> Result<Signature> {
        self.client
            .send_and_confirm_transaction(transaction)
            .await
            .context("Failed to send transaction")
    }

    /// Reads the execution status of a confirmed signature.
    ///
    /// `None` means the cluster reported no status for it.
    pub async fn get_signature_status(&self, signature: &Signature) -> Result<Option<Result<(), String>>> {
        let status = self
            .client
            .get_signature_status(signature)
            .await
            .with_context(|| format!("Failed to get status of {signature}"))?;
        Ok(status.map(|s| s.map_err(|e| e.to_string())))
    }
}

fn decode_program_accounts(ui_accounts: Vec<(Pubkey, UiAccount)>) -> Vec<(Pubkey, Account)> {
    let mut accounts = Vec::with_capacity(ui_accounts.len());
    for (address, ui_account) in ui_accounts {
        match ui_account.decode::<Account>() {
            Some(account) => accounts.push((address, account)),
            None => warn!(account = %address, "Skipping undecodable program account"),
        }
    }
    accounts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_from_str() {
        assert_eq!("mainnet".parse::<Network>().unwrap(), Network::Mainnet);
        assert_eq!("Devnet".parse::<Network>().unwrap(), Network::Devnet);
        assert_eq!(
            "https://rpc.example.com".parse::<Network>().unwrap(),
            Network::Custom("https://rpc.example.com".to_string())
        );
        assert!("testnet-x".parse::<Network>().is_err());
    }

    #[test]
    fn test_network_rpc_url() {
        assert_eq!(Network::Devnet.rpc_url(), "https://api.devnet.solana.com");
        assert_eq!(Network::Mainnet.to_string(), "mainnet");
    }

    #[test]
    fn test_decode_program_accounts() {
        use solana_account_decoder::encode_ui_account;

        let address = Pubkey::new_unique();
        let account = Account {
            lamports: 2_039_280,
            data: vec![7u8; 165],
            owner: Pubkey::new_unique(),
            executable: false,
            rent_epoch: 0,
        };
        let ui_account = encode_ui_account(&address, &account, UiAccountEncoding::Base64, None, None);

        let decoded = decode_program_accounts(vec![(address, ui_account)]);
        assert_eq!(decoded, vec![(address, account)]);
    }
}
