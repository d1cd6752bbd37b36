//! Wallet loading.

use anyhow::{Context, Result, anyhow};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use std::path::Path;
use zeroize::Zeroize;

/// Signing wallet backed by a keypair.
pub struct Wallet {
    keypair: Keypair,
}

impl Wallet {
    /// Wraps an existing keypair.
    #[must_use]
    pub fn new(keypair: Keypair) -> Self {
        Self { keypair }
    }

    /// Loads a keypair from a JSON file holding a 64-byte array.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read keypair file {}", path.display()))?;
        let wallet = Self::from_json(&raw);
        raw.zeroize();
        wallet
    }

    /// Parses a keypair from its JSON byte-array form.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut bytes: Vec<u8> =
            serde_json::from_str(json).context("Keypair file is not a JSON byte array")?;
        let keypair =
            Keypair::try_from(bytes.as_slice()).map_err(|e| anyhow!("Invalid keypair: {e}"));
        bytes.zeroize();
        Ok(Self::new(keypair?))
    }

    /// Wallet address.
    #[must_use]
    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    /// Underlying keypair.
    #[must_use]
    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("pubkey", &self.pubkey())
            .finish_non_exhaustive()
    }
}
