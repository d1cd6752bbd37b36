use solana_sdk::instruction::Instruction;
use solana_sdk::signature::Keypair;

/// Unsigned instruction set plus any extra signers it needs.
///
/// The wallet signs as fee payer when the transaction is executed; signers
/// listed here are added on top (a fresh position mint, for example).
pub struct SolanaTransaction {
    /// Short label used in logs.
    pub label: &'static str,
    /// Instructions in execution order.
    pub instructions: Vec<Instruction>,
    /// Additional required signers.
    pub signers: Vec<Keypair>,
    /// Addresses of accounts this transaction creates.
    pub creates: Vec<String>,
}

impl SolanaTransaction {
    /// Creates a transaction with no extra signers.
    #[must_use]
    pub fn new(label: &'static str, instructions: Vec<Instruction>) -> Self {
        Self {
            label,
            instructions,
            signers: Vec::new(),
            creates: Vec::new(),
        }
    }

    /// Adds a required signer.
    #[must_use]
    pub fn with_signer(mut self, signer: Keypair) -> Self {
        self.signers.push(signer);
        self
    }

    /// Records an account created by this transaction.
    #[must_use]
    pub fn creating(mut self, address: impl Into<String>) -> Self {
        self.creates.push(address.into());
        self
    }
}

impl std::fmt::Debug for SolanaTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolanaTransaction")
            .field("label", &self.label)
            .field("instructions", &self.instructions.len())
            .field("signers", &self.signers.len())
            .field("creates", &self.creates)
            .finish()
    }
}
