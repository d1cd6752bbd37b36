//! Operator settings.
//!
//! Every setting comes from a flag or its environment variable (a `.env`
//! file is loaded first). The parsed flags are turned into one validated
//! [`BotConfig`] before anything touches the network.

use clap::Args;
use clmm_rebalancer_domain::value_objects::TickRange;
use clmm_rebalancer_execution::config::{RangePolicy, RebalanceConfig, SizingPolicy};
use clmm_rebalancer_execution::error::RebalanceError;
use clmm_rebalancer_execution::retry::RetryPolicy;
use clmm_rebalancer_protocols::rpc::Network;
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::time::Duration;

/// Flags shared by `run` and `check`.
#[derive(Debug, Clone, Args)]
pub struct BotArgs {
    /// mainnet, devnet, localnet or an RPC URL
    #[arg(long, env = "NETWORK", default_value = "devnet")]
    pub network: String,

    /// Path to a JSON keypair file
    #[arg(long, env = "WALLET_PATH")]
    pub wallet_path: PathBuf,

    /// Whirlpool address
    #[arg(long, env = "POOL_ADDRESS")]
    pub pool_address: String,

    /// Position to manage; defaults to the wallet's first position in the pool
    #[arg(long, env = "POSITION_ID")]
    pub position_id: Option<String>,

    /// Seconds between checks
    #[arg(long, env = "CHECK_INTERVAL_SECS", default_value_t = 60)]
    pub check_interval_secs: u64,

    /// Boundary margin as a fraction of the range width
    #[arg(long, env = "REBALANCE_THRESHOLD", default_value = "0.05")]
    pub rebalance_threshold: Decimal,

    /// Fixed lower tick
    #[arg(long, env = "TICK_LOWER", allow_negative_numbers = true)]
    pub tick_lower: Option<i32>,

    /// Fixed upper tick
    #[arg(long, env = "TICK_UPPER", allow_negative_numbers = true)]
    pub tick_upper: Option<i32>,

    /// Total width in ticks of a range centred on the current tick
    #[arg(long, env = "RANGE_WIDTH")]
    pub range_width: Option<i32>,

    /// Fixed raw amount of token A to deposit
    #[arg(long, env = "AMOUNT_A")]
    pub amount_a: Option<u64>,

    /// Fixed raw amount of token B to deposit
    #[arg(long, env = "AMOUNT_B")]
    pub amount_b: Option<u64>,

    /// Fraction of the wallet balance to deposit when no fixed amounts are set
    #[arg(long, env = "BALANCE_FRACTION", default_value = "0.9")]
    pub balance_fraction: Decimal,

    /// Slippage tolerance in basis points
    #[arg(long, env = "SLIPPAGE_BPS", default_value_t = 100)]
    pub slippage_bps: u16,

    /// Compute unit price in micro-lamports
    #[arg(long, env = "PRIORITY_FEE_MICRO_LAMPORTS", default_value_t = 0)]
    pub priority_fee_micro_lamports: u64,

    /// Attempts per transaction
    #[arg(long, env = "RETRY_ATTEMPTS", default_value_t = 2)]
    pub retry_attempts: u32,

    /// Seconds between attempts and before each post-merge balance check
    #[arg(long, env = "RETRY_DELAY_SECS", default_value_t = 2)]
    pub retry_delay_secs: u64,

    /// Log the intended action without submitting transactions
    #[arg(long, env = "DRY_RUN")]
    pub dry_run: bool,

    /// Serve the status API on this port
    #[arg(long, env = "API_PORT")]
    pub api_port: Option<u16>,
}

/// Validated process configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Cluster to connect to.
    pub network: Network,
    /// Keypair file.
    pub wallet_path: PathBuf,
    /// Time between checks.
    pub check_interval: Duration,
    /// Compute unit price in micro-lamports.
    pub priority_fee_micro_lamports: u64,
    /// Status API port.
    pub api_port: Option<u16>,
    /// Orchestrator settings.
    pub rebalance: RebalanceConfig,
}

impl TryFrom<BotArgs> for BotConfig {
    type Error = RebalanceError;

    fn try_from(args: BotArgs) -> Result<Self, Self::Error> {
        let invalid = |msg: &str| RebalanceError::Configuration(msg.to_string());

        let network: Network = args
            .network
            .parse()
            .map_err(|e| RebalanceError::Configuration(format!("{e}")))?;

        if args.check_interval_secs == 0 {
            return Err(invalid("check interval must be positive"));
        }

        let range_policy = match (args.tick_lower, args.tick_upper, args.range_width) {
            (Some(_), Some(_), Some(_)) => {
                return Err(invalid("a fixed tick range and a range width are mutually exclusive"));
            }
            (Some(lower), Some(upper), None) => RangePolicy::Fixed(TickRange::new(lower, upper)?),
            (None, None, Some(width)) => RangePolicy::Centered { width },
            (None, None, None) => RangePolicy::Tightest,
            _ => return Err(invalid("a fixed tick range needs both TICK_LOWER and TICK_UPPER")),
        };

        let sizing = match (args.amount_a, args.amount_b) {
            (Some(amount_a), Some(amount_b)) => SizingPolicy::Fixed { amount_a, amount_b },
            (None, None) => SizingPolicy::BalanceFraction(args.balance_fraction),
            _ => return Err(invalid("fixed amounts need both AMOUNT_A and AMOUNT_B")),
        };

        let delay = Duration::from_secs(args.retry_delay_secs);
        let rebalance = RebalanceConfig {
            pool_id: args.pool_address,
            position_id: args.position_id,
            rebalance_threshold: args.rebalance_threshold,
            range_policy,
            sizing,
            slippage_bps: args.slippage_bps,
            retry: RetryPolicy {
                max_attempts: args.retry_attempts,
                delay,
            },
            settle_delay: delay,
            dry_run: args.dry_run,
        };
        rebalance.validate()?;

        Ok(Self {
            network,
            wallet_path: args.wallet_path,
            check_interval: Duration::from_secs(args.check_interval_secs),
            priority_fee_micro_lamports: args.priority_fee_micro_lamports,
            api_port: args.api_port,
            rebalance,
        })
    }
}
