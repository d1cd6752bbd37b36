//! Command Line Interface for the CLMM rebalancer.
use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use clmm_rebalancer_api::{ApiServer, AppState, ServerConfig, StatusSource};
use clmm_rebalancer_domain::math::calculate_optimal_range;
use clmm_rebalancer_execution::lifecycle::LifecycleTracker;
use clmm_rebalancer_execution::scheduler::RebalanceBot;
use clmm_rebalancer_execution::strategy::RebalanceOrchestrator;
use clmm_rebalancer_protocols::prelude::*;
use config::{BotArgs, BotConfig};
use dotenv::dotenv;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;

type Bot = RebalanceBot<WhirlpoolClient, TokenLedger>;

#[derive(Parser)]
#[command(name = "clmm-rebalancer")]
#[command(about = "Keeps a Whirlpool position centred on the current price", long_about = None)]
struct Cli {
    /// Log level or tracing filter directive
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the rebalance loop
    Run(BotArgs),
    /// Run a single check cycle and print the result
    Check(BotArgs),
    /// Print the range the calculator picks for a tick
    Range {
        /// Current tick
        #[arg(long, allow_negative_numbers = true)]
        tick: i32,

        /// Pool tick spacing
        #[arg(long)]
        spacing: i32,

        /// Total width of a centred range
        #[arg(long)]
        width: Option<i32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Commands::Run(args) => run(BotConfig::try_from(args)?).await,
        Commands::Check(args) => check(BotConfig::try_from(args)?).await,
        Commands::Range {
            tick,
            spacing,
            width,
        } => {
            let range = calculate_optimal_range(tick, spacing, width)?;
            println!("📐 Tick {tick}, spacing {spacing}: {range} (width {})", range.width());
            Ok(())
        }
    }
}

/// `RUST_LOG` wins over the configured level when set.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn build_bot(config: &BotConfig) -> Result<Arc<Bot>> {
    let wallet = Arc::new(Wallet::from_file(&config.wallet_path)?);
    let provider = Arc::new(RpcProvider::new(config.network.clone()));

    let protocol = Arc::new(WhirlpoolClient::new(
        Arc::clone(&provider),
        wallet.pubkey(),
    )?);
    let ledger = Arc::new(
        TokenLedger::new(provider, wallet).with_priority_fee(config.priority_fee_micro_lamports),
    );

    let orchestrator = RebalanceOrchestrator::new(
        config.rebalance.clone(),
        protocol,
        ledger,
        Arc::new(LifecycleTracker::new()),
    )?;
    Ok(Arc::new(RebalanceBot::new(
        Arc::new(orchestrator),
        config.check_interval,
    )))
}

async fn run(config: BotConfig) -> Result<()> {
    let bot = build_bot(&config)?;

    let api = config.api_port.map(|port| {
        let status: Arc<dyn StatusSource> = bot.clone();
        let state = AppState::new(status, Arc::clone(bot.orchestrator().lifecycle()));
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = ApiServer::new(ServerConfig::on_port(port), state);
        let handle = tokio::spawn(server.run(async move {
            let _ = shutdown_rx.await;
        }));
        (shutdown_tx, handle)
    });

    let signal_bot = Arc::clone(&bot);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received, finishing current cycle");
                signal_bot.stop();
            }
            Err(e) => error!(error = %e, "Failed to listen for shutdown signal"),
        }
    });

    bot.start().await;

    if let Some((shutdown_tx, handle)) = api {
        let _ = shutdown_tx.send(());
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(error = %e, "API server error"),
            Err(e) => error!(error = %e, "API server task failed"),
        }
    }
    Ok(())
}

async fn check(config: BotConfig) -> Result<()> {
    let bot = build_bot(&config)?;

    match bot.run_once().await {
        None => println!("✅ Position is inside its safety margin, no action needed"),
        Some(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.success {
                bail!(
                    "check cycle failed: {}",
                    result.error.unwrap_or_else(|| "unknown error".to_string())
                );
            }
        }
    }
    Ok(())
}
