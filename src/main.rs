//! DCA Transaction Tracker
//!
//! Polls the node for receipts of submitted DCA transactions and reconciles
//! each one to confirmed, reverted or dropped.
//!
//! Subcommands:
//!   run    — block poller + tick scheduler until SIGINT/SIGTERM
//!   track  — add a submitted transaction to the snapshot (tracker stopped)
//!   list   — print tracked transactions from the snapshot
//!
//! Signals (run):
//!   kill -HUP $(pgrep dca-tx-tracker)   flush the snapshot to disk
//!
//! Usage:
//!   cargo run -- run
//!   cargo run -- --config /path/to/tracker.toml list --chain 10
//!
//! Author: AI-Generated
//! Created: 2026-10-17

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dca_tx_tracker::config::TrackerConfig;
use dca_tx_tracker::node::AlloyNode;
use dca_tx_tracker::notify::{DiscordSink, Explorers, FanoutSink, TracingSink};
use dca_tx_tracker::positions::PositionLedger;
use dca_tx_tracker::safe::SafeTxService;
use dca_tx_tracker::services::StaticAccount;
use dca_tx_tracker::store::{load_store, save_store, BlockTracker};
use dca_tx_tracker::tracker::{BlockPoller, LogDecoder, ReceiptFetcher, ReconciliationEngine, TickScheduler};
use dca_tx_tracker::types::{ChainId, TransactionKind, TransactionRecord, TxHash};
use futures::StreamExt;
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
use signal_hook_tokio::Signals;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "dca-tx-tracker")]
struct Args {
    /// Path to the TOML configuration
    #[arg(short, long, env = "TRACKER_CONFIG", default_value = "config/tracker.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Poll and reconcile pending transactions
    Run,
    /// Register a submitted transaction
    Track {
        #[arg(long)]
        chain: ChainId,
        #[arg(long)]
        hash: String,
        /// Sender (defaults to the configured wallet account)
        #[arg(long)]
        from: Option<String>,
        /// Transaction kind as JSON, e.g. '{"type":"TERMINATE_POSITION","data":{"id":"12"}}'
        #[arg(long)]
        kind: Option<String>,
    },
    /// Print tracked transactions
    List {
        #[arg(long)]
        chain: Option<ChainId>,
        /// Include confirmed transactions
        #[arg(long)]
        all: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = TrackerConfig::load(&args.config).context("Failed to load configuration")?;

    // Initialize logging
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.general.log_level)),
        )
        .init();

    match args.command {
        Command::Run => run(config).await,
        Command::Track { chain, hash, from, kind } => track(&config, chain, &hash, from, kind),
        Command::List { chain, all } => list(&config, chain, all),
    }
}

async fn run(config: TrackerConfig) -> Result<()> {
    info!("===========================================");
    info!("   DCA Transaction Tracker");
    info!("===========================================");

    let snapshot_path = PathBuf::from(&config.general.snapshot_file);
    let store = Arc::new(load_store(&snapshot_path).context("Failed to load transaction snapshot")?);
    info!("Snapshot: {} ({} transactions)", snapshot_path.display(), store.len());

    let mut node = AlloyNode::new();
    for chain in &config.chains {
        node.add_chain(chain.chain_id, &chain.rpc_url)
            .with_context(|| format!("Failed to configure chain {}", chain.name))?;
    }
    info!("Node endpoints for chains {:?}", node.chains());
    let node = Arc::new(node);

    let account = config.account()?;
    match account {
        Some(a) => info!("Wallet account: {:?}", a),
        None => warn!("No wallet account configured - polling suspended until one is set"),
    }

    let mut notifier = FanoutSink::new().with(Arc::new(TracingSink));
    match DiscordSink::from_env() {
        Some(discord) => {
            info!("Discord notifications: ENABLED");
            notifier = notifier.with(Arc::new(discord));
        }
        None => info!("Discord notifications: disabled (DISCORD_WEBHOOK not set)"),
    }

    let blocks = Arc::new(BlockTracker::new());
    let mut engine = ReconciliationEngine::new(
        Arc::clone(&store),
        Arc::clone(&blocks),
        ReceiptFetcher::new(node.clone(), Arc::new(StaticAccount::new(account))),
        Arc::new(PositionLedger::new()),
        Arc::new(notifier),
    )
    .with_decoder(LogDecoder::with_hubs(config.hubs()?))
    .with_explorers(Explorers::new(config.explorer_overrides()));

    if config.wallet.safe_app {
        let safe = SafeTxService::new(config.safe_endpoints());
        if safe.is_empty() {
            warn!("safe_app enabled but no chain has safe_tx_service - real hashes will not resolve");
        }
        engine = engine.with_safe(Arc::new(safe));
    }
    let engine = Arc::new(engine);
    engine.initialize().await;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = tokio::spawn(TickScheduler::new(Arc::clone(&engine)).run(shutdown_rx.clone()));
    let poller = tokio::spawn(
        BlockPoller::new(
            node,
            blocks,
            config.chain_ids(),
            config.general.block_poll_interval_ms,
        )
        .run(shutdown_rx),
    );

    let mut signals = Signals::new([SIGHUP, SIGINT, SIGTERM])?;
    let signals_handle = signals.handle();
    while let Some(sig) = signals.next().await {
        if sig == SIGHUP {
            info!("Received SIGHUP - flushing snapshot");
            if let Err(e) = save_store(&store, &snapshot_path) {
                error!("Snapshot flush failed: {}", e);
            }
            continue;
        }
        info!("Received signal {} - shutting down", sig);
        break;
    }
    signals_handle.close();

    let _ = shutdown_tx.send(true);
    let (scheduler_res, poller_res) = tokio::join!(scheduler, poller);
    if let Err(e) = scheduler_res {
        error!("Tick scheduler task failed: {}", e);
    }
    if let Err(e) = poller_res {
        error!("Block poller task failed: {}", e);
    }

    save_store(&store, &snapshot_path).context("Failed to save transaction snapshot")?;
    info!("Snapshot saved ({} transactions)", store.len());
    Ok(())
}

fn track(
    config: &TrackerConfig,
    chain_id: ChainId,
    hash: &str,
    from: Option<String>,
    kind: Option<String>,
) -> Result<()> {
    if config.chain(chain_id).is_none() {
        anyhow::bail!("Chain {} is not configured", chain_id);
    }
    let hash: TxHash = hash.parse().with_context(|| format!("Invalid transaction hash: {}", hash))?;
    let from = match from {
        Some(f) => f.parse().with_context(|| format!("Invalid sender: {}", f))?,
        None => config.account()?.context("No --from given and no wallet account configured")?,
    };
    let kind: TransactionKind = match kind {
        Some(json) => serde_json::from_str(&json).context("Invalid --kind JSON")?,
        None => TransactionKind::NoOp,
    };

    let snapshot_path = PathBuf::from(&config.general.snapshot_file);
    let store = load_store(&snapshot_path).context("Failed to load transaction snapshot")?;
    store.submit(TransactionRecord::new(hash, chain_id, from, kind))?;
    save_store(&store, &snapshot_path).context("Failed to save transaction snapshot")?;

    info!("Tracking {:#x} on chain {}", hash, chain_id);
    Ok(())
}

fn list(config: &TrackerConfig, chain: Option<ChainId>, all: bool) -> Result<()> {
    let store = load_store(&config.general.snapshot_file).context("Failed to load transaction snapshot")?;
    let chains = match chain {
        Some(c) => vec![c],
        None => store.chains(),
    };

    for chain_id in chains {
        let records = if all { store.list(chain_id) } else { store.list_pending(chain_id) };
        let name = config.chain(chain_id).map(|c| c.name.as_str()).unwrap_or("unknown");
        println!("Chain {} ({}): {} transactions", chain_id, name, records.len());
        for r in records {
            println!(
                "  {:#x}  {:<22} {:<9} retries={} last_checked={}",
                r.hash,
                r.kind.to_string(),
                r.status().to_string(),
                r.retries,
                r.last_checked_block_number
                    .map(|b| b.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            );
        }
    }
    Ok(())
}
