//! Tick scheduling
//!
//! `BlockPoller` asks each chain's node for its head on an interval and feeds
//! the BlockTracker. `TickScheduler` listens for block advances and runs one
//! reconciliation tick per advance, never two at once.

use super::engine::ReconciliationEngine;
use crate::error::TrackerError;
use crate::services::NodeProvider;
use crate::store::{BlockTracker, BlockUpdate};
use crate::types::ChainId;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::{BroadcastStream, IntervalStream};
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

pub struct TickScheduler {
    engine: Arc<ReconciliationEngine>,
}

impl TickScheduler {
    pub fn new(engine: Arc<ReconciliationEngine>) -> Self {
        Self { engine }
    }

    /// Runs until `shutdown` flips to true or the block feed closes
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut updates = BroadcastStream::new(self.engine.blocks().subscribe());
        let mut suspended = false;
        info!("Tick scheduler started");

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                next = updates.next() => match next {
                    Some(Ok(BlockUpdate { chain_id, block_number })) => {
                        debug!("Block {} on chain {}", block_number, chain_id);
                        self.run_tick(chain_id, &mut suspended).await;
                    }
                    Some(Err(BroadcastStreamRecvError::Lagged(missed))) => {
                        // Missed updates: catch every chain up once
                        warn!("Tick scheduler lagged by {} block updates", missed);
                        for chain_id in self.engine.store().chains() {
                            self.run_tick(chain_id, &mut suspended).await;
                        }
                    }
                    None => break,
                },
            }
        }
        info!("Tick scheduler stopped");
    }

    async fn run_tick(&self, chain_id: ChainId, suspended: &mut bool) {
        match self.engine.tick(chain_id).await {
            Ok(report) => {
                if *suspended {
                    info!("Account connected - polling resumed");
                    *suspended = false;
                }
                if report.polled() > 0 {
                    debug!(
                        "Tick chain {}: {} reconciled, {} failed",
                        chain_id,
                        report.outcomes.len(),
                        report.failures.len()
                    );
                }
            }
            Err(TrackerError::NoActiveAccount) => {
                if !*suspended {
                    warn!("No active account - transaction polling suspended");
                    *suspended = true;
                }
            }
            Err(e) => warn!("Tick failed on chain {}: {}", chain_id, e),
        }
    }
}

pub struct BlockPoller {
    node: Arc<dyn NodeProvider>,
    blocks: Arc<BlockTracker>,
    chains: Vec<ChainId>,
    interval: Duration,
}

impl BlockPoller {
    pub fn new(node: Arc<dyn NodeProvider>, blocks: Arc<BlockTracker>, chains: Vec<ChainId>, interval_ms: u64) -> Self {
        Self {
            node,
            blocks,
            chains,
            interval: Duration::from_millis(interval_ms),
        }
    }

    /// Fetch every chain's head once. Returns how many chains advanced.
    pub async fn poll_once(&self) -> usize {
        let mut advanced = 0;
        for &chain_id in &self.chains {
            match self.node.get_block_number(chain_id).await {
                Ok(block_number) => {
                    if self.blocks.update(chain_id, block_number) {
                        advanced += 1;
                    }
                }
                Err(e) => warn!("Block number fetch failed on chain {}: {}", chain_id, e),
            }
        }
        advanced
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticks = IntervalStream::new(tokio::time::interval(self.interval));
        info!("Block poller started ({} chains, every {:?})", self.chains.len(), self.interval);

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                tick = ticks.next() => {
                    if tick.is_none() {
                        break;
                    }
                    self.poll_once().await;
                }
            }
        }
        info!("Block poller stopped");
    }
}
