//! Latest known block number per chain
//!
//! Block numbers are the polling clock. Every forward move is broadcast so the
//! tick scheduler can run one reconciliation pass per observation.

use crate::types::ChainId;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::debug;

/// Capacity of the block update channel; slow consumers see `Lagged`
const BLOCK_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockUpdate {
    pub chain_id: ChainId,
    pub block_number: u64,
}

#[derive(Debug)]
pub struct BlockTracker {
    latest: DashMap<ChainId, u64>,
    updates: broadcast::Sender<BlockUpdate>,
}

impl Default for BlockTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockTracker {
    pub fn new() -> Self {
        let (updates, _) = broadcast::channel(BLOCK_CHANNEL_CAPACITY);
        Self {
            latest: DashMap::new(),
            updates,
        }
    }

    pub fn latest(&self, chain_id: ChainId) -> Option<u64> {
        self.latest.get(&chain_id).map(|b| *b)
    }

    /// Record an observed block number. Only forward moves are applied and
    /// published; returns whether the latest block advanced.
    pub fn update(&self, chain_id: ChainId, block_number: u64) -> bool {
        let advanced = match self.latest.entry(chain_id) {
            Entry::Occupied(mut current) => {
                if block_number > *current.get() {
                    current.insert(block_number);
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(block_number);
                true
            }
        };

        if advanced {
            debug!("chain {} -> block {}", chain_id, block_number);
            // No receivers is fine (scheduler not started yet)
            let _ = self.updates.send(BlockUpdate {
                chain_id,
                block_number,
            });
        }
        advanced
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BlockUpdate> {
        self.updates.subscribe()
    }
}
