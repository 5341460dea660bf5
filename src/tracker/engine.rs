//! Reconciliation Engine
//!
//! One tick = one pass over a chain's pending records at the latest known
//! block. Per eligible record:
//!
//! ```text
//!     receipt, status != 0        → Confirmed  (decode, finalize, hooks, success notice)
//!     receipt, status == 0        → Reverted   (remove, rejection hook, error notice)
//!     no receipt, unknown tx      → retries > 2 ? Dropped : NotFoundRetrying (retries + 1)
//!     no receipt, known tx        → StillPending (checked at this block)
//! ```
//!
//! Records are reconciled concurrently within a tick; each record's
//! fetch → decode → store → notify runs in order. Ticks never overlap.
//!
//! Author: AI-Generated
//! Created: 2026-10-17

use super::decoder::LogDecoder;
use super::fetcher::{FetchOutcome, ReceiptFetcher};
use super::policy::should_poll;
use crate::error::{TrackerError, TrackerResult};
use crate::notify::{Explorers, Notification};
use crate::services::{NotificationSink, PositionService, SafeService};
use crate::store::{BlockTracker, TransactionStore};
use crate::types::{ChainId, DecodedIds, TransactionRecord, TxHash, TxReceipt};
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// A record is dropped once it has been missing this many times already
pub const MAX_NOT_FOUND_RETRIES: u32 = 2;

/// Result of reconciling one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Confirmed { block_number: u64, decoded: DecodedIds },
    Reverted { block_number: u64 },
    Dropped { retries: u32 },
    NotFoundRetrying { retries: u32 },
    StillPending,
    /// Record removed or finalized while the fetch was in flight
    Stale,
}

/// Summary of one tick
#[derive(Debug, Default)]
pub struct TickReport {
    pub chain_id: ChainId,
    pub block_number: Option<u64>,
    pub outcomes: Vec<(TxHash, Outcome)>,
    /// Per-transaction failures (record left untouched)
    pub failures: Vec<(TxHash, TrackerError)>,
}

impl TickReport {
    fn empty(chain_id: ChainId, block_number: Option<u64>) -> Self {
        Self {
            chain_id,
            block_number,
            ..Default::default()
        }
    }

    pub fn outcome(&self, hash: &TxHash) -> Option<&Outcome> {
        self.outcomes.iter().find(|(h, _)| h == hash).map(|(_, o)| o)
    }

    pub fn polled(&self) -> usize {
        self.outcomes.len() + self.failures.len()
    }
}

pub struct ReconciliationEngine {
    store: Arc<TransactionStore>,
    blocks: Arc<BlockTracker>,
    fetcher: ReceiptFetcher,
    decoder: LogDecoder,
    positions: Arc<dyn PositionService>,
    notifier: Arc<dyn NotificationSink>,
    safe: Option<Arc<dyn SafeService>>,
    explorers: Explorers,
    tick_guard: Mutex<()>,
}

impl ReconciliationEngine {
    pub fn new(
        store: Arc<TransactionStore>,
        blocks: Arc<BlockTracker>,
        fetcher: ReceiptFetcher,
        positions: Arc<dyn PositionService>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            store,
            blocks,
            fetcher,
            decoder: LogDecoder::new(),
            positions,
            notifier,
            safe: None,
            explorers: Explorers::default(),
            tick_guard: Mutex::new(()),
        }
    }

    pub fn with_decoder(mut self, decoder: LogDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    /// Running as a Safe app: resolve real on-chain hashes on confirmation
    pub fn with_safe(mut self, safe: Arc<dyn SafeService>) -> Self {
        self.safe = Some(safe);
        self
    }

    pub fn with_explorers(mut self, explorers: Explorers) -> Self {
        self.explorers = explorers;
        self
    }

    pub fn store(&self) -> &Arc<TransactionStore> {
        &self.store
    }

    pub fn blocks(&self) -> &Arc<BlockTracker> {
        &self.blocks
    }

    /// Register a newly submitted transaction
    pub async fn submit(&self, record: TransactionRecord) -> TrackerResult<()> {
        self.store.submit(record.clone())?;
        if let Err(e) = self.positions.set_pending_transaction(&record).await {
            warn!("set_pending_transaction failed for {:#x}: {}", record.hash, e);
        }
        Ok(())
    }

    /// Swap a pending transaction for its speed-up / cancel resubmission
    pub async fn replace(&self, old_hash: &TxHash, record: TransactionRecord) -> TrackerResult<TransactionRecord> {
        let old = self.store.replace(old_hash, record.clone())?;
        if let Err(e) = self.positions.set_pending_transaction(&record).await {
            warn!("set_pending_transaction failed for {:#x}: {}", record.hash, e);
        }
        Ok(old)
    }

    pub fn get_record(&self, hash: &TxHash, chain_id: ChainId) -> Option<TransactionRecord> {
        self.store.get(chain_id, hash)
    }

    pub fn list_pending(&self, chain_id: ChainId) -> Vec<TransactionRecord> {
        self.store.list_pending(chain_id)
    }

    /// Replay pending records into the position service (startup)
    pub async fn initialize(&self) -> usize {
        let pending = self.store.all_pending();
        for record in &pending {
            if let Err(e) = self.positions.set_pending_transaction(record).await {
                warn!("set_pending_transaction failed for {:#x}: {}", record.hash, e);
            }
        }
        info!("Initialized with {} pending transactions", pending.len());
        pending.len()
    }

    /// One reconciliation pass for `chain_id` at its latest known block.
    /// Fails only with `NoActiveAccount` (polling suspended).
    pub async fn tick(&self, chain_id: ChainId) -> TrackerResult<TickReport> {
        let _guard = self.tick_guard.lock().await;

        if !self.fetcher.has_account() {
            return Err(TrackerError::NoActiveAccount);
        }
        let block_number = match self.blocks.latest(chain_id) {
            Some(b) => b,
            None => return Ok(TickReport::empty(chain_id, None)),
        };

        let now = Utc::now();
        let eligible: Vec<TransactionRecord> = self
            .store
            .list_pending(chain_id)
            .into_iter()
            .filter(|r| should_poll(block_number, r, now))
            .collect();

        let mut report = TickReport::empty(chain_id, Some(block_number));
        if eligible.is_empty() {
            return Ok(report);
        }
        debug!(
            "Tick chain {} @ block {}: {} eligible transactions",
            chain_id,
            block_number,
            eligible.len()
        );

        let results = join_all(eligible.iter().map(|r| self.reconcile(r, block_number))).await;
        for (record, result) in eligible.iter().zip(results) {
            match result {
                Ok(outcome) => report.outcomes.push((record.hash, outcome)),
                Err(e) => {
                    error!("Failed to check transaction hash {:#x}: {}", record.hash, e);
                    report.failures.push((record.hash, e));
                }
            }
        }
        Ok(report)
    }

    async fn reconcile(&self, record: &TransactionRecord, block_number: u64) -> TrackerResult<Outcome> {
        let chain_id = record.chain_id;
        let fetched = self.fetcher.classify(record.hash, chain_id).await?;

        // The store may have moved on while we were waiting on the node
        let current = match self.store.get(chain_id, &record.hash) {
            Some(r) if r.receipt.is_none() => r,
            _ => {
                debug!("Discarding stale result for {:#x}", record.hash);
                return Ok(Outcome::Stale);
            }
        };

        match fetched {
            FetchOutcome::Mined(receipt) if receipt.is_success() => self.confirm(current, receipt).await,
            FetchOutcome::Mined(receipt) => {
                let block_number = receipt.block_number;
                let reverted = TrackerError::RevertedOnChain {
                    hash: current.hash,
                    block_number,
                };
                info!("{}", reverted);
                match self.reject(&current).await {
                    true => Ok(Outcome::Reverted { block_number }),
                    false => Ok(Outcome::Stale),
                }
            }
            FetchOutcome::NotFound if current.retries > MAX_NOT_FOUND_RETRIES => {
                let dropped = TrackerError::TransactionNotFound {
                    hash: current.hash,
                    chain_id,
                };
                warn!("{} after {} retries - dropping", dropped, current.retries);
                match self.reject(&current).await {
                    true => Ok(Outcome::Dropped {
                        retries: current.retries,
                    }),
                    false => Ok(Outcome::Stale),
                }
            }
            FetchOutcome::NotFound => match self.store.mark_not_found(chain_id, &current.hash, block_number) {
                Some(retries) => Ok(Outcome::NotFoundRetrying { retries }),
                None => Ok(Outcome::Stale),
            },
            FetchOutcome::Pending => match self.store.mark_checked(chain_id, &current.hash, block_number) {
                true => Ok(Outcome::StillPending),
                false => Ok(Outcome::Stale),
            },
        }
    }

    async fn confirm(&self, record: TransactionRecord, receipt: TxReceipt) -> TrackerResult<Outcome> {
        let chain_id = record.chain_id;
        let receipt_block = receipt.block_number;

        let decoded = match self.decoder.decode(&receipt.logs, chain_id, &record.kind) {
            Ok(ids) => ids,
            Err(e) => {
                warn!("{} for {} tx {:#x} - finalizing without ids", e, record.kind, record.hash);
                DecodedIds::None
            }
        };
        let kind = record.kind.with_decoded(&decoded);
        let real_safe_hash = self.resolve_safe_hash(record.hash, chain_id).await;

        let confirmed_time = Utc::now().timestamp_millis();
        if !self.store.finalize(
            chain_id,
            &record.hash,
            receipt,
            kind.clone(),
            real_safe_hash,
            confirmed_time,
        ) {
            debug!("{:#x} removed or finalized during decode - skipping", record.hash);
            return Ok(Outcome::Stale);
        }

        let mut finalized = record.with_kind(kind);
        finalized.real_safe_hash = real_safe_hash;
        finalized.confirmed_time = Some(confirmed_time);

        if let Err(e) = self.positions.handle_transaction(&finalized).await {
            warn!("handle_transaction failed for {:#x}: {}", finalized.hash, e);
        }
        if let Err(e) = self
            .notifier
            .notify(Notification::confirmed(&finalized, &self.explorers))
            .await
        {
            warn!("Success notification failed for {:#x}: {}", finalized.hash, e);
        }

        // Receipt can arrive before the block poll catches up
        if self.blocks.latest(chain_id).map_or(true, |latest| receipt_block > latest) {
            self.blocks.update(chain_id, receipt_block);
        }

        info!(
            "Confirmed {} tx {:#x} in block {} (chain {})",
            finalized.kind, finalized.hash, receipt_block, chain_id
        );
        Ok(Outcome::Confirmed {
            block_number: receipt_block,
            decoded,
        })
    }

    /// Remove a dropped / reverted record and tell the user. Returns false if
    /// the record was already gone.
    async fn reject(&self, record: &TransactionRecord) -> bool {
        let removed = match self.store.remove(record.chain_id, &record.hash) {
            Some(r) => r,
            None => return false,
        };
        if let Err(e) = self.positions.handle_transaction_rejection(&removed).await {
            warn!("handle_transaction_rejection failed for {:#x}: {}", removed.hash, e);
        }
        if let Err(e) = self.notifier.notify(Notification::rejected(&removed)).await {
            warn!("Rejection notification failed for {:#x}: {}", removed.hash, e);
        }
        true
    }

    async fn resolve_safe_hash(&self, hash: TxHash, chain_id: ChainId) -> Option<TxHash> {
        let safe = self.safe.as_ref()?;
        match safe.hash_from_safe_tx_hash(hash, chain_id).await {
            Ok(real) => Some(real),
            Err(e) => {
                error!("Unable to fetch real tx hash from safe hash {:#x}: {}", hash, e);
                None
            }
        }
    }
}
