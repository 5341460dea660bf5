//! Transaction Record Store
//!
//! Holds every submitted transaction keyed by (chain_id, hash). Only the
//! reconciliation engine mutates polling metadata; every mutator goes through
//! `get_mut`, so a record removed mid-fetch is never recreated.
//!
//! Author: AI-Generated
//! Created: 2026-10-17

use crate::error::{TrackerError, TrackerResult};
use crate::types::{ChainId, TransactionKind, TransactionRecord, TxHash, TxReceipt};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, info};

type RecordKey = (ChainId, TxHash);

/// Explicit store object. Created at startup, torn down on disconnect.
#[derive(Debug, Default)]
pub struct TransactionStore {
    records: DashMap<RecordKey, TransactionRecord>,
}

impl TransactionStore {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    /// Register a newly submitted transaction
    pub fn submit(&self, record: TransactionRecord) -> TrackerResult<()> {
        match self.records.entry((record.chain_id, record.hash)) {
            Entry::Occupied(_) => Err(TrackerError::DuplicateTransaction {
                hash: record.hash,
                chain_id: record.chain_id,
            }),
            Entry::Vacant(slot) => {
                info!(
                    "Tracking {} tx {:#x} on chain {}",
                    record.kind, record.hash, record.chain_id
                );
                slot.insert(record);
                Ok(())
            }
        }
    }

    pub fn get(&self, chain_id: ChainId, hash: &TxHash) -> Option<TransactionRecord> {
        self.records.get(&(chain_id, *hash)).map(|r| r.value().clone())
    }

    pub fn contains(&self, chain_id: ChainId, hash: &TxHash) -> bool {
        self.records.contains_key(&(chain_id, *hash))
    }

    /// All records for a chain, oldest first
    pub fn list(&self, chain_id: ChainId) -> Vec<TransactionRecord> {
        let mut out: Vec<TransactionRecord> = self
            .records
            .iter()
            .filter(|e| e.key().0 == chain_id)
            .map(|e| e.value().clone())
            .collect();
        out.sort_by_key(|r| r.added_time);
        out
    }

    /// Records for a chain still waiting on a receipt, oldest first
    pub fn list_pending(&self, chain_id: ChainId) -> Vec<TransactionRecord> {
        self.list(chain_id)
            .into_iter()
            .filter(|r| r.is_pending())
            .collect()
    }

    /// Pending records across every chain
    pub fn all_pending(&self) -> Vec<TransactionRecord> {
        let mut out: Vec<TransactionRecord> = self
            .records
            .iter()
            .filter(|e| e.value().is_pending())
            .map(|e| e.value().clone())
            .collect();
        out.sort_by_key(|r| r.added_time);
        out
    }

    pub fn all(&self) -> Vec<TransactionRecord> {
        self.records.iter().map(|e| e.value().clone()).collect()
    }

    /// Chains with at least one record
    pub fn chains(&self) -> Vec<ChainId> {
        let mut chains: Vec<ChainId> = self.records.iter().map(|e| e.key().0).collect();
        chains.sort_unstable();
        chains.dedup();
        chains
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record was polled and the node knows about it
    pub fn mark_checked(&self, chain_id: ChainId, hash: &TxHash, block_number: u64) -> bool {
        match self.records.get_mut(&(chain_id, *hash)) {
            Some(mut entry) => {
                entry.last_checked_block_number = Some(block_number);
                true
            }
            None => false,
        }
    }

    /// Record was polled and the node has never seen it. Returns the new retry count.
    pub fn mark_not_found(&self, chain_id: ChainId, hash: &TxHash, block_number: u64) -> Option<u32> {
        self.records.get_mut(&(chain_id, *hash)).map(|mut entry| {
            entry.last_checked_block_number = Some(block_number);
            entry.retries += 1;
            debug!("tx {:#x} not found (retry {})", hash, entry.retries);
            entry.retries
        })
    }

    /// Attach the receipt and decoded payload. Returns false if the record is
    /// gone or already terminal.
    pub fn finalize(
        &self,
        chain_id: ChainId,
        hash: &TxHash,
        receipt: TxReceipt,
        kind: TransactionKind,
        real_safe_hash: Option<TxHash>,
        confirmed_time: i64,
    ) -> bool {
        match self.records.get_mut(&(chain_id, *hash)) {
            Some(mut entry) if entry.receipt.is_none() => {
                entry.receipt = Some(receipt);
                entry.kind = kind;
                entry.real_safe_hash = real_safe_hash;
                entry.confirmed_time = Some(confirmed_time);
                true
            }
            _ => false,
        }
    }

    pub fn remove(&self, chain_id: ChainId, hash: &TxHash) -> Option<TransactionRecord> {
        self.records.remove(&(chain_id, *hash)).map(|(_, r)| r)
    }

    /// Swap a pending record for its resubmission (speed-up / cancel)
    pub fn replace(&self, old_hash: &TxHash, record: TransactionRecord) -> TrackerResult<TransactionRecord> {
        let chain_id = record.chain_id;
        let new_hash = record.hash;
        if !self.records.contains_key(&(chain_id, *old_hash)) {
            return Err(TrackerError::TransactionNotFound {
                hash: *old_hash,
                chain_id,
            });
        }
        // New key is claimed before the old record is dropped
        match self.records.entry((chain_id, new_hash)) {
            Entry::Occupied(_) => {
                return Err(TrackerError::DuplicateTransaction {
                    hash: new_hash,
                    chain_id,
                })
            }
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
        }
        match self.remove(chain_id, old_hash) {
            Some(old) => {
                info!("Replaced tx {:#x} with {:#x} on chain {}", old_hash, new_hash, chain_id);
                Ok(old)
            }
            None => {
                self.records.remove(&(chain_id, new_hash));
                Err(TrackerError::TransactionNotFound {
                    hash: *old_hash,
                    chain_id,
                })
            }
        }
    }

    /// Drop every record (account disconnect)
    pub fn teardown(&self) {
        let count = self.records.len();
        self.records.clear();
        info!("Transaction store torn down ({} records dropped)", count);
    }
}
