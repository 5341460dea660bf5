//! Store Snapshot
//!
//! JSON persistence of the transaction store so pending transactions survive
//! a restart. Hashes, addresses and log payloads are stored as hex strings.
//!
//! Author: AI-Generated
//! Created: 2026-10-17

use super::records::TransactionStore;
use crate::error::{TrackerError, TrackerResult};
use crate::types::{TransactionKind, TransactionRecord, TxReceipt};
use alloy::hex;
use alloy::primitives::{Address, Bytes, Log, B256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

/// Serializable log for JSON storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializableLog {
    pub address: String,
    pub topics: Vec<String>,
    pub data: String,
}

impl From<&Log> for SerializableLog {
    fn from(log: &Log) -> Self {
        Self {
            address: format!("{:?}", log.address),
            topics: log.topics().iter().map(|t| format!("{:?}", t)).collect(),
            data: hex::encode_prefixed(&log.data.data),
        }
    }
}

impl SerializableLog {
    pub fn to_log(&self) -> TrackerResult<Log> {
        let address = parse_address(&self.address)?;
        let topics = self
            .topics
            .iter()
            .map(|t| parse_hash(t))
            .collect::<TrackerResult<Vec<B256>>>()?;
        let data = Bytes::from_str(&self.data)
            .map_err(|e| TrackerError::Snapshot(format!("bad log data: {}", e)))?;
        Ok(Log::new_unchecked(address, topics, data))
    }
}

/// Serializable receipt for JSON storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializableReceipt {
    pub transaction_hash: String,
    pub block_number: u64,
    pub block_hash: Option<String>,
    pub status: u8,
    pub from: String,
    pub to: Option<String>,
    pub contract_address: Option<String>,
    pub transaction_index: Option<u64>,
    pub gas_used: String,
    pub cumulative_gas_used: String,
    pub effective_gas_price: String,
    #[serde(default)]
    pub logs: Vec<SerializableLog>,
}

impl From<&TxReceipt> for SerializableReceipt {
    fn from(r: &TxReceipt) -> Self {
        Self {
            transaction_hash: format!("{:?}", r.transaction_hash),
            block_number: r.block_number,
            block_hash: r.block_hash.map(|h| format!("{:?}", h)),
            status: r.status,
            from: format!("{:?}", r.from),
            to: r.to.map(|a| format!("{:?}", a)),
            contract_address: r.contract_address.map(|a| format!("{:?}", a)),
            transaction_index: r.transaction_index,
            gas_used: r.gas_used.clone(),
            cumulative_gas_used: r.cumulative_gas_used.clone(),
            effective_gas_price: r.effective_gas_price.clone(),
            logs: r.logs.iter().map(SerializableLog::from).collect(),
        }
    }
}

impl SerializableReceipt {
    pub fn to_receipt(&self) -> TrackerResult<TxReceipt> {
        Ok(TxReceipt {
            transaction_hash: parse_hash(&self.transaction_hash)?,
            block_number: self.block_number,
            block_hash: self.block_hash.as_deref().map(parse_hash).transpose()?,
            status: self.status,
            from: parse_address(&self.from)?,
            to: self.to.as_deref().map(parse_address).transpose()?,
            contract_address: self.contract_address.as_deref().map(parse_address).transpose()?,
            transaction_index: self.transaction_index,
            gas_used: self.gas_used.clone(),
            cumulative_gas_used: self.cumulative_gas_used.clone(),
            effective_gas_price: self.effective_gas_price.clone(),
            logs: self
                .logs
                .iter()
                .map(SerializableLog::to_log)
                .collect::<TrackerResult<Vec<Log>>>()?,
        })
    }
}

/// Serializable transaction record for JSON storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializableRecord {
    pub hash: String,
    pub chain_id: u64,
    pub from: String,
    pub added_time: i64,
    pub last_checked_block_number: Option<u64>,
    #[serde(default)]
    pub retries: u32,
    pub receipt: Option<SerializableReceipt>,
    pub confirmed_time: Option<i64>,
    pub real_safe_hash: Option<String>,
    pub kind: TransactionKind,
}

impl From<&TransactionRecord> for SerializableRecord {
    fn from(r: &TransactionRecord) -> Self {
        Self {
            hash: format!("{:?}", r.hash),
            chain_id: r.chain_id,
            from: format!("{:?}", r.from),
            added_time: r.added_time,
            last_checked_block_number: r.last_checked_block_number,
            retries: r.retries,
            receipt: r.receipt.as_ref().map(SerializableReceipt::from),
            confirmed_time: r.confirmed_time,
            real_safe_hash: r.real_safe_hash.map(|h| format!("{:?}", h)),
            kind: r.kind.clone(),
        }
    }
}

impl SerializableRecord {
    pub fn to_record(&self) -> TrackerResult<TransactionRecord> {
        Ok(TransactionRecord {
            hash: parse_hash(&self.hash)?,
            chain_id: self.chain_id,
            from: parse_address(&self.from)?,
            added_time: self.added_time,
            last_checked_block_number: self.last_checked_block_number,
            retries: self.retries,
            receipt: self.receipt.as_ref().map(|r| r.to_receipt()).transpose()?,
            confirmed_time: self.confirmed_time,
            real_safe_hash: self.real_safe_hash.as_deref().map(parse_hash).transpose()?,
            kind: self.kind.clone(),
        })
    }
}

/// On-disk snapshot file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub saved_at: DateTime<Utc>,
    pub transactions: Vec<SerializableRecord>,
}

impl StoreSnapshot {
    pub fn capture(store: &TransactionStore) -> Self {
        let mut records = store.all();
        records.sort_by_key(|r| (r.chain_id, r.added_time));
        Self {
            saved_at: Utc::now(),
            transactions: records.iter().map(SerializableRecord::from).collect(),
        }
    }

    /// Write snapshot atomically (temp file + rename)
    pub fn save<P: AsRef<Path>>(&self, path: P) -> TrackerResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| TrackerError::Snapshot(format!("create {}: {}", parent.display(), e)))?;
            }
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| TrackerError::Snapshot(e.to_string()))?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .map_err(|e| TrackerError::Snapshot(format!("write {}: {}", tmp.display(), e)))?;
        std::fs::rename(&tmp, path)
            .map_err(|e| TrackerError::Snapshot(format!("rename {}: {}", path.display(), e)))?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> TrackerResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| TrackerError::Snapshot(format!("read {}: {}", path.display(), e)))?;
        serde_json::from_str(&content).map_err(|e| TrackerError::Snapshot(e.to_string()))
    }

    /// Load records into `store`, skipping malformed or duplicate entries.
    /// Returns the number restored.
    pub fn restore_into(&self, store: &TransactionStore) -> usize {
        let mut restored = 0;
        for entry in &self.transactions {
            match entry.to_record().and_then(|r| store.submit(r)) {
                Ok(()) => restored += 1,
                Err(e) => warn!("Skipping snapshot entry {}: {}", entry.hash, e),
            }
        }
        info!("Restored {}/{} transactions from snapshot", restored, self.transactions.len());
        restored
    }
}

/// Save the store to `path`
pub fn save_store<P: AsRef<Path>>(store: &TransactionStore, path: P) -> TrackerResult<()> {
    StoreSnapshot::capture(store).save(path)
}

/// Load `path` into a fresh store; a missing file yields an empty store
pub fn load_store<P: AsRef<Path>>(path: P) -> TrackerResult<TransactionStore> {
    let store = TransactionStore::new();
    if !path.as_ref().exists() {
        info!("No snapshot at {} - starting empty", path.as_ref().display());
        return Ok(store);
    }
    StoreSnapshot::load(path)?.restore_into(&store);
    Ok(store)
}

fn parse_hash(s: &str) -> TrackerResult<B256> {
    B256::from_str(s).map_err(|e| TrackerError::Snapshot(format!("bad hash {}: {}", s, e)))
}

fn parse_address(s: &str) -> TrackerResult<Address> {
    Address::from_str(s).map_err(|e| TrackerError::Snapshot(format!("bad address {}: {}", s, e)))
}
