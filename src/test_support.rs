//! Shared fixtures and in-memory collaborators for unit tests

use crate::error::{TrackerError, TrackerResult};
use crate::notify::Notification;
use crate::services::{NodeProvider, NotificationSink, PositionService, SafeService};
use crate::tracker::decoder::{Deposited, PermissionSet};
use crate::types::{
    ChainId, NewPairData, NewPositionData, NodeTransaction, Token, TransactionKind, TransactionRecord, TxHash,
    TxReceipt,
};
use alloy::primitives::aliases::U120;
use alloy::primitives::{Address, Log, B256, U256};
use alloy::sol_types::SolEvent;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub(crate) fn record(byte: u8, chain_id: ChainId) -> TransactionRecord {
    TransactionRecord::new(
        B256::repeat_byte(byte),
        chain_id,
        Address::repeat_byte(0x11),
        TransactionKind::NoOp,
    )
}

pub(crate) fn receipt(hash: TxHash, block_number: u64, status: u8) -> TxReceipt {
    TxReceipt {
        transaction_hash: hash,
        block_number,
        block_hash: Some(B256::repeat_byte(0xbb)),
        status,
        from: Address::repeat_byte(0x11),
        to: Some(Address::repeat_byte(0xaa)),
        contract_address: None,
        transaction_index: Some(0),
        gas_used: "21000".to_string(),
        cumulative_gas_used: "21000".to_string(),
        effective_gas_price: "1000000000".to_string(),
        logs: Vec::new(),
    }
}

pub(crate) fn new_position_kind() -> TransactionKind {
    TransactionKind::NewPosition(NewPositionData {
        from: Token::new(10, "0x7f5c764cbc14f9669b88837ca1490cca17c31607", "USDC", 6),
        to: Token::new(10, "0x4200000000000000000000000000000000000006", "WETH", 18),
        from_value: "100".to_string(),
        frequency_type: "86400".to_string(),
        frequency_value: "7".to_string(),
        started_at: 1_700_000_000_000,
        id: "pending".to_string(),
        is_creating_pair: false,
        from_yield: None,
        to_yield: None,
    })
}

/// New position whose id is the submission-hash placeholder
pub(crate) fn new_position_record(byte: u8, chain_id: ChainId) -> TransactionRecord {
    let mut r = record(byte, chain_id);
    if let TransactionKind::NewPosition(mut data) = new_position_kind() {
        data.id = format!("{:?}", r.hash);
        r.kind = TransactionKind::NewPosition(data);
    }
    r
}

pub(crate) fn new_pair_kind() -> TransactionKind {
    TransactionKind::NewPair(NewPairData {
        token0: "USDC".to_string(),
        token1: "WETH".to_string(),
        id: None,
    })
}

pub(crate) fn deposited_log(position_id: U256) -> Log {
    deposited_log_from(Address::repeat_byte(0xaa), position_id)
}

pub(crate) fn deposited_log_from(hub: Address, position_id: U256) -> Log {
    let event = Deposited {
        depositor: Address::repeat_byte(0x11),
        owner: Address::repeat_byte(0x11),
        positionId: position_id,
        fromToken: Address::repeat_byte(0x01),
        toToken: Address::repeat_byte(0x02),
        swapInterval: 86_400,
        rate: U120::from(1_000_000u64),
        startingSwap: 1,
        lastSwap: 7,
        permissions: vec![PermissionSet {
            operator: Address::repeat_byte(0x44),
            permissions: vec![0, 2],
        }],
    };
    Log {
        address: hub,
        data: event.encode_log_data(),
    }
}

type FetchHook = Arc<dyn Fn(TxHash) + Send + Sync>;

/// Scriptable node: receipts and known transactions are set per hash
#[derive(Default)]
pub(crate) struct MockNode {
    receipts: Mutex<HashMap<TxHash, TxReceipt>>,
    known: Mutex<HashSet<TxHash>>,
    failing: Mutex<HashMap<TxHash, String>>,
    fail_all: Mutex<Option<String>>,
    block: Mutex<HashMap<ChainId, u64>>,
    on_receipt: Mutex<Option<FetchHook>>,
    receipt_latency: Mutex<Option<Duration>>,
    receipt_calls: AtomicUsize,
    exists_calls: AtomicUsize,
}

impl MockNode {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_receipt(&self, hash: TxHash, receipt: TxReceipt) {
        self.receipts.lock().unwrap().insert(hash, receipt);
    }

    pub(crate) fn set_known(&self, hash: TxHash) {
        self.known.lock().unwrap().insert(hash);
    }

    pub(crate) fn set_block(&self, chain_id: ChainId, block: u64) {
        self.block.lock().unwrap().insert(chain_id, block);
    }

    /// Every call fails with a transient error
    pub(crate) fn fail_with(&self, message: &str) {
        *self.fail_all.lock().unwrap() = Some(message.to_string());
    }

    /// Calls for `hash` fail with a transient error
    pub(crate) fn fail_hash(&self, hash: TxHash, message: &str) {
        self.failing.lock().unwrap().insert(hash, message.to_string());
    }

    /// Runs after the receipt lookup, before the result is returned
    pub(crate) fn on_receipt_fetch<F: Fn(TxHash) + Send + Sync + 'static>(&self, hook: F) {
        *self.on_receipt.lock().unwrap() = Some(Arc::new(hook));
    }

    /// Receipt lookups sleep this long before answering
    pub(crate) fn set_receipt_latency(&self, latency: Duration) {
        *self.receipt_latency.lock().unwrap() = Some(latency);
    }

    pub(crate) fn receipt_calls(&self) -> usize {
        self.receipt_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn exists_calls(&self) -> usize {
        self.exists_calls.load(Ordering::SeqCst)
    }

    fn check_failure(&self, hash: Option<&TxHash>, chain_id: ChainId) -> TrackerResult<()> {
        if let Some(message) = self.fail_all.lock().unwrap().clone() {
            return Err(TrackerError::transient(chain_id, message));
        }
        if let Some(message) = hash.and_then(|h| self.failing.lock().unwrap().get(h).cloned()) {
            return Err(TrackerError::transient(chain_id, message));
        }
        Ok(())
    }
}

#[async_trait]
impl NodeProvider for MockNode {
    async fn get_transaction(&self, hash: TxHash, chain_id: ChainId) -> TrackerResult<Option<NodeTransaction>> {
        self.exists_calls.fetch_add(1, Ordering::SeqCst);
        self.check_failure(Some(&hash), chain_id)?;
        let known = self.known.lock().unwrap().contains(&hash);
        Ok(known.then(|| NodeTransaction {
            hash,
            from: Address::repeat_byte(0x11),
            block_number: None,
        }))
    }

    async fn get_transaction_receipt(&self, hash: TxHash, chain_id: ChainId) -> TrackerResult<Option<TxReceipt>> {
        self.receipt_calls.fetch_add(1, Ordering::SeqCst);
        let latency = *self.receipt_latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        self.check_failure(Some(&hash), chain_id)?;
        let receipt = self.receipts.lock().unwrap().get(&hash).cloned();
        let hook = self.on_receipt.lock().unwrap().clone();
        if let Some(hook) = hook {
            hook(hash);
        }
        Ok(receipt)
    }

    async fn get_block_number(&self, chain_id: ChainId) -> TrackerResult<u64> {
        self.check_failure(None, chain_id)?;
        self.block
            .lock()
            .unwrap()
            .get(&chain_id)
            .copied()
            .ok_or(TrackerError::UnknownChain(chain_id))
    }
}

#[derive(Default)]
pub(crate) struct CollectingSink {
    received: Mutex<Vec<Notification>>,
}

impl CollectingSink {
    /// Drain everything received so far
    pub(crate) fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.received.lock().unwrap())
    }
}

#[async_trait]
impl NotificationSink for CollectingSink {
    async fn notify(&self, notification: Notification) -> TrackerResult<()> {
        self.received.lock().unwrap().push(notification);
        Ok(())
    }
}

/// Records every hook call
#[derive(Default)]
pub(crate) struct RecordingPositions {
    handled: Mutex<Vec<TransactionRecord>>,
    rejected: Mutex<Vec<TxHash>>,
    pending: Mutex<Vec<TxHash>>,
}

impl RecordingPositions {
    pub(crate) fn handled(&self) -> Vec<TransactionRecord> {
        self.handled.lock().unwrap().clone()
    }

    pub(crate) fn rejected(&self) -> Vec<TxHash> {
        self.rejected.lock().unwrap().clone()
    }

    pub(crate) fn pending(&self) -> Vec<TxHash> {
        self.pending.lock().unwrap().clone()
    }
}

#[async_trait]
impl PositionService for RecordingPositions {
    async fn handle_transaction(&self, record: &TransactionRecord) -> TrackerResult<()> {
        self.handled.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn handle_transaction_rejection(&self, record: &TransactionRecord) -> TrackerResult<()> {
        self.rejected.lock().unwrap().push(record.hash);
        Ok(())
    }

    async fn set_pending_transaction(&self, record: &TransactionRecord) -> TrackerResult<()> {
        self.pending.lock().unwrap().push(record.hash);
        Ok(())
    }
}

pub(crate) struct MockSafe {
    real: Option<TxHash>,
}

impl MockSafe {
    pub(crate) fn resolving(real: TxHash) -> Self {
        Self { real: Some(real) }
    }

    pub(crate) fn failing() -> Self {
        Self { real: None }
    }
}

#[async_trait]
impl SafeService for MockSafe {
    async fn hash_from_safe_tx_hash(&self, safe_tx_hash: TxHash, chain_id: ChainId) -> TrackerResult<TxHash> {
        self.real
            .ok_or_else(|| TrackerError::transient(chain_id, format!("safe tx {:#x} not executed", safe_tx_hash)))
    }
}
