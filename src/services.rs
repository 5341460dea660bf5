//! External collaborator interfaces
//!
//! The tracker reaches the node, the wallet, the position domain and the user
//! only through these traits.
//!
//! Author: AI-Generated
//! Created: 2026-10-17

use crate::error::TrackerResult;
use crate::notify::Notification;
use crate::types::{ChainId, NodeTransaction, TransactionRecord, TxHash, TxReceipt};
use alloy::primitives::Address;
use async_trait::async_trait;

/// Read-only node access, one logical endpoint per chain
#[async_trait]
pub trait NodeProvider: Send + Sync {
    /// `None` when the node has never seen the transaction
    async fn get_transaction(&self, hash: TxHash, chain_id: ChainId) -> TrackerResult<Option<NodeTransaction>>;

    /// `None` while the transaction is not mined yet
    async fn get_transaction_receipt(&self, hash: TxHash, chain_id: ChainId) -> TrackerResult<Option<TxReceipt>>;

    async fn get_block_number(&self, chain_id: ChainId) -> TrackerResult<u64>;
}

/// Connected wallet account
pub trait AccountProvider: Send + Sync {
    fn account(&self) -> Option<Address>;
}

/// Position domain hooks fired on lifecycle transitions
#[async_trait]
pub trait PositionService: Send + Sync {
    /// Transaction confirmed; `record.kind` carries decoded ids when available
    async fn handle_transaction(&self, record: &TransactionRecord) -> TrackerResult<()>;

    /// Transaction dropped or reverted
    async fn handle_transaction_rejection(&self, record: &TransactionRecord) -> TrackerResult<()>;

    /// Transaction known to be in flight (startup replay)
    async fn set_pending_transaction(&self, record: &TransactionRecord) -> TrackerResult<()>;
}

/// Multisig (Safe app) context: submission hashes are provisional
#[async_trait]
pub trait SafeService: Send + Sync {
    async fn hash_from_safe_tx_hash(&self, safe_tx_hash: TxHash, chain_id: ChainId) -> TrackerResult<TxHash>;
}

/// User-facing outcome messages
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, notification: Notification) -> TrackerResult<()>;
}

/// Fixed account (configured wallet, or none)
#[derive(Debug, Clone, Default)]
pub struct StaticAccount {
    account: std::sync::Arc<std::sync::RwLock<Option<Address>>>,
}

impl StaticAccount {
    pub fn new(account: Option<Address>) -> Self {
        Self {
            account: std::sync::Arc::new(std::sync::RwLock::new(account)),
        }
    }

    /// Connect or disconnect the account
    pub fn set(&self, account: Option<Address>) {
        if let Ok(mut guard) = self.account.write() {
            *guard = account;
        }
    }
}

impl AccountProvider for StaticAccount {
    fn account(&self) -> Option<Address> {
        self.account.read().ok().and_then(|a| *a)
    }
}
