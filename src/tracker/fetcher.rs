//! Receipt Fetcher
//!
//! Node queries behind the connected-account precondition. A missing account
//! is `NoActiveAccount`, never a transient failure.

use crate::error::{TrackerError, TrackerResult};
use crate::services::{AccountProvider, NodeProvider};
use crate::types::{ChainId, TxHash, TxReceipt};
use std::sync::Arc;

/// What the node says about a transaction
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Mined (status may still be 0 = reverted)
    Mined(TxReceipt),
    /// Known to the node, not mined yet
    Pending,
    /// Node has no record of the transaction
    NotFound,
}

#[derive(Clone)]
pub struct ReceiptFetcher {
    node: Arc<dyn NodeProvider>,
    account: Arc<dyn AccountProvider>,
}

impl ReceiptFetcher {
    pub fn new(node: Arc<dyn NodeProvider>, account: Arc<dyn AccountProvider>) -> Self {
        Self { node, account }
    }

    fn ensure_account(&self) -> TrackerResult<()> {
        match self.account.account() {
            Some(_) => Ok(()),
            None => Err(TrackerError::NoActiveAccount),
        }
    }

    /// `None` = not mined yet
    pub async fn fetch_receipt(&self, hash: TxHash, chain_id: ChainId) -> TrackerResult<Option<TxReceipt>> {
        self.ensure_account()?;
        self.node.get_transaction_receipt(hash, chain_id).await
    }

    pub async fn transaction_exists(&self, hash: TxHash, chain_id: ChainId) -> TrackerResult<bool> {
        self.ensure_account()?;
        Ok(self.node.get_transaction(hash, chain_id).await?.is_some())
    }

    /// Receipt first; existence only when there is no receipt
    pub async fn classify(&self, hash: TxHash, chain_id: ChainId) -> TrackerResult<FetchOutcome> {
        if let Some(receipt) = self.fetch_receipt(hash, chain_id).await? {
            return Ok(FetchOutcome::Mined(receipt));
        }
        if self.transaction_exists(hash, chain_id).await? {
            Ok(FetchOutcome::Pending)
        } else {
            Ok(FetchOutcome::NotFound)
        }
    }

    pub async fn block_number(&self, chain_id: ChainId) -> TrackerResult<u64> {
        self.node.get_block_number(chain_id).await
    }

    pub fn has_account(&self) -> bool {
        self.account.account().is_some()
    }
}
