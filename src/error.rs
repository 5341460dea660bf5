//! Tracker error taxonomy
//!
//! Every variant is caught at the engine's per-transaction boundary; none of
//! them aborts a tick or touches sibling transactions.
//!
//! Author: AI-Generated
//! Created: 2026-10-17

use crate::types::{ChainId, TxHash};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    /// No wallet account connected. Polling is suspended, not retried.
    #[error("no active account connected")]
    NoActiveAccount,

    /// Network / node failure. Record left untouched, retried next eligible tick.
    #[error("node request failed on chain {chain_id}: {message}")]
    TransientFetch { chain_id: ChainId, message: String },

    #[error("transaction {hash:#x} not found on chain {chain_id}")]
    TransactionNotFound { hash: TxHash, chain_id: ChainId },

    /// Expected event missing or malformed. Finalization proceeds without ids.
    #[error("log decode failed: {0}")]
    LogDecode(String),

    #[error("transaction {hash:#x} reverted in block {block_number}")]
    RevertedOnChain { hash: TxHash, block_number: u64 },

    #[error("transaction {hash:#x} already tracked on chain {chain_id}")]
    DuplicateTransaction { hash: TxHash, chain_id: ChainId },

    #[error("chain {0} is not configured")]
    UnknownChain(ChainId),

    #[error("invalid endpoint for chain {chain_id}: {message}")]
    InvalidEndpoint { chain_id: ChainId, message: String },

    #[error("notification failed: {0}")]
    Notification(String),

    #[error("snapshot error: {0}")]
    Snapshot(String),
}

impl TrackerError {
    pub fn transient(chain_id: ChainId, err: impl std::fmt::Display) -> Self {
        TrackerError::TransientFetch {
            chain_id,
            message: err.to_string(),
        }
    }

    /// Whether the same call may succeed on a later tick
    pub fn is_retryable(&self) -> bool {
        matches!(self, TrackerError::TransientFetch { .. })
    }
}

pub type TrackerResult<T> = std::result::Result<T, TrackerError>;
