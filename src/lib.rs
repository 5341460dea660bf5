//! DCA Transaction Tracker Library
//!
//! Tracks transactions a user submitted to the DCA protocol, polls the node for
//! their receipts and reconciles each one to confirmed, reverted or dropped.
//! Multi-chain: one record store and one latest-block view shared by all chains.
//!
//! Author: AI-Generated
//! Created: 2026-10-17

pub mod config;
pub mod error;
pub mod node;
pub mod notify;
pub mod positions;
pub mod safe;
pub mod services;
pub mod store;
pub mod tracker;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use config::TrackerConfig;
pub use error::{TrackerError, TrackerResult};
pub use node::AlloyNode;
pub use notify::{DiscordSink, Explorers, FanoutSink, Notification, Severity, TracingSink};
pub use positions::PositionLedger;
pub use services::{AccountProvider, NodeProvider, NotificationSink, PositionService, SafeService, StaticAccount};
pub use store::{BlockTracker, TransactionStore};
pub use tracker::{BlockPoller, LogDecoder, Outcome, ReceiptFetcher, ReconciliationEngine, TickReport, TickScheduler};
pub use types::{ChainId, DecodedIds, TransactionKind, TransactionRecord, TxHash, TxReceipt, TxStatus};
