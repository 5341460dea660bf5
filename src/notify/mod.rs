//! Notification Module
//!
//! Presentation adapter between the reconciliation engine and whatever shows
//! outcomes to the user.
//!
//! Author: AI-Generated
//! Created: 2026-10-17
//!
//! Architecture:
//!     messages.rs — per-kind success / rejection text, token amount formatting
//!     explorer.rs — block explorer links per chain
//!     discord.rs  — webhook sink

pub mod discord;
pub mod explorer;
pub mod messages;

pub use discord::DiscordSink;
pub use explorer::Explorers;
pub use messages::{build_rejected_transaction_message, build_transaction_message, format_units};

use crate::error::TrackerResult;
use crate::services::NotificationSink;
use crate::types::{ChainId, TransactionRecord, TxHash};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
}

/// A user-facing outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub chain_id: ChainId,
    pub hash: TxHash,
    pub kind: String,
    pub severity: Severity,
    pub message: String,
    /// Block explorer link (confirmed transactions only)
    pub link: Option<String>,
}

impl Notification {
    pub fn confirmed(record: &TransactionRecord, explorers: &Explorers) -> Self {
        // Safe-app transactions link to the resolved on-chain hash
        let link_hash = record.real_safe_hash.unwrap_or(record.hash);
        Self {
            chain_id: record.chain_id,
            hash: record.hash,
            kind: record.kind.to_string(),
            severity: Severity::Success,
            message: build_transaction_message(record),
            link: explorers.tx_url(record.chain_id, &link_hash),
        }
    }

    pub fn rejected(record: &TransactionRecord) -> Self {
        Self {
            chain_id: record.chain_id,
            hash: record.hash,
            kind: record.kind.to_string(),
            severity: Severity::Error,
            message: build_rejected_transaction_message(record),
            link: None,
        }
    }
}

/// Logs notifications through tracing
#[derive(Debug, Clone, Default)]
pub struct TracingSink;

#[async_trait]
impl NotificationSink for TracingSink {
    async fn notify(&self, notification: Notification) -> TrackerResult<()> {
        match notification.severity {
            Severity::Success => info!(
                "✅ {} | chain {} | {:#x}{}",
                notification.message,
                notification.chain_id,
                notification.hash,
                notification
                    .link
                    .as_deref()
                    .map(|l| format!(" | {}", l))
                    .unwrap_or_default()
            ),
            Severity::Error => warn!(
                "❌ {} | chain {} | {:#x}",
                notification.message, notification.chain_id, notification.hash
            ),
        }
        Ok(())
    }
}

/// Delivers every notification to all inner sinks; one failing sink does not
/// stop the others.
#[derive(Clone, Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn NotificationSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

#[async_trait]
impl NotificationSink for FanoutSink {
    async fn notify(&self, notification: Notification) -> TrackerResult<()> {
        for sink in &self.sinks {
            if let Err(e) = sink.notify(notification.clone()).await {
                error!("Notification sink failed: {}", e);
            }
        }
        Ok(())
    }
}
