//! Position Ledger
//!
//! In-memory derived position state driven by transaction outcomes. Implements
//! the PositionService hooks the reconciliation engine fires.
//!
//! Records may arrive without decoded ids (decode failure is non-fatal):
//! - new position: stays keyed by its submission-hash placeholder
//! - migration: old position marked migrated with no successor
//! - new pair: registered without a pair id
//!
//! Author: AI-Generated
//! Created: 2026-10-17

use crate::error::TrackerResult;
use crate::services::PositionService;
use crate::types::{ChainId, TransactionKind, TransactionRecord, TxHash};
use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, info};

type PositionKey = (ChainId, String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PositionState {
    /// Creation submitted, not confirmed
    Opening,
    Active,
    Terminated,
    Migrated { to: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionEntry {
    pub id: String,
    pub chain_id: ChainId,
    pub state: PositionState,
    /// In-flight transaction touching this position
    pub pending_tx: Option<TxHash>,
    /// Last confirmed transaction
    pub last_tx: Option<TxHash>,
}

impl PositionEntry {
    fn new(chain_id: ChainId, id: &str, state: PositionState) -> Self {
        Self {
            id: id.to_string(),
            chain_id,
            state,
            pending_tx: None,
            last_tx: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairEntry {
    pub token0: String,
    pub token1: String,
    pub id: Option<String>,
}

#[derive(Debug, Default)]
pub struct PositionLedger {
    positions: DashMap<PositionKey, PositionEntry>,
    pairs: DashMap<(ChainId, TxHash), PairEntry>,
}

impl PositionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self, chain_id: ChainId, id: &str) -> Option<PositionEntry> {
        self.positions.get(&(chain_id, id.to_string())).map(|p| p.clone())
    }

    pub fn positions(&self, chain_id: ChainId) -> Vec<PositionEntry> {
        let mut out: Vec<PositionEntry> = self
            .positions
            .iter()
            .filter(|p| p.key().0 == chain_id)
            .map(|p| p.value().clone())
            .collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }

    /// Pair created by transaction `hash`
    pub fn pair(&self, chain_id: ChainId, hash: &TxHash) -> Option<PairEntry> {
        self.pairs.get(&(chain_id, *hash)).map(|p| p.clone())
    }

    fn placeholder_id(record: &TransactionRecord) -> String {
        format!("{:?}", record.hash)
    }

    fn upsert<F: FnOnce(&mut PositionEntry)>(&self, chain_id: ChainId, id: &str, default: PositionState, f: F) {
        let mut entry = self
            .positions
            .entry((chain_id, id.to_string()))
            .or_insert_with(|| PositionEntry::new(chain_id, id, default));
        f(entry.value_mut());
    }
}

#[async_trait]
impl PositionService for PositionLedger {
    async fn handle_transaction(&self, record: &TransactionRecord) -> TrackerResult<()> {
        let chain_id = record.chain_id;
        match &record.kind {
            TransactionKind::NewPosition(d) => {
                let placeholder = Self::placeholder_id(record);
                if d.id != placeholder {
                    self.positions.remove(&(chain_id, placeholder));
                }
                self.upsert(chain_id, &d.id, PositionState::Active, |p| {
                    p.state = PositionState::Active;
                    p.pending_tx = None;
                    p.last_tx = Some(record.hash);
                });
                info!("Position {} active on chain {}", d.id, chain_id);
            }
            TransactionKind::NewPair(d) => {
                self.pairs.insert(
                    (chain_id, record.hash),
                    PairEntry {
                        token0: d.token0.clone(),
                        token1: d.token1.clone(),
                        id: d.id.clone(),
                    },
                );
            }
            TransactionKind::TerminatePosition(d) => {
                self.upsert(chain_id, &d.id, PositionState::Terminated, |p| {
                    p.state = PositionState::Terminated;
                    p.pending_tx = None;
                    p.last_tx = Some(record.hash);
                });
            }
            TransactionKind::MigratePosition(d) | TransactionKind::MigratePositionYield(d) => {
                let successor = d.new_id.clone();
                self.upsert(chain_id, &d.id, PositionState::Active, |p| {
                    p.state = PositionState::Migrated { to: successor.clone() };
                    p.pending_tx = None;
                    p.last_tx = Some(record.hash);
                });
                if let Some(new_id) = &d.new_id {
                    self.upsert(chain_id, new_id, PositionState::Active, |p| {
                        p.last_tx = Some(record.hash);
                    });
                }
            }
            TransactionKind::WithdrawPosition(_)
            | TransactionKind::AddFundsPosition(_)
            | TransactionKind::RemoveFunds(_)
            | TransactionKind::ModifyRatePosition(_)
            | TransactionKind::ResetPosition(_)
            | TransactionKind::ModifyPermissions(_) => {
                if let Some(id) = record.kind.position_id() {
                    self.upsert(chain_id, id, PositionState::Active, |p| {
                        p.pending_tx = None;
                        p.last_tx = Some(record.hash);
                    });
                }
            }
            TransactionKind::ApproveToken(_)
            | TransactionKind::ApproveTokenExact(_)
            | TransactionKind::NoOp => {
                debug!("{} confirmed, no position state to update", record.kind);
            }
        }
        Ok(())
    }

    async fn handle_transaction_rejection(&self, record: &TransactionRecord) -> TrackerResult<()> {
        let chain_id = record.chain_id;
        match &record.kind {
            TransactionKind::NewPosition(_) => {
                self.positions.remove(&(chain_id, Self::placeholder_id(record)));
            }
            kind => {
                if let Some(id) = kind.position_id() {
                    if let Some(mut p) = self.positions.get_mut(&(chain_id, id.to_string())) {
                        if p.pending_tx == Some(record.hash) {
                            p.pending_tx = None;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    async fn set_pending_transaction(&self, record: &TransactionRecord) -> TrackerResult<()> {
        let chain_id = record.chain_id;
        match &record.kind {
            TransactionKind::NewPosition(d) => {
                self.upsert(chain_id, &d.id, PositionState::Opening, |p| {
                    p.pending_tx = Some(record.hash);
                });
            }
            kind => {
                if let Some(id) = kind.position_id() {
                    self.upsert(chain_id, id, PositionState::Active, |p| {
                        p.pending_tx = Some(record.hash);
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{new_position_record, record};
    use crate::types::{DecodedIds, MigratePositionData, PositionRefData};

    #[tokio::test]
    async fn test_new_position_replaces_placeholder() {
        let ledger = PositionLedger::new();
        let r = new_position_record(0x01, 10);
        let placeholder = format!("{:?}", r.hash);

        ledger.set_pending_transaction(&r).await.unwrap();
        assert_eq!(ledger.position(10, &placeholder).unwrap().state, PositionState::Opening);

        let confirmed = r.with_kind(r.kind.with_decoded(&DecodedIds::PositionId("77".to_string())));
        ledger.handle_transaction(&confirmed).await.unwrap();

        assert!(ledger.position(10, &placeholder).is_none());
        let p = ledger.position(10, "77").unwrap();
        assert_eq!(p.state, PositionState::Active);
        assert_eq!(p.pending_tx, None);
        assert_eq!(p.last_tx, Some(r.hash));
    }

    #[tokio::test]
    async fn test_new_position_without_decoded_id_keeps_placeholder() {
        let ledger = PositionLedger::new();
        let r = new_position_record(0x01, 10);
        ledger.set_pending_transaction(&r).await.unwrap();
        ledger.handle_transaction(&r).await.unwrap();

        let p = ledger.position(10, &format!("{:?}", r.hash)).unwrap();
        assert_eq!(p.state, PositionState::Active);
    }

    #[tokio::test]
    async fn test_rejected_new_position_is_forgotten() {
        let ledger = PositionLedger::new();
        let r = new_position_record(0x01, 10);
        ledger.set_pending_transaction(&r).await.unwrap();
        ledger.handle_transaction_rejection(&r).await.unwrap();
        assert!(ledger.positions(10).is_empty());
    }

    #[tokio::test]
    async fn test_migration_with_and_without_successor() {
        let ledger = PositionLedger::new();
        let mut r = record(0x02, 10);
        r.kind = TransactionKind::MigratePosition(MigratePositionData {
            id: "5".to_string(),
            new_id: Some("6".to_string()),
        });
        ledger.handle_transaction(&r).await.unwrap();
        assert_eq!(
            ledger.position(10, "5").unwrap().state,
            PositionState::Migrated { to: Some("6".to_string()) }
        );
        assert_eq!(ledger.position(10, "6").unwrap().state, PositionState::Active);

        r.kind = TransactionKind::MigratePositionYield(MigratePositionData {
            id: "8".to_string(),
            new_id: None,
        });
        ledger.handle_transaction(&r).await.unwrap();
        assert_eq!(ledger.position(10, "8").unwrap().state, PositionState::Migrated { to: None });
    }

    #[tokio::test]
    async fn test_rejection_clears_pending_marker() {
        let ledger = PositionLedger::new();
        let mut r = record(0x03, 10);
        r.kind = TransactionKind::TerminatePosition(PositionRefData { id: "9".to_string() });

        ledger.set_pending_transaction(&r).await.unwrap();
        assert_eq!(ledger.position(10, "9").unwrap().pending_tx, Some(r.hash));

        ledger.handle_transaction_rejection(&r).await.unwrap();
        let p = ledger.position(10, "9").unwrap();
        assert_eq!(p.pending_tx, None);
        assert_eq!(p.state, PositionState::Active);
    }
}
