//! Core data structures for the transaction tracker
//!
//! TransactionRecord is the unit the store holds and the engine reconciles.
//! TransactionKind replaces the loose "type" string + payload pairing with one
//! variant per protocol action.
//!
//! Author: AI-Generated
//! Created: 2026-10-17

use alloy::primitives::{Address, Log, B256};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Network identifier (EIP-155 chain id)
pub type ChainId = u64;

/// Transaction hash (or provisional Safe tx hash)
pub type TxHash = B256;

/// ERC20 token as the frontend knows it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub chain_id: ChainId,
    pub address: String,
    pub decimals: u8,
    pub symbol: String,
    #[serde(default)]
    pub name: String,
}

impl Token {
    pub fn new(chain_id: ChainId, address: &str, symbol: &str, decimals: u8) -> Self {
        Self {
            chain_id,
            address: address.to_string(),
            decimals,
            symbol: symbol.to_string(),
            name: symbol.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPositionData {
    pub from: Token,
    pub to: Token,
    /// Human-readable deposit amount (already in token units)
    pub from_value: String,
    pub frequency_type: String,
    pub frequency_value: String,
    pub started_at: i64,
    /// Submission hash until the Deposited event yields the real position id
    pub id: String,
    #[serde(default)]
    pub is_creating_pair: bool,
    #[serde(default)]
    pub from_yield: Option<String>,
    #[serde(default)]
    pub to_yield: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPairData {
    pub token0: String,
    pub token1: String,
    /// Filled from the last receipt log once mined
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveTokenData {
    pub token: Token,
    /// Spender (hub or companion address)
    pub address_for: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveTokenExactData {
    pub token: Token,
    pub address_for: String,
    /// Raw allowance amount (smallest unit)
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionRefData {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddFundsData {
    pub id: String,
    /// Raw amount (smallest unit)
    pub new_funds: String,
    pub decimals: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveFundsData {
    pub id: String,
    /// Raw amount (smallest unit)
    pub amount_to_remove: String,
    pub decimals: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifyRateData {
    pub id: String,
    pub new_rate: String,
    #[serde(default)]
    pub decimals: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetPositionData {
    pub id: String,
    pub new_rate: String,
    pub new_swaps: String,
    pub decimals: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifyPermissionsData {
    pub id: String,
    /// From-token symbol
    pub from: String,
    /// To-token symbol
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigratePositionData {
    pub id: String,
    /// Id of the position opened on the new hub, decoded from Deposited
    #[serde(default)]
    pub new_id: Option<String>,
}

/// Protocol action a transaction performs, with its action-specific payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    NewPosition(NewPositionData),
    NewPair(NewPairData),
    ApproveToken(ApproveTokenData),
    ApproveTokenExact(ApproveTokenExactData),
    WithdrawPosition(PositionRefData),
    TerminatePosition(PositionRefData),
    AddFundsPosition(AddFundsData),
    RemoveFunds(RemoveFundsData),
    ModifyRatePosition(ModifyRateData),
    ResetPosition(ResetPositionData),
    ModifyPermissions(ModifyPermissionsData),
    MigratePosition(MigratePositionData),
    MigratePositionYield(MigratePositionData),
    NoOp,
}

impl TransactionKind {
    /// Position this transaction acts on, if any
    pub fn position_id(&self) -> Option<&str> {
        match self {
            TransactionKind::NewPosition(d) => Some(&d.id),
            TransactionKind::WithdrawPosition(d) | TransactionKind::TerminatePosition(d) => {
                Some(&d.id)
            }
            TransactionKind::AddFundsPosition(d) => Some(&d.id),
            TransactionKind::RemoveFunds(d) => Some(&d.id),
            TransactionKind::ModifyRatePosition(d) => Some(&d.id),
            TransactionKind::ResetPosition(d) => Some(&d.id),
            TransactionKind::ModifyPermissions(d) => Some(&d.id),
            TransactionKind::MigratePosition(d) | TransactionKind::MigratePositionYield(d) => {
                Some(&d.id)
            }
            TransactionKind::NewPair(_)
            | TransactionKind::ApproveToken(_)
            | TransactionKind::ApproveTokenExact(_)
            | TransactionKind::NoOp => None,
        }
    }

    /// Apply identifiers decoded from receipt logs
    pub fn with_decoded(&self, decoded: &DecodedIds) -> Self {
        let mut kind = self.clone();
        match (&mut kind, decoded) {
            (TransactionKind::NewPosition(d), DecodedIds::PositionId(id)) => d.id = id.clone(),
            (TransactionKind::NewPair(d), DecodedIds::PairId(id)) => d.id = Some(id.clone()),
            (TransactionKind::MigratePosition(d), DecodedIds::PositionId(id))
            | (TransactionKind::MigratePositionYield(d), DecodedIds::PositionId(id)) => {
                d.new_id = Some(id.clone())
            }
            _ => {}
        }
        kind
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            TransactionKind::NewPosition(_) => "NEW_POSITION",
            TransactionKind::NewPair(_) => "NEW_PAIR",
            TransactionKind::ApproveToken(_) => "APPROVE_TOKEN",
            TransactionKind::ApproveTokenExact(_) => "APPROVE_TOKEN_EXACT",
            TransactionKind::WithdrawPosition(_) => "WITHDRAW_POSITION",
            TransactionKind::TerminatePosition(_) => "TERMINATE_POSITION",
            TransactionKind::AddFundsPosition(_) => "ADD_FUNDS_POSITION",
            TransactionKind::RemoveFunds(_) => "REMOVE_FUNDS",
            TransactionKind::ModifyRatePosition(_) => "MODIFY_RATE_POSITION",
            TransactionKind::ResetPosition(_) => "RESET_POSITION",
            TransactionKind::ModifyPermissions(_) => "MODIFY_PERMISSIONS",
            TransactionKind::MigratePosition(_) => "MIGRATE_POSITION",
            TransactionKind::MigratePositionYield(_) => "MIGRATE_POSITION_YIELD",
            TransactionKind::NoOp => "NO_OP",
        };
        write!(f, "{}", name)
    }
}

/// Identifiers extracted from a confirmed receipt's logs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedIds {
    /// Nothing to decode for this kind
    None,
    /// `positionId` from the Deposited event
    PositionId(String),
    /// Pair id read from the last log's raw data
    PairId(String),
}

/// Mined transaction receipt, reduced to what the tracker keeps
#[derive(Debug, Clone, PartialEq)]
pub struct TxReceipt {
    pub transaction_hash: TxHash,
    pub block_number: u64,
    pub block_hash: Option<B256>,
    /// 1 = success, 0 = reverted
    pub status: u8,
    pub from: Address,
    pub to: Option<Address>,
    pub contract_address: Option<Address>,
    pub transaction_index: Option<u64>,
    // Decimal strings, matching how the frontend persisted them
    pub gas_used: String,
    pub cumulative_gas_used: String,
    pub effective_gas_price: String,
    pub logs: Vec<Log>,
}

impl TxReceipt {
    pub fn is_success(&self) -> bool {
        self.status != 0
    }
}

/// Node view of a broadcast (possibly unmined) transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeTransaction {
    pub hash: TxHash,
    pub from: Address,
    pub block_number: Option<u64>,
}

/// Derived lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxStatus {
    Pending,
    Confirmed,
    Failed,
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TxStatus::Pending => write!(f, "pending"),
            TxStatus::Confirmed => write!(f, "confirmed"),
            TxStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A submitted transaction and its polling metadata
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    pub hash: TxHash,
    pub chain_id: ChainId,
    pub from: Address,
    /// Unix millis
    pub added_time: i64,
    pub last_checked_block_number: Option<u64>,
    pub retries: u32,
    pub receipt: Option<TxReceipt>,
    /// Unix millis
    pub confirmed_time: Option<i64>,
    pub real_safe_hash: Option<TxHash>,
    pub kind: TransactionKind,
}

impl TransactionRecord {
    /// New pending record stamped with the current time
    pub fn new(hash: TxHash, chain_id: ChainId, from: Address, kind: TransactionKind) -> Self {
        Self::with_added_time(hash, chain_id, from, kind, Utc::now().timestamp_millis())
    }

    pub fn with_added_time(
        hash: TxHash,
        chain_id: ChainId,
        from: Address,
        kind: TransactionKind,
        added_time: i64,
    ) -> Self {
        Self {
            hash,
            chain_id,
            from,
            added_time,
            last_checked_block_number: None,
            retries: 0,
            receipt: None,
            confirmed_time: None,
            real_safe_hash: None,
            kind,
        }
    }

    pub fn status(&self) -> TxStatus {
        match &self.receipt {
            None => TxStatus::Pending,
            Some(r) if r.is_success() => TxStatus::Confirmed,
            Some(_) => TxStatus::Failed,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.receipt.is_none()
    }

    /// Copy of this record carrying a different kind payload
    pub fn with_kind(&self, kind: TransactionKind) -> Self {
        Self {
            kind,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_position() -> TransactionKind {
        TransactionKind::NewPosition(NewPositionData {
            from: Token::new(10, "0x01", "USDC", 6),
            to: Token::new(10, "0x02", "WETH", 18),
            from_value: "100".to_string(),
            frequency_type: "86400".to_string(),
            frequency_value: "7".to_string(),
            started_at: 0,
            id: "0xplaceholder".to_string(),
            is_creating_pair: false,
            from_yield: None,
            to_yield: None,
        })
    }

    #[test]
    fn test_with_decoded_sets_position_id() {
        let kind = new_position().with_decoded(&DecodedIds::PositionId("42".to_string()));
        assert_eq!(kind.position_id(), Some("42"));
    }

    #[test]
    fn test_with_decoded_ignores_mismatched_ids() {
        let kind = new_position().with_decoded(&DecodedIds::PairId("0x1".to_string()));
        assert_eq!(kind, new_position());
    }

    #[test]
    fn test_migration_keeps_old_id() {
        let kind = TransactionKind::MigratePositionYield(MigratePositionData {
            id: "7".to_string(),
            new_id: None,
        })
        .with_decoded(&DecodedIds::PositionId("8".to_string()));

        match kind {
            TransactionKind::MigratePositionYield(d) => {
                assert_eq!(d.id, "7");
                assert_eq!(d.new_id.as_deref(), Some("8"));
            }
            other => panic!("unexpected kind {}", other),
        }
    }

    #[test]
    fn test_status_derivation() {
        let mut record = TransactionRecord::new(B256::ZERO, 1, Address::ZERO, TransactionKind::NoOp);
        assert_eq!(record.status(), TxStatus::Pending);

        record.receipt = Some(TxReceipt {
            transaction_hash: B256::ZERO,
            block_number: 5,
            block_hash: None,
            status: 0,
            from: Address::ZERO,
            to: None,
            contract_address: None,
            transaction_index: None,
            gas_used: "0".to_string(),
            cumulative_gas_used: "0".to_string(),
            effective_gas_price: "0".to_string(),
            logs: vec![],
        });
        assert_eq!(record.status(), TxStatus::Failed);
    }

    #[test]
    fn test_kind_serde_tag() {
        let json = serde_json::to_string(&TransactionKind::NoOp).unwrap();
        assert_eq!(json, r#"{"type":"NO_OP"}"#);

        let kind: TransactionKind = serde_json::from_str(
            r#"{"type":"TERMINATE_POSITION","data":{"id":"12"}}"#,
        )
        .unwrap();
        assert_eq!(kind.position_id(), Some("12"));
    }
}
