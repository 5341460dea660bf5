//! Log Decoder
//!
//! Extracts protocol identifiers from a confirmed receipt's logs:
//! - new position / migrations: `positionId` from the hub's Deposited event (ABI decode)
//! - new pair: hex value of the last log's raw data (no ABI decode)
//!
//! Author: AI-Generated
//! Created: 2026-10-17

use crate::error::{TrackerError, TrackerResult};
use crate::types::{ChainId, DecodedIds, TransactionKind};
use alloy::hex;
use alloy::primitives::{Address, Log};
use alloy::sol;
use alloy::sol_types::SolEvent;
use std::collections::HashMap;
use tracing::debug;

sol! {
    /// Operator permissions granted on a position (IDCAPermissionManager)
    #[derive(Debug, PartialEq, Eq)]
    struct PermissionSet {
        address operator;
        uint8[] permissions;
    }

    /// DCA hub (v2) event emitted when a position is opened (deposit or migration)
    #[derive(Debug, PartialEq, Eq)]
    event Deposited(
        address indexed depositor,
        address indexed owner,
        uint256 positionId,
        address fromToken,
        address toToken,
        uint32 swapInterval,
        uint120 rate,
        uint32 startingSwap,
        uint32 lastSwap,
        PermissionSet[] permissions
    );
}

/// Receipt log decoder. When hub addresses are registered for a chain, only
/// Deposited events emitted by those contracts are accepted.
#[derive(Debug, Clone, Default)]
pub struct LogDecoder {
    hubs: HashMap<ChainId, Vec<Address>>,
}

impl LogDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hubs(hubs: HashMap<ChainId, Vec<Address>>) -> Self {
        Self { hubs }
    }

    /// Decode the identifiers relevant to `kind`
    pub fn decode(&self, logs: &[Log], chain_id: ChainId, kind: &TransactionKind) -> TrackerResult<DecodedIds> {
        match kind {
            TransactionKind::NewPair(_) => decode_pair_id(logs).map(DecodedIds::PairId),
            TransactionKind::NewPosition(_)
            | TransactionKind::MigratePosition(_)
            | TransactionKind::MigratePositionYield(_) => {
                self.decode_deposited(logs, chain_id).map(DecodedIds::PositionId)
            }
            TransactionKind::ApproveToken(_)
            | TransactionKind::ApproveTokenExact(_)
            | TransactionKind::WithdrawPosition(_)
            | TransactionKind::TerminatePosition(_)
            | TransactionKind::AddFundsPosition(_)
            | TransactionKind::RemoveFunds(_)
            | TransactionKind::ModifyRatePosition(_)
            | TransactionKind::ResetPosition(_)
            | TransactionKind::ModifyPermissions(_)
            | TransactionKind::NoOp => Ok(DecodedIds::None),
        }
    }

    /// `positionId` of the first Deposited event in `logs`
    pub fn decode_deposited(&self, logs: &[Log], chain_id: ChainId) -> TrackerResult<String> {
        let hubs = self.hubs.get(&chain_id);
        for log in logs {
            if let Some(hubs) = hubs {
                if !hubs.contains(&log.address) {
                    continue;
                }
            }
            if log.topics().first() != Some(&Deposited::SIGNATURE_HASH) {
                continue;
            }
            let event = Deposited::decode_log(log)
                .map_err(|e| TrackerError::LogDecode(format!("malformed Deposited: {}", e)))?;
            debug!(
                "Deposited on chain {}: position {} ({} -> {})",
                chain_id, event.data.positionId, event.data.fromToken, event.data.toToken
            );
            return Ok(event.data.positionId.to_string());
        }
        Err(TrackerError::LogDecode(format!(
            "no Deposited event among {} logs on chain {}",
            logs.len(),
            chain_id
        )))
    }
}

/// Pair id: the last log's data as a minimal hex quantity
pub fn decode_pair_id(logs: &[Log]) -> TrackerResult<String> {
    let last = logs
        .last()
        .ok_or_else(|| TrackerError::LogDecode("receipt has no logs".to_string()))?;
    Ok(hex_value(&last.data.data))
}

/// Hex quantity without leading zeros ("0x0" for zero / empty)
pub fn hex_value(data: &[u8]) -> String {
    let encoded = hex::encode(data);
    let trimmed = encoded.trim_start_matches('0');
    if trimmed.is_empty() {
        "0x0".to_string()
    } else {
        format!("0x{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{deposited_log, deposited_log_from, new_pair_kind, new_position_kind};
    use crate::types::MigratePositionData;
    use alloy::dyn_abi::DynSolValue;
    use alloy::primitives::{keccak256, Bytes, B256, U256};

    fn raw_log(data: Vec<u8>) -> Log {
        Log::new_unchecked(Address::repeat_byte(0x33), vec![B256::repeat_byte(0x01)], Bytes::from(data))
    }

    const HUB_V2_DEPOSITED: &str =
        "Deposited(address,address,uint256,address,address,uint32,uint120,uint32,uint32,(address,uint8[])[])";

    #[test]
    fn test_deposited_matches_hub_v2_abi() {
        assert_eq!(Deposited::SIGNATURE, HUB_V2_DEPOSITED);
        assert_eq!(Deposited::SIGNATURE_HASH, keccak256(HUB_V2_DEPOSITED));
    }

    #[test]
    fn test_decodes_hand_encoded_hub_log() {
        // Encoded from the ABI types directly, not through the sol! binding
        let uint = |v: u64, bits: usize| DynSolValue::Uint(U256::from(v), bits);
        let data = DynSolValue::Tuple(vec![
            uint(987, 256),
            DynSolValue::Address(Address::repeat_byte(0x01)),
            DynSolValue::Address(Address::repeat_byte(0x02)),
            uint(86_400, 32),
            uint(1_000_000, 120),
            uint(1, 32),
            uint(7, 32),
            DynSolValue::Array(vec![DynSolValue::Tuple(vec![
                DynSolValue::Address(Address::repeat_byte(0x44)),
                DynSolValue::Array(vec![uint(0, 8), uint(2, 8)]),
            ])]),
        ])
        .abi_encode_params();
        let log = Log::new_unchecked(
            Address::repeat_byte(0xaa),
            vec![
                keccak256(HUB_V2_DEPOSITED),
                Address::repeat_byte(0x11).into_word(),
                Address::repeat_byte(0x11).into_word(),
            ],
            Bytes::from(data),
        );

        let decoded = LogDecoder::new().decode(&[log], 10, &new_position_kind()).unwrap();
        assert_eq!(decoded, DecodedIds::PositionId("987".to_string()));
    }

    #[test]
    fn test_hex_value_strips_leading_zeros() {
        assert_eq!(hex_value(&[0x00, 0x00, 0x1a]), "0x1a");
        assert_eq!(hex_value(&[0x00, 0x0f, 0xff]), "0xfff");
        assert_eq!(hex_value(&[0u8; 32]), "0x0");
        assert_eq!(hex_value(&[]), "0x0");
    }

    #[test]
    fn test_new_pair_reads_last_log_data() {
        let mut id = [0u8; 32];
        id[31] = 0x2b;
        let logs = vec![raw_log(vec![0xff; 32]), raw_log(id.to_vec())];

        let decoded = LogDecoder::new().decode(&logs, 10, &new_pair_kind()).unwrap();
        assert_eq!(decoded, DecodedIds::PairId("0x2b".to_string()));
    }

    #[test]
    fn test_new_pair_without_logs_fails() {
        let err = LogDecoder::new().decode(&[], 10, &new_pair_kind()).unwrap_err();
        assert!(matches!(err, TrackerError::LogDecode(_)));
    }

    #[test]
    fn test_new_position_decodes_deposited() {
        let logs = vec![raw_log(vec![1, 2, 3]), deposited_log(U256::from(1234u64))];
        let decoded = LogDecoder::new().decode(&logs, 10, &new_position_kind()).unwrap();
        assert_eq!(decoded, DecodedIds::PositionId("1234".to_string()));
    }

    #[test]
    fn test_migration_decodes_deposited() {
        let kind = TransactionKind::MigratePosition(MigratePositionData {
            id: "5".to_string(),
            new_id: None,
        });
        let logs = vec![deposited_log(U256::from(6u64))];
        let decoded = LogDecoder::new().decode(&logs, 10, &kind).unwrap();
        assert_eq!(decoded, DecodedIds::PositionId("6".to_string()));
    }

    #[test]
    fn test_missing_deposited_is_decode_error() {
        let logs = vec![raw_log(vec![0u8; 32])];
        let err = LogDecoder::new().decode(&logs, 10, &new_position_kind()).unwrap_err();
        assert!(matches!(err, TrackerError::LogDecode(_)));
    }

    #[test]
    fn test_hub_filter_skips_foreign_emitters() {
        let hub = Address::repeat_byte(0xaa);
        let foreign = deposited_log_from(Address::repeat_byte(0xbb), U256::from(1u64));
        let ours = deposited_log_from(hub, U256::from(2u64));

        let decoder = LogDecoder::with_hubs(HashMap::from([(10, vec![hub])]));
        let decoded = decoder.decode(&[foreign.clone(), ours], 10, &new_position_kind()).unwrap();
        assert_eq!(decoded, DecodedIds::PositionId("2".to_string()));

        // No hubs registered for chain 137: any emitter accepted
        let decoded = decoder.decode(&[foreign], 137, &new_position_kind()).unwrap();
        assert_eq!(decoded, DecodedIds::PositionId("1".to_string()));
    }

    #[test]
    fn test_other_kinds_decode_nothing() {
        let decoded = LogDecoder::new().decode(&[], 10, &TransactionKind::NoOp).unwrap();
        assert_eq!(decoded, DecodedIds::None);
    }
}
