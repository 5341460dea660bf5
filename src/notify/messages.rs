//! Transaction Message Builder
//!
//! Turns a finalized or rejected record into the text shown to the user.
//! One arm per transaction kind, so a new kind cannot ship without copy.
//!
//! Author: AI-Generated
//! Created: 2026-10-17

use crate::types::{TransactionKind, TransactionRecord};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Largest scale rust_decimal can represent
const MAX_DECIMAL_SCALE: u32 = 28;

/// Raw integer amount → human amount with `decimals` places, trailing zeros
/// trimmed. Values outside Decimal's range are returned unchanged.
pub fn format_units(raw: &str, decimals: u8) -> String {
    let mut value = match Decimal::from_str(raw.trim()) {
        Ok(v) => v,
        Err(_) => return raw.to_string(),
    };
    let scale = value.scale() + decimals as u32;
    if scale > MAX_DECIMAL_SCALE || value.set_scale(scale).is_err() {
        return raw.to_string();
    }
    value.normalize().to_string()
}

/// Success message for a confirmed transaction
pub fn build_transaction_message(record: &TransactionRecord) -> String {
    match &record.kind {
        TransactionKind::NewPosition(d) => format!(
            "Your position swapping {} {} to {} has been created",
            d.from_value, d.from.symbol, d.to.symbol
        ),
        TransactionKind::NewPair(d) => match &d.id {
            Some(id) => format!("The pair {}/{} has been created (pair {})", d.token0, d.token1, id),
            None => format!("The pair {}/{} has been created", d.token0, d.token1),
        },
        TransactionKind::ApproveToken(d) => {
            format!("{} has been approved for use with Mean Finance", d.token.symbol)
        }
        TransactionKind::ApproveTokenExact(d) => format!(
            "{} {} has been approved for use with Mean Finance",
            format_units(&d.amount, d.token.decimals),
            d.token.symbol
        ),
        TransactionKind::WithdrawPosition(d) => {
            format!("Swapped funds of position {} have been withdrawn", d.id)
        }
        TransactionKind::TerminatePosition(d) => {
            format!("Position {} has been closed and its funds returned", d.id)
        }
        TransactionKind::AddFundsPosition(d) => format!(
            "{} has been added to position {}",
            format_units(&d.new_funds, d.decimals),
            d.id
        ),
        TransactionKind::RemoveFunds(d) => format!(
            "{} has been removed from position {}",
            format_units(&d.amount_to_remove, d.decimals),
            d.id
        ),
        TransactionKind::ModifyRatePosition(d) => format!(
            "Position {} now swaps {} per period",
            d.id,
            format_units(&d.new_rate, d.decimals)
        ),
        TransactionKind::ResetPosition(d) => format!(
            "Position {} has been set to swap {} for {} periods",
            d.id,
            format_units(&d.new_rate, d.decimals),
            d.new_swaps
        ),
        TransactionKind::ModifyPermissions(d) => format!(
            "Permissions of your {}/{} position {} have been updated",
            d.from, d.to, d.id
        ),
        TransactionKind::MigratePosition(d) => match &d.new_id {
            Some(new_id) => format!("Position {} has been migrated to position {}", d.id, new_id),
            None => format!("Position {} has been migrated", d.id),
        },
        TransactionKind::MigratePositionYield(d) => match &d.new_id {
            Some(new_id) => format!(
                "Position {} has been migrated to position {} and is now generating yield",
                d.id, new_id
            ),
            None => format!("Position {} has been migrated and is now generating yield", d.id),
        },
        TransactionKind::NoOp => "Your transaction has been confirmed".to_string(),
    }
}

/// Error message for a dropped or reverted transaction
pub fn build_rejected_transaction_message(record: &TransactionRecord) -> String {
    let action = match &record.kind {
        TransactionKind::NewPosition(d) => {
            format!("Creating your {}/{} position", d.from.symbol, d.to.symbol)
        }
        TransactionKind::NewPair(d) => format!("Creating the pair {}/{}", d.token0, d.token1),
        TransactionKind::ApproveToken(d) => format!("Approving {}", d.token.symbol),
        TransactionKind::ApproveTokenExact(d) => format!(
            "Approving {} {}",
            format_units(&d.amount, d.token.decimals),
            d.token.symbol
        ),
        TransactionKind::WithdrawPosition(d) => format!("Withdrawing from position {}", d.id),
        TransactionKind::TerminatePosition(d) => format!("Closing position {}", d.id),
        TransactionKind::AddFundsPosition(d) => format!("Adding funds to position {}", d.id),
        TransactionKind::RemoveFunds(d) => format!("Removing funds from position {}", d.id),
        TransactionKind::ModifyRatePosition(d) => format!("Changing the rate of position {}", d.id),
        TransactionKind::ResetPosition(d) => format!("Resetting position {}", d.id),
        TransactionKind::ModifyPermissions(d) => {
            format!("Updating permissions of position {}", d.id)
        }
        TransactionKind::MigratePosition(d) | TransactionKind::MigratePositionYield(d) => {
            format!("Migrating position {}", d.id)
        }
        TransactionKind::NoOp => "Your transaction".to_string(),
    };
    format!("{} has failed or was dropped", action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{new_pair_kind, new_position_record, record};
    use crate::types::{AddFundsData, ApproveTokenExactData, MigratePositionData, Token};
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_units() {
        assert_eq!(format_units("1500000", 6), "1.5");
        assert_eq!(format_units("1000000000000000000", 18), "1");
        assert_eq!(format_units("42", 0), "42");
        assert_eq!(format_units("not-a-number", 6), "not-a-number");
        assert_eq!(format_units("1", 18), dec!(0.000000000000000001).to_string());
    }

    #[test]
    fn test_format_units_out_of_range_passthrough() {
        // U256::MAX allowance does not fit a Decimal
        let max = "115792089237316195423570985008687907853269984665640564039457584007913129639935";
        assert_eq!(format_units(max, 18), max);
    }

    #[test]
    fn test_new_position_message() {
        let r = new_position_record(0x01, 10);
        assert_eq!(
            build_transaction_message(&r),
            "Your position swapping 100 USDC to WETH has been created"
        );
        assert_eq!(
            build_rejected_transaction_message(&r),
            "Creating your USDC/WETH position has failed or was dropped"
        );
    }

    #[test]
    fn test_amount_kinds_use_token_decimals() {
        let mut r = record(0x01, 10);
        r.kind = TransactionKind::AddFundsPosition(AddFundsData {
            id: "7".to_string(),
            new_funds: "2500000".to_string(),
            decimals: 6,
        });
        assert_eq!(build_transaction_message(&r), "2.5 has been added to position 7");

        r.kind = TransactionKind::ApproveTokenExact(ApproveTokenExactData {
            token: Token::new(10, "0x01", "DAI", 18),
            address_for: "0xhub".to_string(),
            amount: "3000000000000000000".to_string(),
        });
        assert_eq!(
            build_transaction_message(&r),
            "3 DAI has been approved for use with Mean Finance"
        );
    }

    #[test]
    fn test_missing_decoded_ids_still_produce_messages() {
        let mut r = record(0x01, 10);
        r.kind = new_pair_kind();
        assert!(build_transaction_message(&r).ends_with("has been created"));

        r.kind = TransactionKind::MigratePosition(MigratePositionData {
            id: "3".to_string(),
            new_id: None,
        });
        assert_eq!(build_transaction_message(&r), "Position 3 has been migrated");
    }
}
