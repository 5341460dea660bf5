//! Poll-Eligibility Policy
//!
//! Decides whether a pending record is re-queried on this tick. Backs off as a
//! transaction ages: every block for the first 5 minutes, every 3rd block up
//! to an hour, then every 10th block.

use crate::types::TransactionRecord;
use chrono::{DateTime, Utc};

/// Pending longer than this (minutes) → poll every 3rd block
pub const SLOW_AFTER_MINUTES: f64 = 5.0;
/// Pending longer than this (minutes) → poll every 10th block
pub const SLOWEST_AFTER_MINUTES: f64 = 60.0;
/// Blocks between polls once past SLOW_AFTER_MINUTES
pub const SLOW_STRIDE_BLOCKS: u64 = 3;
/// Blocks between polls once past SLOWEST_AFTER_MINUTES
pub const SLOWEST_STRIDE_BLOCKS: u64 = 10;

pub fn should_poll(last_block_number: u64, record: &TransactionRecord, now: DateTime<Utc>) -> bool {
    if record.receipt.is_some() {
        return false;
    }
    let last_checked = match record.last_checked_block_number {
        Some(b) => b,
        None => return true,
    };

    let blocks_since_check = last_block_number.saturating_sub(last_checked);
    if blocks_since_check < 1 {
        return false;
    }

    let minutes_pending = (now.timestamp_millis() - record.added_time) as f64 / 1000.0 / 60.0;
    if minutes_pending > SLOWEST_AFTER_MINUTES {
        return blocks_since_check >= SLOWEST_STRIDE_BLOCKS;
    }
    if minutes_pending > SLOW_AFTER_MINUTES {
        return blocks_since_check >= SLOW_STRIDE_BLOCKS;
    }
    true
}
