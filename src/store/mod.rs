//! State Module
//!
//! Transaction records, latest block per chain, and JSON persistence.
//!
//! Author: AI-Generated
//! Created: 2026-10-17

pub mod blocks;
pub mod records;
pub mod snapshot;

pub use blocks::{BlockTracker, BlockUpdate};
pub use records::TransactionStore;
pub use snapshot::{load_store, save_store, StoreSnapshot};
