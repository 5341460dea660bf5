//! Tracker module
//!
//! Polls pending transactions against the node and drives each one to a
//! terminal state (confirmed, reverted or dropped).
//!
//! Author: AI-Generated
//! Created: 2026-10-17
//!
//! Architecture:
//!     policy.rs    — which pending records get re-queried this block
//!     fetcher.rs   — receipt / existence lookups behind the account precondition
//!     decoder.rs   — position and pair ids from receipt logs
//!     engine.rs    — per-tick state machine
//!     scheduler.rs — block polling and tick serialization

pub mod decoder;
pub mod engine;
pub mod fetcher;
pub mod policy;
pub mod scheduler;

pub use decoder::LogDecoder;
pub use engine::{Outcome, ReconciliationEngine, TickReport};
pub use fetcher::{FetchOutcome, ReceiptFetcher};
pub use policy::should_poll;
pub use scheduler::{BlockPoller, TickScheduler};
