//! FinScale Ledger Engine
//!
//! Double-entry posting engine with optimistic concurrency control.
//!
//! # Architecture
//!
//! - **Capabilities, not handles**: the engine talks to storage through
//!   [`storage::AccountLookup`], [`storage::RecordStore`] and a scoped
//!   [`storage::Coordinator`] transaction
//! - **Optimistic locking**: every balance update is a compare-and-set on the
//!   account version; no row is locked at read time
//! - **Exact money**: amounts are decimals, never floats
//!
//! # Invariants
//!
//! - Σ(debits) == Σ(credits) for every committed transaction
//! - A reference id is recorded at most once
//! - A transaction and all of its balance updates commit together or not at all
//! - Every successful balance update bumps the account version by exactly one

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod config;
pub mod engine;
pub mod error;
pub mod memory;
pub mod metrics;
pub mod money;
pub mod storage;
pub mod types;

// Re-exports
pub use config::EngineConfig;
pub use engine::PostingEngine;
pub use error::{Error, Result};
pub use memory::MemoryLedger;
pub use metrics::Metrics;
pub use money::{ExchangeRate, Money, MoneyError};
pub use storage::{LedgerStore, StoreError};
pub use types::{
    Account, AccountType, Direction, NewAccount, Posting, PostingEntry, PostingRequest,
    Transaction, TransactionSummary,
};
