//! Storage capabilities consumed by the posting engine
//!
//! The engine never holds a database handle. It talks to four capabilities:
//!
//! - [`AccountLookup`] - unlocked reads of accounts by code or id
//! - [`RecordStore`] - idempotency checks and reads of recorded transactions
//! - [`Coordinator`] - opens the all-or-nothing boundary ([`LedgerTransaction`])
//! - [`RecordInserter`] / [`BalanceMutator`] - writes, only inside that boundary
//!
//! Any backend implementing these is substitutable: Postgres in the service,
//! [`crate::memory::MemoryLedger`] in tests.

use crate::money::Money;
use crate::types::{Account, NewTransaction, Transaction};
use async_trait::async_trait;
use thiserror::Error;

/// Result type for storage operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Storage-level failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// `reference_id` uniqueness constraint rejected the insert
    #[error("duplicate reference id: {0}")]
    UniqueViolation(String),

    /// Conditional update matched zero rows
    #[error("optimistic lock conflict: account {account_id} modified by others")]
    Conflict {
        /// Account whose `(id, version)` predicate failed
        account_id: i64,
    },

    /// Transport, IO or driver failure
    #[error("{0}")]
    Backend(String),
}

/// Account directory (pure lookup, no business logic)
#[async_trait]
pub trait AccountLookup: Send + Sync {
    /// Find an account by business code
    async fn find_by_code(&self, code: &str) -> StoreResult<Option<Account>>;

    /// Find an account by id
    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Account>>;

    /// All accounts ordered by code
    async fn list_accounts(&self) -> StoreResult<Vec<Account>>;
}

/// Read side of the append-only record store
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Whether a transaction with this reference id has been committed
    async fn exists_by_reference_id(&self, reference_id: &str) -> StoreResult<bool>;

    /// Committed transaction with its postings
    async fn find_by_reference_id(&self, reference_id: &str) -> StoreResult<Option<Transaction>>;
}

/// Inserts a transaction together with its postings
#[async_trait]
pub trait RecordInserter: Send {
    /// Cascading insert; `UniqueViolation` when the reference id exists
    async fn create_with_postings(&mut self, transaction: &NewTransaction)
        -> StoreResult<Transaction>;
}

/// Version-checked balance mutation
#[async_trait]
pub trait BalanceMutator: Send {
    /// Atomically add `delta` to the balance and bump the version by one,
    /// only if the stored version equals `expected_version`.
    ///
    /// Zero matched rows must surface as [`StoreError::Conflict`].
    async fn update_balance(
        &mut self,
        account_id: i64,
        delta: Money,
        expected_version: i64,
    ) -> StoreResult<()>;
}

/// Scoped transactional context
///
/// Dropping a context without calling `commit` discards every staged write.
#[async_trait]
pub trait LedgerTransaction: RecordInserter + BalanceMutator {
    /// Make every staged write visible at once
    async fn commit(self) -> StoreResult<()>;

    /// Discard every staged write
    async fn rollback(self) -> StoreResult<()>;
}

/// Opens transactional contexts
#[async_trait]
pub trait Coordinator: Send + Sync {
    /// Context type handed to the engine
    type Tx: LedgerTransaction + 'static;

    /// Begin a new all-or-nothing unit of work
    async fn begin(&self) -> StoreResult<Self::Tx>;
}

/// Everything the posting engine needs from a backend
pub trait LedgerStore: AccountLookup + RecordStore + Coordinator + 'static {}

impl<T> LedgerStore for T where T: AccountLookup + RecordStore + Coordinator + 'static {}
