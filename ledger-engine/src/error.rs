//! Error types for the ledger

use crate::money::Money;
use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
///
/// Every failure of `post_transaction` maps to exactly one variant so callers
/// can pick a response status or a resubmission policy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Request shape violation (fewer than two entries, missing reference, ...)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Unparsable or non-positive amount
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Direction other than "D" / "C"
    #[error("Invalid direction: {0}")]
    InvalidDirection(String),

    /// No account with this code
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// No transaction with this reference id
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    /// Debit and credit sums differ
    #[error("Imbalance: debit={debit}, credit={credit}")]
    Unbalanced {
        /// Sum of debit amounts
        debit: Money,
        /// Sum of credit amounts
        credit: Money,
    },

    /// Reference id already recorded
    #[error("Transaction {0} already exists")]
    DuplicateTransaction(String),

    /// Optimistic version check failed; nothing was committed
    #[error("Optimistic lock conflict: account {account} modified by others")]
    ConcurrencyConflict {
        /// Code of the account whose version moved
        account: String,
    },

    /// Underlying store failure
    #[error("Storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Stable machine-readable kind (metrics labels, API error types)
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidRequest(_) => "invalid_request",
            Error::InvalidAmount(_) => "invalid_amount",
            Error::InvalidDirection(_) => "invalid_direction",
            Error::AccountNotFound(_) => "account_not_found",
            Error::TransactionNotFound(_) => "transaction_not_found",
            Error::Unbalanced { .. } => "unbalanced",
            Error::DuplicateTransaction(_) => "duplicate_transaction",
            Error::ConcurrencyConflict { .. } => "concurrency_conflict",
            Error::Storage(_) => "storage_error",
        }
    }

    /// Detected before any mutation was attempted
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidRequest(_)
                | Error::InvalidAmount(_)
                | Error::InvalidDirection(_)
                | Error::AccountNotFound(_)
                | Error::Unbalanced { .. }
        )
    }
}

impl From<crate::money::MoneyError> for Error {
    fn from(err: crate::money::MoneyError) -> Self {
        Error::InvalidAmount(err.to_string())
    }
}

impl From<crate::storage::StoreError> for Error {
    fn from(err: crate::storage::StoreError) -> Self {
        use crate::storage::StoreError;

        match err {
            StoreError::UniqueViolation(reference_id) => Error::DuplicateTransaction(reference_id),
            StoreError::Conflict { account_id } => Error::ConcurrencyConflict {
                account: account_id.to_string(),
            },
            StoreError::Backend(msg) => Error::Storage(msg),
        }
    }
}
