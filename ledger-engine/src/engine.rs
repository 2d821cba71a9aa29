//! Posting engine
//!
//! Turns a [`PostingRequest`] into a committed [`Transaction`]:
//!
//! 1. shape validation
//! 2. idempotency pre-check on `reference_id`
//! 3. per-entry parsing, account resolution and debit/credit accumulation
//! 4. double-entry balance check
//! 5. one coordinator transaction: cascading insert, then one version-checked
//!    balance update per entry, then commit
//!
//! Steps 1-4 never touch storage state. A failure in step 5 rolls the whole
//! unit of work back. Conflicts are never retried here; callers resubmit.
//!
//! # Example
//!
//! ```
//! use ledger_engine::{AccountType, MemoryLedger, NewAccount, PostingEngine, PostingEntry, PostingRequest};
//! use std::sync::Arc;
//!
//! # async fn run() -> ledger_engine::Result<()> {
//! let store = Arc::new(MemoryLedger::new());
//! store.open_account(NewAccount::new("1001", "Cash", AccountType::Asset, "CNY"))?;
//! store.open_account(NewAccount::new("4001", "Revenue", AccountType::Income, "CNY"))?;
//!
//! let engine = PostingEngine::new(store);
//! let tx = engine
//!     .post_transaction(PostingRequest::new(
//!         "tx-1",
//!         "SALE",
//!         vec![PostingEntry::debit("1001", "50.00"), PostingEntry::credit("4001", "50.00")],
//!     ))
//!     .await?;
//! assert_eq!(tx.postings.len(), 2);
//! # Ok(())
//! # }
//! ```

use crate::{
    config::EngineConfig,
    metrics::Metrics,
    money::{ExchangeRate, Money},
    storage::{BalanceMutator, LedgerStore, LedgerTransaction, RecordInserter, StoreError},
    types::{Account, Direction, NewPosting, NewTransaction, PostingRequest, Transaction},
    Error, Result,
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Accounts resolved during validation, keyed by id
type ResolvedAccounts = HashMap<i64, Account>;

/// Double-entry posting engine over any [`LedgerStore`]
pub struct PostingEngine<S> {
    /// Storage capabilities
    store: Arc<S>,

    /// Request limits
    config: EngineConfig,

    /// Optional metrics sink
    metrics: Option<Arc<Metrics>>,
}

impl<S> Clone for PostingEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
            metrics: self.metrics.clone(),
        }
    }
}

impl<S> std::fmt::Debug for PostingEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostingEngine")
            .field("config", &self.config)
            .field("metrics", &self.metrics.is_some())
            .finish_non_exhaustive()
    }
}

impl<S: LedgerStore> PostingEngine<S> {
    /// Create an engine with default limits and no metrics
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            config: EngineConfig::default(),
            metrics: None,
        }
    }

    /// Override request limits
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach a metrics collector
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Underlying store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Active limits
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Attached metrics, if any
    pub fn metrics(&self) -> Option<&Arc<Metrics>> {
        self.metrics.as_ref()
    }

    /// Post a balanced transaction
    ///
    /// Returns the persisted transaction with its generated id, or exactly one
    /// error kind. Validation errors are raised before any write.
    pub async fn post_transaction(&self, request: PostingRequest) -> Result<Transaction> {
        let started = Instant::now();
        let reference_id = request.reference_id.clone();
        let entries = request.entries.len();

        let result = self.post(request).await;

        let elapsed = started.elapsed();
        if let Some(metrics) = &self.metrics {
            metrics.record_post_duration(elapsed.as_secs_f64());
        }

        match &result {
            Ok(transaction) => {
                info!(
                    reference_id = %transaction.reference_id,
                    transaction_id = transaction.id,
                    postings = transaction.postings.len(),
                    elapsed_us = elapsed.as_micros() as u64,
                    "Transaction posted"
                );
                if let Some(metrics) = &self.metrics {
                    metrics.record_posted(transaction.postings.len());
                }
            }
            Err(err) => {
                if err.is_validation() {
                    debug!(reference_id = %reference_id, entries, kind = err.kind(), "Posting invalid: {}", err)
                } else if let Error::Storage(_) = err {
                    error!(reference_id = %reference_id, "Posting failed: {}", err)
                } else {
                    warn!(reference_id = %reference_id, kind = err.kind(), "Posting rejected: {}", err)
                }
                if let Some(metrics) = &self.metrics {
                    metrics.record_rejected(err.kind());
                }
            }
        }

        result
    }

    /// Account by business code
    pub async fn account(&self, code: &str) -> Result<Account> {
        self.store
            .find_by_code(code)
            .await?
            .ok_or_else(|| Error::AccountNotFound(code.to_string()))
    }

    /// All accounts ordered by code
    pub async fn accounts(&self) -> Result<Vec<Account>> {
        Ok(self.store.list_accounts().await?)
    }

    /// Committed transaction by reference id
    pub async fn transaction(&self, reference_id: &str) -> Result<Transaction> {
        self.store
            .find_by_reference_id(reference_id)
            .await?
            .ok_or_else(|| Error::TransactionNotFound(reference_id.to_string()))
    }

    async fn post(&self, request: PostingRequest) -> Result<Transaction> {
        self.validate_shape(&request)?;

        if self
            .store
            .exists_by_reference_id(&request.reference_id)
            .await?
        {
            return Err(Error::DuplicateTransaction(request.reference_id));
        }

        let (postings, accounts) = self.resolve_entries(&request).await?;

        let PostingRequest {
            reference_id,
            tx_type,
            description,
            metadata,
            ..
        } = request;

        let transaction = NewTransaction {
            reference_id,
            tx_type,
            description,
            posted_at: Utc::now(),
            metadata,
            postings,
        };

        self.commit(transaction, accounts).await
    }

    fn validate_shape(&self, request: &PostingRequest) -> Result<()> {
        if request.reference_id.trim().is_empty() {
            return Err(Error::InvalidRequest("reference_id is required".to_string()));
        }
        if request.reference_id.chars().count() > self.config.max_reference_len {
            return Err(Error::InvalidRequest(format!(
                "reference_id exceeds {} characters",
                self.config.max_reference_len
            )));
        }
        if request.tx_type.trim().is_empty() {
            return Err(Error::InvalidRequest("tx_type is required".to_string()));
        }
        if request.tx_type.chars().count() > self.config.max_tx_type_len {
            return Err(Error::InvalidRequest(format!(
                "tx_type exceeds {} characters",
                self.config.max_tx_type_len
            )));
        }
        if request.entries.len() < 2 {
            return Err(Error::InvalidRequest(
                "Transaction must have at least 2 postings".to_string(),
            ));
        }
        if request.entries.len() > self.config.max_entries {
            return Err(Error::InvalidRequest(format!(
                "Transaction exceeds {} postings",
                self.config.max_entries
            )));
        }
        Ok(())
    }

    /// Parse every entry, resolve its account and check the balance invariant.
    async fn resolve_entries(
        &self,
        request: &PostingRequest,
    ) -> Result<(Vec<NewPosting>, ResolvedAccounts)> {
        let mut total_debit = Money::ZERO;
        let mut total_credit = Money::ZERO;
        let mut by_code: HashMap<&str, i64> = HashMap::new();
        let mut accounts = ResolvedAccounts::new();
        let mut postings = Vec::with_capacity(request.entries.len());

        for (index, entry) in request.entries.iter().enumerate() {
            let amount = Money::parse(&entry.amount)
                .map_err(|e| Error::InvalidAmount(format!("entry {}: {}", index, e)))?;
            if !amount.is_positive() {
                return Err(Error::InvalidAmount(format!(
                    "entry {}: amount must be positive, got {}",
                    index, entry.amount
                )));
            }

            let direction: Direction = entry.direction.parse()?;
            let overflow = || Error::InvalidAmount(format!("entry {}: total out of range", index));
            match direction {
                Direction::Debit => {
                    total_debit = total_debit.checked_add(amount).ok_or_else(overflow)?
                }
                Direction::Credit => {
                    total_credit = total_credit.checked_add(amount).ok_or_else(overflow)?
                }
            }

            let exchange_rate = match entry.exchange_rate.as_deref() {
                Some(rate) => ExchangeRate::parse(rate)
                    .map_err(|e| Error::InvalidAmount(format!("entry {}: {}", index, e)))?,
                None => ExchangeRate::ONE,
            };

            // Resolve once per code; repeated entries chain from this version.
            let account_id = match by_code.get(entry.account_code.as_str()) {
                Some(id) => *id,
                None => {
                    let account = self
                        .store
                        .find_by_code(&entry.account_code)
                        .await?
                        .ok_or_else(|| Error::AccountNotFound(entry.account_code.clone()))?;
                    let id = account.id;
                    by_code.insert(entry.account_code.as_str(), id);
                    accounts.insert(id, account);
                    id
                }
            };

            postings.push(NewPosting {
                account_id,
                direction,
                amount,
                exchange_rate,
            });
        }

        if total_debit != total_credit {
            return Err(Error::Unbalanced {
                debit: total_debit,
                credit: total_credit,
            });
        }

        Ok((postings, accounts))
    }

    async fn commit(
        &self,
        transaction: NewTransaction,
        accounts: ResolvedAccounts,
    ) -> Result<Transaction> {
        let mut tx = self.store.begin().await?;

        match self.write(&mut tx, &transaction, &accounts).await {
            Ok(record) => {
                tx.commit()
                    .await
                    .map_err(|e| store_error(e, &accounts))?;
                Ok(record)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(
                        reference_id = %transaction.reference_id,
                        "Rollback failed: {}", rollback_err
                    );
                }
                Err(err)
            }
        }
    }

    async fn write(
        &self,
        tx: &mut S::Tx,
        transaction: &NewTransaction,
        accounts: &ResolvedAccounts,
    ) -> Result<Transaction> {
        let record = tx
            .create_with_postings(transaction)
            .await
            .map_err(|e| store_error(e, accounts))?;

        // Stable sort: ascending account id, entry order within one account.
        let mut ordered: Vec<&NewPosting> = transaction.postings.iter().collect();
        ordered.sort_by_key(|posting| posting.account_id);

        let mut versions: HashMap<i64, i64> = accounts
            .iter()
            .map(|(id, account)| (*id, account.version))
            .collect();

        for posting in ordered {
            let account = accounts.get(&posting.account_id).ok_or_else(|| {
                Error::Storage(format!("account {} was not resolved", posting.account_id))
            })?;

            let delta = account
                .account_type
                .signed_delta(posting.direction, posting.amount)
                .ok_or_else(|| Error::InvalidAmount(posting.amount.to_string()))?;

            let expected_version = versions.get(&account.id).copied().unwrap_or(account.version);

            tx.update_balance(account.id, delta, expected_version)
                .await
                .map_err(|e| store_error(e, accounts))?;

            versions.insert(account.id, expected_version + 1);

            debug!(
                account = %account.code,
                delta = %delta,
                version = expected_version + 1,
                "Balance updated"
            );
        }

        Ok(record)
    }
}

/// Map a store failure, naming conflicting accounts by code
fn store_error(err: StoreError, accounts: &ResolvedAccounts) -> Error {
    match err {
        StoreError::Conflict { account_id } => Error::ConcurrencyConflict {
            account: accounts
                .get(&account_id)
                .map(|account| account.code.clone())
                .unwrap_or_else(|| account_id.to_string()),
        },
        other => Error::from(other),
    }
}
