//! In-memory ledger store
//!
//! Behaves like a relational store with row-level compare-and-set: writes are
//! staged in a [`MemoryTransaction`] and applied under one write lock at commit,
//! after re-checking the reference-id uniqueness constraint and the version of
//! every touched account. Nothing is visible before commit, and a dropped
//! transaction leaves no trace.

use crate::money::Money;
use crate::storage::{
    AccountLookup, BalanceMutator, Coordinator, LedgerTransaction, RecordInserter, RecordStore,
    StoreError, StoreResult,
};
use crate::types::{Account, NewAccount, NewTransaction, Posting, Transaction};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

#[derive(Debug)]
struct LedgerState {
    accounts: BTreeMap<i64, Account>,
    codes: HashMap<String, i64>,
    transactions: BTreeMap<i64, Transaction>,
    references: HashMap<String, i64>,
    next_account_id: i64,
    next_transaction_id: i64,
    next_posting_id: i64,
}

impl Default for LedgerState {
    fn default() -> Self {
        Self {
            accounts: BTreeMap::new(),
            codes: HashMap::new(),
            transactions: BTreeMap::new(),
            references: HashMap::new(),
            next_account_id: 1,
            next_transaction_id: 1,
            next_posting_id: 1,
        }
    }
}

/// Shared in-memory store; clones share state
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    state: Arc<RwLock<LedgerState>>,
}

impl MemoryLedger {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an account with a zero balance at version 1
    pub fn open_account(&self, account: NewAccount) -> StoreResult<Account> {
        let mut state = self.state.write();

        if state.codes.contains_key(&account.code) {
            return Err(StoreError::Backend(format!(
                "account code {} already exists",
                account.code
            )));
        }

        let id = state.next_account_id;
        state.next_account_id += 1;

        let now = Utc::now();
        let record = Account {
            id,
            code: account.code,
            name: account.name,
            account_type: account.account_type,
            currency: account.currency,
            balance: Money::ZERO,
            version: 1,
            status: 1,
            created_at: now,
            updated_at: now,
        };

        state.codes.insert(record.code.clone(), id);
        state.accounts.insert(id, record.clone());

        tracing::debug!(account_id = id, code = %record.code, "Account opened");

        Ok(record)
    }

    /// Number of committed transactions
    pub fn transaction_count(&self) -> usize {
        self.state.read().transactions.len()
    }
}

#[async_trait]
impl AccountLookup for MemoryLedger {
    async fn find_by_code(&self, code: &str) -> StoreResult<Option<Account>> {
        let state = self.state.read();
        Ok(state
            .codes
            .get(code)
            .and_then(|id| state.accounts.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Account>> {
        Ok(self.state.read().accounts.get(&id).cloned())
    }

    async fn list_accounts(&self) -> StoreResult<Vec<Account>> {
        let mut accounts: Vec<Account> = self.state.read().accounts.values().cloned().collect();
        accounts.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(accounts)
    }
}

#[async_trait]
impl RecordStore for MemoryLedger {
    async fn exists_by_reference_id(&self, reference_id: &str) -> StoreResult<bool> {
        Ok(self.state.read().references.contains_key(reference_id))
    }

    async fn find_by_reference_id(&self, reference_id: &str) -> StoreResult<Option<Transaction>> {
        let state = self.state.read();
        Ok(state
            .references
            .get(reference_id)
            .and_then(|id| state.transactions.get(id))
            .cloned())
    }
}

#[async_trait]
impl Coordinator for MemoryLedger {
    type Tx = MemoryTransaction;

    async fn begin(&self) -> StoreResult<MemoryTransaction> {
        Ok(MemoryTransaction {
            state: Arc::clone(&self.state),
            inserts: Vec::new(),
            balances: BTreeMap::new(),
        })
    }
}

/// Staged balance change of one account
#[derive(Debug, Clone, Copy)]
struct PendingBalance {
    /// Committed version observed by the first update
    base_version: i64,
    /// Version after the staged updates
    version: i64,
    /// Accumulated delta
    delta: Money,
}

/// Unit of work over a [`MemoryLedger`]
#[derive(Debug)]
pub struct MemoryTransaction {
    state: Arc<RwLock<LedgerState>>,
    inserts: Vec<Transaction>,
    balances: BTreeMap<i64, PendingBalance>,
}

impl MemoryTransaction {
    /// A version mismatch caused by a committed duplicate of our own insert is
    /// reported as the duplicate; a unique index would have blocked us there first.
    fn conflict(&self, state: &LedgerState, account_id: i64) -> StoreError {
        match self
            .inserts
            .iter()
            .find(|tx| state.references.contains_key(&tx.reference_id))
        {
            Some(tx) => StoreError::UniqueViolation(tx.reference_id.clone()),
            None => StoreError::Conflict { account_id },
        }
    }
}

#[async_trait]
impl RecordInserter for MemoryTransaction {
    async fn create_with_postings(
        &mut self,
        transaction: &NewTransaction,
    ) -> StoreResult<Transaction> {
        let duplicate_staged = self
            .inserts
            .iter()
            .any(|tx| tx.reference_id == transaction.reference_id);

        let mut state = self.state.write();

        if duplicate_staged || state.references.contains_key(&transaction.reference_id) {
            return Err(StoreError::UniqueViolation(transaction.reference_id.clone()));
        }

        // Ids are consumed even if the unit of work is rolled back, like sequences.
        let id = state.next_transaction_id;
        state.next_transaction_id += 1;

        let mut postings = Vec::with_capacity(transaction.postings.len());
        for posting in &transaction.postings {
            let posting_id = state.next_posting_id;
            state.next_posting_id += 1;

            postings.push(Posting {
                id: posting_id,
                transaction_id: id,
                account_id: posting.account_id,
                direction: posting.direction,
                amount: posting.amount,
                exchange_rate: posting.exchange_rate,
            });
        }
        drop(state);

        let record = Transaction {
            id,
            reference_id: transaction.reference_id.clone(),
            tx_type: transaction.tx_type.clone(),
            description: transaction.description.clone(),
            posted_at: transaction.posted_at,
            metadata: transaction.metadata.clone(),
            created_at: Utc::now(),
            postings,
        };

        self.inserts.push(record.clone());
        Ok(record)
    }
}

#[async_trait]
impl BalanceMutator for MemoryTransaction {
    async fn update_balance(
        &mut self,
        account_id: i64,
        delta: Money,
        expected_version: i64,
    ) -> StoreResult<()> {
        let state = self.state.read();

        let committed_version = match state.accounts.get(&account_id) {
            Some(account) => account.version,
            None => return Err(StoreError::Conflict { account_id }),
        };

        match self.balances.get(&account_id).copied() {
            Some(pending) => {
                if pending.version != expected_version || committed_version != pending.base_version
                {
                    return Err(self.conflict(&state, account_id));
                }
                let delta = pending
                    .delta
                    .checked_add(delta)
                    .ok_or_else(|| StoreError::Backend("balance overflow".to_string()))?;
                drop(state);

                self.balances.insert(
                    account_id,
                    PendingBalance {
                        version: pending.version + 1,
                        delta,
                        ..pending
                    },
                );
            }
            None => {
                if committed_version != expected_version {
                    return Err(self.conflict(&state, account_id));
                }
                drop(state);

                self.balances.insert(
                    account_id,
                    PendingBalance {
                        base_version: expected_version,
                        version: expected_version + 1,
                        delta,
                    },
                );
            }
        }

        Ok(())
    }
}

#[async_trait]
impl LedgerTransaction for MemoryTransaction {
    async fn commit(self) -> StoreResult<()> {
        let mut state = self.state.write();

        for tx in &self.inserts {
            if state.references.contains_key(&tx.reference_id) {
                return Err(StoreError::UniqueViolation(tx.reference_id.clone()));
            }
        }

        let mut updated = Vec::with_capacity(self.balances.len());
        for (&account_id, pending) in &self.balances {
            let account = state
                .accounts
                .get(&account_id)
                .ok_or(StoreError::Conflict { account_id })?;
            if account.version != pending.base_version {
                return Err(StoreError::Conflict { account_id });
            }
            let balance = account
                .balance
                .checked_add(pending.delta)
                .ok_or_else(|| StoreError::Backend("balance overflow".to_string()))?;
            updated.push((account_id, balance, pending.version));
        }

        // Validation passed; apply everything under the same lock.
        let now = Utc::now();
        for (account_id, balance, version) in updated {
            if let Some(account) = state.accounts.get_mut(&account_id) {
                account.balance = balance;
                account.version = version;
                account.updated_at = now;
            }
        }

        for tx in self.inserts {
            state.references.insert(tx.reference_id.clone(), tx.id);
            state.transactions.insert(tx.id, tx);
        }

        Ok(())
    }

    async fn rollback(self) -> StoreResult<()> {
        tracing::debug!(
            staged_inserts = self.inserts.len(),
            staged_balances = self.balances.len(),
            "Memory transaction rolled back"
        );
        Ok(())
    }
}
