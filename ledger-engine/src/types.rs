//! Core types for the ledger
//!
//! Persisted records (`Account`, `Transaction`, `Posting`), their pre-insert
//! counterparts, and the transient `PostingRequest` accepted by the engine.

use crate::money::{ExchangeRate, Money};
use crate::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Accounting classification of an account
///
/// The numeric codes are the values stored in `ledger.accounts.account_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i16)]
pub enum AccountType {
    /// Resources owned
    Asset = 1,
    /// Obligations owed
    Liability = 2,
    /// Owner's residual interest
    Equity = 3,
    /// Revenue earned
    Income = 4,
    /// Costs incurred
    Expense = 5,
}

impl AccountType {
    /// Storage code
    pub fn code(self) -> i16 {
        self as i16
    }

    /// Decode a storage code
    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            1 => Some(AccountType::Asset),
            2 => Some(AccountType::Liability),
            3 => Some(AccountType::Equity),
            4 => Some(AccountType::Income),
            5 => Some(AccountType::Expense),
            _ => None,
        }
    }

    /// Side on which the balance of this account type grows
    pub fn normal_side(self) -> Direction {
        match self {
            AccountType::Asset | AccountType::Expense => Direction::Debit,
            AccountType::Liability | AccountType::Equity | AccountType::Income => {
                Direction::Credit
            }
        }
    }

    /// Balance change produced by posting `amount` on `direction`.
    ///
    /// Asset/Expense: debit `+amount`, credit `-amount`.
    /// Liability/Equity/Income: credit `+amount`, debit `-amount`.
    pub fn signed_delta(self, direction: Direction, amount: Money) -> Option<Money> {
        let multiplier = if direction == self.normal_side() { 1 } else { -1 };
        amount.times(multiplier)
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AccountType::Asset => "Asset",
            AccountType::Liability => "Liability",
            AccountType::Equity => "Equity",
            AccountType::Income => "Income",
            AccountType::Expense => "Expense",
        };
        f.write_str(name)
    }
}

/// Posting side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Debit ("D")
    #[serde(rename = "D")]
    Debit,
    /// Credit ("C")
    #[serde(rename = "C")]
    Credit,
}

impl Direction {
    /// Single-letter code used on the wire and in storage
    pub fn code(self) -> &'static str {
        match self {
            Direction::Debit => "D",
            Direction::Credit => "C",
        }
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "D" => Ok(Direction::Debit),
            "C" => Ok(Direction::Credit),
            other => Err(Error::InvalidDirection(other.to_string())),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Ledger account
///
/// `balance` and `version` only change through a `BalanceMutator`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Surrogate key
    pub id: i64,
    /// Unique business code (e.g. "1001")
    pub code: String,
    /// Display name
    pub name: String,
    /// Accounting classification
    pub account_type: AccountType,
    /// ISO 4217 currency code
    pub currency: String,
    /// Current balance
    pub balance: Money,
    /// Optimistic lock counter, starts at 1
    pub version: i64,
    /// Status code (1 = active)
    pub status: i16,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last balance change
    pub updated_at: DateTime<Utc>,
}

/// Account opened out-of-band (seed data, admin tooling, tests)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccount {
    /// Unique business code
    pub code: String,
    /// Display name
    pub name: String,
    /// Accounting classification
    pub account_type: AccountType,
    /// ISO 4217 currency code
    pub currency: String,
}

impl NewAccount {
    /// Convenience constructor
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        account_type: AccountType,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            account_type,
            currency: currency.into(),
        }
    }
}

/// One debit or credit line of a recorded transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    /// Surrogate key
    pub id: i64,
    /// Owning transaction
    pub transaction_id: i64,
    /// Referenced account (lookup only)
    pub account_id: i64,
    /// Debit or credit
    pub direction: Direction,
    /// Strictly positive amount
    pub amount: Money,
    /// Rate carried for multi-currency reporting
    pub exchange_rate: ExchangeRate,
}

/// Recorded, immutable transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Surrogate key
    pub id: i64,
    /// Idempotency key supplied by the caller
    pub reference_id: String,
    /// Free-form label (e.g. "TRANSFER")
    pub tx_type: String,
    /// Description
    pub description: String,
    /// Posting time
    pub posted_at: DateTime<Utc>,
    /// Opaque metadata
    pub metadata: Option<serde_json::Value>,
    /// Row creation time
    pub created_at: DateTime<Utc>,
    /// Ordered postings
    pub postings: Vec<Posting>,
}

impl Transaction {
    /// Summary returned to callers of `postTransaction`
    pub fn summary(&self) -> TransactionSummary {
        TransactionSummary {
            id: self.id,
            reference_id: self.reference_id.clone(),
            posted_at: self.posted_at,
        }
    }
}

/// Committed transaction summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSummary {
    /// Generated id
    pub id: i64,
    /// Idempotency key
    pub reference_id: String,
    /// Posting time
    pub posted_at: DateTime<Utc>,
}

/// Posting line before insertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPosting {
    /// Referenced account
    pub account_id: i64,
    /// Debit or credit
    pub direction: Direction,
    /// Strictly positive amount
    pub amount: Money,
    /// Carried rate
    pub exchange_rate: ExchangeRate,
}

/// Transaction before insertion; ids are assigned by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    /// Idempotency key
    pub reference_id: String,
    /// Free-form label
    pub tx_type: String,
    /// Description
    pub description: String,
    /// Posting time
    pub posted_at: DateTime<Utc>,
    /// Opaque metadata
    pub metadata: Option<serde_json::Value>,
    /// Ordered postings
    pub postings: Vec<NewPosting>,
}

/// One entry of a posting request, still in wire form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingEntry {
    /// Business code of the target account
    pub account_code: String,
    /// "D" or "C"
    pub direction: String,
    /// Decimal string, never a float
    pub amount: String,
    /// Optional decimal string, defaults to 1
    #[serde(default)]
    pub exchange_rate: Option<String>,
}

impl PostingEntry {
    /// Debit entry
    pub fn debit(account_code: impl Into<String>, amount: impl Into<String>) -> Self {
        Self::new(account_code, "D", amount)
    }

    /// Credit entry
    pub fn credit(account_code: impl Into<String>, amount: impl Into<String>) -> Self {
        Self::new(account_code, "C", amount)
    }

    /// Entry with an arbitrary direction string
    pub fn new(
        account_code: impl Into<String>,
        direction: impl Into<String>,
        amount: impl Into<String>,
    ) -> Self {
        Self {
            account_code: account_code.into(),
            direction: direction.into(),
            amount: amount.into(),
            exchange_rate: None,
        }
    }
}

/// Transient input of the posting engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingRequest {
    /// Idempotency key
    pub reference_id: String,
    /// Free-form label
    pub tx_type: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Ordered entries
    pub entries: Vec<PostingEntry>,
    /// Opaque metadata
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl PostingRequest {
    /// Request without description or metadata
    pub fn new(
        reference_id: impl Into<String>,
        tx_type: impl Into<String>,
        entries: Vec<PostingEntry>,
    ) -> Self {
        Self {
            reference_id: reference_id.into(),
            tx_type: tx_type.into(),
            description: String::new(),
            entries,
            metadata: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn money(s: &str) -> Money {
        Money::parse(s).unwrap()
    }

    #[test]
    fn test_account_type_codes() {
        for ty in [
            AccountType::Asset,
            AccountType::Liability,
            AccountType::Equity,
            AccountType::Income,
            AccountType::Expense,
        ] {
            assert_eq!(AccountType::from_code(ty.code()), Some(ty));
        }
        assert_eq!(AccountType::from_code(0), None);
        assert_eq!(AccountType::from_code(6), None);
    }

    #[test]
    fn test_signed_delta_debit_normal() {
        for ty in [AccountType::Asset, AccountType::Expense] {
            assert_eq!(ty.signed_delta(Direction::Debit, money("50.00")), Some(money("50.00")));
            assert_eq!(ty.signed_delta(Direction::Credit, money("50.00")), Some(money("-50.00")));
        }
    }

    #[test]
    fn test_signed_delta_credit_normal() {
        for ty in [AccountType::Liability, AccountType::Equity, AccountType::Income] {
            assert_eq!(ty.signed_delta(Direction::Credit, money("50.00")), Some(money("50.00")));
            assert_eq!(ty.signed_delta(Direction::Debit, money("50.00")), Some(money("-50.00")));
        }
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!("D".parse::<Direction>().unwrap(), Direction::Debit);
        assert_eq!("C".parse::<Direction>().unwrap(), Direction::Credit);
        assert!(matches!("X".parse::<Direction>(), Err(Error::InvalidDirection(_))));
        assert!(matches!("d".parse::<Direction>(), Err(Error::InvalidDirection(_))));
    }

    #[test]
    fn test_posting_entry_wire_format() {
        let entry: PostingEntry =
            serde_json::from_str(r#"{"account_code":"1001","direction":"D","amount":"50.00"}"#)
                .unwrap();
        assert_eq!(entry, PostingEntry::debit("1001", "50.00"));
    }
}
