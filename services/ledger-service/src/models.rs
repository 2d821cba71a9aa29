use chrono::{DateTime, Utc};
use ledger_engine::{PostingEntry, PostingRequest, Transaction};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/v1/ledger/transactions`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PostTransactionReq {
    pub reference_id: String,
    pub tx_type: String,
    #[serde(default)]
    pub description: String,
    /// At least one debit and one credit
    pub postings: Vec<PostingReq>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// One posting line; the amount must be a string, never a JSON number
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PostingReq {
    pub account_code: String,
    pub direction: String,
    pub amount: String,
    #[serde(default)]
    pub exchange_rate: Option<String>,
}

impl From<PostTransactionReq> for PostingRequest {
    fn from(req: PostTransactionReq) -> Self {
        PostingRequest {
            reference_id: req.reference_id,
            tx_type: req.tx_type,
            description: req.description,
            entries: req
                .postings
                .into_iter()
                .map(|p| PostingEntry {
                    account_code: p.account_code,
                    direction: p.direction,
                    amount: p.amount,
                    exchange_rate: p.exchange_rate,
                })
                .collect(),
            metadata: req.metadata,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PostTransactionResp {
    pub message: String,
    pub tx_id: i64,
    pub reference_id: String,
    pub posted_at: DateTime<Utc>,
}

impl From<&Transaction> for PostTransactionResp {
    fn from(tx: &Transaction) -> Self {
        let summary = tx.summary();
        Self {
            message: "Transaction posted successfully".to_string(),
            tx_id: summary.id,
            reference_id: summary.reference_id,
            posted_at: summary.posted_at,
        }
    }
}
