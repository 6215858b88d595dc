use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::WalletError;
use crate::types::{Amount, TransactionId};

// ── Type & status ────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Receive,
    Send,
    Topup,
    Transfer,
}

/// Lifecycle of a ledger record. `Prepared` is the only entry state;
/// `Completed` and `Error` are terminal, `Pending` waits on the mint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Prepared,
    Pending,
    Completed,
    Error,
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Prepared => "PREPARED",
            Self::Pending => "PENDING",
            Self::Completed => "COMPLETED",
            Self::Error => "ERROR",
        };
        f.write_str(s)
    }
}

// ── History ──────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub name: String,
    pub message: String,
    pub mint_url: Option<String>,
}

impl ErrorDetail {
    /// History-safe rendering of `err`, with the message cut to the
    /// configured number of characters.
    pub fn from_error(err: &WalletError, mint_url: Option<&str>, limit: usize) -> Self {
        Self {
            name: err.name().to_string(),
            message: err.to_string().chars().take(limit).collect(),
            mint_url: mint_url.map(str::to_string),
        }
    }
}

/// One entry of a transaction's append-only history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionData {
    pub status: TransactionStatus,
    pub amount: Option<Amount>,
    pub error: Option<ErrorDetail>,
    pub created_at: DateTime<Utc>,
}

impl TransactionData {
    pub fn new(status: TransactionStatus) -> Self {
        Self {
            status,
            amount: None,
            error: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_amount(mut self, amount: Amount) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_error(mut self, error: ErrorDetail) -> Self {
        self.error = Some(error);
        self
    }
}

// ── Records ──────────────────────────────────────────────────────────────────

/// What a caller supplies to open a ledger record; the ledger assigns the id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewTransaction {
    pub tx_type: TransactionType,
    pub amount: Amount,
    pub data: TransactionData,
    pub memo: Option<String>,
    pub mint_url: String,
    pub status: TransactionStatus,
}

impl NewTransaction {
    /// A receive in `Prepared` state with its first history entry.
    pub fn prepared_receive(amount: Amount, mint_url: &str, memo: &str) -> Self {
        Self {
            tx_type: TransactionType::Receive,
            amount,
            data: TransactionData::new(TransactionStatus::Prepared).with_amount(amount),
            memo: Some(memo.to_string()),
            mint_url: mint_url.to_string(),
            status: TransactionStatus::Prepared,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: TransactionId,
    pub tx_type: TransactionType,
    pub amount: Amount,
    /// Every status transition, oldest first.
    pub history: Vec<TransactionData>,
    pub memo: Option<String>,
    pub mint_url: String,
    pub status: TransactionStatus,
    /// Wallet balance right after this transaction settled.
    pub balance_after: Option<Amount>,
    pub created_at: DateTime<Utc>,
}

impl TransactionRecord {
    pub fn from_new(id: TransactionId, tx: NewTransaction) -> Self {
        let created_at = tx.data.created_at;
        Self {
            id,
            tx_type: tx.tx_type,
            amount: tx.amount,
            history: vec![tx.data],
            memo: tx.memo,
            mint_url: tx.mint_url,
            status: tx.status,
            balance_after: None,
            created_at,
        }
    }

    /// Append `entry` and move to `status`. Prior entries are never touched.
    pub fn transition(&mut self, status: TransactionStatus, entry: TransactionData) {
        self.history.push(entry);
        self.status = status;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_append_history() {
        let new = NewTransaction::prepared_receive(13, "https://mint.test", "Wallet recovery");
        let mut tx = TransactionRecord::from_new(7, new);
        assert_eq!(tx.status, TransactionStatus::Prepared);
        assert_eq!(tx.history.len(), 1);

        tx.transition(
            TransactionStatus::Completed,
            TransactionData::new(TransactionStatus::Completed),
        );
        assert_eq!(tx.status, TransactionStatus::Completed);
        assert_eq!(tx.history.len(), 2);
        assert_eq!(tx.history[0].status, TransactionStatus::Prepared);
        assert_eq!(tx.history[0].amount, Some(13));
        assert!(tx.status.is_terminal());
    }

    #[test]
    fn error_detail_is_truncated() {
        let err = WalletError::mint("https://mint.test", "x".repeat(300));
        let detail = ErrorDetail::from_error(&err, Some("https://mint.test"), 100);
        assert_eq!(detail.name, "MINT_ERROR");
        assert_eq!(detail.message.chars().count(), 100);
        assert_eq!(detail.mint_url.as_deref(), Some("https://mint.test"));
    }

    #[test]
    fn status_serializes_upper_case() {
        let json = serde_json::to_string(&TransactionStatus::Completed).unwrap();
        assert_eq!(json, "\"COMPLETED\"");
    }
}
