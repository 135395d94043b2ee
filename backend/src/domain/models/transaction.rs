//! Ledger entry domain model.
//!
//! One immutable record per balance-affecting operation. A transfer is a
//! single record referencing both accounts, never a debit/credit pair.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::BankError;

pub const MAX_DESCRIPTION_LEN: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    Transfer,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "DEPOSIT",
            TransactionKind::Withdrawal => "WITHDRAWAL",
            TransactionKind::Transfer => "TRANSFER",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "DEPOSIT" => Some(TransactionKind::Deposit),
            "WITHDRAWAL" => Some(TransactionKind::Withdrawal),
            "TRANSFER" => Some(TransactionKind::Transfer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub kind: TransactionKind,
    /// Always positive; direction comes from the account references.
    pub amount: Decimal,
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
    /// None for pure deposits.
    pub source_account_id: Option<i64>,
    /// None for pure withdrawals.
    pub destination_account_id: Option<i64>,
}

/// Fields for a ledger entry that has not been persisted yet.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub source_account_id: Option<i64>,
    pub destination_account_id: Option<i64>,
}

/// Validate an optional ledger description against the 500-char cap.
pub fn validate_description(description: Option<&str>) -> Result<(), BankError> {
    if let Some(text) = description {
        if text.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(BankError::validation(
                "description",
                "description must be at most 500 characters",
            ));
        }
    }
    Ok(())
}
