//! Request and response payload types for the banking HTTP API.
//!
//! These are wire-level DTOs only; the backend maps them to and from its
//! domain models. Field names follow the JSON contract (camelCase).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Body for `POST /accounts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    /// Name used only when the national id is not yet registered.
    pub customer_name: String,
    /// Exactly 11 digits, unique per customer.
    pub national_id: String,
    pub initial_balance: Decimal,
    /// "CHECKING" or "SAVINGS"; defaults to checking when omitted.
    pub kind: Option<String>,
}

/// Body for `POST /accounts/{id}/deposit` and `POST /accounts/{id}/withdraw`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationRequest {
    pub amount: Decimal,
    /// Free-form note recorded on the ledger entry (max 500 characters).
    pub description: Option<String>,
}

/// Body for `POST /transfers`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub source_id: i64,
    pub dest_id: i64,
    pub amount: Decimal,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub national_id: String,
    pub created_at: DateTime<Utc>,
}

/// Account representation returned by every account-facing endpoint.
///
/// Kind-specific fields are present only for the matching kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: i64,
    pub number: String,
    /// "CHECKING" or "SAVINGS".
    pub kind: String,
    pub balance: Decimal,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub customer: Customer,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overdraft_limit: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintenance_fee: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yield_rate: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anniversary_day: Option<u8>,
}

/// One ledger entry. A transfer references both accounts in a single record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i64,
    /// "DEPOSIT", "WITHDRAWAL" or "TRANSFER".
    pub kind: String,
    pub amount: Decimal,
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub source_account_id: Option<i64>,
    pub destination_account_id: Option<i64>,
}

/// Result of `POST /transfers`: both accounts after the move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResponse {
    pub source_account: Account,
    pub destination_account: Account,
    pub amount: Decimal,
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Structured error payload returned for every failed request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub timestamp: DateTime<Utc>,
    /// HTTP status code, duplicated in the body for log scraping.
    pub status: u16,
    /// Canonical reason phrase for the status.
    pub error: String,
    /// Machine-readable error code, stable across releases.
    pub code: String,
    pub message: String,
    /// Per-field messages, present only for validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<HashMap<String, String>>,
}
