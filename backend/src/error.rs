//! Error taxonomy for the banking service.
//!
//! Every failure a caller can observe is a [`BankError`] variant with a
//! stable machine-readable code. The HTTP boundary renders errors as the
//! structured [`shared::ApiError`] payload; internal detail never leaves
//! the server.

use std::collections::HashMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum BankError {
    /// Deposit/withdrawal amount was zero or negative.
    #[error("amount must be greater than zero")]
    InvalidAmount,

    /// National id is not exactly 11 digits, or is a single repeated digit.
    #[error("national id must contain exactly 11 digits")]
    InvalidNationalId,

    /// Malformed or out-of-range request fields.
    #[error("invalid request data")]
    Validation { field_errors: HashMap<String, String> },

    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: i64 },

    /// Withdrawal or transfer would exceed the overdraft headroom.
    #[error("insufficient funds, available balance: {available}")]
    InsufficientFunds { available: Decimal },

    #[error("source and destination accounts must be different")]
    SameAccount,

    /// Source account failed the transfer eligibility check.
    #[error("transfer not allowed for the source account")]
    TransferNotAllowed,

    #[error("unknown account kind: {0}")]
    UnknownAccountKind(String),

    /// Operation exists only for the other account kind, e.g. yield on a
    /// checking account.
    #[error("operation not supported for {kind} accounts")]
    UnsupportedForKind { kind: &'static str },

    /// The account was deactivated; modeled as a state conflict.
    #[error("account is not active")]
    AccountInactive,

    /// Anything unexpected. Detail is logged server-side only.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl BankError {
    /// Single-field validation failure.
    pub fn validation(field: &str, message: &str) -> Self {
        let mut field_errors = HashMap::new();
        field_errors.insert(field.to_string(), message.to_string());
        BankError::Validation { field_errors }
    }

    pub fn not_found(resource: &'static str, id: i64) -> Self {
        BankError::NotFound { resource, id }
    }

    /// Machine-readable code reported in the error payload.
    pub fn code(&self) -> &'static str {
        match self {
            BankError::InvalidAmount => "INVALID_AMOUNT",
            BankError::InvalidNationalId => "INVALID_NATIONAL_ID",
            BankError::Validation { .. } => "VALIDATION_ERROR",
            BankError::NotFound { .. } => "RESOURCE_NOT_FOUND",
            BankError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            BankError::SameAccount => "SAME_ACCOUNT",
            BankError::TransferNotAllowed => "TRANSFER_NOT_ALLOWED",
            BankError::UnknownAccountKind(_) => "INVALID_ACCOUNT_KIND",
            BankError::UnsupportedForKind { .. } => "UNSUPPORTED_OPERATION",
            BankError::AccountInactive => "ACCOUNT_INACTIVE",
            BankError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            BankError::InvalidAmount
            | BankError::InvalidNationalId
            | BankError::Validation { .. }
            | BankError::InsufficientFunds { .. }
            | BankError::SameAccount
            | BankError::TransferNotAllowed
            | BankError::UnknownAccountKind(_)
            | BankError::UnsupportedForKind { .. } => StatusCode::BAD_REQUEST,
            BankError::NotFound { .. } => StatusCode::NOT_FOUND,
            BankError::AccountInactive => StatusCode::CONFLICT,
            BankError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for BankError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self {
            BankError::Internal(err) => {
                error!("internal error: {err:?}");
                "Unexpected internal error, please try again later".to_string()
            }
            other => other.to_string(),
        };

        let field_errors = match &self {
            BankError::Validation { field_errors } => Some(field_errors.clone()),
            _ => None,
        };

        let body = shared::ApiError {
            timestamp: Utc::now(),
            status: status.as_u16(),
            error: status.canonical_reason().unwrap_or("").to_string(),
            code: self.code().to_string(),
            message,
            field_errors,
        };

        (status, Json(body)).into_response()
    }
}
