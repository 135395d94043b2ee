//! Customer domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::BankError;

pub const MAX_NAME_LEN: usize = 100;
pub const NATIONAL_ID_LEN: usize = 11;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    /// Exactly 11 digits, unique across customers.
    pub national_id: String,
    pub created_at: DateTime<Utc>,
}

/// Validate a national id: exactly 11 ASCII digits, and not a single
/// repeated digit (those pass the length check but are placeholder values).
pub fn validate_national_id(value: &str) -> Result<(), BankError> {
    let bytes = value.as_bytes();
    if bytes.len() != NATIONAL_ID_LEN || !bytes.iter().all(u8::is_ascii_digit) {
        return Err(BankError::InvalidNationalId);
    }
    if bytes.iter().all(|b| *b == bytes[0]) {
        return Err(BankError::InvalidNationalId);
    }
    Ok(())
}

/// Validate a customer name for registration: non-empty, at most 100 chars.
pub fn validate_customer_name(name: &str) -> Result<(), BankError> {
    if name.trim().is_empty() {
        return Err(BankError::validation("customerName", "name is required"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(BankError::validation(
            "customerName",
            "name must be at most 100 characters",
        ));
    }
    Ok(())
}
