//! Banking account-management service.
//!
//! The crate is organized the same way end to end:
//!
//! - [`domain`] - entities (customer, account, ledger entry) and the
//!   account service that orchestrates every balance-affecting operation
//! - [`storage`] - storage traits plus the sqlx/SQLite implementation
//! - [`rest`] - axum handlers and the router
//! - [`error`] - the error taxonomy and its HTTP mapping

pub mod domain;
pub mod error;
pub mod rest;
pub mod storage;

pub use error::BankError;
