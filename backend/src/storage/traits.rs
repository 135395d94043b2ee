//! Storage abstraction traits.
//!
//! The domain layer only ever talks to these traits, so the persistence
//! backend stays swappable and the account service can be exercised against
//! any implementation.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::models::account::{Account, NewAccount};
use crate::domain::models::customer::Customer;
use crate::domain::models::transaction::{NewTransaction, Transaction};

#[async_trait]
pub trait CustomerStore: Send + Sync {
    /// Persist a new customer and return it with its assigned id.
    async fn store_customer(
        &self,
        name: &str,
        national_id: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Customer>;

    /// Look up a customer by national id (unique).
    async fn find_customer_by_national_id(&self, national_id: &str) -> Result<Option<Customer>>;

    async fn get_customer(&self, customer_id: i64) -> Result<Option<Customer>>;
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Persist a new account and return it with its assigned id.
    async fn store_account(&self, account: &NewAccount) -> Result<Account>;

    /// Look up an account regardless of its active flag.
    async fn get_account(&self, account_id: i64) -> Result<Option<Account>>;

    /// Look up an account that is still active; deactivated accounts read
    /// as absent through this path.
    async fn get_active_account(&self, account_id: i64) -> Result<Option<Account>>;

    /// All active accounts in persisted order.
    async fn list_active_accounts(&self) -> Result<Vec<Account>>;

    /// Write back balance, active flag and policy state.
    async fn update_account(&self, account: &Account) -> Result<()>;

    /// Whether an account number is already taken.
    async fn account_number_exists(&self, number: &str) -> Result<bool>;
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Append one ledger entry and return it with its assigned id.
    async fn store_transaction(&self, entry: &NewTransaction) -> Result<Transaction>;

    /// Entries where the account is source or destination, newest first.
    /// Ordering is stable, so repeated calls return identical results.
    async fn list_transactions_for_account(&self, account_id: i64) -> Result<Vec<Transaction>>;

    /// Persist one account's updated state together with the ledger entry
    /// recording the change, atomically: either both writes land or none do.
    async fn commit_operation(
        &self,
        account: &Account,
        entry: &NewTransaction,
    ) -> Result<Transaction>;

    /// Persist both account balances of a transfer together with its single
    /// ledger entry, atomically: either all three writes land or none do.
    async fn commit_transfer(
        &self,
        source: &Account,
        destination: &Account,
        entry: &NewTransaction,
    ) -> Result<Transaction>;
}

/// Everything the account service needs from persistence.
pub trait BankStore: CustomerStore + AccountStore + TransactionStore {}

impl<T: CustomerStore + AccountStore + TransactionStore> BankStore for T {}
