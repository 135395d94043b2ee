//! Account service: the single place that mutates customer, account and
//! ledger state.
//!
//! Entity-level rules (overdraft, active flag, positive amounts) live on
//! [`Account`]; this service adds the cross-entity ones: national-id
//! validation, find-or-create customers, unique account numbers, and the
//! rule that every balance change appends exactly one ledger entry.

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::domain::models::account::{Account, AccountKind, AccountPolicy, NewAccount};
use crate::domain::models::customer::{self, Customer};
use crate::domain::models::transaction::{
    self, NewTransaction, Transaction, TransactionKind,
};
use crate::error::BankError;
use crate::storage::traits::BankStore;

/// An account together with its owner, as most callers want to see it.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountView {
    pub account: Account,
    pub customer: Customer,
}

/// Outcome of a completed transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferOutcome {
    pub source: AccountView,
    pub destination: AccountView,
    pub entry: Transaction,
}

#[derive(Debug, Clone)]
pub struct CreateAccountCommand {
    pub customer_name: String,
    pub national_id: String,
    pub initial_balance: Decimal,
    /// Wire-level kind string; defaults to checking when absent.
    pub kind: Option<String>,
}

#[derive(Clone)]
pub struct AccountService<S> {
    store: S,
}

impl<S: BankStore> AccountService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Create an account, registering the customer on first contact.
    ///
    /// The customer is keyed by national id: if it already exists the name
    /// on the request is ignored. A positive opening balance is recorded as
    /// an "Initial deposit" ledger entry.
    pub async fn create_account(
        &self,
        command: CreateAccountCommand,
    ) -> Result<AccountView, BankError> {
        customer::validate_national_id(&command.national_id)?;

        if command.initial_balance < Decimal::ZERO {
            return Err(BankError::validation(
                "initialBalance",
                "initial balance must be zero or positive",
            ));
        }

        let kind = match &command.kind {
            Some(value) => AccountKind::parse(value)?,
            None => AccountKind::Checking,
        };

        let customer = match self
            .store
            .find_customer_by_national_id(&command.national_id)
            .await?
        {
            Some(existing) => existing,
            None => {
                customer::validate_customer_name(&command.customer_name)?;
                self.store
                    .store_customer(&command.customer_name, &command.national_id, Utc::now())
                    .await?
            }
        };

        let now = Utc::now();
        let number = self.generate_account_number().await?;
        let initial_balance = command.initial_balance.round_dp(2);

        let account = self
            .store
            .store_account(&NewAccount {
                number,
                customer_id: customer.id,
                balance: initial_balance,
                created_at: now,
                policy: AccountPolicy::for_kind(kind, now),
            })
            .await?;

        if initial_balance > Decimal::ZERO {
            self.store
                .store_transaction(&NewTransaction {
                    kind: TransactionKind::Deposit,
                    amount: initial_balance,
                    description: Some("Initial deposit".to_string()),
                    occurred_at: now,
                    source_account_id: None,
                    destination_account_id: Some(account.id),
                })
                .await?;
        }

        info!(
            account_id = account.id,
            number = %account.number,
            kind = account.kind().as_str(),
            "account created"
        );
        Ok(AccountView { account, customer })
    }

    /// Active accounts with their owners, in persisted order.
    pub async fn list_accounts(&self) -> Result<Vec<AccountView>, BankError> {
        let accounts = self.store.list_active_accounts().await?;
        let mut views = Vec::with_capacity(accounts.len());
        for account in accounts {
            let customer = self.owner_of(&account).await?;
            views.push(AccountView { account, customer });
        }
        Ok(views)
    }

    pub async fn get_account(&self, account_id: i64) -> Result<AccountView, BankError> {
        let account = self.load_active_account(account_id).await?;
        let customer = self.owner_of(&account).await?;
        Ok(AccountView { account, customer })
    }

    pub async fn deposit(
        &self,
        account_id: i64,
        amount: Decimal,
        description: Option<String>,
    ) -> Result<AccountView, BankError> {
        transaction::validate_description(description.as_deref())?;
        let amount = amount.round_dp(2);

        let mut account = self.load_active_account(account_id).await?;
        account.deposit(amount)?;
        self.store
            .commit_operation(
                &account,
                &NewTransaction {
                    kind: TransactionKind::Deposit,
                    amount,
                    description,
                    occurred_at: Utc::now(),
                    source_account_id: None,
                    destination_account_id: Some(account.id),
                },
            )
            .await?;

        info!(account_id, %amount, "deposit applied");
        let customer = self.owner_of(&account).await?;
        Ok(AccountView { account, customer })
    }

    pub async fn withdraw(
        &self,
        account_id: i64,
        amount: Decimal,
        description: Option<String>,
    ) -> Result<AccountView, BankError> {
        transaction::validate_description(description.as_deref())?;
        let amount = amount.round_dp(2);

        let mut account = self.load_active_account(account_id).await?;
        account.withdraw(amount)?;
        self.store
            .commit_operation(
                &account,
                &NewTransaction {
                    kind: TransactionKind::Withdrawal,
                    amount,
                    description,
                    occurred_at: Utc::now(),
                    source_account_id: Some(account.id),
                    destination_account_id: None,
                },
            )
            .await?;

        info!(account_id, %amount, "withdrawal applied");
        let customer = self.owner_of(&account).await?;
        Ok(AccountView { account, customer })
    }

    /// Move funds between two accounts.
    ///
    /// Eligibility is checked on the source before anything is debited, and
    /// both balance writes plus the single ledger entry are committed
    /// atomically by the store, so a failed transfer leaves both accounts
    /// untouched.
    pub async fn transfer(
        &self,
        source_id: i64,
        dest_id: i64,
        amount: Decimal,
        description: Option<String>,
    ) -> Result<TransferOutcome, BankError> {
        if source_id == dest_id {
            return Err(BankError::SameAccount);
        }
        transaction::validate_description(description.as_deref())?;
        let amount = amount.round_dp(2);

        let mut source = self.load_active_account(source_id).await?;
        let mut destination = self.load_active_account(dest_id).await?;

        if !source.can_transfer(amount) {
            warn!(source_id, dest_id, %amount, "transfer rejected by eligibility check");
            return Err(BankError::TransferNotAllowed);
        }

        source.withdraw(amount)?;
        destination.deposit(amount)?;

        let entry = self
            .store
            .commit_transfer(
                &source,
                &destination,
                &NewTransaction {
                    kind: TransactionKind::Transfer,
                    amount,
                    description,
                    occurred_at: Utc::now(),
                    source_account_id: Some(source.id),
                    destination_account_id: Some(destination.id),
                },
            )
            .await?;

        info!(source_id, dest_id, %amount, "transfer committed");

        let source_customer = self.owner_of(&source).await?;
        let destination_customer = self.owner_of(&destination).await?;
        Ok(TransferOutcome {
            source: AccountView {
                account: source,
                customer: source_customer,
            },
            destination: AccountView {
                account: destination,
                customer: destination_customer,
            },
            entry,
        })
    }

    /// Ledger entries touching the account, newest first.
    pub async fn history(&self, account_id: i64) -> Result<Vec<Transaction>, BankError> {
        // Confirm the account exists before reading its ledger.
        self.load_active_account(account_id).await?;
        Ok(self.store.list_transactions_for_account(account_id).await?)
    }

    async fn load_active_account(&self, account_id: i64) -> Result<Account, BankError> {
        self.store
            .get_active_account(account_id)
            .await?
            .ok_or_else(|| BankError::not_found("Account", account_id))
    }

    async fn owner_of(&self, account: &Account) -> Result<Customer, BankError> {
        self.store
            .get_customer(account.customer_id)
            .await?
            .ok_or_else(|| BankError::not_found("Customer", account.customer_id))
    }

    /// Generate a 10-digit account number and retry until it is unused.
    /// Collisions are vanishingly rare (nanosecond clock bits), so retrying
    /// is cheaper than reserving numbers structurally.
    async fn generate_account_number(&self) -> Result<String, BankError> {
        loop {
            let nanos = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_err(|e| BankError::Internal(anyhow::anyhow!("system clock error: {e}")))?
                .as_nanos();
            let number = format!("{:010}", nanos % 10_000_000_000);
            if !self.store.account_number_exists(&number).await? {
                return Ok(number);
            }
        }
    }
}
