//! sqlx/SQLite implementation of the storage traits.
//!
//! Decimals and timestamps are stored as TEXT (scale-2 decimal strings and
//! RFC 3339) and parsed on read, which keeps balance arithmetic exact and
//! the schema portable. The transfer commit runs inside one database
//! transaction so a debit can never land without its matching credit and
//! ledger entry.

use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool};

use crate::domain::models::account::{
    Account, AccountPolicy, CheckingPolicy, NewAccount, SavingsPolicy,
};
use crate::domain::models::customer::Customer;
use crate::domain::models::transaction::{NewTransaction, Transaction, TransactionKind};
use crate::storage::traits::{AccountStore, CustomerStore, TransactionStore};

const DATABASE_URL: &str = "sqlite:banking.db";

/// SQLite-backed store for customers, accounts and the transaction ledger.
#[derive(Clone)]
pub struct SqliteStore {
    pool: Arc<SqlitePool>,
}

impl SqliteStore {
    /// Connect to the given database URL, creating the database and schema
    /// if they do not exist yet.
    pub async fn new(url: &str) -> Result<Self> {
        if !Sqlite::database_exists(url).await.unwrap_or(false) {
            Sqlite::create_database(url).await?;
        }

        let pool = SqlitePool::connect(url).await?;
        Self::setup_schema(&pool).await?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Open the standard on-disk database.
    pub async fn init() -> Result<Self> {
        Self::new(DATABASE_URL).await
    }

    /// Open a uniquely named in-memory database so tests stay isolated.
    #[cfg(test)]
    pub async fn init_test() -> Result<Self> {
        let test_id = uuid::Uuid::new_v4().to_string();
        let url = format!("file:memdb_{}?mode=memory&cache=shared", test_id);
        Self::new(&url).await
    }

    async fn setup_schema(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS customers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                national_id TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS accounts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                number TEXT NOT NULL UNIQUE,
                customer_id INTEGER NOT NULL REFERENCES customers(id),
                kind TEXT NOT NULL,
                balance TEXT NOT NULL,
                active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                overdraft_limit TEXT,
                maintenance_fee TEXT,
                yield_rate TEXT,
                last_yield_applied_at TEXT,
                anniversary_day INTEGER
            );
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                kind TEXT NOT NULL,
                amount TEXT NOT NULL,
                description TEXT,
                occurred_at TEXT NOT NULL,
                source_account_id INTEGER REFERENCES accounts(id),
                destination_account_id INTEGER REFERENCES accounts(id)
            );
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }
}

fn parse_timestamp(text: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(text)
        .with_context(|| format!("malformed timestamp in storage: {text}"))?;
    Ok(parsed.with_timezone(&Utc))
}

fn parse_decimal(text: &str) -> Result<Decimal> {
    Decimal::from_str(text).with_context(|| format!("malformed decimal in storage: {text}"))
}

fn customer_from_row(row: &SqliteRow) -> Result<Customer> {
    Ok(Customer {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        national_id: row.try_get("national_id")?,
        created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?)?,
    })
}

fn account_from_row(row: &SqliteRow) -> Result<Account> {
    let kind: String = row.try_get("kind")?;
    let policy = match kind.as_str() {
        "CHECKING" => AccountPolicy::Checking(CheckingPolicy {
            overdraft_limit: parse_decimal(&row.try_get::<String, _>("overdraft_limit")?)?,
            maintenance_fee: parse_decimal(&row.try_get::<String, _>("maintenance_fee")?)?,
        }),
        "SAVINGS" => AccountPolicy::Savings(SavingsPolicy {
            yield_rate: parse_decimal(&row.try_get::<String, _>("yield_rate")?)?,
            last_yield_applied_at: row
                .try_get::<Option<String>, _>("last_yield_applied_at")?
                .map(|text| parse_timestamp(&text))
                .transpose()?,
            anniversary_day: row.try_get::<i64, _>("anniversary_day")? as u8,
        }),
        other => return Err(anyhow!("unknown account kind in storage: {other}")),
    };

    Ok(Account {
        id: row.try_get("id")?,
        number: row.try_get("number")?,
        customer_id: row.try_get("customer_id")?,
        balance: parse_decimal(&row.try_get::<String, _>("balance")?)?,
        active: row.try_get::<i64, _>("active")? != 0,
        created_at: parse_timestamp(&row.try_get::<String, _>("created_at")?)?,
        policy,
    })
}

fn transaction_from_row(row: &SqliteRow) -> Result<Transaction> {
    let kind: String = row.try_get("kind")?;
    Ok(Transaction {
        id: row.try_get("id")?,
        kind: TransactionKind::parse(&kind)
            .ok_or_else(|| anyhow!("unknown transaction kind in storage: {kind}"))?,
        amount: parse_decimal(&row.try_get::<String, _>("amount")?)?,
        description: row.try_get("description")?,
        occurred_at: parse_timestamp(&row.try_get::<String, _>("occurred_at")?)?,
        source_account_id: row.try_get("source_account_id")?,
        destination_account_id: row.try_get("destination_account_id")?,
    })
}

/// Per-kind column values for insert/update statements. Columns belonging
/// to the other kind stay NULL.
fn policy_columns(
    policy: &AccountPolicy,
) -> (
    &'static str,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<i64>,
) {
    match policy {
        AccountPolicy::Checking(p) => (
            "CHECKING",
            Some(p.overdraft_limit.to_string()),
            Some(p.maintenance_fee.to_string()),
            None,
            None,
            None,
        ),
        AccountPolicy::Savings(p) => (
            "SAVINGS",
            None,
            None,
            Some(p.yield_rate.to_string()),
            p.last_yield_applied_at.map(|t| t.to_rfc3339()),
            Some(i64::from(p.anniversary_day)),
        ),
    }
}

#[async_trait]
impl CustomerStore for SqliteStore {
    async fn store_customer(
        &self,
        name: &str,
        national_id: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Customer> {
        let result = sqlx::query(
            r#"
            INSERT INTO customers (name, national_id, created_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(name)
        .bind(national_id)
        .bind(created_at.to_rfc3339())
        .execute(&*self.pool)
        .await?;

        Ok(Customer {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            national_id: national_id.to_string(),
            created_at,
        })
    }

    async fn find_customer_by_national_id(&self, national_id: &str) -> Result<Option<Customer>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, national_id, created_at
            FROM customers
            WHERE national_id = ?
            "#,
        )
        .bind(national_id)
        .fetch_optional(&*self.pool)
        .await?;

        row.as_ref().map(customer_from_row).transpose()
    }

    async fn get_customer(&self, customer_id: i64) -> Result<Option<Customer>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, national_id, created_at
            FROM customers
            WHERE id = ?
            "#,
        )
        .bind(customer_id)
        .fetch_optional(&*self.pool)
        .await?;

        row.as_ref().map(customer_from_row).transpose()
    }
}

const ACCOUNT_COLUMNS: &str = "id, number, customer_id, kind, balance, active, created_at, \
     overdraft_limit, maintenance_fee, yield_rate, last_yield_applied_at, anniversary_day";

fn update_account_query(
    account: &Account,
) -> sqlx::query::Query<'_, Sqlite, sqlx::sqlite::SqliteArguments<'_>> {
    let (kind, overdraft_limit, maintenance_fee, yield_rate, last_applied, anniversary) =
        policy_columns(&account.policy);

    sqlx::query(
        r#"
        UPDATE accounts
        SET balance = ?, active = ?, kind = ?,
            overdraft_limit = ?, maintenance_fee = ?, yield_rate = ?,
            last_yield_applied_at = ?, anniversary_day = ?
        WHERE id = ?
        "#,
    )
    .bind(account.balance.to_string())
    .bind(i64::from(account.active))
    .bind(kind)
    .bind(overdraft_limit)
    .bind(maintenance_fee)
    .bind(yield_rate)
    .bind(last_applied)
    .bind(anniversary)
    .bind(account.id)
}

#[async_trait]
impl AccountStore for SqliteStore {
    async fn store_account(&self, account: &NewAccount) -> Result<Account> {
        let (kind, overdraft_limit, maintenance_fee, yield_rate, last_applied, anniversary) =
            policy_columns(&account.policy);

        let result = sqlx::query(
            r#"
            INSERT INTO accounts
                (number, customer_id, kind, balance, active, created_at,
                 overdraft_limit, maintenance_fee, yield_rate,
                 last_yield_applied_at, anniversary_day)
            VALUES (?, ?, ?, ?, 1, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&account.number)
        .bind(account.customer_id)
        .bind(kind)
        .bind(account.balance.to_string())
        .bind(account.created_at.to_rfc3339())
        .bind(overdraft_limit)
        .bind(maintenance_fee)
        .bind(yield_rate)
        .bind(last_applied)
        .bind(anniversary)
        .execute(&*self.pool)
        .await?;

        Ok(Account {
            id: result.last_insert_rowid(),
            number: account.number.clone(),
            customer_id: account.customer_id,
            balance: account.balance,
            active: true,
            created_at: account.created_at,
            policy: account.policy.clone(),
        })
    }

    async fn get_account(&self, account_id: i64) -> Result<Option<Account>> {
        let row = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?"
        ))
        .bind(account_id)
        .fetch_optional(&*self.pool)
        .await?;

        row.as_ref().map(account_from_row).transpose()
    }

    async fn get_active_account(&self, account_id: i64) -> Result<Option<Account>> {
        let row = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ? AND active = 1"
        ))
        .bind(account_id)
        .fetch_optional(&*self.pool)
        .await?;

        row.as_ref().map(account_from_row).transpose()
    }

    async fn list_active_accounts(&self) -> Result<Vec<Account>> {
        let rows = sqlx::query(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE active = 1 ORDER BY id ASC"
        ))
        .fetch_all(&*self.pool)
        .await?;

        rows.iter().map(account_from_row).collect()
    }

    async fn update_account(&self, account: &Account) -> Result<()> {
        update_account_query(account).execute(&*self.pool).await?;
        Ok(())
    }

    async fn account_number_exists(&self, number: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM accounts WHERE number = ?")
            .bind(number)
            .fetch_optional(&*self.pool)
            .await?;
        Ok(row.is_some())
    }
}

const TRANSACTION_COLUMNS: &str =
    "id, kind, amount, description, occurred_at, source_account_id, destination_account_id";

fn insert_transaction_query(
    entry: &NewTransaction,
) -> sqlx::query::Query<'_, Sqlite, sqlx::sqlite::SqliteArguments<'_>> {
    sqlx::query(
        r#"
        INSERT INTO transactions
            (kind, amount, description, occurred_at,
             source_account_id, destination_account_id)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(entry.kind.as_str())
    .bind(entry.amount.to_string())
    .bind(entry.description.as_deref())
    .bind(entry.occurred_at.to_rfc3339())
    .bind(entry.source_account_id)
    .bind(entry.destination_account_id)
}

fn persisted_transaction(entry: &NewTransaction, id: i64) -> Transaction {
    Transaction {
        id,
        kind: entry.kind,
        amount: entry.amount,
        description: entry.description.clone(),
        occurred_at: entry.occurred_at,
        source_account_id: entry.source_account_id,
        destination_account_id: entry.destination_account_id,
    }
}

#[async_trait]
impl TransactionStore for SqliteStore {
    async fn store_transaction(&self, entry: &NewTransaction) -> Result<Transaction> {
        let result = insert_transaction_query(entry).execute(&*self.pool).await?;
        Ok(persisted_transaction(entry, result.last_insert_rowid()))
    }

    async fn list_transactions_for_account(&self, account_id: i64) -> Result<Vec<Transaction>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {TRANSACTION_COLUMNS}
            FROM transactions
            WHERE source_account_id = ? OR destination_account_id = ?
            ORDER BY occurred_at DESC, id DESC
            "#
        ))
        .bind(account_id)
        .bind(account_id)
        .fetch_all(&*self.pool)
        .await?;

        rows.iter().map(transaction_from_row).collect()
    }

    async fn commit_operation(
        &self,
        account: &Account,
        entry: &NewTransaction,
    ) -> Result<Transaction> {
        // Balance write and ledger entry land together or not at all.
        let mut tx = self.pool.begin().await?;

        update_account_query(account).execute(&mut *tx).await?;
        let result = insert_transaction_query(entry).execute(&mut *tx).await?;
        let id = result.last_insert_rowid();

        tx.commit().await?;

        Ok(persisted_transaction(entry, id))
    }

    async fn commit_transfer(
        &self,
        source: &Account,
        destination: &Account,
        entry: &NewTransaction,
    ) -> Result<Transaction> {
        // Debit, credit and ledger entry either all land or all roll back.
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE accounts SET balance = ? WHERE id = ?")
            .bind(source.balance.to_string())
            .bind(source.id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE accounts SET balance = ? WHERE id = ?")
            .bind(destination.balance.to_string())
            .bind(destination.id)
            .execute(&mut *tx)
            .await?;

        let result = insert_transaction_query(entry).execute(&mut *tx).await?;
        let id = result.last_insert_rowid();

        tx.commit().await?;

        Ok(persisted_transaction(entry, id))
    }
}
