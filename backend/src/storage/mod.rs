//! Persistence gateway: trait seam plus the sqlx/SQLite implementation.

pub mod sqlite;
pub mod traits;

pub use sqlite::SqliteStore;
pub use traits::{AccountStore, BankStore, CustomerStore, TransactionStore};
