//! CSV export of the active account book.

use tracing::info;

use crate::error::BankError;
use crate::storage::traits::BankStore;

const HEADER: &str = "ID,Number,Balance,Customer,NationalId,CreatedAt";

#[derive(Clone)]
pub struct ExportService<S> {
    store: S,
}

impl<S: BankStore> ExportService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Render all active accounts as CSV, one row per account in persisted
    /// order, owner denormalized onto the row.
    pub async fn export_accounts_csv(&self) -> Result<String, BankError> {
        let accounts = self.store.list_active_accounts().await?;
        let mut out = String::from(HEADER);
        out.push('\n');

        for account in &accounts {
            let customer = self
                .store
                .get_customer(account.customer_id)
                .await?
                .ok_or_else(|| BankError::not_found("Customer", account.customer_id))?;
            out.push_str(&format!(
                "{},{},{},{},{},{}\n",
                account.id,
                escape_csv(&account.number),
                account.balance,
                escape_csv(&customer.name),
                escape_csv(&customer.national_id),
                account.created_at.to_rfc3339(),
            ));
        }

        info!(accounts = accounts.len(), "exported account book as csv");
        Ok(out)
    }
}

/// Quote a field when it contains a comma, quote or newline; embedded quotes
/// are doubled per RFC 4180.
fn escape_csv(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
