//! PostgreSQL adapters for the store traits.

mod approval;
mod catalog;
mod ledger;
mod notification;

pub use approval::PgApprovalStore;
pub use catalog::PgCatalogStore;
pub use ledger::PgLedgerStore;
pub use notification::PgNotificationStore;

use perkhub_core::error::{AppError, ErrorKind};

/// Map a sqlx error into a storage error with context.
pub(crate) fn storage_err(context: &str, e: sqlx::Error) -> AppError {
    AppError::with_source(ErrorKind::Storage, context.to_string(), e)
}

/// Whether the error is a unique-constraint violation (SQLSTATE 23505).
pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code == "23505")
        .unwrap_or(false)
}
