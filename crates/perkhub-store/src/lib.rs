//! # perkhub-store
//!
//! Storage layer for PerkHub. Owns the PostgreSQL connection pool, the
//! migration runner, the bounded-retry policy for idempotent reads, and
//! the swappable store traits with their three adapters:
//!
//! - [`store::postgres`] — direct sqlx adapter,
//! - [`store::remote`] — REST proxy adapter for the ledger,
//! - [`store::memory`] — in-process double with the same atomicity
//!   semantics.
//!
//! The workflow services are written once against the traits; the
//! adapters are interchangeable.

pub mod connection;
pub mod migration;
pub mod retry;
pub mod store;

pub use connection::DatabasePool;
pub use store::{ApprovalStore, CatalogStore, LedgerStore, LedgerUpdate, NotificationStore};
