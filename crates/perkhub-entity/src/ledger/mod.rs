//! Points ledger entities: the immutable transaction log.

pub mod kind;
pub mod model;

pub use kind::TransactionKind;
pub use model::{NewPointTransaction, PointTransaction};
