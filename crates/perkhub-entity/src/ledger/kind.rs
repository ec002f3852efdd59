//! Point transaction kind enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a point transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Points credited to the enrollment.
    Award,
    /// Points debited from the enrollment.
    Redeem,
}

impl TransactionKind {
    /// Sign applied to the transaction magnitude in the ledger.
    pub fn sign(&self) -> i64 {
        match self {
            Self::Award => 1,
            Self::Redeem => -1,
        }
    }

    /// Return the kind as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Award => "award",
            Self::Redeem => "redeem",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
