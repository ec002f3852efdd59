//! Loyalty card entity: the customer-facing artifact of an active
//! enrollment.

pub mod activity;
pub mod model;
pub mod tier;

pub use activity::{CardActivity, CardActivityKind};
pub use model::LoyaltyCard;
pub use tier::Tier;
