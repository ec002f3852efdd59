//! Card tier: a discrete reward level derived purely from points.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reward tier of a loyalty card.
///
/// The tier is a pure function of the card's current points via fixed
/// ascending thresholds; multiplier and benefits are lookups from tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "card_tier", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Entry tier.
    Standard,
    /// 1,000+ points.
    Silver,
    /// 2,500+ points.
    Gold,
    /// 5,000+ points.
    Platinum,
}

impl Tier {
    /// The highest tier whose threshold does not exceed `points`.
    pub fn for_points(points: i64) -> Self {
        if points >= Self::Platinum.threshold() {
            Self::Platinum
        } else if points >= Self::Gold.threshold() {
            Self::Gold
        } else if points >= Self::Silver.threshold() {
            Self::Silver
        } else {
            Self::Standard
        }
    }

    /// Minimum points required for this tier.
    pub fn threshold(&self) -> i64 {
        match self {
            Self::Standard => 0,
            Self::Silver => 1000,
            Self::Gold => 2500,
            Self::Platinum => 5000,
        }
    }

    /// Points multiplier applied to future awards at this tier.
    pub fn multiplier(&self) -> f64 {
        match self {
            Self::Standard => 1.0,
            Self::Silver => 1.25,
            Self::Gold => 1.5,
            Self::Platinum => 2.0,
        }
    }

    /// Benefits unlocked at this tier.
    pub fn benefits(&self) -> &'static [&'static str] {
        match self {
            Self::Standard => &["member_pricing"],
            Self::Silver => &["member_pricing", "birthday_reward"],
            Self::Gold => &["member_pricing", "birthday_reward", "priority_support"],
            Self::Platinum => &[
                "member_pricing",
                "birthday_reward",
                "priority_support",
                "exclusive_offers",
            ],
        }
    }

    /// Return the tier as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Silver => "silver",
            Self::Gold => "gold",
            Self::Platinum => "platinum",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_thresholds() {
        assert_eq!(Tier::for_points(0), Tier::Standard);
        assert_eq!(Tier::for_points(999), Tier::Standard);
        assert_eq!(Tier::for_points(1000), Tier::Silver);
        assert_eq!(Tier::for_points(1001), Tier::Silver);
        assert_eq!(Tier::for_points(2499), Tier::Silver);
        assert_eq!(Tier::for_points(2500), Tier::Gold);
        assert_eq!(Tier::for_points(4999), Tier::Gold);
        assert_eq!(Tier::for_points(5000), Tier::Platinum);
        assert_eq!(Tier::for_points(1_000_000), Tier::Platinum);
    }

    #[test]
    fn test_tier_is_ordered() {
        assert!(Tier::Standard < Tier::Silver);
        assert!(Tier::Silver < Tier::Gold);
        assert!(Tier::Gold < Tier::Platinum);
    }

    #[test]
    fn test_benefits_accumulate() {
        assert!(Tier::Platinum.benefits().contains(&"member_pricing"));
        assert!(Tier::Platinum.benefits().len() > Tier::Standard.benefits().len());
    }

    #[test]
    fn test_multiplier_is_monotonic() {
        assert!(Tier::Silver.multiplier() > Tier::Standard.multiplier());
        assert!(Tier::Platinum.multiplier() > Tier::Gold.multiplier());
    }
}
