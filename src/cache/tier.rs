//! Tier definitions.
//!
//! An entry lives in exactly one tier at a time. Entries are the unit of
//! movement between tiers: they are demoted on capacity pressure and
//! promoted on access.

use serde::{Deserialize, Serialize};

/// Identifies which tier an entry currently resides in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Capacity-bounded, strongly held, recency ordered.
    Hot,
    /// Unbounded, weakly held, subject to reclamation.
    Overflow,
}

impl Tier {
    /// Lowercase label used for metric labels.
    pub fn label(&self) -> &'static str {
        match self {
            Tier::Hot => "hot",
            Tier::Overflow => "overflow",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Hot => write!(f, "HOT"),
            Tier::Overflow => write!(f, "OVERFLOW"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_labels() {
        assert_eq!(Tier::Hot.label(), "hot");
        assert_eq!(Tier::Overflow.label(), "overflow");
        assert_eq!(Tier::Hot.to_string(), "HOT");
        assert_eq!(Tier::Overflow.to_string(), "OVERFLOW");
    }
}
