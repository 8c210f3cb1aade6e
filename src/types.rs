//! Core shared types for the liquidity mining system.

use serde::{Deserialize, Serialize};

/// A wallet address (kept as a string so the engine stays free of any
/// chain-specific SDK; addresses are opaque identifiers here)
pub type Pubkey = String;

/// Prediction-market platform a pool's market lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Kalshi,
    Polymarket,
    Manifold,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Kalshi => write!(f, "kalshi"),
            Platform::Polymarket => write!(f, "polymarket"),
            Platform::Manifold => write!(f, "manifold"),
        }
    }
}

/// Commitment period for a liquidity position.
///
/// Longer locks earn a larger reward boost; the boost table is fixed and
/// monotonically increasing with duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LockDuration {
    #[serde(rename = "7d")]
    SevenDays,
    #[serde(rename = "30d")]
    ThirtyDays,
    #[serde(rename = "90d")]
    NinetyDays,
    #[serde(rename = "180d")]
    HalfYear,
    #[serde(rename = "365d")]
    OneYear,
}

impl LockDuration {
    /// All durations, shortest first.
    pub const ALL: [LockDuration; 5] = [
        LockDuration::SevenDays,
        LockDuration::ThirtyDays,
        LockDuration::NinetyDays,
        LockDuration::HalfYear,
        LockDuration::OneYear,
    ];

    /// Lock length in seconds.
    pub fn seconds(&self) -> u64 {
        match self {
            LockDuration::SevenDays => 7 * 86_400,
            LockDuration::ThirtyDays => 30 * 86_400,
            LockDuration::NinetyDays => 90 * 86_400,
            LockDuration::HalfYear => 180 * 86_400,
            LockDuration::OneYear => 365 * 86_400,
        }
    }

    /// Reward boost multiplier granted for committing to this duration.
    pub fn boost(&self) -> f64 {
        match self {
            LockDuration::SevenDays => 1.0,
            LockDuration::ThirtyDays => 1.1,
            LockDuration::NinetyDays => 1.25,
            LockDuration::HalfYear => 1.5,
            LockDuration::OneYear => 2.0,
        }
    }
}

impl std::fmt::Display for LockDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LockDuration::SevenDays => write!(f, "7d"),
            LockDuration::ThirtyDays => write!(f, "30d"),
            LockDuration::NinetyDays => write!(f, "90d"),
            LockDuration::HalfYear => write!(f, "180d"),
            LockDuration::OneYear => write!(f, "365d"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_boost_is_monotonic_in_duration() {
        let boosts: Vec<f64> = LockDuration::ALL.iter().map(|d| d.boost()).collect();
        for pair in boosts.windows(2) {
            assert!(pair[0] <= pair[1], "boost table must not decrease: {:?}", boosts);
        }
    }

    #[test]
    fn lock_duration_serde_uses_short_labels() {
        assert_eq!(
            serde_json::to_string(&LockDuration::ThirtyDays).unwrap(),
            "\"30d\""
        );
        let parsed: LockDuration = serde_json::from_str("\"365d\"").unwrap();
        assert_eq!(parsed, LockDuration::OneYear);
    }

    #[test]
    fn platform_serde_is_lowercase() {
        assert_eq!(serde_json::to_string(&Platform::Kalshi).unwrap(), "\"kalshi\"");
    }
}
