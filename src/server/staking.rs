//! Staking integration - compound boost composition.
//!
//! The engine never queries staking state itself; the adapter composes a
//! position's LP lock boost with the provider's staking tier here. The
//! trait keeps the staking backend swappable (an RPC-backed source in
//! production, a fixed table in tests and demos).

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Staking tier derived from a provider's staked amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StakingTier {
    None,
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl StakingTier {
    /// Tier for a staked amount, thresholds in staking tokens.
    pub fn for_amount(staked: f64) -> Self {
        if staked >= 100_000.0 {
            StakingTier::Platinum
        } else if staked >= 10_000.0 {
            StakingTier::Gold
        } else if staked >= 1_000.0 {
            StakingTier::Silver
        } else if staked >= 100.0 {
            StakingTier::Bronze
        } else {
            StakingTier::None
        }
    }

    /// Multiplier applied on top of the LP lock boost.
    pub fn multiplier(&self) -> f64 {
        match self {
            StakingTier::None => 1.0,
            StakingTier::Bronze => 1.05,
            StakingTier::Silver => 1.1,
            StakingTier::Gold => 1.2,
            StakingTier::Platinum => 1.35,
        }
    }

    /// Flat bonus fraction granted by the tier.
    pub fn bonus(&self) -> f64 {
        match self {
            StakingTier::None => 0.0,
            StakingTier::Bronze => 0.01,
            StakingTier::Silver => 0.02,
            StakingTier::Gold => 0.05,
            StakingTier::Platinum => 0.10,
        }
    }
}

/// Composed boost view returned to tool callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompoundBoost {
    /// Multiplier from the provider's staking tier
    pub staking_multiplier: f64,
    /// Flat bonus fraction from the tier
    pub tier_bonus: f64,
    /// LP lock boost composed with the staking side
    pub total_boost: f64,
    /// The provider's tier
    pub tier: StakingTier,
    /// Amount the provider has staked
    pub staked_amount: f64,
}

/// Read-only query into the external staking system.
#[async_trait]
pub trait StakingBoostSource: Send + Sync {
    /// Amount the provider has staked, in staking tokens.
    async fn staked_amount(&self, provider: &str) -> Result<f64>;

    /// Compose a provider's staking boost with an LP lock boost.
    async fn compound_boost(&self, provider: &str, lp_lock_boost: f64) -> Result<CompoundBoost> {
        let staked = self.staked_amount(provider).await?;
        let tier = StakingTier::for_amount(staked);
        let staking_multiplier = tier.multiplier();
        let tier_bonus = tier.bonus();
        Ok(CompoundBoost {
            staking_multiplier,
            tier_bonus,
            total_boost: lp_lock_boost * staking_multiplier * (1.0 + tier_bonus),
            tier,
            staked_amount: staked,
        })
    }
}

/// Table-backed staking source for demos and tests.
#[derive(Debug, Default)]
pub struct FixedStakingSource {
    stakes: HashMap<String, f64>,
}

impl FixedStakingSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a provider's staked amount.
    pub fn with_stake(mut self, provider: &str, amount: f64) -> Self {
        self.stakes.insert(provider.to_string(), amount);
        self
    }
}

#[async_trait]
impl StakingBoostSource for FixedStakingSource {
    async fn staked_amount(&self, provider: &str) -> Result<f64> {
        Ok(self.stakes.get(provider).copied().unwrap_or(0.0))
    }
}
