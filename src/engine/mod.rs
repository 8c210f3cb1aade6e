//! Liquidity mining engine - pools, positions, reward accrual and queries.
//!
//! This module owns all pool/position/claim state and implements reward
//! accrual, lock boosts, early-withdrawal penalties, APR and leaderboard
//! queries. It performs no I/O and no logging; adapters live in `server`
//! and persistence lives in `ledger`.

pub mod types;
pub mod error;
pub mod clock;
pub mod mining;
pub mod ledger;

// Re-export main public types and the engine itself
pub use mining::LiquidityMiningEngine;
pub use error::EngineError;
pub use clock::{Clock, ManualClock, SystemClock};
pub use types::{
    ClaimKind, ClaimRecord, EngineConfig, GlobalStats, LeaderboardEntry, Pool, Position,
    ProviderStats, WithdrawalResult,
};

// Re-export ledger components for advanced usage
pub use ledger::{ClaimEventReceiver, ClaimEventSender, ClaimLedger, SqliteClaimLedger};

use std::sync::Arc;

/// Engine builder for convenient construction with sensible defaults.
pub struct EngineBuilder {
    config: EngineConfig,
    clock: Arc<dyn Clock>,
}

impl EngineBuilder {
    /// Create a new builder with default configuration and the system clock.
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Set the time source used for accrual and lock-expiry checks.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Set the per-second reward emission assigned to newly created pools.
    pub fn with_default_reward_rate(mut self, rate: f64) -> Self {
        self.config.default_reward_rate = rate;
        self
    }

    /// Set the early-withdrawal penalty rate applied to the reward portion.
    pub fn with_penalty_rate(mut self, rate: f64) -> Self {
        self.config.early_withdrawal_penalty_rate = rate;
        self
    }

    /// Build the engine.
    pub fn build(self) -> LiquidityMiningEngine {
        LiquidityMiningEngine::new(self.config, self.clock)
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
