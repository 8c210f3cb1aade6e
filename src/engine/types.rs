//! Record and view types for the liquidity mining engine.

use crate::types::{LockDuration, Platform, Pubkey};
use serde::{Deserialize, Serialize};

/// Engine-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Reward tokens emitted per second by a newly created pool, before the
    /// pool's admin boost multiplier is applied
    pub default_reward_rate: f64,
    /// Fraction of the pending reward forfeited when withdrawing before the
    /// lock expires (principal is never penalized)
    pub early_withdrawal_penalty_rate: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_reward_rate: 0.01,
            early_withdrawal_penalty_rate: 0.10,
        }
    }
}

/// A liquidity pool for one prediction market.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    /// Unique pool id (opaque, derived at creation)
    pub id: String,
    /// The prediction-market id this pool incentivizes
    pub market_id: String,
    /// Platform the market lives on
    pub platform: Platform,
    /// Human-readable market title
    pub title: String,
    /// Admin-settable reward boost, always within [1, 3]
    pub boost_multiplier: f64,
    /// Reward tokens emitted per second for the whole pool, before
    /// `boost_multiplier`
    pub reward_rate: f64,
    /// Sum of liquidity over the pool's non-withdrawn positions
    pub total_liquidity: f64,
    /// Sum of shares over the pool's non-withdrawn positions
    pub total_shares: f64,
    /// Whether the pool accepts new liquidity
    pub active: bool,
    /// Unix timestamp (seconds) when the pool was created
    pub created_at: u64,
    /// Ids of every position ever opened in this pool (withdrawn included,
    /// since positions are never deleted)
    pub position_ids: Vec<String>,
}

/// One provider's stake in a pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    /// Unique position id
    pub id: String,
    /// Owning pool
    pub pool_id: String,
    /// Wallet address of the liquidity provider
    pub provider: Pubkey,
    /// USD-denominated amount contributed
    pub liquidity: f64,
    /// Proportional-ownership units used to split pool rewards
    pub shares: f64,
    /// Commitment period chosen at entry
    pub lock_duration: LockDuration,
    /// Unix timestamp (seconds) when the lock expires
    pub lock_expires_at: u64,
    /// Reward multiplier granted for the lock commitment
    pub lock_boost: f64,
    /// Cumulative rewards paid out to this position; never decreases
    pub claimed_rewards: f64,
    /// Unix timestamp (seconds) of the last claim or position creation;
    /// pending rewards accrue forward from here
    pub last_accrual_at: u64,
    /// Optional referrer wallet for referral bonus accounting
    pub referrer: Option<Pubkey>,
    /// Unix timestamp (seconds) when the position was opened
    pub created_at: u64,
    /// Terminal flag: once true the position is immutable and excluded
    /// from pool totals
    pub withdrawn: bool,
}

impl Position {
    /// Whether the lock has expired as of the given time.
    pub fn is_unlocked(&self, now: u64) -> bool {
        now >= self.lock_expires_at
    }
}

/// Why a claim record was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimKind {
    /// Explicit `claim_rewards` call
    Claim,
    /// Pending reward flushed during `remove_liquidity`
    WithdrawalFlush,
}

impl ClaimKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimKind::Claim => "claim",
            ClaimKind::WithdrawalFlush => "withdrawal_flush",
        }
    }
}

/// Immutable audit record of one reward payout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRecord {
    /// Unique claim id
    pub id: String,
    /// Position the reward was accrued by
    pub position_id: String,
    /// Pool the position belongs to
    pub pool_id: String,
    /// Wallet address the reward was paid to
    pub provider: Pubkey,
    /// Reward amount actually paid (post-penalty for withdrawal flushes)
    pub amount: f64,
    /// What produced this record
    pub kind: ClaimKind,
    /// Unix timestamp (seconds) of the payout
    pub claimed_at: u64,
}

/// Result of `remove_liquidity`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalResult {
    /// The withdrawn position
    pub position_id: String,
    /// Principal returned, always the full original contribution
    pub liquidity: f64,
    /// Reward actually paid out (pending minus penalty)
    pub rewards: f64,
    /// Reward amount forfeited for withdrawing before lock expiry
    pub penalty: f64,
    /// Audit record for the flushed reward, when it was non-zero
    pub flush_claim: Option<ClaimRecord>,
}

/// Aggregate view of one provider across all pools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStats {
    /// Wallet address
    pub provider: Pubkey,
    /// Sum of liquidity over the provider's active positions
    pub total_liquidity: f64,
    /// Lifetime rewards paid out, withdrawn positions included
    pub total_claimed: f64,
    /// Pending rewards over active positions, as of now
    pub total_pending: f64,
    /// Number of active positions
    pub position_count: usize,
    /// Number of distinct pools the active positions span
    pub pool_count: usize,
}

/// Aggregate view of the whole engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalStats {
    /// Pools ever created
    pub total_pools: usize,
    /// Pools currently accepting liquidity
    pub active_pools: usize,
    /// Positions ever opened
    pub total_positions: usize,
    /// Positions not yet withdrawn
    pub active_positions: usize,
    /// Sum of liquidity over active positions
    pub total_liquidity: f64,
    /// Lifetime rewards paid out across all positions; monotone, survives
    /// withdrawals
    pub total_rewards_distributed: f64,
    /// Number of claim records produced (claims and withdrawal flushes)
    pub total_claim_events: usize,
}

/// One row of a liquidity leaderboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// Wallet address
    pub provider: Pubkey,
    /// Sum of liquidity over the provider's active positions in scope
    pub total_liquidity: f64,
    /// Number of active positions in scope
    pub position_count: usize,
    /// Earliest position creation time in scope; the tie-breaker
    pub first_position_at: u64,
}
