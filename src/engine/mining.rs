//! Core liquidity mining engine.
//!
//! Owns all pool, position and claim state. Every operation validates its
//! preconditions before touching any state, so a failed call leaves the
//! engine exactly as it was.
//!
//! Accrual contract: pending reward for a position is
//! `elapsed * reward_rate * boost_multiplier * (shares / total_shares) * lock_boost`,
//! computed with the pool state prevailing at the time of the query and
//! applied to the whole interval since the position's last checkpoint. That
//! is an approximation: pool composition or boost changes between
//! checkpoints are attributed at claim-time state rather than integrated
//! over sub-intervals. The trade-off is intentional and covered by tests.

use crate::engine::clock::Clock;
use crate::engine::error::EngineError;
use crate::engine::types::{
    ClaimKind, ClaimRecord, EngineConfig, GlobalStats, LeaderboardEntry, Pool, Position,
    ProviderStats, WithdrawalResult,
};
use crate::types::{LockDuration, Platform, Pubkey};
use rand::{distributions::Alphanumeric, Rng};
use std::collections::HashMap;
use std::sync::Arc;

const SECONDS_PER_YEAR: f64 = 31_536_000.0;

/// Generate an opaque, never-reused id with a type prefix.
fn new_id(prefix: &str) -> String {
    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(char::from)
        .collect();
    format!("{}_{}", prefix, token.to_lowercase())
}

/// In-memory liquidity mining engine.
///
/// Pools and positions are append-only: deactivation and withdrawal are
/// terminal state transitions, never deletions, so historical stats and
/// leaderboard queries stay answerable.
pub struct LiquidityMiningEngine {
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    pools: HashMap<String, Pool>,
    positions: HashMap<String, Position>,
    claims: Vec<ClaimRecord>,
}

impl LiquidityMiningEngine {
    /// Create an engine with the given configuration and time source.
    pub fn new(config: EngineConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            pools: HashMap::new(),
            positions: HashMap::new(),
            claims: Vec::new(),
        }
    }

    // --- Pool management ---

    /// Create a new active pool for a prediction market.
    ///
    /// Rejects an empty market id, a boost outside [1, 3], and a duplicate
    /// active pool for the same (market, platform) pair. Deactivated pools
    /// do not block re-creation.
    pub fn create_pool(
        &mut self,
        market_id: &str,
        platform: Platform,
        title: &str,
        boost: f64,
    ) -> Result<Pool, EngineError> {
        if market_id.trim().is_empty() {
            return Err(EngineError::invalid("market id must not be empty"));
        }
        validate_boost(boost)?;
        if self
            .pools
            .values()
            .any(|p| p.active && p.market_id == market_id && p.platform == platform)
        {
            return Err(EngineError::invalid(format!(
                "active pool already exists for market {} on {}",
                market_id, platform
            )));
        }

        let pool = Pool {
            id: new_id("pool"),
            market_id: market_id.to_string(),
            platform,
            title: title.to_string(),
            boost_multiplier: boost,
            reward_rate: self.config.default_reward_rate,
            total_liquidity: 0.0,
            total_shares: 0.0,
            active: true,
            created_at: self.clock.now(),
            position_ids: Vec::new(),
        };
        self.pools.insert(pool.id.clone(), pool.clone());
        Ok(pool)
    }

    /// Look up a pool by id.
    pub fn get_pool(&self, pool_id: &str) -> Result<Pool, EngineError> {
        self.pools
            .get(pool_id)
            .cloned()
            .ok_or_else(|| EngineError::PoolNotFound { pool_id: pool_id.to_string() })
    }

    /// Snapshot of all active pools, oldest first.
    pub fn get_active_pools(&self) -> Vec<Pool> {
        let mut pools: Vec<Pool> = self.pools.values().filter(|p| p.active).cloned().collect();
        pools.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        pools
    }

    /// Set a pool's admin boost multiplier.
    ///
    /// Under the adopted accrual approximation the new boost applies to each
    /// position's entire open interval at its next claim, not just to time
    /// after this call.
    pub fn set_pool_boost(&mut self, pool_id: &str, boost: f64) -> Result<Pool, EngineError> {
        validate_boost(boost)?;
        let pool = self
            .pools
            .get_mut(pool_id)
            .ok_or_else(|| EngineError::PoolNotFound { pool_id: pool_id.to_string() })?;
        pool.boost_multiplier = boost;
        Ok(pool.clone())
    }

    /// Stop a pool from accepting new liquidity.
    ///
    /// Existing positions keep accruing and can still claim and withdraw;
    /// retiring an incentive program never confiscates earned rewards.
    pub fn deactivate_pool(&mut self, pool_id: &str) -> Result<Pool, EngineError> {
        let pool = self
            .pools
            .get_mut(pool_id)
            .ok_or_else(|| EngineError::PoolNotFound { pool_id: pool_id.to_string() })?;
        pool.active = false;
        Ok(pool.clone())
    }

    // --- Position lifecycle ---

    /// Open a liquidity position in an active pool.
    ///
    /// Shares are issued at the pool's current share price
    /// (`total_shares / total_liquidity`, 1:1 on an empty pool) so existing
    /// positions' claim on the reward stream is not diluted unfairly.
    pub fn add_liquidity(
        &mut self,
        pool_id: &str,
        provider: &str,
        amount: f64,
        lock_duration: LockDuration,
        referrer: Option<Pubkey>,
    ) -> Result<Position, EngineError> {
        if !(amount > 0.0) {
            return Err(EngineError::invalid(format!(
                "liquidity amount must be positive, got {}",
                amount
            )));
        }
        let pool = self
            .pools
            .get(pool_id)
            .ok_or_else(|| EngineError::PoolNotFound { pool_id: pool_id.to_string() })?;
        if !pool.active {
            return Err(EngineError::InactivePool { pool_id: pool_id.to_string() });
        }

        let shares = if pool.total_liquidity > 0.0 {
            amount * (pool.total_shares / pool.total_liquidity)
        } else {
            amount
        };
        let now = self.clock.now();
        let position = Position {
            id: new_id("pos"),
            pool_id: pool_id.to_string(),
            provider: provider.to_string(),
            liquidity: amount,
            shares,
            lock_duration,
            lock_expires_at: now + lock_duration.seconds(),
            lock_boost: lock_duration.boost(),
            claimed_rewards: 0.0,
            last_accrual_at: now,
            referrer,
            created_at: now,
            withdrawn: false,
        };

        let pool = self.pools.get_mut(pool_id).expect("pool checked above");
        pool.total_liquidity += amount;
        pool.total_shares += shares;
        pool.position_ids.push(position.id.clone());
        self.positions.insert(position.id.clone(), position.clone());
        Ok(position)
    }

    /// Close a position: flush pending rewards and return the principal.
    ///
    /// Withdrawing before lock expiry forfeits a fraction of the pending
    /// reward; the principal is always returned in full. Withdrawal is
    /// terminal, a second call fails with `AlreadyWithdrawn`.
    pub fn remove_liquidity(&mut self, position_id: &str) -> Result<WithdrawalResult, EngineError> {
        let now = self.clock.now();
        let position = self
            .positions
            .get(position_id)
            .ok_or_else(|| EngineError::PositionNotFound { position_id: position_id.to_string() })?;
        if position.withdrawn {
            return Err(EngineError::AlreadyWithdrawn { position_id: position_id.to_string() });
        }
        let pool = self
            .pools
            .get(&position.pool_id)
            .ok_or_else(|| EngineError::PoolNotFound { pool_id: position.pool_id.clone() })?;

        let pending = pending_reward(position, pool, now);
        let penalty = if position.is_unlocked(now) {
            0.0
        } else {
            pending * self.config.early_withdrawal_penalty_rate
        };
        let rewards = pending - penalty;

        let flush_claim = if rewards > 0.0 {
            let record = ClaimRecord {
                id: new_id("claim"),
                position_id: position.id.clone(),
                pool_id: position.pool_id.clone(),
                provider: position.provider.clone(),
                amount: rewards,
                kind: ClaimKind::WithdrawalFlush,
                claimed_at: now,
            };
            self.claims.push(record.clone());
            Some(record)
        } else {
            None
        };

        let position = self.positions.get_mut(position_id).expect("position checked above");
        let liquidity = position.liquidity;
        let shares = position.shares;
        let pool_id = position.pool_id.clone();
        position.withdrawn = true;
        position.claimed_rewards += rewards;
        position.last_accrual_at = now;

        let pool = self.pools.get_mut(&pool_id).expect("pool checked above");
        pool.total_liquidity = (pool.total_liquidity - liquidity).max(0.0);
        pool.total_shares = (pool.total_shares - shares).max(0.0);

        Ok(WithdrawalResult {
            position_id: position_id.to_string(),
            liquidity,
            rewards,
            penalty,
            flush_claim,
        })
    }

    /// Pay out a position's pending reward and reset its accrual checkpoint.
    ///
    /// A claim with no elapsed time yields a zero-amount record rather than
    /// an error.
    pub fn claim_rewards(&mut self, position_id: &str) -> Result<ClaimRecord, EngineError> {
        let now = self.clock.now();
        let position = self
            .positions
            .get(position_id)
            .ok_or_else(|| EngineError::PositionNotFound { position_id: position_id.to_string() })?;
        if position.withdrawn {
            return Err(EngineError::AlreadyWithdrawn { position_id: position_id.to_string() });
        }
        let pool = self
            .pools
            .get(&position.pool_id)
            .ok_or_else(|| EngineError::PoolNotFound { pool_id: position.pool_id.clone() })?;

        let amount = pending_reward(position, pool, now);
        let record = ClaimRecord {
            id: new_id("claim"),
            position_id: position.id.clone(),
            pool_id: position.pool_id.clone(),
            provider: position.provider.clone(),
            amount,
            kind: ClaimKind::Claim,
            claimed_at: now,
        };

        let position = self.positions.get_mut(position_id).expect("position checked above");
        position.claimed_rewards += amount;
        position.last_accrual_at = now;
        self.claims.push(record.clone());
        Ok(record)
    }

    /// Pending reward as of now. Pure read, never checkpoints.
    pub fn get_pending_rewards(&self, position_id: &str) -> Result<f64, EngineError> {
        let position = self
            .positions
            .get(position_id)
            .ok_or_else(|| EngineError::PositionNotFound { position_id: position_id.to_string() })?;
        let pool = self
            .pools
            .get(&position.pool_id)
            .ok_or_else(|| EngineError::PoolNotFound { pool_id: position.pool_id.clone() })?;
        Ok(pending_reward(position, pool, self.clock.now()))
    }

    /// Look up a position by id.
    pub fn get_position(&self, position_id: &str) -> Result<Position, EngineError> {
        self.positions
            .get(position_id)
            .cloned()
            .ok_or_else(|| EngineError::PositionNotFound { position_id: position_id.to_string() })
    }

    /// Claim records for one position, oldest first.
    pub fn get_claim_records(&self, position_id: &str) -> Vec<ClaimRecord> {
        self.claims
            .iter()
            .filter(|c| c.position_id == position_id)
            .cloned()
            .collect()
    }

    // --- Rewards and APR queries ---

    /// Annualized pool return as a fraction of liquidity (0.12 = 12%).
    ///
    /// Returns 0 for an empty pool instead of dividing by zero.
    pub fn get_pool_apr(&self, pool_id: &str, token_price_usd: f64) -> Result<f64, EngineError> {
        if token_price_usd < 0.0 {
            return Err(EngineError::invalid(format!(
                "token price must be non-negative, got {}",
                token_price_usd
            )));
        }
        let pool = self
            .pools
            .get(pool_id)
            .ok_or_else(|| EngineError::PoolNotFound { pool_id: pool_id.to_string() })?;
        if pool.total_liquidity <= 0.0 {
            return Ok(0.0);
        }
        let yearly_emission_usd =
            pool.reward_rate * pool.boost_multiplier * SECONDS_PER_YEAR * token_price_usd;
        Ok(yearly_emission_usd / pool.total_liquidity)
    }

    /// Annualized return for one position: the pool APR scaled by the
    /// position's lock boost. Staking-side boost composition happens in the
    /// adapter layer, never here.
    pub fn get_position_apr(
        &self,
        position_id: &str,
        token_price_usd: f64,
    ) -> Result<f64, EngineError> {
        let position = self
            .positions
            .get(position_id)
            .ok_or_else(|| EngineError::PositionNotFound { position_id: position_id.to_string() })?;
        let pool_apr = self.get_pool_apr(&position.pool_id, token_price_usd)?;
        Ok(pool_apr * position.lock_boost)
    }

    // --- Statistics and leaderboards ---

    /// Aggregate stats for one provider.
    ///
    /// Liquidity, pending and counts cover active positions only;
    /// `total_claimed` is lifetime so a provider's history does not vanish
    /// on withdrawal.
    pub fn get_provider_stats(&self, provider: &str) -> ProviderStats {
        let now = self.clock.now();
        let mut stats = ProviderStats {
            provider: provider.to_string(),
            total_liquidity: 0.0,
            total_claimed: 0.0,
            total_pending: 0.0,
            position_count: 0,
            pool_count: 0,
        };
        let mut pools_seen: Vec<&str> = Vec::new();
        for position in self.positions.values().filter(|p| p.provider == provider) {
            stats.total_claimed += position.claimed_rewards;
            if position.withdrawn {
                continue;
            }
            stats.total_liquidity += position.liquidity;
            stats.position_count += 1;
            if let Some(pool) = self.pools.get(&position.pool_id) {
                stats.total_pending += pending_reward(position, pool, now);
            }
            if !pools_seen.contains(&position.pool_id.as_str()) {
                pools_seen.push(position.pool_id.as_str());
            }
        }
        stats.pool_count = pools_seen.len();
        stats
    }

    /// Engine-wide aggregates.
    pub fn get_global_stats(&self) -> GlobalStats {
        let active_positions = self.positions.values().filter(|p| !p.withdrawn);
        GlobalStats {
            total_pools: self.pools.len(),
            active_pools: self.pools.values().filter(|p| p.active).count(),
            total_positions: self.positions.len(),
            active_positions: active_positions.clone().count(),
            total_liquidity: active_positions.map(|p| p.liquidity).sum(),
            total_rewards_distributed: self.positions.values().map(|p| p.claimed_rewards).sum(),
            total_claim_events: self.claims.len(),
        }
    }

    /// Providers ranked by active liquidity across all pools.
    pub fn get_leaderboard(&self, limit: usize) -> Vec<LeaderboardEntry> {
        self.leaderboard_for(limit, None)
    }

    /// Providers ranked by active liquidity within one pool.
    pub fn get_pool_leaderboard(
        &self,
        pool_id: &str,
        limit: usize,
    ) -> Result<Vec<LeaderboardEntry>, EngineError> {
        if !self.pools.contains_key(pool_id) {
            return Err(EngineError::PoolNotFound { pool_id: pool_id.to_string() });
        }
        Ok(self.leaderboard_for(limit, Some(pool_id)))
    }

    /// Ranking shared by the global and per-pool leaderboards: liquidity
    /// descending, ties broken by earliest position creation, then by
    /// provider so repeated calls return identical orderings.
    fn leaderboard_for(&self, limit: usize, pool_id: Option<&str>) -> Vec<LeaderboardEntry> {
        let mut by_provider: HashMap<&str, LeaderboardEntry> = HashMap::new();
        for position in self.positions.values().filter(|p| !p.withdrawn) {
            if let Some(pool_id) = pool_id {
                if position.pool_id != pool_id {
                    continue;
                }
            }
            let entry = by_provider
                .entry(position.provider.as_str())
                .or_insert_with(|| LeaderboardEntry {
                    provider: position.provider.clone(),
                    total_liquidity: 0.0,
                    position_count: 0,
                    first_position_at: u64::MAX,
                });
            entry.total_liquidity += position.liquidity;
            entry.position_count += 1;
            entry.first_position_at = entry.first_position_at.min(position.created_at);
        }
        let mut entries: Vec<LeaderboardEntry> = by_provider.into_values().collect();
        entries.sort_by(|a, b| {
            b.total_liquidity
                .total_cmp(&a.total_liquidity)
                .then(a.first_position_at.cmp(&b.first_position_at))
                .then(a.provider.cmp(&b.provider))
        });
        entries.truncate(limit);
        entries
    }

    /// The engine's configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

/// Pending reward for a position since its last checkpoint, using the pool
/// state at computation time for the whole interval.
fn pending_reward(position: &Position, pool: &Pool, now: u64) -> f64 {
    if position.withdrawn || pool.total_shares <= 0.0 {
        return 0.0;
    }
    let elapsed = now.saturating_sub(position.last_accrual_at) as f64;
    let effective_rate = pool.reward_rate * pool.boost_multiplier;
    elapsed * effective_rate * (position.shares / pool.total_shares) * position.lock_boost
}

fn validate_boost(boost: f64) -> Result<(), EngineError> {
    if !boost.is_finite() || boost < 1.0 || boost > 3.0 {
        return Err(EngineError::invalid(format!(
            "boost multiplier must be within [1, 3], got {}",
            boost
        )));
    }
    Ok(())
}
