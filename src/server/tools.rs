//! Tool-call dispatch over the liquidity mining engine.
//!
//! Each tool is a name plus JSON arguments. Arguments are validated and
//! coerced here before any engine call; results are serialized back to
//! JSON with lock expiries rendered as ISO-8601. Failures never escape as
//! panics, they become an `{ "error": … }` envelope with `isError` set.
//!
//! Mutating tools hold the engine write lock across the whole
//! read-modify-write, which gives the per-position mutual exclusion the
//! engine contract requires: two concurrent removals of one position
//! serialize, and the loser fails with `AlreadyWithdrawn`.

use anyhow::{anyhow, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::engine::{ClaimEventSender, ClaimRecord, LiquidityMiningEngine, Position};
use crate::server::staking::StakingBoostSource;
use crate::types::{LockDuration, Platform, Pubkey};

/// A tool-call-style request: method name plus JSON arguments.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolRequest {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

impl ToolRequest {
    pub fn new(name: &str, arguments: Value) -> Self {
        Self { name: name.to_string(), arguments }
    }
}

/// JSON response envelope for a tool call.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResponse {
    pub content: Value,
    pub is_error: bool,
}

impl ToolResponse {
    fn ok(content: Value) -> Self {
        Self { content, is_error: false }
    }

    fn error(message: String) -> Self {
        Self { content: json!({ "error": message }), is_error: true }
    }
}

/// Tool-call adapter owning a shared engine, a staking boost source and an
/// optional channel into the claim audit ledger.
pub struct ToolServer {
    engine: Arc<RwLock<LiquidityMiningEngine>>,
    staking: Arc<dyn StakingBoostSource>,
    claim_events: Option<ClaimEventSender>,
}

// --- argument structs, one per tool ---

fn default_boost() -> f64 {
    1.0
}

fn default_limit() -> usize {
    10
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatePoolArgs {
    market_id: String,
    platform: Platform,
    title: String,
    #[serde(default = "default_boost")]
    boost: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PoolArgs {
    pool_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetPoolBoostArgs {
    pool_id: String,
    boost: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddLiquidityArgs {
    pool_id: String,
    provider: Pubkey,
    amount: f64,
    lock_duration: LockDuration,
    #[serde(default)]
    referrer: Option<Pubkey>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PositionArgs {
    position_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PoolAprArgs {
    pool_id: String,
    token_price_usd: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PositionAprArgs {
    position_id: String,
    token_price_usd: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProviderArgs {
    provider: Pubkey,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeaderboardArgs {
    #[serde(default = "default_limit")]
    limit: usize,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PoolLeaderboardArgs {
    pool_id: String,
    #[serde(default = "default_limit")]
    limit: usize,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompoundBoostArgs {
    provider: Pubkey,
    lp_lock_boost: f64,
}

impl ToolServer {
    /// Create a tool server over a shared engine.
    pub fn new(
        engine: Arc<RwLock<LiquidityMiningEngine>>,
        staking: Arc<dyn StakingBoostSource>,
        claim_events: Option<ClaimEventSender>,
    ) -> Self {
        Self { engine, staking, claim_events }
    }

    /// Handle one tool call. Never panics; failures come back in the
    /// response envelope.
    pub async fn handle(&self, request: ToolRequest) -> ToolResponse {
        debug!("Handling tool call: {}", request.name);
        match self.dispatch(&request.name, request.arguments).await {
            Ok(content) => ToolResponse::ok(content),
            Err(e) => {
                info!("Tool call {} failed: {}", request.name, e);
                ToolResponse::error(e.to_string())
            }
        }
    }

    async fn dispatch(&self, name: &str, args: Value) -> Result<Value> {
        match name {
            "create_pool" => {
                let args: CreatePoolArgs = parse_args(args)?;
                let pool = self.engine.write().await.create_pool(
                    &args.market_id,
                    args.platform,
                    &args.title,
                    args.boost,
                )?;
                Ok(serde_json::to_value(&pool)?)
            }
            "get_pool" => {
                let args: PoolArgs = parse_args(args)?;
                let pool = self.engine.read().await.get_pool(&args.pool_id)?;
                Ok(serde_json::to_value(&pool)?)
            }
            "get_active_pools" => {
                let pools = self.engine.read().await.get_active_pools();
                Ok(serde_json::to_value(&pools)?)
            }
            "set_pool_boost" => {
                let args: SetPoolBoostArgs = parse_args(args)?;
                let pool = self
                    .engine
                    .write()
                    .await
                    .set_pool_boost(&args.pool_id, args.boost)?;
                Ok(serde_json::to_value(&pool)?)
            }
            "deactivate_pool" => {
                let args: PoolArgs = parse_args(args)?;
                let pool = self.engine.write().await.deactivate_pool(&args.pool_id)?;
                Ok(serde_json::to_value(&pool)?)
            }
            "add_liquidity" => {
                let args: AddLiquidityArgs = parse_args(args)?;
                let position = self.engine.write().await.add_liquidity(
                    &args.pool_id,
                    &args.provider,
                    args.amount,
                    args.lock_duration,
                    args.referrer,
                )?;
                position_view(&position)
            }
            "remove_liquidity" => {
                let args: PositionArgs = parse_args(args)?;
                let result = self.engine.write().await.remove_liquidity(&args.position_id)?;
                if let Some(record) = &result.flush_claim {
                    self.forward_claim(record);
                }
                Ok(serde_json::to_value(&result)?)
            }
            "claim_rewards" => {
                let args: PositionArgs = parse_args(args)?;
                let record = self.engine.write().await.claim_rewards(&args.position_id)?;
                self.forward_claim(&record);
                Ok(serde_json::to_value(&record)?)
            }
            "get_pending_rewards" => {
                let args: PositionArgs = parse_args(args)?;
                let pending = self.engine.read().await.get_pending_rewards(&args.position_id)?;
                Ok(json!({ "positionId": args.position_id, "pendingRewards": pending }))
            }
            "get_position" => {
                let args: PositionArgs = parse_args(args)?;
                let position = self.engine.read().await.get_position(&args.position_id)?;
                position_view(&position)
            }
            "get_pool_apr" => {
                let args: PoolAprArgs = parse_args(args)?;
                let apr = self
                    .engine
                    .read()
                    .await
                    .get_pool_apr(&args.pool_id, args.token_price_usd)?;
                Ok(json!({ "poolId": args.pool_id, "apr": apr }))
            }
            "get_position_apr" => {
                let args: PositionAprArgs = parse_args(args)?;
                let apr = self
                    .engine
                    .read()
                    .await
                    .get_position_apr(&args.position_id, args.token_price_usd)?;
                Ok(json!({ "positionId": args.position_id, "apr": apr }))
            }
            "get_provider_stats" => {
                let args: ProviderArgs = parse_args(args)?;
                let stats = self.engine.read().await.get_provider_stats(&args.provider);
                Ok(serde_json::to_value(&stats)?)
            }
            "get_global_stats" => {
                let stats = self.engine.read().await.get_global_stats();
                Ok(serde_json::to_value(&stats)?)
            }
            "get_leaderboard" => {
                let args: LeaderboardArgs = parse_args(args)?;
                let entries = self.engine.read().await.get_leaderboard(args.limit);
                Ok(serde_json::to_value(&entries)?)
            }
            "get_pool_leaderboard" => {
                let args: PoolLeaderboardArgs = parse_args(args)?;
                let entries = self
                    .engine
                    .read()
                    .await
                    .get_pool_leaderboard(&args.pool_id, args.limit)?;
                Ok(serde_json::to_value(&entries)?)
            }
            "get_compound_boost" => {
                let args: CompoundBoostArgs = parse_args(args)?;
                if !(args.lp_lock_boost > 0.0) {
                    return Err(anyhow!(
                        "invalid argument: lpLockBoost must be positive, got {}",
                        args.lp_lock_boost
                    ));
                }
                let boost = self
                    .staking
                    .compound_boost(&args.provider, args.lp_lock_boost)
                    .await?;
                Ok(serde_json::to_value(&boost)?)
            }
            other => Err(anyhow!("unknown tool: {}", other)),
        }
    }

    /// Best-effort forward to the claim audit ledger; a full or closed
    /// channel never fails the engine operation.
    fn forward_claim(&self, record: &ClaimRecord) {
        if let Some(sender) = &self.claim_events {
            if let Err(e) = sender.try_send(record.clone()) {
                warn!("Claim ledger channel unavailable, dropping record {}: {}", record.id, e);
            }
        }
    }
}

/// Deserialize tool arguments, treating absent arguments as an empty object.
fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T> {
    let args = if args.is_null() { json!({}) } else { args };
    serde_json::from_value(args).map_err(|e| anyhow!("invalid arguments: {}", e))
}

/// Position serialized for callers, with the lock expiry and creation time
/// additionally rendered as ISO-8601.
fn position_view(position: &Position) -> Result<Value> {
    let mut view = serde_json::to_value(position)?;
    view["lockExpiresAtIso"] = json!(iso_timestamp(position.lock_expires_at));
    view["createdAtIso"] = json!(iso_timestamp(position.created_at));
    Ok(view)
}

fn iso_timestamp(unix_seconds: u64) -> String {
    chrono::DateTime::<chrono::Utc>::from_timestamp(unix_seconds as i64, 0)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_default()
}
