//! Demo entry point for the liquidity mining engine.
//!
//! Wires the engine, the sqlite claim ledger and the tool server together,
//! then drives a short scripted session: create a pool, add liquidity,
//! claim, and print the resulting stats and leaderboard.

use anyhow::Result;
use lm_engine::engine::{ClaimLedger, EngineBuilder, SqliteClaimLedger};
use lm_engine::server::{FixedStakingSource, ToolRequest, ToolServer};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{info, Level};
use tracing_subscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("Starting liquidity mining engine demo");

    // Engine with default configuration and the system clock
    let engine = Arc::new(RwLock::new(EngineBuilder::new().build()));

    // Claim audit ledger fed by an mpsc channel
    let ledger = Arc::new(SqliteClaimLedger::new("sqlite:./claims.db?mode=rwc").await?);
    let (claim_sender, claim_receiver) = mpsc::channel(100);
    let ledger_handle = tokio::spawn({
        let ledger = ledger.clone();
        async move {
            ledger.run(claim_receiver).await;
        }
    });

    // Demo staking source; production would query the staking program
    let staking = Arc::new(
        FixedStakingSource::new()
            .with_stake("walletAlice", 15_000.0)
            .with_stake("walletBob", 500.0),
    );

    let server = ToolServer::new(engine, staking, Some(claim_sender));

    demo_session(&server).await;

    // Let the ledger drain before shutting down
    tokio::time::sleep(tokio::time::Duration::from_millis(500)).await;
    info!("Claim ledger persisted {} records", ledger.claim_count().await?);
    ledger_handle.abort();

    info!("Demo completed. Database file 'claims.db' contains the claim audit trail.");
    Ok(())
}

/// Drive a short scripted session through the tool adapter.
async fn demo_session(server: &ToolServer) {
    let pool = call(
        server,
        "create_pool",
        json!({
            "marketId": "PRES-2028",
            "platform": "kalshi",
            "title": "Presidential election 2028",
            "boost": 1.5
        }),
    )
    .await;
    let pool_id = pool["id"].as_str().unwrap_or_default().to_string();

    let position = call(
        server,
        "add_liquidity",
        json!({
            "poolId": pool_id,
            "provider": "walletAlice",
            "amount": 10_000.0,
            "lockDuration": "90d"
        }),
    )
    .await;
    let position_id = position["id"].as_str().unwrap_or_default().to_string();

    call(
        server,
        "add_liquidity",
        json!({
            "poolId": pool_id,
            "provider": "walletBob",
            "amount": 2_500.0,
            "lockDuration": "7d",
            "referrer": "walletAlice"
        }),
    )
    .await;

    // Let a little wall-clock time pass so a claim has something to pay
    tokio::time::sleep(tokio::time::Duration::from_secs(2)).await;

    call(server, "get_pending_rewards", json!({ "positionId": position_id })).await;
    call(server, "claim_rewards", json!({ "positionId": position_id })).await;
    call(server, "get_pool_apr", json!({ "poolId": pool_id, "tokenPriceUsd": 0.5 })).await;
    call(
        server,
        "get_compound_boost",
        json!({ "provider": "walletAlice", "lpLockBoost": 1.25 }),
    )
    .await;
    call(server, "get_leaderboard", json!({ "limit": 5 })).await;
    call(server, "get_global_stats", json!({})).await;
}

async fn call(server: &ToolServer, name: &str, arguments: serde_json::Value) -> serde_json::Value {
    let response = server.handle(ToolRequest::new(name, arguments)).await;
    if response.is_error {
        info!("{} -> error: {}", name, response.content["error"]);
    } else {
        info!("{} -> {}", name, response.content);
    }
    response.content
}
