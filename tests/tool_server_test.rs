//! Tests for the tool-call adapter: JSON round-trips, error envelopes and
//! concurrent-call behavior.

use lm_engine::engine::{EngineBuilder, ManualClock};
use lm_engine::server::{FixedStakingSource, ToolRequest, ToolServer};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

fn server_at(start: u64) -> (ToolServer, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(start));
    let engine = Arc::new(RwLock::new(
        EngineBuilder::new().with_clock(clock.clone()).build(),
    ));
    let staking = Arc::new(FixedStakingSource::new().with_stake("walletStaker", 15_000.0));
    (ToolServer::new(engine, staking, None), clock)
}

#[tokio::test]
async fn create_pool_and_add_liquidity_round_trip() {
    let (server, _) = server_at(1_700_000_000);

    let response = server
        .handle(ToolRequest::new(
            "create_pool",
            json!({
                "marketId": "PRES-2028",
                "platform": "kalshi",
                "title": "Presidential election 2028",
                "boost": 1.5
            }),
        ))
        .await;
    assert!(!response.is_error);
    assert_eq!(response.content["marketId"], "PRES-2028");
    assert_eq!(response.content["platform"], "kalshi");
    assert_eq!(response.content["boostMultiplier"], 1.5);
    let pool_id = response.content["id"].as_str().unwrap().to_string();
    assert!(pool_id.starts_with("pool_"));

    let response = server
        .handle(ToolRequest::new(
            "add_liquidity",
            json!({
                "poolId": pool_id,
                "provider": "walletA",
                "amount": 1_000.0,
                "lockDuration": "30d"
            }),
        ))
        .await;
    assert!(!response.is_error);
    assert_eq!(response.content["shares"], 1_000.0);
    assert_eq!(response.content["lockDuration"], "30d");

    // Lock expiry is exposed both as unix seconds and ISO-8601.
    let iso = response.content["lockExpiresAtIso"].as_str().unwrap();
    let parsed = chrono::DateTime::parse_from_rfc3339(iso).unwrap();
    assert_eq!(
        parsed.timestamp(),
        response.content["lockExpiresAt"].as_i64().unwrap()
    );
}

#[tokio::test]
async fn failures_come_back_as_error_envelopes() {
    let (server, _) = server_at(0);

    // Unknown tool
    let response = server.handle(ToolRequest::new("mint_money", json!({}))).await;
    assert!(response.is_error);
    assert!(response.content["error"]
        .as_str()
        .unwrap()
        .contains("unknown tool"));

    // Engine error
    let response = server
        .handle(ToolRequest::new("get_pool", json!({ "poolId": "pool_missing" })))
        .await;
    assert!(response.is_error);
    assert!(response.content["error"]
        .as_str()
        .unwrap()
        .contains("pool not found"));

    // Malformed arguments
    let response = server
        .handle(ToolRequest::new(
            "add_liquidity",
            json!({ "poolId": "p", "provider": "w", "amount": "not-a-number", "lockDuration": "30d" }),
        ))
        .await;
    assert!(response.is_error);
    assert!(response.content["error"]
        .as_str()
        .unwrap()
        .contains("invalid arguments"));
}

#[tokio::test]
async fn compound_boost_composes_lp_and_staking_sides() {
    let (server, _) = server_at(0);

    let response = server
        .handle(ToolRequest::new(
            "get_compound_boost",
            json!({ "provider": "walletStaker", "lpLockBoost": 1.25 }),
        ))
        .await;
    assert!(!response.is_error);
    assert_eq!(response.content["tier"], "gold");
    assert_eq!(response.content["stakingMultiplier"], 1.2);
    let total = response.content["totalBoost"].as_f64().unwrap();
    assert!((total - 1.25 * 1.2 * 1.05).abs() < 1e-9);

    // No stake composes to the bare LP boost.
    let response = server
        .handle(ToolRequest::new(
            "get_compound_boost",
            json!({ "provider": "walletNobody", "lpLockBoost": 1.25 }),
        ))
        .await;
    assert_eq!(response.content["totalBoost"], 1.25);
}

#[tokio::test]
async fn concurrent_removals_apply_exactly_once() {
    let (server, clock) = server_at(0);
    let server = Arc::new(server);

    let pool = server
        .handle(ToolRequest::new(
            "create_pool",
            json!({ "marketId": "m", "platform": "manifold", "title": "Race" }),
        ))
        .await
        .content;
    let position = server
        .handle(ToolRequest::new(
            "add_liquidity",
            json!({
                "poolId": pool["id"],
                "provider": "walletA",
                "amount": 1_000.0,
                "lockDuration": "7d"
            }),
        ))
        .await
        .content;
    let position_id = position["id"].as_str().unwrap().to_string();
    clock.advance(3_600);

    let mut handles = Vec::new();
    for _ in 0..2 {
        let server = server.clone();
        let position_id = position_id.clone();
        handles.push(tokio::spawn(async move {
            server
                .handle(ToolRequest::new(
                    "remove_liquidity",
                    json!({ "positionId": position_id }),
                ))
                .await
        }));
    }

    let mut successes = 0;
    let mut already_withdrawn = 0;
    for handle in handles {
        let response = handle.await.unwrap();
        if response.is_error {
            assert!(response.content["error"]
                .as_str()
                .unwrap()
                .contains("already withdrawn"));
            already_withdrawn += 1;
        } else {
            assert_eq!(response.content["liquidity"], 1_000.0);
            successes += 1;
        }
    }
    assert_eq!(successes, 1);
    assert_eq!(already_withdrawn, 1);

    // Pool totals reflect exactly one withdrawal.
    let pool = server
        .handle(ToolRequest::new("get_pool", json!({ "poolId": pool["id"] })))
        .await
        .content;
    assert_eq!(pool["totalLiquidity"], 0.0);
}

#[tokio::test]
async fn claim_records_are_forwarded_to_the_ledger_channel() {
    let clock = Arc::new(ManualClock::new(0));
    let engine = Arc::new(RwLock::new(
        EngineBuilder::new().with_clock(clock.clone()).build(),
    ));
    let (sender, mut receiver) = mpsc::channel(10);
    let server = ToolServer::new(
        engine,
        Arc::new(FixedStakingSource::new()),
        Some(sender),
    );

    let pool = server
        .handle(ToolRequest::new(
            "create_pool",
            json!({ "marketId": "m", "platform": "kalshi", "title": "Audit" }),
        ))
        .await
        .content;
    let position = server
        .handle(ToolRequest::new(
            "add_liquidity",
            json!({
                "poolId": pool["id"],
                "provider": "walletA",
                "amount": 100.0,
                "lockDuration": "7d"
            }),
        ))
        .await
        .content;
    clock.advance(1_000);

    let claim = server
        .handle(ToolRequest::new(
            "claim_rewards",
            json!({ "positionId": position["id"] }),
        ))
        .await
        .content;
    assert!(!claim["id"].as_str().unwrap().is_empty());

    let forwarded = receiver.recv().await.unwrap();
    assert_eq!(forwarded.id, claim["id"].as_str().unwrap());
    assert_eq!(forwarded.provider, "walletA");
    assert!(forwarded.amount > 0.0);
}
