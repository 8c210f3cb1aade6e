//! Integration tests for the sqlite claim audit ledger.

use lm_engine::engine::{ClaimKind, ClaimLedger, ClaimRecord, SqliteClaimLedger};
use std::sync::Arc;
use tokio::sync::mpsc;

fn record(id: &str, position_id: &str, provider: &str, amount: f64, at: u64) -> ClaimRecord {
    ClaimRecord {
        id: id.to_string(),
        position_id: position_id.to_string(),
        pool_id: "pool_test".to_string(),
        provider: provider.to_string(),
        amount,
        kind: ClaimKind::Claim,
        claimed_at: at,
    }
}

#[tokio::test]
async fn insert_and_query_round_trip() {
    let ledger = SqliteClaimLedger::new("sqlite::memory:")
        .await
        .expect("Failed to create in-memory ledger");
    assert!(ledger.health_check().await.unwrap());
    assert_eq!(ledger.claim_count().await.unwrap(), 0);

    let first = record("claim_aaa", "pos_1", "walletA", 12.5, 1_000);
    let second = record("claim_bbb", "pos_1", "walletA", 7.25, 2_000);
    let other = ClaimRecord {
        kind: ClaimKind::WithdrawalFlush,
        ..record("claim_ccc", "pos_2", "walletB", 3.0, 1_500)
    };

    ledger.insert_claim(&first).await.unwrap();
    ledger.insert_claim(&second).await.unwrap();
    ledger.insert_claim(&other).await.unwrap();
    assert_eq!(ledger.claim_count().await.unwrap(), 3);

    let for_position = ledger.claims_for_position("pos_1").await.unwrap();
    assert_eq!(for_position.len(), 2);
    assert_eq!(for_position[0].id, "claim_aaa");
    assert_eq!(for_position[1].id, "claim_bbb");
    assert_eq!(for_position[0].amount, 12.5);
    assert_eq!(for_position[0].kind, ClaimKind::Claim);

    let for_provider = ledger.claims_for_provider("walletB").await.unwrap();
    assert_eq!(for_provider.len(), 1);
    assert_eq!(for_provider[0].kind, ClaimKind::WithdrawalFlush);
    assert_eq!(for_provider[0].pool_id, "pool_test");
    assert_eq!(for_provider[0].claimed_at, 1_500);
}

#[tokio::test]
async fn duplicate_claim_ids_are_rejected() {
    let ledger = SqliteClaimLedger::new("sqlite::memory:").await.unwrap();
    let claim = record("claim_dup", "pos_1", "walletA", 1.0, 100);
    ledger.insert_claim(&claim).await.unwrap();
    assert!(ledger.insert_claim(&claim).await.is_err());
    assert_eq!(ledger.claim_count().await.unwrap(), 1);
}

#[tokio::test]
async fn run_loop_persists_channel_records() {
    let ledger = Arc::new(SqliteClaimLedger::new("sqlite::memory:").await.unwrap());
    let (sender, receiver) = mpsc::channel(10);

    let loop_handle = tokio::spawn({
        let ledger = ledger.clone();
        async move {
            ledger.run(receiver).await;
        }
    });

    for i in 0..3u64 {
        let claim = record(
            &format!("claim_{}", i),
            "pos_loop",
            "walletA",
            i as f64,
            1_000 + i,
        );
        sender.send(claim).await.unwrap();
    }
    // Dropping the sender shuts the loop down once the queue drains.
    drop(sender);
    loop_handle.await.unwrap();

    assert_eq!(ledger.claim_count().await.unwrap(), 3);
    let persisted = ledger.claims_for_position("pos_loop").await.unwrap();
    assert_eq!(persisted.len(), 3);
}
