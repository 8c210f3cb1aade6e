//! Claim audit ledger - persistent append-only log of reward payouts.
//!
//! The engine itself performs no I/O; the tool server forwards every claim
//! record over a channel and this module persists it. The trait keeps the
//! storage backend swappable.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{sqlite::SqlitePoolOptions, FromRow, Pool, Sqlite};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::engine::types::{ClaimKind, ClaimRecord};

/// Channel for forwarding claim records into the ledger loop.
pub type ClaimEventSender = mpsc::Sender<ClaimRecord>;
pub type ClaimEventReceiver = mpsc::Receiver<ClaimRecord>;

/// Formal contract for the persistent claim audit trail.
#[async_trait]
pub trait ClaimLedger: Send + Sync {
    /// Persist a claim record. Returns the database row id.
    async fn insert_claim(&self, record: &ClaimRecord) -> Result<i64>;

    /// Claim records for one position, oldest first.
    async fn claims_for_position(&self, position_id: &str) -> Result<Vec<ClaimRecord>>;

    /// Claim records for one provider, oldest first.
    async fn claims_for_provider(&self, provider: &str) -> Result<Vec<ClaimRecord>>;

    /// Total number of persisted claim records.
    async fn claim_count(&self) -> Result<i64>;

    /// Health check for the storage backend.
    async fn health_check(&self) -> Result<bool>;
}

/// Helper type for deserializing claim rows from SQLite.
#[derive(FromRow)]
struct ClaimRow {
    claim_id: String,
    position_id: String,
    pool_id: String,
    provider: String,
    amount: f64,
    kind: String,
    claimed_at: i64,
}

impl ClaimRow {
    fn into_record(self) -> ClaimRecord {
        ClaimRecord {
            id: self.claim_id,
            position_id: self.position_id,
            pool_id: self.pool_id,
            provider: self.provider,
            amount: self.amount,
            kind: match self.kind.as_str() {
                "withdrawal_flush" => ClaimKind::WithdrawalFlush,
                _ => ClaimKind::Claim,
            },
            claimed_at: self.claimed_at.max(0) as u64,
        }
    }
}

/// SQLite implementation of the claim audit trail.
pub struct SqliteClaimLedger {
    pool: Pool<Sqlite>,
}

impl SqliteClaimLedger {
    /// Connect and bootstrap the schema.
    ///
    /// Use `sqlite:./claims.db?mode=rwc` for a file-backed ledger or
    /// `sqlite::memory:` in tests.
    pub async fn new(database_url: &str) -> Result<Self> {
        // Single connection: the ledger is a serial writer, and it keeps an
        // in-memory database from fragmenting across connections.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await
            .context("Failed to connect to SQLite claim ledger")?;

        Self::create_schema(&pool).await?;
        info!("SqliteClaimLedger initialized and connected to {}", database_url);
        Ok(Self { pool })
    }

    async fn create_schema(pool: &Pool<Sqlite>) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS claims (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                claim_id TEXT NOT NULL UNIQUE,
                position_id TEXT NOT NULL,
                pool_id TEXT NOT NULL,
                provider TEXT NOT NULL,
                amount REAL NOT NULL,
                kind TEXT NOT NULL,
                claimed_at INTEGER NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await
        .context("Failed to create claims table")?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_claims_position ON claims (position_id);",
        )
        .execute(pool)
        .await
        .context("Failed to create position index")?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_claims_provider ON claims (provider);",
        )
        .execute(pool)
        .await
        .context("Failed to create provider index")?;

        Ok(())
    }

    /// Main execution loop: persists claim records arriving on the channel
    /// until every sender is dropped.
    pub async fn run(&self, mut receiver: ClaimEventReceiver) {
        info!("SqliteClaimLedger is running...");
        while let Some(record) = receiver.recv().await {
            debug!("Persisting claim {} for position {}", record.id, record.position_id);
            if let Err(e) = self.insert_claim(&record).await {
                error!("Failed to persist claim record {}: {:?}", record.id, e);
            }
        }
        info!("SqliteClaimLedger channel closed. Shutting down.");
    }
}

#[async_trait]
impl ClaimLedger for SqliteClaimLedger {
    async fn insert_claim(&self, record: &ClaimRecord) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO claims (claim_id, position_id, pool_id, provider, amount, kind, claimed_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.position_id)
        .bind(&record.pool_id)
        .bind(&record.provider)
        .bind(record.amount)
        .bind(record.kind.as_str())
        .bind(record.claimed_at as i64)
        .execute(&self.pool)
        .await
        .context("Failed to insert claim record")?;

        Ok(result.last_insert_rowid())
    }

    async fn claims_for_position(&self, position_id: &str) -> Result<Vec<ClaimRecord>> {
        let rows = sqlx::query_as::<_, ClaimRow>(
            r#"
            SELECT claim_id, position_id, pool_id, provider, amount, kind, claimed_at
            FROM claims WHERE position_id = ? ORDER BY claimed_at ASC, id ASC
            "#,
        )
        .bind(position_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch claims for position")?;

        Ok(rows.into_iter().map(ClaimRow::into_record).collect())
    }

    async fn claims_for_provider(&self, provider: &str) -> Result<Vec<ClaimRecord>> {
        let rows = sqlx::query_as::<_, ClaimRow>(
            r#"
            SELECT claim_id, position_id, pool_id, provider, amount, kind, claimed_at
            FROM claims WHERE provider = ? ORDER BY claimed_at ASC, id ASC
            "#,
        )
        .bind(provider)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch claims for provider")?;

        Ok(rows.into_iter().map(ClaimRow::into_record).collect())
    }

    async fn claim_count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM claims")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count claim records")?;
        Ok(count.0)
    }

    async fn health_check(&self) -> Result<bool> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Claim ledger health check failed")?;
        Ok(true)
    }
}
