//! Liquidity mining engine for prediction-market pools.
//!
//! This crate tracks pooled liquidity positions across prediction markets,
//! accrues rewards with time-lock boosts, applies early-withdrawal penalties,
//! and answers APR/leaderboard queries. The engine itself is pure in-memory
//! domain logic with no I/O; the `server` module exposes it through a
//! tool-call adapter, and the claim ledger persists the append-only claim
//! audit trail.

pub mod types;
pub mod engine;
pub mod server;

// Re-export main types for convenience
pub use engine::{EngineBuilder, EngineError, LiquidityMiningEngine};
pub use types::{LockDuration, Platform, Pubkey};
