//! Error taxonomy for the liquidity mining engine.
//!
//! Every fallible engine operation fails fast with one of these kinds before
//! any state is mutated. The adapter layer translates them into user-visible
//! JSON envelopes; the engine itself carries only the kind and the ids
//! involved.

use thiserror::Error;

/// Failure kinds raised by [`crate::engine::LiquidityMiningEngine`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Referenced pool id does not exist.
    #[error("pool not found: {pool_id}")]
    PoolNotFound { pool_id: String },

    /// Referenced position id does not exist.
    #[error("position not found: {position_id}")]
    PositionNotFound { position_id: String },

    /// Malformed input: non-positive amount, out-of-range boost, empty
    /// market id, invalid price, or a duplicate active pool.
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// Operation attempted on a position already in the terminal
    /// withdrawn state.
    #[error("position already withdrawn: {position_id}")]
    AlreadyWithdrawn { position_id: String },

    /// Attempt to add liquidity to a deactivated pool.
    #[error("pool is not active: {pool_id}")]
    InactivePool { pool_id: String },
}

impl EngineError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        EngineError::InvalidArgument { reason: reason.into() }
    }
}
