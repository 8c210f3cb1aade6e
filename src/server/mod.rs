//! Tool-call adapter layer over the liquidity mining engine.
//!
//! Translates tool-call-style JSON requests into engine method calls,
//! serializes results (lock expiries as ISO-8601), and maps engine errors
//! to a `{ "error": … }` envelope with an `isError` flag. Staking-side
//! boost composition also lives here, one level above the engine.

pub mod staking;
pub mod tools;

pub use staking::{CompoundBoost, FixedStakingSource, StakingBoostSource, StakingTier};
pub use tools::{ToolRequest, ToolResponse, ToolServer};
