//! Pure value math shared by the transaction context and the (not yet
//! built) controller: the network/storage charge formula, the passive-
//! bonus clamp applied on every bonus-configured transfer, and the
//! stake-pool net-value curve.
//!
//! Nothing here touches the token database — every function is a plain
//! transform over numbers and [`ledgerdb_types`] value types, so callers
//! own all persistence and error-context decisions.

pub mod bonus;
pub mod charge;
pub mod staking;
