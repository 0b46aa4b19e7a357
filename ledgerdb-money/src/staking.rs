//! The stake-pool net-value curve (spec §4.7's staking bullet: "shares
//! carry `net_value` snapshot at stake time ... active-to-fixed conversion
//! uses the stake-pool curve").

use ledgerdb_base::{Error, Kind, Result};
use ledgerdb_types::{Asset, Symbol};

pub const NET_VALUE_SCALE: u64 = 1_000_000;

/// `units` shares converted to an amount at `net_value_scaled`, the pool's
/// current value-per-share scaled by [`NET_VALUE_SCALE`].
pub fn net_value_amount(net_value_scaled: u64, units: u64, sym: Symbol) -> Result<Asset> {
    let scaled = (units as u128) * (net_value_scaled as u128) / (NET_VALUE_SCALE as u128);
    let amount: i64 = scaled.try_into().map_err(|_| Error::kind(Kind::MathOverflow, "net value conversion overflowed i64"))?;
    Ok(Asset::new(amount, sym))
}

/// Advances the pool's net value by one demand-rate cycle: value grows by
/// `demand_rate_per_million / 1_000_000` of its current value, compounding
/// cycle over cycle the way a fixed per-cycle interest accrual would.
pub fn apply_cycle(net_value_scaled: u64, demand_rate_per_million: u32) -> u64 {
    let growth = (net_value_scaled as u128) * (demand_rate_per_million as u128) / (NET_VALUE_SCALE as u128);
    net_value_scaled.saturating_add(growth as u64)
}
