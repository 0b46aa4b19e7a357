use crate::symbol::{Asset, Symbol};

/// Tracks one symbol's staking pool: the net-value curve used to convert
/// between a staker's principal and their current share value as bonus
/// accrues, plus the split between freely-withdrawable (`active`) and
/// time-locked (`fixed`) stake.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct StakePool {
    pub sym: Symbol,
    pub total_active: Asset,
    pub total_fixed: Asset,
    /// Net value per share, scaled by 1_000_000 (six implied decimals),
    /// so it can be stored as an exact integer rather than a float.
    pub net_value_scaled: u64,
    pub begin_cycle_time: i64,
}
ledgerdb_codec::codec_struct!(StakePool {
    sym: Symbol,
    total_active: Asset,
    total_fixed: Asset,
    net_value_scaled: u64,
    begin_cycle_time: i64,
});

impl StakePool {
    pub const NET_VALUE_SCALE: u64 = 1_000_000;

    pub fn new(sym: Symbol, begin_cycle_time: i64) -> Self {
        StakePool {
            sym,
            total_active: Asset::zero(sym),
            total_fixed: Asset::zero(sym),
            net_value_scaled: Self::NET_VALUE_SCALE,
            begin_cycle_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerdb_codec::{decode_from_slice, Encode};
    use test_log::test;

    #[test]
    fn stakepool_roundtrip() {
        let sp = StakePool::new(Symbol::new(4, 1).unwrap(), 0);
        let bytes = sp.encode_to_vec();
        let back: StakePool = decode_from_slice(&bytes).unwrap();
        assert_eq!(sp, back);
    }
}
