use crate::actions::DistRule;
use crate::symbol::Asset;

/// Whether a passive-bonus charge is skimmed out of the transferred amount
/// (`WithinAmount`, the default) or charged to the sender on top of it
/// (`OutsideAmount`).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum PassiveMethodKind {
    WithinAmount,
    OutsideAmount,
}
ledgerdb_codec::codec_enum!(PassiveMethodKind { WithinAmount = 0, OutsideAmount = 1 });

/// Overrides [`PassiveMethodKind`] for one action name. An action not
/// listed here falls back to `WithinAmount`.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct PassiveMethod {
    pub action: String,
    pub method: PassiveMethodKind,
}
ledgerdb_codec::codec_struct!(PassiveMethod { action: String, method: PassiveMethodKind });

/// A fungible's passive-bonus configuration, set via `setpsvbonus` and
/// consulted by `transferft`/`recycleft`/`destroyft` to compute a bonus
/// split on every transfer once configured.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct PassiveBonus {
    pub sym_id: u32,
    pub rate: u32,
    pub base_charge: i64,
    pub charge_threshold: i64,
    pub minimum_charge: i64,
    pub dist_threshold: Asset,
    pub rules: Vec<DistRule>,
    pub methods: Vec<PassiveMethod>,
    pub latest_dist_time: i64,
}
ledgerdb_codec::codec_struct!(PassiveBonus {
    sym_id: u32,
    rate: u32,
    base_charge: i64,
    charge_threshold: i64,
    minimum_charge: i64,
    dist_threshold: Asset,
    rules: Vec<DistRule>,
    methods: Vec<PassiveMethod>,
    latest_dist_time: i64,
});

impl PassiveBonus {
    /// The method that applies to `action`, defaulting to `WithinAmount`
    /// when `action` has no entry in `methods`.
    pub fn method_for(&self, action: &str) -> PassiveMethodKind {
        self.methods
            .iter()
            .find(|m| m.action == action)
            .map(|m| m.method)
            .unwrap_or(PassiveMethodKind::WithinAmount)
    }
}
