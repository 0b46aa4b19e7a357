use serde::Deserialize;

use ledgerdb_base::{Error, Kind, Result};
use ledgerdb_exec::ExecEnv;
use ledgerdb_money::charge::ChargeSchedule;
use ledgerdb_types::Name;

/// Every option spec §6 enumerates, plus the genesis-level constants the
/// handlers need (symbol ids for the chain's two built-in fungibles, the
/// org group name `updsched`/`newstakepool`/`blackaddr` check against).
/// Loaded from a TOML file (see [`ChainConfig::load`]) or built directly
/// with [`ChainConfig::default`] for tests and the load-test harness.
#[derive(Clone, Debug)]
pub struct ChainConfig {
    pub charge_free_mode: bool,
    pub loadtest_mode: bool,
    pub max_recursion_depth: u32,
    pub abi_serialization_deadline_micros: u64,
    pub jmzk_link_expired_secs: u32,
    pub unstake_pending_days: u32,
    pub jmzk_sym_id: u32,
    pub pjmzk_sym_id: u32,
    pub root_org_group: Name,
    pub charge_baseline: u64,
    pub charge_per_byte: u64,
    pub charge_per_action: u64,
    /// Widened or narrowed by `prodvote` (see [`crate::apply_vote`]) without
    /// the charge formula itself changing shape.
    pub charge_factor_permille: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        ChainConfig {
            charge_free_mode: false,
            loadtest_mode: false,
            max_recursion_depth: 32,
            abi_serialization_deadline_micros: 200_000,
            jmzk_link_expired_secs: 60,
            unstake_pending_days: 3,
            jmzk_sym_id: 1,
            pjmzk_sym_id: 2,
            root_org_group: Name::reserved(),
            charge_baseline: 10,
            charge_per_byte: 1,
            charge_per_action: 2,
            charge_factor_permille: 1000,
        }
    }
}

impl ChainConfig {
    /// Parses `text` as TOML, falling back to [`ChainConfig::default`] for
    /// any field the document omits.
    pub fn parse(text: &str) -> Result<ChainConfig> {
        let raw: RawChainConfig = toml::from_str(text).map_err(|err| Error::new_kind(Kind::Unknown, err))?;
        raw.into_config()
    }

    /// Reads and parses the TOML file at `path`.
    pub fn load(path: &std::path::Path) -> Result<ChainConfig> {
        let text = std::fs::read_to_string(path).map_err(|err| Error::new_kind(Kind::Unknown, err))?;
        Self::parse(&text)
    }

    /// The view of this configuration `ledgerdb-exec`'s handlers actually
    /// consult, with `head_block_time` filled in by the controller for the
    /// block currently being applied.
    pub fn exec_env(&self, head_block_time: i64) -> ExecEnv {
        ExecEnv {
            head_block_time,
            root_org_group: self.root_org_group.clone(),
            jmzk_sym_id: self.jmzk_sym_id,
            pjmzk_sym_id: self.pjmzk_sym_id,
            loadtest_mode: self.loadtest_mode,
            jmzk_link_expired_secs: self.jmzk_link_expired_secs,
            unstake_pending_days: self.unstake_pending_days,
        }
    }

    /// The network/storage charge formula (spec §4.6 step 5) parameterised
    /// by this configuration's current on-chain factors.
    pub fn charge_schedule(&self) -> ChargeSchedule {
        ChargeSchedule {
            baseline: self.charge_baseline,
            per_byte: self.charge_per_byte,
            per_action: self.charge_per_action,
            factor_permille: self.charge_factor_permille,
        }
    }
}

/// Mirrors [`ChainConfig`] with every field optional, the shape a TOML
/// document is actually deserialized into, so an absent field falls back
/// to [`ChainConfig::default`] instead of failing the parse.
#[derive(Deserialize, Default)]
#[serde(rename_all = "snake_case")]
struct RawChainConfig {
    charge_free_mode: Option<bool>,
    loadtest_mode: Option<bool>,
    max_recursion_depth: Option<u32>,
    abi_serialization_deadline_micros: Option<u64>,
    jmzk_link_expired_secs: Option<u32>,
    unstake_pending_days: Option<u32>,
    jmzk_sym_id: Option<u32>,
    pjmzk_sym_id: Option<u32>,
    root_org_group: Option<String>,
    charge_baseline: Option<u64>,
    charge_per_byte: Option<u64>,
    charge_per_action: Option<u64>,
    charge_factor_permille: Option<u64>,
}

impl RawChainConfig {
    fn into_config(self) -> Result<ChainConfig> {
        let default = ChainConfig::default();
        let root_org_group = match self.root_org_group {
            Some(name) => Name::new(&name)?,
            None => default.root_org_group,
        };
        Ok(ChainConfig {
            charge_free_mode: self.charge_free_mode.unwrap_or(default.charge_free_mode),
            loadtest_mode: self.loadtest_mode.unwrap_or(default.loadtest_mode),
            max_recursion_depth: self.max_recursion_depth.unwrap_or(default.max_recursion_depth),
            abi_serialization_deadline_micros: self
                .abi_serialization_deadline_micros
                .unwrap_or(default.abi_serialization_deadline_micros),
            jmzk_link_expired_secs: self.jmzk_link_expired_secs.unwrap_or(default.jmzk_link_expired_secs),
            unstake_pending_days: self.unstake_pending_days.unwrap_or(default.unstake_pending_days),
            jmzk_sym_id: self.jmzk_sym_id.unwrap_or(default.jmzk_sym_id),
            pjmzk_sym_id: self.pjmzk_sym_id.unwrap_or(default.pjmzk_sym_id),
            root_org_group,
            charge_baseline: self.charge_baseline.unwrap_or(default.charge_baseline),
            charge_per_byte: self.charge_per_byte.unwrap_or(default.charge_per_byte),
            charge_per_action: self.charge_per_action.unwrap_or(default.charge_per_action),
            charge_factor_permille: self.charge_factor_permille.unwrap_or(default.charge_factor_permille),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn empty_document_yields_defaults() {
        let cfg = ChainConfig::parse("").unwrap();
        assert_eq!(cfg.max_recursion_depth, 32);
        assert_eq!(cfg.root_org_group, Name::reserved());
    }

    #[test]
    fn partial_document_overrides_only_named_fields() {
        let cfg = ChainConfig::parse("max_recursion_depth = 16\nroot_org_group = \"rootgroup\"\n").unwrap();
        assert_eq!(cfg.max_recursion_depth, 16);
        assert_eq!(cfg.root_org_group, Name::new("rootgroup").unwrap());
        assert_eq!(cfg.jmzk_sym_id, 1);
    }

    #[test]
    fn invalid_root_org_group_is_rejected() {
        let err = ChainConfig::parse("root_org_group = \"\"\n").unwrap_err();
        assert_eq!(err.find_kind(), Some(Kind::DomainNameInvalid));
    }

    #[test]
    fn charge_schedule_reflects_configured_factors() {
        let cfg = ChainConfig::parse("charge_baseline = 5\ncharge_factor_permille = 500\n").unwrap();
        let sched = cfg.charge_schedule();
        assert_eq!(sched.compute(0, 0), 2);
    }
}
