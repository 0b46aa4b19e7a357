//! Quorum resolution for `prodvote`: `ledgerdb-exec`'s handler only ever
//! persists a vote (see `ledgerdb_exec::handlers::prodvote::prod_vote`);
//! applying the resulting median to [`ChainConfig`] once enough of the
//! active schedule has voted is this crate's job, since only it owns the
//! chain-wide configuration those votes target.

use ledgerdb_base::{Error, Kind, Result};
use ledgerdb_types::{ProdVoteRecord, Schedule};

use crate::ChainConfig;

/// `ceil(2 * n / 3)`, the number of an `n`-producer schedule's votes a key
/// needs before its median is binding.
pub fn quorum_threshold(schedule_size: usize) -> usize {
    (2 * schedule_size + 2) / 3
}

/// Applies `record`'s median to the named field of `config` if quorum has
/// been reached against `schedule`, returning whether anything changed.
/// Unrecognized keys fail with `ProdvoteKeyInvalid` rather than being
/// silently ignored, since a producer casting a vote for a nonexistent
/// field is almost certainly a typo that should surface, not fail open.
pub fn apply_vote(config: &mut ChainConfig, record: &ProdVoteRecord, schedule: &Schedule) -> Result<bool> {
    if record.votes.len() < quorum_threshold(schedule.producers.len()) {
        return Ok(false);
    }
    let Some(median) = record.median() else {
        return Ok(false);
    };
    match record.key.as_str() {
        "max_recursion_depth" => config.max_recursion_depth = median as u32,
        "abi_serialization_deadline_micros" => config.abi_serialization_deadline_micros = median as u64,
        "jmzk_link_expired_secs" => config.jmzk_link_expired_secs = median as u32,
        "unstake_pending_days" => config.unstake_pending_days = median as u32,
        "charge_factor_permille" => config.charge_factor_permille = median as u64,
        other => return Err(Error::kind(Kind::ProdvoteKeyInvalid, format!("{other:?} is not a votable configuration key"))),
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerdb_types::Name;
    use test_log::test;

    fn schedule(n: usize) -> Schedule {
        Schedule { producers: (0..n).map(|i| Name::new(format!("p{i}")).unwrap()).collect() }
    }

    #[test]
    fn quorum_threshold_is_ceil_two_thirds() {
        assert_eq!(quorum_threshold(1), 1);
        assert_eq!(quorum_threshold(3), 2);
        assert_eq!(quorum_threshold(4), 3);
        assert_eq!(quorum_threshold(5), 4);
    }

    #[test]
    fn below_quorum_does_not_apply() {
        let mut config = ChainConfig::default();
        let mut record = ProdVoteRecord::new("max_recursion_depth");
        record.cast(Name::new("p0").unwrap(), 16);
        let applied = apply_vote(&mut config, &record, &schedule(3)).unwrap();
        assert!(!applied);
        assert_eq!(config.max_recursion_depth, 32);
    }

    #[test]
    fn quorum_applies_the_median() {
        let mut config = ChainConfig::default();
        let mut record = ProdVoteRecord::new("max_recursion_depth");
        record.cast(Name::new("p0").unwrap(), 16);
        record.cast(Name::new("p1").unwrap(), 16);
        let applied = apply_vote(&mut config, &record, &schedule(3)).unwrap();
        assert!(applied);
        assert_eq!(config.max_recursion_depth, 16);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let mut config = ChainConfig::default();
        let mut record = ProdVoteRecord::new("not_a_real_field");
        record.cast(Name::new("p0").unwrap(), 1);
        record.cast(Name::new("p1").unwrap(), 1);
        let err = apply_vote(&mut config, &record, &schedule(3)).unwrap_err();
        assert_eq!(err.find_kind(), Some(Kind::ProdvoteKeyInvalid));
    }
}
