use crate::address::Address;
use crate::name::Name;
use crate::symbol::Asset;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum LockStatus {
    Proposed,
    Succeed,
    Failed,
    Unlocked,
}
ledgerdb_codec::codec_enum!(LockStatus {
    Proposed = 0,
    Succeed = 1,
    Failed = 2,
    Unlocked = 3,
});

/// Which outcome releases a lock's escrowed assets: all approvers sign
/// (`AllApprove`), a single approver suffices (`AnyApprove`), or the
/// `unlock_time` simply elapses (`TimeOnly`).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum LockCondition {
    AllApprove,
    AnyApprove,
    TimeOnly,
}
ledgerdb_codec::codec_enum!(LockCondition { AllApprove = 0, AnyApprove = 1, TimeOnly = 2 });

/// A conditional-release escrow: `proposer` deposits `assets`, which
/// `succeed` addresses receive once `condition` is met before `deadline`,
/// or which revert to `failed` addresses otherwise. Distinct from
/// `Suspend` in that it escrows value rather than deferring a signed
/// transaction.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Lock {
    pub name: Name,
    pub proposer: Address,
    pub status: LockStatus,
    pub unlock_time: i64,
    pub deadline: i64,
    pub assets: Vec<Asset>,
    pub condition: LockCondition,
    pub succeed: Vec<Address>,
    pub failed: Vec<Address>,
    pub approved_keys: Vec<Address>,
}
ledgerdb_codec::codec_struct!(Lock {
    name: Name,
    proposer: Address,
    status: LockStatus,
    unlock_time: i64,
    deadline: i64,
    assets: Vec<Asset>,
    condition: LockCondition,
    succeed: Vec<Address>,
    failed: Vec<Address>,
    approved_keys: Vec<Address>,
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::PublicKey;
    use crate::symbol::Symbol;
    use ledgerdb_codec::{decode_from_slice, Encode};
    use test_log::test;

    #[test]
    fn lock_roundtrip() {
        let l = Lock {
            name: Name::new("escrow1").unwrap(),
            proposer: Address::PublicKey(PublicKey::from_bytes([3u8; 33])),
            status: LockStatus::Proposed,
            unlock_time: 100,
            deadline: 200,
            assets: vec![Asset::new(500, Symbol::new(4, 1).unwrap())],
            condition: LockCondition::AnyApprove,
            succeed: vec![],
            failed: vec![],
            approved_keys: vec![],
        };
        let bytes = l.encode_to_vec();
        let back: Lock = decode_from_slice(&bytes).unwrap();
        assert_eq!(l, back);
    }
}
