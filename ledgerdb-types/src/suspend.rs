use crate::address::Address;
use crate::key::PublicKey;
use crate::name::Name;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SuspendStatus {
    Proposed,
    Executed,
    Failed,
    Cancelled,
}
ledgerdb_codec::codec_enum!(SuspendStatus {
    Proposed = 0,
    Executed = 1,
    Failed = 2,
    Cancelled = 3,
});

/// A transaction proposed for later, collective signing. `packed_trx` is
/// the proposer's originally signed transaction, re-encoded verbatim
/// (deferred decoding, performed when `execsuspend` actually runs it) so
/// that signature verification over it does not depend on this crate's
/// own transaction envelope shape.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Suspend {
    pub name: Name,
    pub proposer: Address,
    pub status: SuspendStatus,
    pub packed_trx: Vec<u8>,
    pub signed_keys: Vec<PublicKey>,
}
ledgerdb_codec::codec_struct!(Suspend {
    name: Name,
    proposer: Address,
    status: SuspendStatus,
    packed_trx: Vec<u8>,
    signed_keys: Vec<PublicKey>,
});

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerdb_codec::{decode_from_slice, Encode};
    use test_log::test;

    #[test]
    fn suspend_roundtrip() {
        let s = Suspend {
            name: Name::new("proposal1").unwrap(),
            proposer: Address::PublicKey(PublicKey::from_bytes([5u8; 33])),
            status: SuspendStatus::Proposed,
            packed_trx: vec![1, 2, 3],
            signed_keys: vec![PublicKey::from_bytes([6u8; 33])],
        };
        let bytes = s.encode_to_vec();
        let back: Suspend = decode_from_slice(&bytes).unwrap();
        assert_eq!(s, back);
    }
}
