use crate::address::Address;
use crate::meta::Meta;
use crate::name::Name;
use crate::permission::Permission;

/// A namespace for NFT-style tokens. `issue`, `transfer`, `manage` are the
/// three permission slots every action against this domain or its tokens
/// checks (see `authority_checker.hpp`'s `satisfied_domain_permission`).
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Domain {
    pub name: Name,
    pub creator: Address,
    pub create_time: i64,
    pub issue: Permission,
    pub transfer: Permission,
    pub manage: Permission,
    pub metas: Vec<Meta>,
}
ledgerdb_codec::codec_struct!(Domain {
    name: Name,
    creator: Address,
    create_time: i64,
    issue: Permission,
    transfer: Permission,
    manage: Permission,
    metas: Vec<Meta>,
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::PublicKey;
    use ledgerdb_codec::{decode_from_slice, Encode};
    use test_log::test;

    #[test]
    fn domain_roundtrip() {
        let creator = Address::PublicKey(PublicKey::from_bytes([4u8; 33]));
        let d = Domain {
            name: Name::new("cars").unwrap(),
            creator: creator.clone(),
            create_time: 1000,
            issue: Permission::single_key(Name::new("issue").unwrap(), creator.clone()),
            transfer: Permission::single_key(Name::new("transfer").unwrap(), Address::Reserved),
            manage: Permission::single_key(Name::new("manage").unwrap(), creator),
            metas: vec![],
        };
        let bytes = d.encode_to_vec();
        let back: Domain = decode_from_slice(&bytes).unwrap();
        assert_eq!(d, back);
    }
}
