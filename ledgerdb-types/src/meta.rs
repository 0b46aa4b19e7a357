use crate::address::Address;
use crate::name::Name128;

/// A single piece of metadata attached to a domain, token, group, or
/// fungible, via `addmeta`.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Meta {
    pub key: Name128,
    pub value: Vec<u8>,
    pub creator: Address,
}
ledgerdb_codec::codec_struct!(Meta { key: Name128, value: Vec<u8>, creator: Address });

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerdb_codec::{decode_from_slice, Encode};
    use test_log::test;

    #[test]
    fn meta_roundtrip() {
        let m = Meta {
            key: Name128::new("note").unwrap(),
            value: b"hello".to_vec(),
            creator: Address::Reserved,
        };
        let bytes = m.encode_to_vec();
        let back: Meta = decode_from_slice(&bytes).unwrap();
        assert_eq!(m, back);
    }
}
