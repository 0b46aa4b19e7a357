use crate::address::Address;
use crate::meta::Meta;
use crate::name::{Name, Name128};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum TokenStatus {
    Normal,
    Destroyed,
}
ledgerdb_codec::codec_enum!(TokenStatus { Normal = 0, Destroyed = 1 });

/// A single NFT instance inside a domain. `owner` is a list because
/// ownership can be split across several addresses, each of which must
/// independently satisfy the owning permission slot for `owner_t`
/// authorizers (see the authority checker's owner handling).
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Token {
    pub domain: Name,
    pub name: Name128,
    pub owner: Vec<Address>,
    pub status: TokenStatus,
    pub metas: Vec<Meta>,
}
ledgerdb_codec::codec_struct!(Token {
    domain: Name,
    name: Name128,
    owner: Vec<Address>,
    status: TokenStatus,
    metas: Vec<Meta>,
});

impl Token {
    pub fn is_destroyed(&self) -> bool {
        matches!(self.status, TokenStatus::Destroyed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::PublicKey;
    use ledgerdb_codec::{decode_from_slice, Encode};
    use test_log::test;

    #[test]
    fn token_roundtrip() {
        let t = Token {
            domain: Name::new("cars").unwrap(),
            name: Name128::new("car1").unwrap(),
            owner: vec![Address::PublicKey(PublicKey::from_bytes([2u8; 33]))],
            status: TokenStatus::Normal,
            metas: vec![],
        };
        let bytes = t.encode_to_vec();
        let back: Token = decode_from_slice(&bytes).unwrap();
        assert_eq!(t, back);
        assert!(!t.is_destroyed());
    }
}
