use std::io::{Read, Write};

use ledgerdb_base::{Error, Kind, Result};
use ledgerdb_codec::{Decode, Encode};

use crate::key::PublicKey;
use crate::name::Name128;

/// An authorization target: a raw public key, a deterministically
/// generated address (owned by whatever process produced `prefix`/`key`,
/// e.g. a group or an NFT's internal owner slot), or the reserved address
/// that means "no specific key, defer to structural rules".
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum Address {
    Reserved,
    PublicKey(PublicKey),
    Generated { prefix: Name128, key: Name128, nonce: u32 },
}

impl Address {
    pub fn is_reserved(&self) -> bool {
        matches!(self, Address::Reserved)
    }

    pub fn as_public_key(&self) -> Option<&PublicKey> {
        match self {
            Address::PublicKey(pk) => Some(pk),
            _ => None,
        }
    }

    /// True for a generated address whose `prefix` names a group, per the
    /// ".group"-style generated addresses an NFT owner list can contain.
    pub fn is_group_ref(&self) -> bool {
        matches!(self, Address::Generated { prefix, .. } if prefix.as_str() == "group")
    }

    pub fn group_name(&self) -> Option<&Name128> {
        match self {
            Address::Generated { prefix, key, .. } if prefix.as_str() == "group" => Some(key),
            _ => None,
        }
    }
}

impl Encode for Address {
    fn encode<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        match self {
            Address::Reserved => w.write_all(&[0]),
            Address::PublicKey(pk) => {
                w.write_all(&[1])?;
                pk.encode(w)
            }
            Address::Generated { prefix, key, nonce } => {
                w.write_all(&[2])?;
                prefix.encode(w)?;
                key.encode(w)?;
                nonce.encode(w)
            }
        }
    }
}

impl Decode for Address {
    fn decode<R: Read>(r: &mut R) -> Result<Self> {
        let mut tag = [0u8; 1];
        r.read_exact(&mut tag)
            .map_err(|_| Error::kind(Kind::DecodeTruncated, "truncated address discriminant"))?;
        match tag[0] {
            0 => Ok(Address::Reserved),
            1 => Ok(Address::PublicKey(PublicKey::decode(r)?)),
            2 => Ok(Address::Generated {
                prefix: Name128::decode(r)?,
                key: Name128::decode(r)?,
                nonce: u32::decode(r)?,
            }),
            other => Err(Error::kind(
                Kind::DecodeBadDiscriminant,
                format!("{other} is not a valid address discriminant"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerdb_codec::decode_from_slice;
    use test_log::test;

    #[test]
    fn reserved_roundtrip() {
        let a = Address::Reserved;
        let bytes = a.encode_to_vec();
        let back: Address = decode_from_slice(&bytes).unwrap();
        assert_eq!(a, back);
    }

    #[test]
    fn public_key_roundtrip() {
        let a = Address::PublicKey(PublicKey::from_bytes([9u8; 33]));
        let bytes = a.encode_to_vec();
        let back: Address = decode_from_slice(&bytes).unwrap();
        assert_eq!(a, back);
    }

    #[test]
    fn generated_group_ref_roundtrip() {
        let a = Address::Generated {
            prefix: Name128::new("group").unwrap(),
            key: Name128::new("mygroup").unwrap(),
            nonce: 0,
        };
        assert!(a.is_group_ref());
        assert_eq!(a.group_name().unwrap().as_str(), "mygroup");
        let bytes = a.encode_to_vec();
        let back: Address = decode_from_slice(&bytes).unwrap();
        assert_eq!(a, back);
    }
}
