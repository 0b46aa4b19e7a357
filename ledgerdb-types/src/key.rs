use std::fmt;
use std::io::{Read, Write};

use ledgerdb_base::Result;
use ledgerdb_codec::{Decode, Encode};

/// A compressed secp256k1-shaped public key. Real curve arithmetic is not
/// implemented here (see `Signature`); the 33-byte shape is kept so key
/// material round-trips byte-for-byte the way it would against a real
/// signing stack.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PublicKey(pub [u8; 33]);

impl PublicKey {
    pub fn from_bytes(bytes: [u8; 33]) -> Self {
        PublicKey(bytes)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex(&self.0))
    }
}

impl Encode for PublicKey {
    fn encode<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        w.write_all(&self.0)
    }
}
impl Decode for PublicKey {
    fn decode<R: Read>(r: &mut R) -> Result<Self> {
        let mut buf = [0u8; 33];
        r.read_exact(&mut buf).map_err(|_| {
            ledgerdb_base::Error::kind(ledgerdb_base::Kind::DecodeTruncated, "truncated public key")
        })?;
        Ok(PublicKey(buf))
    }
}

/// A recoverable signature. Unlike a real ECDSA signature, key recovery
/// here is not cryptographic: the signature carries the public key it
/// recovers to directly. This keeps the transaction context's duplicate-
/// signature and recovered-keys-set logic exercised without pulling in a
/// curve implementation the rest of this crate has no other use for.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Signature {
    pub recovers_to: PublicKey,
    pub nonce: u64,
}

impl Signature {
    pub fn new(recovers_to: PublicKey, nonce: u64) -> Self {
        Signature { recovers_to, nonce }
    }

    pub fn recover(&self) -> PublicKey {
        self.recovers_to
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature(-> {:?}, nonce={})", self.recovers_to, self.nonce)
    }
}

impl Encode for Signature {
    fn encode<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        self.recovers_to.encode(w)?;
        self.nonce.encode(w)
    }
}
impl Decode for Signature {
    fn decode<R: Read>(r: &mut R) -> Result<Self> {
        Ok(Signature {
            recovers_to: PublicKey::decode(r)?,
            nonce: u64::decode(r)?,
        })
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerdb_codec::decode_from_slice;
    use test_log::test;

    #[test]
    fn public_key_roundtrip() {
        let pk = PublicKey::from_bytes([7u8; 33]);
        let bytes = pk.encode_to_vec();
        let back: PublicKey = decode_from_slice(&bytes).unwrap();
        assert_eq!(pk, back);
    }

    #[test]
    fn signature_recovers_embedded_key() {
        let pk = PublicKey::from_bytes([1u8; 33]);
        let sig = Signature::new(pk, 42);
        assert_eq!(sig.recover(), pk);
        let bytes = sig.encode_to_vec();
        let back: Signature = decode_from_slice(&bytes).unwrap();
        assert_eq!(back.recover(), pk);
    }

    ledgerdb_testkit::codec_roundtrip!(prop_public_key_roundtrip, ledgerdb_testkit::strategies::public_key());
}
