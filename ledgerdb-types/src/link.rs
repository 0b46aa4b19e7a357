use std::io::{Read, Write};

use ledgerdb_base::{Error, Kind, Result};
use ledgerdb_codec::{Decode, Encode};

use crate::key::PublicKey;
use crate::name::{Name, Name128};
use crate::symbol::Asset;

/// One tagged field inside an everiPass/everiPay link. Readers skip
/// segments they don't recognize by design elsewhere (forward
/// compatibility); this codec does not implement that skip path since the
/// core only ever decodes links it fully understands.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum LinkSegment {
    Timestamp(i64),
    Domain(Name),
    Token(Name128),
    SymbolId(u32),
    MaxPay(Asset),
    MaxPayStr(String),
    LinkId([u8; 16]),
    Keys(Vec<PublicKey>),
}

impl Encode for LinkSegment {
    fn encode<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        match self {
            LinkSegment::Timestamp(v) => {
                w.write_all(&[0])?;
                v.encode(w)
            }
            LinkSegment::Domain(v) => {
                w.write_all(&[1])?;
                v.encode(w)
            }
            LinkSegment::Token(v) => {
                w.write_all(&[2])?;
                v.encode(w)
            }
            LinkSegment::SymbolId(v) => {
                w.write_all(&[3])?;
                v.encode(w)
            }
            LinkSegment::MaxPay(v) => {
                w.write_all(&[4])?;
                v.encode(w)
            }
            LinkSegment::MaxPayStr(v) => {
                w.write_all(&[5])?;
                v.encode(w)
            }
            LinkSegment::LinkId(v) => {
                w.write_all(&[6])?;
                w.write_all(v)
            }
            LinkSegment::Keys(v) => {
                w.write_all(&[7])?;
                ledgerdb_codec::encode_seq(v, w)
            }
        }
    }
}
impl Decode for LinkSegment {
    fn decode<R: Read>(r: &mut R) -> Result<Self> {
        let mut tag = [0u8; 1];
        r.read_exact(&mut tag)
            .map_err(|_| Error::kind(Kind::DecodeTruncated, "truncated link segment discriminant"))?;
        Ok(match tag[0] {
            0 => LinkSegment::Timestamp(i64::decode(r)?),
            1 => LinkSegment::Domain(Name::decode(r)?),
            2 => LinkSegment::Token(Name128::decode(r)?),
            3 => LinkSegment::SymbolId(u32::decode(r)?),
            4 => LinkSegment::MaxPay(Asset::decode(r)?),
            5 => LinkSegment::MaxPayStr(String::decode(r)?),
            6 => {
                let mut id = [0u8; 16];
                r.read_exact(&mut id)
                    .map_err(|_| Error::kind(Kind::DecodeTruncated, "truncated link id"))?;
                LinkSegment::LinkId(id)
            }
            7 => LinkSegment::Keys(ledgerdb_codec::decode_seq::<PublicKey, _>(r)?),
            other => {
                return Err(Error::kind(
                    Kind::InvalidLinkType,
                    format!("{other} is not a known link segment tag"),
                ))
            }
        })
    }
}

/// A full everiPass/everiPay link: a version header and its tagged
/// segments, in the order they were produced.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Link {
    pub header: u8,
    pub segments: Vec<LinkSegment>,
}
ledgerdb_codec::codec_struct!(Link { header: u8, segments: Vec<LinkSegment> });

impl Link {
    pub const SUPPORTED_HEADER: u8 = 1;

    pub fn link_id(&self) -> Option<[u8; 16]> {
        self.segments.iter().find_map(|s| match s {
            LinkSegment::LinkId(id) => Some(*id),
            _ => None,
        })
    }

    pub fn timestamp(&self) -> Option<i64> {
        self.segments.iter().find_map(|s| match s {
            LinkSegment::Timestamp(t) => Some(*t),
            _ => None,
        })
    }

    pub fn check_version(&self) -> Result<()> {
        if self.header != Self::SUPPORTED_HEADER {
            return Err(Error::kind(
                Kind::InvalidLinkVersion,
                format!("unsupported link header {}", self.header),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerdb_codec::{decode_from_slice, Encode};
    use test_log::test;

    #[test]
    fn link_roundtrip() {
        let link = Link {
            header: 1,
            segments: vec![LinkSegment::Timestamp(123), LinkSegment::LinkId([7u8; 16])],
        };
        let bytes = link.encode_to_vec();
        let back: Link = decode_from_slice(&bytes).unwrap();
        assert_eq!(link, back);
        assert_eq!(back.link_id(), Some([7u8; 16]));
        assert_eq!(back.timestamp(), Some(123));
    }

    #[test]
    fn link_rejects_bad_version() {
        let link = Link { header: 9, segments: vec![] };
        assert!(link.check_version().is_err());
    }
}
