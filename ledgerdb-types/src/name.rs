use std::fmt;
use std::io::{Read, Write};

use ledgerdb_base::{Error, Kind, Result};
use ledgerdb_codec::{Decode, Encode};

const NAME_MAX_LEN: usize = 21;
const NAME128_MAX_LEN: usize = 33;

fn validate_label(s: &str, max_len: usize) -> Result<()> {
    if s.is_empty() || s.len() > max_len {
        return Err(Error::kind(
            Kind::DomainNameInvalid,
            format!("label length must be 1..={max_len}, got {}", s.len()),
        ));
    }
    if !s
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'.' || b == b'-')
    {
        return Err(Error::kind(
            Kind::DomainNameInvalid,
            "label may only contain a-z, 0-9, '.', '-'",
        ));
    }
    Ok(())
}

/// A short label identifying a domain, group, validator, suspend proposal,
/// and so on. Up to 21 ASCII characters.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Name(String);

impl Name {
    pub fn new(s: impl Into<String>) -> Result<Self> {
        let s = s.into();
        validate_label(&s, NAME_MAX_LEN)?;
        Ok(Name(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The reserved, unassignable name used as a sentinel (e.g. a group's
    /// `key` field when the group itself, not a single key, governs it).
    pub fn reserved() -> Self {
        Name(String::new())
    }

    pub fn is_reserved(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Encode for Name {
    fn encode<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        self.0.encode(w)
    }
}
impl Decode for Name {
    fn decode<R: Read>(r: &mut R) -> Result<Self> {
        let s = String::decode(r)?;
        if s.is_empty() {
            return Ok(Name::reserved());
        }
        validate_label(&s, NAME_MAX_LEN)?;
        Ok(Name(s))
    }
}

/// A longer label for token instances (up to 33 ASCII characters) and
/// metadata keys, distinct from [`Name`] since token instance names and
/// domain names are drawn from different charsets in practice.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Name128(String);

impl Name128 {
    pub fn new(s: impl Into<String>) -> Result<Self> {
        let s = s.into();
        validate_label(&s, NAME128_MAX_LEN)?;
        Ok(Name128(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The reserved, unassignable name used as a sentinel, analogous to
    /// [`Name::reserved`].
    pub fn reserved() -> Self {
        Name128(String::new())
    }

    pub fn is_reserved(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Name128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Encode for Name128 {
    fn encode<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        self.0.encode(w)
    }
}
impl Decode for Name128 {
    fn decode<R: Read>(r: &mut R) -> Result<Self> {
        let s = String::decode(r)?;
        if s.is_empty() {
            return Ok(Name128::reserved());
        }
        validate_label(&s, NAME128_MAX_LEN)?;
        Ok(Name128(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerdb_codec::decode_from_slice;
    use test_log::test;

    #[test]
    fn name_roundtrip() {
        let n = Name::new("mydomain").unwrap();
        let bytes = n.encode_to_vec();
        let back: Name = decode_from_slice(&bytes).unwrap();
        assert_eq!(n, back);
    }

    #[test]
    fn name_rejects_bad_chars() {
        assert!(Name::new("My Domain!").is_err());
    }

    #[test]
    fn reserved_name_roundtrips() {
        let n = Name::reserved();
        assert!(n.is_reserved());
        let bytes = n.encode_to_vec();
        let back: Name = decode_from_slice(&bytes).unwrap();
        assert!(back.is_reserved());
    }

    #[test]
    fn reserved_name128_roundtrips() {
        let n = Name128::reserved();
        assert!(n.is_reserved());
        let bytes = n.encode_to_vec();
        let back: Name128 = decode_from_slice(&bytes).unwrap();
        assert!(back.is_reserved());
    }

    ledgerdb_testkit::codec_roundtrip!(prop_name_roundtrip, ledgerdb_testkit::strategies::name());
}
