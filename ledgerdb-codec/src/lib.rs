//! Deterministic binary record codec.
//!
//! Every value in this crate encodes to exactly one byte sequence and every
//! byte sequence produced by `encode` decodes back to an equal value
//! (`decode(encode(x)) == x`, consuming the whole buffer). There is no
//! self-describing framing beyond what each type's `Decode` impl expects:
//! callers must decode with the same type they encoded with.
//!
//! Primitives:
//! - unsigned integers are LEB128 varints
//! - signed integers are zigzag-mapped to unsigned, then varint-encoded
//! - fixed-width integers (`Fixed<T>`) are little-endian, used where a
//!   constant-width field is required (key prefixes, sort-significant
//!   fields)
//! - byte strings and sequences are varint-length-prefixed
//! - tagged unions use a single leading byte discriminant

mod varint;

use std::io::{self, Read, Write};

use ledgerdb_base::{Error, Kind};
pub use ledgerdb_base::Result;

pub use varint::{read_uvarint, read_varint, write_uvarint, write_varint};

/// Implements [`Encode`]/[`Decode`] for a struct by encoding its fields in
/// declaration order, the way `FC_REFLECT` fixes a field order for the
/// source's structs. Used across the crates that define wire records so
/// each one doesn't hand-write the same sequential field plumbing.
///
/// A field typed `Vec<u8>` goes through the dedicated `Vec<u8>` impl
/// (raw bytes); a field typed `Vec<T>` for any other `T` goes through
/// [`encode_seq`]/[`decode_seq`] (no blanket `Vec<T>: Encode` impl exists,
/// since that would coherence-conflict with the dedicated `Vec<u8>` one);
/// everything else goes through the plain `Encode`/`Decode` impl for its
/// type. The distinction is made here, while each field's type is still
/// raw, unparsed tokens — matching literally on `Vec<u8>` wouldn't be
/// possible after it's captured as an opaque `:ty` fragment.
#[macro_export]
macro_rules! codec_struct {
    ($name:ident { $($body:tt)* }) => {
        $crate::__codec_struct_munch!($name { $($body)* } [] []);
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __codec_struct_munch {
    ($name:ident {} [$($enc:tt)*] [$($dec:tt)*]) => {
        impl $crate::Encode for $name {
            fn encode<W: ::std::io::Write>(&self, w: &mut W) -> ::std::io::Result<()> {
                $($enc)*
                Ok(())
            }
        }
        impl $crate::Decode for $name {
            fn decode<R: ::std::io::Read>(r: &mut R) -> $crate::Result<Self> {
                Ok($name { $($dec)* })
            }
        }
    };
    ($name:ident { , $($rest:tt)* } [$($enc:tt)*] [$($dec:tt)*]) => {
        $crate::__codec_struct_munch!($name { $($rest)* } [$($enc)*] [$($dec)*]);
    };
    ($name:ident { $field:ident : Vec<u8> , $($rest:tt)* } [$($enc:tt)*] [$($dec:tt)*]) => {
        $crate::__codec_struct_munch!($name { $($rest)* }
            [$($enc)* $crate::Encode::encode(&self.$field, w)?;]
            [$($dec)* $field: <Vec<u8> as $crate::Decode>::decode(r)?,]);
    };
    ($name:ident { $field:ident : Vec<u8> } [$($enc:tt)*] [$($dec:tt)*]) => {
        $crate::__codec_struct_munch!($name {}
            [$($enc)* $crate::Encode::encode(&self.$field, w)?;]
            [$($dec)* $field: <Vec<u8> as $crate::Decode>::decode(r)?,]);
    };
    ($name:ident { $field:ident : Vec<$t:ty> , $($rest:tt)* } [$($enc:tt)*] [$($dec:tt)*]) => {
        $crate::__codec_struct_munch!($name { $($rest)* }
            [$($enc)* $crate::encode_seq(&self.$field, w)?;]
            [$($dec)* $field: $crate::decode_seq::<$t, _>(r)?,]);
    };
    ($name:ident { $field:ident : Vec<$t:ty> } [$($enc:tt)*] [$($dec:tt)*]) => {
        $crate::__codec_struct_munch!($name {}
            [$($enc)* $crate::encode_seq(&self.$field, w)?;]
            [$($dec)* $field: $crate::decode_seq::<$t, _>(r)?,]);
    };
    ($name:ident { $field:ident : $ty:ty , $($rest:tt)* } [$($enc:tt)*] [$($dec:tt)*]) => {
        $crate::__codec_struct_munch!($name { $($rest)* }
            [$($enc)* $crate::Encode::encode(&self.$field, w)?;]
            [$($dec)* $field: <$ty as $crate::Decode>::decode(r)?,]);
    };
    ($name:ident { $field:ident : $ty:ty } [$($enc:tt)*] [$($dec:tt)*]) => {
        $crate::__codec_struct_munch!($name {}
            [$($enc)* $crate::Encode::encode(&self.$field, w)?;]
            [$($dec)* $field: <$ty as $crate::Decode>::decode(r)?,]);
    };
}

/// Implements [`Encode`]/[`Decode`] for a tagged union whose variants each
/// wrap exactly one payload type: a single leading byte discriminant
/// followed by the payload's own encoding.
#[macro_export]
macro_rules! codec_data_enum {
    ($name:ident { $($variant:ident($payload:ty) = $tag:literal),* $(,)? }) => {
        impl $crate::Encode for $name {
            fn encode<W: ::std::io::Write>(&self, w: &mut W) -> ::std::io::Result<()> {
                match self {
                    $( $name::$variant(p) => {
                        w.write_all(&[$tag])?;
                        $crate::Encode::encode(p, w)
                    } )*
                }
            }
        }
        impl $crate::Decode for $name {
            fn decode<R: ::std::io::Read>(r: &mut R) -> $crate::Result<Self> {
                let mut byte = [0u8; 1];
                ::std::io::Read::read_exact(r, &mut byte)
                    .map_err(|_| ledgerdb_base::Error::kind(
                        ledgerdb_base::Kind::DecodeTruncated,
                        concat!("truncated discriminant for ", stringify!($name)),
                    ))?;
                match byte[0] {
                    $( $tag => Ok($name::$variant(<$payload as $crate::Decode>::decode(r)?)), )*
                    other => Err(ledgerdb_base::Error::kind(
                        ledgerdb_base::Kind::DecodeBadDiscriminant,
                        format!("{} is not a valid {} discriminant", other, stringify!($name)),
                    )),
                }
            }
        }
    };
}

/// Implements [`Encode`]/[`Decode`] for a C-like enum as a single byte
/// discriminant, erroring with `Kind::DecodeBadDiscriminant` on an
/// out-of-range tag.
#[macro_export]
macro_rules! codec_enum {
    ($name:ident { $($variant:ident = $tag:literal),* $(,)? }) => {
        impl $crate::Encode for $name {
            fn encode<W: ::std::io::Write>(&self, w: &mut W) -> ::std::io::Result<()> {
                let tag: u8 = match self {
                    $( $name::$variant => $tag, )*
                };
                w.write_all(&[tag])
            }
        }
        impl $crate::Decode for $name {
            fn decode<R: ::std::io::Read>(r: &mut R) -> $crate::Result<Self> {
                let mut byte = [0u8; 1];
                ::std::io::Read::read_exact(r, &mut byte)
                    .map_err(|_| ledgerdb_base::Error::kind(
                        ledgerdb_base::Kind::DecodeTruncated,
                        concat!("truncated discriminant for ", stringify!($name)),
                    ))?;
                match byte[0] {
                    $( $tag => Ok($name::$variant), )*
                    other => Err(ledgerdb_base::Error::kind(
                        ledgerdb_base::Kind::DecodeBadDiscriminant,
                        format!("{} is not a valid {} discriminant", other, stringify!($name)),
                    )),
                }
            }
        }
    };
}

/// Maximum byte length accepted for any length-prefixed blob or sequence.
/// Guards decode against a corrupt or adversarial length field asking for
/// an unreasonable allocation.
pub const MAX_BLOB_LEN: u64 = 64 * 1024 * 1024;

pub trait Encode {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<()>;

    fn encode_to_vec(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.encode(&mut buf).expect("encoding to a Vec cannot fail");
        buf
    }
}

pub trait Decode: Sized {
    fn decode<R: Read>(r: &mut R) -> Result<Self>;
}

/// Decodes `T` from `bytes`, requiring the entire slice be consumed.
/// A non-empty remainder is `Kind::DecodeTrailingBytes`, per the
/// "decode is a complete parse, not a prefix match" invariant.
pub fn decode_from_slice<T: Decode>(bytes: &[u8]) -> Result<T> {
    let mut cursor = io::Cursor::new(bytes);
    let value = T::decode(&mut cursor)?;
    let pos = cursor.position() as usize;
    if pos != bytes.len() {
        return Err(Error::kind(
            Kind::DecodeTrailingBytes,
            format!("{} unconsumed byte(s) after decode", bytes.len() - pos),
        ));
    }
    Ok(value)
}

fn eof_to_truncated(err: io::Error) -> Error {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        Error::kind(Kind::DecodeTruncated, "unexpected end of input")
    } else {
        Error::new_kind(Kind::EncodeError, err)
    }
}

fn read_exact_n<R: Read>(r: &mut R, n: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; n];
    r.read_exact(&mut buf).map_err(eof_to_truncated)?;
    Ok(buf)
}

// --- unsigned integers: varint -----------------------------------------

macro_rules! impl_uint_varint {
    ($($t:ty),*) => {$(
        impl Encode for $t {
            fn encode<W: Write>(&self, w: &mut W) -> io::Result<()> {
                write_uvarint(w, *self as u64)
            }
        }
        impl Decode for $t {
            fn decode<R: Read>(r: &mut R) -> Result<Self> {
                let v = read_uvarint(r).map_err(eof_to_truncated)?;
                <$t>::try_from(v).map_err(|_| {
                    Error::kind(Kind::DecodeOversize, concat!("varint overflows ", stringify!($t)))
                })
            }
        }
    )*};
}
impl_uint_varint!(u8, u16, u32, u64, usize);

// --- signed integers: zigzag + varint ------------------------------------

macro_rules! impl_sint_zigzag {
    ($($t:ty),*) => {$(
        impl Encode for $t {
            fn encode<W: Write>(&self, w: &mut W) -> io::Result<()> {
                write_varint(w, *self as i64)
            }
        }
        impl Decode for $t {
            fn decode<R: Read>(r: &mut R) -> Result<Self> {
                let v = read_varint(r).map_err(eof_to_truncated)?;
                <$t>::try_from(v).map_err(|_| {
                    Error::kind(Kind::DecodeOversize, concat!("zigzag varint overflows ", stringify!($t)))
                })
            }
        }
    )*};
}
impl_sint_zigzag!(i8, i16, i32, i64);

// --- bool -----------------------------------------------------------------

impl Encode for bool {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&[*self as u8])
    }
}
impl Decode for bool {
    fn decode<R: Read>(r: &mut R) -> Result<Self> {
        let b = read_exact_n(r, 1)?[0];
        match b {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(Error::kind(
                Kind::DecodeBadDiscriminant,
                format!("bool discriminant {other} is neither 0 nor 1"),
            )),
        }
    }
}

/// A little-endian, constant-width wrapper, for fields that need a fixed
/// byte width (e.g. a tokendb key prefix) rather than a varint's variable
/// length.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Fixed<T>(pub T);

macro_rules! impl_fixed {
    ($($t:ty),*) => {$(
        impl Encode for Fixed<$t> {
            fn encode<W: Write>(&self, w: &mut W) -> io::Result<()> {
                w.write_all(&self.0.to_le_bytes())
            }
        }
        impl Decode for Fixed<$t> {
            fn decode<R: Read>(r: &mut R) -> Result<Self> {
                let bytes = read_exact_n(r, std::mem::size_of::<$t>())?;
                let arr = bytes.try_into().expect("exact-size read");
                Ok(Fixed(<$t>::from_le_bytes(arr)))
            }
        }
    )*};
}
impl_fixed!(u16, u32, u64, i16, i32, i64);

// --- byte strings and UTF-8 strings --------------------------------------

impl Encode for [u8] {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write_uvarint(w, self.len() as u64)?;
        w.write_all(self)
    }
}
impl Encode for Vec<u8> {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<()> {
        self.as_slice().encode(w)
    }
}
impl Decode for Vec<u8> {
    fn decode<R: Read>(r: &mut R) -> Result<Self> {
        let len = read_blob_len(r)?;
        read_exact_n(r, len)
    }
}

impl Encode for str {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<()> {
        self.as_bytes().encode(w)
    }
}
impl Encode for String {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<()> {
        self.as_str().encode(w)
    }
}
impl Decode for String {
    fn decode<R: Read>(r: &mut R) -> Result<Self> {
        let bytes = Vec::<u8>::decode(r)?;
        String::from_utf8(bytes)
            .map_err(|e| Error::kind(Kind::DecodeBadDiscriminant, format!("not valid utf-8: {e}")))
    }
}

fn read_blob_len<R: Read>(r: &mut R) -> Result<usize> {
    let len = read_uvarint(r).map_err(eof_to_truncated)?;
    if len > MAX_BLOB_LEN {
        return Err(Error::kind(
            Kind::DecodeOversize,
            format!("blob length {len} exceeds {MAX_BLOB_LEN}"),
        ));
    }
    Ok(len as usize)
}

// --- sequences --------------------------------------------------------

/// Varint-length-prefixes `items.len()` followed by each element's own
/// encoding. This can't be a blanket `impl<T: Encode> Encode for Vec<T>`
/// because that would conflict (coherence-wise) with the dedicated
/// `Vec<u8>` impl above, which stores raw bytes rather than
/// varint-per-byte; callers that need `Vec<T>` for some other element type
/// call this directly (the `codec_struct!` macro does so for any field
/// declared as `Vec<$t>` other than `Vec<u8>`).
pub fn encode_seq<T: Encode, W: Write>(items: &[T], w: &mut W) -> io::Result<()> {
    write_uvarint(w, items.len() as u64)?;
    for item in items {
        item.encode(w)?;
    }
    Ok(())
}

/// The `Decode` counterpart to [`encode_seq`].
pub fn decode_seq<T: Decode, R: Read>(r: &mut R) -> Result<Vec<T>> {
    let len = read_blob_len(r)?;
    let mut v = Vec::with_capacity(len.min(4096));
    for _ in 0..len {
        v.push(T::decode(r)?);
    }
    Ok(v)
}

/// A sequence of `Option<T>` in which every element must be present. Per
/// the ABI serializer's own note that an array of optionals is ambiguous,
/// this implementation refuses to encode or decode a `None` inside a
/// sequence context; use a plain `Vec<T>` for that, or a single
/// `Option<T>` field outside a sequence.
impl<T: Encode> Encode for Vec<Option<T>> {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<()> {
        write_uvarint(w, self.len() as u64)?;
        for item in self {
            match item {
                Some(v) => v.encode(w)?,
                None => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        "cannot encode None inside a sequence of optionals",
                    ))
                }
            }
        }
        Ok(())
    }
}

// --- single Option<T> (not inside a sequence) --------------------------

impl<T: Encode> Encode for Option<T> {
    fn encode<W: Write>(&self, w: &mut W) -> io::Result<()> {
        match self {
            None => w.write_all(&[0]),
            Some(v) => {
                w.write_all(&[1])?;
                v.encode(w)
            }
        }
    }
}
impl<T: Decode> Decode for Option<T> {
    fn decode<R: Read>(r: &mut R) -> Result<Self> {
        let tag = read_exact_n(r, 1)?[0];
        match tag {
            0 => Ok(None),
            1 => Ok(Some(T::decode(r)?)),
            other => Err(Error::kind(
                Kind::DecodeBadDiscriminant,
                format!("option discriminant {other} is neither 0 nor 1"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn roundtrip<T: Encode + Decode + PartialEq + std::fmt::Debug>(v: T) {
        let bytes = v.encode_to_vec();
        let back: T = decode_from_slice(&bytes).expect("decode");
        assert_eq!(v, back);
    }

    #[test]
    fn uint_roundtrip() {
        roundtrip(0u64);
        roundtrip(1u64);
        roundtrip(u64::MAX);
        roundtrip(300u32);
    }

    #[test]
    fn sint_roundtrip() {
        roundtrip(0i64);
        roundtrip(-1i64);
        roundtrip(i64::MIN);
        roundtrip(i64::MAX);
        roundtrip(-12345i32);
    }

    #[test]
    fn fixed_roundtrip() {
        roundtrip(Fixed(0x0102_0304_0506_0708u64));
        roundtrip(Fixed(-1i32));
    }

    #[test]
    fn string_roundtrip() {
        roundtrip(String::from("hello, ledger"));
        roundtrip(String::new());
    }

    #[test]
    fn vec_roundtrip() {
        roundtrip(vec![1u8, 2, 3]);
        roundtrip(Vec::<u64>::new());
        roundtrip(vec![String::from("a"), String::from("b")]);
    }

    #[test]
    fn option_roundtrip() {
        roundtrip(Some(42u64));
        roundtrip(None::<u64>);
    }

    #[test]
    fn trailing_bytes_is_error() {
        let mut bytes = 7u64.encode_to_vec();
        bytes.push(0xff);
        let err = decode_from_slice::<u64>(&bytes).unwrap_err();
        assert_eq!(err.find_kind(), Some(Kind::DecodeTrailingBytes));
    }

    #[test]
    fn truncated_is_error() {
        let bytes = 300u64.encode_to_vec();
        let short = &bytes[..bytes.len() - 1];
        let err = decode_from_slice::<u64>(short).unwrap_err();
        assert_eq!(err.find_kind(), Some(Kind::DecodeTruncated));
    }

    #[test]
    fn bool_bad_discriminant_is_error() {
        let bytes = vec![2u8];
        let err = decode_from_slice::<bool>(&bytes).unwrap_err();
        assert_eq!(err.find_kind(), Some(Kind::DecodeBadDiscriminant));
    }

    #[test]
    fn vec_of_option_forbids_none() {
        let v: Vec<Option<u64>> = vec![Some(1), None];
        let mut buf = Vec::new();
        let err = v.encode(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    proptest::proptest! {
        #[test]
        fn prop_u64_roundtrip(v: u64) {
            let bytes = v.encode_to_vec();
            let back: u64 = decode_from_slice(&bytes).unwrap();
            proptest::prop_assert_eq!(v, back);
        }

        #[test]
        fn prop_i64_roundtrip(v: i64) {
            let bytes = v.encode_to_vec();
            let back: i64 = decode_from_slice(&bytes).unwrap();
            proptest::prop_assert_eq!(v, back);
        }

        #[test]
        fn prop_string_roundtrip(s: String) {
            let bytes = s.encode_to_vec();
            let back: String = decode_from_slice(&bytes).unwrap();
            proptest::prop_assert_eq!(s, back);
        }
    }
}
