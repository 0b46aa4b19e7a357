use std::fmt::Debug;

use ledgerdb_codec::{decode_from_slice, Decode, Encode};

/// Asserts `value` survives an encode/decode round trip unchanged. Shared
/// by every crate's property tests instead of each one re-deriving the
/// same three lines.
pub fn assert_roundtrip<T: Encode + Decode + PartialEq + Debug>(value: T) {
    let bytes = value.encode_to_vec();
    let back: T = decode_from_slice(&bytes).expect("round-tripped bytes must decode");
    assert_eq!(value, back);
}

/// Wraps a `proptest!` block that feeds `$strategy` through
/// [`assert_roundtrip`], matching the `prop_*_roundtrip` tests
/// `ledgerdb-codec` already hand-writes for its primitives.
#[macro_export]
macro_rules! codec_roundtrip {
    ($test_name:ident, $strategy:expr) => {
        ::proptest::proptest! {
            #[test]
            fn $test_name(value in $strategy) {
                $crate::assert_roundtrip(value);
            }
        }
    };
}
