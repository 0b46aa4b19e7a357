//! Shared test fixtures: deterministic key/address generators, proptest
//! strategies for the domain's value types, and a `codec_roundtrip!`
//! helper so every crate's property tests aren't hand-rolling the same
//! encode/decode/assert_eq three-liner.

pub mod keys;
pub mod roundtrip;
pub mod strategies;

pub use roundtrip::assert_roundtrip;
