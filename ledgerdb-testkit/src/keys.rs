use ledgerdb_types::{Address, Name, Name128, PublicKey};

/// A deterministic key for test fixtures: every byte set to `seed`, so two
/// calls with the same seed always produce the same key and two different
/// seeds never collide.
pub fn key(seed: u8) -> PublicKey {
    PublicKey::from_bytes([seed; 33])
}

/// A `PublicKey`-backed address over [`key`].
pub fn address(seed: u8) -> Address {
    Address::PublicKey(key(seed))
}

/// A valid [`Name`] built from `label`, panicking on an invalid label —
/// fixtures are expected to pass literals they already know are valid.
pub fn name(label: &str) -> Name {
    Name::new(label).expect("fixture label must already be a valid Name")
}

/// A valid [`Name128`] built from `label`, same panic-on-invalid contract
/// as [`name`].
pub fn name128(label: &str) -> Name128 {
    Name128::new(label).expect("fixture label must already be a valid Name128")
}
