use proptest::prelude::*;

use ledgerdb_types::{Name, PublicKey};

/// Every byte pattern is a valid [`PublicKey`] (see its doc comment: no
/// real curve arithmetic is enforced), so this is just `any::<[u8; 33]>()`
/// wrapped in the constructor.
pub fn public_key() -> impl Strategy<Value = PublicKey> {
    any::<[u8; 33]>().prop_map(PublicKey::from_bytes)
}

/// Valid [`Name`] labels: 1-21 lowercase ASCII letters/digits/`.`/`-`,
/// matching `ledgerdb_types::name::validate_label`'s charset exactly so
/// every generated string constructs successfully.
pub fn name() -> impl Strategy<Value = Name> {
    "[a-z0-9.-]{1,21}".prop_map(|s| Name::new(s).expect("strategy charset matches Name's validation"))
}
