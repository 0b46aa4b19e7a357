use ledgerdb_codec::Encode;
use ledgerdb_types::Address;

/// The record families the token database stores, each its own
/// namespace within the `(type, prefix?, key)` key space.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum TokenType {
    Domain,
    Token,
    Group,
    Fungible,
    Suspend,
    Lock,
    Validator,
    StakePool,
    Script,
    BlackAddr,
    LinkId,
    Bonus,
    ProdVote,
    Schedule,
}

impl TokenType {
    fn tag(self) -> u8 {
        match self {
            TokenType::Domain => 0,
            TokenType::Token => 1,
            TokenType::Group => 2,
            TokenType::Fungible => 3,
            TokenType::Suspend => 4,
            TokenType::Lock => 5,
            TokenType::Validator => 6,
            TokenType::StakePool => 7,
            TokenType::Script => 8,
            TokenType::BlackAddr => 9,
            TokenType::LinkId => 10,
            TokenType::Bonus => 11,
            TokenType::ProdVote => 12,
            TokenType::Schedule => 13,
        }
    }
}

/// A fully-qualified token database key: `prefix` scopes `key` within
/// `ty` (a domain name scoping a token instance name, for example); most
/// record types leave it `None` and are keyed on `key` alone.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TokenKey {
    pub ty: TokenType,
    pub prefix: Option<String>,
    pub key: String,
}

impl TokenKey {
    pub fn new(ty: TokenType, prefix: Option<&str>, key: &str) -> Self {
        TokenKey { ty, prefix: prefix.map(str::to_owned), key: key.to_owned() }
    }

    pub fn unprefixed(ty: TokenType, key: &str) -> Self {
        Self::new(ty, None, key)
    }

    /// Canonical byte encoding used both as the `redb` key and as the
    /// overlay map's key, so a prefix change never collides with an
    /// unrelated key that happens to share a byte boundary.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.push(self.ty.tag());
        self.prefix.clone().unwrap_or_default().encode(&mut buf).expect("encode to Vec cannot fail");
        self.key.encode(&mut buf).expect("encode to Vec cannot fail");
        buf
    }
}

/// The `(address, symbol id)` balance key for the fungible asset map,
/// kept separate from [`TokenKey`] since assets are looked up by owner
/// address rather than by name.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct AssetKey {
    pub address: Address,
    pub sym_id: u32,
}

impl AssetKey {
    pub fn new(address: Address, sym_id: u32) -> Self {
        AssetKey { address, sym_id }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.address.encode(&mut buf).expect("encode to Vec cannot fail");
        self.sym_id.encode(&mut buf).expect("encode to Vec cannot fail");
        buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn distinct_keys_have_distinct_bytes() {
        let a = TokenKey::new(TokenType::Token, Some("cars"), "car1");
        let b = TokenKey::new(TokenType::Token, Some("car"), "scar1");
        assert_ne!(a.to_bytes(), b.to_bytes());
    }

    #[test]
    fn same_key_has_stable_bytes() {
        let a = TokenKey::new(TokenType::Domain, None, "cars");
        let b = TokenKey::new(TokenType::Domain, None, "cars");
        assert_eq!(a.to_bytes(), b.to_bytes());
    }

    #[test]
    fn asset_key_distinguishes_symbol() {
        let a = AssetKey::new(Address::Reserved, 1);
        let b = AssetKey::new(Address::Reserved, 2);
        assert_ne!(a.to_bytes(), b.to_bytes());
    }
}
