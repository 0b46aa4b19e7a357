use crate::address::Address;
use crate::meta::Meta;
use crate::permission::Permission;
use crate::symbol::{Asset, Symbol};

/// A fungible token type, keyed by its [`Symbol`]. Per the expanded
/// permission shape, every `Fungible` carries all three of `issue`,
/// `transfer`, `manage` uniformly regardless of which action version
/// created it (see the Open Question resolution on `newfungible`'s two
/// historical shapes).
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Fungible {
    pub sym: Symbol,
    pub creator: Address,
    pub create_time: i64,
    pub issue: Permission,
    pub transfer: Permission,
    pub manage: Permission,
    pub total_supply: Asset,
    pub current_supply: Asset,
    pub metas: Vec<Meta>,
}
ledgerdb_codec::codec_struct!(Fungible {
    sym: Symbol,
    creator: Address,
    create_time: i64,
    issue: Permission,
    transfer: Permission,
    manage: Permission,
    total_supply: Asset,
    current_supply: Asset,
    metas: Vec<Meta>,
});
