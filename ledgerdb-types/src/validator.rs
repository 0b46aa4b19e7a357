use crate::address::Address;
use crate::key::PublicKey;
use crate::name::Name;
use crate::permission::Permission;
use crate::symbol::Asset;

/// A staking validator: `signer` is the key that signs `recvstkbonus`,
/// `withdraw` is the permission checked by `valiwithdraw`.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Validator {
    pub name: Name,
    pub creator: Address,
    pub create_time: i64,
    pub signer: PublicKey,
    pub withdraw: Permission,
    pub commission_rate: u32,
    pub total_staked: Asset,
}
ledgerdb_codec::codec_struct!(Validator {
    name: Name,
    creator: Address,
    create_time: i64,
    signer: PublicKey,
    withdraw: Permission,
    commission_rate: u32,
    total_staked: Asset,
});
