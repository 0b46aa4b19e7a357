use crate::address::Address;
use crate::name::Name;

/// A registered script for the `script` authorizer kind. The body is
/// opaque bytes: this core records and looks scripts up, but does not
/// execute them (see the authority checker's `check_script_` flag and the
/// optimistic-accept path when it is disabled).
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Script {
    pub name: Name,
    pub content: Vec<u8>,
    pub creator: Address,
}
ledgerdb_codec::codec_struct!(Script { name: Name, content: Vec<u8>, creator: Address });
