//! The signed transaction envelope: a reference block (for the controller's
//! "still on the chain I signed against" check), an expiration, the payer
//! and charge ceiling, and the ordered action list.

use ledgerdb_types::{Action, Address, Signature};

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Transaction {
    pub ref_block_num: u16,
    pub ref_block_prefix: u32,
    pub expiration: i64,
    pub max_charge: u64,
    pub payer: Address,
    pub actions: Vec<Action>,
}
ledgerdb_codec::codec_struct!(Transaction {
    ref_block_num: u16,
    ref_block_prefix: u32,
    expiration: i64,
    max_charge: u64,
    payer: Address,
    actions: Vec<Action>,
});

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct SignedTransaction {
    pub trx: Transaction,
    pub signatures: Vec<Signature>,
}
ledgerdb_codec::codec_struct!(SignedTransaction {
    trx: Transaction,
    signatures: Vec<Signature>,
});
