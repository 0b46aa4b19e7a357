//! The block envelope the controller applies: a header identifying where
//! in the chain it sits, plus the ordered list of signed transactions it
//! carries. Block production, fork choice, and P2P delivery are out of
//! scope for this workspace (spec §3 non-goals) — this type only needs to
//! carry enough for `Controller::apply_block` and the snapshot format to
//! round-trip a block's identity.

use ledgerdb_txn::SignedTransaction;
use ledgerdb_types::Name;

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct BlockHeader {
    pub block_num: u16,
    pub block_prefix: u32,
    pub timestamp: i64,
    pub producer: Name,
}
ledgerdb_codec::codec_struct!(BlockHeader {
    block_num: u16,
    block_prefix: u32,
    timestamp: i64,
    producer: Name,
});

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<SignedTransaction>,
}
ledgerdb_codec::codec_struct!(Block {
    header: BlockHeader,
    transactions: Vec<SignedTransaction>,
});

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerdb_codec::{decode_from_slice, Encode};
    use test_log::test;

    #[test]
    fn block_header_roundtrip() {
        let header = BlockHeader {
            block_num: 1,
            block_prefix: 2,
            timestamp: 1000,
            producer: Name::new("producer1").unwrap(),
        };
        let bytes = header.encode_to_vec();
        let back: BlockHeader = decode_from_slice(&bytes).unwrap();
        assert_eq!(header, back);
    }

    #[test]
    fn empty_block_roundtrip() {
        let block = Block {
            header: BlockHeader {
                block_num: 1,
                block_prefix: 2,
                timestamp: 1000,
                producer: Name::new("producer1").unwrap(),
            },
            transactions: vec![],
        };
        let bytes = block.encode_to_vec();
        let back: Block = decode_from_slice(&bytes).unwrap();
        assert_eq!(block, back);
    }
}
