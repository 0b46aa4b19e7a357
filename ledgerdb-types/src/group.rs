use std::io::{Read, Write};

use ledgerdb_base::{Error, Kind, Result};
use ledgerdb_codec::{Decode, Encode};

use crate::address::Address;
use crate::name::Name;

/// Decode-time recursion guard, independent of the authority checker's own
/// `max_recursion_depth` (that one bounds *checking* a group, this one
/// bounds *parsing* one so a corrupt or adversarial record can't blow the
/// stack before the checker ever sees it).
const DECODE_MAX_DEPTH: u32 = 64;

/// A node in a group's weighted-threshold authorizer tree. A `Leaf` names
/// a single address and its weight; a `Branch` is satisfied once its
/// children's combined (recursively-satisfied) weight reaches `threshold`.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum GroupNode {
    Leaf { key: Address, weight: u32 },
    Branch { threshold: u32, weight: u32, nodes: Vec<GroupNode> },
}

impl GroupNode {
    pub fn is_leaf(&self) -> bool {
        matches!(self, GroupNode::Leaf { .. })
    }

    fn encode_inner<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        match self {
            GroupNode::Leaf { key, weight } => {
                w.write_all(&[0])?;
                key.encode(w)?;
                weight.encode(w)
            }
            GroupNode::Branch { threshold, weight, nodes } => {
                w.write_all(&[1])?;
                threshold.encode(w)?;
                weight.encode(w)?;
                nodes.len().encode(w)?;
                for n in nodes {
                    n.encode_inner(w)?;
                }
                Ok(())
            }
        }
    }

    fn decode_inner<R: Read>(r: &mut R, depth: u32) -> Result<Self> {
        if depth > DECODE_MAX_DEPTH {
            return Err(Error::kind(
                Kind::RecursionLimit,
                format!("group tree nesting exceeds {DECODE_MAX_DEPTH}"),
            ));
        }
        let mut tag = [0u8; 1];
        r.read_exact(&mut tag)
            .map_err(|_| Error::kind(Kind::DecodeTruncated, "truncated group node discriminant"))?;
        match tag[0] {
            0 => Ok(GroupNode::Leaf {
                key: Address::decode(r)?,
                weight: u32::decode(r)?,
            }),
            1 => {
                let threshold = u32::decode(r)?;
                let weight = u32::decode(r)?;
                let len = usize::decode(r)?;
                let mut nodes = Vec::with_capacity(len.min(4096));
                for _ in 0..len {
                    nodes.push(GroupNode::decode_inner(r, depth + 1)?);
                }
                Ok(GroupNode::Branch { threshold, weight, nodes })
            }
            other => Err(Error::kind(
                Kind::DecodeBadDiscriminant,
                format!("{other} is not a valid group node discriminant"),
            )),
        }
    }
}

impl Encode for GroupNode {
    fn encode<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        self.encode_inner(w)
    }
}
impl Decode for GroupNode {
    fn decode<R: Read>(r: &mut R) -> Result<Self> {
        GroupNode::decode_inner(r, 0)
    }
}

/// A named authorizer group: a weighted-threshold tree rooted at `root`,
/// itself governed by `key` (either a single updating key, or the
/// reserved address meaning the group can only be updated by its own
/// current structure per the authority checker's `newgroup`/`updategroup`
/// rules).
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Group {
    pub name: Name,
    pub key: Address,
    pub root: GroupNode,
}

ledgerdb_codec::codec_struct!(Group { name: Name, key: Address, root: GroupNode });
