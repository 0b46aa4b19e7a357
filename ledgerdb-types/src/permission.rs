use std::io::{Read, Write};

use ledgerdb_base::{Error, Kind, Result};
use ledgerdb_codec::{Decode, Encode};

use crate::address::Address;
use crate::name::Name;

/// Who a single authorizer slot in a [`Permission`] refers to.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum AuthorizerRef {
    /// A specific address (usually a public key).
    Account(Address),
    /// Every current owner of the token/fungible being acted on must each
    /// independently satisfy their share (see the authority checker's
    /// `owner_t` handling).
    Owner,
    /// Delegate to a named group's weighted-threshold tree.
    Group(Name),
    /// Delegate to a named script (see `ledgerdb-types::Script`).
    Script(Name),
}

impl Encode for AuthorizerRef {
    fn encode<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        match self {
            AuthorizerRef::Account(addr) => {
                w.write_all(&[0])?;
                addr.encode(w)
            }
            AuthorizerRef::Owner => w.write_all(&[1]),
            AuthorizerRef::Group(name) => {
                w.write_all(&[2])?;
                name.encode(w)
            }
            AuthorizerRef::Script(name) => {
                w.write_all(&[3])?;
                name.encode(w)
            }
        }
    }
}
impl Decode for AuthorizerRef {
    fn decode<R: Read>(r: &mut R) -> Result<Self> {
        let mut tag = [0u8; 1];
        r.read_exact(&mut tag)
            .map_err(|_| Error::kind(Kind::DecodeTruncated, "truncated authorizer ref discriminant"))?;
        match tag[0] {
            0 => Ok(AuthorizerRef::Account(Address::decode(r)?)),
            1 => Ok(AuthorizerRef::Owner),
            2 => Ok(AuthorizerRef::Group(Name::decode(r)?)),
            3 => Ok(AuthorizerRef::Script(Name::decode(r)?)),
            other => Err(Error::kind(
                Kind::DecodeBadDiscriminant,
                format!("{other} is not a valid authorizer ref discriminant"),
            )),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct AuthorizerWeight {
    pub authorizer: AuthorizerRef,
    pub weight: u32,
}
ledgerdb_codec::codec_struct!(AuthorizerWeight { authorizer: AuthorizerRef, weight: u32 });

/// A weighted-threshold requirement: satisfied once the sum of satisfied
/// authorizers' weights reaches `threshold`.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Permission {
    pub name: Name,
    pub threshold: u32,
    pub authorizers: Vec<AuthorizerWeight>,
}
ledgerdb_codec::codec_struct!(Permission {
    name: Name,
    threshold: u32,
    authorizers: Vec<AuthorizerWeight>,
});

impl Permission {
    pub fn single_key(name: Name, addr: Address) -> Self {
        Permission {
            name,
            threshold: 1,
            authorizers: vec![AuthorizerWeight {
                authorizer: AuthorizerRef::Account(addr),
                weight: 1,
            }],
        }
    }
}

/// Which of a domain/fungible's three permission slots an action checks.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum PermissionKind {
    Issue,
    Transfer,
    Manage,
}
ledgerdb_codec::codec_enum!(PermissionKind { Issue = 0, Transfer = 1, Manage = 2 });
