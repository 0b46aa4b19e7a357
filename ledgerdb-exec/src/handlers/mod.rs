//! One module per family of [`ledgerdb_types::ActionData`] variants, plus
//! the structural-validation and balance helpers several families share.

pub mod bonus;
pub mod charge;
pub mod domain;
pub mod fungible;
pub mod group;
pub mod link;
pub mod lock;
pub mod meta;
pub mod prodvote;
pub mod script;
pub mod staking;
pub mod suspend;
pub mod token;

use ledgerdb_base::{Error, Kind, Result};
use ledgerdb_cache::Handle;
use ledgerdb_store::{AssetKey, TokenKey, TokenType};
use ledgerdb_types::{Address, Asset, AuthorizerRef, GroupNode, Permission, Symbol};

use crate::HandlerContext;

/// A threshold-weighted authority slot is structurally sound when it has
/// at least one authorizer, every weight is positive, no authorizer is
/// named twice, and the combined weight of all authorizers can actually
/// reach the threshold. This is a syntactic check only — whether a
/// *particular* signer set satisfies the slot is the authority checker's
/// job, not this crate's.
pub(crate) fn validate_permission(p: &Permission) -> Result<()> {
    if p.threshold == 0 {
        return Err(Error::kind(Kind::InvalidGroupStructure, "permission threshold must be positive"));
    }
    if p.authorizers.is_empty() {
        return Err(Error::kind(Kind::InvalidGroupStructure, "permission has no authorizers"));
    }
    let total: u64 = p.authorizers.iter().map(|a| a.weight as u64).sum();
    if p.authorizers.iter().any(|a| a.weight == 0) {
        return Err(Error::kind(Kind::InvalidGroupStructure, "authorizer weight must be positive"));
    }
    if total < p.threshold as u64 {
        return Err(Error::kind(
            Kind::InvalidGroupStructure,
            "authorizer weights cannot reach the permission's threshold",
        ));
    }
    let mut seen: Vec<&AuthorizerRef> = Vec::with_capacity(p.authorizers.len());
    for aw in &p.authorizers {
        if seen.contains(&&aw.authorizer) {
            return Err(Error::kind(Kind::InvalidGroupStructure, "permission names the same authorizer twice"));
        }
        seen.push(&aw.authorizer);
    }
    Ok(())
}

/// Domain/fungible permission slots follow a fixed three-slot shape:
/// the slot's own name must match which slot it is (`issue`/`transfer`/
/// `manage`), any group it delegates to must actually exist, and the
/// `owner_t` authorizer — "every current owner of the token/fungible
/// being acted on" — only makes sense for the transfer slot.
pub(crate) fn validate_permission_slot(
    ctx: &mut HandlerContext,
    p: &Permission,
    expected_name: &str,
    allow_owner: bool,
) -> Result<()> {
    validate_permission(p)?;
    if p.name.as_str() != expected_name {
        return Err(Error::kind(
            Kind::InvalidGroupStructure,
            format!("permission slot must be named {expected_name:?}, got {:?}", p.name.as_str()),
        ));
    }
    for aw in &p.authorizers {
        match &aw.authorizer {
            AuthorizerRef::Owner if !allow_owner => {
                return Err(Error::kind(
                    Kind::InvalidGroupStructure,
                    "owner authorizer is only allowed in the transfer permission",
                ));
            }
            AuthorizerRef::Group(name) => {
                let key = TokenKey::unprefixed(TokenType::Group, name.as_str());
                if !ctx.db.exists_token(&key)? {
                    return Err(Error::kind(Kind::UnknownGroup, format!("group {:?} does not exist", name.as_str())));
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// Maximum nesting depth a group's authorizer tree may reach; the root
/// node is depth 1. A group any deeper than this is rejected outright
/// rather than merely bounding decode (see `DECODE_MAX_DEPTH` in
/// `ledgerdb-types`, which guards parsing and is set far looser).
const GROUP_MAX_DEPTH: u32 = 5;

/// Same structural soundness check as [`validate_permission`], applied
/// recursively to a group's node tree: every branch threshold is
/// reachable by its children's weights, the tree never exceeds
/// [`GROUP_MAX_DEPTH`], and no leaf key is duplicated within one
/// branch's subtree — the authority checker marks a key used the first
/// time it sees a matching signature, but never refuses to mark it
/// again, so a key repeated under the same branch would let one
/// signature count its weight twice toward that branch's threshold.
pub(crate) fn validate_group_node(node: &GroupNode) -> Result<()> {
    validate_group_depth(node, 1)?;
    collect_leaf_keys(node)?;
    Ok(())
}

fn validate_group_depth(node: &GroupNode, depth: u32) -> Result<()> {
    if depth > GROUP_MAX_DEPTH {
        return Err(Error::kind(
            Kind::InvalidGroupStructure,
            format!("group tree depth exceeds {GROUP_MAX_DEPTH}"),
        ));
    }
    match node {
        GroupNode::Leaf { weight, .. } => {
            if *weight == 0 {
                return Err(Error::kind(Kind::InvalidGroupStructure, "leaf weight must be positive"));
            }
            Ok(())
        }
        GroupNode::Branch { threshold, weight, nodes } => {
            if *threshold == 0 {
                return Err(Error::kind(Kind::InvalidGroupStructure, "branch threshold must be positive"));
            }
            if *weight == 0 {
                return Err(Error::kind(Kind::InvalidGroupStructure, "branch weight must be positive"));
            }
            if nodes.is_empty() {
                return Err(Error::kind(Kind::InvalidGroupStructure, "branch has no children"));
            }
            let total: u64 = nodes
                .iter()
                .map(|n| match n {
                    GroupNode::Leaf { weight, .. } => *weight as u64,
                    GroupNode::Branch { weight, .. } => *weight as u64,
                })
                .sum();
            if total < *threshold as u64 {
                return Err(Error::kind(
                    Kind::InvalidGroupStructure,
                    "branch children cannot reach its threshold",
                ));
            }
            for n in nodes {
                validate_group_depth(n, depth + 1)?;
            }
            Ok(())
        }
    }
}

/// Returns every leaf key in `node`'s subtree, failing if the same key
/// appears more than once anywhere under a single branch.
fn collect_leaf_keys(node: &GroupNode) -> Result<Vec<&Address>> {
    match node {
        GroupNode::Leaf { key, .. } => Ok(vec![key]),
        GroupNode::Branch { nodes, .. } => {
            let mut all: Vec<&Address> = Vec::new();
            for n in nodes {
                for key in collect_leaf_keys(n)? {
                    if all.contains(&key) {
                        return Err(Error::kind(
                            Kind::InvalidGroupStructure,
                            "the same key appears twice within one branch of the group tree",
                        ));
                    }
                    all.push(key);
                }
            }
            Ok(all)
        }
    }
}

/// Parses a fungible symbol id out of an action key or address field, the
/// way `IssueFungible`/`TransferFt`/etc. address a fungible by the decimal
/// string an outer layer put in `action.key`.
pub(crate) fn parse_sym_id(s: &str) -> Result<u32> {
    s.parse::<u32>().map_err(|_| Error::kind(Kind::FungibleSymbolInvalid, format!("{s:?} is not a symbol id")))
}

pub(crate) fn fungible_key(sym_id: u32) -> TokenKey {
    TokenKey::unprefixed(TokenType::Fungible, &sym_id.to_string())
}

/// Reads an address's balance of `sym`, treating a missing entry as zero
/// (every address implicitly holds zero of every fungible until credited).
pub(crate) fn read_balance(ctx: &mut HandlerContext, address: &Address, sym: Symbol) -> Result<Asset> {
    let key = AssetKey::new(address.clone(), sym.id);
    match ctx.cache.read_asset::<i64>(ctx.db, &key)? {
        Some(handle) => Ok(Asset::new(*handle.borrow(), sym)),
        None => Ok(Asset::zero(sym)),
    }
}

pub(crate) fn write_balance(ctx: &mut HandlerContext, address: &Address, asset: Asset) -> Result<()> {
    let key = AssetKey::new(address.clone(), asset.sym.id);
    let handle: Handle<i64> = std::rc::Rc::new(std::cell::RefCell::new(asset.amount));
    ctx.cache.put_asset(ctx.db, &key, handle)
}

pub(crate) fn debit(ctx: &mut HandlerContext, address: &Address, amount: Asset) -> Result<()> {
    let balance = read_balance(ctx, address, amount.sym)?;
    let after = balance
        .checked_sub(&amount)
        .map_err(|_| Error::kind(Kind::InsufficientBalance, "balance underflow"))?;
    if after.is_negative() {
        return Err(Error::kind(Kind::InsufficientBalance, "insufficient balance"));
    }
    write_balance(ctx, address, after)
}

pub(crate) fn credit(ctx: &mut HandlerContext, address: &Address, amount: Asset) -> Result<()> {
    let balance = read_balance(ctx, address, amount.sym)?;
    let after = balance.checked_add(&amount)?;
    write_balance(ctx, address, after)
}
