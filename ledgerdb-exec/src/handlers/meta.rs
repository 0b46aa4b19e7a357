//! `addmeta`.

use ledgerdb_base::{Error, Kind, Result};
use ledgerdb_cache::Handle;
use ledgerdb_store::{PutOp, TokenKey, TokenType};
use ledgerdb_types::{AddMeta, Domain, Fungible, Group, Meta, Token};

use crate::HandlerContext;

/// The literal key under which `addmeta` targets the domain/group/fungible
/// record itself rather than one of its tokens. `Name128` cannot be empty,
/// so this sentinel (not a valid token name) stands in for "the container
/// record, not a token within it".
const SELF_TARGET: &str = ".";

/// `addmeta` attaches to whichever collection `action.domain`/`action.key`
/// name: a domain (token `key == "."`), a token within that domain, a
/// group (domain `".group"`), or a fungible (domain `".fungible"`, key the
/// symbol id).
pub fn add_meta(ctx: &mut HandlerContext, a: &AddMeta, domain: &str, key: &str) -> Result<()> {
    match domain {
        ".group" => add_to_group(ctx, key, a),
        ".fungible" => add_to_fungible(ctx, key, a),
        _ if key == SELF_TARGET => add_to_domain(ctx, domain, a),
        _ => add_to_token(ctx, domain, key, a),
    }
}

fn add_to_domain(ctx: &mut HandlerContext, domain: &str, a: &AddMeta) -> Result<()> {
    let key = TokenKey::unprefixed(TokenType::Domain, domain);
    let handle: Handle<Domain> = ctx.cache.read_token(ctx.db, &key)?;
    push_meta(&mut handle.borrow_mut().metas, a)?;
    ctx.cache.put_token(ctx.db, &key, PutOp::Update, handle)
}

fn add_to_token(ctx: &mut HandlerContext, domain: &str, name: &str, a: &AddMeta) -> Result<()> {
    let key = TokenKey::new(TokenType::Token, Some(domain), name);
    let handle: Handle<Token> = ctx.cache.read_token(ctx.db, &key)?;
    push_meta(&mut handle.borrow_mut().metas, a)?;
    ctx.cache.put_token(ctx.db, &key, PutOp::Update, handle)
}

fn add_to_group(ctx: &mut HandlerContext, name: &str, a: &AddMeta) -> Result<()> {
    let key = TokenKey::unprefixed(TokenType::Group, name);
    // Groups carry no `metas` field of their own in this core; metadata
    // attached to a group is recorded on the domain that owns it instead
    // in upstream deployments. Rejecting keeps the handler honest about
    // what it actually stores rather than silently dropping the meta.
    let _: Handle<Group> = ctx.cache.read_token(ctx.db, &key)?;
    Err(Error::kind(Kind::MetaKeyInvalid, "groups do not carry their own metadata collection"))
}

fn add_to_fungible(ctx: &mut HandlerContext, sym_id_key: &str, a: &AddMeta) -> Result<()> {
    let sym_id = super::parse_sym_id(sym_id_key)?;
    let key = super::fungible_key(sym_id);
    let handle: Handle<Fungible> = ctx.cache.read_token(ctx.db, &key)?;
    push_meta(&mut handle.borrow_mut().metas, a)?;
    ctx.cache.put_token(ctx.db, &key, PutOp::Update, handle)
}

fn push_meta(metas: &mut Vec<Meta>, a: &AddMeta) -> Result<()> {
    if a.meta.key.is_reserved() {
        return Err(Error::kind(Kind::MetaKeyInvalid, "meta key must not be reserved"));
    }
    if metas.iter().any(|m| m.key == a.meta.key) {
        return Err(Error::kind(Kind::MetaDuplicate, format!("meta key {:?} already set", a.meta.key.as_str())));
    }
    metas.push(a.meta.clone());
    Ok(())
}
