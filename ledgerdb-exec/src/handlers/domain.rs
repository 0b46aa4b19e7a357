//! `newdomain`, `updatedomain`, `blackaddr`.

use ledgerdb_base::{Error, Kind, Result};
use ledgerdb_cache::Handle;
use ledgerdb_store::{PutOp, TokenKey, TokenType};
use ledgerdb_types::{BlackAddr, Domain, NewDomain, UpdateDomain};
use tracing::debug;

use super::validate_permission_slot;
use crate::HandlerContext;

fn domain_key(name: &str) -> TokenKey {
    TokenKey::unprefixed(TokenType::Domain, name)
}

pub fn new_domain(ctx: &mut HandlerContext, a: &NewDomain) -> Result<()> {
    if a.name.is_reserved() {
        return Err(Error::kind(Kind::NameReserved, "domain name must not be reserved"));
    }
    validate_permission_slot(ctx, &a.issue, "issue", false)?;
    validate_permission_slot(ctx, &a.transfer, "transfer", true)?;
    validate_permission_slot(ctx, &a.manage, "manage", false)?;
    let key = domain_key(a.name.as_str());
    if ctx.db.exists_token(&key)? {
        return Err(Error::kind(Kind::DomainDuplicate, format!("domain {:?} already exists", a.name.as_str())));
    }
    let domain = Domain {
        name: a.name.clone(),
        creator: a.creator.clone(),
        create_time: ctx.env.head_block_time,
        issue: a.issue.clone(),
        transfer: a.transfer.clone(),
        manage: a.manage.clone(),
        metas: Vec::new(),
    };
    debug!(domain = a.name.as_str(), "created domain");
    let handle: Handle<Domain> = std::rc::Rc::new(std::cell::RefCell::new(domain));
    ctx.cache.put_token(ctx.db, &key, PutOp::Add, handle)
}

pub fn update_domain(ctx: &mut HandlerContext, a: &UpdateDomain) -> Result<()> {
    if let Some(p) = &a.issue {
        validate_permission_slot(ctx, p, "issue", false)?;
    }
    if let Some(p) = &a.transfer {
        validate_permission_slot(ctx, p, "transfer", true)?;
    }
    if let Some(p) = &a.manage {
        validate_permission_slot(ctx, p, "manage", false)?;
    }
    let key = domain_key(a.name.as_str());
    let handle: Handle<Domain> = ctx.cache.read_token(ctx.db, &key)?;
    {
        let mut domain = handle.borrow_mut();
        if let Some(p) = &a.issue {
            domain.issue = p.clone();
        }
        if let Some(p) = &a.transfer {
            domain.transfer = p.clone();
        }
        if let Some(p) = &a.manage {
            domain.manage = p.clone();
        }
    }
    ctx.cache.put_token(ctx.db, &key, PutOp::Update, handle)
}

/// `blackaddr` doesn't live in the domain/token namespace, but it shares
/// this module since it's governed by the root org group the same way
/// `updsched`/`newstakepool` are.
pub fn black_addr(ctx: &mut HandlerContext, a: &BlackAddr) -> Result<()> {
    let key = TokenKey::unprefixed(TokenType::BlackAddr, &addr_token_key(&a.addr));
    if a.block {
        debug!(reason = %a.reason, "blacklisting address");
        ctx.db.put_token(&key, vec![1], PutOp::Put)
    } else if ctx.db.exists_token(&key)? {
        ctx.db.put_token(&key, vec![0], PutOp::Put)
    } else {
        Ok(())
    }
}

/// Whether `addr` is currently blacklisted — consulted by the transfer
/// and fungible handlers before moving value to or from it.
pub fn is_blacklisted(ctx: &mut HandlerContext, addr: &ledgerdb_types::Address) -> Result<bool> {
    let key = TokenKey::unprefixed(TokenType::BlackAddr, &addr_token_key(addr));
    match ctx.db.read_token(&key) {
        Ok(bytes) => Ok(bytes.first() == Some(&1)),
        Err(e) if e.find_kind() == Some(Kind::UnknownKey) => Ok(false),
        Err(e) => Err(e),
    }
}

/// A stable string key for an address in the blacklist namespace. Public
/// keys are hex-encoded; every other address shape maps to a fixed
/// sentinel since blacklisting is only meaningful for a concrete key.
fn addr_token_key(addr: &ledgerdb_types::Address) -> String {
    match addr.as_public_key() {
        Some(pk) => pk.0.iter().map(|b| format!("{b:02x}")).collect(),
        None => "reserved".to_owned(),
    }
}
