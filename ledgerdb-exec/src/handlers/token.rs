//! `issuetoken`, `transfer`, `destroytoken`.

use ledgerdb_base::{Error, Kind, Result};
use ledgerdb_cache::Handle;
use ledgerdb_store::{PutOp, TokenKey, TokenType};
use ledgerdb_types::{DestroyToken, IssueToken, Token, TokenStatus, Transfer};
use tracing::debug;

use crate::HandlerContext;

fn token_key(domain: &str, name: &str) -> TokenKey {
    TokenKey::new(TokenType::Token, Some(domain), name)
}

pub fn issue_token(ctx: &mut HandlerContext, a: &IssueToken) -> Result<()> {
    if a.owner.is_empty() {
        return Err(Error::kind(Kind::TokenOwnerEmpty, "issuetoken requires at least one owner"));
    }
    if a.owner.iter().any(|o| o.as_public_key().is_none()) {
        return Err(Error::kind(Kind::TokenOwnerInvalid, "every token owner must be a public key address"));
    }
    if a.names.is_empty() {
        return Err(Error::kind(Kind::TokenNameInvalid, "issuetoken requires at least one token name"));
    }
    for name in &a.names {
        if name.is_reserved() {
            return Err(Error::kind(Kind::TokenNameInvalid, "token name must not be reserved"));
        }
        let key = token_key(a.domain.as_str(), name.as_str());
        if ctx.db.exists_token(&key)? {
            return Err(Error::kind(Kind::TokenDuplicate, format!("token {:?} already exists", name.as_str())));
        }
        let token = Token {
            domain: a.domain.clone(),
            name: name.clone(),
            owner: a.owner.clone(),
            status: TokenStatus::Normal,
            metas: Vec::new(),
        };
        debug!(domain = a.domain.as_str(), token = name.as_str(), "issued token");
        let handle: Handle<Token> = std::rc::Rc::new(std::cell::RefCell::new(token));
        ctx.cache.put_token(ctx.db, &key, PutOp::Add, handle)?;
    }
    Ok(())
}

pub fn transfer(ctx: &mut HandlerContext, a: &Transfer) -> Result<()> {
    if a.to.is_empty() {
        return Err(Error::kind(Kind::TokenOwnerEmpty, "transfer requires at least one recipient"));
    }
    let key = token_key(a.domain.as_str(), a.name.as_str());
    let handle: Handle<Token> = ctx.cache.read_token(ctx.db, &key)?;
    {
        let mut token = handle.borrow_mut();
        if token.is_destroyed() {
            return Err(Error::kind(Kind::TokenDestroyed, "cannot transfer a destroyed token"));
        }
        token.owner = a.to.clone();
    }
    ctx.cache.put_token(ctx.db, &key, PutOp::Update, handle)
}

pub fn destroy_token(ctx: &mut HandlerContext, a: &DestroyToken) -> Result<()> {
    let key = token_key(a.domain.as_str(), a.name.as_str());
    let handle: Handle<Token> = ctx.cache.read_token(ctx.db, &key)?;
    {
        let mut token = handle.borrow_mut();
        if token.is_destroyed() {
            return Err(Error::kind(Kind::TokenDestroyed, "token is already destroyed"));
        }
        token.status = TokenStatus::Destroyed;
    }
    ctx.cache.put_token(ctx.db, &key, PutOp::Update, handle)
}
