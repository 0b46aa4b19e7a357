//! `newsuspend`, `aprvsuspend`, `cancelsuspend`, `execsuspend`.
//!
//! Only `newsuspend`/`aprvsuspend`/`cancelsuspend` and the precondition and
//! status-transition half of `execsuspend` live here. Replaying a suspended
//! transaction's inner actions needs both this crate and the authority
//! checker at once, so that part of `execsuspend` belongs to the
//! transaction pipeline, which calls `exec_suspend_mark` below once the
//! replay itself has succeeded or failed.

use ledgerdb_base::{Error, Kind, Result};
use ledgerdb_cache::Handle;
use ledgerdb_store::{PutOp, TokenKey, TokenType};
use ledgerdb_types::{AprvSuspend, CancelSuspend, ExecSuspend, NewSuspend, Suspend, SuspendStatus};

use crate::HandlerContext;

fn suspend_key(name: &str) -> TokenKey {
    TokenKey::unprefixed(TokenType::Suspend, name)
}

pub fn new_suspend(ctx: &mut HandlerContext, a: &NewSuspend) -> Result<()> {
    let key = suspend_key(a.name.as_str());
    if ctx.db.exists_token(&key)? {
        return Err(Error::kind(Kind::SuspendDuplicate, format!("suspend {:?} already exists", a.name.as_str())));
    }
    let suspend = Suspend {
        name: a.name.clone(),
        proposer: a.proposer.clone(),
        status: SuspendStatus::Proposed,
        packed_trx: a.packed_trx.clone(),
        signed_keys: Vec::new(),
    };
    let handle: Handle<Suspend> = std::rc::Rc::new(std::cell::RefCell::new(suspend));
    ctx.cache.put_token(ctx.db, &key, PutOp::Add, handle)
}

pub fn aprv_suspend(ctx: &mut HandlerContext, a: &AprvSuspend) -> Result<()> {
    let key = suspend_key(a.name.as_str());
    let handle: Handle<Suspend> = ctx.cache.read_token(ctx.db, &key)?;
    {
        let mut s = handle.borrow_mut();
        require_proposed(&s)?;
        for sig in &a.signatures {
            let recovered = sig.recover();
            if !s.signed_keys.contains(&recovered) {
                s.signed_keys.push(recovered);
            }
        }
    }
    ctx.cache.put_token(ctx.db, &key, PutOp::Update, handle)
}

pub fn cancel_suspend(ctx: &mut HandlerContext, a: &CancelSuspend) -> Result<()> {
    let key = suspend_key(a.name.as_str());
    let handle: Handle<Suspend> = ctx.cache.read_token(ctx.db, &key)?;
    {
        let mut s = handle.borrow_mut();
        require_proposed(&s)?;
        s.status = SuspendStatus::Cancelled;
    }
    ctx.cache.put_token(ctx.db, &key, PutOp::Update, handle)
}

/// Dispatch entry point for a standalone `execsuspend` action. The
/// transaction pipeline is expected to have already replayed the packed
/// transaction's inner actions through the execution context and authority
/// checker by the time this runs; reaching this handler at all means that
/// replay succeeded, so it always marks `Executed`. A pipeline that wants
/// to record a failed replay calls [`exec_suspend_mark`] directly instead
/// of going through dispatch.
pub fn exec_suspend(ctx: &mut HandlerContext, a: &ExecSuspend) -> Result<()> {
    exec_suspend_mark(ctx, &a.name, true)
}

/// Finalizes a suspend's status once the transaction pipeline has (or has
/// not) successfully replayed its packed transaction.
pub fn exec_suspend_mark(ctx: &mut HandlerContext, name: &ledgerdb_types::Name, succeeded: bool) -> Result<()> {
    let key = suspend_key(name.as_str());
    let handle: Handle<Suspend> = ctx.cache.read_token(ctx.db, &key)?;
    {
        let mut s = handle.borrow_mut();
        require_proposed(&s)?;
        s.status = if succeeded { SuspendStatus::Executed } else { SuspendStatus::Failed };
    }
    ctx.cache.put_token(ctx.db, &key, PutOp::Update, handle)
}

fn require_proposed(s: &Suspend) -> Result<()> {
    if s.status != SuspendStatus::Proposed {
        return Err(Error::kind(Kind::SuspendStatusInvalid, format!("suspend {:?} is not in Proposed status", s.name.as_str())));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerdb_cache::TdbCache;
    use ledgerdb_store::TokenDatabase;
    use ledgerdb_types::{Address, Name, PublicKey, Signature};
    use test_log::test;

    fn env() -> crate::ExecEnv {
        crate::ExecEnv {
            head_block_time: 1000,
            root_org_group: Name::new("rootgroup").unwrap(),
            jmzk_sym_id: 1,
            pjmzk_sym_id: 2,
            loadtest_mode: false,
            jmzk_link_expired_secs: 60,
            unstake_pending_days: 3,
        }
    }

    #[test]
    fn cancel_then_approve_is_rejected() {
        let mut db = TokenDatabase::open_in_memory().unwrap();
        let mut cache = TdbCache::new();
        let env = env();
        let mut generated = Vec::new();
        let mut hctx =
            HandlerContext { db: &mut db, cache: &mut cache, env: &env, generated: &mut generated, link_keys: &[] };
        let name = Name::new("proposal1").unwrap();
        new_suspend(&mut hctx, &NewSuspend { name: name.clone(), proposer: Address::Reserved, packed_trx: vec![1] })
            .unwrap();
        cancel_suspend(&mut hctx, &CancelSuspend { name: name.clone() }).unwrap();
        let err = aprv_suspend(
            &mut hctx,
            &AprvSuspend { name, signatures: vec![Signature { recovers_to: PublicKey::from_bytes([1; 33]), nonce: 0 }] },
        )
        .unwrap_err();
        assert_eq!(err.find_kind(), Some(Kind::SuspendStatusInvalid));
    }

    #[test]
    fn exec_mark_sets_executed_on_success() {
        let mut db = TokenDatabase::open_in_memory().unwrap();
        let mut cache = TdbCache::new();
        let env = env();
        let mut generated = Vec::new();
        let mut hctx =
            HandlerContext { db: &mut db, cache: &mut cache, env: &env, generated: &mut generated, link_keys: &[] };
        let name = Name::new("proposal1").unwrap();
        new_suspend(&mut hctx, &NewSuspend { name: name.clone(), proposer: Address::Reserved, packed_trx: vec![1] })
            .unwrap();
        exec_suspend_mark(&mut hctx, &name, true).unwrap();
        let key = suspend_key(name.as_str());
        let handle: Handle<Suspend> = hctx.cache.read_token(hctx.db, &key).unwrap();
        assert_eq!(handle.borrow().status, SuspendStatus::Executed);
    }
}
