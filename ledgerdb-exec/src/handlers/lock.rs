//! `newlock`, `aprvlock`, `tryunlock`.

use ledgerdb_base::{Error, Kind, Result};
use ledgerdb_cache::Handle;
use ledgerdb_store::{PutOp, TokenKey, TokenType};
use ledgerdb_types::{AprvLock, Lock, LockCondition, LockStatus, NewLock, TryUnlock};

use super::{credit, debit};
use crate::HandlerContext;

fn lock_key(name: &str) -> TokenKey {
    TokenKey::unprefixed(TokenType::Lock, name)
}

pub fn new_lock(ctx: &mut HandlerContext, a: &NewLock) -> Result<()> {
    let key = lock_key(a.name.as_str());
    if ctx.db.exists_token(&key)? {
        return Err(Error::kind(Kind::LockDuplicate, format!("lock {:?} already exists", a.name.as_str())));
    }
    if a.unlock_time >= a.deadline {
        return Err(Error::kind(Kind::LockUnlockTimeInvalid, "unlock_time must precede deadline"));
    }
    if a.succeed.is_empty() || a.failed.is_empty() {
        return Err(Error::kind(Kind::LockConditionInvalid, "lock requires both a succeed and a failed address set"));
    }
    for asset in &a.assets {
        debit(ctx, &a.proposer, *asset)?;
    }
    let lock = Lock {
        name: a.name.clone(),
        proposer: a.proposer.clone(),
        status: LockStatus::Proposed,
        unlock_time: a.unlock_time,
        deadline: a.deadline,
        assets: a.assets.clone(),
        condition: a.condition,
        succeed: a.succeed.clone(),
        failed: a.failed.clone(),
        approved_keys: Vec::new(),
    };
    let handle: Handle<Lock> = std::rc::Rc::new(std::cell::RefCell::new(lock));
    ctx.cache.put_token(ctx.db, &key, PutOp::Add, handle)
}

pub fn aprv_lock(ctx: &mut HandlerContext, a: &AprvLock) -> Result<()> {
    let key = lock_key(a.name.as_str());
    let handle: Handle<Lock> = ctx.cache.read_token(ctx.db, &key)?;
    {
        let mut lock = handle.borrow_mut();
        require_proposed(&lock)?;
        if !lock.approved_keys.contains(&a.approver) {
            lock.approved_keys.push(a.approver.clone());
        }
    }
    ctx.cache.put_token(ctx.db, &key, PutOp::Update, handle)
}

/// Attempts to resolve a lock: if `condition` is met (or the deadline has
/// passed), releases the escrowed assets to whichever side the outcome
/// favors. A no-op (not an error) when the condition simply isn't met yet
/// and the deadline hasn't passed.
pub fn try_unlock(ctx: &mut HandlerContext, a: &TryUnlock) -> Result<()> {
    let key = lock_key(a.name.as_str());
    let handle: Handle<Lock> = ctx.cache.read_token(ctx.db, &key)?;
    let outcome = {
        let lock = handle.borrow();
        require_proposed(&lock)?;
        resolve(&lock, ctx.env.head_block_time)
    };
    let Some(succeeded) = outcome else {
        return Ok(());
    };
    let (assets, recipients, new_status) = {
        let lock = handle.borrow();
        if succeeded {
            (lock.assets.clone(), lock.succeed.clone(), LockStatus::Succeed)
        } else {
            (lock.assets.clone(), lock.failed.clone(), LockStatus::Unlocked)
        }
    };
    for recipient in &recipients {
        for asset in &assets {
            credit(ctx, recipient, *asset)?;
        }
    }
    handle.borrow_mut().status = new_status;
    ctx.cache.put_token(ctx.db, &key, PutOp::Update, handle)
}

fn resolve(lock: &Lock, now: i64) -> Option<bool> {
    if now >= lock.deadline {
        return Some(false);
    }
    if now < lock.unlock_time {
        return None;
    }
    match lock.condition {
        LockCondition::TimeOnly => Some(true),
        LockCondition::AnyApprove => (!lock.approved_keys.is_empty()).then_some(true),
        LockCondition::AllApprove => {
            let required = lock.succeed.len().max(lock.failed.len());
            (lock.approved_keys.len() >= required).then_some(true)
        }
    }
}

fn require_proposed(lock: &Lock) -> Result<()> {
    if lock.status != LockStatus::Proposed {
        return Err(Error::kind(Kind::LockConditionInvalid, format!("lock {:?} is not Proposed", lock.name.as_str())));
    }
    Ok(())
}
