//! `prodvote`, `updsched`.

use ledgerdb_base::{Error, Kind, Result};
use ledgerdb_cache::Handle;
use ledgerdb_store::{PutOp, TokenKey, TokenType};
use ledgerdb_types::{ProdVote, ProdVoteRecord, Schedule, UpdSched};

use crate::HandlerContext;

const SCHEDULE_KEY: &str = "active";

fn prodvote_key(name: &str) -> TokenKey {
    TokenKey::unprefixed(TokenType::ProdVote, name)
}

fn schedule_key() -> TokenKey {
    TokenKey::unprefixed(TokenType::Schedule, SCHEDULE_KEY)
}

/// Casts `producer`'s vote for the configuration field `key`. `current`
/// quorum resolution (replacing the chain configuration field once
/// two-thirds of the active schedule has voted) happens one layer up, in
/// `ledgerdb-admin`, which owns `ChainConfig` and can read the resulting
/// [`ProdVoteRecord::median`] once the active schedule is known; this
/// handler's job is only to persist the vote itself.
pub fn prod_vote(ctx: &mut HandlerContext, a: &ProdVote) -> Result<()> {
    if a.value <= 0 || a.value >= 1_000_000 {
        return Err(Error::kind(Kind::ProdvoteValueInvalid, "prodvote value must fall in (0, 1_000_000)"));
    }
    let schedule = read_schedule(ctx)?;
    if !schedule.producers.contains(&a.producer) {
        return Err(Error::kind(Kind::ProdvoteProducerInvalid, "voter is not in the active producer schedule"));
    }
    let key = prodvote_key(&a.key);
    let handle: Handle<ProdVoteRecord> = match ctx.cache.read_token_opt(ctx.db, &key)? {
        Some(h) => h,
        None => std::rc::Rc::new(std::cell::RefCell::new(ProdVoteRecord::new(&a.key))),
    };
    let existed = ctx.db.exists_token(&key)?;
    handle.borrow_mut().cast(a.producer.clone(), a.value);
    let op = if existed { PutOp::Update } else { PutOp::Add };
    ctx.cache.put_token(ctx.db, &key, op, handle)
}

pub fn upd_sched(ctx: &mut HandlerContext, a: &UpdSched) -> Result<()> {
    if a.producers.is_empty() {
        return Err(Error::kind(Kind::ProdvoteProducerInvalid, "updsched requires a non-empty producer list"));
    }
    let key = schedule_key();
    let schedule = Schedule { producers: a.producers.clone() };
    let handle: Handle<Schedule> = std::rc::Rc::new(std::cell::RefCell::new(schedule));
    let op = if ctx.db.exists_token(&key)? { PutOp::Update } else { PutOp::Add };
    ctx.cache.put_token(ctx.db, &key, op, handle)
}

fn read_schedule(ctx: &mut HandlerContext) -> Result<Schedule> {
    let key = schedule_key();
    match ctx.cache.read_token_opt::<Schedule>(ctx.db, &key)? {
        Some(h) => Ok(h.borrow().clone()),
        None => Ok(Schedule { producers: Vec::new() }),
    }
}
