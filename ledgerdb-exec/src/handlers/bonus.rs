//! `setpsvbonus`, `distpsvbonus`, and the passive-bonus split consulted by
//! `transferft`.

use ledgerdb_base::{Error, Kind, Result};
use ledgerdb_cache::Handle;
use ledgerdb_money::bonus::compute_bonus;
use ledgerdb_store::{PutOp, TokenKey, TokenType};
use ledgerdb_types::{
    Action, ActionData, Asset, DistPsvBonus, Fungible, Name, Name128, PassiveBonus, PassiveMethodKind, PayBonus,
    SetPsvBonus,
};

use super::credit;
use crate::HandlerContext;

fn bonus_key(sym_id: u32) -> TokenKey {
    TokenKey::unprefixed(TokenType::Bonus, &sym_id.to_string())
}

pub fn set_psv_bonus(ctx: &mut HandlerContext, a: &SetPsvBonus) -> Result<()> {
    if a.rate == 0 || a.rate >= 1_000_000 {
        return Err(Error::kind(Kind::BonusPercentInvalid, "passive bonus rate must fall in (0, 1_000_000)"));
    }
    let total_rate: u64 = a.rules.iter().map(|r| r.rate as u64).sum();
    if total_rate > 1_000_000 {
        return Err(Error::kind(Kind::BonusRulesInvalid, "distribution rule rates cannot sum above 1_000_000"));
    }
    let key = bonus_key(a.sym_id);
    let bonus = PassiveBonus {
        sym_id: a.sym_id,
        rate: a.rate,
        base_charge: a.base_charge,
        charge_threshold: a.charge_threshold,
        minimum_charge: a.minimum_charge,
        dist_threshold: a.dist_threshold,
        rules: a.rules.clone(),
        methods: a.methods.clone(),
        latest_dist_time: 0,
    };
    let handle: Handle<PassiveBonus> = std::rc::Rc::new(std::cell::RefCell::new(bonus));
    let op = if ctx.db.exists_token(&key)? { PutOp::Update } else { PutOp::Add };
    ctx.cache.put_token(ctx.db, &key, op, handle)
}

/// Distributes the accrued passive bonus pool (held at the fungible's own
/// balance under its reserved symbol id, the way accrual is recorded by
/// `apply_passive_bonus`) out to the configured `rules`, pro-rata to their
/// `rate`.
pub fn dist_psv_bonus(ctx: &mut HandlerContext, a: &DistPsvBonus) -> Result<()> {
    let key = bonus_key(a.sym_id);
    let handle: Handle<PassiveBonus> = ctx.cache.read_token(ctx.db, &key)?;
    {
        let b = handle.borrow();
        if ctx.env.head_block_time < b.latest_dist_time {
            return Err(Error::kind(Kind::BonusLatestNotExpired, "distribution is not yet due"));
        }
    }
    let pool_address = bonus_pool_address(a.sym_id);
    let sym = fungible_sym(ctx, a.sym_id)?;
    let pool = super::read_balance(ctx, &pool_address, sym)?;
    if pool.amount < handle.borrow().dist_threshold.amount {
        return Err(Error::kind(Kind::BonusNotFulfilled, "accrued pool is below the distribution threshold"));
    }
    let rules = handle.borrow().rules.clone();
    let mut remaining = pool;
    for rule in &rules {
        let share = Asset::new(pool.amount * rule.rate as i64 / 1_000_000, sym);
        remaining = remaining.checked_sub(&share)?;
        credit(ctx, &rule.receiver, share)?;
    }
    super::debit(ctx, &pool_address, pool.checked_sub(&remaining)?)?;
    handle.borrow_mut().latest_dist_time = a.deadline;
    ctx.cache.put_token(ctx.db, &key, PutOp::Update, handle)
}

/// The address a fungible's accrued passive-bonus pool is held at: a
/// generated address distinct from any real signer, namespaced by symbol
/// id so two fungibles never share a pool.
pub(crate) fn bonus_pool_address(sym_id: u32) -> ledgerdb_types::Address {
    ledgerdb_types::Address::Generated {
        prefix: ledgerdb_types::Name128::new("psvbonus").expect("literal name is valid"),
        key: ledgerdb_types::Name128::new(&sym_id.to_string()).expect("a u32 string fits Name128"),
        nonce: 0,
    }
}

fn fungible_sym(ctx: &mut HandlerContext, sym_id: u32) -> Result<ledgerdb_types::Symbol> {
    let handle: Handle<Fungible> = ctx.cache.read_token(ctx.db, &super::fungible_key(sym_id))?;
    let sym = handle.borrow().sym;
    Ok(sym)
}

/// What a transfer actually moves once a passive-bonus split is applied:
/// `debit_total` leaves the sender, `net_credit` reaches the recipient,
/// and `skim` accounts for the gap between them, credited to the pool by
/// the `paybonus` action this queues onto `ctx.generated`.
pub struct PassiveBonusSplit {
    pub debit_total: Asset,
    pub net_credit: Asset,
    pub skim: Asset,
}

/// Consulted by `transferft` on every transfer of a fungible that has a
/// passive-bonus configuration. Computes the bonus via [`compute_bonus`]
/// and splits it according to the method configured for `action`
/// (defaulting to `WithinAmount`): `WithinAmount` skims the bonus out of
/// the transferred amount, so the sender pays `amount` and the recipient
/// nets `amount - skim`; `OutsideAmount` charges the bonus on top, so the
/// sender pays `amount + skim` and the recipient nets the full `amount`.
/// A nonzero skim is never credited here directly — it is queued as a
/// `paybonus` action onto `ctx.generated`, which `pay_bonus` applies to
/// the pool once the caller's dispatch loop drains the queue.
pub fn apply_passive_bonus(
    ctx: &mut HandlerContext,
    sym_id: u32,
    action: &str,
    from: &ledgerdb_types::Address,
    amount: Asset,
) -> Result<PassiveBonusSplit> {
    let key = bonus_key(sym_id);
    let Some(handle) = ctx.cache.read_token_opt::<PassiveBonus>(ctx.db, &key)? else {
        return Ok(PassiveBonusSplit { debit_total: amount, net_credit: amount, skim: Asset::zero(amount.sym) });
    };
    let b = handle.borrow();
    let skim_amount = compute_bonus(b.rate, amount.amount, b.base_charge, b.minimum_charge, b.charge_threshold);
    let method = b.method_for(action);
    drop(b);

    let (debit_total, net_credit, skim) = match method {
        PassiveMethodKind::WithinAmount => {
            let skim = Asset::new(skim_amount.min(amount.amount), amount.sym);
            (amount, amount.checked_sub(&skim)?, skim)
        }
        PassiveMethodKind::OutsideAmount => {
            let skim = Asset::new(skim_amount, amount.sym);
            (amount.checked_add(&skim)?, amount, skim)
        }
    };
    if skim.amount > 0 {
        ctx.generated.push(Action {
            domain: Name::new(".fungible").expect("literal name is valid"),
            key: Name128::new(sym_id.to_string()).expect("a u32 string fits Name128"),
            data: ActionData::PayBonus(PayBonus { payer: from.clone(), bonus: skim }),
        });
    }
    Ok(PassiveBonusSplit { debit_total, net_credit, skim })
}

/// Applies a `paybonus` action generated by [`apply_passive_bonus`]:
/// credits the skimmed amount to its symbol's accrual pool. `payer` is
/// retained only as the historical record of who the bonus came from —
/// the transfer that generated this action already moved `bonus` out of
/// `payer`'s balance via its own `debit_total`.
pub fn pay_bonus(ctx: &mut HandlerContext, a: &PayBonus) -> Result<()> {
    if a.bonus.amount < 0 {
        return Err(Error::kind(Kind::InvalidPayer, "bonus amount cannot be negative"));
    }
    let pool_address = bonus_pool_address(a.bonus.sym.id);
    credit(ctx, &pool_address, a.bonus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerdb_cache::TdbCache;
    use ledgerdb_store::TokenDatabase;
    use ledgerdb_types::{Address, DistRule, Name, Symbol};
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
    fn rules_summing_above_limit_are_rejected() {
        let mut db = TokenDatabase::open_in_memory().unwrap();
        let mut cache = TdbCache::new();
        let env = env();
        let mut generated = Vec::new();
        let mut hctx =
            HandlerContext { db: &mut db, cache: &mut cache, env: &env, generated: &mut generated, link_keys: &[] };
        let sym = Symbol::new(4, 1).unwrap();
        let err = set_psv_bonus(
            &mut hctx,
            &SetPsvBonus {
                sym_id: 1,
                rate: 1000,
                base_charge: 0,
                charge_threshold: 0,
                minimum_charge: 0,
                dist_threshold: Asset::zero(sym),
                rules: vec![
                    DistRule { receiver: Address::Reserved, rate: 600_000, base: 0, min: 0, max: 0 },
                    DistRule { receiver: Address::Reserved, rate: 600_000, base: 0, min: 0, max: 0 },
                ],
                methods: vec![],
            },
        )
        .unwrap_err();
        assert_eq!(err.find_kind(), Some(Kind::BonusRulesInvalid));
    }

    #[test]
    fn within_amount_skims_transfer() {
        let mut db = TokenDatabase::open_in_memory().unwrap();
        let mut cache = TdbCache::new();
        let env = env();
        let mut generated = Vec::new();
        let sym = Symbol::new(4, 1).unwrap();
        let mut hctx =
            HandlerContext { db: &mut db, cache: &mut cache, env: &env, generated: &mut generated, link_keys: &[] };
        set_psv_bonus(
            &mut hctx,
            &SetPsvBonus {
                sym_id: 1,
                rate: 50_000,
                base_charge: 0,
                charge_threshold: 1_000_000,
                minimum_charge: 0,
                dist_threshold: Asset::zero(sym),
                rules: vec![],
                methods: vec![],
            },
        )
        .unwrap();
        let payer = Address::PublicKey(ledgerdb_types::PublicKey::from_bytes([9; 33]));
        let split = apply_passive_bonus(&mut hctx, 1, "transferft", &payer, Asset::new(1000, sym)).unwrap();
        assert_eq!(split.debit_total.amount, 1000);
        assert_eq!(split.net_credit.amount, 950);
        assert_eq!(split.skim.amount, 50);
        assert_eq!(hctx.generated.len(), 1);
        let ActionData::PayBonus(pb) = hctx.generated[0].data.clone() else { panic!("expected a paybonus action") };
        assert_eq!(pb.bonus.amount, 50);
        pay_bonus(&mut hctx, &pb).unwrap();
        let pool = super::super::read_balance(&mut hctx, &bonus_pool_address(1), sym).unwrap();
        assert_eq!(pool.amount, 50);
    }

    #[test]
    fn outside_amount_charges_sender_on_top() {
        let mut db = TokenDatabase::open_in_memory().unwrap();
        let mut cache = TdbCache::new();
        let env = env();
        let mut generated = Vec::new();
        let sym = Symbol::new(4, 1).unwrap();
        let mut hctx =
            HandlerContext { db: &mut db, cache: &mut cache, env: &env, generated: &mut generated, link_keys: &[] };
        set_psv_bonus(
            &mut hctx,
            &SetPsvBonus {
                sym_id: 1,
                rate: 50_000,
                base_charge: 0,
                charge_threshold: 1_000_000,
                minimum_charge: 0,
                dist_threshold: Asset::zero(sym),
                rules: vec![],
                methods: vec![ledgerdb_types::PassiveMethod {
                    action: "transferft".into(),
                    method: PassiveMethodKind::OutsideAmount,
                }],
            },
        )
        .unwrap();
        let payer = Address::PublicKey(ledgerdb_types::PublicKey::from_bytes([9; 33]));
        let split = apply_passive_bonus(&mut hctx, 1, "transferft", &payer, Asset::new(1000, sym)).unwrap();
        assert_eq!(split.debit_total.amount, 1050);
        assert_eq!(split.net_credit.amount, 1000);
        assert_eq!(split.skim.amount, 50);
        assert_eq!(hctx.generated.len(), 1);
    }

    #[test]
    fn no_bonus_configured_leaves_amount_and_queue_untouched() {
        let mut db = TokenDatabase::open_in_memory().unwrap();
        let mut cache = TdbCache::new();
        let env = env();
        let mut generated = Vec::new();
        let sym = Symbol::new(4, 1).unwrap();
        let mut hctx =
            HandlerContext { db: &mut db, cache: &mut cache, env: &env, generated: &mut generated, link_keys: &[] };
        let payer = Address::PublicKey(ledgerdb_types::PublicKey::from_bytes([9; 33]));
        let split = apply_passive_bonus(&mut hctx, 1, "transferft", &payer, Asset::new(1000, sym)).unwrap();
        assert_eq!(split.debit_total.amount, 1000);
        assert_eq!(split.net_credit.amount, 1000);
        assert_eq!(split.skim.amount, 0);
        assert!(hctx.generated.is_empty());
    }
}
