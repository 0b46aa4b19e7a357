//! `newfungible`/`newfungible` v1, `updfungible`/`updfungible` v1,
//! `issuefungible`, `transferft`, `recycleft`, `destroyft`, `jmzk2pjmzk`.

use ledgerdb_base::{Error, Kind, Result};
use ledgerdb_cache::Handle;
use ledgerdb_store::PutOp;
use ledgerdb_types::{
    Asset, Convert2Pegged, DestroyFt, Fungible, IssueFungible, NewFungible, NewFungibleV1, Permission,
    RecycleFt, TransferFt, UpdFungible, UpdFungibleV1,
};

use super::{credit, debit, fungible_key, parse_sym_id, validate_permission_slot};
use crate::handlers::bonus::apply_passive_bonus;
use crate::HandlerContext;

pub fn new_fungible(ctx: &mut HandlerContext, a: &NewFungible) -> Result<()> {
    validate_permission_slot(ctx, &a.issue, "issue", false)?;
    validate_permission_slot(ctx, &a.transfer, "transfer", true)?;
    validate_permission_slot(ctx, &a.manage, "manage", false)?;
    create_fungible(ctx, a.sym.id, a.creator.clone(), a.issue.clone(), a.transfer.clone(), a.manage.clone(), a.sym, a.total_supply)
}

/// The pre-expansion payload carries no `transfer` permission; per the
/// resolved Open Question, one is derived from `issue`'s first
/// authorizer rather than rejecting the action outright.
pub fn new_fungible_v1(ctx: &mut HandlerContext, a: &NewFungibleV1) -> Result<()> {
    validate_permission_slot(ctx, &a.issue, "issue", false)?;
    validate_permission_slot(ctx, &a.manage, "manage", false)?;
    let first = a
        .issue
        .authorizers
        .first()
        .cloned()
        .ok_or_else(|| Error::kind(Kind::InvalidGroupStructure, "newfungible v1 issue permission has no authorizers"))?;
    let transfer = Permission {
        name: ledgerdb_types::Name::new("transfer").expect("literal name is valid"),
        threshold: first.weight,
        authorizers: vec![first],
    };
    create_fungible(ctx, a.sym.id, a.creator.clone(), a.issue.clone(), transfer, a.manage.clone(), a.sym, a.total_supply)
}

#[allow(clippy::too_many_arguments)]
fn create_fungible(
    ctx: &mut HandlerContext,
    sym_id: u32,
    creator: ledgerdb_types::Address,
    issue: Permission,
    transfer: Permission,
    manage: Permission,
    sym: ledgerdb_types::Symbol,
    total_supply: Asset,
) -> Result<()> {
    let key = fungible_key(sym_id);
    if ctx.db.exists_token(&key)? {
        return Err(Error::kind(Kind::FungibleDuplicate, format!("fungible {sym_id} already exists")));
    }
    if total_supply.amount < 0 {
        return Err(Error::kind(Kind::FungibleSupplyInvalid, "total supply cannot be negative"));
    }
    let fungible = Fungible {
        sym,
        creator,
        create_time: ctx.env.head_block_time,
        issue,
        transfer,
        manage,
        total_supply,
        current_supply: Asset::zero(sym),
        metas: Vec::new(),
    };
    let handle: Handle<Fungible> = std::rc::Rc::new(std::cell::RefCell::new(fungible));
    ctx.cache.put_token(ctx.db, &key, PutOp::Add, handle)
}

pub fn upd_fungible(ctx: &mut HandlerContext, a: &UpdFungible) -> Result<()> {
    if let Some(p) = &a.issue {
        validate_permission_slot(ctx, p, "issue", false)?;
    }
    if let Some(p) = &a.transfer {
        validate_permission_slot(ctx, p, "transfer", true)?;
    }
    if let Some(p) = &a.manage {
        validate_permission_slot(ctx, p, "manage", false)?;
    }
    apply_fungible_update(ctx, a.sym_id, a.issue.clone(), a.transfer.clone(), a.manage.clone())
}

pub fn upd_fungible_v1(ctx: &mut HandlerContext, a: &UpdFungibleV1) -> Result<()> {
    if let Some(p) = &a.issue {
        validate_permission_slot(ctx, p, "issue", false)?;
    }
    if let Some(p) = &a.manage {
        validate_permission_slot(ctx, p, "manage", false)?;
    }
    apply_fungible_update(ctx, a.sym_id, a.issue.clone(), None, a.manage.clone())
}

fn apply_fungible_update(
    ctx: &mut HandlerContext,
    sym_id: u32,
    issue: Option<Permission>,
    transfer: Option<Permission>,
    manage: Option<Permission>,
) -> Result<()> {
    let key = fungible_key(sym_id);
    let handle: Handle<Fungible> = ctx.cache.read_token(ctx.db, &key)?;
    {
        let mut fg = handle.borrow_mut();
        if let Some(p) = issue {
            fg.issue = p;
        }
        if let Some(p) = transfer {
            fg.transfer = p;
        }
        if let Some(p) = manage {
            fg.manage = p;
        }
    }
    ctx.cache.put_token(ctx.db, &key, PutOp::Update, handle)
}

pub fn issue_fungible(ctx: &mut HandlerContext, a: &IssueFungible, sym_id_key: &str) -> Result<()> {
    let sym_id = parse_sym_id(sym_id_key)?;
    let key = fungible_key(sym_id);
    let handle: Handle<Fungible> = ctx.cache.read_token(ctx.db, &key)?;
    {
        let mut fg = handle.borrow_mut();
        let after_supply = fg
            .current_supply
            .checked_add(&a.number)
            .map_err(|_| Error::kind(Kind::FungibleSupplyInvalid, "issue overflowed current supply"))?;
        if after_supply.amount > fg.total_supply.amount {
            return Err(Error::kind(Kind::FungibleSupplyInvalid, "issue would exceed total supply"));
        }
        fg.current_supply = after_supply;
    }
    ctx.cache.put_token(ctx.db, &key, PutOp::Update, handle)?;
    credit(ctx, &a.address, a.number)
}

pub fn transfer_ft(ctx: &mut HandlerContext, a: &TransferFt, sym_id_key: &str) -> Result<()> {
    let sym_id = parse_sym_id(sym_id_key)?;
    if a.number.amount <= 0 {
        return Err(Error::kind(Kind::FungibleSupplyInvalid, "transfer amount must be positive"));
    }
    let split = apply_passive_bonus(ctx, sym_id, "transferft", &a.from, a.number)?;
    debit(ctx, &a.from, split.debit_total)?;
    credit(ctx, &a.to, split.net_credit)
}

pub fn recycle_ft(ctx: &mut HandlerContext, a: &RecycleFt, sym_id_key: &str) -> Result<()> {
    let sym_id = parse_sym_id(sym_id_key)?;
    debit(ctx, &a.address, a.number)?;
    let key = fungible_key(sym_id);
    let handle: Handle<Fungible> = ctx.cache.read_token(ctx.db, &key)?;
    {
        let mut fg = handle.borrow_mut();
        fg.current_supply = fg
            .current_supply
            .checked_sub(&a.number)
            .map_err(|_| Error::kind(Kind::FungibleSupplyInvalid, "recycle underflowed current supply"))?;
    }
    ctx.cache.put_token(ctx.db, &key, PutOp::Update, handle)
}

pub fn destroy_ft(ctx: &mut HandlerContext, a: &DestroyFt, sym_id_key: &str) -> Result<()> {
    let sym_id = parse_sym_id(sym_id_key)?;
    debit(ctx, &a.address, a.number)?;
    let key = fungible_key(sym_id);
    let handle: Handle<Fungible> = ctx.cache.read_token(ctx.db, &key)?;
    {
        let mut fg = handle.borrow_mut();
        fg.current_supply = fg
            .current_supply
            .checked_sub(&a.number)
            .map_err(|_| Error::kind(Kind::FungibleSupplyInvalid, "destroy underflowed current supply"))?;
        fg.total_supply = fg
            .total_supply
            .checked_sub(&a.number)
            .map_err(|_| Error::kind(Kind::FungibleSupplyInvalid, "destroy underflowed total supply"))?;
    }
    ctx.cache.put_token(ctx.db, &key, PutOp::Update, handle)
}

/// `jmzk2pjmzk`: a fixed 1:1 peg between the chain's two built-in
/// fungibles. A real pegged-asset conversion would consult a market rate;
/// this core fixes it at parity, the simplification documented in
/// `DESIGN.md`.
pub fn convert2pegged(ctx: &mut HandlerContext, a: &Convert2Pegged) -> Result<()> {
    if a.number.sym.id != ctx.env.jmzk_sym_id {
        return Err(Error::kind(Kind::FungibleSymbolInvalid, "jmzk2pjmzk only converts the native jmzk symbol"));
    }
    debit(ctx, &a.from, a.number)?;
    let pegged_key = fungible_key(ctx.env.pjmzk_sym_id);
    let pegged: Handle<Fungible> = ctx.cache.read_token(ctx.db, &pegged_key)?;
    let pegged_sym = pegged.borrow().sym;
    let pegged_amount = Asset::new(a.number.amount, pegged_sym);
    {
        let mut fg = pegged.borrow_mut();
        fg.current_supply = fg
            .current_supply
            .checked_add(&pegged_amount)
            .map_err(|_| Error::kind(Kind::FungibleSupplyInvalid, "jmzk2pjmzk overflowed pegged supply"))?;
    }
    ctx.cache.put_token(ctx.db, &pegged_key, PutOp::Update, pegged)?;
    credit(ctx, &a.from, pegged_amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerdb_cache::TdbCache;
    use ledgerdb_store::TokenDatabase;
    use ledgerdb_types::{Address, Name, Symbol};
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

    fn new_ctx<'a>(
        db: &'a mut TokenDatabase,
        cache: &'a mut TdbCache,
        env: &'a crate::ExecEnv,
        generated: &'a mut Vec<ledgerdb_types::Action>,
    ) -> HandlerContext<'a> {
        HandlerContext { db, cache, env, generated, link_keys: &[] }
    }

    #[test]
    fn issue_beyond_total_supply_is_rejected() {
        let mut db = TokenDatabase::open_in_memory().unwrap();
        let mut cache = TdbCache::new();
        let env = env();
        let mut generated = Vec::new();
        let sym = Symbol::new(4, 1).unwrap();
        {
            let mut hctx = new_ctx(&mut db, &mut cache, &env, &mut generated);
            new_fungible(
                &mut hctx,
                &NewFungible {
                    sym,
                    creator: Address::Reserved,
                    issue: Permission::single_key(Name::new("issue").unwrap(), Address::Reserved),
                    transfer: Permission::single_key(Name::new("transfer").unwrap(), Address::Reserved),
                    manage: Permission::single_key(Name::new("manage").unwrap(), Address::Reserved),
                    total_supply: Asset::new(100, sym),
                },
            )
            .unwrap();
        }
        let mut hctx = new_ctx(&mut db, &mut cache, &env, &mut generated);
        let err = issue_fungible(
            &mut hctx,
            &IssueFungible { address: Address::Reserved, number: Asset::new(200, sym), memo: String::new() },
            "1",
        )
        .unwrap_err();
        assert_eq!(err.find_kind(), Some(Kind::FungibleSupplyInvalid));
    }

    #[test]
    fn transfer_moves_balance() {
        let mut db = TokenDatabase::open_in_memory().unwrap();
        let mut cache = TdbCache::new();
        let env = env();
        let mut generated = Vec::new();
        let sym = Symbol::new(4, 1).unwrap();
        let from = Address::PublicKey(ledgerdb_types::PublicKey::from_bytes([1; 33]));
        let to = Address::PublicKey(ledgerdb_types::PublicKey::from_bytes([2; 33]));
        {
            let mut hctx = new_ctx(&mut db, &mut cache, &env, &mut generated);
            new_fungible(
                &mut hctx,
                &NewFungible {
                    sym,
                    creator: Address::Reserved,
                    issue: Permission::single_key(Name::new("issue").unwrap(), Address::Reserved),
                    transfer: Permission::single_key(Name::new("transfer").unwrap(), Address::Reserved),
                    manage: Permission::single_key(Name::new("manage").unwrap(), Address::Reserved),
                    total_supply: Asset::new(1000, sym),
                },
            )
            .unwrap();
            issue_fungible(
                &mut hctx,
                &IssueFungible { address: from.clone(), number: Asset::new(100, sym), memo: String::new() },
                "1",
            )
            .unwrap();
        }
        let mut hctx = new_ctx(&mut db, &mut cache, &env, &mut generated);
        transfer_ft(
            &mut hctx,
            &TransferFt { from: from.clone(), to: to.clone(), number: Asset::new(40, sym), memo: String::new() },
            "1",
        )
        .unwrap();
        assert_eq!(super::super::read_balance(&mut hctx, &from, sym).unwrap().amount, 60);
        assert_eq!(super::super::read_balance(&mut hctx, &to, sym).unwrap().amount, 40);
    }

    #[test]
    fn transfer_more_than_balance_is_rejected() {
        let mut db = TokenDatabase::open_in_memory().unwrap();
        let mut cache = TdbCache::new();
        let env = env();
        let mut generated = Vec::new();
        let sym = Symbol::new(4, 1).unwrap();
        let from = Address::PublicKey(ledgerdb_types::PublicKey::from_bytes([1; 33]));
        let to = Address::PublicKey(ledgerdb_types::PublicKey::from_bytes([2; 33]));
        let mut hctx = new_ctx(&mut db, &mut cache, &env, &mut generated);
        let err = transfer_ft(
            &mut hctx,
            &TransferFt { from, to, number: Asset::new(40, sym), memo: String::new() },
            "1",
        )
        .unwrap_err();
        assert_eq!(err.find_kind(), Some(Kind::InsufficientBalance));
    }
}
