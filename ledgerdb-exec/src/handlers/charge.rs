//! `paycharge` — the system-generated action `ledgerdb-txn` dispatches
//! after computing a transaction's network charge; never signed by a
//! user, so the authority checker always rejects it from an ordinary
//! transaction and only `ledgerdb-txn` is expected to invoke this handler
//! directly. `paybonus`, the other system-generated action, lives in
//! `handlers::bonus` alongside the passive-bonus split that produces it.

use ledgerdb_base::{Error, Kind, Result};
use ledgerdb_types::PayCharge;

use super::debit;
use crate::HandlerContext;

pub fn pay_charge(ctx: &mut HandlerContext, a: &PayCharge) -> Result<()> {
    if a.charge.amount < 0 {
        return Err(Error::kind(Kind::ChargeExceeded, "charge amount cannot be negative"));
    }
    debit(ctx, &a.payer, a.charge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerdb_cache::TdbCache;
    use ledgerdb_store::TokenDatabase;
    use ledgerdb_types::{Address, Asset, Name, Permission, PublicKey, Symbol};
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
    fn pay_charge_debits_payer() {
        let mut db = TokenDatabase::open_in_memory().unwrap();
        let mut cache = TdbCache::new();
        let env = env();
        let mut generated = Vec::new();
        let sym = Symbol::new(4, 1).unwrap();
        let payer = Address::PublicKey(PublicKey::from_bytes([5; 33]));
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
                total_supply: Asset::new(1000, sym),
            },
        )
        .unwrap();
        crate::handlers::fungible::issue_fungible(
            &mut hctx,
            &ledgerdb_types::IssueFungible { address: payer.clone(), number: Asset::new(100, sym), memo: String::new() },
            "1",
        )
        .unwrap();
        pay_charge(&mut hctx, &PayCharge { payer: payer.clone(), charge: Asset::new(10, sym) }).unwrap();
        assert_eq!(super::super::read_balance(&mut hctx, &payer, sym).unwrap().amount, 90);
    }

    #[test]
    fn pay_charge_beyond_balance_is_rejected() {
        let mut db = TokenDatabase::open_in_memory().unwrap();
        let mut cache = TdbCache::new();
        let env = env();
        let mut generated = Vec::new();
        let sym = Symbol::new(4, 1).unwrap();
        let payer = Address::PublicKey(PublicKey::from_bytes([6; 33]));
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
                total_supply: Asset::new(1000, sym),
            },
        )
        .unwrap();
        let err = pay_charge(&mut hctx, &PayCharge { payer, charge: Asset::new(10, sym) }).unwrap_err();
        assert_eq!(err.find_kind(), Some(Kind::InsufficientBalance));
    }
}
