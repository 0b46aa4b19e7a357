//! `everipass`, `everipay`.

use ledgerdb_base::{Error, Kind, Result};
use ledgerdb_store::{PutOp, TokenKey, TokenType};
use ledgerdb_types::{Address, Asset, EveriPass, EveriPay, LinkSegment};

use super::credit;
use crate::HandlerContext;

fn link_id_key(id: &[u8; 16]) -> TokenKey {
    TokenKey::unprefixed(TokenType::LinkId, &hex(id))
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Rejects an already-redeemed link (replay) and one whose timestamp has
/// aged past the chain's configured expiration window, then records the
/// link id as spent. Shared by both `everipass` and `everipay` since both
/// redeem a link exactly once.
fn redeem(ctx: &mut HandlerContext, link: &ledgerdb_types::Link) -> Result<()> {
    link.check_version()?;
    let id = link.link_id().ok_or_else(|| Error::kind(Kind::LinkMissingSegment, "link carries no link id segment"))?;
    let timestamp =
        link.timestamp().ok_or_else(|| Error::kind(Kind::LinkMissingSegment, "link carries no timestamp segment"))?;
    if ctx.env.head_block_time - timestamp > ctx.env.jmzk_link_expired_secs as i64 {
        return Err(Error::kind(Kind::ExpiredLink, "link timestamp has expired"));
    }
    let key = link_id_key(&id);
    if ctx.db.exists_token(&key)? {
        return Err(Error::kind(Kind::DuplicateLink, "link has already been redeemed"));
    }
    ctx.db.put_token(&key, vec![1], PutOp::Add)
}

/// `everipass` merely gates passage: once its link clears replay/expiry
/// checks and the authority checker has confirmed one of `link_keys`
/// satisfies the target domain/token's `transfer` permission, there is no
/// further state change.
pub fn everipass(ctx: &mut HandlerContext, a: &EveriPass) -> Result<()> {
    redeem(ctx, &a.link)
}

/// `everipay` additionally moves value: `MaxPay`/`MaxPayStr` bounds what
/// the payer authorized, `SymbolId` selects the fungible, and the payer is
/// whichever of `link_keys` recovered the link's signature (authority
/// checking already confirmed that before dispatch).
pub fn everipay(ctx: &mut HandlerContext, a: &EveriPay) -> Result<()> {
    redeem(ctx, &a.link)?;
    let sym_id = a
        .link
        .segments
        .iter()
        .find_map(|s| match s {
            LinkSegment::SymbolId(id) => Some(*id),
            _ => None,
        })
        .ok_or_else(|| Error::kind(Kind::LinkMissingSegment, "everipay link carries no symbol id segment"))?;
    if sym_id != a.number.sym.id {
        return Err(Error::kind(Kind::FungibleSymbolInvalid, "everipay amount symbol does not match the link"));
    }
    let max_pay = a.link.segments.iter().find_map(|s| match s {
        LinkSegment::MaxPay(asset) => Some(*asset),
        _ => None,
    });
    if let Some(max) = max_pay {
        if a.number.amount > max.amount {
            return Err(Error::kind(Kind::ChargeExceeded, "everipay amount exceeds the link's authorized max"));
        }
    }
    let payer = a
        .link
        .segments
        .iter()
        .find_map(|s| match s {
            LinkSegment::Keys(keys) => keys.first().copied(),
            _ => None,
        })
        .map(Address::PublicKey)
        .ok_or_else(|| Error::kind(Kind::LinkMissingSegment, "everipay link carries no payer key"))?;
    super::debit(ctx, &payer, a.number)?;
    credit(ctx, &a.payee, a.number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerdb_cache::TdbCache;
    use ledgerdb_store::TokenDatabase;
    use ledgerdb_types::{Link, Name, PublicKey, Symbol};
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

    fn pass_link(timestamp: i64, id: [u8; 16]) -> Link {
        Link { header: 1, segments: vec![LinkSegment::Timestamp(timestamp), LinkSegment::LinkId(id)] }
    }

    #[test]
    fn replayed_everipass_is_rejected() {
        let mut db = TokenDatabase::open_in_memory().unwrap();
        let mut cache = TdbCache::new();
        let env = env();
        let mut generated = Vec::new();
        let mut hctx =
            HandlerContext { db: &mut db, cache: &mut cache, env: &env, generated: &mut generated, link_keys: &[] };
        let link = pass_link(990, [9; 16]);
        everipass(&mut hctx, &EveriPass { link: link.clone() }).unwrap();
        let err = everipass(&mut hctx, &EveriPass { link }).unwrap_err();
        assert_eq!(err.find_kind(), Some(Kind::DuplicateLink));
    }

    #[test]
    fn expired_link_is_rejected() {
        let mut db = TokenDatabase::open_in_memory().unwrap();
        let mut cache = TdbCache::new();
        let env = env();
        let mut generated = Vec::new();
        let mut hctx =
            HandlerContext { db: &mut db, cache: &mut cache, env: &env, generated: &mut generated, link_keys: &[] };
        let link = pass_link(1, [1; 16]);
        let err = everipass(&mut hctx, &EveriPass { link }).unwrap_err();
        assert_eq!(err.find_kind(), Some(Kind::ExpiredLink));
    }

    #[test]
    fn everipay_moves_balance_within_max() {
        let mut db = TokenDatabase::open_in_memory().unwrap();
        let mut cache = TdbCache::new();
        let env = env();
        let mut generated = Vec::new();
        let sym = Symbol::new(4, 1).unwrap();
        let payer_key = PublicKey::from_bytes([3; 33]);
        let payee = Address::PublicKey(PublicKey::from_bytes([4; 33]));
        let mut hctx =
            HandlerContext { db: &mut db, cache: &mut cache, env: &env, generated: &mut generated, link_keys: &[] };
        crate::handlers::fungible::new_fungible(
            &mut hctx,
            &ledgerdb_types::NewFungible {
                sym,
                creator: Address::Reserved,
                issue: ledgerdb_types::Permission::single_key(Name::new("issue").unwrap(), Address::Reserved),
                transfer: ledgerdb_types::Permission::single_key(Name::new("transfer").unwrap(), Address::Reserved),
                manage: ledgerdb_types::Permission::single_key(Name::new("manage").unwrap(), Address::Reserved),
                total_supply: Asset::new(1000, sym),
            },
        )
        .unwrap();
        crate::handlers::fungible::issue_fungible(
            &mut hctx,
            &ledgerdb_types::IssueFungible {
                address: Address::PublicKey(payer_key),
                number: Asset::new(100, sym),
                memo: String::new(),
            },
            "1",
        )
        .unwrap();
        let link = Link {
            header: 1,
            segments: vec![
                LinkSegment::Timestamp(990),
                LinkSegment::LinkId([2; 16]),
                LinkSegment::SymbolId(1),
                LinkSegment::MaxPay(Asset::new(50, sym)),
                LinkSegment::Keys(vec![payer_key]),
            ],
        };
        everipay(&mut hctx, &EveriPay { link, payee: payee.clone(), number: Asset::new(30, sym) }).unwrap();
        assert_eq!(super::super::read_balance(&mut hctx, &payee, sym).unwrap().amount, 30);
    }
}
