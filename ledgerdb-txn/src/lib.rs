//! The Transaction Context: decodes and applies one signed transaction
//! against the token database, bracketed by a savepoint so any failure —
//! structural, authorization, or charge — rolls every mutation back and
//! leaves sibling transactions in the same block unaffected.

mod transaction;

pub use transaction::{SignedTransaction, Transaction};

use tracing::{debug, warn};

use ledgerdb_auth::{AuthContext, AuthorityChecker, ScriptEngine};
use ledgerdb_base::{Error, Kind, Result};
use ledgerdb_cache::TdbCache;
use ledgerdb_codec::Encode;
use ledgerdb_exec::{ExecEnv, ExecutionContext, HandlerContext};
use ledgerdb_money::charge::ChargeSchedule;
use ledgerdb_store::{AssetKey, TokenDatabase, TokenKey, TokenType};
use ledgerdb_types::{Action, ActionData, Address, Asset, Fungible, Name128, PayCharge, PublicKey, Signature};

/// The head block's identity, supplied by the controller: what a
/// transaction's reference-block fields are checked against, and the wall
/// clock a transaction's expiration is checked against.
#[derive(Clone, Copy, Debug)]
pub struct HeadBlockInfo {
    pub block_num: u16,
    pub block_prefix: u32,
    pub block_time: i64,
}

/// The outcome of successfully applying a transaction: the charge actually
/// billed, for the controller to fold into the block's receipts.
#[derive(Clone, Copy, Debug)]
pub struct Receipt {
    pub charge: u64,
}

pub struct TransactionContext<'a> {
    pub exec: &'a ExecutionContext,
    pub env: &'a ExecEnv,
    pub charges: &'a ChargeSchedule,
    pub auth_ctx: &'a AuthContext<'a>,
    pub script_engine: &'a dyn ScriptEngine,
    pub max_recursion_depth: u32,
    /// Whether a `max_charge == 0` transaction is accepted free of charge.
    /// Mirrors the controller's `charge_free_mode`/`loadtest_mode` chain
    /// configuration (owned by `ledgerdb-admin`, passed down here rather
    /// than duplicated).
    pub charge_free_mode: bool,
}

impl<'a> TransactionContext<'a> {
    /// Applies `trx` against `db`/`cache`, bracketed by a savepoint: on
    /// success the savepoint is squashed into the durable session, on any
    /// failure it's rolled back and the cache's resident entries dropped so
    /// a retry re-reads clean state.
    pub fn apply(
        &self,
        db: &mut TokenDatabase,
        cache: &mut TdbCache,
        head: &HeadBlockInfo,
        trx: &SignedTransaction,
    ) -> Result<Receipt> {
        let seq = db.latest_savepoint_seq().map(|s| s + 1).unwrap_or(0);
        db.add_savepoint(seq)?;
        match self.apply_inner(db, cache, head, trx) {
            Ok(receipt) => {
                db.squash()?;
                debug!(charge = receipt.charge, "transaction accepted");
                Ok(receipt)
            }
            Err(err) => {
                db.rollback_to_latest_savepoint()?;
                cache.rollback();
                warn!(error = %err, "transaction rolled back");
                Err(err)
            }
        }
    }

    fn apply_inner(
        &self,
        db: &mut TokenDatabase,
        cache: &mut TdbCache,
        head: &HeadBlockInfo,
        trx: &SignedTransaction,
    ) -> Result<Receipt> {
        if trx.trx.expiration <= head.block_time {
            return Err(Error::kind(Kind::TrxExpired, "transaction has expired"));
        }
        if trx.trx.ref_block_num != head.block_num || trx.trx.ref_block_prefix != head.block_prefix {
            return Err(Error::kind(Kind::TrxRefBlockMismatch, "reference block does not match the head block"));
        }
        let signing_keys = recover_unique_keys(&trx.signatures)?;
        let mut checker = AuthorityChecker::new(&signing_keys, self.max_recursion_depth, self.script_engine);

        for action in &trx.trx.actions {
            if !checker.satisfied(action, db, cache, self.auth_ctx)? {
                return Err(Error::kind(
                    Kind::UnsatisfiedAuthorization,
                    format!("{} is not authorized by the transaction's signatures", action.data.action_name()),
                ));
            }
            let mut generated = Vec::new();
            {
                let mut hctx =
                    HandlerContext { db, cache, env: self.env, generated: &mut generated, link_keys: &signing_keys };
                self.exec.dispatch(&mut hctx, action)?;
            }
            while let Some(next) = generated.pop() {
                let mut hctx =
                    HandlerContext { db, cache, env: self.env, generated: &mut generated, link_keys: &signing_keys };
                self.exec.dispatch(&mut hctx, &next)?;
            }
        }

        if !checker.all_keys_used() {
            return Err(Error::kind(
                Kind::IrrelevantSignature,
                "transaction carries a signature whose key was not required by any of its actions",
            ));
        }

        let charge = self.charges.compute(trx.trx.encode_to_vec().len(), trx.trx.actions.len());
        if trx.trx.max_charge == 0 {
            if !self.charge_free_mode {
                return Err(Error::kind(Kind::MaxChargeExceeded, "free mode is not active for this transaction"));
            }
        } else if charge > trx.trx.max_charge {
            return Err(Error::kind(
                Kind::MaxChargeExceeded,
                format!("computed charge {charge} exceeds the transaction's max_charge {}", trx.trx.max_charge),
            ));
        } else {
            self.collect_charge(db, cache, &trx.trx.payer, charge)?;
        }

        Ok(Receipt { charge })
    }

    /// Bills `charge` against the payer's native balance first, then the
    /// pegged balance for any remainder, by dispatching `paycharge` actions
    /// through the execution context — the handler itself is never
    /// user-satisfiable (see `ledgerdb-auth`), so this is the only caller.
    fn collect_charge(&self, db: &mut TokenDatabase, cache: &mut TdbCache, payer: &Address, charge: u64) -> Result<()> {
        if charge == 0 {
            return Ok(());
        }
        let mut remaining = charge;
        for sym_id in [self.env.jmzk_sym_id, self.env.pjmzk_sym_id] {
            if remaining == 0 {
                break;
            }
            let Some(sym) = self.fungible_sym(db, cache, sym_id)? else { continue };
            let available = self.balance(db, cache, payer, sym_id)?;
            let take = available.min(remaining as i64).max(0);
            if take == 0 {
                continue;
            }
            remaining -= take as u64;
            let mut generated = Vec::new();
            let mut hctx = HandlerContext { db, cache, env: self.env, generated: &mut generated, link_keys: &[] };
            let action = Action {
                domain: ledgerdb_types::Name::reserved(),
                key: Name128::new("system").expect("literal name is valid"),
                data: ActionData::PayCharge(PayCharge { payer: payer.clone(), charge: Asset::new(take, sym) }),
            };
            self.exec.dispatch(&mut hctx, &action)?;
        }
        if remaining > 0 {
            return Err(Error::kind(Kind::ChargeExceeded, "payer's balances do not cover the computed charge"));
        }
        Ok(())
    }

    fn fungible_sym(&self, db: &TokenDatabase, cache: &mut TdbCache, sym_id: u32) -> Result<Option<ledgerdb_types::Symbol>> {
        let key = TokenKey::unprefixed(TokenType::Fungible, &sym_id.to_string());
        match cache.read_token_opt::<Fungible>(db, &key)? {
            Some(handle) => Ok(Some(handle.borrow().sym)),
            None => Ok(None),
        }
    }

    fn balance(&self, db: &TokenDatabase, cache: &mut TdbCache, address: &Address, sym_id: u32) -> Result<i64> {
        let key = AssetKey::new(address.clone(), sym_id);
        match cache.read_asset::<i64>(db, &key)? {
            Some(handle) => Ok(*handle.borrow()),
            None => Ok(0),
        }
    }
}

/// Recovers each signature's signing key and rejects a transaction in which
/// two signatures recover the same key — a transaction is never required
/// to carry more signatures than distinct signers.
fn recover_unique_keys(signatures: &[Signature]) -> Result<Vec<PublicKey>> {
    let mut keys = Vec::with_capacity(signatures.len());
    for sig in signatures {
        let key = sig.recover();
        if keys.contains(&key) {
            return Err(Error::kind(Kind::DuplicateSignature, "two signatures recovered the same key"));
        }
        keys.push(key);
    }
    Ok(keys)
}
