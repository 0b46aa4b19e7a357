//! The execution context: a name+version registry dispatching a decoded
//! [`Action`] to the handler that applies its state change, plus the
//! handlers themselves (`handlers::*`).
//!
//! Authority checking happens before this crate ever sees an action (see
//! `ledgerdb-auth`); handlers assume the action is already authorized and
//! focus purely on the state transition.

pub mod handlers;
mod registry;

use ledgerdb_base::Result;
use ledgerdb_cache::TdbCache;
use ledgerdb_store::TokenDatabase;
use ledgerdb_types::{Action, ActionData, Name, PublicKey};

pub use registry::ExecutionContext;

/// Chain-level facts handlers need but that don't live in the token
/// database. Kept independent of `ledgerdb-admin::ChainConfig` (built on
/// top of this crate) to avoid a dependency cycle; the controller
/// assembles one from the other at the call site.
#[derive(Clone, Debug)]
pub struct ExecEnv {
    pub head_block_time: i64,
    pub root_org_group: Name,
    pub jmzk_sym_id: u32,
    pub pjmzk_sym_id: u32,
    pub loadtest_mode: bool,
    pub jmzk_link_expired_secs: u32,
    pub unstake_pending_days: u32,
}

/// Everything one handler call needs: the mutable state it writes
/// through, the keys available to a link-authorized action, and a place
/// to enqueue generated follow-up actions (`handlers::bonus::apply_passive_bonus`
/// queues `paybonus`) for the transaction context to apply after the
/// current action returns.
pub struct HandlerContext<'a> {
    pub db: &'a mut TokenDatabase,
    pub cache: &'a mut TdbCache,
    pub env: &'a ExecEnv,
    pub generated: &'a mut Vec<Action>,
    pub link_keys: &'a [PublicKey],
}

impl ExecutionContext {
    /// Validates that `action` is registered at the version it carries,
    /// then applies it. Any generated actions this call produces are
    /// pushed to `ctx.generated`, not applied recursively — draining that
    /// queue is the transaction context's job, between user actions.
    pub fn dispatch(&self, ctx: &mut HandlerContext, action: &Action) -> Result<()> {
        self.validate(action)?;
        use ActionData::*;
        match &action.data {
            NewDomain(a) => handlers::domain::new_domain(ctx, a),
            UpdateDomain(a) => handlers::domain::update_domain(ctx, a),
            IssueToken(a) => handlers::token::issue_token(ctx, a),
            Transfer(a) => handlers::token::transfer(ctx, a),
            DestroyToken(a) => handlers::token::destroy_token(ctx, a),
            NewGroup(a) => handlers::group::new_group(ctx, a),
            UpdateGroup(a) => handlers::group::update_group(ctx, a),
            NewFungible(a) => handlers::fungible::new_fungible(ctx, a),
            NewFungibleV1(a) => handlers::fungible::new_fungible_v1(ctx, a),
            UpdFungible(a) => handlers::fungible::upd_fungible(ctx, a),
            UpdFungibleV1(a) => handlers::fungible::upd_fungible_v1(ctx, a),
            IssueFungible(a) => handlers::fungible::issue_fungible(ctx, a, action.key.as_str()),
            TransferFt(a) => handlers::fungible::transfer_ft(ctx, a, action.key.as_str()),
            RecycleFt(a) => handlers::fungible::recycle_ft(ctx, a, action.key.as_str()),
            DestroyFt(a) => handlers::fungible::destroy_ft(ctx, a, action.key.as_str()),
            Convert2Pegged(a) => handlers::fungible::convert2pegged(ctx, a),
            BlackAddr(a) => handlers::domain::black_addr(ctx, a),
            NewSuspend(a) => handlers::suspend::new_suspend(ctx, a),
            AprvSuspend(a) => handlers::suspend::aprv_suspend(ctx, a),
            CancelSuspend(a) => handlers::suspend::cancel_suspend(ctx, a),
            ExecSuspend(a) => handlers::suspend::exec_suspend(ctx, a),
            NewLock(a) => handlers::lock::new_lock(ctx, a),
            AprvLock(a) => handlers::lock::aprv_lock(ctx, a),
            TryUnlock(a) => handlers::lock::try_unlock(ctx, a),
            AddMeta(a) => handlers::meta::add_meta(ctx, a, action.domain.as_str(), action.key.as_str()),
            EveriPass(a) => handlers::link::everipass(ctx, a),
            EveriPay(a) => handlers::link::everipay(ctx, a),
            ProdVote(a) => handlers::prodvote::prod_vote(ctx, a),
            UpdSched(a) => handlers::prodvote::upd_sched(ctx, a),
            NewValidator(a) => handlers::staking::new_validator(ctx, a),
            ValiWithdraw(a) => handlers::staking::vali_withdraw(ctx, a),
            NewStakePool(a) => handlers::staking::new_stake_pool(ctx, a),
            UpdStakePool(a) => handlers::staking::upd_stake_pool(ctx, a),
            StakeTkns(a) => handlers::staking::stake_tkns(ctx, a),
            UnstakeTkns(a) => handlers::staking::unstake_tkns(ctx, a),
            ToActiveTkns(a) => handlers::staking::to_active_tkns(ctx, a),
            RecvStkBonus(a) => handlers::staking::recv_stk_bonus(ctx, a),
            SetPsvBonus(a) => handlers::bonus::set_psv_bonus(ctx, a),
            DistPsvBonus(a) => handlers::bonus::dist_psv_bonus(ctx, a),
            NewScript(a) => handlers::script::new_script(ctx, a),
            UpdScript(a) => handlers::script::upd_script(ctx, a),
            PayCharge(a) => handlers::charge::pay_charge(ctx, a),
            PayBonus(a) => handlers::bonus::pay_bonus(ctx, a),
        }
    }
}
