//! Entities and action payloads: the data model the token database stores
//! and the execution pipeline consumes.

mod actions;
mod address;
mod bonus;
mod domain;
mod fungible;
mod governance;
mod group;
mod key;
mod link;
mod lock;
mod meta;
mod name;
mod permission;
mod script;
mod stakepool;
mod suspend;
mod symbol;
mod token;
mod validator;

pub use actions::{
    Action, ActionData, AddMeta, AprvLock, AprvSuspend, BlackAddr, CancelSuspend, Convert2Pegged,
    DestroyFt, DestroyToken, DistPsvBonus, DistRule, EveriPass, EveriPay, ExecSuspend,
    IssueFungible, IssueToken, NewDomain, NewFungible, NewFungibleV1, NewGroup, NewLock,
    NewScript, NewStakePool, NewSuspend, NewValidator, PayBonus, PayCharge, ProdVote, RecvStkBonus,
    RecycleFt, SetPsvBonus, StakeTkns, ToActiveTkns, Transfer, TransferFt, TryUnlock,
    UnstakeTkns, UpdFungible, UpdFungibleV1, UpdScript, UpdSched, UpdStakePool, UpdateDomain,
    UpdateGroup, ValiWithdraw,
};
pub use address::Address;
pub use bonus::{PassiveBonus, PassiveMethod, PassiveMethodKind};
pub use domain::Domain;
pub use fungible::Fungible;
pub use governance::{ProdVoteEntry, ProdVoteRecord, Schedule};
pub use group::{Group, GroupNode};
pub use key::{PublicKey, Signature};
pub use link::{Link, LinkSegment};
pub use lock::{Lock, LockCondition, LockStatus};
pub use meta::Meta;
pub use name::{Name, Name128};
pub use permission::{AuthorizerRef, AuthorizerWeight, Permission, PermissionKind};
pub use script::Script;
pub use stakepool::StakePool;
pub use suspend::{Suspend, SuspendStatus};
pub use symbol::{Asset, Symbol};
pub use token::{Token, TokenStatus};
pub use validator::Validator;
