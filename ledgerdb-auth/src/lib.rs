//! Weighted-threshold authority checking: given a transaction's recovered
//! signing keys, decides whether a single action's governing permission
//! (or ad-hoc authorizer rule) is satisfied, and which keys were spent
//! doing so.

use tracing::trace;

use ledgerdb_base::{Error, Kind, Result};
use ledgerdb_base::Bitmap256;
use ledgerdb_cache::{Handle, TdbCache};
use ledgerdb_store::{TokenDatabase, TokenKey, TokenType};
use ledgerdb_types::{
    Action, ActionData, Address, AuthorizerRef, Fungible, Group, GroupNode, Name, Permission,
    PermissionKind, PublicKey, Script, Suspend, Token, Validator,
};

/// A script filter invoked for the `script` authorizer kind. The original
/// system embeds a Lua interpreter; nothing in the retrieved example pack
/// carries a scripting dependency, so this is a pluggable trait instead —
/// `OptimisticScriptEngine` (accept unconditionally) is the default, and a
/// real embedding can implement this trait without touching the checker.
pub trait ScriptEngine {
    fn invoke_filter(&self, action: &Action, script: &Script) -> Result<bool>;
}

pub struct OptimisticScriptEngine;
impl ScriptEngine for OptimisticScriptEngine {
    fn invoke_filter(&self, _action: &Action, _script: &Script) -> Result<bool> {
        Ok(true)
    }
}

/// Everything about the chain's current configuration the checker needs
/// but that doesn't live in the token database itself.
pub struct AuthContext<'a> {
    pub root_org_group: &'a Name,
    pub producers: &'a [(Name, PublicKey)],
    pub check_script: bool,
}

/// Which owner list (if any) an `Owner` authorizer reference should be
/// checked against for the action currently being authorized.
enum OwnerContext<'a> {
    None,
    Nft { domain: &'a Name, key: &'a str },
    Ft { from: &'a Address },
}

pub struct AuthorityChecker<'a> {
    signing_keys: &'a [PublicKey],
    used_keys: Bitmap256,
    max_recursion_depth: u32,
    script_engine: &'a dyn ScriptEngine,
}

impl<'a> AuthorityChecker<'a> {
    pub fn new(signing_keys: &'a [PublicKey], max_recursion_depth: u32, script_engine: &'a dyn ScriptEngine) -> Self {
        assert!(signing_keys.len() <= 256, "more signing keys than the used-key bitmap can track");
        AuthorityChecker {
            signing_keys,
            used_keys: Bitmap256::new(),
            max_recursion_depth,
            script_engine,
        }
    }

    pub fn used_keys(&self) -> &Bitmap256 {
        &self.used_keys
    }

    pub fn all_keys_used(&self) -> bool {
        (0..self.signing_keys.len() as u8).all(|i| self.used_keys.get(i))
    }

    fn mark_if_signed_key(&mut self, key: &PublicKey) -> bool {
        match self.signing_keys.iter().position(|k| k == key) {
            Some(idx) => {
                self.used_keys.set(idx as u8, true);
                true
            }
            None => false,
        }
    }

    fn mark_if_signed(&mut self, addr: &Address) -> bool {
        match addr.as_public_key() {
            Some(pk) => self.mark_if_signed_key(pk),
            None => false,
        }
    }

    /// Runs `f`, rolling back every used-key mark it made if it returns
    /// `Ok(false)` or an error, so a failed speculative branch never leaks
    /// marks to a sibling branch.
    fn speculate<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T>
    where
        T: Into<bool> + Copy,
    {
        let snapshot = self.used_keys.clone();
        let result = f(self);
        match &result {
            Ok(ok) if (*ok).into() => {}
            _ => self.used_keys = snapshot,
        }
        result
    }

    fn satisfied_branch(&mut self, threshold: u32, nodes: &[GroupNode], depth: u32) -> Result<bool> {
        if depth >= self.max_recursion_depth {
            return Err(Error::kind(Kind::RecursionLimit, "group tree exceeds the recursion limit"));
        }
        let mut total = 0u32;
        for node in nodes {
            let (ok, weight) = match node {
                GroupNode::Leaf { key, weight } => (self.mark_if_signed(key), *weight),
                GroupNode::Branch { threshold: t, weight: w, nodes: ns } => {
                    (self.satisfied_branch(*t, ns, depth + 1)?, *w)
                }
            };
            if ok {
                total += weight;
            }
            if total >= threshold {
                return Ok(true);
            }
        }
        Ok(total >= threshold)
    }

    fn satisfied_group(&mut self, name: &Name, db: &TokenDatabase, cache: &mut TdbCache) -> Result<bool> {
        let key = TokenKey::unprefixed(TokenType::Group, name.as_str());
        let group: Handle<Group> = cache.read_token(db, &key)?;
        let group = group.borrow();
        match &group.root {
            GroupNode::Leaf { key, weight } => Ok(*weight > 0 && self.mark_if_signed(key)),
            GroupNode::Branch { threshold, nodes, .. } => self.satisfied_branch(*threshold, nodes, 0),
        }
    }

    fn satisfied_owner(
        &mut self,
        owner_ctx: &OwnerContext,
        db: &TokenDatabase,
        cache: &mut TdbCache,
    ) -> Result<bool> {
        match owner_ctx {
            OwnerContext::None => Ok(false),
            OwnerContext::Ft { from } => self.satisfied_owner_address(from, db, cache),
            OwnerContext::Nft { domain, key } => {
                let tk = TokenKey::new(TokenType::Token, Some(domain.as_str()), key);
                let token: Handle<Token> = cache.read_token(db, &tk)?;
                let owners = token.borrow().owner.clone();
                if owners.is_empty() {
                    return Ok(false);
                }
                for owner in &owners {
                    if !self.satisfied_owner_address(owner, db, cache)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }

    fn satisfied_owner_address(&mut self, addr: &Address, db: &TokenDatabase, cache: &mut TdbCache) -> Result<bool> {
        match addr.group_name() {
            Some(name) => {
                let name = Name::new(name.as_str())?;
                self.satisfied_group(&name, db, cache)
            }
            None => Ok(self.mark_if_signed(addr)),
        }
    }

    fn satisfied_script(
        &mut self,
        name: &Name,
        action: &Action,
        db: &TokenDatabase,
        cache: &mut TdbCache,
        ctx: &AuthContext,
    ) -> Result<bool> {
        if !ctx.check_script {
            return Ok(true);
        }
        let key = TokenKey::unprefixed(TokenType::Script, name.as_str());
        let script: Handle<Script> = cache.read_token(db, &key)?;
        let script = script.borrow();
        self.script_engine.invoke_filter(action, &script)
    }

    fn satisfied_permission(
        &mut self,
        permission: &Permission,
        owner_ctx: &OwnerContext,
        action: &Action,
        db: &TokenDatabase,
        cache: &mut TdbCache,
        ctx: &AuthContext,
    ) -> Result<bool> {
        let mut total = 0u32;
        for aw in &permission.authorizers {
            let ok = match &aw.authorizer {
                AuthorizerRef::Account(addr) => self.mark_if_signed(addr),
                AuthorizerRef::Owner => self.satisfied_owner(owner_ctx, db, cache)?,
                AuthorizerRef::Group(name) => self.satisfied_group(name, db, cache)?,
                AuthorizerRef::Script(name) => self.satisfied_script(name, action, db, cache, ctx)?,
            };
            if ok {
                total += aw.weight;
                if total >= permission.threshold {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    fn domain_permission(
        &mut self,
        kind: PermissionKind,
        action: &Action,
        db: &TokenDatabase,
        cache: &mut TdbCache,
        ctx: &AuthContext,
    ) -> Result<bool> {
        let key = TokenKey::unprefixed(TokenType::Domain, action.domain.as_str());
        let domain: Handle<ledgerdb_types::Domain> = cache.read_token(db, &key)?;
        let permission = {
            let d = domain.borrow();
            match kind {
                PermissionKind::Issue => d.issue.clone(),
                PermissionKind::Transfer => d.transfer.clone(),
                PermissionKind::Manage => d.manage.clone(),
            }
        };
        let owner_ctx = OwnerContext::Nft { domain: &action.domain, key: action.key.as_str() };
        self.satisfied_permission(&permission, &owner_ctx, action, db, cache, ctx)
    }

    fn fungible_permission(
        &mut self,
        kind: PermissionKind,
        sym_id: u32,
        from: Option<&Address>,
        action: &Action,
        db: &TokenDatabase,
        cache: &mut TdbCache,
        ctx: &AuthContext,
    ) -> Result<bool> {
        let key = TokenKey::unprefixed(TokenType::Fungible, &sym_id.to_string());
        let fungible: Handle<Fungible> = cache.read_token(db, &key)?;
        let permission = {
            let f = fungible.borrow();
            match kind {
                PermissionKind::Issue => f.issue.clone(),
                PermissionKind::Transfer => f.transfer.clone(),
                PermissionKind::Manage => f.manage.clone(),
            }
        };
        let owner_ctx = match from {
            Some(from) => OwnerContext::Ft { from },
            None => OwnerContext::None,
        };
        self.satisfied_permission(&permission, &owner_ctx, action, db, cache, ctx)
    }

    fn parse_sym_id(key: &str) -> Result<u32> {
        key.parse().map_err(|_| Error::kind(Kind::FungibleSymbolInvalid, format!("not a symbol id: {key}")))
    }

    /// Top-level entry point: checks whether `action` is authorized by the
    /// checker's signing keys. On failure, every used-key mark this call
    /// made is rolled back so a failed action never taints a sibling
    /// action's authority check within the same transaction.
    pub fn satisfied(
        &mut self,
        action: &Action,
        db: &TokenDatabase,
        cache: &mut TdbCache,
        ctx: &AuthContext,
    ) -> Result<bool> {
        let result = self.speculate(|this| this.satisfied_inner(action, db, cache, ctx));
        trace!(action = action.data.action_name(), ok = matches!(&result, Ok(true)), "authority check");
        result
    }

    fn satisfied_inner(
        &mut self,
        action: &Action,
        db: &TokenDatabase,
        cache: &mut TdbCache,
        ctx: &AuthContext,
    ) -> Result<bool> {
        match &action.data {
            ActionData::NewDomain(a) => Ok(self.mark_if_signed(&a.creator)),
            ActionData::UpdateDomain(_) => self.domain_permission(PermissionKind::Manage, action, db, cache, ctx),
            ActionData::IssueToken(_) => self.domain_permission(PermissionKind::Issue, action, db, cache, ctx),
            ActionData::Transfer(_) => self.domain_permission(PermissionKind::Transfer, action, db, cache, ctx),
            ActionData::DestroyToken(_) => self.domain_permission(PermissionKind::Transfer, action, db, cache, ctx),
            ActionData::NewGroup(a) => {
                if a.key.is_reserved() {
                    Ok(true)
                } else {
                    Ok(self.mark_if_signed(&a.key))
                }
            }
            ActionData::UpdateGroup(_) => {
                let key = TokenKey::unprefixed(TokenType::Group, action.key.as_str());
                let group: Handle<Group> = cache.read_token(db, &key)?;
                let gkey = group.borrow().key.clone();
                Ok(self.mark_if_signed(&gkey))
            }
            ActionData::NewFungible(a) => Ok(self.mark_if_signed(&a.creator)),
            ActionData::NewFungibleV1(a) => Ok(self.mark_if_signed(&a.creator)),
            ActionData::UpdFungible(a) => {
                self.fungible_permission(PermissionKind::Manage, a.sym_id, None, action, db, cache, ctx)
            }
            ActionData::UpdFungibleV1(a) => {
                self.fungible_permission(PermissionKind::Manage, a.sym_id, None, action, db, cache, ctx)
            }
            ActionData::IssueFungible(_) => {
                let sym_id = Self::parse_sym_id(action.key.as_str())?;
                self.fungible_permission(PermissionKind::Issue, sym_id, None, action, db, cache, ctx)
            }
            ActionData::TransferFt(a) => {
                let sym_id = Self::parse_sym_id(action.key.as_str())?;
                self.fungible_permission(PermissionKind::Transfer, sym_id, Some(&a.from), action, db, cache, ctx)
            }
            ActionData::RecycleFt(a) => {
                let sym_id = Self::parse_sym_id(action.key.as_str())?;
                self.fungible_permission(PermissionKind::Transfer, sym_id, Some(&a.address), action, db, cache, ctx)
            }
            ActionData::DestroyFt(a) => {
                let sym_id = Self::parse_sym_id(action.key.as_str())?;
                self.fungible_permission(PermissionKind::Transfer, sym_id, Some(&a.address), action, db, cache, ctx)
            }
            ActionData::Convert2Pegged(a) => {
                let sym_id = Self::parse_sym_id(action.key.as_str())?;
                self.fungible_permission(PermissionKind::Transfer, sym_id, Some(&a.from), action, db, cache, ctx)
            }
            ActionData::BlackAddr(_) => self.satisfied_group(ctx.root_org_group, db, cache),
            ActionData::NewSuspend(a) => Ok(self.mark_if_signed(&a.proposer)),
            ActionData::AprvSuspend(_) => Ok(true),
            ActionData::CancelSuspend(_) => {
                let key = TokenKey::unprefixed(TokenType::Suspend, action.key.as_str());
                let suspend: Handle<Suspend> = cache.read_token(db, &key)?;
                let proposer = suspend.borrow().proposer.clone();
                Ok(self.mark_if_signed(&proposer))
            }
            ActionData::ExecSuspend(a) => Ok(self.mark_if_signed(&a.executor)),
            ActionData::NewLock(a) => Ok(self.mark_if_signed(&a.proposer)),
            ActionData::AprvLock(a) => Ok(self.mark_if_signed(&a.approver)),
            ActionData::TryUnlock(a) => Ok(self.mark_if_signed(&a.executor)),
            ActionData::AddMeta(a) => match a.creator.group_name() {
                Some(name) => {
                    let name = Name::new(name.as_str())?;
                    self.satisfied_group(&name, db, cache)
                }
                None => Ok(self.mark_if_signed(&a.creator)),
            },
            ActionData::EveriPass(_) => Ok(true),
            ActionData::EveriPay(_) => Ok(true),
            ActionData::ProdVote(a) => match ctx.producers.iter().find(|(name, _)| name == &a.producer) {
                Some((_, key)) => Ok(self.mark_if_signed_key(key)),
                None => Ok(false),
            },
            ActionData::UpdSched(_) => self.satisfied_group(ctx.root_org_group, db, cache),
            ActionData::NewValidator(a) => Ok(self.mark_if_signed(&a.creator)),
            ActionData::ValiWithdraw(a) => {
                let key = TokenKey::unprefixed(TokenType::Validator, a.validator.as_str());
                let validator: Handle<Validator> = cache.read_token(db, &key)?;
                let permission = validator.borrow().withdraw.clone();
                self.satisfied_permission(&permission, &OwnerContext::None, action, db, cache, ctx)
            }
            ActionData::NewStakePool(_) => self.satisfied_group(ctx.root_org_group, db, cache),
            ActionData::UpdStakePool(_) => self.satisfied_group(ctx.root_org_group, db, cache),
            ActionData::StakeTkns(a) => Ok(self.mark_if_signed(&a.staker)),
            ActionData::UnstakeTkns(a) => Ok(self.mark_if_signed(&a.staker)),
            ActionData::ToActiveTkns(a) => Ok(self.mark_if_signed(&a.staker)),
            ActionData::RecvStkBonus(a) => {
                let key = TokenKey::unprefixed(TokenType::Validator, a.validator.as_str());
                let validator: Handle<Validator> = cache.read_token(db, &key)?;
                let signer = validator.borrow().signer.clone();
                Ok(self.mark_if_signed_key(&signer))
            }
            ActionData::SetPsvBonus(a) => {
                self.fungible_permission(PermissionKind::Manage, a.sym_id, None, action, db, cache, ctx)
            }
            ActionData::DistPsvBonus(a) => {
                self.fungible_permission(PermissionKind::Manage, a.sym_id, None, action, db, cache, ctx)
            }
            ActionData::NewScript(a) => Ok(self.mark_if_signed(&a.creator)),
            ActionData::UpdScript(_) => {
                let key = TokenKey::unprefixed(TokenType::Script, action.key.as_str());
                let script: Handle<Script> = cache.read_token(db, &key)?;
                let creator = script.borrow().creator.clone();
                Ok(self.mark_if_signed(&creator))
            }
            // System-generated only; never satisfiable by a user signature.
            ActionData::PayCharge(_) | ActionData::PayBonus(_) => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerdb_cache::TdbCache;
    use ledgerdb_codec::Encode;
    use ledgerdb_store::PutOp;
    use ledgerdb_types::{Asset, Name128, Symbol};
    use test_log::test;

    fn pk(byte: u8) -> PublicKey {
        PublicKey::from_bytes([byte; 33])
    }

    fn new_action(domain: &str, key: &str, data: ActionData) -> Action {
        Action { domain: Name::new(domain).unwrap(), key: Name128::new(key).unwrap(), data }
    }

    fn ctx<'a>(root: &'a Name, producers: &'a [(Name, PublicKey)]) -> AuthContext<'a> {
        AuthContext { root_org_group: root, producers, check_script: true }
    }

    #[test]
    fn account_authorizer_needs_matching_signature() {
        let db = TokenDatabase::open_in_memory().unwrap();
        let mut cache = TdbCache::new();
        let keys = vec![pk(1)];
        let mut checker = AuthorityChecker::new(&keys, 32, &OptimisticScriptEngine);
        let action = new_action(
            "cars",
            "car1",
            ActionData::NewDomain(ledgerdb_types::NewDomain {
                name: Name::new("cars").unwrap(),
                creator: Address::PublicKey(pk(1)),
                issue: Permission::single_key(Name::new("issue").unwrap(), Address::PublicKey(pk(1))),
                transfer: Permission::single_key(Name::new("transfer").unwrap(), Address::PublicKey(pk(1))),
                manage: Permission::single_key(Name::new("manage").unwrap(), Address::PublicKey(pk(1))),
            }),
        );
        let root = Name::new("rootorg").unwrap();
        let producers = vec![];
        assert!(checker.satisfied(&action, &db, &mut cache, &ctx(&root, &producers)).unwrap());
        assert!(checker.used_keys().get(0));
    }

    #[test]
    fn failed_check_does_not_leak_used_keys() {
        let db = TokenDatabase::open_in_memory().unwrap();
        let mut cache = TdbCache::new();
        let keys = vec![pk(1)];
        let mut checker = AuthorityChecker::new(&keys, 32, &OptimisticScriptEngine);
        let action = new_action(
            "cars",
            "car1",
            ActionData::NewDomain(ledgerdb_types::NewDomain {
                name: Name::new("cars").unwrap(),
                creator: Address::PublicKey(pk(9)),
                issue: Permission::single_key(Name::new("issue").unwrap(), Address::PublicKey(pk(9))),
                transfer: Permission::single_key(Name::new("transfer").unwrap(), Address::PublicKey(pk(9))),
                manage: Permission::single_key(Name::new("manage").unwrap(), Address::PublicKey(pk(9))),
            }),
        );
        let root = Name::new("rootorg").unwrap();
        let producers = vec![];
        assert!(!checker.satisfied(&action, &db, &mut cache, &ctx(&root, &producers)).unwrap());
        assert!(!checker.used_keys().any());
    }

    #[test]
    fn weighted_threshold_group_requires_combined_weight() {
        let mut db = TokenDatabase::open_in_memory().unwrap();
        let group = Group {
            name: Name::new("board").unwrap(),
            key: Address::Reserved,
            root: GroupNode::Branch {
                threshold: 3,
                weight: 1,
                nodes: vec![
                    GroupNode::Leaf { key: Address::PublicKey(pk(1)), weight: 2 },
                    GroupNode::Leaf { key: Address::PublicKey(pk(2)), weight: 2 },
                ],
            },
        };
        let mut buf = Vec::new();
        group.encode(&mut buf).unwrap();
        db.put_token(&TokenKey::unprefixed(TokenType::Group, "board"), buf, PutOp::Add).unwrap();

        let keys = vec![pk(1)];
        let mut cache = TdbCache::new();
        let mut checker = AuthorityChecker::new(&keys, 32, &OptimisticScriptEngine);
        let root = Name::new("rootorg").unwrap();
        assert!(!checker.satisfied_group(&Name::new("board").unwrap(), &db, &mut cache).unwrap());

        let keys2 = vec![pk(1), pk(2)];
        let mut checker2 = AuthorityChecker::new(&keys2, 32, &OptimisticScriptEngine);
        assert!(checker2.satisfied_group(&Name::new("board").unwrap(), &db, &mut cache).unwrap());
        let _ = root;
    }

    #[test]
    fn nft_transfer_requires_all_owners_to_sign() {
        let mut db = TokenDatabase::open_in_memory().unwrap();
        let domain = ledgerdb_types::Domain {
            name: Name::new("cars").unwrap(),
            creator: Address::PublicKey(pk(1)),
            create_time: 0,
            issue: Permission::single_key(Name::new("issue").unwrap(), Address::PublicKey(pk(1))),
            transfer: Permission {
                name: Name::new("transfer").unwrap(),
                threshold: 1,
                authorizers: vec![ledgerdb_types::AuthorizerWeight {
                    authorizer: AuthorizerRef::Owner,
                    weight: 1,
                }],
            },
            manage: Permission::single_key(Name::new("manage").unwrap(), Address::PublicKey(pk(1))),
            metas: vec![],
        };
        let mut buf = Vec::new();
        domain.encode(&mut buf).unwrap();
        db.put_token(&TokenKey::unprefixed(TokenType::Domain, "cars"), buf, PutOp::Add).unwrap();

        let token = Token {
            domain: Name::new("cars").unwrap(),
            name: Name128::new("car1").unwrap(),
            owner: vec![Address::PublicKey(pk(1)), Address::PublicKey(pk(2))],
            status: ledgerdb_types::TokenStatus::Normal,
            metas: vec![],
        };
        let mut buf = Vec::new();
        token.encode(&mut buf).unwrap();
        db.put_token(&TokenKey::new(TokenType::Token, Some("cars"), "car1"), buf, PutOp::Add).unwrap();

        let action = new_action(
            "cars",
            "car1",
            ActionData::Transfer(ledgerdb_types::Transfer {
                domain: Name::new("cars").unwrap(),
                name: Name128::new("car1").unwrap(),
                to: vec![Address::PublicKey(pk(3))],
                memo: String::new(),
            }),
        );
        let root = Name::new("rootorg").unwrap();
        let producers = vec![];

        let keys = vec![pk(1)];
        let mut cache = TdbCache::new();
        let mut checker = AuthorityChecker::new(&keys, 32, &OptimisticScriptEngine);
        assert!(!checker.satisfied(&action, &db, &mut cache, &ctx(&root, &producers)).unwrap());

        let keys2 = vec![pk(1), pk(2)];
        let mut cache2 = TdbCache::new();
        let mut checker2 = AuthorityChecker::new(&keys2, 32, &OptimisticScriptEngine);
        assert!(checker2.satisfied(&action, &db, &mut cache2, &ctx(&root, &producers)).unwrap());
    }

    #[test]
    fn system_actions_are_never_user_satisfiable() {
        let db = TokenDatabase::open_in_memory().unwrap();
        let mut cache = TdbCache::new();
        let keys = vec![pk(1)];
        let mut checker = AuthorityChecker::new(&keys, 32, &OptimisticScriptEngine);
        let action = Action {
            domain: Name::reserved(),
            key: Name128::new("system").unwrap(),
            data: ActionData::PayCharge(ledgerdb_types::PayCharge {
                payer: Address::PublicKey(pk(1)),
                charge: Asset::zero(Symbol::new(0, 1).unwrap()),
            }),
        };
        let root = Name::new("rootorg").unwrap();
        let producers = vec![];
        assert!(!checker.satisfied(&action, &db, &mut cache, &ctx(&root, &producers)).unwrap());
    }
}
