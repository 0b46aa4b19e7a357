//! `newgroup`, `updategroup`.

use ledgerdb_base::{Error, Kind, Result};
use ledgerdb_cache::Handle;
use ledgerdb_store::{PutOp, TokenKey, TokenType};
use ledgerdb_types::{Group, NewGroup, UpdateGroup};

use super::validate_group_node;
use crate::HandlerContext;

fn group_key(name: &str) -> TokenKey {
    TokenKey::unprefixed(TokenType::Group, name)
}

pub fn new_group(ctx: &mut HandlerContext, a: &NewGroup) -> Result<()> {
    validate_group_node(&a.root)?;
    let key = group_key(a.name.as_str());
    if ctx.db.exists_token(&key)? {
        return Err(Error::kind(Kind::GroupDuplicate, format!("group {:?} already exists", a.name.as_str())));
    }
    let group = Group { name: a.name.clone(), key: a.key.clone(), root: a.root.clone() };
    let handle: Handle<Group> = std::rc::Rc::new(std::cell::RefCell::new(group));
    ctx.cache.put_token(ctx.db, &key, PutOp::Add, handle)
}

pub fn update_group(ctx: &mut HandlerContext, a: &UpdateGroup) -> Result<()> {
    validate_group_node(&a.root)?;
    let key = group_key(a.name.as_str());
    let handle: Handle<Group> = ctx.cache.read_token(ctx.db, &key)?;
    {
        let mut group = handle.borrow_mut();
        group.key = a.key.clone();
        group.root = a.root.clone();
    }
    ctx.cache.put_token(ctx.db, &key, PutOp::Update, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerdb_cache::TdbCache;
    use ledgerdb_store::TokenDatabase;
    use ledgerdb_types::{Address, GroupNode, Name, PublicKey};
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
    fn group_with_unreachable_threshold_rejected() {
        let mut db = TokenDatabase::open_in_memory().unwrap();
        let mut cache = TdbCache::new();
        let env = env();
        let mut generated = Vec::new();
        let mut hctx = HandlerContext {
            db: &mut db,
            cache: &mut cache,
            env: &env,
            generated: &mut generated,
            link_keys: &[],
        };
        let root = GroupNode::Branch {
            threshold: 10,
            weight: 1,
            nodes: vec![GroupNode::Leaf { key: Address::PublicKey(PublicKey::from_bytes([1; 33])), weight: 1 }],
        };
        let a = NewGroup { name: Name::new("mygroup").unwrap(), key: Address::Reserved, root };
        let err = new_group(&mut hctx, &a).unwrap_err();
        assert_eq!(err.find_kind(), Some(Kind::InvalidGroupStructure));
    }

    /// Builds a chain of nested branches `depth` levels deep, each with a
    /// single child, bottoming out in a leaf.
    fn nested_branch(depth: u32, leaf_key: u8) -> GroupNode {
        let mut node = GroupNode::Leaf { key: Address::PublicKey(PublicKey::from_bytes([leaf_key; 33])), weight: 1 };
        for _ in 1..depth {
            node = GroupNode::Branch { threshold: 1, weight: 1, nodes: vec![node] };
        }
        node
    }

    #[test]
    fn group_depth_five_accepted_six_rejected() {
        let mut db = TokenDatabase::open_in_memory().unwrap();
        let mut cache = TdbCache::new();
        let env = env();
        let mut generated = Vec::new();
        let mut hctx = HandlerContext {
            db: &mut db,
            cache: &mut cache,
            env: &env,
            generated: &mut generated,
            link_keys: &[],
        };
        let ok = NewGroup { name: Name::new("depth5").unwrap(), key: Address::Reserved, root: nested_branch(5, 1) };
        new_group(&mut hctx, &ok).unwrap();

        let bad = NewGroup { name: Name::new("depth6").unwrap(), key: Address::Reserved, root: nested_branch(6, 1) };
        let err = new_group(&mut hctx, &bad).unwrap_err();
        assert_eq!(err.find_kind(), Some(Kind::InvalidGroupStructure));
    }

    #[test]
    fn duplicate_leaf_key_along_one_branch_rejected() {
        let mut db = TokenDatabase::open_in_memory().unwrap();
        let mut cache = TdbCache::new();
        let env = env();
        let mut generated = Vec::new();
        let mut hctx = HandlerContext {
            db: &mut db,
            cache: &mut cache,
            env: &env,
            generated: &mut generated,
            link_keys: &[],
        };
        let key = Address::PublicKey(PublicKey::from_bytes([7; 33]));
        let root = GroupNode::Branch {
            threshold: 1,
            weight: 1,
            nodes: vec![
                GroupNode::Leaf { key: key.clone(), weight: 1 },
                GroupNode::Branch {
                    threshold: 1,
                    weight: 1,
                    nodes: vec![GroupNode::Leaf { key, weight: 1 }],
                },
            ],
        };
        let a = NewGroup { name: Name::new("dupkey").unwrap(), key: Address::Reserved, root };
        let err = new_group(&mut hctx, &a).unwrap_err();
        assert_eq!(err.find_kind(), Some(Kind::InvalidGroupStructure));
    }

    #[test]
    fn new_group_then_update_replaces_root() {
        let mut db = TokenDatabase::open_in_memory().unwrap();
        let mut cache = TdbCache::new();
        let env = env();
        let mut generated = Vec::new();
        let mut hctx = HandlerContext {
            db: &mut db,
            cache: &mut cache,
            env: &env,
            generated: &mut generated,
            link_keys: &[],
        };
        let key = Address::PublicKey(PublicKey::from_bytes([2; 33]));
        let root = GroupNode::Leaf { key: key.clone(), weight: 1 };
        let name = Name::new("mygroup").unwrap();
        new_group(&mut hctx, &NewGroup { name: name.clone(), key: Address::Reserved, root: root.clone() }).unwrap();
        let new_root = GroupNode::Branch { threshold: 1, weight: 1, nodes: vec![GroupNode::Leaf { key, weight: 2 }] };
        update_group(&mut hctx, &UpdateGroup { name, key: Address::Reserved, root: new_root }).unwrap();
    }
}
