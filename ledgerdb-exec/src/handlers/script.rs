//! `newscript`, `updscript`.

use ledgerdb_base::{Error, Kind, Result};
use ledgerdb_cache::Handle;
use ledgerdb_store::{PutOp, TokenKey, TokenType};
use ledgerdb_types::{NewScript, Script, UpdScript};

use crate::HandlerContext;

fn script_key(name: &str) -> TokenKey {
    TokenKey::unprefixed(TokenType::Script, name)
}

pub fn new_script(ctx: &mut HandlerContext, a: &NewScript) -> Result<()> {
    let key = script_key(a.name.as_str());
    if ctx.db.exists_token(&key)? {
        return Err(Error::kind(Kind::ScriptDuplicate, format!("script {:?} already exists", a.name.as_str())));
    }
    let script = Script { name: a.name.clone(), content: a.content.clone(), creator: a.creator.clone() };
    let handle: Handle<Script> = std::rc::Rc::new(std::cell::RefCell::new(script));
    ctx.cache.put_token(ctx.db, &key, PutOp::Add, handle)
}

pub fn upd_script(ctx: &mut HandlerContext, a: &UpdScript) -> Result<()> {
    let key = script_key(a.name.as_str());
    let handle: Handle<Script> = ctx.cache.read_token(ctx.db, &key)?;
    handle.borrow_mut().content = a.content.clone();
    ctx.cache.put_token(ctx.db, &key, PutOp::Update, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerdb_cache::TdbCache;
    use ledgerdb_store::TokenDatabase;
    use ledgerdb_types::{Address, Name};
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
    fn update_replaces_content() {
        let mut db = TokenDatabase::open_in_memory().unwrap();
        let mut cache = TdbCache::new();
        let env = env();
        let mut generated = Vec::new();
        let mut hctx =
            HandlerContext { db: &mut db, cache: &mut cache, env: &env, generated: &mut generated, link_keys: &[] };
        let name = Name::new("myscript").unwrap();
        new_script(&mut hctx, &NewScript { name: name.clone(), creator: Address::Reserved, content: vec![1, 2] }).unwrap();
        upd_script(&mut hctx, &UpdScript { name: name.clone(), content: vec![9] }).unwrap();
        let key = script_key(name.as_str());
        let handle: Handle<Script> = hctx.cache.read_token(hctx.db, &key).unwrap();
        assert_eq!(handle.borrow().content, vec![9]);
    }
}
