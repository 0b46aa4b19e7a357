//! Session-scoped write-through cache layered over [`ledgerdb_store::TokenDatabase`].
//!
//! Decodes a record at most once per session and hands out a shared handle;
//! repeat reads within the same session return the same handle rather than
//! re-decoding. Writes must reuse a handle obtained from this cache (or, for
//! `Add`, a freshly constructed one) — passing an unrelated value for an
//! already-resident key is a caller bug and is rejected with `CacheMisuse`
//! rather than silently accepted, since it would otherwise let two
//! divergent in-memory copies of the same record exist at once.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::trace;

use ledgerdb_base::{Error, Kind, Result};
use ledgerdb_codec::{decode_from_slice, Decode, Encode};
use ledgerdb_store::{AssetKey, PutOp, TokenDatabase, TokenKey};

/// A session-shared, mutable handle to a decoded record.
pub type Handle<T> = Rc<RefCell<T>>;

struct Slot {
    type_id: TypeId,
    handle: Rc<dyn Any>,
}

impl Slot {
    fn new<T: 'static>(handle: Handle<T>) -> Self {
        Slot { type_id: TypeId::of::<T>(), handle }
    }

    fn downcast<T: 'static>(&self) -> Result<Handle<T>> {
        if self.type_id != TypeId::of::<T>() {
            return Err(Error::kind(Kind::CacheMisuse, "cached record decoded at a different type"));
        }
        self.handle
            .clone()
            .downcast::<RefCell<T>>()
            .map_err(|_| Error::kind(Kind::CacheMisuse, "cached record decoded at a different type"))
    }
}

#[derive(Default)]
struct Slots {
    clean: HashMap<Vec<u8>, Slot>,
    dirty: HashMap<Vec<u8>, Slot>,
}

impl Slots {
    fn resident(&self, key: &[u8]) -> Option<&Slot> {
        self.dirty.get(key).or_else(|| self.clean.get(key))
    }

    fn promote_to_dirty<T: 'static>(&mut self, key: Vec<u8>, handle: Handle<T>) -> Result<()> {
        if let Some(existing) = self.resident(&key) {
            let existing: Handle<T> = existing.downcast()?;
            if !Rc::ptr_eq(&existing, &handle) {
                return Err(Error::kind(
                    Kind::CacheMisuse,
                    "put_token called with a different instance than the one read for this key",
                ));
            }
        }
        self.clean.remove(&key);
        self.dirty.insert(key, Slot::new(handle));
        Ok(())
    }

    fn clear(&mut self) {
        self.clean.clear();
        self.dirty.clear();
    }
}

/// One transaction's worth of cache state. Dropping it (or calling
/// [`TdbCache::rollback`]) discards every entry touched this session; the
/// next read goes back to the underlying database.
#[derive(Default)]
pub struct TdbCache {
    tokens: Slots,
    assets: Slots,
}

impl TdbCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every resident entry, clean or dirty. Call this after a
    /// savepoint rollback so the cache doesn't keep handing out handles to
    /// state the underlying database no longer has.
    pub fn rollback(&mut self) {
        self.tokens.clear();
        self.assets.clear();
    }

    pub fn read_token<T: Encode + Decode + 'static>(
        &mut self,
        db: &TokenDatabase,
        key: &TokenKey,
    ) -> Result<Handle<T>> {
        self.read_token_inner(db, key, false)?
            .ok_or_else(|| Error::kind(Kind::UnknownKey, format!("no token at key {:?}", key.key)))
    }

    pub fn lookup_token<T: 'static>(&self, key: &TokenKey) -> Option<Handle<T>> {
        self.tokens.resident(&key.to_bytes()).and_then(|slot| slot.downcast().ok())
    }

    /// `read_token` with `no_throw` semantics: `Ok(None)` instead of
    /// `UnknownKey` when the record doesn't exist.
    pub fn read_token_opt<T: Encode + Decode + 'static>(
        &mut self,
        db: &TokenDatabase,
        key: &TokenKey,
    ) -> Result<Option<Handle<T>>> {
        self.read_token_inner(db, key, true)
    }

    fn read_token_inner<T: Encode + Decode + 'static>(
        &mut self,
        db: &TokenDatabase,
        key: &TokenKey,
        no_throw: bool,
    ) -> Result<Option<Handle<T>>> {
        let kb = key.to_bytes();
        if let Some(slot) = self.tokens.resident(&kb) {
            return Ok(Some(slot.downcast()?));
        }
        let bytes = match db.read_token(key) {
            Ok(bytes) => bytes,
            Err(e) if no_throw && e.find_kind() == Some(Kind::UnknownKey) => return Ok(None),
            Err(e) => return Err(e),
        };
        let value: T = decode_from_slice(&bytes)?;
        trace!(key = ?key.key, "decoded token into cache");
        let handle = Rc::new(RefCell::new(value));
        self.tokens.clean.insert(kb, Slot::new(handle.clone()));
        Ok(Some(handle))
    }

    pub fn put_token<T: Encode + 'static>(
        &mut self,
        db: &mut TokenDatabase,
        key: &TokenKey,
        op: PutOp,
        handle: Handle<T>,
    ) -> Result<()> {
        let kb = key.to_bytes();
        self.tokens.promote_to_dirty(kb, handle.clone())?;
        let bytes = encode_handle(&handle)?;
        db.put_token(key, bytes, op)
    }

    pub fn read_asset<T: Encode + Decode + 'static>(
        &mut self,
        db: &TokenDatabase,
        key: &AssetKey,
    ) -> Result<Option<Handle<T>>> {
        let kb = key.to_bytes();
        if let Some(slot) = self.assets.resident(&kb) {
            return Ok(Some(slot.downcast()?));
        }
        let bytes = match db.read_asset(key)? {
            Some(bytes) => bytes,
            None => return Ok(None),
        };
        let value: T = decode_from_slice(&bytes)?;
        let handle = Rc::new(RefCell::new(value));
        self.assets.clean.insert(kb, Slot::new(handle.clone()));
        Ok(Some(handle))
    }

    pub fn put_asset<T: Encode + 'static>(
        &mut self,
        db: &mut TokenDatabase,
        key: &AssetKey,
        handle: Handle<T>,
    ) -> Result<()> {
        let kb = key.to_bytes();
        self.assets.promote_to_dirty(kb, handle.clone())?;
        let bytes = encode_handle(&handle)?;
        db.put_asset(key, bytes)
    }
}

fn encode_handle<T: Encode>(handle: &Handle<T>) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    handle.borrow().encode(&mut buf).map_err(Error::new)?;
    Ok(buf)
}
