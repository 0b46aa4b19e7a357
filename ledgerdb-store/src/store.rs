use std::collections::BTreeMap;
use std::path::Path;

use redb::{Database, ReadableTable, TableDefinition};
use tracing::debug;

use ledgerdb_base::{Error, Kind, Result};
use ledgerdb_codec::{read_uvarint, write_uvarint, Decode, Encode};

use crate::ioutil::{Reader, Writer};
use crate::key::{AssetKey, TokenKey};

const TOKENS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("tokens");
const ASSETS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("assets");

/// How a `put_token` call should treat an existing value at the key.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PutOp {
    /// Fail with `Kind::DupKey` if the key already has a value.
    Add,
    /// Fail with `Kind::UnknownKey` if the key has no value yet.
    Update,
    /// Insert or overwrite unconditionally.
    Put,
}

/// One level of the token database's savepoint stack: a sparse overlay
/// on top of whatever is durably committed (or the frame below). `None`
/// values are tombstones recording a delete made within this frame, so a
/// read doesn't fall through to an older value that should be hidden.
#[derive(Default)]
struct Savepoint {
    seq: u64,
    tokens: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
    assets: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

/// The token database: a durable `redb`-backed key space plus a stack of
/// in-memory savepoint overlays. Writes land in the top overlay (or
/// directly in `redb` if the stack is empty); `squash` folds the top
/// overlay into the one below it, and folding the last remaining overlay
/// commits it to `redb` — "squash to depth 0 commits", per the token
/// database's durability contract.
pub struct TokenDatabase {
    db: Database,
    savepoints: Vec<Savepoint>,
}

impl TokenDatabase {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Database::create(path.as_ref())?;
        Self::from_database(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::from_database(db)
    }

    fn from_database(db: Database) -> Result<Self> {
        // Touch both tables once so a fresh database always has them,
        // rather than creating them lazily on first write.
        let txn = db.begin_write()?;
        {
            txn.open_table(TOKENS)?;
            txn.open_table(ASSETS)?;
        }
        txn.commit()?;
        Ok(TokenDatabase { db, savepoints: Vec::new() })
    }

    // --- savepoints -----------------------------------------------------

    pub fn latest_savepoint_seq(&self) -> Option<u64> {
        self.savepoints.last().map(|sp| sp.seq)
    }

    pub fn add_savepoint(&mut self, seq: u64) -> Result<()> {
        if let Some(top) = self.savepoints.last() {
            if seq <= top.seq {
                return Err(Error::kind(
                    Kind::NoSavepoint,
                    format!("savepoint seq {seq} does not exceed current {}", top.seq),
                ));
            }
        }
        self.savepoints.push(Savepoint { seq, ..Default::default() });
        Ok(())
    }

    /// Discards the most recent savepoint's writes entirely (undo).
    pub fn rollback_to_latest_savepoint(&mut self) -> Result<()> {
        if self.savepoints.pop().is_none() {
            return Err(Error::kind(Kind::NoSavepoint, "no savepoint to roll back to"));
        }
        Ok(())
    }

    /// Folds the most recent savepoint into the one beneath it (or commits
    /// it to `redb` if it was the only one left).
    pub fn squash(&mut self) -> Result<()> {
        let top = match self.savepoints.pop() {
            Some(sp) => sp,
            None => return Err(Error::kind(Kind::NoSavepoint, "no savepoint to squash")),
        };
        match self.savepoints.last_mut() {
            Some(below) => {
                for (k, v) in top.tokens {
                    below.tokens.insert(k, v);
                }
                for (k, v) in top.assets {
                    below.assets.insert(k, v);
                }
            }
            None => self.commit_frame(top)?,
        }
        Ok(())
    }

    fn commit_frame(&self, frame: Savepoint) -> Result<()> {
        debug!(seq = frame.seq, "committing savepoint to durable store");
        let txn = self.db.begin_write()?;
        {
            let mut tokens = txn.open_table(TOKENS)?;
            for (k, v) in frame.tokens {
                match v {
                    Some(bytes) => {
                        tokens.insert(k.as_slice(), bytes.as_slice())?;
                    }
                    None => {
                        tokens.remove(k.as_slice())?;
                    }
                }
            }
            let mut assets = txn.open_table(ASSETS)?;
            for (k, v) in frame.assets {
                match v {
                    Some(bytes) => {
                        assets.insert(k.as_slice(), bytes.as_slice())?;
                    }
                    None => {
                        assets.remove(k.as_slice())?;
                    }
                }
            }
        }
        txn.commit()?;
        Ok(())
    }

    // --- tokens -----------------------------------------------------

    pub fn exists_token(&self, key: &TokenKey) -> Result<bool> {
        Ok(self.read_token_bytes(key)?.is_some())
    }

    pub fn read_token(&self, key: &TokenKey) -> Result<Vec<u8>> {
        self.read_token_bytes(key)?
            .ok_or_else(|| Error::kind(Kind::UnknownKey, format!("no token at key {:?}", key.key)))
    }

    fn read_token_bytes(&self, key: &TokenKey) -> Result<Option<Vec<u8>>> {
        let kb = key.to_bytes();
        for sp in self.savepoints.iter().rev() {
            if let Some(v) = sp.tokens.get(&kb) {
                return Ok(v.clone());
            }
        }
        self.read_committed(TOKENS, &kb)
    }

    pub fn put_token(&mut self, key: &TokenKey, value: Vec<u8>, op: PutOp) -> Result<()> {
        let exists = self.exists_token(key)?;
        match op {
            PutOp::Add if exists => {
                return Err(Error::kind(Kind::DupKey, format!("token already exists at {:?}", key.key)))
            }
            PutOp::Update if !exists => {
                return Err(Error::kind(Kind::UnknownKey, format!("no token to update at {:?}", key.key)))
            }
            _ => {}
        }
        self.write_token_bytes(key, Some(value))
    }

    pub fn put_tokens(&mut self, items: Vec<(TokenKey, Vec<u8>, PutOp)>) -> Result<()> {
        for (key, value, op) in items {
            self.put_token(&key, value, op)?;
        }
        Ok(())
    }

    fn write_token_bytes(&mut self, key: &TokenKey, value: Option<Vec<u8>>) -> Result<()> {
        let kb = key.to_bytes();
        match self.savepoints.last_mut() {
            Some(top) => {
                top.tokens.insert(kb, value);
                Ok(())
            }
            None => {
                // No open savepoint: write straight through to `redb`.
                let frame = Savepoint { seq: 0, tokens: BTreeMap::from([(kb, value)]), assets: BTreeMap::new() };
                self.commit_frame(frame)
            }
        }
    }

    // --- assets -----------------------------------------------------

    pub fn exists_asset(&self, key: &AssetKey) -> Result<bool> {
        Ok(self.read_asset(key)?.is_some())
    }

    pub fn read_asset(&self, key: &AssetKey) -> Result<Option<Vec<u8>>> {
        let kb = key.to_bytes();
        for sp in self.savepoints.iter().rev() {
            if let Some(v) = sp.assets.get(&kb) {
                return Ok(v.clone());
            }
        }
        self.read_committed(ASSETS, &kb)
    }

    pub fn put_asset(&mut self, key: &AssetKey, value: Vec<u8>) -> Result<()> {
        let kb = key.to_bytes();
        match self.savepoints.last_mut() {
            Some(top) => {
                top.assets.insert(kb, Some(value));
            }
            None => {
                let frame = Savepoint { seq: 0, tokens: BTreeMap::new(), assets: BTreeMap::from([(kb, Some(value))]) };
                self.commit_frame(frame)?;
            }
        }
        Ok(())
    }

    fn read_committed(&self, table_def: TableDefinition<&[u8], &[u8]>, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(table_def)?;
        Ok(table.get(key)?.map(|guard| guard.value().to_vec()))
    }

    // --- snapshots ----------------------------------------------------

    /// Writes every committed `(key, value)` pair from both tables.
    /// Requires the savepoint stack be empty — a snapshot captures durable
    /// state, not in-flight speculative writes.
    pub fn snapshot_write<W: Writer>(&self, w: &mut W) -> Result<()> {
        if !self.savepoints.is_empty() {
            return Err(Error::kind(
                Kind::SnapshotFailure,
                "cannot snapshot with open savepoints",
            ));
        }
        let txn = self.db.begin_read()?;
        for table_def in [TOKENS, ASSETS] {
            let table = txn.open_table(table_def)?;
            let len = table.len()?;
            write_uvarint(w, len).map_err(|e| Error::new_kind(Kind::SnapshotFailure, e))?;
            for entry in table.iter()? {
                let (k, v) = entry?;
                k.value().to_vec().encode(w).map_err(|e| Error::new_kind(Kind::SnapshotFailure, e))?;
                v.value().to_vec().encode(w).map_err(|e| Error::new_kind(Kind::SnapshotFailure, e))?;
            }
        }
        Ok(())
    }

    /// Replaces the durable store's contents with a previously written
    /// snapshot. The savepoint stack must also be empty here: a snapshot
    /// load is a whole-database replace, not a layered write.
    pub fn snapshot_read<R: Reader>(&mut self, r: &mut R) -> Result<()> {
        if !self.savepoints.is_empty() {
            return Err(Error::kind(Kind::SnapshotFailure, "cannot load snapshot with open savepoints"));
        }
        let txn = self.db.begin_write()?;
        {
            let mut tokens = txn.open_table(TOKENS)?;
            let len = read_uvarint(r).map_err(|e| Error::new_kind(Kind::SnapshotFailure, e))?;
            for _ in 0..len {
                let k = Vec::<u8>::decode(r)?;
                let v = Vec::<u8>::decode(r)?;
                tokens.insert(k.as_slice(), v.as_slice())?;
            }
            let mut assets = txn.open_table(ASSETS)?;
            let len = read_uvarint(r).map_err(|e| Error::new_kind(Kind::SnapshotFailure, e))?;
            for _ in 0..len {
                let k = Vec::<u8>::decode(r)?;
                let v = Vec::<u8>::decode(r)?;
                assets.insert(k.as_slice(), v.as_slice())?;
            }
        }
        txn.commit()?;
        Ok(())
    }
}

impl From<redb::DatabaseError> for Error {
    fn from(e: redb::DatabaseError) -> Error {
        Error::new_kind(Kind::SnapshotFailure, e)
    }
}
impl From<redb::TransactionError> for Error {
    fn from(e: redb::TransactionError) -> Error {
        Error::new_kind(Kind::SnapshotFailure, e)
    }
}
impl From<redb::TableError> for Error {
    fn from(e: redb::TableError) -> Error {
        Error::new_kind(Kind::SnapshotFailure, e)
    }
}
impl From<redb::StorageError> for Error {
    fn from(e: redb::StorageError) -> Error {
        Error::new_kind(Kind::SnapshotFailure, e)
    }
}
impl From<redb::CommitError> for Error {
    fn from(e: redb::CommitError) -> Error {
        Error::new_kind(Kind::SnapshotFailure, e)
    }
}
