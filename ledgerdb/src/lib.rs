//! The controller: the single entry point that turns a decoded block into
//! token database mutations. It owns no consensus logic of its own — a
//! caller (the binary's block-source loop, or a test) decides what counts
//! as the next block and when a block becomes irreversible — but it is the
//! only thing in this workspace that knows how to apply one, roll back a
//! rejected speculative block, or snapshot chain state to and from a byte
//! stream.

mod block;

pub use block::{Block, BlockHeader};

use tracing::{debug, info, warn};

use ledgerdb_admin::ChainConfig;
use ledgerdb_auth::{AuthContext, OptimisticScriptEngine, ScriptEngine};
use ledgerdb_base::{Error, Kind, Result};
use ledgerdb_cache::TdbCache;
use ledgerdb_codec::{Decode, Encode};
use ledgerdb_exec::ExecutionContext;
use ledgerdb_store::{Reader, TokenDatabase, Writer};
use ledgerdb_txn::{HeadBlockInfo, Receipt, TransactionContext};
use ledgerdb_types::{Name, PublicKey};

/// What became of one transaction in a block. A failure never aborts the
/// block it was delivered in — see `Controller::apply_block`.
#[derive(Debug)]
pub enum TransactionOutcome {
    Applied(Receipt),
    Rejected { kind: Option<Kind>, message: String },
}

/// The accumulated outcome of applying every transaction in a block, in
/// delivered order.
#[derive(Debug, Default)]
pub struct BlockReceipts {
    pub outcomes: Vec<TransactionOutcome>,
}

impl BlockReceipts {
    pub fn total_charge(&self) -> u64 {
        self.outcomes
            .iter()
            .map(|o| match o {
                TransactionOutcome::Applied(r) => r.charge,
                TransactionOutcome::Rejected { .. } => 0,
            })
            .sum()
    }

    pub fn rejected_count(&self) -> usize {
        self.outcomes.iter().filter(|o| matches!(o, TransactionOutcome::Rejected { .. })).count()
    }
}

/// Orchestrates the token database, its session cache, and the governing
/// chain configuration across a sequence of blocks. One `Controller`
/// corresponds to one chain; neither `TokenDatabase` nor `TdbCache` are
/// `Sync`, so a deployment that needs concurrent replicas runs one
/// controller per replica rather than sharing one across threads.
pub struct Controller {
    db: TokenDatabase,
    cache: TdbCache,
    exec: ExecutionContext,
    script_engine: Box<dyn ScriptEngine>,
    config: ChainConfig,
    schedule: Vec<Name>,
    producers: Vec<(Name, PublicKey)>,
    current_header: Option<BlockHeader>,
}

impl Controller {
    pub fn new(db: TokenDatabase, config: ChainConfig) -> Self {
        Controller {
            db,
            cache: TdbCache::new(),
            exec: ExecutionContext::new(),
            script_engine: Box::new(OptimisticScriptEngine),
            config,
            schedule: Vec::new(),
            producers: Vec::new(),
            current_header: None,
        }
    }

    /// Swaps in a non-optimistic script filter engine, e.g. one backed by a
    /// real embedded interpreter. The default accepts every `script`
    /// authorizer unconditionally.
    pub fn with_script_engine(mut self, engine: Box<dyn ScriptEngine>) -> Self {
        self.script_engine = engine;
        self
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ChainConfig {
        &mut self.config
    }

    /// Installs the active producer schedule, used by `updsched`/`prodvote`
    /// authority checks. `producers` pairs each scheduled producer's name
    /// with the key it currently signs blocks with.
    pub fn set_schedule(&mut self, schedule: Vec<Name>, producers: Vec<(Name, PublicKey)>) {
        self.schedule = schedule;
        self.producers = producers;
    }

    pub fn schedule(&self) -> &[Name] {
        &self.schedule
    }

    /// Opens a block-level savepoint and applies every transaction in
    /// `block` against it in delivered order, in a fresh `TransactionContext`
    /// built from the controller's current chain configuration.
    ///
    /// A transaction failure rolls back only that transaction (the
    /// `TransactionContext` brackets it with its own nested savepoint) and
    /// is recorded as a rejected outcome; the block-level savepoint remains
    /// open and later transactions still apply. The caller decides what to
    /// do with the result: `commit_block` to make it irreversible,
    /// `discard_block` to throw the whole speculative block away.
    pub fn apply_block(&mut self, block: &Block) -> Result<BlockReceipts> {
        let seq = self.db.latest_savepoint_seq().map(|s| s + 1).unwrap_or(0);
        self.db.add_savepoint(seq)?;
        self.current_header = Some(block.header.clone());

        let env = self.config.exec_env(block.header.timestamp);
        let head = HeadBlockInfo {
            block_num: block.header.block_num,
            block_prefix: block.header.block_prefix,
            block_time: block.header.timestamp,
        };
        let charges = self.config.charge_schedule();
        let auth_ctx = AuthContext { root_org_group: &env.root_org_group, producers: &self.producers, check_script: true };
        let txctx = TransactionContext {
            exec: &self.exec,
            env: &env,
            charges: &charges,
            auth_ctx: &auth_ctx,
            script_engine: self.script_engine.as_ref(),
            max_recursion_depth: self.config.max_recursion_depth,
            charge_free_mode: self.config.charge_free_mode,
        };

        let mut receipts = BlockReceipts::default();
        for trx in &block.transactions {
            match txctx.apply(&mut self.db, &mut self.cache, &head, trx) {
                Ok(receipt) => receipts.outcomes.push(TransactionOutcome::Applied(receipt)),
                Err(err) => {
                    receipts.outcomes.push(TransactionOutcome::Rejected { kind: err.find_kind(), message: err.to_string() });
                }
            }
        }
        info!(
            block_num = block.header.block_num,
            applied = receipts.outcomes.len() - receipts.rejected_count(),
            rejected = receipts.rejected_count(),
            "block applied speculatively"
        );
        Ok(receipts)
    }

    /// Marks the most recently applied block irreversible: squashes its
    /// savepoint into whatever sits beneath it, or commits to the durable
    /// store if it was the only one open.
    pub fn commit_block(&mut self) -> Result<()> {
        self.db.squash()?;
        debug!("block savepoint squashed");
        Ok(())
    }

    /// Discards the most recently applied block entirely, as if it had
    /// never been delivered.
    pub fn discard_block(&mut self) -> Result<()> {
        self.db.rollback_to_latest_savepoint()?;
        self.cache.rollback();
        warn!("speculative block discarded");
        Ok(())
    }

    /// Serialises the current block header together with the token
    /// database's committed state. Fails with `SnapshotFailure` if any
    /// speculative block is still open — callers must `commit_block` or
    /// `discard_block` first.
    pub fn snapshot_write<W: Writer>(&self, w: &mut W) -> Result<()> {
        let header =
            self.current_header.clone().ok_or_else(|| Error::kind(Kind::SnapshotFailure, "no block has been applied yet"))?;
        header.encode(w).map_err(|err| Error::new_kind(Kind::SnapshotFailure, err))?;
        self.db.snapshot_write(w)
    }

    /// The inverse of `snapshot_write`: replaces this controller's token
    /// database contents and restores the header the snapshot was taken
    /// against, returning it.
    pub fn snapshot_read<R: Reader>(&mut self, r: &mut R) -> Result<BlockHeader> {
        let header = BlockHeader::decode(r).map_err(|err| Error::new_kind(Kind::SnapshotFailure, err))?;
        self.db.snapshot_read(r)?;
        self.cache.rollback();
        self.current_header = Some(header.clone());
        Ok(header)
    }
}
