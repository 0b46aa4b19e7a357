//! Process-level wiring only: load the chain configuration, install the
//! logging subscriber, open the token database, and drain a block source.
//! Everything about *where blocks come from* — consensus, P2P delivery,
//! fork choice — is out of scope here (spec §3 non-goals); this binary
//! reads hex-encoded, newline-delimited blocks from a file or stdin, which
//! is enough to drive the controller end to end without inventing a
//! networking stack this workspace has no other use for.
//!
//! `--snapshot-in`/`--snapshot-out` restore and save the token database
//! around the block loop, so a restart doesn't have to replay the whole
//! block source from scratch.

use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use tracing::{error, info, warn};

use ledgerdb::{Block, Controller, TransactionOutcome};
use ledgerdb_admin::ChainConfig;
use ledgerdb_base::Result;
use ledgerdb_codec::decode_from_slice;
use ledgerdb_store::{FileReader, FileWriter, TokenDatabase};

struct Args {
    config_path: Option<PathBuf>,
    db_path: Option<PathBuf>,
    blocks_path: Option<PathBuf>,
    snapshot_in: Option<PathBuf>,
    snapshot_out: Option<PathBuf>,
}

fn parse_args() -> Args {
    let mut args =
        Args { config_path: None, db_path: None, blocks_path: None, snapshot_in: None, snapshot_out: None };
    let mut it = std::env::args().skip(1);
    while let Some(flag) = it.next() {
        match flag.as_str() {
            "--config" => args.config_path = it.next().map(PathBuf::from),
            "--db" => args.db_path = it.next().map(PathBuf::from),
            "--blocks" => args.blocks_path = it.next().map(PathBuf::from),
            "--snapshot-in" => args.snapshot_in = it.next().map(PathBuf::from),
            "--snapshot-out" => args.snapshot_out = it.next().map(PathBuf::from),
            other => warn!(flag = other, "ignoring unrecognized argument"),
        }
    }
    args
}

fn main() -> Result<()> {
    ledgerdb_admin::init_logging();
    let args = parse_args();

    let config = match &args.config_path {
        Some(path) => ChainConfig::load(path)?,
        None => ChainConfig::default(),
    };
    let db = match &args.db_path {
        Some(path) => TokenDatabase::open(path)?,
        None => TokenDatabase::open_in_memory()?,
    };
    let mut controller = Controller::new(db, config);

    if let Some(path) = &args.snapshot_in {
        let mut snapshot = FileReader::try_open_existing(path.clone())?;
        let header = controller.snapshot_read(&mut snapshot)?;
        info!(block_num = header.block_num, path = %path.display(), "restored token database from snapshot");
    }

    let reader: Box<dyn BufRead> = match &args.blocks_path {
        Some(path) => Box::new(BufReader::new(std::fs::File::open(path)?)),
        None => Box::new(BufReader::new(std::io::stdin())),
    };

    let mut applied_blocks = 0u64;
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let bytes = match hex_decode(line) {
            Ok(bytes) => bytes,
            Err(err) => {
                error!(error = %err, "malformed block line, skipping");
                continue;
            }
        };
        let block: Block = decode_from_slice(&bytes)?;
        let receipts = controller.apply_block(&block)?;
        let rejected = receipts.rejected_count();
        for outcome in &receipts.outcomes {
            if let TransactionOutcome::Rejected { kind, message } = outcome {
                warn!(?kind, message = %message, "transaction rejected within block");
            }
        }
        controller.commit_block()?;
        applied_blocks += 1;
        info!(
            block_num = block.header.block_num,
            applied = receipts.outcomes.len() - rejected,
            rejected,
            total_blocks = applied_blocks,
            "block committed"
        );
    }

    info!(total_blocks = applied_blocks, "block source exhausted");

    if let Some(path) = &args.snapshot_out {
        let mut snapshot = FileWriter::try_create_non_existing(path.clone())?;
        controller.snapshot_write(&mut snapshot)?;
        info!(path = %path.display(), "wrote token database snapshot");
    }

    Ok(())
}

fn hex_decode(s: &str) -> std::result::Result<Vec<u8>, String> {
    if s.len() % 2 != 0 {
        return Err("odd-length hex string".to_string());
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).map_err(|e| e.to_string()))
        .collect()
}
