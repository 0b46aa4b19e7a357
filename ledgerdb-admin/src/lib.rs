//! Chain configuration and process-level logging setup: the layer between
//! the library crates (`ledgerdb-exec`, `ledgerdb-txn`, ...), which never
//! touch the filesystem or a logging backend directly, and the controller
//! binary that does.

mod config;
mod logging;
mod prodvote;

pub use config::ChainConfig;
pub use prodvote::{apply_vote, quorum_threshold};

pub use logging::init as init_logging;
