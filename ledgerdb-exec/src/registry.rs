//! The name+version registry backing [`crate::ExecutionContext`].

use ledgerdb_base::{Error, Kind, Result};
use ledgerdb_types::Action;

/// `(action name, versions accepted at that name)`, in a fixed order so
/// [`ExecutionContext::index_of`] returns a stable small integer for a
/// given build — useful as a compact discriminant in logs and metrics
/// without committing to it as a wire format.
const ACTIONS: &[(&str, &[u32])] = &[
    ("newdomain", &[2]),
    ("updatedomain", &[2]),
    ("issuetoken", &[2]),
    ("transfer", &[2]),
    ("destroytoken", &[2]),
    ("newgroup", &[2]),
    ("updategroup", &[2]),
    ("newfungible", &[1, 2]),
    ("updfungible", &[1, 2]),
    ("issuefungible", &[2]),
    ("transferft", &[2]),
    ("recycleft", &[2]),
    ("destroyft", &[2]),
    ("jmzk2pjmzk", &[2]),
    ("blackaddr", &[2]),
    ("newsuspend", &[2]),
    ("aprvsuspend", &[2]),
    ("cancelsuspend", &[2]),
    ("execsuspend", &[2]),
    ("newlock", &[2]),
    ("aprvlock", &[2]),
    ("tryunlock", &[2]),
    ("addmeta", &[2]),
    ("everipass", &[2]),
    ("everipay", &[2]),
    ("prodvote", &[2]),
    ("updsched", &[2]),
    ("newvalidator", &[2]),
    ("valiwithdraw", &[2]),
    ("newstakepool", &[2]),
    ("updstakepool", &[2]),
    ("staketkns", &[2]),
    ("unstaketkns", &[2]),
    ("toactivetkns", &[2]),
    ("recvstkbonus", &[2]),
    ("setpsvbonus", &[2]),
    ("distpsvbonus", &[2]),
    ("newscript", &[2]),
    ("updscript", &[2]),
    ("paycharge", &[2]),
    ("paybonus", &[2]),
];

/// A name+version dispatch table: `action_name()`/`version()` on a
/// decoded action identify which handler runs, and this table is the
/// record of which (name, version) pairs are actually wired up.
///
/// Built fresh per chain instance rather than a `static` — a future
/// hard fork could register a name at a new version without touching
/// this file's layout, by swapping in a different table at startup.
pub struct ExecutionContext {
    actions: &'static [(&'static str, &'static [u32])],
}

impl Default for ExecutionContext {
    fn default() -> Self {
        ExecutionContext { actions: ACTIONS }
    }
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// The table position of `name`, stable for the lifetime of this
    /// table. `None` if `name` isn't registered.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.actions.iter().position(|(n, _)| *n == name)
    }

    pub(crate) fn validate(&self, action: &Action) -> Result<()> {
        let name = action.data.action_name();
        let version = action.data.version();
        match self.actions.iter().find(|(n, _)| *n == name) {
            None => Err(Error::kind(Kind::UnknownAction, format!("unknown action {name:?}"))),
            Some((_, versions)) if !versions.contains(&version) => Err(Error::kind(
                Kind::InvalidActionVersion,
                format!("action {name:?} has no handler for version {version}"),
            )),
            Some(_) => Ok(()),
        }
    }
}
