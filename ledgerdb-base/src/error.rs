// We want a few things here:
// 1. A way to create a new error with a backtrace
// 2. A way to centralize setting a breakpoint to trap any error in the system fairly soon
//    after it's created (or at least when it's propagated from a library we use back to us)
// 3. Same but for logging / emitting error messages into the tracing/logging system
// 4. A flat tag (`Kind`) callers can match on, standing in for a deep exception
//    hierarchy: the transaction context only ever needs to know "fail the tx
//    and report this category", never a concrete type per failure site.

use std::borrow::Cow;
use std::fmt;

use backtrace_error::DynBacktraceError;
use tracing::error;

#[cfg(test)]
use test_log::test;

/// Coarse grouping of [`Kind`]. Stands in for the source's per-subsystem
/// exception base classes (`database_exception`, `authorization_exception`,
/// etc. in `exceptions.hpp`) without needing a distinct type per level.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Category {
    Structural,
    Tdb,
    Authorization,
    Domain,
    Token,
    Group,
    Fungible,
    Suspend,
    Lock,
    Meta,
    Bonus,
    Staking,
    Script,
    Link,
    Charge,
    Producer,
    Transaction,
    Misc,
}

/// One variant per condition the core can report, flattened from the
/// source's per-category derived exceptions.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Kind {
    // Structural / codec
    EncodeError,
    DecodeTruncated,
    DecodeTrailingBytes,
    DecodeBadDiscriminant,
    DecodeOversize,
    InvalidType,
    RecursionLimit,
    DeadlineExceeded,

    // Token database
    DupKey,
    UnknownKey,
    NoSavepoint,
    CacheMisuse,
    SnapshotFailure,

    // Authorization
    UnsatisfiedAuthorization,
    DuplicateSignature,
    IrrelevantSignature,

    // Domain
    UnknownDomain,
    DomainDuplicate,
    DomainNameInvalid,
    DomainCannotUpdate,

    // Token (NFT instance)
    UnknownToken,
    TokenDuplicate,
    TokenNameInvalid,
    TokenOwnerEmpty,
    TokenOwnerInvalid,
    TokenDestroyed,

    // Group
    UnknownGroup,
    GroupDuplicate,
    GroupNameInvalid,
    GroupKeyReserved,
    InvalidGroupStructure,

    // Fungible
    UnknownFungible,
    FungibleDuplicate,
    FungibleSymbolInvalid,
    FungibleSupplyInvalid,
    MathOverflow,
    InsufficientBalance,
    FungibleCannotUpdate,

    // Suspend
    UnknownSuspend,
    SuspendDuplicate,
    SuspendStatusInvalid,
    SuspendProposerKeyMissing,
    SuspendDuplicateKey,
    SuspendExpired,
    SuspendNotRequiredKeys,
    SuspendExecutorInvalid,
    SuspendInvalidAction,

    // Lock
    UnknownLock,
    LockDuplicate,
    LockUnlockTimeInvalid,
    LockDeadlineInvalid,
    LockConditionInvalid,
    LockExpired,
    LockDuplicateKey,
    LockNotReachUnlockTime,
    LockNotReachDeadline,

    // Metadata
    MetaKeyInvalid,
    MetaDuplicate,
    MetaInvolveMissing,

    // Passive bonus
    UnknownBonus,
    BonusDuplicate,
    BonusRulesInvalid,
    BonusPercentInvalid,
    BonusNotFulfilled,
    BonusLatestNotExpired,

    // Staking
    UnknownValidator,
    ValidatorDuplicate,
    StakingAmountInvalid,
    StakingDaysInvalid,
    StakingNotEnough,
    UnknownStakePool,
    StakePoolDuplicate,
    StakingStatusInvalid,
    StakingTimingInvalid,

    // Script
    UnknownScript,
    ScriptDuplicate,
    InvalidScriptResult,

    // Link (everipass / everipay)
    InvalidLinkVersion,
    InvalidLinkType,
    ExpiredLink,
    DuplicateLink,
    LinkMissingSegment,

    // Charge / billing
    ChargeExceeded,
    MaxChargeExceeded,
    InvalidPayer,

    // Producer vote
    ProdvoteKeyInvalid,
    ProdvoteValueInvalid,
    ProdvoteProducerInvalid,

    // Transaction context
    UnknownAction,
    InvalidActionVersion,
    TrxExpired,
    TrxRefBlockMismatch,

    // Misc
    NameReserved,
    AddressReserved,
    Unknown,
}

impl Kind {
    pub fn category(self) -> Category {
        use Kind::*;
        match self {
            EncodeError | DecodeTruncated | DecodeTrailingBytes | DecodeBadDiscriminant
            | DecodeOversize | InvalidType | RecursionLimit | DeadlineExceeded => {
                Category::Structural
            }
            DupKey | UnknownKey | NoSavepoint | CacheMisuse | SnapshotFailure => Category::Tdb,
            UnsatisfiedAuthorization | DuplicateSignature | IrrelevantSignature => {
                Category::Authorization
            }
            UnknownDomain | DomainDuplicate | DomainNameInvalid | DomainCannotUpdate => {
                Category::Domain
            }
            UnknownToken | TokenDuplicate | TokenNameInvalid | TokenOwnerEmpty
            | TokenOwnerInvalid | TokenDestroyed => Category::Token,
            UnknownGroup | GroupDuplicate | GroupNameInvalid | GroupKeyReserved
            | InvalidGroupStructure => Category::Group,
            UnknownFungible | FungibleDuplicate | FungibleSymbolInvalid
            | FungibleSupplyInvalid | MathOverflow | InsufficientBalance
            | FungibleCannotUpdate => Category::Fungible,
            UnknownSuspend | SuspendDuplicate | SuspendStatusInvalid
            | SuspendProposerKeyMissing | SuspendDuplicateKey | SuspendExpired
            | SuspendNotRequiredKeys | SuspendExecutorInvalid | SuspendInvalidAction => {
                Category::Suspend
            }
            UnknownLock | LockDuplicate | LockUnlockTimeInvalid | LockDeadlineInvalid
            | LockConditionInvalid | LockExpired | LockDuplicateKey | LockNotReachUnlockTime
            | LockNotReachDeadline => Category::Lock,
            MetaKeyInvalid | MetaDuplicate | MetaInvolveMissing => Category::Meta,
            UnknownBonus | BonusDuplicate | BonusRulesInvalid | BonusPercentInvalid
            | BonusNotFulfilled | BonusLatestNotExpired => Category::Bonus,
            UnknownValidator | ValidatorDuplicate | StakingAmountInvalid | StakingDaysInvalid
            | StakingNotEnough | UnknownStakePool | StakePoolDuplicate | StakingStatusInvalid
            | StakingTimingInvalid => Category::Staking,
            UnknownScript | ScriptDuplicate | InvalidScriptResult => Category::Script,
            InvalidLinkVersion | InvalidLinkType | ExpiredLink | DuplicateLink
            | LinkMissingSegment => Category::Link,
            ChargeExceeded | MaxChargeExceeded | InvalidPayer => Category::Charge,
            ProdvoteKeyInvalid | ProdvoteValueInvalid | ProdvoteProducerInvalid => {
                Category::Producer
            }
            UnknownAction | InvalidActionVersion | TrxExpired | TrxRefBlockMismatch => {
                Category::Transaction
            }
            NameReserved | AddressReserved | Unknown => Category::Misc,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

struct Tagged(Cow<'static, str>, Option<Cow<'static, str>>);
impl fmt::Debug for Tagged {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.1 {
            Some(path) => write!(f, "at {}: {}", path, self.0),
            None => write!(f, "{}", self.0),
        }
    }
}
impl fmt::Display for Tagged {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
impl std::error::Error for Tagged {}

// `DynBacktraceError` captures a boxed source error plus a backtrace; we
// keep the `Kind` alongside it rather than trying to recover it by
// downcasting back out, since nothing requires that round trip.
#[derive(Debug)]
#[allow(dead_code)]
pub struct Error {
    kind: Kind,
    inner: DynBacktraceError,
}
pub type Result<T> = std::result::Result<T, Error>;

impl<E: std::error::Error + Send + Sync + 'static> From<E> for Error {
    fn from(err: E) -> Error {
        Error::new(err)
    }
}

impl Error {
    pub fn new<E: std::error::Error + Send + Sync + 'static>(err: E) -> Error {
        Error::new_kind(Kind::Unknown, err)
    }

    pub fn new_kind<E: std::error::Error + Send + Sync + 'static>(kind: Kind, err: E) -> Error {
        error!(target: "ledgerdb", kind = ?kind, "{:?}", err);
        let inner = DynBacktraceError::from(err);
        Error { kind, inner }
    }

    /// Construct an error tagged with one of [`Kind`]'s variants.
    pub fn kind(kind: Kind, msg: impl Into<Cow<'static, str>>) -> Error {
        Error::new_kind(kind, Tagged(msg.into(), None))
    }

    /// Like [`Error::kind`] but attaches a dotted structural path, for
    /// codec errors that want to say where in a record they went wrong.
    pub fn kind_at(
        kind: Kind,
        path: impl Into<Cow<'static, str>>,
        msg: impl Into<Cow<'static, str>>,
    ) -> Error {
        Error::new_kind(kind, Tagged(msg.into(), Some(path.into())))
    }

    pub fn find_kind(&self) -> Option<Kind> {
        Some(self.kind)
    }

    pub fn category(&self) -> Category {
        self.kind.category()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.inner)
    }
}

pub fn err(msg: impl Into<Cow<'static, str>>) -> Error {
    Error::kind(Kind::Unknown, msg)
}

pub fn kind_err(kind: Kind, msg: impl Into<Cow<'static, str>>) -> Error {
    Error::kind(kind, msg)
}

#[test]
fn test_error() {
    let _err = err("test error");
}

#[test]
fn test_kind_roundtrips() {
    let e = Error::kind(Kind::DupKey, "duplicate key");
    assert_eq!(e.find_kind(), Some(Kind::DupKey));
    assert_eq!(e.category(), Category::Tdb);
}
