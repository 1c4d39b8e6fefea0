//! Error types for the shroud core.
//!
//! Errors are behavioral, not structural: each variant names a condition a
//! caller can act on (or a bug it should surface), never an internal type.
//! All errors abort the current query; the core performs no local recovery.

use thiserror::Error;

/// Errors surfaced at the library boundary.
#[derive(Debug, Error)]
pub enum Error {
    /// A caller-supplied argument violated an operation's precondition:
    /// size mismatch in a binary operation, an over-large mapping in
    /// `apply_mapping`, malformed access-pattern parameters, or a
    /// non-power-of-two input where one is required.
    #[error("precondition violated: {0}")]
    PreconditionViolated(String),

    /// An arithmetic-shared value was supplied where a boolean-shared one
    /// was required, or vice versa.
    #[error("wrong encoding: {0}")]
    WrongEncoding(String),

    /// A sharded-permutation (or other protocol-specific) object could not
    /// be matched to the running protocol's party count.
    #[error("unsupported protocol: {0}")]
    UnsupportedProtocol(String),

    /// The permutation pool was empty when a consumer asked for a
    /// correlation. This indicates a bug in the caller's `reserve` budget.
    #[error("sharded permutation pool exhausted; missing reserve() call")]
    ShardedPermutationUnavailable,

    /// A non-copy aggregator was passed to an operation that only carries
    /// columns (unique-key join).
    #[error("aggregations are not supported here; use copy columns")]
    AggregationNotSupportedHere,

    /// File open/parse failure on a CSV path.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Propagated verbatim from the communicator.
    #[error("transport error: {0}")]
    Transport(String),

    /// The commit-open verification hook detected an inconsistency.
    #[error("commit-open check failed")]
    CheckFailed,
}

/// Crate-wide result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Shorthand for a `PreconditionViolated` with a formatted message.
    pub(crate) fn precondition(msg: impl Into<String>) -> Self {
        Error::PreconditionViolated(msg.into())
    }
}
