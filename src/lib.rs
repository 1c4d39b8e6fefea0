//! # Shroud
//!
//! A **vectorized secure multi-party computation (MPC) core** for
//! relational analytics over secret-shared data. Mutually distrustful
//! parties jointly evaluate SQL-like queries — filters, joins,
//! aggregations, sorts, windows — without any single party learning the
//! inputs or intermediate values.
//!
//! ## Key pieces
//!
//! - **Secret-shared containers** — [`vector::PlainVector`] with lazy,
//!   copy-free access patterns; replicated share containers; arithmetic-
//!   and boolean-encoded vectors ([`encoded::ASharedVector`],
//!   [`encoded::BSharedVector`]) with operator overloads that dispatch to
//!   the protocol layer.
//! - **Oblivious operators** — bit-packed adders and comparison circuits,
//!   sorting networks, radix and quicksort, oblivious shuffle and
//!   permutation algebra, log-depth group-by aggregation, distinct, and
//!   stream windows.
//! - **A relational table layer** — [`relational::EncodedTable`] composes
//!   the above into joins (inner / outer / semi / anti / unique-key),
//!   group-bys, and windowed queries while maintaining an oblivious
//!   validity bitmask.
//!
//! The cryptographic protocol itself is pluggable: backends implement the
//! traits in [`protocol`], and every container carries a [`protocol::Ctx`]
//! handle. The built-in [`protocol::PlainProtocol`] is the single-party
//! plaintext backend the test suite runs against.
//!
//! ## Quick start
//!
//! ```no_run
//! use shroud::prelude::*;
//! # fn main() -> shroud::Result<()> {
//! let ctx = shroud::testing::plain_ctx();
//!
//! // Secret-share two plaintext columns; bracketed names are
//! // boolean-shared, bare names arithmetic-shared.
//! let ids: PlainVector<i64> = vec![1, 2, 1, 3].into();
//! let amounts: PlainVector<i64> = vec![10, 20, 30, 40].into();
//! let mut orders = EncodedTable::secret_share(
//!     &ctx,
//!     "orders",
//!     &[ids, amounts],
//!     &["[id]", "amount"],
//!     0,
//! )?;
//!
//! // Group by id, summing amounts.
//! orders.aggregate(
//!     &["[id]"],
//!     &[("amount", "amount", Aggregation::Sum)],
//!     Default::default(),
//! )?;
//!
//! // Shuffle + blind invalid rows, then reveal.
//! orders.finalize(true)?;
//! let (rows, names) = orders.open_with_schema(true)?;
//! # let _ = (rows, names);
//! # Ok(())
//! # }
//! ```
//!
//! ## Security model
//!
//! Semi-honest by default; the single malicious-adversary hook is the
//! commit-open check in [`protocol::check`]. Two operations disclose
//! data-dependent information by design and require upstream shuffling or
//! padding to be harmless: data-dependent filter views
//! ([`vector::PlainVector::included_reference`]) reveal the selected
//! count, and quicksort reveals comparisons against freshly shuffled
//! random pivots.

pub mod circuits;
pub mod config;
pub mod element;
pub mod encoded;
pub mod error;
pub mod io;
pub mod operators;
pub mod permutation;
pub mod protocol;
pub mod random;
pub mod relational;
pub mod runtime;
pub mod share;
mod storage;
pub mod testing;
pub mod vector;

pub use config::{AdderTopology, RuntimeConfig};
pub use element::Element;
pub use error::{Error, Result};
pub use share::Encoding;

/// The common imports for writing queries.
pub mod prelude {
    pub use crate::config::RuntimeConfig;
    pub use crate::element::Element;
    pub use crate::encoded::{ASharedVector, BSharedVector};
    pub use crate::error::{Error, Result};
    pub use crate::operators::{Aggregation, SortOrder, SortingProtocol};
    pub use crate::protocol::{Ctx, PlainProtocol};
    pub use crate::relational::{AggregationOptions, EncodedTable, JoinOptions};
    pub use crate::share::Encoding;
    pub use crate::vector::PlainVector;
}
