//! Aggregation selection (L10).
//!
//! Table-level aggregation specs name their aggregator uniformly; the
//! selector resolves it to the arithmetic- or boolean-typed operator at
//! dispatch time, failing with `WrongEncoding` on a mismatch. It is a sum
//! type, never both encodings at once.

use crate::error::{Error, Result};
use crate::operators::aggregation::{ArithAggregator, BoolAggregator};
use crate::share::Encoding;

/// An aggregation function over one table column.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Aggregation {
    /// Arithmetic sum.
    Sum,
    /// Group size (selector-aware inside joins).
    Count,
    /// Carry an arithmetic column through unchanged.
    CopyA,
    /// Boolean minimum.
    Min,
    /// Boolean maximum.
    Max,
    /// Boolean OR fold.
    BitOr,
    /// Carry a boolean column through unchanged.
    CopyB,
    /// Validity fold (internal to joins).
    Valid,
}

impl Aggregation {
    /// The column encoding this aggregator operates on.
    pub fn encoding(self) -> Encoding {
        match self {
            Aggregation::Sum | Aggregation::Count | Aggregation::CopyA => Encoding::Arithmetic,
            _ => Encoding::Boolean,
        }
    }

    /// False for the identity functions (`CopyA`, `CopyB`, `Valid`); the
    /// table layer uses this to decide whether a spec mixes real
    /// aggregations with carried columns.
    pub fn is_aggregation(self) -> bool {
        !matches!(
            self,
            Aggregation::CopyA | Aggregation::CopyB | Aggregation::Valid
        )
    }

    /// The arithmetic operator, or `WrongEncoding` if this selector holds
    /// a boolean one.
    pub fn arithmetic(self) -> Result<ArithAggregator> {
        match self {
            Aggregation::Sum => Ok(ArithAggregator::Sum),
            Aggregation::Count => Ok(ArithAggregator::Count),
            Aggregation::CopyA => Ok(ArithAggregator::Copy),
            other => Err(Error::WrongEncoding(format!(
                "{other:?} is not an arithmetic aggregation"
            ))),
        }
    }

    /// The boolean operator, or `WrongEncoding` if this selector holds an
    /// arithmetic one.
    pub fn boolean(self) -> Result<BoolAggregator> {
        match self {
            Aggregation::Min => Ok(BoolAggregator::Min),
            Aggregation::Max => Ok(BoolAggregator::Max),
            Aggregation::BitOr => Ok(BoolAggregator::BitOr),
            Aggregation::CopyB => Ok(BoolAggregator::Copy),
            Aggregation::Valid => Ok(BoolAggregator::Valid),
            other => Err(Error::WrongEncoding(format!(
                "{other:?} is not a boolean aggregation"
            ))),
        }
    }
}
