//! Adjacent-distinct marking.

use crate::element::Element;
use crate::encoded::BSharedVector;
use crate::error::{Error, Result};

/// Obliviously mark rows whose keys differ from the previous row. Only
/// adjacent rows are compared, so inputs must be sorted for global
/// uniqueness. The first row is always marked.
pub fn distinct<T: Element>(
    keys: &[BSharedVector<T>],
    res: &BSharedVector<T>,
) -> Result<()> {
    if keys.is_empty() {
        return Err(Error::precondition("distinct requires at least one key"));
    }
    res.zero();

    // single-bit boolean share of one in the first slot
    let first = res.slice_range(0, 1);
    first.assign(&BSharedVector::public_repeated(res.context(), T::ONE, 1));

    let rest = res.slice_from(1);
    for key in keys {
        let n = key.size();
        let prev = key.slice_range(0, n - 1);
        let next = key.slice_from(1);
        rest.or_assign(&prev.neq(&next)?)?;
    }
    // `rest` is a view into the result vector, which is updated in place.
    Ok(())
}
