//! Join orchestration.
//!
//! One core routine implements inner, left outer, right outer, and full
//! outer joins by composing concatenation, sort, distinct, and a reverse
//! aggregation; the public wrappers just set options. Semi and anti joins
//! reduce to inner and right-outer joins with a projection back to the
//! left table's columns. A faster unique-key path handles the
//! private-set-intersection shape.
//!
//! Join sizes assume a primary-key/foreign-key relationship but do not
//! enforce it.

use super::{
    AggregationOptions, EncodedTable, TABLE_ID_COL, UNIQ_COL, VALID_COL, VALID_TEMP_COL,
};
use crate::element::Element;
use crate::error::{Error, Result};
use crate::operators::selector::Aggregation;
use crate::operators::sorting::{SortOrder, SortingProtocol};

/// Options for the join family.
///
/// The flags generalize the join kinds: an inner join is neither left nor
/// right outer; a full outer join is both.
#[derive(Clone, Debug)]
pub struct JoinOptions {
    pub left_outer: bool,
    pub right_outer: bool,
    /// Anti-join handling of the validity bit (set by `anti_join`).
    pub anti: bool,
    /// Trim the output to the right table's size when the cost heuristic
    /// says the extra sort pays for itself downstream.
    pub trim_invalid: bool,
}

impl Default for JoinOptions {
    fn default() -> Self {
        Self {
            left_outer: false,
            right_outer: false,
            anti: false,
            trim_invalid: true,
        }
    }
}

impl<T: Element> EncodedTable<T> {
    /// Core join. Assumes (does not enforce) a primary-key/foreign-key
    /// relationship between `self` (left, primary) and `right` (foreign).
    fn join_impl(
        &self,
        right: &Self,
        keys: &[&str],
        agg_spec: &[(&str, &str, Aggregation)],
        opt: JoinOptions,
    ) -> Result<Self> {
        tracing::debug!(
            left = self.size(),
            right = right.size(),
            keys = keys.len(),
            aggs = agg_spec.len(),
            "table join"
        );

        // Aggregation needs a power-of-two input, but sorting does not;
        // don't pad yet, so the sort runs on the smallest table possible.
        let mut concat = self.concatenate(right, false)?;

        // Keep only the output columns: keys, all right-table columns,
        // all aggregation columns, and the left columns for left-outer.
        let mut output_columns: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        output_columns.extend(right.column_names());
        for (data, result, _) in agg_spec {
            output_columns.push(data.to_string());
            output_columns.push(result.to_string());
        }
        if opt.left_outer {
            output_columns.extend(self.column_names());
        }
        let output_refs: Vec<&str> = output_columns.iter().map(|s| s.as_str()).collect();
        concat.project(&output_refs);

        // Sort on `valid || keys || table-id`: invalid rows rise to the
        // top, matching keys co-locate, and within a key the left row
        // precedes the right rows.
        let mut valid_keys: Vec<&str> = vec![VALID_COL];
        valid_keys.extend_from_slice(keys);
        let mut keys_plus_tid = valid_keys.clone();
        keys_plus_tid.push(TABLE_ID_COL);

        concat.sort_all(&keys_plus_tid, SortOrder::Asc, SortingProtocol::Default)?;

        concat.add_columns_internal(&[UNIQ_COL, VALID_TEMP_COL])?;

        let mut spec: Vec<(&str, &str, Aggregation)> = agg_spec.to_vec();

        if !opt.right_outer {
            // Left-outer and inner joins invalidate the right side with a
            // validity aggregation; right- and full-outer joins don't.
            spec.push((VALID_TEMP_COL, VALID_TEMP_COL, Aggregation::Valid));

            concat.distinct_into(&valid_keys, UNIQ_COL)?;
        }

        let n = concat.size();
        let valid = concat.b_column(VALID_COL)?;
        let tid = concat.b_column(TABLE_ID_COL)?;
        let uniq = concat.b_column(UNIQ_COL)?;
        let valid_temp = concat.b_column(VALID_TEMP_COL)?;

        if opt.left_outer {
            if opt.right_outer {
                // Full outer join: every row stays.
                valid_temp.assign(&valid);
            } else {
                // Left outer join. A row survives if it matched (not
                // unique, from the right) or went unmatched on the left
                // (unique, from the left). Invalid are:
                //  (a) unique and from the right (no left key),
                //  (b) non-unique and from the left (duplicate key),
                //  (c) from the left with a match on the right.
                // (a) and (b): valid & !(tid & uniq)
                valid_temp.assign(&valid.and(&!&tid.and(&uniq)?)?);
                // (c): a left row directly followed by a non-unique row
                // has a match; `!(left & !next_uniq)` = `tid | next_uniq`
                valid_temp
                    .slice_range(0, n - 1)
                    .and_assign(&tid.slice_range(0, n - 1).or(&uniq.slice_from(1))?)?;
            }
        } else if opt.right_outer {
            // Right outer join: all right rows stay, the left side drops.
            valid_temp.assign(&valid.and(&tid)?);
        } else {
            // Inner join: unique rows are unmatched (left without a
            // partner, or right without a left key); drop them.
            valid_temp.assign(&valid.and(&!&uniq)?);
        }

        if opt.anti {
            // Copy (not valid-fold): only the first row of a duplicated
            // key can be marked, and the value must propagate to every
            // row of that key. Monotonicity is preserved because the
            // result still lands via `filter` below.
            spec.push((VALID_TEMP_COL, VALID_TEMP_COL, Aggregation::CopyB));
        }

        concat.delete_columns(&[UNIQ_COL]);

        // The join itself: reverse aggregation grouped on the keys, with
        // the table-id column selecting which side feeds non-copy
        // aggregations.
        concat.aggregate(
            &valid_keys,
            &spec,
            AggregationOptions {
                reverse: true,
                do_sort: false,
                mark_valid: true,
                table_id: Some(TABLE_ID_COL.to_string()),
            },
        )?;

        concat.filter(&concat.b_column(VALID_TEMP_COL)?)?;
        concat.delete_columns(&[VALID_TEMP_COL, TABLE_ID_COL]);

        // Inner and right-outer outputs are bounded by the right table;
        // trim when the extra sort is cheaper than carrying dead rows:
        //   R < L * (w + c - 1) / (c + 2)
        // with w the bit width and c the left schema size.
        if opt.trim_invalid && !opt.left_outer {
            let left_size = self.size();
            let right_size = right.size();
            let w = T::BITS as usize;
            let c = self.column_names().len() - 1; // don't count valid

            if right_size < left_size * (w + c - 1) / (c + 2) {
                // move valid rows to the top, then cut at the bound
                concat.sort_all(&[VALID_COL], SortOrder::Desc, SortingProtocol::Default)?;
                concat.head(right_size);
            }
        }

        Ok(concat)
    }

    /// Inner join on `keys`, with optional aggregations over the groups.
    pub fn inner_join(
        &self,
        right: &Self,
        keys: &[&str],
        agg_spec: &[(&str, &str, Aggregation)],
        mut opt: JoinOptions,
    ) -> Result<Self> {
        opt.left_outer = false;
        opt.right_outer = false;
        self.join_impl(right, keys, agg_spec, opt)
    }

    /// Left outer join: unmatched left rows survive.
    pub fn left_outer_join(
        &self,
        right: &Self,
        keys: &[&str],
        agg_spec: &[(&str, &str, Aggregation)],
        mut opt: JoinOptions,
    ) -> Result<Self> {
        opt.left_outer = true;
        opt.right_outer = false;
        self.join_impl(right, keys, agg_spec, opt)
    }

    /// Right outer join: all right rows survive.
    pub fn right_outer_join(
        &self,
        right: &Self,
        keys: &[&str],
        agg_spec: &[(&str, &str, Aggregation)],
        mut opt: JoinOptions,
    ) -> Result<Self> {
        opt.left_outer = false;
        opt.right_outer = true;
        self.join_impl(right, keys, agg_spec, opt)
    }

    /// Full outer join: every row survives.
    pub fn full_outer_join(
        &self,
        right: &Self,
        keys: &[&str],
        agg_spec: &[(&str, &str, Aggregation)],
        mut opt: JoinOptions,
    ) -> Result<Self> {
        opt.left_outer = true;
        opt.right_outer = true;
        self.join_impl(right, keys, agg_spec, opt)
    }

    /// Semi-join: rows of `self` with at least one match in `right`,
    /// projected back to `self`'s columns. Runs `right.inner_join(self)`.
    pub fn semi_join(&self, right: &Self, keys: &[&str]) -> Result<Self> {
        let mut t = right.inner_join(self, keys, &[], JoinOptions::default())?;
        let names = self.column_names();
        let refs: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
        t.project(&refs);
        Ok(t)
    }

    /// Anti-join: rows of `self` with no match in `right`, projected back
    /// to `self`'s columns. Runs `right.right_outer_join(self)` with the
    /// anti validity handling.
    pub fn anti_join(&self, right: &Self, keys: &[&str]) -> Result<Self> {
        let mut t = right.right_outer_join(
            self,
            keys,
            &[],
            JoinOptions {
                anti: true,
                ..JoinOptions::default()
            },
        )?;
        let names = self.column_names();
        let refs: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
        t.project(&refs);
        Ok(t)
    }

    /// Unique-key inner join (effectively a private set intersection over
    /// `keys`). Both tables must have unique compound keys — obliviously
    /// uncheckable, so correctness is the caller's responsibility;
    /// duplicate keys give wrong results.
    ///
    /// `agg_spec` may only name carried (copy) columns; real aggregations
    /// report `AggregationNotSupportedHere`.
    pub fn uu_join(
        &self,
        right: &Self,
        keys: &[&str],
        agg_spec: &[(&str, &str, Aggregation)],
        opt: JoinOptions,
        protocol: SortingProtocol,
    ) -> Result<Self> {
        let mut concat = self.concatenate(right, false)?;

        // Bitonic merge needs the table-id as a tiebreak so each half
        // stays internally ordered.
        let mut sorting_keys: Vec<&str> = keys.to_vec();
        if protocol == SortingProtocol::BitonicMerge {
            sorting_keys.push(TABLE_ID_COL);
        }
        concat.sort_all(&sorting_keys, SortOrder::Asc, protocol)?;

        let s = concat.size();

        // With unique keys per side, a row is a match iff it equals its
        // neighbor; keep the second row of each adjacent pair.
        let valid = concat.b_column(VALID_COL)?;
        for k in keys {
            let key_col = concat.b_column(k)?;
            valid
                .slice_from(1)
                .and_assign(&key_col.slice_range(0, s - 1).eq(&key_col.slice_from(1))?)?;
        }
        // the first row has no predecessor to match
        valid.slice_range(0, 1).zero();

        let mut out_columns = right.column_names();

        for (data, result, func) in agg_spec {
            if func.is_aggregation() {
                return Err(Error::AggregationNotSupportedHere);
            }
            if data != result {
                return Err(Error::precondition(
                    "unique-key join copies columns in place; input and output must match",
                ));
            }
            // Give each row its predecessor's value: the surviving row of
            // a matched pair is the second one, and the pre-sort is
            // stable, so the predecessor is its left-table partner.
            concat.column(data)?.shift_down();
            out_columns.push(data.to_string());
        }

        let refs: Vec<&str> = out_columns.iter().map(|s| s.as_str()).collect();
        concat.project(&refs);
        concat.delete_columns(&[TABLE_ID_COL]);

        if opt.trim_invalid {
            concat.sort_all(&[VALID_COL], SortOrder::Desc, protocol)?;
            concat.head(self.size().min(right.size()));
        }

        Ok(concat)
    }
}
