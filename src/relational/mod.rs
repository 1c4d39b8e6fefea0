//! The relational table layer (L9).
//!
//! An [`EncodedTable`] is an insertion-ordered mapping from column names
//! to secret-shared columns. Column names in square brackets (`"[cnt]"`)
//! are boolean-shared; bare names are arithmetic-shared. Every table
//! carries a hidden single-bit boolean `VALID` column marking live rows.
//!
//! Row liveness is monotonic: [`EncodedTable::filter`] ANDs a predicate
//! into `VALID` and nothing in the library ever revalidates a row — a row
//! marked invalid stays invalid until the table is rebuilt.
//!
//! Two further reserved names exist: the table-id column distinguishing
//! join sides after [`EncodedTable::concatenate`], and a scratch
//! uniqueness column used inside joins and distinct; both are deleted
//! before results are returned. Reserved names cannot be user-created and
//! survive [`EncodedTable::project`].
//!
//! # Example
//!
//! ```no_run
//! use shroud::relational::EncodedTable;
//! use shroud::operators::{Aggregation, SortOrder, SortingProtocol};
//! # use shroud::testing::plain_ctx;
//! # fn main() -> shroud::Result<()> {
//! # let ctx = plain_ctx();
//! # let (ages, cities): (shroud::vector::PlainVector<i64>, shroud::vector::PlainVector<i64>) = (vec![30, 41].into(), vec![1, 2].into());
//! let mut t = EncodedTable::secret_share(
//!     &ctx, "people", &[ages, cities], &["age", "[city]"], 0,
//! )?;
//! t.aggregate(&["[city]"], &[("age", "age", Aggregation::Sum)], Default::default())?;
//! let (rows, names) = t.open_with_schema(true)?;
//! # let _ = (rows, names);
//! # Ok(())
//! # }
//! ```

mod join;

pub use join::JoinOptions;

use crate::element::Element;
use crate::encoded::{ASharedVector, BSharedVector};
use crate::error::{Error, Result};
use crate::operators::aggregation::{AAggSpec, BAggSpec, Direction, aggregate};
use crate::operators::common::multiplex_b;
use crate::operators::distinct::distinct;
use crate::operators::merge::bitonic_merge;
use crate::operators::selector::Aggregation;
use crate::operators::sorting::{SortOrder, SortingProtocol, bitonic_sort, table_sort};
use crate::operators::streaming;
use crate::operators::{multiplex_a, shuffle::shuffle_columns};
use crate::protocol::Ctx;
use crate::share::Encoding;
use crate::vector::PlainVector;

/// Hidden validity column: single-bit, boolean-shared, 1 = live row.
pub const VALID_COL: &str = "[##VALID]";
/// Join-side column added by concatenation: 0 = left rows, 1 = right.
pub const TABLE_ID_COL: &str = "[##TID]";
/// First-of-group scratch column used by joins and distinct.
pub const UNIQ_COL: &str = "[##UNIQ]";

const RESERVED_COLUMNS: [&str; 3] = [VALID_COL, TABLE_ID_COL, UNIQ_COL];

/// Validity scratch used inside joins; the valid column itself is a sort
/// key there, and a key cannot double as an aggregation output.
pub(crate) const VALID_TEMP_COL: &str = "[##VALID_TEMP]";

/// Column names inside square brackets hold boolean shares.
pub fn is_b_shared_name(name: &str) -> bool {
    name.contains('[')
}

fn is_reserved(name: &str) -> bool {
    RESERVED_COLUMNS.contains(&name)
}

/// One secret-shared table column.
pub enum ColumnData<T: Element> {
    Arithmetic(ASharedVector<T>),
    Boolean(BSharedVector<T>),
}

impl<T: Element> ColumnData<T> {
    pub fn encoding(&self) -> Encoding {
        match self {
            ColumnData::Arithmetic(_) => Encoding::Arithmetic,
            ColumnData::Boolean(_) => Encoding::Boolean,
        }
    }

    pub fn size(&self) -> usize {
        match self {
            ColumnData::Arithmetic(v) => v.size(),
            ColumnData::Boolean(v) => v.size(),
        }
    }

    fn resize(&mut self, n: usize) {
        match self {
            ColumnData::Arithmetic(v) => v.resize(n),
            ColumnData::Boolean(v) => v.resize(n),
        }
    }

    fn tail(&mut self, n: usize) {
        match self {
            ColumnData::Arithmetic(v) => v.tail(n),
            ColumnData::Boolean(v) => v.tail(n),
        }
    }

    fn zero(&self) {
        match self {
            ColumnData::Arithmetic(v) => v.zero(),
            ColumnData::Boolean(v) => v.zero(),
        }
    }

    fn deepcopy(&self) -> Self {
        match self {
            ColumnData::Arithmetic(v) => ColumnData::Arithmetic(v.deepcopy()),
            ColumnData::Boolean(v) => ColumnData::Boolean(v.deepcopy()),
        }
    }

    /// Shift by one row: every row receives the previous row's value (the
    /// first row keeps its own). Implemented as a reversed head-shift so
    /// the overlapping copy stays well-defined.
    fn shift_down(&self) {
        let n = self.size();
        match self {
            ColumnData::Arithmetic(v) => {
                v.reverse();
                v.slice_range(0, n - 1).assign(&v.slice_from(1));
                v.reverse();
            }
            ColumnData::Boolean(v) => {
                v.reverse();
                v.slice_range(0, n - 1).assign(&v.slice_from(1));
                v.reverse();
            }
        }
    }
}

/// Options for [`EncodedTable::aggregate`].
#[derive(Clone, Debug)]
pub struct AggregationOptions {
    /// Reverse aggregation leaves results in each group's last row.
    pub reverse: bool,
    /// Pre-sort on `VALID || keys` before aggregating.
    pub do_sort: bool,
    /// Invalidate all but each group's result row afterwards (only when
    /// the spec contains a real aggregation).
    pub mark_valid: bool,
    /// Selector column name (the table-id column inside joins).
    pub table_id: Option<String>,
}

impl Default for AggregationOptions {
    fn default() -> Self {
        Self {
            reverse: false,
            do_sort: true,
            mark_valid: true,
            table_id: None,
        }
    }
}

/// One table-level aggregation: input column, output column, function.
pub type AggSpec<'a> = &'a [(&'a str, &'a str, Aggregation)];

/// A relational table of secret-shared columns.
pub struct EncodedTable<T: Element> {
    name: String,
    columns: Vec<(String, ColumnData<T>)>,
    rows: usize,
    ctx: Ctx,
}

impl<T: Element> EncodedTable<T> {
    // ===== Construction ======================================================

    /// Zero-initialized table with the given schema. Bracketed names are
    /// boolean-shared. Reserved names are rejected.
    pub fn new(ctx: &Ctx, name: &str, schema: &[&str], rows: usize) -> Result<Self> {
        let mut table = Self {
            name: name.to_string(),
            columns: Vec::new(),
            rows,
            ctx: ctx.clone(),
        };
        table.add_columns(schema)?;
        table.configure_valid();
        Ok(table)
    }

    /// Ingest: secret-share plaintext columns under the given schema, with
    /// `owner` as the data owner.
    pub fn secret_share(
        ctx: &Ctx,
        name: &str,
        columns: &[PlainVector<T>],
        schema: &[&str],
        owner: usize,
    ) -> Result<Self> {
        if columns.len() != schema.len() {
            return Err(Error::precondition(format!(
                "{} columns for a schema of {}",
                columns.len(),
                schema.len()
            )));
        }
        let rows = columns.first().map_or(0, |c| c.size());
        let mut table = Self {
            name: name.to_string(),
            columns: Vec::new(),
            rows,
            ctx: ctx.clone(),
        };
        for (column, col_name) in columns.iter().zip(schema) {
            if column.size() != rows {
                return Err(Error::precondition("ragged input columns"));
            }
            if is_reserved(col_name) {
                return Err(Error::precondition(format!(
                    "column name {col_name} is reserved"
                )));
            }
            let data = if is_b_shared_name(col_name) {
                ColumnData::Boolean(BSharedVector::secret(ctx, column, owner))
            } else {
                ColumnData::Arithmetic(ASharedVector::secret(ctx, column, owner))
            };
            table.columns.push((col_name.to_string(), data));
        }
        table.configure_valid();
        Ok(table)
    }

    /// Create the validity column if absent, then mark every row live.
    fn configure_valid(&mut self) {
        if self.find(VALID_COL).is_none() {
            self.add_column_unchecked(VALID_COL, self.rows);
        }
        let valid = self.b_column(VALID_COL).expect("valid column exists");
        valid.assign(&BSharedVector::public_repeated(&self.ctx, T::ONE, self.rows));
    }

    // ===== Schema bookkeeping ================================================

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of rows.
    pub fn size(&self) -> usize {
        self.rows
    }

    pub fn context(&self) -> &Ctx {
        &self.ctx
    }

    /// Column names in insertion order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|(n, _)| n.clone()).collect()
    }

    fn find(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|(n, _)| n == name)
    }

    /// The column with the given name.
    pub fn column(&self, name: &str) -> Result<&ColumnData<T>> {
        self.find(name)
            .map(|i| &self.columns[i].1)
            .ok_or_else(|| Error::precondition(format!("column '{name}' not found")))
    }

    /// Boolean-shared handle to a column (shares storage with the table).
    pub fn b_column(&self, name: &str) -> Result<BSharedVector<T>> {
        match self.column(name)? {
            ColumnData::Boolean(v) => Ok(v.clone()),
            ColumnData::Arithmetic(_) => Err(Error::WrongEncoding(format!(
                "column '{name}' is arithmetic-shared"
            ))),
        }
    }

    /// Arithmetic-shared handle to a column (shares storage with the table).
    pub fn a_column(&self, name: &str) -> Result<ASharedVector<T>> {
        match self.column(name)? {
            ColumnData::Arithmetic(v) => Ok(v.clone()),
            ColumnData::Boolean(_) => Err(Error::WrongEncoding(format!(
                "column '{name}' is boolean-shared"
            ))),
        }
    }

    /// Handle to the validity column.
    pub fn valid_column(&self) -> BSharedVector<T> {
        self.b_column(VALID_COL).expect("valid column exists")
    }

    fn add_column_unchecked(&mut self, name: &str, rows: usize) {
        let data = if is_b_shared_name(name) {
            ColumnData::Boolean(BSharedVector::zeroed(&self.ctx, rows))
        } else {
            ColumnData::Arithmetic(ASharedVector::zeroed(&self.ctx, rows))
        };
        self.columns.push((name.to_string(), data));
    }

    pub(crate) fn add_columns_internal(&mut self, names: &[&str]) -> Result<()> {
        for name in names {
            if self.find(name).is_some() {
                return Err(Error::precondition(format!(
                    "column '{name}' already exists"
                )));
            }
            self.add_column_unchecked(name, self.rows);
        }
        Ok(())
    }

    /// Add a zero-initialized column.
    pub fn add_column(&mut self, name: &str) -> Result<()> {
        self.add_columns(&[name])
    }

    /// Add zero-initialized columns.
    pub fn add_columns(&mut self, names: &[&str]) -> Result<()> {
        for name in names {
            if is_reserved(name) {
                return Err(Error::precondition(format!(
                    "column name {name} is reserved"
                )));
            }
        }
        self.add_columns_internal(names)
    }

    /// Remove columns by name; missing names only warn.
    pub fn delete_columns(&mut self, names: &[&str]) {
        for name in names {
            if self.find(name).is_none() {
                tracing::warn!(column = name, "deleting non-existent column");
            }
        }
        self.columns.retain(|(n, _)| !names.contains(&n.as_str()));
    }

    /// Keep only the named columns. Reserved columns always survive.
    pub fn project(&mut self, keep: &[&str]) {
        let drop: Vec<String> = self
            .columns
            .iter()
            .filter(|(n, _)| !keep.contains(&n.as_str()) && !is_reserved(n))
            .map(|(n, _)| n.clone())
            .collect();
        let drop: Vec<&str> = drop.iter().map(|s| s.as_str()).collect();
        self.delete_columns(&drop);
    }

    /// Rename a column; both existence checks fail with an error.
    pub fn rename_column(&mut self, old: &str, new: &str) -> Result<()> {
        if self.find(new).is_some() {
            return Err(Error::precondition(format!(
                "column '{new}' already exists"
            )));
        }
        match self.find(old) {
            Some(i) => {
                self.columns[i].0 = new.to_string();
                Ok(())
            }
            None => Err(Error::precondition(format!("column '{old}' not found"))),
        }
    }

    /// Deep copy of the whole table.
    pub fn deepcopy(&self) -> Self {
        Self {
            name: self.name.clone(),
            columns: self
                .columns
                .iter()
                .map(|(n, c)| (n.clone(), c.deepcopy()))
                .collect(),
            rows: self.rows,
            ctx: self.ctx.clone(),
        }
    }

    // ===== Row bookkeeping ===================================================

    /// AND a predicate into the validity column. The only way validity
    /// changes: rows never come back.
    pub fn filter(&self, predicate: &BSharedVector<T>) -> Result<()> {
        self.valid_column().and_assign(predicate)
    }

    /// Keep the first `n` rows.
    pub fn head(&mut self, n: usize) {
        if n > self.size() {
            tracing::warn!(n, size = self.size(), "head larger than table");
        }
        self.resize(n);
    }

    /// Keep the last `n` rows.
    pub fn tail(&mut self, n: usize) {
        if n > self.size() {
            tracing::warn!(n, size = self.size(), "tail larger than table");
        }
        for (_, c) in &mut self.columns {
            c.tail(n);
        }
        self.rows = n;
    }

    /// Resize to `n` rows; new rows are zero-initialized (and therefore
    /// invalid).
    pub fn resize(&mut self, n: usize) {
        if n == self.size() {
            return;
        }
        for (_, c) in &mut self.columns {
            c.resize(n);
        }
        self.rows = n;
    }

    /// Pad to the next power of two. Non-zero `pad_value` fills the new
    /// rows of every non-validity column (needed by bitonic merge).
    pub fn pad_power_of_two(&mut self, pad_value: T) {
        let old_size = self.size();
        self.resize(old_size.next_power_of_two());

        if pad_value != T::ZERO {
            let pad_size = self.size() - old_size;
            for (name, c) in &self.columns {
                if name == VALID_COL {
                    continue;
                }
                match c {
                    ColumnData::Arithmetic(v) => v
                        .slice_from(old_size)
                        .assign(&ASharedVector::public_repeated(&self.ctx, pad_value, pad_size)),
                    ColumnData::Boolean(v) => v
                        .slice_from(old_size)
                        .assign(&BSharedVector::public_repeated(&self.ctx, pad_value, pad_size)),
                }
            }
        }
    }

    /// Zero the named columns.
    pub fn zero(&self, names: &[&str]) -> Result<()> {
        for name in names {
            self.column(name)?.zero();
        }
        Ok(())
    }

    /// Arithmetic prefix sum over one column. Ignores validity: call only
    /// when all rows are live or invalid rows are already zeroed.
    pub fn prefix_sum(&self, name: &str) -> Result<()> {
        self.a_column(name)?.prefix_sum();
        Ok(())
    }

    /// Broadcast a boolean column's LSB into a full-width bitmask.
    pub fn extend_lsb(&self, name: &str) -> Result<()> {
        let v = self.b_column(name)?;
        v.assign(&v.extend_lsb());
        Ok(())
    }

    // ===== Conversions =======================================================

    /// Convert an arithmetic column into a boolean one.
    pub fn convert_a2b(&self, input_a: &str, output_b: &str) -> Result<()> {
        let converted = self.a_column(input_a)?.a2b()?;
        self.b_column(output_b)?.assign(&converted);
        Ok(())
    }

    /// Convert a single-bit boolean column into an arithmetic one.
    pub fn convert_b2a_bit(&self, input_b: &str, output_a: &str) -> Result<()> {
        let converted = self.b_column(input_b)?.b2a_bit()?;
        self.a_column(output_a)?.assign(&converted);
        Ok(())
    }

    // ===== Sorting and shuffling =============================================

    /// Sort all columns by `spec` with the default protocol.
    pub fn sort(&mut self, spec: &[(&str, SortOrder)]) -> Result<&mut Self> {
        self.sort_with(spec, SortingProtocol::Default)
    }

    /// Sort all given key columns in one direction.
    pub fn sort_all(
        &mut self,
        keys: &[&str],
        order: SortOrder,
        protocol: SortingProtocol,
    ) -> Result<&mut Self> {
        let spec: Vec<(&str, SortOrder)> = keys.iter().map(|k| (*k, order)).collect();
        self.sort_with(&spec, protocol)
    }

    /// Sort all columns by `spec` with an explicit protocol.
    ///
    /// Sorting on the validity column moves invalid (and padded) rows to
    /// a known end, which lets bitonic sorts trim the padding afterwards
    /// without disclosing the invalid-row count beyond the original size.
    pub fn sort_with(
        &mut self,
        spec: &[(&str, SortOrder)],
        protocol: SortingProtocol,
    ) -> Result<&mut Self> {
        let protocol = match protocol {
            SortingProtocol::Default => self.ctx.default_sort_protocol(),
            p => p,
        };

        let original_size = self.size();
        let mut can_unpad = false;
        let mut unpad_from_top = true;

        if protocol == SortingProtocol::BitonicSort {
            self.pad_power_of_two(T::ZERO);
        }

        let mut key_names = Vec::with_capacity(spec.len());
        let mut order = Vec::with_capacity(spec.len());
        let mut single_bit = vec![false; spec.len()];
        for (i, (name, dir)) in spec.iter().enumerate() {
            if *name == VALID_COL {
                // padded rows are invalid, so a validity sort makes the
                // padding trimmable
                can_unpad = true;
                single_bit[i] = true;
                unpad_from_top = *dir == SortOrder::Asc;
            }
            if *name == TABLE_ID_COL {
                single_bit[i] = true;
            }
            key_names.push(*name);
            order.push(*dir);
        }

        let mut keys = Vec::with_capacity(key_names.len());
        for name in &key_names {
            keys.push(self.b_column(name)?);
        }

        // carried columns: everything that is not a sort key
        let mut data_a = Vec::new();
        let mut data_b = Vec::new();
        for (name, c) in &self.columns {
            if key_names.contains(&name.as_str()) {
                continue;
            }
            match c {
                ColumnData::Arithmetic(v) => data_a.push(v.clone()),
                ColumnData::Boolean(v) => data_b.push(v.clone()),
            }
        }

        tracing::debug!(
            table = %self.name,
            keys = keys.len(),
            rows = self.size(),
            ?protocol,
            "table sort"
        );

        match protocol {
            SortingProtocol::BitonicSort => {
                bitonic_sort(&keys, &data_a, &data_b, &order)?;
                if can_unpad {
                    if unpad_from_top {
                        self.tail(original_size);
                    } else {
                        self.resize(original_size);
                    }
                }
            }
            SortingProtocol::BitonicMerge => {
                bitonic_merge(&keys, &data_a, &data_b, &order)?;
            }
            _ => {
                table_sort(
                    &mut keys,
                    &mut data_a,
                    &mut data_b,
                    &order,
                    &single_bit,
                    protocol,
                    &self.ctx,
                )?;
            }
        }

        Ok(self)
    }

    /// Obliviously shuffle all columns under one permutation.
    pub fn shuffle(&mut self) -> Result<&mut Self> {
        let mut data_a = Vec::new();
        let mut data_b = Vec::new();
        for (_, c) in &self.columns {
            match c {
                ColumnData::Arithmetic(v) => data_a.push(v.clone()),
                ColumnData::Boolean(v) => data_b.push(v.clone()),
            }
        }
        // one sharded permutation plus one pair per column
        self.ctx
            .permutations()
            .reserve(self.size(), 1, data_a.len() + data_b.len());
        shuffle_columns(&mut data_a, &mut data_b, self.size(), &self.ctx)?;
        Ok(self)
    }

    // ===== Masking and finalization ==========================================

    /// Multiplex every listed column against the per-type sentinel under
    /// a mask column: rows with a 0 mask bit become `T::MAX_VALUE`. The
    /// mask column itself is left alone.
    fn mask(&self, mask_column: &str, names: &[String]) -> Result<()> {
        let mask_b = self.b_column(mask_column)?;
        let n = mask_b.size();
        let mask_a = mask_b.b2a_bit()?;

        let full_mask_a = ASharedVector::public_repeated(&self.ctx, T::MAX_VALUE, n);
        let full_mask_b = BSharedVector::public_repeated(&self.ctx, T::MAX_VALUE, n);

        for name in names {
            if name == mask_column {
                continue;
            }
            match self.column(name)? {
                ColumnData::Boolean(v) => {
                    v.assign(&multiplex_b(&mask_b, &full_mask_b, v)?);
                }
                ColumnData::Arithmetic(v) => {
                    v.assign(&multiplex_a(&mask_a, &full_mask_a, v)?);
                }
            }
        }
        Ok(())
    }

    /// Shuffle, then blind every invalid row with the per-type sentinel.
    /// Call before revealing outputs to untrusted parties; skipping the
    /// shuffle leaves row order open to inference.
    pub fn finalize(&mut self, do_shuffle: bool) -> Result<&mut Self> {
        if do_shuffle {
            self.shuffle()?;
        }
        self.mask(VALID_COL, &self.column_names())?;
        Ok(self)
    }

    // ===== Opening ===========================================================

    /// Open every data column (the validity column is skipped).
    pub fn open(&self) -> Result<Vec<PlainVector<T>>> {
        let mut out = Vec::new();
        for (name, c) in &self.columns {
            if name == VALID_COL {
                continue;
            }
            out.push(match c {
                ColumnData::Arithmetic(v) => v.open()?,
                ColumnData::Boolean(v) => v.open()?,
            });
        }
        Ok(out)
    }

    /// Open all columns together with their names. With `remove_invalid`,
    /// rows whose opened validity bit is 0 are dropped and the validity
    /// column itself is omitted.
    pub fn open_with_schema(
        &self,
        remove_invalid: bool,
    ) -> Result<(Vec<PlainVector<T>>, Vec<String>)> {
        let mut data = Vec::new();
        let mut names = Vec::new();
        let mut valid = None;

        for (name, c) in &self.columns {
            let opened = match c {
                ColumnData::Arithmetic(v) => v.open()?,
                ColumnData::Boolean(v) => v.open()?,
            };
            if remove_invalid && name == VALID_COL {
                valid = Some(opened);
            } else {
                data.push(opened);
                names.push(name.clone());
            }
        }

        match valid {
            Some(valid) => {
                let data = data.iter().map(|c| c.extract_valid(&valid)).collect();
                Ok((data, names))
            }
            None => Ok((data, names)),
        }
    }

    /// Fetch a column from an opened, labeled table.
    pub fn get_column(
        opened: &(Vec<PlainVector<T>>, Vec<String>),
        name: &str,
    ) -> Result<PlainVector<T>> {
        let (data, labels) = opened;
        match labels.iter().position(|l| l == name) {
            Some(i) => Ok(data[i].clone()),
            None => Err(Error::precondition(format!("column '{name}' not found"))),
        }
    }

    // ===== Aggregation and distinct ==========================================

    /// Odd-even group-by aggregation over the named keys.
    pub fn aggregate(
        &mut self,
        group_keys: &[&str],
        spec: AggSpec<'_>,
        opt: AggregationOptions,
    ) -> Result<&mut Self> {
        // With sorting disabled the caller has pre-sorted and names every
        // key explicitly (including validity).
        let mut keys: Vec<&str> = group_keys.to_vec();
        if opt.do_sort {
            keys.insert(0, VALID_COL);
            self.sort_all(&keys, SortOrder::Asc, SortingProtocol::Default)?;
        }

        let original_size = self.size();
        self.pad_power_of_two(T::ZERO);

        let mut keys_vec = Vec::with_capacity(keys.len());
        for name in &keys {
            keys_vec.push(self.b_column(name)?);
        }

        let mut b_agg: Vec<BAggSpec<T>> = Vec::new();
        let mut a_agg: Vec<AAggSpec<T>> = Vec::new();
        let mut has_any_aggregation = false;

        for (data, result, func) in spec {
            let d_encoding = self.column(data)?.encoding();
            if d_encoding != self.column(result)?.encoding() {
                return Err(Error::WrongEncoding(format!(
                    "aggregation input '{data}' and output '{result}' encodings differ"
                )));
            }
            if func.is_aggregation() {
                has_any_aggregation = true;
            }
            match d_encoding {
                Encoding::Arithmetic => {
                    a_agg.push((self.a_column(data)?, self.a_column(result)?, func.arithmetic()?));
                }
                Encoding::Boolean => {
                    b_agg.push((self.b_column(data)?, self.b_column(result)?, func.boolean()?));
                }
            }
        }

        let mut table_id_vec = None;
        if opt.mark_valid {
            // Mark each group's first row so the post-pass can invalidate
            // the rest; a copy aggregation propagates join-side bits down.
            self.add_columns_internal(&[UNIQ_COL])?;
            self.distinct_into(&keys, UNIQ_COL)?;

            if let Some(table_id) = &opt.table_id {
                table_id_vec = Some(self.b_column(table_id)?);
            }
        }

        let dir = if opt.reverse {
            Direction::Reverse
        } else {
            Direction::Forward
        };

        tracing::debug!(
            table = %self.name,
            keys = keys_vec.len(),
            rows = self.size(),
            aggs = b_agg.len() + a_agg.len(),
            "table aggregate"
        );

        aggregate(&keys_vec, &b_agg, &a_agg, dir, table_id_vec.as_ref(), &self.ctx)?;

        if original_size < self.size() {
            self.resize(original_size);
        }

        // Validity post-processing: for real aggregations, only the
        // result row of each group stays valid. When the spec only
        // carries columns (a pure join), all rows stay.
        if opt.mark_valid {
            if has_any_aggregation {
                let uniq_col = self.b_column(UNIQ_COL)?;
                let valid_col = self.valid_column();
                if opt.reverse {
                    // result in the bottom row of each group
                    let short_valid = valid_col.slice_range(0, valid_col.size() - 1);
                    short_valid.and_assign(&uniq_col.slice_from(1))?;
                } else {
                    self.filter(&uniq_col)?;
                }
            }
            self.delete_columns(&[UNIQ_COL]);
        }

        Ok(self)
    }

    /// Mark rows whose keys differ from the previous row into `result`.
    /// Adjacent comparison only; sort first for global uniqueness.
    pub fn distinct_into(&self, keys: &[&str], result: &str) -> Result<()> {
        let mut keys_vec = Vec::with_capacity(keys.len());
        for name in keys {
            if *name == result {
                return Err(Error::precondition(
                    "distinct result column cannot be a key",
                ));
            }
            keys_vec.push(self.b_column(name)?);
        }
        distinct(&keys_vec, &self.b_column(result)?)
    }

    /// Keep one row per distinct key combination: sort on
    /// `VALID || keys`, mark first-of-group rows, filter.
    pub fn distinct(&mut self, keys: &[&str]) -> Result<&mut Self> {
        let mut sort_keys: Vec<&str> = keys.to_vec();
        sort_keys.insert(0, VALID_COL);
        self.sort_all(&sort_keys, SortOrder::Asc, SortingProtocol::Default)?;

        self.add_columns_internal(&[UNIQ_COL])?;
        self.distinct_into(keys, UNIQ_COL)?;

        self.filter(&self.b_column(UNIQ_COL)?)?;
        self.delete_columns(&[UNIQ_COL]);
        Ok(self)
    }

    // ===== Stream windows ====================================================

    /// Assign each row its tumbling window id: `time / window_size`.
    pub fn tumbling_window(&self, time_a: &str, window_size: T, result: &str) -> Result<()> {
        streaming::tumbling_window(
            &self.a_column(time_a)?,
            window_size,
            &self.a_column(result)?,
        )
    }

    /// Gap-session windows over per-key timestamp streams. Sorts on
    /// `time || keys` unless the caller already did.
    pub fn gap_session_window(
        &mut self,
        keys: &[&str],
        time_a: &str,
        time_b: &str,
        window_id: &str,
        gap: T,
        do_sort: bool,
    ) -> Result<&mut Self> {
        if do_sort {
            let mut sorting: Vec<&str> = vec![time_b];
            sorting.extend(keys.iter().filter(|k| **k != time_b).copied());
            self.sort_all(&sorting, SortOrder::Asc, SortingProtocol::Default)?;
        }

        let mut keys_vec = Vec::with_capacity(keys.len());
        for name in keys {
            keys_vec.push(self.b_column(name)?);
        }

        streaming::gap_session_window(
            &keys_vec,
            &self.a_column(time_a)?,
            &self.b_column(time_b)?,
            &self.b_column(window_id)?,
            gap,
        )?;
        Ok(self)
    }

    /// Threshold-session windows: sessions start where a monitored value
    /// crosses above the threshold. Rows never above the threshold are
    /// filtered out when `mark_valid` is set.
    #[allow(clippy::too_many_arguments)]
    pub fn threshold_session_window(
        &mut self,
        keys: &[&str],
        function_res: &str,
        time_b: &str,
        window_id: &str,
        threshold: T,
        do_sort: bool,
        mark_valid: bool,
    ) -> Result<&mut Self> {
        if do_sort {
            let mut sorting: Vec<&str> = vec![time_b];
            sorting.extend(keys.iter().filter(|k| **k != time_b).copied());
            self.sort_all(&sorting, SortOrder::Asc, SortingProtocol::Default)?;
        }

        let mut keys_vec = Vec::with_capacity(keys.len());
        for name in keys {
            keys_vec.push(self.b_column(name)?);
        }

        let window = self.b_column(window_id)?;
        streaming::threshold_session_window(
            &keys_vec,
            &self.b_column(function_res)?,
            &self.b_column(time_b)?,
            &window,
            threshold,
        )?;

        if mark_valid {
            let zero = BSharedVector::zeroed(&self.ctx, window.size());
            self.filter(&window.gt(&zero)?)?;
        }
        Ok(self)
    }

    // ===== Concatenation =====================================================

    /// Vertically stack `other` below `self` into a new table whose schema
    /// is the union of both. The table-id column is 0 for `self`'s rows
    /// and 1 for `other`'s. With `power_of_two`, the result is padded to
    /// the next power of two and the padding invalidated.
    pub fn concatenate(&self, other: &Self, power_of_two: bool) -> Result<Self> {
        let mut new_schema: Vec<&str> = vec![TABLE_ID_COL];
        for (name, _) in &self.columns {
            if name != TABLE_ID_COL {
                new_schema.push(name.as_str());
            }
        }
        for (name, _) in &other.columns {
            if self.find(name).is_none() {
                new_schema.push(name.as_str());
            }
        }

        let old_size = self.size() + other.size();
        let new_size = if power_of_two {
            old_size.next_power_of_two()
        } else {
            old_size
        };

        let mut new_table = Self {
            name: format!("{}+{}", self.name, other.name),
            columns: Vec::new(),
            rows: new_size,
            ctx: self.ctx.clone(),
        };
        for name in &new_schema {
            new_table.add_column_unchecked(name, new_size);
        }
        new_table.configure_valid();

        for (name, _) in &self.columns {
            new_table.copy_column_from(self, name, 0)?;
        }
        let other_start = self.size();
        for (name, _) in &other.columns {
            new_table.copy_column_from(other, name, other_start)?;
        }

        // 0 marks rows from self (the zero-initialized default); flag the
        // other table's rows
        let id_col = new_table.b_column(TABLE_ID_COL)?;
        id_col
            .slice_range(other_start, other_start + other.size())
            .assign(&BSharedVector::public_repeated(&self.ctx, T::ONE, other.size()));

        if power_of_two {
            new_table
                .valid_column()
                .slice_from(old_size)
                .zero();
        }

        Ok(new_table)
    }

    fn copy_column_from(&self, source: &Self, name: &str, start: usize) -> Result<()> {
        match source.column(name)? {
            ColumnData::Arithmetic(src) => self
                .a_column(name)?
                .slice_range(start, start + src.size())
                .assign(src),
            ColumnData::Boolean(src) => self
                .b_column(name)?
                .slice_range(start, start + src.size())
                .assign(src),
        }
        Ok(())
    }
}
