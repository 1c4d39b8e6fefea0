//! Plain (unshared) vectors with lazy access patterns (L0).
//!
//! A [`PlainVector`] is a dense buffer of elements paired with an optional
//! **mapping** — a reordering/selection of indices — and a **batch window**
//! `[start, end)` that scopes relative operations. Access patterns
//! (`slice`, strides, alternations, repetitions, reversals, gathers) are
//! O(1)-per-index view constructions that never copy element data: they
//! build a new mapping over the same shared storage. Writes through any
//! view are observed by every other view of the same storage.
//!
//! Two index spaces exist:
//!
//! - the *storage* space (raw buffer indices), and
//! - the *logical* space `[0, total_size())`, the storage space filtered
//!   through the mapping.
//!
//! The batch window is relative to the logical space; [`PlainVector::size`]
//! is the batch span and element access via [`PlainVector::get`] /
//! [`PlainVector::set`] resolves `batch_start + i` through the mapping.
//! Access-pattern constructors operate on the full logical space and
//! return views with a reset batch.
//!
//! # Example
//!
//! ```
//! use shroud::vector::PlainVector;
//!
//! let v: PlainVector<i32> = (0..8).collect();
//! let evens = v.simple_subset_reference(0, 2, 7);
//! assert!(evens.same_as(&PlainVector::from(vec![0, 2, 4, 6])));
//!
//! // Views write through to the shared storage.
//! evens.set(0, 100);
//! assert_eq!(v.get(0), 100);
//! ```

use crate::element::Element;
use crate::error::{Error, Result};
use crate::storage::SharedStorage;
use std::sync::Arc;

/// A dense element buffer with an optional index mapping and batch window.
pub struct PlainVector<T> {
    storage: SharedStorage<T>,
    mapping: Option<Arc<Vec<usize>>>,
    batch_start: usize,
    batch_end: usize,
}

impl<T: Element> Clone for PlainVector<T> {
    /// Shallow copy: the clone shares storage and mapping with `self`.
    /// Use [`PlainVector::materialize`] for an independent copy.
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            mapping: self.mapping.clone(),
            batch_start: self.batch_start,
            batch_end: self.batch_end,
        }
    }
}

impl<T: Element> From<Vec<T>> for PlainVector<T> {
    fn from(data: Vec<T>) -> Self {
        let len = data.len();
        Self {
            storage: SharedStorage::new(data),
            mapping: None,
            batch_start: 0,
            batch_end: len,
        }
    }
}

impl<T: Element> From<&[T]> for PlainVector<T> {
    fn from(data: &[T]) -> Self {
        Self::from(data.to_vec())
    }
}

impl<T: Element> FromIterator<T> for PlainVector<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<T>>())
    }
}

impl<T: Element> std::fmt::Debug for PlainVector<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: Element> PlainVector<T> {
    // ===== Constructors =======================================================

    /// A zero-initialized vector of `size` elements.
    pub fn zeroed(size: usize) -> Self {
        Self {
            storage: SharedStorage::zeroed(size),
            mapping: None,
            batch_start: 0,
            batch_end: size,
        }
    }

    /// A vector of `size` copies of `value`.
    pub fn filled(size: usize, value: T) -> Self {
        Self::from(vec![value; size])
    }

    fn from_parts(storage: SharedStorage<T>, mapping: Vec<usize>) -> Self {
        let len = mapping.len();
        Self {
            storage,
            mapping: Some(Arc::new(mapping)),
            batch_start: 0,
            batch_end: len,
        }
    }

    /// A vector with the same length as `self` and no mapping.
    pub fn construct_like(&self) -> Self {
        Self::zeroed(self.size())
    }

    // ===== Size and element access ============================================

    /// Number of elements in the current batch window.
    #[inline]
    pub fn size(&self) -> usize {
        self.batch_end - self.batch_start
    }

    /// Logical length of the vector (mapping length, or storage length).
    #[inline]
    pub fn total_size(&self) -> usize {
        match &self.mapping {
            Some(m) => m.len(),
            None => self.storage.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Whether an index mapping is applied (a trivial mapping counts).
    #[inline]
    pub fn has_mapping(&self) -> bool {
        self.mapping.is_some()
    }

    #[inline]
    fn resolve(&self, index: usize) -> usize {
        let j = self.batch_start + index;
        match &self.mapping {
            Some(m) => m[j],
            None => j,
        }
    }

    // Logical index -> storage index, ignoring the batch window. Access
    // patterns are built in this space.
    #[inline]
    fn logical(&self, index: usize) -> usize {
        match &self.mapping {
            Some(m) => m[index],
            None => index,
        }
    }

    /// Element at `index`, relative to the current batch.
    #[inline]
    pub fn get(&self, index: usize) -> T {
        self.storage.get(self.resolve(index))
    }

    /// Overwrite the element at `index`, relative to the current batch.
    /// The write is visible through every view sharing this storage.
    #[inline]
    pub fn set(&self, index: usize, value: T) {
        self.storage.set(self.resolve(index), value);
    }

    /// Iterate over the batch window.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        (0..self.size()).map(move |i| self.get(i))
    }

    /// Copy the batch window into an owned `Vec`.
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }

    // ===== Batch window =======================================================

    /// Restrict relative operations to logical indices `[start, end)`.
    /// Out-of-range bounds are clamped.
    pub fn set_batch(&mut self, start: usize, end: usize) {
        let total = self.total_size();
        self.batch_start = start.min(total);
        self.batch_end = end.min(total).max(self.batch_start);
    }

    /// Reset the batch window to the whole vector.
    pub fn reset_batch(&mut self) {
        self.batch_start = 0;
        self.batch_end = self.total_size();
    }

    // ===== Access patterns ====================================================
    //
    // All constructors below index the full logical space and return views
    // with a reset batch.

    /// Gather by stride: elements at `start, start + step, ...` up to the
    /// **inclusive** `end` index. With `step == 1` this is [`Self::slice`].
    pub fn simple_subset_reference(&self, start: usize, step: usize, end: usize) -> Self {
        if step == 1 {
            return self.slice_range(start, end + 1);
        }
        let size = self
            .total_size()
            .min((end - start) / step + 1);
        let mut mapping = Vec::with_capacity(size);
        let mut j = start;
        for _ in 0..size {
            mapping.push(self.logical(j));
            j += step;
        }
        Self::from_parts(self.storage.clone(), mapping)
    }

    /// Stride view from `start` to the end of the vector.
    pub fn simple_subset_reference_from(&self, start: usize, step: usize) -> Self {
        self.simple_subset_reference(start, step, self.total_size().saturating_sub(1))
    }

    /// Contiguous view of logical indices `[start, end)` (exclusive end,
    /// clamped to the vector).
    pub fn slice_range(&self, start: usize, end: usize) -> Self {
        let end = end.min(self.total_size());
        assert!(start <= end, "slice start {start} past end {end}");
        let mapping: Vec<usize> = (start..end).map(|j| self.logical(j)).collect();
        Self::from_parts(self.storage.clone(), mapping)
    }

    /// Contiguous view from `start` to the end of the vector.
    pub fn slice_from(&self, start: usize) -> Self {
        self.slice_range(start, self.total_size())
    }

    /// Take `included` elements, then skip `excluded`, repeatedly. The final
    /// included chunk may be short.
    pub fn alternating_subset_reference(&self, included: usize, excluded: usize) -> Self {
        let total = self.total_size();
        let chunk = included + excluded;
        let size = total / chunk * included + included.min(total % chunk);
        let mut mapping = Vec::with_capacity(size);
        let mut i = 0;
        let mut j = 0;
        while i < size {
            let mut k = 0;
            while i < size && k < included {
                mapping.push(self.logical(j + k));
                i += 1;
                k += 1;
            }
            j += chunk;
        }
        Self::from_parts(self.storage.clone(), mapping)
    }

    /// Like [`Self::alternating_subset_reference`], but each included chunk
    /// is taken in reverse index order (the partial final chunk counts down
    /// from the last element).
    pub fn reversed_alternating_subset_reference(&self, included: usize, excluded: usize) -> Self {
        let total = self.total_size();
        let chunk = included + excluded;
        let full_chunks = total / chunk;
        let last_chunk = included.min(total % chunk);
        let size = full_chunks * included + last_chunk;
        let mut mapping = Vec::with_capacity(size);
        let mut chunk_end = included - 1;
        for _ in 0..full_chunks {
            for j in 0..included {
                mapping.push(self.logical(chunk_end - j));
            }
            chunk_end += chunk;
        }
        let chunk_end = total - 1;
        for j in 0..last_chunk {
            mapping.push(self.logical(chunk_end - j));
        }
        Self::from_parts(self.storage.clone(), mapping)
    }

    /// Each element repeated `repetition` times consecutively.
    pub fn repeated_subset_reference(&self, repetition: usize) -> Self {
        let total = self.total_size();
        let mut mapping = Vec::with_capacity(total * repetition);
        for j in 0..total {
            let s = self.logical(j);
            for _ in 0..repetition {
                mapping.push(s);
            }
        }
        Self::from_parts(self.storage.clone(), mapping)
    }

    /// The whole sequence repeated `cycles` times end-to-end.
    pub fn cyclic_subset_reference(&self, cycles: usize) -> Self {
        let total = self.total_size();
        let mut mapping = Vec::with_capacity(total * cycles);
        for _ in 0..cycles {
            for k in 0..total {
                mapping.push(self.logical(k));
            }
        }
        Self::from_parts(self.storage.clone(), mapping)
    }

    /// `direction = 1` is the identity view; `direction = -1` reverses.
    pub fn directed_subset_reference(&self, direction: i32) -> Self {
        if direction == -1 {
            let total = self.total_size();
            let mapping: Vec<usize> = (0..total).rev().map(|j| self.logical(j)).collect();
            Self::from_parts(self.storage.clone(), mapping)
        } else {
            self.clone()
        }
    }

    /// Data-dependent filter view: keeps the positions where `flag` is
    /// nonzero. If `flag` is shorter, the remaining positions are excluded.
    ///
    /// The returned view's length equals the number of set flags — a
    /// data-dependent disclosure. Callers must shuffle or pad upstream if
    /// that count is sensitive.
    pub fn included_reference<F: Element>(&self, flag: &PlainVector<F>) -> Self {
        let bound = self.total_size().min(flag.total_size());
        let mut mapping = Vec::with_capacity(bound);
        for fi in 0..bound {
            if flag.get(fi) != F::ZERO {
                mapping.push(self.logical(fi));
            }
        }
        Self::from_parts(self.storage.clone(), mapping)
    }

    /// Explicit mapping override: the *values* of `map` become the new
    /// mapping. Requires that no mapping is applied yet.
    pub fn mapping_reference<M: Element>(&self, map: &PlainVector<M>) -> Result<Self> {
        if self.has_mapping() {
            return Err(Error::precondition(
                "mapping_reference on an already-mapped vector",
            ));
        }
        let storage_len = self.storage.len();
        let mut mapping = Vec::with_capacity(map.size());
        for i in 0..map.size() {
            let idx = map.get(i).as_index();
            if idx >= storage_len {
                return Err(Error::precondition(format!(
                    "mapping entry {idx} out of range for storage of {storage_len}"
                )));
            }
            mapping.push(idx);
        }
        Ok(Self::from_parts(self.storage.clone(), mapping))
    }

    /// Compose a mapping under the existing one: after the call,
    /// `self[i]` refers to what `self[map[i]]` referred to before. The new
    /// mapping must not be larger than the current size.
    pub fn apply_mapping<M: Element>(&mut self, map: &PlainVector<M>) -> Result<()> {
        let size = map.size();
        if size > self.size() {
            return Err(Error::precondition(format!(
                "apply_mapping grows vector from {} to {size}",
                self.size()
            )));
        }
        let mut composed = Vec::with_capacity(size);
        for i in 0..size {
            composed.push(self.logical(map.get(i).as_index()));
        }
        self.mapping = Some(Arc::new(composed));
        self.reset_batch();
        Ok(())
    }

    // ===== Mutation ===========================================================

    /// Copy of the batch window in fresh, unmapped storage.
    pub fn materialize(&self) -> Self {
        Self::from(self.to_vec())
    }

    /// Collapse the mapping into fresh storage, dropping the mapping and
    /// resetting the batch. No-op when unmapped. Required before handing a
    /// vector to the transport, which assumes contiguous backing storage.
    pub fn materialize_inplace(&mut self) {
        if self.has_mapping() {
            let data = self.to_vec();
            *self = Self::from(data);
        }
    }

    /// Elementwise copy `other` into the batch window of `self`, writing
    /// through mapping and shared storage. Sizes must match.
    pub fn assign(&self, other: &Self) {
        assert_eq!(self.size(), other.size(), "assign size mismatch");
        for i in 0..self.size() {
            self.set(i, other.get(i));
        }
    }

    /// Elementwise truncating/extending copy from a vector of a different
    /// element type.
    pub fn assign_cast<S: Element>(&self, other: &PlainVector<S>) {
        assert_eq!(self.size(), other.size(), "assign_cast size mismatch");
        for i in 0..self.size() {
            self.set(i, T::from_i128(other.get(i).to_i128()));
        }
    }

    /// Reverse the batch window in place (through the view).
    pub fn reverse(&self) {
        let n = self.size();
        for i in 0..n / 2 {
            let (a, b) = (self.get(i), self.get(n - 1 - i));
            self.set(i, b);
            self.set(n - 1 - i, a);
        }
    }

    /// Zero the batch window.
    pub fn zero(&self) {
        for i in 0..self.size() {
            self.set(i, T::ZERO);
        }
    }

    /// AND every element with `n`.
    pub fn mask(&self, n: T) {
        for i in 0..self.size() {
            self.set(i, self.get(i) & n);
        }
    }

    /// OR every element with `n`.
    pub fn set_bits(&self, n: T) {
        for i in 0..self.size() {
            self.set(i, self.get(i) | n);
        }
    }

    /// Grow or shrink to `n` logical elements and reset the batch. Under a
    /// mapping, grown indices point at freshly appended storage.
    pub fn resize(&mut self, n: usize) {
        match &self.mapping {
            Some(m) => {
                let old = m.len();
                let mut mapping = m.as_ref().clone();
                if n > old {
                    let data_old = self.storage.len();
                    self.storage.resize(data_old + (n - old));
                    mapping.extend(data_old..data_old + (n - old));
                } else {
                    mapping.truncate(n);
                }
                self.mapping = Some(Arc::new(mapping));
            }
            None => self.storage.resize(n),
        }
        self.reset_batch();
    }

    /// Retain the last `n` logical elements and reset the batch.
    pub fn tail(&mut self, n: usize) {
        let remove = self.total_size() - n;
        match &self.mapping {
            Some(m) => {
                self.mapping = Some(Arc::new(m[remove..].to_vec()));
            }
            None => {
                let mut data = self.storage.to_vec();
                data.drain(..remove);
                self.storage = SharedStorage::new(data);
            }
        }
        self.reset_batch();
    }

    // ===== Bit-level helpers ==================================================

    fn map_elements(&self, f: impl Fn(T) -> T) -> Self {
        let out = self.construct_like();
        for i in 0..self.size() {
            out.set(i, f(self.get(i)));
        }
        out
    }

    /// Sign-preserving per-element right shift.
    pub fn bit_arithmetic_right_shift(&self, n: u32) -> Self {
        self.map_elements(|x| x.shr_arith(n))
    }

    /// Zero-filling per-element right shift.
    pub fn bit_logical_right_shift(&self, n: u32) -> Self {
        self.map_elements(|x| x.shr_logical(n))
    }

    /// Per-element left shift; high bits are discarded.
    pub fn bit_left_shift(&self, n: u32) -> Self {
        self.map_elements(|x| x.shl(n))
    }

    /// Per-element parity (popcount mod 2) in the LSB.
    pub fn bit_xor(&self) -> Self {
        self.map_elements(|x| x.parity())
    }

    /// Set all bits of each element to its LSB (0 -> 0, 1 -> all ones).
    pub fn extend_lsb(&self) -> Self {
        self.map_elements(|x| (x & T::ONE).wrapping_neg())
    }

    /// Per-element less-than-zero indicator in the LSB.
    pub fn ltz(&self) -> Self {
        self.map_elements(|x| x.shr_logical(T::BITS - 1))
    }

    /// Within every chunk of `2^log_level` bits, copy the LSB of the most
    /// significant half into the entire least significant half.
    pub fn bit_level_shift(&self, log_level: u32) -> Self {
        assert!(log_level >= 1 && log_level <= T::LOG_BITS);
        // Mask selecting the LSB of the most significant half-chunk.
        let half = 1u32 << (log_level - 1);
        let chunk = 1u32 << log_level;
        let mut m: i128 = 0;
        let mut bit = half;
        while bit < T::BITS {
            m |= 1i128 << bit;
            bit += chunk;
        }
        self.level_shift_impl(T::from_i128(m), log_level, false)
    }

    /// Within every chunk of `2^log_level` bits, copy the MSB of the least
    /// significant half into the entire most significant half.
    pub fn reverse_bit_level_shift(&self, log_level: u32) -> Self {
        assert!(log_level >= 1 && log_level <= T::LOG_BITS);
        // Mask selecting the MSB of the least significant half-chunk.
        let half = 1u32 << (log_level - 1);
        let chunk = 1u32 << log_level;
        let mut m: i128 = 0;
        let mut bit = half - 1;
        while bit < T::BITS {
            m |= 1i128 << bit;
            bit += chunk;
        }
        self.level_shift_impl(T::from_i128(m), log_level, true)
    }

    fn level_shift_impl(&self, mask: T, log_level: u32, reverse: bool) -> Self {
        let half = 1u32 << (log_level - 1);
        self.map_elements(|t| {
            let mut or_mask = T::ZERO;
            let mut and_mask = !T::ZERO;
            let mut zero_mask = t | !mask;
            let mut one_mask = t & mask;
            for _ in 0..=half {
                and_mask = and_mask & zero_mask;
                or_mask = or_mask | one_mask;
                if reverse {
                    zero_mask = zero_mask.shl(1);
                    one_mask = one_mask.shl(1);
                } else {
                    zero_mask = zero_mask.shr_arith(1);
                    one_mask = one_mask.shr_arith(1);
                }
            }
            (t & and_mask) | or_mask
        })
    }

    /// Gather designated bit positions across the vector, packing
    /// `T::BITS` extracted bits per output element. The selected positions
    /// are `start, start + step, ...` up to the inclusive `end`, each taken
    /// `repetition` times.
    pub fn simple_bit_compress(&self, start: u32, step: u32, end: u32, repetition: u32) -> Self {
        let w = T::BITS as usize;
        let bits_per_element = (((end - start + 1) / step) * repetition) as usize;
        let total_bits = bits_per_element * self.size();
        let out = Self::zeroed(total_bits.div_ceil(w));
        for k in 0..total_bits {
            let src = self.get(k / bits_per_element);
            let pos = start + ((k % bits_per_element) as u32 / repetition) * step;
            let mut packed = out.get(k / w);
            packed.set_bit(src.get_bit(pos), (k % w) as u32);
            out.set(k / w, packed);
        }
        out
    }

    /// Scatter bits packed by [`Self::simple_bit_compress`] back into the
    /// designated positions of `self`.
    pub fn simple_bit_decompress(
        &self,
        other: &Self,
        start: u32,
        step: u32,
        end: u32,
        repetition: u32,
    ) {
        let w = T::BITS as usize;
        let bits_per_element = (((end - start + 1) / step) * repetition) as usize;
        let total_bits = bits_per_element * self.size();
        for k in 0..total_bits {
            let packed = other.get(k / w);
            let pos = start + ((k % bits_per_element) as u32 / repetition) * step;
            let mut v = self.get(k / bits_per_element);
            v.set_bit(packed.get_bit((k % w) as u32), pos);
            self.set(k / bits_per_element, v);
        }
    }

    fn alternating_bit_geometry(
        start: u32,
        step: u32,
        included: u32,
        excluded: u32,
    ) -> (u32, u32) {
        let bits_per_chunk = included / step;
        let full = (T::BITS - start) / (included + excluded) * bits_per_chunk;
        let last = included.min((T::BITS - start) % (included + excluded)) / step;
        (bits_per_chunk, full + last)
    }

    /// Bit compression with an included/excluded alternation pattern and a
    /// direction: `+1` picks bits LSB-first within each included chunk,
    /// `-1` MSB-first.
    pub fn alternating_bit_compress(
        &self,
        start: u32,
        step: u32,
        included: u32,
        excluded: u32,
        direction: i32,
    ) -> Self {
        let w = T::BITS as usize;
        let (bits_per_chunk, total_bits_per_element) =
            Self::alternating_bit_geometry(start, step, included, excluded);
        let dir_offset = if direction == -1 { included - 1 } else { 0 };
        let total_bits = total_bits_per_element as usize * self.size();
        let out = Self::zeroed(total_bits.div_ceil(w));
        for i in 0..total_bits {
            let rel = (i % total_bits_per_element as usize) as u32;
            let chunk_index = rel / bits_per_chunk;
            let bit_index = (start + dir_offset + chunk_index * (included + excluded)) as i64
                + (rel % bits_per_chunk) as i64 * step as i64 * direction as i64;
            let src = self.get(i / total_bits_per_element as usize);
            let mut packed = out.get(i / w);
            packed.set_bit(src.get_bit(bit_index as u32), (i % w) as u32);
            out.set(i / w, packed);
        }
        out
    }

    /// Inverse of [`Self::alternating_bit_compress`]; `direction` defaults
    /// to `+1` (LSB-first) at call sites that have no preference.
    pub fn alternating_bit_decompress(
        &self,
        other: &Self,
        start: u32,
        step: u32,
        included: u32,
        excluded: u32,
        direction: i32,
    ) {
        let w = T::BITS as usize;
        let (bits_per_chunk, total_bits_per_element) =
            Self::alternating_bit_geometry(start, step, included, excluded);
        let dir_offset = if direction == -1 { included - 1 } else { 0 };
        let total_bits = total_bits_per_element as usize * self.size();
        for i in 0..total_bits {
            let rel = (i % total_bits_per_element as usize) as u32;
            let chunk_index = rel / bits_per_chunk;
            let bit_index = (start + dir_offset + chunk_index * (included + excluded)) as i64
                + (rel % bits_per_chunk) as i64 * step as i64 * direction as i64;
            let packed = other.get(i / w);
            let mut v = self.get(i / total_bits_per_element as usize);
            v.set_bit(packed.get_bit((i % w) as u32), bit_index as u32);
            self.set(i / total_bits_per_element as usize, v);
        }
    }

    /// Extract the bit at `position` from each element of `source` and pack
    /// the bits into `self`, `T::BITS` per element. When `self` has a batch
    /// window, packing starts at the corresponding bit offset of `source`.
    pub fn pack_from(&self, source: &Self, position: u32) {
        let w = T::BITS as usize;
        let base = self.batch_start_bits();
        let total_bits = (self.size() * w).min(source.size().saturating_sub(base));
        let mut i = 0;
        let mut j = 0;
        while j < total_bits {
            let mut r = T::ZERO;
            let mut p = 0;
            while p < w && j + p < total_bits {
                let bit = source.get(j + p + base).get_bit(position);
                r = r | bit.shl(p as u32);
                p += 1;
            }
            self.set(i, r);
            i += 1;
            j += w;
        }
    }

    /// Inverse of [`Self::pack_from`]: place packed bits of `source` at
    /// `position` within each element of `self`. The batch start must be a
    /// multiple of the element width for alignment.
    pub fn unpack_from(&self, source: &Self, position: u32) {
        let w = T::BITS as usize;
        assert!(
            self.batch_start % w == 0,
            "unpack_from batch must align to element width"
        );
        let base = self.batch_start / w;
        let total_bits = self.size();
        let mut i = 0;
        let mut j = 0;
        while j < total_bits {
            let r = source.get(i + base);
            let mut p = 0;
            while p < w && j + p < total_bits {
                let mut v = self.get(j + p);
                v.set_bit(r.get_bit(p as u32), position);
                self.set(j + p, v);
                p += 1;
            }
            i += 1;
            j += w;
        }
    }

    fn batch_start_bits(&self) -> usize {
        self.batch_start * T::BITS as usize
    }

    // ===== Scans and reductions ===============================================

    /// In-place inclusive prefix sum (wrapping).
    pub fn prefix_sum(&self) {
        let mut acc = T::ZERO;
        for i in 0..self.size() {
            acc = acc.wrapping_add(self.get(i));
            self.set(i, acc);
        }
    }

    /// In-place inclusive scan with a custom associative operator.
    pub fn prefix_sum_with(&self, op: impl Fn(T, T) -> T) {
        if self.is_empty() {
            return;
        }
        let mut acc = self.get(0);
        for i in 1..self.size() {
            acc = op(acc, self.get(i));
            self.set(i, acc);
        }
    }

    /// Split into contiguous chunks of `chunk` elements (the last possibly
    /// short) and reduce each chunk to its wrapping sum. `chunk == 0` sums
    /// the whole vector.
    pub fn chunked_sum(&self, chunk: usize) -> Self {
        let chunk = if chunk == 0 { self.size() } else { chunk };
        let n = self.size();
        let out = Self::zeroed(n.div_ceil(chunk));
        let mut j = 0;
        for i in 0..out.size() {
            let mut sum = T::ZERO;
            let end = (j + chunk).min(n);
            while j < end {
                sum = sum.wrapping_add(self.get(j));
                j += 1;
            }
            out.set(i, sum);
        }
        out
    }

    /// Chunked dot product with `other`; each chunk of `chunk` element
    /// pairs reduces to one output element.
    pub fn dot_product(&self, other: &Self, chunk: usize) -> Self {
        assert_eq!(self.size(), other.size(), "dot_product size mismatch");
        let chunk = if chunk == 0 { self.size() } else { chunk };
        let n = self.size();
        let out = Self::zeroed(n.div_ceil(chunk));
        let mut j = 0;
        for i in 0..out.size() {
            let mut sum = T::ZERO;
            let end = (j + chunk).min(n);
            while j < end {
                sum = sum.wrapping_add(self.get(j).wrapping_mul(other.get(j)));
                j += 1;
            }
            out.set(i, sum);
        }
        out
    }

    /// Quotient and remainder by a public constant, computed in one pass.
    pub fn divrem(&self, d: T) -> (Self, Self) {
        let q = self.construct_like();
        let r = self.construct_like();
        for i in 0..self.size() {
            let x = self.get(i);
            q.set(i, x.wrapping_div(d));
            r.set(i, x.wrapping_rem(d));
        }
        (q, r)
    }

    /// Gather-copy of the positions where `valid` is nonzero. Used after
    /// opening to drop invalid rows.
    pub fn extract_valid(&self, valid: &Self) -> Self {
        assert_eq!(self.size(), valid.size(), "extract_valid size mismatch");
        let mut out = Vec::new();
        for i in 0..self.size() {
            if valid.get(i) != T::ZERO {
                out.push(self.get(i));
            }
        }
        Self::from(out)
    }

    // ===== Comparisons ========================================================

    /// Elementwise equality under batch and mapping.
    pub fn same_as(&self, other: &Self) -> bool {
        if self.size() != other.size() {
            return false;
        }
        (0..self.size()).all(|i| self.get(i) == other.get(i))
    }

    /// Whether `prefix` is a prefix of this vector.
    pub fn starts_with(&self, prefix: &Self) -> bool {
        if prefix.total_size() > self.total_size() {
            return false;
        }
        (0..prefix.size()).all(|i| self.get(i) == prefix.get(i))
    }
}

/// Gather-copy of strided elements: `start, start + step, ...` up to the
/// inclusive `end`. The copying counterpart of
/// [`PlainVector::simple_subset_reference`].
pub fn simple_subset<T: Element>(
    v: &PlainVector<T>,
    start: usize,
    step: usize,
    end: usize,
) -> PlainVector<T> {
    let size = (end - start) / step + 1;
    let out = PlainVector::zeroed(size);
    for i in 0..size {
        out.set(i, v.get(start + i * step));
    }
    out
}
