// Copyright 2022 Clemens Lutz
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Columns of fixed-width integers with optional validity bitmasks.
//!
//! A validity bitmask stores one bit per row in 32-bit words. A set bit marks
//! a valid row, and a cleared bit marks a `NULL` row. Bit `i` of the mask is
//! stored in word `i / 32` at bit position `i % 32`.
//!
//! A column without a bitmask is implicitly valid in all rows. A column with a
//! bitmask caches the number of `NULL` rows, which always equals the number of
//! cleared bits in the mask.

use crate::error::{ErrorKind, Result};
use bench_runtime::runtime::memory::TrackedMem;
use num_traits::{FromPrimitive, PrimInt};
use rayon::prelude::*;
use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::ops::Range;

const WORD_BITS: usize = 32;

/// Number of bitmask words that one task of `par_valid_if` fills.
pub const VALID_IF_CHUNK_WORDS: usize = 1024;

/// A fixed-width integer type that can be stored in a column.
pub trait ColumnType:
    PrimInt + FromPrimitive + Hash + Default + Debug + Display + Send + Sync + 'static
{
    /// Returns the bits of the value, sign-extended to 64 bits.
    fn to_bits(self) -> u64;
}

macro_rules! impl_column_type {
    ($Type:ty) => {
        impl ColumnType for $Type {
            fn to_bits(self) -> u64 {
                self as i64 as u64
            }
        }
    };
}

impl_column_type!(i32);
impl_column_type!(i64);

/// A validity bitmask.
#[derive(Clone, Debug)]
pub struct Bitmask {
    words: TrackedMem<u32>,
    len: usize,
}

impl Bitmask {
    /// Creates a bitmask of `len` bits, with all bits set to `valid`.
    pub fn new(len: usize, valid: bool) -> Self {
        let word = if valid { !0 } else { 0 };
        let words = vec![word; Self::words_for(len)];
        let mut mask = Self {
            words: words.into(),
            len,
        };
        mask.clear_tail();
        mask
    }

    /// Returns the number of words required for `len` bits.
    pub fn words_for(len: usize) -> usize {
        (len + WORD_BITS - 1) / WORD_BITS
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Returns `true` if `row` is valid.
    ///
    /// Panics if `row` is out of bounds.
    pub fn is_valid(&self, row: usize) -> bool {
        assert!(row < self.len, "Row {} out of bounds", row);
        (self.words[row / WORD_BITS] >> (row % WORD_BITS)) & 1 == 1
    }

    pub fn set_valid(&mut self, row: usize, valid: bool) {
        assert!(row < self.len, "Row {} out of bounds", row);
        let bit = 1 << (row % WORD_BITS);
        let word = &mut self.words[row / WORD_BITS];

        if valid {
            *word |= bit;
        } else {
            *word &= !bit;
        }
    }

    /// Counts the `NULL` rows, i.e., the cleared bits.
    pub fn count_nulls(&self) -> usize {
        let valid: usize = self
            .words
            .par_iter()
            .map(|word| word.count_ones() as usize)
            .sum();
        self.len - valid
    }

    // Bits past `len` are always cleared, so that `count_nulls` can count
    // whole words
    fn clear_tail(&mut self) {
        let tail = self.len % WORD_BITS;
        if tail != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1 << tail) - 1;
            }
        }
    }
}

/// Compacts a sequence of validity flags into a bitmask.
///
/// Returns the bitmask and its number of `NULL` rows.
pub fn valid_if<I>(validity: I) -> (Bitmask, usize)
where
    I: IntoIterator<Item = bool>,
{
    let mut words = Vec::new();
    let mut len = 0;
    let mut nulls = 0;

    for valid in validity {
        if len % WORD_BITS == 0 {
            words.push(0_u32);
        }
        if valid {
            if let Some(word) = words.last_mut() {
                *word |= 1 << (len % WORD_BITS);
            }
        } else {
            nulls += 1;
        }
        len += 1;
    }

    let mask = Bitmask {
        words: words.into(),
        len,
    };
    (mask, nulls)
}

/// Compacts the validity flags of `len` rows into a bitmask in parallel.
///
/// The rows are split into chunks of `VALID_IF_CHUNK_WORDS` words. For each
/// chunk, `validity` is called once with the chunk's row range and must
/// yield the flags of these rows in order. Missing flags are `NULL`.
///
/// Returns the bitmask and its number of `NULL` rows.
pub fn par_valid_if<F, I>(len: usize, validity: F) -> (Bitmask, usize)
where
    F: Fn(Range<usize>) -> I + Sync,
    I: IntoIterator<Item = bool>,
{
    let mut words = TrackedMem::<u32>::new(Bitmask::words_for(len));
    let chunk_rows = VALID_IF_CHUNK_WORDS * WORD_BITS;

    let valid: usize = words
        .par_chunks_mut(VALID_IF_CHUNK_WORDS)
        .enumerate()
        .map(|(chunk_id, chunk)| {
            let begin = chunk_id * chunk_rows;
            let end = (begin + chunk_rows).min(len);
            let mut valid = 0;

            for (offset, is_valid) in validity(begin..end)
                .into_iter()
                .take(end - begin)
                .enumerate()
            {
                if is_valid {
                    chunk[offset / WORD_BITS] |= 1 << (offset % WORD_BITS);
                    valid += 1;
                }
            }

            valid
        })
        .sum();

    (Bitmask { words, len }, len - valid)
}

/// A column of fixed-width integers.
#[derive(Clone, Debug)]
pub struct Column<T> {
    data: TrackedMem<T>,
    null_mask: Option<Bitmask>,
    null_count: usize,
}

impl<T: ColumnType> Column<T> {
    /// Creates a column without a bitmask.
    pub fn new(data: TrackedMem<T>) -> Self {
        Self {
            data,
            null_mask: None,
            null_count: 0,
        }
    }

    pub fn from_vec(data: Vec<T>) -> Self {
        Self::new(data.into())
    }

    /// Creates a column with a bitmask.
    ///
    /// Fails if the bitmask's length or `NULL` count don't match the data.
    pub fn with_null_mask(
        data: TrackedMem<T>,
        null_mask: Bitmask,
        null_count: usize,
    ) -> Result<Self> {
        let mut column = Self::new(data);
        column.set_null_mask(null_mask, null_count)?;
        Ok(column)
    }

    /// Replaces the column's bitmask.
    pub fn set_null_mask(&mut self, null_mask: Bitmask, null_count: usize) -> Result<()> {
        if null_mask.len() != self.len() {
            Err(ErrorKind::InvalidArgument(format!(
                "Null mask has {} rows, but column has {} rows",
                null_mask.len(),
                self.len()
            )))?;
        }

        let actual_nulls = null_mask.count_nulls();
        if actual_nulls != null_count {
            Err(ErrorKind::InvalidArgument(format!(
                "Null count is {}, but null mask has {} nulls",
                null_count, actual_nulls
            )))?;
        }

        self.null_mask = Some(null_mask);
        self.null_count = null_count;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn null_mask(&self) -> Option<&Bitmask> {
        self.null_mask.as_ref()
    }

    pub fn null_count(&self) -> usize {
        self.null_count
    }

    /// Returns `true` if the column has a bitmask.
    pub fn nullable(&self) -> bool {
        self.null_mask.is_some()
    }

    pub fn has_nulls(&self) -> bool {
        self.null_count > 0
    }

    pub fn is_valid(&self, row: usize) -> bool {
        self.null_mask
            .as_ref()
            .map_or(true, |mask| mask.is_valid(row))
    }

    /// Returns the value of `row`, or `None` if the row is `NULL`.
    pub fn get(&self, row: usize) -> Option<T> {
        if self.is_valid(row) {
            Some(self.data[row])
        } else {
            None
        }
    }
}

/// Allocates a zero-initialized column without a bitmask.
pub fn make_numeric_column<T: ColumnType>(len: usize) -> Column<T> {
    Column::new(TrackedMem::new(len))
}

/// Creates a column with the values `init`, `init + 1`, ..., `init + len - 1`.
pub fn sequence<T: ColumnType>(len: usize, init: T) -> Result<Column<T>> {
    let mut column = make_numeric_column::<T>(len);

    column
        .data_mut()
        .par_iter_mut()
        .enumerate()
        .try_for_each(|(i, value)| -> Result<()> {
            *value = T::from_usize(i)
                .and_then(|i| init.checked_add(&i))
                .ok_or_else(|| {
                    ErrorKind::IntegerOverflow(format!("Sequence value {} overflows", i))
                })?;
            Ok(())
        })?;

    Ok(column)
}
