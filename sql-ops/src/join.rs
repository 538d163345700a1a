/*
 * This Source Code Form is subject to the terms of the Mozilla Public License,
 * v. 2.0. If a copy of the MPL was not distributed with this file, You can
 * obtain one at http://mozilla.org/MPL/2.0/.
 *
 *
 * Copyright 2018-2022 Clemens Lutz
 * Author: Clemens Lutz <lutzcle@cml.li>
 */

//! Inner join operators that return gather maps.
//!
//! All joins treat the right table as the build side and the left table as
//! the probe side. The gather map lists matching pairs ordered by left row
//! and, for each left row, by right row.

pub mod bucket_chain_join;
pub mod conditional_join;
pub mod hash_join;
mod hashing_scheme;
pub mod mixed_join;

pub use hashing_scheme::HashingScheme;

use crate::column::ColumnType;
use crate::error::{ErrorKind, Result};
use crate::table::TableView;
use bench_runtime::runtime::memory::TrackedMem;

/// Number of probe rows that a task processes at a time.
pub(crate) const PROBE_CHUNK_LEN: usize = 1 << 12;

const NULL_HASH_BITS: u64 = 0x5bd1_e995_5bd1_e995;

/// Specifies whether two `NULL` keys are equal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NullEquality {
    Equal,
    Unequal,
}

/// Pairs of matching row indices.
#[derive(Clone, Debug)]
pub struct GatherMap {
    left: TrackedMem<usize>,
    right: TrackedMem<usize>,
}

impl GatherMap {
    pub fn new(left: TrackedMem<usize>, right: TrackedMem<usize>) -> Result<Self> {
        if left.len() != right.len() {
            Err(ErrorKind::InvalidArgument(format!(
                "Gather map sides have different lengths: {} and {}",
                left.len(),
                right.len()
            )))?;
        }

        Ok(Self { left, right })
    }

    /// Concatenates per-chunk pairs in chunk order.
    pub(crate) fn from_chunks(chunks: Vec<Vec<(usize, usize)>>) -> Self {
        let len = chunks.iter().map(|chunk| chunk.len()).sum();
        let mut left = Vec::with_capacity(len);
        let mut right = Vec::with_capacity(len);

        for (l, r) in chunks.into_iter().flatten() {
            left.push(l);
            right.push(r);
        }

        Self {
            left: left.into(),
            right: right.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    pub fn left_indices(&self) -> &[usize] {
        &self.left
    }

    pub fn right_indices(&self) -> &[usize] {
        &self.right
    }
}

/// Joins two tables on all of their columns with the given hashing scheme.
pub fn hash_inner_join<T: ColumnType>(
    left: &TableView<'_, T>,
    right: &TableView<'_, T>,
    nulls: NullEquality,
    hashing_scheme: HashingScheme,
) -> Result<GatherMap> {
    match hashing_scheme {
        HashingScheme::LinearProbing => hash_join::inner_join(left, right, nulls),
        HashingScheme::BucketChaining => {
            bucket_chain_join::join_gather_maps(left, right, nulls == NullEquality::Equal)
        }
    }
}

pub(crate) fn check_join_keys<T: ColumnType>(
    left: &TableView<'_, T>,
    right: &TableView<'_, T>,
) -> Result<()> {
    if left.num_columns() == 0 {
        Err(ErrorKind::InvalidArgument(
            "Join requires at least one key column".to_string(),
        ))?;
    }
    if left.num_columns() != right.num_columns() {
        Err(ErrorKind::InvalidArgument(format!(
            "Left table has {} key columns, but right table has {}",
            left.num_columns(),
            right.num_columns()
        )))?;
    }

    Ok(())
}

/// Returns `false` if the row can never match, because it contains a `NULL`
/// key and nulls are unequal.
pub(crate) fn is_joinable<T: ColumnType>(
    view: &TableView<'_, T>,
    row: usize,
    nulls: NullEquality,
) -> bool {
    nulls == NullEquality::Equal || view.is_row_valid(row)
}

pub(crate) fn row_hash<T: ColumnType>(view: &TableView<'_, T>, row: usize) -> u64 {
    view.columns().iter().fold(0, |hash, column| {
        let bits = column.get(row).map_or(NULL_HASH_BITS, |value| value.to_bits());
        fmix64(hash.rotate_left(5) ^ bits)
    })
}

pub(crate) fn keys_equal<T: ColumnType>(
    left: &TableView<'_, T>,
    left_row: usize,
    right: &TableView<'_, T>,
    right_row: usize,
    nulls: NullEquality,
) -> bool {
    left.columns()
        .iter()
        .zip(right.columns().iter())
        .all(|(l, r)| match (l.get(left_row), r.get(right_row)) {
            (Some(a), Some(b)) => a == b,
            (None, None) => nulls == NullEquality::Equal,
            _ => false,
        })
}

/// MurmurHash3 finalizer.
fn fmix64(mut k: u64) -> u64 {
    k ^= k >> 33;
    k = k.wrapping_mul(0xff51_afd7_ed55_8ccd);
    k ^= k >> 33;
    k = k.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    k ^ (k >> 33)
}
