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

//! Hash join with a bucket-chained hash table.
//!
//! Build rows are pushed onto the front of their bucket's chain with an
//! atomic swap of the bucket head. The previous head becomes the row's
//! successor in the `next` array.

use super::{
    check_join_keys, is_joinable, keys_equal, row_hash, GatherMap, NullEquality,
    PROBE_CHUNK_LEN,
};
use crate::column::ColumnType;
use crate::error::{ErrorKind, Result};
use crate::table::TableView;
use bench_runtime::runtime::memory::TrackedMem;
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};

const END_OF_CHAIN: usize = usize::max_value();

/// A bucket-chained hash table over the rows of a build-side table.
#[derive(Debug)]
pub struct BucketChainHashTable<'a, T> {
    build: TableView<'a, T>,
    nulls: NullEquality,
    heads: TrackedMem<AtomicUsize>,
    next: TrackedMem<AtomicUsize>,
    mask: usize,
}

impl<'a, T: ColumnType> BucketChainHashTable<'a, T> {
    pub fn build(build: &TableView<'a, T>, nulls: NullEquality) -> Result<Self> {
        let buckets = build
            .num_rows()
            .checked_next_power_of_two()
            .ok_or_else(|| {
                ErrorKind::IntegerOverflow("Failed to compute number of buckets".to_string())
            })?
            .max(1);
        let mask = buckets - 1;

        let heads = new_links(buckets);
        let next = new_links(build.num_rows());

        (0..build.num_rows())
            .into_par_iter()
            .filter(|&row| is_joinable(build, row, nulls))
            .for_each(|row| {
                let bucket = row_hash(build, row) as usize & mask;
                let successor = heads[bucket].swap(row, Ordering::AcqRel);
                next[row].store(successor, Ordering::Release);
            });

        Ok(Self {
            build: build.clone(),
            nulls,
            heads,
            next,
            mask,
        })
    }

    pub fn buckets(&self) -> usize {
        self.heads.len()
    }

    pub fn probe(&self, probe: &TableView<'_, T>) -> Result<GatherMap> {
        check_join_keys(probe, &self.build)?;

        let probe_len = probe.num_rows();
        let chunks = (probe_len + PROBE_CHUNK_LEN - 1) / PROBE_CHUNK_LEN;

        let pairs = (0..chunks)
            .into_par_iter()
            .map(|chunk| {
                let begin = chunk * PROBE_CHUNK_LEN;
                let end = (begin + PROBE_CHUNK_LEN).min(probe_len);
                let mut pairs = Vec::new();
                let mut matches = Vec::new();

                for left_row in (begin..end).filter(|&row| is_joinable(probe, row, self.nulls)) {
                    let bucket = row_hash(probe, left_row) as usize & self.mask;
                    let mut right_row = self.heads[bucket].load(Ordering::Acquire);

                    while right_row != END_OF_CHAIN {
                        if keys_equal(probe, left_row, &self.build, right_row, self.nulls) {
                            matches.push(right_row);
                        }
                        right_row = self.next[right_row].load(Ordering::Acquire);
                    }

                    matches.sort_unstable();
                    pairs.extend(matches.drain(..).map(|right_row| (left_row, right_row)));
                }

                pairs
            })
            .collect();

        Ok(GatherMap::from_chunks(pairs))
    }
}

fn new_links(len: usize) -> TrackedMem<AtomicUsize> {
    (0..len)
        .map(|_| AtomicUsize::new(END_OF_CHAIN))
        .collect::<Vec<_>>()
        .into()
}

/// Computes the gather maps of an inner join between `left` and `right`.
///
/// Joins on all columns of the tables. `NULL` keys match each other if
/// `compare_nulls_equal` is set.
pub fn join_gather_maps<T: ColumnType>(
    left: &TableView<'_, T>,
    right: &TableView<'_, T>,
    compare_nulls_equal: bool,
) -> Result<GatherMap> {
    let nulls = if compare_nulls_equal {
        NullEquality::Equal
    } else {
        NullEquality::Unequal
    };

    check_join_keys(left, right)?;

    let hash_table = BucketChainHashTable::build(right, nulls)?;
    hash_table.probe(left)
}
