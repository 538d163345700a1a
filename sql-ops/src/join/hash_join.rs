// Copyright 2018-2022 Clemens Lutz
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

//! Hash join with a linear probing hash table.
//!
//! The build phase inserts all right rows in parallel. Each thread claims an
//! empty slot with a compare-and-swap, thus the insertion order of colliding
//! rows is arbitrary. The probe phase is also parallel, and splits the left
//! rows into chunks of `PROBE_CHUNK_LEN` rows. Matches of a left row are
//! sorted by right row, which makes the result independent of the insertion
//! order.
//!
//! The hash table stores row indices instead of keys. Probing compares the
//! keys of the probe row with the keys of the build row, which also works
//! for multi-column keys.

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

const EMPTY_SLOT: usize = usize::max_value();

/// Number of slots per build row.
pub const HASH_TABLE_LOAD_FACTOR: usize = 2;

/// A linear probing hash table over the rows of a build-side table.
#[derive(Debug)]
pub struct LinearProbingHashTable<'a, T> {
    build: TableView<'a, T>,
    nulls: NullEquality,
    slots: TrackedMem<AtomicUsize>,
    mask: usize,
}

impl<'a, T: ColumnType> LinearProbingHashTable<'a, T> {
    /// Inserts all joinable rows of `build` into a new hash table.
    pub fn build(build: &TableView<'a, T>, nulls: NullEquality) -> Result<Self> {
        let capacity = build
            .num_rows()
            .checked_mul(HASH_TABLE_LOAD_FACTOR)
            .and_then(|len| len.checked_next_power_of_two())
            .ok_or_else(|| {
                ErrorKind::IntegerOverflow("Failed to compute hash table length".to_string())
            })?
            .max(1);

        let slots: TrackedMem<AtomicUsize> = (0..capacity)
            .map(|_| AtomicUsize::new(EMPTY_SLOT))
            .collect::<Vec<_>>()
            .into();
        let mask = capacity - 1;

        (0..build.num_rows())
            .into_par_iter()
            .filter(|&row| is_joinable(build, row, nulls))
            .for_each(|row| {
                let mut slot = row_hash(build, row) as usize & mask;
                while slots[slot]
                    .compare_exchange(EMPTY_SLOT, row, Ordering::AcqRel, Ordering::Relaxed)
                    .is_err()
                {
                    slot = (slot + 1) & mask;
                }
            });

        Ok(Self {
            build: build.clone(),
            nulls,
            slots,
            mask,
        })
    }

    /// Returns the number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Probes all rows of `probe`, and keeps the matches that pass `filter`.
    ///
    /// `filter` is called with the left (probe) row and the right (build)
    /// row of a key match.
    pub fn probe<F>(&self, probe: &TableView<'_, T>, filter: F) -> Result<GatherMap>
    where
        F: Fn(usize, usize) -> bool + Sync,
    {
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

                for left_row in begin..end {
                    if !is_joinable(probe, left_row, self.nulls) {
                        continue;
                    }

                    let mut slot = row_hash(probe, left_row) as usize & self.mask;
                    loop {
                        let right_row = self.slots[slot].load(Ordering::Acquire);
                        if right_row == EMPTY_SLOT {
                            break;
                        }
                        if keys_equal(probe, left_row, &self.build, right_row, self.nulls)
                            && filter(left_row, right_row)
                        {
                            matches.push(right_row);
                        }
                        slot = (slot + 1) & self.mask;
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

/// Joins `left` and `right` on all of their columns.
///
/// Rows with a `NULL` key only match if `nulls` is `NullEquality::Equal`.
pub fn inner_join<T: ColumnType>(
    left: &TableView<'_, T>,
    right: &TableView<'_, T>,
    nulls: NullEquality,
) -> Result<GatherMap> {
    check_join_keys(left, right)?;

    let hash_table = LinearProbingHashTable::build(right, nulls)?;
    hash_table.probe(left, |_, _| true)
}
