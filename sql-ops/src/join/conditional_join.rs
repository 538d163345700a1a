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

//! Conditional join, i.e., a theta join on an arbitrary predicate.
//!
//! If the predicate's top-level conjuncts contain equality comparisons
//! between a left and a right column, the join hashes on these columns and
//! evaluates the full predicate on each key match. Otherwise, the join falls
//! back to a parallel nested-loop join that evaluates the predicate on all
//! row pairs.

use super::hash_join::LinearProbingHashTable;
use super::{GatherMap, NullEquality, PROBE_CHUNK_LEN};
use crate::ast::Expression;
use crate::column::ColumnType;
use crate::error::Result;
use crate::table::TableView;
use rayon::prelude::*;

/// Joins all row pairs of `left` and `right` that satisfy `predicate`.
pub fn conditional_inner_join<T: ColumnType>(
    left: &TableView<'_, T>,
    right: &TableView<'_, T>,
    predicate: &Expression<T>,
    nulls: NullEquality,
) -> Result<GatherMap> {
    predicate.validate(left, right)?;

    let (left_keys, right_keys): (Vec<_>, Vec<_>) =
        predicate.equality_columns().into_iter().unzip();

    if left_keys.is_empty() {
        tracing::debug!("Conditional join without equality conjuncts uses a nested loop");
        return Ok(nested_loop_join(left, right, predicate, nulls));
    }

    let left_keys = left.select(&left_keys)?;
    let right_keys = right.select(&right_keys)?;

    let hash_table = LinearProbingHashTable::build(&right_keys, nulls)?;
    hash_table.probe(&left_keys, |left_row, right_row| {
        predicate.evaluate(left, left_row, right, right_row, nulls)
    })
}

fn nested_loop_join<T: ColumnType>(
    left: &TableView<'_, T>,
    right: &TableView<'_, T>,
    predicate: &Expression<T>,
    nulls: NullEquality,
) -> GatherMap {
    let left_len = left.num_rows();
    let chunks = (left_len + PROBE_CHUNK_LEN - 1) / PROBE_CHUNK_LEN;

    let pairs = (0..chunks)
        .into_par_iter()
        .map(|chunk| {
            let begin = chunk * PROBE_CHUNK_LEN;
            let end = (begin + PROBE_CHUNK_LEN).min(left_len);

            (begin..end)
                .flat_map(|left_row| {
                    (0..right.num_rows())
                        .filter(move |&right_row| {
                            predicate.evaluate(left, left_row, right, right_row, nulls)
                        })
                        .map(move |right_row| (left_row, right_row))
                })
                .collect::<Vec<_>>()
        })
        .collect();

    GatherMap::from_chunks(pairs)
}
