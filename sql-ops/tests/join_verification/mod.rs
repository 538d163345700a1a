/*
 * This Source Code Form is subject to the terms of the Mozilla Public License,
 * v. 2.0. If a copy of the MPL was not distributed with this file, You can
 * obtain one at http://mozilla.org/MPL/2.0/.
 *
 *
 * Copyright 2022 Clemens Lutz
 */

use datagen::null_mask::NullMaskGenerator;
use num_traits::FromPrimitive;
use rand::rngs::StdRng;
use rand::Rng;
use sql_ops::column::{valid_if, Column, ColumnType};
use sql_ops::join::{GatherMap, NullEquality};
use sql_ops::table::TableView;

/// Generates a key column with values in `[0, distinct)`.
///
/// If `null_seed` is set, about 75% of the rows are `NULL`.
pub fn gen_key_column<T: ColumnType>(
    len: usize,
    distinct: usize,
    null_seed: Option<u64>,
    rng: &mut StdRng,
) -> Column<T> {
    let data: Vec<T> = (0..len)
        .map(|_| T::from_usize(rng.gen_range(0, distinct)).unwrap())
        .collect();
    let mut column = Column::from_vec(data);

    if let Some(seed) = null_seed {
        let (mask, nulls) = valid_if(NullMaskGenerator::new(seed).validity_iter(len));
        column.set_null_mask(mask, nulls).unwrap();
    }

    column
}

/// Joins with a nested loop that compares all key columns.
pub fn brute_force_join<T: ColumnType>(
    left: &TableView<'_, T>,
    right: &TableView<'_, T>,
    nulls: NullEquality,
) -> Vec<(usize, usize)> {
    brute_force_predicate(left.num_rows(), right.num_rows(), |l, r| {
        left.columns()
            .iter()
            .zip(right.columns().iter())
            .all(|(lc, rc)| match (lc.get(l), rc.get(r)) {
                (Some(a), Some(b)) => a == b,
                (None, None) => nulls == NullEquality::Equal,
                _ => false,
            })
    })
}

/// Returns all row pairs that satisfy `predicate`, ordered by left row and
/// right row.
pub fn brute_force_predicate<F>(left_len: usize, right_len: usize, predicate: F) -> Vec<(usize, usize)>
where
    F: Fn(usize, usize) -> bool,
{
    (0..left_len)
        .flat_map(|l| (0..right_len).map(move |r| (l, r)))
        .filter(|&(l, r)| predicate(l, r))
        .collect()
}

pub fn pairs(gather_map: &GatherMap) -> Vec<(usize, usize)> {
    gather_map
        .left_indices()
        .iter()
        .copied()
        .zip(gather_map.right_indices().iter().copied())
        .collect()
}
