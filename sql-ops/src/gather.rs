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

//! Gather operators materialize the rows of a table at a list of indices.
//!
//! Output row `i` is input row `indices[i]`. Both operators produce the same
//! table, but differ in their access pattern:
//!
//! - `gather` processes one column at a time, in parallel over the indices.
//! - `gather_candidate` splits the indices into blocks, and gathers all
//!   columns of a block at once. Each index is thus read once per block
//!   instead of once per column.
//!
//! Validity is gathered together with the values. A `NULL` input row yields
//! a `NULL` output row.

use crate::column::{par_valid_if, Column, ColumnType};
use crate::error::Result;
use crate::table::{Table, TableView};
use bench_runtime::runtime::memory::TrackedMem;
use rayon::prelude::*;

/// Number of indices per block of `gather_candidate`.
pub const GATHER_BLOCK_LEN: usize = 1 << 14;

/// Specifies the handling of indices that are out of bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutOfBoundsPolicy {
    /// Indices are not validated, the caller guarantees that all indices are
    /// in bounds. An out-of-bounds index panics.
    DontCheck,

    /// Out-of-bounds indices produce `NULL` rows.
    Nullify,
}

/// Gathers `table` at `indices` column by column.
pub fn gather<T: ColumnType>(
    table: &TableView<'_, T>,
    indices: &[usize],
    policy: OutOfBoundsPolicy,
) -> Result<Table<T>> {
    let num_rows = table.num_rows();

    let columns = table
        .columns()
        .iter()
        .map(|column| {
            let values = indices
                .par_iter()
                .map(|&index| gather_value(column, index, num_rows, policy))
                .collect::<Vec<_>>();

            let (data, validity): (Vec<_>, Vec<_>) = values.into_iter().unzip();
            finish_column(column, data, &validity, policy)
        })
        .collect::<Result<Vec<_>>>()?;

    Table::new(columns)
}

/// Gathers `table` at `indices` block by block.
pub fn gather_candidate<T: ColumnType>(
    table: &TableView<'_, T>,
    indices: &[usize],
    policy: OutOfBoundsPolicy,
) -> Result<Table<T>> {
    let num_rows = table.num_rows();
    let num_columns = table.num_columns();
    let out_len = indices.len();

    let mut data: Vec<Vec<T>> = (0..num_columns)
        .map(|_| vec![T::default(); out_len])
        .collect();
    let mut validity: Vec<Vec<bool>> = (0..num_columns).map(|_| vec![true; out_len]).collect();

    // Transpose the per-column output chunks into per-block lists
    let num_blocks = (out_len + GATHER_BLOCK_LEN - 1) / GATHER_BLOCK_LEN;
    let mut blocks: Vec<Vec<(&mut [T], &mut [bool])>> = (0..num_blocks)
        .map(|_| Vec::with_capacity(num_columns))
        .collect();
    for (column_data, column_validity) in data.iter_mut().zip(validity.iter_mut()) {
        for (block, chunk) in blocks.iter_mut().zip(
            column_data
                .chunks_mut(GATHER_BLOCK_LEN)
                .zip(column_validity.chunks_mut(GATHER_BLOCK_LEN)),
        ) {
            block.push(chunk);
        }
    }

    blocks
        .into_par_iter()
        .zip(indices.par_chunks(GATHER_BLOCK_LEN))
        .for_each(|(mut outputs, block_indices)| {
            for (offset, &index) in block_indices.iter().enumerate() {
                for (column, (values, valid)) in table.columns().iter().zip(outputs.iter_mut()) {
                    let (value, is_valid) = gather_value(column, index, num_rows, policy);
                    values[offset] = value;
                    valid[offset] = is_valid;
                }
            }
        });

    let columns = table
        .columns()
        .iter()
        .zip(data.into_iter().zip(validity.into_iter()))
        .map(|(column, (data, validity))| finish_column(column, data, &validity, policy))
        .collect::<Result<Vec<_>>>()?;

    Table::new(columns)
}

fn gather_value<T: ColumnType>(
    column: &Column<T>,
    index: usize,
    num_rows: usize,
    policy: OutOfBoundsPolicy,
) -> (T, bool) {
    if policy == OutOfBoundsPolicy::Nullify && index >= num_rows {
        return (T::default(), false);
    }

    (column.data()[index], column.is_valid(index))
}

fn finish_column<T: ColumnType>(
    input: &Column<T>,
    data: Vec<T>,
    validity: &[bool],
    policy: OutOfBoundsPolicy,
) -> Result<Column<T>> {
    let data = TrackedMem::from_vec(data);

    // Without input nulls, only nullified indices can produce nulls
    if !input.nullable() && policy == OutOfBoundsPolicy::DontCheck {
        return Ok(Column::new(data));
    }

    let (mask, null_count) = par_valid_if(validity.len(), |rows| validity[rows].iter().copied());
    if !input.nullable() && null_count == 0 {
        return Ok(Column::new(data));
    }

    Column::with_null_mask(data, mask, null_count)
}
