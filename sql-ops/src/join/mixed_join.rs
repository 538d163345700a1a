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

//! Mixed join, i.e., a hash join on equality keys with an additional
//! predicate over conditional columns.

use super::hash_join::LinearProbingHashTable;
use super::{check_join_keys, GatherMap, NullEquality};
use crate::ast::Expression;
use crate::column::ColumnType;
use crate::error::{ErrorKind, Result};
use crate::table::TableView;

/// Joins rows whose equality keys match and whose conditional columns
/// satisfy `predicate`.
///
/// The predicate's column references point into `left_conditional` and
/// `right_conditional`. The conditional tables must have the same number of
/// rows as their equality tables.
pub fn mixed_inner_join<T: ColumnType>(
    left_equality: &TableView<'_, T>,
    right_equality: &TableView<'_, T>,
    left_conditional: &TableView<'_, T>,
    right_conditional: &TableView<'_, T>,
    predicate: &Expression<T>,
    nulls: NullEquality,
) -> Result<GatherMap> {
    if left_equality.num_rows() != left_conditional.num_rows() {
        Err(ErrorKind::InvalidArgument(format!(
            "Left equality table has {} rows, but conditional table has {} rows",
            left_equality.num_rows(),
            left_conditional.num_rows()
        )))?;
    }
    if right_equality.num_rows() != right_conditional.num_rows() {
        Err(ErrorKind::InvalidArgument(format!(
            "Right equality table has {} rows, but conditional table has {} rows",
            right_equality.num_rows(),
            right_conditional.num_rows()
        )))?;
    }
    check_join_keys(left_equality, right_equality)?;
    predicate.validate(left_conditional, right_conditional)?;

    let hash_table = LinearProbingHashTable::build(right_equality, nulls)?;
    hash_table.probe(left_equality, |left_row, right_row| {
        predicate.evaluate(
            left_conditional,
            left_row,
            right_conditional,
            right_row,
            nulls,
        )
    })
}
