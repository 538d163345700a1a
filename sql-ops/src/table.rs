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

//! Tables are ordered sequences of columns with the same number of rows.
//!
//! A `Table` owns its columns. A `TableView` borrows a subset of a table's
//! columns, and is the input type of all operators.

use crate::column::{Column, ColumnType};
use crate::error::{ErrorKind, Result};

/// A table that owns its columns.
#[derive(Clone, Debug)]
pub struct Table<T> {
    columns: Vec<Column<T>>,
    num_rows: usize,
}

impl<T: ColumnType> Table<T> {
    /// Assembles a table.
    ///
    /// Fails if the columns have different numbers of rows.
    pub fn new(columns: Vec<Column<T>>) -> Result<Self> {
        let num_rows = columns.first().map_or(0, |column| column.len());
        check_row_counts(columns.iter(), num_rows)?;

        Ok(Self { columns, num_rows })
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, index: usize) -> Option<&Column<T>> {
        self.columns.get(index)
    }

    pub fn columns(&self) -> &[Column<T>] {
        &self.columns
    }

    /// Appends a column.
    pub fn push(&mut self, column: Column<T>) -> Result<()> {
        if self.columns.is_empty() {
            self.num_rows = column.len();
        }
        check_row_counts(std::iter::once(&column), self.num_rows)?;

        self.columns.push(column);
        Ok(())
    }

    /// Returns a view of all columns.
    pub fn view(&self) -> TableView<'_, T> {
        TableView {
            columns: self.columns.iter().collect(),
            num_rows: self.num_rows,
        }
    }

    /// Returns a view of the columns at `indices`, in the given order.
    pub fn select(&self, indices: &[usize]) -> Result<TableView<'_, T>> {
        self.view().select(indices)
    }

    pub fn into_columns(self) -> Vec<Column<T>> {
        self.columns
    }
}

/// A read-only view of a table's columns.
#[derive(Clone, Debug)]
pub struct TableView<'a, T> {
    columns: Vec<&'a Column<T>>,
    num_rows: usize,
}

impl<'a, T: ColumnType> TableView<'a, T> {
    /// Creates a view from borrowed columns.
    pub fn new(columns: Vec<&'a Column<T>>) -> Result<Self> {
        let num_rows = columns.first().map_or(0, |column| column.len());
        check_row_counts(columns.iter().copied(), num_rows)?;

        Ok(Self { columns, num_rows })
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, index: usize) -> Option<&'a Column<T>> {
        self.columns.get(index).copied()
    }

    pub fn columns(&self) -> &[&'a Column<T>] {
        &self.columns
    }

    /// Returns a view of the columns at `indices`, in the given order.
    pub fn select(&self, indices: &[usize]) -> Result<TableView<'a, T>> {
        let columns = indices
            .iter()
            .map(|&index| {
                self.column(index).ok_or_else(|| {
                    ErrorKind::IndexOutOfBounds(format!(
                        "Column {} selected from a table with {} columns",
                        index,
                        self.num_columns()
                    ))
                    .into()
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(TableView {
            columns,
            num_rows: self.num_rows,
        })
    }

    /// Returns `true` if all columns are valid in `row`.
    pub fn is_row_valid(&self, row: usize) -> bool {
        self.columns.iter().all(|column| column.is_valid(row))
    }

    /// Returns `true` if any column has a `NULL` row.
    pub fn has_nulls(&self) -> bool {
        self.columns.iter().any(|column| column.has_nulls())
    }
}

fn check_row_counts<'c, T, I>(columns: I, num_rows: usize) -> Result<()>
where
    T: ColumnType,
    I: Iterator<Item = &'c Column<T>>,
{
    for column in columns {
        if column.len() != num_rows {
            Err(ErrorKind::InvalidArgument(format!(
                "Column has {} rows, but table has {} rows",
                column.len(),
                num_rows
            )))?;
        }
    }

    Ok(())
}
