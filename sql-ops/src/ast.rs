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

//! Predicate expressions over the rows of two tables.
//!
//! An expression is an immutable tree. Leaves reference a column of the left
//! or the right table, or are literals. Inner nodes apply a comparison or a
//! logical operator to two subexpressions.
//!
//! Comparisons yield `false` if any operand is `NULL`. The exception is
//! `Equal`, which yields `true` for two `NULL` operands if nulls compare
//! equal.
//!
//! # Example
//!
//! ```
//! # use sql_ops::ast::{AstOperator, Expression, TableReference};
//! // left.0 == right.0
//! let predicate = Expression::<i32>::operation(
//!     AstOperator::Equal,
//!     Expression::column(0, TableReference::Left),
//!     Expression::column(0, TableReference::Right),
//! );
//! ```

use crate::column::ColumnType;
use crate::error::{ErrorKind, Result};
use crate::join::NullEquality;
use crate::table::TableView;

/// The table that a column reference points into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableReference {
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnReference {
    pub index: usize,
    pub table: TableReference,
}

impl ColumnReference {
    pub fn new(index: usize, table: TableReference) -> Self {
        Self { index, table }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AstOperator {
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    LogicalAnd,
    LogicalOr,
}

impl AstOperator {
    pub fn is_comparison(self) -> bool {
        match self {
            AstOperator::LogicalAnd | AstOperator::LogicalOr => false,
            _ => true,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expression<T> {
    Column(ColumnReference),
    Literal(T),
    Operation {
        op: AstOperator,
        left: Box<Expression<T>>,
        right: Box<Expression<T>>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum ValueKind {
    Scalar,
    Boolean,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Value<T> {
    Null,
    Scalar(T),
    Boolean(bool),
}

impl<T: ColumnType> Expression<T> {
    pub fn column(index: usize, table: TableReference) -> Self {
        Expression::Column(ColumnReference::new(index, table))
    }

    pub fn literal(value: T) -> Self {
        Expression::Literal(value)
    }

    pub fn operation(op: AstOperator, left: Self, right: Self) -> Self {
        Expression::Operation {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Checks that the expression is a boolean predicate over the given
    /// tables.
    ///
    /// Comparisons require scalar operands, and logical operators require
    /// boolean operands. Column references must be in bounds.
    pub fn validate(&self, left: &TableView<'_, T>, right: &TableView<'_, T>) -> Result<()> {
        match self.kind(left.num_columns(), right.num_columns())? {
            ValueKind::Boolean => Ok(()),
            ValueKind::Scalar => Err(ErrorKind::TypeMismatch(
                "Predicate must yield a boolean value".to_string(),
            )
            .into()),
        }
    }

    fn kind(&self, left_columns: usize, right_columns: usize) -> Result<ValueKind> {
        match self {
            Expression::Column(ColumnReference { index, table }) => {
                let columns = match table {
                    TableReference::Left => left_columns,
                    TableReference::Right => right_columns,
                };
                if *index >= columns {
                    Err(ErrorKind::IndexOutOfBounds(format!(
                        "{:?} column {} referenced, but table has {} columns",
                        table, index, columns
                    )))?;
                }
                Ok(ValueKind::Scalar)
            }
            Expression::Literal(_) => Ok(ValueKind::Scalar),
            Expression::Operation { op, left, right } => {
                let expected = if op.is_comparison() {
                    ValueKind::Scalar
                } else {
                    ValueKind::Boolean
                };

                for operand in &[left, right] {
                    if operand.kind(left_columns, right_columns)? != expected {
                        Err(ErrorKind::TypeMismatch(format!(
                            "{:?} requires {:?} operands",
                            op, expected
                        )))?;
                    }
                }

                Ok(ValueKind::Boolean)
            }
        }
    }

    /// Evaluates the predicate on a pair of rows.
    ///
    /// The expression must have been validated against the tables.
    pub fn evaluate(
        &self,
        left: &TableView<'_, T>,
        left_row: usize,
        right: &TableView<'_, T>,
        right_row: usize,
        nulls: NullEquality,
    ) -> bool {
        match self.eval(left, left_row, right, right_row, nulls) {
            Value::Boolean(result) => result,
            _ => false,
        }
    }

    fn eval(
        &self,
        left: &TableView<'_, T>,
        left_row: usize,
        right: &TableView<'_, T>,
        right_row: usize,
        nulls: NullEquality,
    ) -> Value<T> {
        match self {
            Expression::Column(ColumnReference { index, table }) => {
                let (view, row) = match table {
                    TableReference::Left => (left, left_row),
                    TableReference::Right => (right, right_row),
                };
                view.column(*index)
                    .and_then(|column| column.get(row))
                    .map_or(Value::Null, Value::Scalar)
            }
            Expression::Literal(value) => Value::Scalar(*value),
            Expression::Operation {
                op,
                left: lhs,
                right: rhs,
            } => {
                let a = lhs.eval(left, left_row, right, right_row, nulls);

                // Short-circuit logical operators
                match (op, a) {
                    (AstOperator::LogicalAnd, Value::Boolean(false)) => {
                        return Value::Boolean(false)
                    }
                    (AstOperator::LogicalOr, Value::Boolean(true)) => return Value::Boolean(true),
                    _ => {}
                }

                let b = rhs.eval(left, left_row, right, right_row, nulls);
                Value::Boolean(apply(*op, a, b, nulls))
            }
        }
    }

    /// Returns the pairs of (left, right) column indices that the predicate
    /// requires to be equal.
    ///
    /// Only `Equal` comparisons that are conjuncts of the predicate's top-level
    /// `LogicalAnd` chain count. A row pair can only satisfy the predicate if
    /// all returned column pairs are equal.
    pub fn equality_columns(&self) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        self.collect_equality_columns(&mut pairs);
        pairs
    }

    fn collect_equality_columns(&self, pairs: &mut Vec<(usize, usize)>) {
        if let Expression::Operation { op, left, right } = self {
            match (op, left.as_ref(), right.as_ref()) {
                (AstOperator::LogicalAnd, _, _) => {
                    left.collect_equality_columns(pairs);
                    right.collect_equality_columns(pairs);
                }
                (AstOperator::Equal, Expression::Column(a), Expression::Column(b)) => {
                    match (a.table, b.table) {
                        (TableReference::Left, TableReference::Right) => {
                            pairs.push((a.index, b.index))
                        }
                        (TableReference::Right, TableReference::Left) => {
                            pairs.push((b.index, a.index))
                        }
                        _ => {}
                    }
                }
                _ => {}
            }
        }
    }
}

fn apply<T: ColumnType>(op: AstOperator, a: Value<T>, b: Value<T>, nulls: NullEquality) -> bool {
    match (op, a, b) {
        (AstOperator::LogicalAnd, Value::Boolean(x), Value::Boolean(y)) => x && y,
        (AstOperator::LogicalOr, Value::Boolean(x), Value::Boolean(y)) => x || y,
        (AstOperator::Equal, Value::Null, Value::Null) => nulls == NullEquality::Equal,
        (op, Value::Scalar(x), Value::Scalar(y)) => match op {
            AstOperator::Equal => x == y,
            AstOperator::NotEqual => x != y,
            AstOperator::Less => x < y,
            AstOperator::Greater => x > y,
            AstOperator::LessEqual => x <= y,
            AstOperator::GreaterEqual => x >= y,
            AstOperator::LogicalAnd | AstOperator::LogicalOr => false,
        },
        _ => false,
    }
}
