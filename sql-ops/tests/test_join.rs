/*
 * This Source Code Form is subject to the terms of the Mozilla Public License,
 * v. 2.0. If a copy of the MPL was not distributed with this file, You can
 * obtain one at http://mozilla.org/MPL/2.0/.
 *
 *
 * Copyright 2022 Clemens Lutz
 */

pub mod join_verification;

use itertools::Itertools;
use join_verification::{brute_force_join, brute_force_predicate, gen_key_column, pairs};
use rand::rngs::StdRng;
use rand::SeedableRng;
use sql_ops::ast::{AstOperator, Expression, TableReference};
use sql_ops::column::{Column, ColumnType};
use sql_ops::error::ErrorKind;
use sql_ops::join::bucket_chain_join::join_gather_maps;
use sql_ops::join::conditional_join::conditional_inner_join;
use sql_ops::join::hash_join::inner_join;
use sql_ops::join::mixed_join::mixed_inner_join;
use sql_ops::join::{hash_inner_join, HashingScheme, NullEquality};
use sql_ops::table::Table;
use std::error::Error;

fn left_right_tables<T: ColumnType>(
    left_len: usize,
    right_len: usize,
    distinct: usize,
    columns: usize,
    nullable: bool,
) -> (Table<T>, Table<T>) {
    let mut rng = StdRng::seed_from_u64(left_len as u64 ^ right_len as u64);
    let mut gen_table = |len: usize, seed: u64| {
        let columns = (0..columns)
            .map(|c| {
                let null_seed = if nullable { Some(seed + c as u64) } else { None };
                gen_key_column::<T>(len, distinct, null_seed, &mut rng)
            })
            .collect();
        Table::new(columns).unwrap()
    };

    let left = gen_table(left_len, 100);
    let right = gen_table(right_len, 200);
    (left, right)
}

fn equal_columns<T: ColumnType>(left: usize, right: usize) -> Expression<T> {
    Expression::operation(
        AstOperator::Equal,
        Expression::column(left, TableReference::Left),
        Expression::column(right, TableReference::Right),
    )
}

macro_rules! hash_join_tests {
    ($name:ident, $type:ty, $left:expr, $right:expr, $distinct:expr, $columns:expr, $nullable:expr, $nulls:expr) => {
        mod $name {
            use super::*;

            #[test]
            fn linear_probing_matches_nested_loop() -> Result<(), Box<dyn Error>> {
                let (left, right) =
                    left_right_tables::<$type>($left, $right, $distinct, $columns, $nullable);
                let expected = brute_force_join(&left.view(), &right.view(), $nulls);

                let gather_map = inner_join(&left.view(), &right.view(), $nulls)?;
                assert_eq!(pairs(&gather_map), expected);

                Ok(())
            }

            #[test]
            fn bucket_chaining_matches_nested_loop() -> Result<(), Box<dyn Error>> {
                let (left, right) =
                    left_right_tables::<$type>($left, $right, $distinct, $columns, $nullable);
                let expected = brute_force_join(&left.view(), &right.view(), $nulls);

                let gather_map = join_gather_maps(
                    &left.view(),
                    &right.view(),
                    $nulls == NullEquality::Equal,
                )?;
                assert_eq!(pairs(&gather_map), expected);

                Ok(())
            }

            #[test]
            fn conditional_equality_matches_nested_loop() -> Result<(), Box<dyn Error>> {
                let (left, right) =
                    left_right_tables::<$type>($left, $right, $distinct, $columns, $nullable);
                let expected = brute_force_join(&left.view(), &right.view(), $nulls);

                let predicate = (1..$columns).fold(equal_columns(0, 0), |expr, c| {
                    Expression::operation(AstOperator::LogicalAnd, expr, equal_columns(c, c))
                });
                let gather_map =
                    conditional_inner_join(&left.view(), &right.view(), &predicate, $nulls)?;
                assert_eq!(pairs(&gather_map), expected);

                Ok(())
            }
        }
    };
}

hash_join_tests!(i32_unique, i32, 1000, 1000, 100_000, 1, false, NullEquality::Unequal);
hash_join_tests!(i64_unique, i64, 1000, 1000, 100_000, 1, false, NullEquality::Unequal);
hash_join_tests!(i32_duplicates, i32, 700, 2000, 50, 1, false, NullEquality::Unequal);
hash_join_tests!(i64_duplicates, i64, 2000, 700, 50, 1, false, NullEquality::Unequal);
hash_join_tests!(i32_multi_column, i32, 1500, 1500, 4, 3, false, NullEquality::Unequal);
hash_join_tests!(i32_nulls_unequal, i32, 1000, 1000, 20, 1, true, NullEquality::Unequal);
hash_join_tests!(i64_nulls_equal, i64, 300, 300, 20, 1, true, NullEquality::Equal);
hash_join_tests!(i64_multi_column_nulls, i64, 500, 500, 3, 2, true, NullEquality::Equal);
hash_join_tests!(i32_large_probe, i32, 20_000, 5000, 10_000, 1, false, NullEquality::Unequal);

#[test]
fn hash_join_never_matches_null_keys() -> Result<(), Box<dyn Error>> {
    let (left, right) = left_right_tables::<i32>(5000, 5000, 10, 1, true);
    let left_keys = left.column(0).unwrap();
    let right_keys = right.column(0).unwrap();

    for &scheme in &[HashingScheme::LinearProbing, HashingScheme::BucketChaining] {
        let gather_map =
            hash_inner_join(&left.view(), &right.view(), NullEquality::Unequal, scheme)?;

        assert!(!gather_map.is_empty());
        for (l, r) in pairs(&gather_map) {
            assert!(left_keys.is_valid(l));
            assert!(right_keys.is_valid(r));
        }
    }

    Ok(())
}

#[test]
fn hashing_schemes_agree() -> Result<(), Box<dyn Error>> {
    let (left, right) = left_right_tables::<i64>(10_000, 10_000, 3000, 1, false);

    let linear = hash_inner_join(
        &left.view(),
        &right.view(),
        NullEquality::Unequal,
        HashingScheme::LinearProbing,
    )?;
    let chained = hash_inner_join(
        &left.view(),
        &right.view(),
        NullEquality::Unequal,
        HashingScheme::BucketChaining,
    )?;

    assert_eq!(pairs(&linear), pairs(&chained));

    Ok(())
}

#[test]
fn gather_map_is_ordered_by_left_then_right() -> Result<(), Box<dyn Error>> {
    let (left, right) = left_right_tables::<i32>(30_000, 1000, 50, 1, false);

    for &scheme in &[HashingScheme::LinearProbing, HashingScheme::BucketChaining] {
        let gather_map =
            hash_inner_join(&left.view(), &right.view(), NullEquality::Unequal, scheme)?;

        assert!(gather_map.len() > left.num_rows());
        for (a, b) in pairs(&gather_map).into_iter().tuple_windows() {
            assert!(a < b, "{:?} before {:?}", a, b);
        }
    }

    Ok(())
}

#[test]
fn join_with_empty_side_is_empty() -> Result<(), Box<dyn Error>> {
    let (left, right) = left_right_tables::<i32>(0, 100, 10, 1, false);
    assert!(inner_join(&left.view(), &right.view(), NullEquality::Unequal)?.is_empty());
    assert!(inner_join(&right.view(), &left.view(), NullEquality::Unequal)?.is_empty());
    assert!(join_gather_maps(&right.view(), &left.view(), false)?.is_empty());

    Ok(())
}

#[test]
fn key_column_counts_must_match() {
    let (left, right) = left_right_tables::<i32>(10, 10, 10, 2, false);
    let right_key = right.select(&[0]).unwrap();

    match inner_join(&left.view(), &right_key, NullEquality::Unequal) {
        Err(ref e) => match e.kind() {
            ErrorKind::InvalidArgument(_) => {}
            kind => panic!("Unexpected error kind: {}", kind),
        },
        Ok(_) => panic!("Joined tables with different key columns"),
    }
}

#[test]
fn mixed_join_filters_key_matches() -> Result<(), Box<dyn Error>> {
    let (left, right) = left_right_tables::<i32>(2000, 2000, 40, 2, false);
    let left_keys = left.select(&[0])?;
    let right_keys = right.select(&[0])?;
    let left_cond = left.select(&[1])?;
    let right_cond = right.select(&[1])?;

    // left.1 < right.1
    let predicate: Expression<i32> = Expression::operation(
        AstOperator::Less,
        Expression::column(0, TableReference::Left),
        Expression::column(0, TableReference::Right),
    );

    let gather_map = mixed_inner_join(
        &left_keys,
        &right_keys,
        &left_cond,
        &right_cond,
        &predicate,
        NullEquality::Unequal,
    )?;

    let lk = left.column(0).unwrap().data();
    let rk = right.column(0).unwrap().data();
    let lc = left.column(1).unwrap().data();
    let rc = right.column(1).unwrap().data();
    let expected = brute_force_predicate(2000, 2000, |l, r| lk[l] == rk[r] && lc[l] < rc[r]);

    assert!(!expected.is_empty());
    assert_eq!(pairs(&gather_map), expected);

    Ok(())
}

#[test]
fn mixed_join_with_nullable_conditional_columns() -> Result<(), Box<dyn Error>> {
    let (left, right) = left_right_tables::<i64>(3000, 3000, 30, 2, true);
    let predicate = equal_columns::<i64>(0, 0);

    let gather_map = mixed_inner_join(
        &left.select(&[0])?,
        &right.select(&[0])?,
        &left.select(&[1])?,
        &right.select(&[1])?,
        &predicate,
        NullEquality::Unequal,
    )?;

    let expected = brute_force_join(&left.view(), &right.view(), NullEquality::Unequal);
    assert_eq!(pairs(&gather_map), expected);

    Ok(())
}

#[test]
fn mixed_join_requires_equal_row_counts() {
    let (left, right) = left_right_tables::<i32>(10, 10, 10, 1, false);
    let (other, _) = left_right_tables::<i32>(11, 10, 10, 1, false);

    let result = mixed_inner_join(
        &left.view(),
        &right.view(),
        &other.view(),
        &right.view(),
        &equal_columns(0, 0),
        NullEquality::Unequal,
    );
    assert!(result.is_err());
}

#[test]
fn conditional_join_without_equality_uses_nested_loop() -> Result<(), Box<dyn Error>> {
    let (left, right) = left_right_tables::<i32>(300, 400, 1000, 1, false);

    // left.0 >= right.0 AND right.0 != 7
    let predicate: Expression<i32> = Expression::operation(
        AstOperator::LogicalAnd,
        Expression::operation(
            AstOperator::GreaterEqual,
            Expression::column(0, TableReference::Left),
            Expression::column(0, TableReference::Right),
        ),
        Expression::operation(
            AstOperator::NotEqual,
            Expression::column(0, TableReference::Right),
            Expression::literal(7),
        ),
    );
    assert!(predicate.equality_columns().is_empty());

    let gather_map =
        conditional_inner_join(&left.view(), &right.view(), &predicate, NullEquality::Unequal)?;

    let l = left.column(0).unwrap().data();
    let r = right.column(0).unwrap().data();
    let expected = brute_force_predicate(300, 400, |i, j| l[i] >= r[j] && r[j] != 7);
    assert_eq!(pairs(&gather_map), expected);

    Ok(())
}

#[test]
fn conditional_join_with_disjunction() -> Result<(), Box<dyn Error>> {
    let left = Table::new(vec![Column::from_vec(vec![1_i64, 2, 3])])?;
    let right = Table::new(vec![Column::from_vec(vec![3_i64, 1])])?;

    // left.0 == right.0 OR left.0 == 2
    let predicate: Expression<i64> = Expression::operation(
        AstOperator::LogicalOr,
        equal_columns(0, 0),
        Expression::operation(
            AstOperator::Equal,
            Expression::column(0, TableReference::Left),
            Expression::literal(2),
        ),
    );
    assert!(predicate.equality_columns().is_empty());

    let gather_map =
        conditional_inner_join(&left.view(), &right.view(), &predicate, NullEquality::Unequal)?;
    assert_eq!(pairs(&gather_map), vec![(0, 1), (1, 0), (1, 1), (2, 0)]);

    Ok(())
}

#[test]
fn conditional_join_rejects_invalid_predicates() {
    let (left, right) = left_right_tables::<i32>(10, 10, 10, 1, false);

    let scalar = Expression::column(0, TableReference::Left);
    let out_of_bounds = equal_columns(0, 1);
    let mistyped = Expression::operation(
        AstOperator::LogicalAnd,
        Expression::column(0, TableReference::Left),
        Expression::column(0, TableReference::Right),
    );

    for predicate in &[scalar, out_of_bounds, mistyped] {
        let result =
            conditional_inner_join(&left.view(), &right.view(), predicate, NullEquality::Unequal);
        assert!(result.is_err());
    }
}
