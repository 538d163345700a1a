/*
 * This Source Code Form is subject to the terms of the Mozilla Public License,
 * v. 2.0. If a copy of the MPL was not distributed with this file, You can
 * obtain one at http://mozilla.org/MPL/2.0/.
 *
 *
 * Copyright 2022 Clemens Lutz
 */

use datagen::null_mask::NullMaskGenerator;
use sql_ops::column::{
    make_numeric_column, par_valid_if, sequence, valid_if, Bitmask, Column, VALID_IF_CHUNK_WORDS,
};
use sql_ops::error::ErrorKind;
use sql_ops::table::Table;
use std::error::Error;

#[test]
fn valid_if_counts_nulls() {
    let validity = vec![true, false, false, true, true, false];
    let (mask, nulls) = valid_if(validity.iter().copied());

    assert_eq!(mask.len(), validity.len());
    assert_eq!(nulls, 3);
    assert_eq!(mask.count_nulls(), nulls);
    validity
        .iter()
        .enumerate()
        .for_each(|(row, &valid)| assert_eq!(mask.is_valid(row), valid));
}

#[test]
fn valid_if_spans_multiple_words() {
    let gen = NullMaskGenerator::new(17);
    let len = 10_007;
    let (mask, nulls) = valid_if(gen.validity_iter(len));

    assert_eq!(mask.words().len(), Bitmask::words_for(len));
    assert_eq!(mask.count_nulls(), nulls);
    for row in 0..len {
        assert_eq!(mask.is_valid(row), gen.is_valid(row));
    }
}

#[test]
fn par_valid_if_equals_valid_if() {
    let gen = NullMaskGenerator::with_stream(17, 1);

    // Several chunks, and a partial last chunk and word
    let len = 3 * VALID_IF_CHUNK_WORDS * 32 + 45;
    let (expected, expected_nulls) = valid_if(gen.validity_iter(len));
    let (mask, nulls) = par_valid_if(len, |rows| gen.validity_range(rows));

    assert_eq!(mask.len(), len);
    assert_eq!(nulls, expected_nulls);
    assert_eq!(mask.words(), expected.words());
    assert_eq!(mask.count_nulls(), nulls);
}

#[test]
fn par_valid_if_nulls_missing_flags() {
    let (mask, nulls) = par_valid_if(40, |rows| rows.take(10).map(|_| true));

    assert_eq!(nulls, 30);
    assert!(mask.is_valid(9));
    assert!(!mask.is_valid(10));
    assert_eq!(mask.count_nulls(), 30);
}

#[test]
fn par_valid_if_empty() {
    let (mask, nulls) = par_valid_if(0, |rows| rows.map(|_| true));

    assert!(mask.is_empty());
    assert_eq!(nulls, 0);
}

#[test]
fn new_bitmask_has_cleared_tail() {
    let mask = Bitmask::new(33, true);

    assert_eq!(mask.words(), &[!0, 1]);
    assert_eq!(mask.count_nulls(), 0);
    assert_eq!(Bitmask::new(33, false).count_nulls(), 33);
}

#[test]
fn set_valid_updates_bits() {
    let mut mask = Bitmask::new(64, true);
    mask.set_valid(40, false);
    mask.set_valid(3, false);
    mask.set_valid(3, true);

    assert!(!mask.is_valid(40));
    assert!(mask.is_valid(3));
    assert_eq!(mask.count_nulls(), 1);
}

#[test]
fn column_without_mask_is_valid() {
    let column = Column::from_vec(vec![4_i32, 5, 6]);

    assert!(!column.nullable());
    assert_eq!(column.null_count(), 0);
    assert_eq!(column.get(1), Some(5));
}

#[test]
fn null_mask_must_match_column() -> Result<(), Box<dyn Error>> {
    let mut column = make_numeric_column::<i64>(4);
    let (mask, nulls) = valid_if(vec![true, false, true, false]);

    match column.set_null_mask(mask.clone(), nulls + 1) {
        Err(ref e) => match e.kind() {
            ErrorKind::InvalidArgument(_) => {}
            kind => panic!("Unexpected error kind: {}", kind),
        },
        Ok(_) => panic!("Accepted inconsistent null count"),
    }

    let (short_mask, short_nulls) = valid_if(vec![true, false]);
    assert!(column.set_null_mask(short_mask, short_nulls).is_err());

    column.set_null_mask(mask, nulls)?;
    assert!(column.nullable());
    assert_eq!(column.null_count(), 2);
    assert_eq!(column.get(0), Some(0));
    assert_eq!(column.get(1), None);

    Ok(())
}

#[test]
fn sequence_counts_up_from_init() -> Result<(), Box<dyn Error>> {
    let column = sequence(100_000, 0_i32)?;

    assert_eq!(column.len(), 100_000);
    assert!(!column.nullable());
    column
        .data()
        .iter()
        .enumerate()
        .for_each(|(i, &value)| assert_eq!(value as usize, i));

    let shifted = sequence(3, 10_i64)?;
    assert_eq!(shifted.data(), &[10, 11, 12]);

    Ok(())
}

#[test]
fn sequence_detects_overflow() {
    assert!(sequence(3, i32::max_value() - 1).is_err());
}

#[test]
fn table_columns_must_have_same_rows() -> Result<(), Box<dyn Error>> {
    let result = Table::new(vec![
        make_numeric_column::<i32>(3),
        make_numeric_column::<i32>(4),
    ]);
    assert!(result.is_err());

    let mut table = Table::new(vec![make_numeric_column::<i32>(3)])?;
    assert!(table.push(make_numeric_column(2)).is_err());
    table.push(sequence(3, 0)?)?;

    assert_eq!(table.num_rows(), 3);
    assert_eq!(table.num_columns(), 2);

    Ok(())
}

#[test]
fn select_reorders_columns() -> Result<(), Box<dyn Error>> {
    let table = Table::new(vec![
        Column::from_vec(vec![1_i32, 2]),
        Column::from_vec(vec![3_i32, 4]),
    ])?;

    let view = table.select(&[1, 0, 1])?;
    assert_eq!(view.num_columns(), 3);
    assert_eq!(view.num_rows(), 2);
    assert_eq!(view.columns()[0].data(), &[3, 4]);
    assert_eq!(view.columns()[1].data(), &[1, 2]);

    assert!(table.select(&[2]).is_err());
    assert!(view.select(&[0])?.column(0).is_some());

    Ok(())
}
