/*
 * This Source Code Form is subject to the terms of the Mozilla Public License,
 * v. 2.0. If a copy of the MPL was not distributed with this file, You can
 * obtain one at http://mozilla.org/MPL/2.0/.
 *
 *
 * Copyright 2022 Clemens Lutz
 */

use datagen::null_mask::NullMaskGenerator;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sql_ops::column::{sequence, valid_if, Column};
use sql_ops::gather::{gather, gather_candidate, OutOfBoundsPolicy};
use sql_ops::table::Table;
use sql_ops::GATHER_BLOCK_LEN;
use std::error::Error;

fn payload_table(len: usize, nullable: bool) -> Table<i64> {
    let mut columns = vec![
        sequence(len, 0_i64).unwrap(),
        sequence(len, 1_000_000_i64).unwrap(),
    ];

    if nullable {
        let (mask, nulls) = valid_if(NullMaskGenerator::new(7).validity_iter(len));
        columns[1].set_null_mask(mask, nulls).unwrap();
    }

    Table::new(columns).unwrap()
}

fn random_indices(len: usize, max: usize, seed: u64) -> Vec<usize> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen_range(0, max)).collect()
}

fn assert_tables_eq(a: &Table<i64>, b: &Table<i64>) {
    assert_eq!(a.num_rows(), b.num_rows());
    assert_eq!(a.num_columns(), b.num_columns());

    for (x, y) in a.columns().iter().zip(b.columns().iter()) {
        assert_eq!(x.null_count(), y.null_count());
        for row in 0..x.len() {
            assert_eq!(x.get(row), y.get(row));
        }
    }
}

#[test]
fn gather_selects_rows() -> Result<(), Box<dyn Error>> {
    let table = payload_table(100, false);
    let indices = vec![99, 0, 42, 42, 7];

    let output = gather(&table.view(), &indices, OutOfBoundsPolicy::DontCheck)?;

    assert_eq!(output.num_rows(), indices.len());
    assert_eq!(output.column(0).unwrap().data(), &[99, 0, 42, 42, 7]);
    assert_eq!(
        output.column(1).unwrap().data(),
        &[1_000_099, 1_000_000, 1_000_042, 1_000_042, 1_000_007]
    );
    assert!(!output.column(0).unwrap().nullable());

    Ok(())
}

#[test]
fn gather_empty_indices() -> Result<(), Box<dyn Error>> {
    let table = payload_table(100, true);

    let output = gather(&table.view(), &[], OutOfBoundsPolicy::DontCheck)?;
    assert_eq!(output.num_rows(), 0);
    assert_eq!(output.num_columns(), 2);

    let output = gather_candidate(&table.view(), &[], OutOfBoundsPolicy::DontCheck)?;
    assert_eq!(output.num_rows(), 0);
    assert_eq!(output.num_columns(), 2);

    Ok(())
}

#[test]
fn gather_propagates_nulls() -> Result<(), Box<dyn Error>> {
    let table = payload_table(1000, true);
    let input = table.column(1).unwrap();
    let indices = random_indices(5000, 1000, 1);

    let output = gather(&table.view(), &indices, OutOfBoundsPolicy::DontCheck)?;
    let column = output.column(1).unwrap();

    assert!(column.nullable());
    for (row, &index) in indices.iter().enumerate() {
        assert_eq!(column.get(row), input.get(index));
    }
    assert_eq!(
        column.null_count(),
        indices.iter().filter(|&&i| !input.is_valid(i)).count()
    );

    Ok(())
}

#[test]
fn nullify_out_of_bounds() -> Result<(), Box<dyn Error>> {
    let table = payload_table(10, false);
    let indices = vec![3, 10, 9, 1_000_000];

    for output in &[
        gather(&table.view(), &indices, OutOfBoundsPolicy::Nullify)?,
        gather_candidate(&table.view(), &indices, OutOfBoundsPolicy::Nullify)?,
    ] {
        let column = output.column(0).unwrap();
        assert_eq!(column.get(0), Some(3));
        assert_eq!(column.get(1), None);
        assert_eq!(column.get(2), Some(9));
        assert_eq!(column.get(3), None);
        assert_eq!(column.null_count(), 2);
    }

    Ok(())
}

#[test]
fn nullify_in_bounds_keeps_column_non_nullable() -> Result<(), Box<dyn Error>> {
    let table = payload_table(10, false);

    let output = gather(&table.view(), &[0, 1, 2], OutOfBoundsPolicy::Nullify)?;
    assert!(!output.column(0).unwrap().nullable());

    Ok(())
}

#[test]
#[should_panic]
fn dont_check_out_of_bounds_panics() {
    let table = payload_table(10, false);
    let _ = gather(&table.view(), &[10], OutOfBoundsPolicy::DontCheck);
}

#[test]
fn candidate_equals_baseline() -> Result<(), Box<dyn Error>> {
    let len = 3 * GATHER_BLOCK_LEN + 17;
    let table = payload_table(len, true);

    for &num_indices in &[1, GATHER_BLOCK_LEN - 1, GATHER_BLOCK_LEN, 2 * len] {
        let indices = random_indices(num_indices, len, num_indices as u64);

        let baseline = gather(&table.view(), &indices, OutOfBoundsPolicy::DontCheck)?;
        let candidate = gather_candidate(&table.view(), &indices, OutOfBoundsPolicy::DontCheck)?;

        assert_tables_eq(&baseline, &candidate);
    }

    Ok(())
}

#[test]
fn candidate_equals_baseline_with_nullify() -> Result<(), Box<dyn Error>> {
    let len = GATHER_BLOCK_LEN + 5;
    let table = payload_table(len, true);
    let indices = random_indices(2 * GATHER_BLOCK_LEN, 2 * len, 99);

    let baseline = gather(&table.view(), &indices, OutOfBoundsPolicy::Nullify)?;
    let candidate = gather_candidate(&table.view(), &indices, OutOfBoundsPolicy::Nullify)?;

    assert_tables_eq(&baseline, &candidate);

    Ok(())
}

#[test]
fn gather_selected_columns() -> Result<(), Box<dyn Error>> {
    let table = payload_table(100, false);
    let view = table.select(&[1])?;

    let output = gather_candidate(&view, &[5, 6], OutOfBoundsPolicy::DontCheck)?;
    assert_eq!(output.num_columns(), 1);
    assert_eq!(output.column(0).unwrap().data(), &[1_000_005, 1_000_006]);

    Ok(())
}

#[test]
fn gather_column_without_payload() -> Result<(), Box<dyn Error>> {
    let column = Column::from_vec(vec![5_i32, 6, 7]);
    let table = Table::new(vec![column])?;

    let output = gather(&table.view(), &[2, 2, 0], OutOfBoundsPolicy::DontCheck)?;
    assert_eq!(output.column(0).unwrap().data(), &[7, 7, 5]);

    Ok(())
}
