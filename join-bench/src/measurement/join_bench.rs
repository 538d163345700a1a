/*
 * This Source Code Form is subject to the terms of the Mozilla Public License,
 * v. 2.0. If a copy of the MPL was not distributed with this file, You can
 * obtain one at http://mozilla.org/MPL/2.0/.
 *
 *
 * Copyright (c) 2022, Clemens Lutz <lutzcle@cml.li>
 * Author: Clemens Lutz <lutzcle@cml.li>
 */

//! Join benchmark state machine.
//!
//! `JoinBenchBuilder::build` prepares a state. It either skips the state, or
//! allocates and generates the left (probe) and right (build) tables. The
//! tables consist of a key column, an independent copy of the key column, and
//! optionally a payload column. If the keys are nullable, each key column has
//! its own null mask.
//!
//! `JoinBench::run` then measures exactly one join per call, and optionally
//! materializes the join result with a gather.

use super::harness::JoinPoint;
use super::state::{BenchState, LEFT_SIZE, RIGHT_SIZE};
use crate::error::{ErrorKind, Result};
use bench_runtime::runtime::memory::TrackedMem;
use bench_runtime::runtime::stream::{Event, Stream};
use datagen::join_keys::{generate_input_tables, KeyAttribute};
use datagen::null_mask::NullMaskGenerator;
use sql_ops::ast::{AstOperator, Expression, TableReference};
use sql_ops::column::{par_valid_if, sequence, Column, ColumnType};
use sql_ops::gather::{gather, gather_candidate, OutOfBoundsPolicy};
use sql_ops::join::conditional_join::conditional_inner_join;
use sql_ops::join::mixed_join::mixed_inner_join;
use sql_ops::join::{hash_inner_join, GatherMap, HashingScheme, NullEquality};
use sql_ops::table::{Table, TableView};
use std::time::{Duration, Instant};

/// Reason for skipping states with a left table that is larger than the
/// right table.
pub const SKIP_LARGE_LEFT_TABLE: &str = "Skip large left table";

const KEY_COLUMN: usize = 0;
const KEY_COPY_COLUMN: usize = 1;

// Null mask streams per (side, copy)
const RIGHT_KEY_MASK: u64 = 0;
const RIGHT_KEY_COPY_MASK: u64 = 1;
const LEFT_KEY_MASK: u64 = 2;
const LEFT_KEY_COPY_MASK: u64 = 3;

type GatherFn<T> =
    fn(&TableView<'_, T>, &[usize], OutOfBoundsPolicy) -> sql_ops::error::Result<Table<T>>;

/// A key type that the benchmark can generate and join.
pub trait BenchKey: ColumnType + KeyAttribute {}

impl<T: ColumnType + KeyAttribute> BenchKey for T {}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum JoinType {
    Hash(HashingScheme),
    Mixed,
    Conditional,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GatherImpl {
    Baseline,
    Candidate,
}

#[derive(Clone, Debug)]
pub struct JoinBenchBuilder {
    join_type: JoinType,
    gather_impl: Option<GatherImpl>,
    nullable: bool,
    payload: bool,
    selectivity: f64,
    multiplicity: usize,
    seed: u64,
    threads: Option<usize>,
}

/// A prepared benchmark state.
///
/// The tables are immutable and shared by all iterations.
#[derive(Debug)]
pub struct JoinBench<T> {
    pub join_type: JoinType,
    pub gather_impl: Option<GatherImpl>,
    pub nullable: bool,
    pub payload: bool,
    pub left: Table<T>,
    pub right: Table<T>,
    pub malloc_time: Duration,
    pub data_gen_time: Duration,
    predicate: Expression<T>,
    stream: Stream,
}

impl Default for JoinBenchBuilder {
    fn default() -> Self {
        Self {
            join_type: JoinType::Hash(HashingScheme::LinearProbing),
            gather_impl: None,
            nullable: false,
            payload: false,
            selectivity: 0.125,
            multiplicity: 1,
            seed: 0,
            threads: None,
        }
    }
}

impl JoinBenchBuilder {
    pub fn join_type(&mut self, join_type: JoinType) -> &mut Self {
        self.join_type = join_type;
        self
    }

    pub fn gather_impl(&mut self, gather_impl: Option<GatherImpl>) -> &mut Self {
        self.gather_impl = gather_impl;
        self
    }

    pub fn nullable(&mut self, nullable: bool) -> &mut Self {
        self.nullable = nullable;
        self
    }

    pub fn payload(&mut self, payload: bool) -> &mut Self {
        self.payload = payload;
        self
    }

    pub fn selectivity(&mut self, selectivity: f64) -> &mut Self {
        self.selectivity = selectivity;
        self
    }

    pub fn multiplicity(&mut self, multiplicity: usize) -> &mut Self {
        self.multiplicity = multiplicity;
        self
    }

    pub fn seed(&mut self, seed: u64) -> &mut Self {
        self.seed = seed;
        self
    }

    pub fn threads(&mut self, threads: Option<usize>) -> &mut Self {
        self.threads = threads;
        self
    }

    /// Prepares the benchmark for `state`.
    ///
    /// Returns `None` and marks the state as skipped if the left table is
    /// larger than the right table.
    pub fn build<T: BenchKey>(&self, state: &mut BenchState) -> Result<Option<JoinBench<T>>> {
        if self.gather_impl.is_some() {
            if let JoinType::Mixed | JoinType::Conditional = self.join_type {
                Err(ErrorKind::InvalidArgument(format!(
                    "Gathering the join result requires a hash join, but join type is {:?}",
                    self.join_type
                )))?;
            }
        }

        let right_len = state.get_len(RIGHT_SIZE)?;
        let left_len = state.get_len(LEFT_SIZE)?;

        if left_len > right_len {
            tracing::warn!(right_len, left_len, "{}", SKIP_LARGE_LEFT_TABLE);
            state.skip(SKIP_LARGE_LEFT_TABLE);
            return Ok(None);
        }

        let stream = Stream::new(self.threads)?;

        // Allocate memory for the key columns
        let malloc_timer = Instant::now();
        let mut right_keys = TrackedMem::<T>::new(right_len);
        let mut left_keys = TrackedMem::<T>::new(left_len);
        let malloc_time = malloc_timer.elapsed();

        let gen_timer = Instant::now();
        stream.launch(|| {
            generate_input_tables(
                right_keys.as_mut_slice(),
                left_keys.as_mut_slice(),
                self.selectivity,
                self.multiplicity,
                self.seed,
            )
        })?;

        let right_copy = right_keys.clone();
        let left_copy = left_keys.clone();
        let right_columns = vec![
            self.key_column(&stream, right_keys, RIGHT_KEY_MASK)?,
            self.key_column(&stream, right_copy, RIGHT_KEY_COPY_MASK)?,
        ];
        let left_columns = vec![
            self.key_column(&stream, left_keys, LEFT_KEY_MASK)?,
            self.key_column(&stream, left_copy, LEFT_KEY_COPY_MASK)?,
        ];

        let mut right = Table::new(right_columns)?;
        let mut left = Table::new(left_columns)?;

        if self.payload {
            right.push(sequence(right_len, T::default())?)?;
            left.push(sequence(left_len, T::default())?)?;
        }
        let data_gen_time = gen_timer.elapsed();

        tracing::debug!(
            right_len,
            left_len,
            malloc_ns = malloc_time.as_nanos() as u64,
            data_gen_ns = data_gen_time.as_nanos() as u64,
            "Generated join tables"
        );

        Ok(Some(JoinBench {
            join_type: self.join_type,
            gather_impl: self.gather_impl,
            nullable: self.nullable,
            payload: self.payload,
            left,
            right,
            malloc_time,
            data_gen_time,
            predicate: Expression::operation(
                AstOperator::Equal,
                Expression::column(KEY_COLUMN, TableReference::Left),
                Expression::column(KEY_COLUMN, TableReference::Right),
            ),
            stream,
        }))
    }

    fn key_column<T: BenchKey>(
        &self,
        stream: &Stream,
        keys: TrackedMem<T>,
        mask_stream: u64,
    ) -> Result<Column<T>> {
        if !self.nullable {
            return Ok(Column::new(keys));
        }

        let generator = NullMaskGenerator::with_stream(self.seed, mask_stream);
        let len = keys.len();
        let (null_mask, null_count) =
            stream.launch(|| par_valid_if(len, |rows| generator.validity_range(rows)));

        Ok(Column::with_null_mask(keys, null_mask, null_count)?)
    }
}

impl<T: BenchKey> JoinBench<T> {
    /// Runs one timed iteration.
    ///
    /// The timed region covers the join and, if configured, the gather of
    /// both tables. Both complete before the stop event is recorded.
    pub fn run(&self) -> Result<JoinPoint> {
        let start_event = Event::new();
        let gather_event = Event::new();
        let stop_event = Event::new();

        start_event.record(&self.stream)?;
        let gather_map = self.stream.launch(|| self.join())?;
        gather_event.record(&self.stream)?;

        if let Some(gather_impl) = self.gather_impl {
            let (left, right) = self
                .stream
                .launch(|| self.materialize(&gather_map, gather_impl))?;
            debug_assert_eq!(left.num_rows(), right.num_rows());
        }

        stop_event.record(&self.stream)?;
        stop_event.synchronize()?;

        let join_time = gather_event.elapsed_time(&start_event)?;
        let total_time = stop_event.elapsed_time(&start_event)?;
        let gather_time = match self.gather_impl {
            Some(_) => Some(stop_event.elapsed_time(&gather_event)?),
            None => None,
        };

        Ok(JoinPoint {
            join_ns: Some(join_time.as_nanos() as f64),
            gather_ns: gather_time.map(|t| t.as_nanos() as f64),
            total_ns: Some(total_time.as_nanos() as f64),
            result_tuples: Some(gather_map.len()),
        })
    }

    /// Joins the left and right tables with the configured join type.
    ///
    /// Null keys never compare equal.
    pub fn join(&self) -> Result<GatherMap> {
        let nulls = NullEquality::Unequal;
        let left_keys = self.left.select(&[KEY_COLUMN])?;
        let right_keys = self.right.select(&[KEY_COLUMN])?;

        let gather_map = match self.join_type {
            JoinType::Hash(hashing_scheme) => {
                hash_inner_join(&left_keys, &right_keys, nulls, hashing_scheme)?
            }
            JoinType::Mixed => mixed_inner_join(
                &left_keys,
                &right_keys,
                &self.left.select(&[KEY_COPY_COLUMN])?,
                &self.right.select(&[KEY_COPY_COLUMN])?,
                &self.predicate,
                nulls,
            )?,
            JoinType::Conditional => conditional_inner_join(
                &self.left.view(),
                &self.right.view(),
                &self.predicate,
                nulls,
            )?,
        };

        Ok(gather_map)
    }

    /// Gathers the left and right tables at the gather map's indices.
    pub fn materialize(
        &self,
        gather_map: &GatherMap,
        gather_impl: GatherImpl,
    ) -> Result<(Table<T>, Table<T>)> {
        let gather_fn: GatherFn<T> = match gather_impl {
            GatherImpl::Baseline => gather::<T>,
            GatherImpl::Candidate => gather_candidate::<T>,
        };

        let left = gather_fn(
            &self.left.view(),
            gather_map.left_indices(),
            OutOfBoundsPolicy::DontCheck,
        )?;
        let right = gather_fn(
            &self.right.view(),
            gather_map.right_indices(),
            OutOfBoundsPolicy::DontCheck,
        )?;

        Ok((left, right))
    }

    pub fn threads(&self) -> usize {
        self.stream.threads()
    }
}
