/*
 * This Source Code Form is subject to the terms of the Mozilla Public License,
 * v. 2.0. If a copy of the MPL was not distributed with this file, You can
 * obtain one at http://mozilla.org/MPL/2.0/.
 *
 *
 * Copyright 2019-2022 Clemens Lutz
 * Author: Clemens Lutz <lutzcle@cml.li>
 */

use super::join_bench::{BenchKey, JoinBench, JoinType};
use crate::error::Result;
use crate::types::*;
use bench_runtime::runtime::hw_info;
use bench_runtime::runtime::memory::MemoryStats;
use serde_derive::Serialize;
use std::mem::size_of;
use std::time::Duration;

#[derive(Clone, Debug, Default, Serialize)]
pub struct DataPoint {
    pub hostname: String,
    pub device_codename: Option<String>,
    pub threads: Option<usize>,
    pub join_type: Option<ArgJoinType>,
    pub hash_backend: Option<ArgHashBackend>,
    pub gather_impl: Option<ArgGatherImpl>,
    pub key_bytes: Option<usize>,
    pub nullable: Option<bool>,
    pub payload: Option<bool>,
    pub selectivity: Option<f64>,
    pub multiplicity: Option<usize>,
    pub right_tuples: Option<usize>,
    pub right_nulls: Option<usize>,
    pub left_tuples: Option<usize>,
    pub left_nulls: Option<usize>,
    pub warm_up: Option<bool>,
    pub result_tuples: Option<usize>,
    pub join_ns: Option<f64>,
    pub gather_ns: Option<f64>,
    pub total_ns: Option<f64>,
    pub relation_malloc_ns: Option<f64>,
    pub relation_gen_ns: Option<f64>,
    pub allocated_bytes: Option<usize>,
    pub peak_allocated_bytes: Option<usize>,
    pub allocations: Option<usize>,
}

impl DataPoint {
    pub fn new() -> Result<DataPoint> {
        let hostname = hw_info::hostname()?;

        // Not all platforms expose a CPU model name
        let device_codename = hw_info::cpu_codename().ok();

        let dp = DataPoint {
            hostname,
            device_codename,
            ..DataPoint::default()
        };

        Ok(dp)
    }

    pub fn set_generator_options(&self, selectivity: f64, multiplicity: usize) -> DataPoint {
        DataPoint {
            selectivity: Some(selectivity),
            multiplicity: Some(multiplicity),
            ..self.clone()
        }
    }

    pub fn fill_from_join_bench<T: BenchKey>(&self, bench: &JoinBench<T>) -> DataPoint {
        let (join_type, hash_backend) = match bench.join_type {
            JoinType::Hash(hashing_scheme) => (ArgJoinType::Hash, Some(hashing_scheme.into())),
            JoinType::Mixed => (ArgJoinType::Mixed, None),
            JoinType::Conditional => (ArgJoinType::Conditional, None),
        };
        let key_nulls =
            |table: &sql_ops::table::Table<T>| table.column(0).map(|column| column.null_count());

        DataPoint {
            threads: Some(bench.threads()),
            join_type: Some(join_type),
            hash_backend,
            gather_impl: bench.gather_impl.map(|g| g.into()),
            key_bytes: Some(size_of::<T>()),
            nullable: Some(bench.nullable),
            payload: Some(bench.payload),
            right_tuples: Some(bench.right.num_rows()),
            right_nulls: key_nulls(&bench.right),
            left_tuples: Some(bench.left.num_rows()),
            left_nulls: key_nulls(&bench.left),
            ..self.clone()
        }
        .set_init_time(bench.malloc_time, bench.data_gen_time)
    }

    pub fn set_init_time(&self, malloc: Duration, data_gen: Duration) -> DataPoint {
        DataPoint {
            relation_malloc_ns: Some(malloc.as_nanos() as f64),
            relation_gen_ns: Some(data_gen.as_nanos() as f64),
            ..self.clone()
        }
    }

    pub fn set_memory_stats(&self, stats: Option<MemoryStats>) -> DataPoint {
        DataPoint {
            allocated_bytes: stats.map(|s| s.allocated_bytes),
            peak_allocated_bytes: stats.map(|s| s.peak_bytes),
            allocations: stats.map(|s| s.allocations),
            ..self.clone()
        }
    }
}
