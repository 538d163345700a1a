// Copyright 2019-2022 Clemens Lutz
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

//! # The SQL Operator Library
//!
//! `sql-ops` is a collection of columnar data structures and SQL operators
//! for CPUs. Currently it includes:
//!
//! - Columns with validity bitmasks, and tables of columns
//! - Predicate expressions over two tables
//! - Inner joins that return gather maps:
//!   - Hash join (linear probing and bucket chaining)
//!   - Mixed join (hash join with an additional predicate)
//!   - Conditional join (arbitrary predicate)
//! - Gather (column-wise and block-wise)
//!
//! # Parallelism
//!
//! Operators parallelize with Rayon. They run on the thread pool from which
//! they are called, e.g., inside of `bench_runtime::runtime::stream::Stream::launch`,
//! or on Rayon's global thread pool otherwise.
//!
//! # Memory
//!
//! Column data, bitmasks, hash tables, and gather maps are allocated as
//! `TrackedMem`. Their allocations are thus accounted by the memory tracking
//! resource, if it is installed.
//!
//! # Tuning parameters
//!
//! ## Hash table load factor
//!
//! `HASH_TABLE_LOAD_FACTOR` defines the number of linear probing slots per
//! build row. The number of slots is rounded up to the next power of two.
//!
//! ## Probe chunk length
//!
//! Probing splits the probe side into chunks of 4096 rows. Each chunk is a
//! Rayon task. Results of a chunk are collected in a thread-local buffer, and
//! concatenated in chunk order.
//!
//! ## Gather block length
//!
//! `GATHER_BLOCK_LEN` defines the number of indices per task in the
//! block-wise gather.

pub mod ast;
pub mod column;
pub mod error;
pub mod gather;
pub mod join;
pub mod table;

pub use gather::GATHER_BLOCK_LEN;
pub use join::hash_join::HASH_TABLE_LOAD_FACTOR;
