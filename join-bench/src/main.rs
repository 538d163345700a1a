/*
 * This Source Code Form is subject to the terms of the Mozilla Public License,
 * v. 2.0. If a copy of the MPL was not distributed with this file, You can
 * obtain one at http://mozilla.org/MPL/2.0/.
 *
 *
 * Copyright 2018-2022 German Research Center for Artificial Intelligence (DFKI)
 * Author: Clemens Lutz <clemens.lutz@dfki.de>
 */

use bench_runtime::runtime::memory::{install_tracking_resource, reset_tracking_resource};
use join_bench::error::Result;
use join_bench::measurement::data_point::DataPoint;
use join_bench::measurement::harness;
use join_bench::measurement::join_bench::{BenchKey, JoinBenchBuilder, JoinType};
use join_bench::measurement::state::{self, BenchState};
use join_bench::types::*;
use std::path::PathBuf;
use structopt::StructOpt;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Parse commandline arguments
    let cmd = CmdOpt::from_args();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let join_type = match cmd.join_type {
        ArgJoinType::Hash => JoinType::Hash(cmd.hash_backend.into()),
        ArgJoinType::Mixed => JoinType::Mixed,
        ArgJoinType::Conditional => JoinType::Conditional,
    };

    let mut builder = JoinBenchBuilder::default();
    builder
        .join_type(join_type)
        .gather_impl(if cmd.gather {
            Some(cmd.gather_impl.into())
        } else {
            None
        })
        .nullable(cmd.nullable)
        .payload(cmd.payload)
        .selectivity(cmd.selectivity)
        .multiplicity(cmd.multiplicity)
        .seed(cmd.seed)
        .threads(cmd.threads);

    let template = DataPoint::new()?.set_generator_options(cmd.selectivity, cmd.multiplicity);

    let mut measurements = Vec::new();
    for mut state in state::size_axes(&cmd.right_size, &cmd.left_size)? {
        let mut points = match cmd.key_bytes {
            ArgKeyBytes::Bytes4 => run_state::<i32>(&cmd, &builder, &template, &mut state)?,
            ArgKeyBytes::Bytes8 => run_state::<i64>(&cmd, &builder, &template, &mut state)?,
        };
        measurements.append(&mut points);
    }

    if let Some(csv) = cmd.csv {
        harness::write_csv(csv, &measurements)?;
    }

    Ok(())
}

fn run_state<T: BenchKey>(
    cmd: &CmdOpt,
    builder: &JoinBenchBuilder,
    template: &DataPoint,
    state: &mut BenchState,
) -> Result<Vec<DataPoint>> {
    if cmd.track_memory {
        install_tracking_resource();
    }

    let bench = match builder.build::<T>(state)? {
        Some(bench) => bench,
        None => {
            reset_tracking_resource();
            tracing::info!(
                reason = state.skip_reason().unwrap_or_default(),
                "Skipped state"
            );
            return Ok(Vec::new());
        }
    };

    tracing::info!(
        right_tuples = bench.right.num_rows(),
        left_tuples = bench.left.num_rows(),
        join_type = ?bench.join_type,
        "Measuring state"
    );

    let dp = template.fill_from_join_bench(&bench);
    let measurements = harness::measure("join_bench", cmd.repeat, dp, || bench.run())?;
    let memory_stats = reset_tracking_resource();

    Ok(measurements
        .into_iter()
        .map(|point| point.set_memory_stats(memory_stats))
        .collect())
}

#[derive(StructOpt)]
#[structopt(
    name = "join-bench",
    about = "A benchmark for hash, mixed, and conditional joins on nullable keys"
)]
struct CmdOpt {
    /// Number of times to repeat benchmark
    #[structopt(short = "r", long = "repeat", default_value = "30")]
    repeat: u32,

    /// Output filename for measurement CSV file
    #[structopt(long = "csv", parse(from_os_str))]
    csv: Option<PathBuf>,

    /// Set the right (build) table sizes (tuples, e.g.: 1000000,2000000)
    #[structopt(long = "right-size", default_value = "1000000", require_delimiter = true)]
    right_size: Vec<usize>,

    /// Set the left (probe) table sizes (tuples, e.g.: 500000,1000000)
    #[structopt(long = "left-size", default_value = "500000", require_delimiter = true)]
    left_size: Vec<usize>,

    /// Join algorithm to measure.
    //   hash: Equi-join on the key columns
    //   mixed: Equi-join on the keys with a predicate on the key copies
    //   conditional: Join on a predicate
    #[structopt(
        long = "join-type",
        default_value = "Hash",
        possible_values = &ArgJoinType::variants(),
        case_insensitive = true
    )]
    join_type: ArgJoinType,

    /// Hash table of the hash join
    #[structopt(
        long = "hash-backend",
        default_value = "LinearProbing",
        possible_values = &ArgHashBackend::variants(),
        case_insensitive = true
    )]
    hash_backend: ArgHashBackend,

    /// Decorate the key columns with null masks
    #[structopt(long = "nullable")]
    nullable: bool,

    /// Add a payload column to both tables
    #[structopt(long = "payload")]
    payload: bool,

    /// Materialize the join result (hash join only)
    #[structopt(long = "gather")]
    gather: bool,

    /// Gather implementation for materializing the join result
    #[structopt(
        long = "gather-impl",
        default_value = "Baseline",
        possible_values = &ArgGatherImpl::variants(),
        case_insensitive = true
    )]
    gather_impl: ArgGatherImpl,

    /// Set the key size (bytes)
    #[structopt(
        long = "key-bytes",
        default_value = "Bytes4",
        possible_values = &ArgKeyBytes::variants(),
        case_insensitive = true
    )]
    key_bytes: ArgKeyBytes,

    /// Fraction of left keys that find a match, in (0, 1]
    #[structopt(long = "selectivity", default_value = "0.125")]
    selectivity: f64,

    /// Number of right tuples per distinct right key
    #[structopt(long = "multiplicity", default_value = "1")]
    multiplicity: usize,

    /// Seed for the keys and null masks
    #[structopt(long = "seed", default_value = "0")]
    seed: u64,

    /// Number of threads (default: all cores)
    #[structopt(short = "t", long = "threads")]
    threads: Option<usize>,

    /// Track the allocated memory of each state
    #[structopt(long = "track-memory")]
    track_memory: bool,
}
