/*
 * This Source Code Form is subject to the terms of the Mozilla Public License,
 * v. 2.0. If a copy of the MPL was not distributed with this file, You can
 * obtain one at http://mozilla.org/MPL/2.0/.
 *
 *
 * Copyright 2019-2022 Clemens Lutz
 */

//! Join key generator with a controlled selectivity and multiplicity.
//!
//! The build relation contains `build_len / multiplicity` distinct keys, each
//! of which occurs `multiplicity` times. A probe key hits the build relation
//! with probability `selectivity`. Hits are drawn uniformly from the distinct
//! build keys; misses are drawn from a disjoint key range.
//!
//! Build keys are even numbers and missing probe keys are odd numbers. Thus,
//! a missing key can never match by accident.
//!
//! Generation runs in parallel. Each chunk of `CHUNK_LEN` rows draws from its
//! own RNG that is seeded from the user seed and the chunk number. The output
//! is therefore identical for identical arguments, regardless of the number
//! of threads.

use crate::error::{ErrorKind, Result};
use num_traits::FromPrimitive;
use rand::distributions::{Bernoulli, Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

const CHUNK_LEN: usize = 1 << 16;
const BUILD_STREAM: u64 = 1;
const PROBE_STREAM: u64 = 2;

/// A fixed-width integer type that can serve as a join key.
pub trait KeyAttribute: Copy + Default + Ord + Send + Sync {
    fn try_from_usize(x: usize) -> Result<Self>;
}

impl KeyAttribute for i32 {
    fn try_from_usize(x: usize) -> Result<Self> {
        <Self as FromPrimitive>::from_usize(x).ok_or_else(|| {
            ErrorKind::IntegerOverflow(format!("Key {} does not fit into i32", x)).into()
        })
    }
}

impl KeyAttribute for i64 {
    fn try_from_usize(x: usize) -> Result<Self> {
        <Self as FromPrimitive>::from_usize(x).ok_or_else(|| {
            ErrorKind::IntegerOverflow(format!("Key {} does not fit into i64", x)).into()
        })
    }
}

/// Returns the number of distinct keys in a build relation.
pub fn distinct_build_keys(build_len: usize, multiplicity: usize) -> usize {
    if build_len == 0 {
        0
    } else {
        (build_len / multiplicity.max(1)).max(1)
    }
}

/// Fills a build and a probe key attribute.
///
/// `selectivity` is the expected fraction of probe rows that find at least
/// one match, and must be in (0, 1]. `multiplicity` is the expected number of
/// matches of a matching probe row, and must be at least 1.
///
/// The build attribute is the right (inner) side and the probe attribute is
/// the left (outer) side of the join.
pub fn generate_input_tables<T: KeyAttribute>(
    build_keys: &mut [T],
    probe_keys: &mut [T],
    selectivity: f64,
    multiplicity: usize,
    seed: u64,
) -> Result<()> {
    if !(selectivity > 0.0 && selectivity <= 1.0) {
        Err(ErrorKind::InvalidArgument(format!(
            "Selectivity must be in (0, 1], but is {}",
            selectivity
        )))?;
    }
    if multiplicity == 0 {
        Err(ErrorKind::InvalidArgument(
            "Multiplicity must be at least 1".to_string(),
        ))?;
    }

    let distinct_keys = distinct_build_keys(build_keys.len(), multiplicity);

    // Largest key that we may generate is the largest odd (i.e., missing) key
    let max_key = distinct_keys
        .max(1)
        .checked_mul(2)
        .and_then(|x| x.checked_add(1))
        .ok_or_else(|| ErrorKind::IntegerOverflow("Key range exceeds usize".to_string()))?;
    T::try_from_usize(max_key)?;

    gen_build_keys(build_keys, distinct_keys, seed)?;
    gen_probe_keys(probe_keys, distinct_keys, selectivity, seed)?;

    Ok(())
}

/// Places each distinct key `multiplicity` times, and shuffles the keys.
///
/// The shuffle tags each key with a random number and sorts by the tag.
fn gen_build_keys<T: KeyAttribute>(
    build_keys: &mut [T],
    distinct_keys: usize,
    seed: u64,
) -> Result<()> {
    if build_keys.is_empty() {
        return Ok(());
    }

    let mut tagged = vec![(0_u64, T::default()); build_keys.len()];
    tagged
        .par_chunks_mut(CHUNK_LEN)
        .enumerate()
        .try_for_each(|(chunk_id, chunk)| -> Result<()> {
            let mut rng = chunk_rng(seed, BUILD_STREAM, chunk_id);
            chunk
                .iter_mut()
                .enumerate()
                .try_for_each(|(offset, entry)| -> Result<()> {
                    let row = chunk_id * CHUNK_LEN + offset;
                    let key = T::try_from_usize(2 * (row % distinct_keys))?;
                    *entry = (rng.gen(), key);
                    Ok(())
                })
        })?;

    tagged.par_sort_unstable();

    build_keys
        .par_iter_mut()
        .zip_eq(tagged.into_par_iter())
        .for_each(|(key, (_, value))| *key = value);

    Ok(())
}

fn gen_probe_keys<T: KeyAttribute>(
    probe_keys: &mut [T],
    distinct_keys: usize,
    selectivity: f64,
    seed: u64,
) -> Result<()> {
    let hit = Bernoulli::new(selectivity).map_err(|_| {
        ErrorKind::InvalidArgument(format!("Invalid selectivity {}", selectivity))
    })?;
    let hit_key = if distinct_keys > 0 {
        Some(Uniform::from(0..distinct_keys))
    } else {
        None
    };
    let miss_key = Uniform::from(0..distinct_keys.max(1));

    probe_keys
        .par_chunks_mut(CHUNK_LEN)
        .enumerate()
        .try_for_each(|(chunk_id, chunk)| -> Result<()> {
            let mut rng = chunk_rng(seed, PROBE_STREAM, chunk_id);
            chunk.iter_mut().try_for_each(|key| -> Result<()> {
                let value = match hit_key {
                    Some(ref hit_key) if hit.sample(&mut rng) => 2 * hit_key.sample(&mut rng),
                    _ => 2 * miss_key.sample(&mut rng) + 1,
                };
                *key = T::try_from_usize(value)?;
                Ok(())
            })
        })
}

/// Derives an independent RNG per (seed, stream, chunk).
fn chunk_rng(seed: u64, stream: u64, chunk_id: usize) -> StdRng {
    let mixed = splitmix64(splitmix64(seed ^ stream.rotate_left(32)) ^ chunk_id as u64);
    StdRng::seed_from_u64(mixed)
}

/// SplitMix64 finalizer.
pub(crate) fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
