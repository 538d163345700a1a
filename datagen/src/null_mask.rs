/*
 * This Source Code Form is subject to the terms of the Mozilla Public License,
 * v. 2.0. If a copy of the MPL was not distributed with this file, You can
 * obtain one at http://mozilla.org/MPL/2.0/.
 *
 *
 * Copyright 2021-2022 Clemens Lutz
 */

//! Random, but reproducible, null masks.
//!
//! Whether a row is `NULL` is a pure function of the generator's seed and the
//! row index. The generator does not keep any sequential state, instead it
//! skips ahead to the row's position in the random sequence. Thus, rows can be
//! evaluated in any order and by any number of threads.
//!
//! Roughly 75% of all rows are `NULL`.

use crate::join_keys::splitmix64;
use std::ops::Range;

/// Expected fraction of `NULL` rows.
pub const NULL_RATIO: f64 = 0.75;

/// The minimal standard Lehmer random number engine (`minstd_rand`).
///
/// The engine produces values in `[1, 2^31 - 2]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MinStdRand {
    state: u64,
}

impl MinStdRand {
    const MODULUS: u64 = (1 << 31) - 1;
    const MULTIPLIER: u64 = 48_271;
    const DEFAULT_SEED: u64 = 1;

    /// Creates an engine. A seed of zero (modulo 2^31 - 1) is replaced by the
    /// default seed, because zero is a fixpoint of the engine.
    pub fn new(seed: u64) -> Self {
        let state = seed % Self::MODULUS;

        Self {
            state: if state == 0 {
                Self::DEFAULT_SEED
            } else {
                state
            },
        }
    }

    /// Advances the engine and returns the next value.
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state * Self::MULTIPLIER % Self::MODULUS;
        self.state as u32
    }

    /// Advances the engine by `steps` values in O(log(steps)) time.
    pub fn discard(&mut self, steps: u64) {
        self.state = self.state * Self::pow_mod(Self::MULTIPLIER, steps) % Self::MODULUS;
    }

    // Operands are below 2^31, so products fit into u64
    fn pow_mod(mut base: u64, mut exp: u64) -> u64 {
        let mut result = 1;
        base %= Self::MODULUS;

        while exp > 0 {
            if exp & 1 == 1 {
                result = result * base % Self::MODULUS;
            }
            base = base * base % Self::MODULUS;
            exp >>= 1;
        }

        result
    }
}

impl Default for MinStdRand {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SEED)
    }
}

/// Decides per row if the row is valid or `NULL`.
///
/// # Example
///
/// ```
/// # use datagen::null_mask::NullMaskGenerator;
/// let gen = NullMaskGenerator::new(42);
/// assert_eq!(gen.is_valid(1000), gen.is_valid(1000));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NullMaskGenerator {
    engine: MinStdRand,
}

impl NullMaskGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            engine: MinStdRand::new(seed),
        }
    }

    /// Creates a generator for one of several independent masks.
    ///
    /// Each `stream` yields a different mask for the same `seed`.
    pub fn with_stream(seed: u64, stream: u64) -> Self {
        Self::new(splitmix64(seed ^ splitmix64(stream)))
    }

    /// Returns `true` if `row` is valid, i.e., not `NULL`.
    ///
    /// Rows are valid if the two low-order bits of their random value are
    /// zero, which yields a 25% chance of being valid.
    pub fn is_valid(&self, row: usize) -> bool {
        let mut engine = self.engine;
        engine.discard(row as u64);
        engine.next_u32() & 3 == 0
    }

    pub fn is_null(&self, row: usize) -> bool {
        !self.is_valid(row)
    }

    /// Returns the validity of rows `0..len`.
    pub fn validity_iter(&self, len: usize) -> impl Iterator<Item = bool> {
        self.validity_range(0..len)
    }

    /// Returns the validity of the rows in `rows`.
    ///
    /// The engine skips ahead once to `rows.start` and then draws the
    /// following rows in sequence, thus a range costs one `discard` instead
    /// of one per row.
    pub fn validity_range(&self, rows: Range<usize>) -> impl Iterator<Item = bool> {
        let mut engine = self.engine;
        engine.discard(rows.start as u64);
        rows.map(move |_| engine.next_u32() & 3 == 0)
    }
}
