/*
 * This Source Code Form is subject to the terms of the Mozilla Public License,
 * v. 2.0. If a copy of the MPL was not distributed with this file, You can
 * obtain one at http://mozilla.org/MPL/2.0/.
 *
 *
 * Copyright (c) 2022, Clemens Lutz <lutzcle@cml.li>
 * Author: Clemens Lutz <lutzcle@cml.li>
 */

//! Benchmark states.
//!
//! A state is one point in the benchmark's parameter space, e.g., one pair of
//! right and left table sizes. The benchmark reads its parameters from the
//! state, and may skip the state instead of measuring it.

use crate::error::{ErrorKind, Result};
use std::collections::BTreeMap;

pub const RIGHT_SIZE: &str = "right_size";
pub const LEFT_SIZE: &str = "left_size";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BenchState {
    params: BTreeMap<String, i64>,
    skip_reason: Option<String>,
}

impl BenchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_param(mut self, name: &str, value: i64) -> Self {
        self.params.insert(name.to_string(), value);
        self
    }

    /// Returns the integer parameter `name`.
    pub fn get_int64(&self, name: &str) -> Result<i64> {
        self.params.get(name).copied().ok_or_else(|| {
            ErrorKind::InvalidArgument(format!("Benchmark parameter '{}' is not set", name)).into()
        })
    }

    /// Returns the parameter `name` as a length.
    pub fn get_len(&self, name: &str) -> Result<usize> {
        let value = self.get_int64(name)?;
        if value < 0 {
            Err(ErrorKind::InvalidArgument(format!(
                "Benchmark parameter '{}' must not be negative, but is {}",
                name, value
            )))?;
        }

        Ok(value as usize)
    }

    /// Marks the state as skipped. A skipped state produces no measurements.
    pub fn skip(&mut self, reason: &str) {
        self.skip_reason = Some(reason.to_string());
    }

    pub fn skip_reason(&self) -> Option<&str> {
        self.skip_reason.as_deref()
    }

    pub fn is_skipped(&self) -> bool {
        self.skip_reason.is_some()
    }

    pub fn params(&self) -> impl Iterator<Item = (&str, i64)> + '_ {
        self.params.iter().map(|(name, &value)| (name.as_str(), value))
    }
}

/// Returns one state per combination of right and left table sizes.
///
/// States are ordered by right size, then by left size.
pub fn size_axes(right_sizes: &[usize], left_sizes: &[usize]) -> Result<Vec<BenchState>> {
    let to_i64 = |x: usize| -> Result<i64> {
        if x > i64::MAX as usize {
            Err(ErrorKind::IntegerOverflow(format!("Size {} exceeds i64", x)))?;
        }
        Ok(x as i64)
    };

    right_sizes
        .iter()
        .flat_map(|&right| left_sizes.iter().map(move |&left| (right, left)))
        .map(|(right, left)| {
            Ok(BenchState::new()
                .with_param(RIGHT_SIZE, to_i64(right)?)
                .with_param(LEFT_SIZE, to_i64(left)?))
        })
        .collect()
}
