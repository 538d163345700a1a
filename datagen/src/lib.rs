/*
 * This Source Code Form is subject to the terms of the Mozilla Public License,
 * v. 2.0. If a copy of the MPL was not distributed with this file, You can
 * obtain one at http://mozilla.org/MPL/2.0/.
 *
 *
 * Copyright 2019-2022 Clemens Lutz
 */

//! Data generators for join benchmarks.
//!
//! `join_keys` fills build-side and probe-side key attributes such that a
//! join between them has a given selectivity and multiplicity. `null_mask`
//! decides, per row, whether a key is `NULL`.

pub mod error;
pub mod join_keys;
pub mod null_mask;
