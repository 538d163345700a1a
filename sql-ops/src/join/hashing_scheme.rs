/*
 * This Source Code Form is subject to the terms of the Mozilla Public License,
 * v. 2.0. If a copy of the MPL was not distributed with this file, You can
 * obtain one at http://mozilla.org/MPL/2.0/.
 *
 *
 * Copyright 2019-2022 Clemens Lutz
 * Author: Clemens Lutz <lutzcle@cml.li>
 */

//! Definitions of hashing schemes for hash tables.

/// Specifies the hashing scheme used by a hash join.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HashingScheme {
    /// Linear probing scheme.
    ///
    /// Build rows are inserted into an open-addressing table that is twice
    /// the size of the build side. Collisions move on to the next slot.
    LinearProbing,

    /// Bucket chaining scheme.
    ///
    /// Each bucket heads a linked list of build rows. The lists are threaded
    /// through a `next` array with one entry per build row.
    BucketChaining,
}

impl Default for HashingScheme {
    fn default() -> Self {
        HashingScheme::LinearProbing
    }
}
