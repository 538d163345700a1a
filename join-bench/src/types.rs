/*
 * This Source Code Form is subject to the terms of the Mozilla Public License,
 * v. 2.0. If a copy of the MPL was not distributed with this file, You can
 * obtain one at http://mozilla.org/MPL/2.0/.
 *
 *
 * Copyright (c) 2022, Clemens Lutz <lutzcle@cml.li>
 * Author: Clemens Lutz <lutzcle@cml.li>
 */

use crate::measurement::join_bench::GatherImpl;
use serde_derive::Serialize;
use serde_repr::Serialize_repr;
use sql_ops::join::HashingScheme;
use structopt::clap::arg_enum;

arg_enum! {
    #[derive(Copy, Clone, Debug, PartialEq, Serialize)]
    pub enum ArgJoinType {
        Hash,
        Mixed,
        Conditional,
    }
}

arg_enum! {
    #[derive(Copy, Clone, Debug, PartialEq, Serialize)]
    pub enum ArgHashBackend {
        LinearProbing,
        BucketChaining,
    }
}

arg_enum! {
    #[derive(Copy, Clone, Debug, PartialEq, Serialize)]
    pub enum ArgGatherImpl {
        Baseline,
        Candidate,
    }
}

arg_enum! {
    #[derive(Copy, Clone, Debug, PartialEq, Serialize_repr)]
    #[repr(usize)]
    pub enum ArgKeyBytes {
        Bytes4 = 4,
        Bytes8 = 8,
    }
}

impl From<ArgHashBackend> for HashingScheme {
    fn from(backend: ArgHashBackend) -> Self {
        match backend {
            ArgHashBackend::LinearProbing => HashingScheme::LinearProbing,
            ArgHashBackend::BucketChaining => HashingScheme::BucketChaining,
        }
    }
}

impl From<HashingScheme> for ArgHashBackend {
    fn from(hashing_scheme: HashingScheme) -> Self {
        match hashing_scheme {
            HashingScheme::LinearProbing => ArgHashBackend::LinearProbing,
            HashingScheme::BucketChaining => ArgHashBackend::BucketChaining,
        }
    }
}

impl From<ArgGatherImpl> for GatherImpl {
    fn from(gather_impl: ArgGatherImpl) -> Self {
        match gather_impl {
            ArgGatherImpl::Baseline => GatherImpl::Baseline,
            ArgGatherImpl::Candidate => GatherImpl::Candidate,
        }
    }
}

impl From<GatherImpl> for ArgGatherImpl {
    fn from(gather_impl: GatherImpl) -> Self {
        match gather_impl {
            GatherImpl::Baseline => ArgGatherImpl::Baseline,
            GatherImpl::Candidate => ArgGatherImpl::Candidate,
        }
    }
}
