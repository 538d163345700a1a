/*
 * This Source Code Form is subject to the terms of the Mozilla Public License,
 * v. 2.0. If a copy of the MPL was not distributed with this file, You can
 * obtain one at http://mozilla.org/MPL/2.0/.
 *
 *
 * Copyright (c) 2022, Clemens Lutz <lutzcle@cml.li>
 * Author: Clemens Lutz <lutzcle@cml.li>
 */

pub mod data_point;
pub mod harness;
pub mod join_bench;
pub mod state;
