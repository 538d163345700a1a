// Copyright 2018-2022 Clemens Lutz
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

//! # Benchmark runtime
//!
//! The runtime provides the execution environment of the join benchmarks:
//!
//! - `stream`: an execution stream backed by a dedicated thread pool, and
//!   timer events that are recorded on the stream.
//! - `memory`: memory that is accounted by a process-wide tracking resource.
//! - `hw_info`: information about the host, e.g., the CPU codename.

pub mod error;
pub mod runtime;
