/*
 * This Source Code Form is subject to the terms of the Mozilla Public License,
 * v. 2.0. If a copy of the MPL was not distributed with this file, You can
 * obtain one at http://mozilla.org/MPL/2.0/.
 *
 *
 * Copyright 2018-2022 Clemens Lutz
 * Author: Clemens Lutz <lutzcle@cml.li>
 */

//! Memory that is accounted by a process-wide tracking resource.
//!
//! The tracking resource is installed with `install_tracking_resource` and
//! removed with `reset_tracking_resource`. While it is installed, each
//! `TrackedMem` allocation and release updates the allocated and peak byte
//! counters. Without an installed resource, `TrackedMem` behaves like a plain
//! `Vec`.
//!
//! Each installation starts a new generation. Memory allocated in an earlier
//! generation is not accounted when it is released, so that resetting the
//! resource while memory is still alive cannot corrupt the counters.

use once_cell::sync::Lazy;
use std::mem::size_of;
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard, PoisonError};

static TRACKER: Lazy<Mutex<TrackingResource>> = Lazy::new(Default::default);

/// Snapshot of the tracking resource's counters.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MemoryStats {
    /// Currently allocated bytes
    pub allocated_bytes: usize,
    /// Maximum of allocated bytes since installation
    pub peak_bytes: usize,
    /// Number of allocations since installation
    pub allocations: usize,
}

// The generation and the counters change together under one lock
#[derive(Debug, Default)]
struct TrackingResource {
    installed: bool,
    generation: u64,
    stats: MemoryStats,
}

impl TrackingResource {
    fn start_generation(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.stats = MemoryStats::default();
    }

    /// Returns the generation that accounts the allocation, if any.
    fn allocate(&mut self, bytes: usize) -> Option<u64> {
        if !self.installed {
            return None;
        }

        let stats = &mut self.stats;
        stats.allocated_bytes += bytes;
        stats.peak_bytes = stats.peak_bytes.max(stats.allocated_bytes);
        stats.allocations += 1;

        Some(self.generation)
    }

    fn release(&mut self, bytes: usize, generation: u64) {
        if self.installed && self.generation == generation {
            self.stats.allocated_bytes -= bytes;
        }
    }
}

// Counters stay consistent even if a holder panicked
fn tracker() -> MutexGuard<'static, TrackingResource> {
    TRACKER.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Installs the process-wide tracking resource and clears its counters.
///
/// Installing an already installed resource starts a new generation.
pub fn install_tracking_resource() {
    let mut tracker = tracker();
    tracker.start_generation();
    tracker.installed = true;
    drop(tracker);

    tracing::debug!("Installed memory tracking resource");
}

/// Removes the tracking resource and returns its final counters.
///
/// Returns `None` if no resource was installed.
pub fn reset_tracking_resource() -> Option<MemoryStats> {
    let mut tracker = tracker();
    if !tracker.installed {
        return None;
    }

    let stats = tracker.stats;
    tracker.installed = false;
    tracker.start_generation();
    drop(tracker);

    tracing::debug!(
        peak_bytes = stats.peak_bytes,
        allocations = stats.allocations,
        "Reset memory tracking resource"
    );

    Some(stats)
}

/// Returns the current counters, if the tracking resource is installed.
pub fn tracking_stats() -> Option<MemoryStats> {
    let tracker = tracker();
    if tracker.installed {
        Some(tracker.stats)
    } else {
        None
    }
}

/// Memory that is accounted by the tracking resource.
#[derive(Debug)]
pub struct TrackedMem<T> {
    data: Vec<T>,
    generation: Option<u64>,
}

impl<T: Copy + Default> TrackedMem<T> {
    /// Allocates `len` default-initialized elements.
    pub fn new(len: usize) -> Self {
        Self::from_vec(vec![T::default(); len])
    }
}

impl<T> TrackedMem<T> {
    /// Takes ownership of `data` and accounts its length.
    pub fn from_vec(data: Vec<T>) -> Self {
        let generation = tracker().allocate(data.len() * size_of::<T>());
        Self { data, generation }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        self.data.as_slice()
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.data.as_mut_slice()
    }
}

impl<T: Clone> Clone for TrackedMem<T> {
    fn clone(&self) -> Self {
        Self::from_vec(self.data.clone())
    }
}

impl<T> Deref for TrackedMem<T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl<T> DerefMut for TrackedMem<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

impl<T> From<Vec<T>> for TrackedMem<T> {
    fn from(data: Vec<T>) -> Self {
        Self::from_vec(data)
    }
}

impl<T> Drop for TrackedMem<T> {
    fn drop(&mut self) {
        if let Some(generation) = self.generation {
            tracker().release(self.data.len() * size_of::<T>(), generation);
        }
    }
}
