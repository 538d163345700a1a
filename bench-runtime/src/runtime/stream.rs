/*
 * This Source Code Form is subject to the terms of the Mozilla Public License,
 * v. 2.0. If a copy of the MPL was not distributed with this file, You can
 * obtain one at http://mozilla.org/MPL/2.0/.
 *
 *
 * Copyright 2018-2022 Clemens Lutz
 * Author: Clemens Lutz <lutzcle@cml.li>
 */

//! Execution streams and timer events.
//!
//! A `Stream` owns a thread pool on which all work of one benchmark state
//! executes. Work is submitted with `Stream::launch`, which returns only
//! after all of the work has completed. An `Event` recorded on the stream
//! thus marks the point in time at which all previously launched work is
//! complete, and the difference between two events measures the
//! device-side execution time.

use crate::error::{ErrorKind, Result};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::cell::Cell;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// An execution stream.
///
/// Cloning a stream yields a handle to the same thread pool.
#[derive(Clone, Debug)]
pub struct Stream {
    pool: Arc<ThreadPool>,
    threads: usize,
}

impl Stream {
    /// Creates a stream with `threads` worker threads.
    ///
    /// If `threads` is `None`, the stream uses one thread per logical CPU core.
    pub fn new(threads: Option<usize>) -> Result<Self> {
        if threads == Some(0) {
            Err(ErrorKind::InvalidArgument(
                "A stream requires at least one thread".to_string(),
            ))?;
        }

        let mut builder = ThreadPoolBuilder::new()
            .thread_name(|index| format!("stream-worker-{}", index));
        if let Some(threads) = threads {
            builder = builder.num_threads(threads);
        }
        let pool = builder.build()?;
        let threads = pool.current_num_threads();

        tracing::debug!(threads, "Created execution stream");

        Ok(Self {
            pool: Arc::new(pool),
            threads,
        })
    }

    /// Returns the number of worker threads.
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Executes `op` on the stream and waits for its completion.
    ///
    /// Rayon parallel iterators used inside `op` run on the stream's threads.
    pub fn launch<OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }

    /// Blocks until all launched work has completed.
    ///
    /// Launches complete synchronously, so there is never outstanding work.
    /// The call still round-trips through the pool to ensure that the worker
    /// threads are alive.
    pub fn synchronize(&self) -> Result<()> {
        self.pool.install(|| ());
        Ok(())
    }
}

/// A timer event.
///
/// Events must be recorded on a stream before they can be synchronized or
/// used to measure elapsed time.
#[derive(Debug, Default)]
pub struct Event {
    timestamp: Cell<Option<Instant>>,
}

impl Event {
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures the point in time at which all work previously launched on
    /// `stream` is complete.
    pub fn record(&self, stream: &Stream) -> Result<()> {
        stream.synchronize()?;
        self.timestamp.set(Some(Instant::now()));
        Ok(())
    }

    /// Waits until the event is complete.
    pub fn synchronize(&self) -> Result<()> {
        self.recorded().map(|_| ())
    }

    /// Returns the time elapsed between the `start` event and this event.
    pub fn elapsed_time(&self, start: &Event) -> Result<Duration> {
        let stop = self.recorded()?;
        let start = start.recorded()?;

        stop.checked_duration_since(start).ok_or_else(|| {
            ErrorKind::LogicError("Stop event was recorded before start event".to_string())
                .into()
        })
    }

    fn recorded(&self) -> Result<Instant> {
        self.timestamp.get().ok_or_else(|| {
            ErrorKind::LogicError("Event has not been recorded on a stream".to_string()).into()
        })
    }
}
