/*
 * This Source Code Form is subject to the terms of the Mozilla Public License,
 * v. 2.0. If a copy of the MPL was not distributed with this file, You can
 * obtain one at http://mozilla.org/MPL/2.0/.
 *
 *
 * Copyright 2022 Clemens Lutz
 */

use bench_runtime::runtime::stream::{Event, Stream};
use rayon::prelude::*;
use std::error::Error;
use std::thread;
use std::time::Duration;

#[test]
fn stream_uses_requested_threads() -> Result<(), Box<dyn Error>> {
    let stream = Stream::new(Some(3))?;
    assert_eq!(stream.threads(), 3);

    let pool_threads = stream.launch(rayon::current_num_threads);
    assert_eq!(pool_threads, 3);

    Ok(())
}

#[test]
fn stream_rejects_zero_threads() {
    assert!(Stream::new(Some(0)).is_err());
}

#[test]
fn launch_returns_after_completion() -> Result<(), Box<dyn Error>> {
    let stream = Stream::new(Some(2))?;
    let data: Vec<u64> = (0..100_000).collect();

    let sum: u64 = stream.launch(|| data.par_iter().sum());
    assert_eq!(sum, 100_000 * 99_999 / 2);

    Ok(())
}

#[test]
fn events_measure_launched_work() -> Result<(), Box<dyn Error>> {
    let stream = Stream::new(Some(1))?;
    let start = Event::new();
    let stop = Event::new();

    start.record(&stream)?;
    stream.launch(|| thread::sleep(Duration::from_millis(20)));
    stop.record(&stream)?;
    stop.synchronize()?;

    assert!(stop.elapsed_time(&start)? >= Duration::from_millis(20));

    Ok(())
}

#[test]
fn unrecorded_event_is_an_error() -> Result<(), Box<dyn Error>> {
    let stream = Stream::new(Some(1))?;
    let start = Event::new();
    let stop = Event::new();

    assert!(stop.synchronize().is_err());

    stop.record(&stream)?;
    assert!(stop.elapsed_time(&start).is_err());

    Ok(())
}

#[test]
fn reversed_events_are_an_error() -> Result<(), Box<dyn Error>> {
    let stream = Stream::new(Some(1))?;
    let first = Event::new();
    let second = Event::new();

    first.record(&stream)?;
    thread::sleep(Duration::from_millis(1));
    second.record(&stream)?;

    assert!(first.elapsed_time(&second).is_err());

    Ok(())
}
